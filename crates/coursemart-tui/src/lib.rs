// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod screens;
mod view;

pub use screens::{
    Dataset, HeaderCell, ResourcePage, ScreenTable, course_columns, course_config, course_filters,
    instructor_columns, instructor_config, instructor_filters, order_columns, order_config,
    order_filters,
};

use anyhow::{Context, Result, anyhow, bail};
use coursemart_app::{ResourceKind, Screen, ShellCommand, ShellEvent, ShellState};
use coursemart_routes::RouteTable;
use coursemart_table::engine::DEFAULT_PAGE_SIZE;
use coursemart_table::{PageRequest, TableEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const PAGE_SIZE_STEP: usize = 5;
const MAX_PAGE_SIZE: usize = 200;
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

#[derive(Debug)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Fetched {
        screen: Screen,
        seq: u64,
        result: Result<ResourcePage>,
    },
}

/// Everything the shell needs from the outside world.
pub trait AppRuntime {
    /// Every row of `resource` when the runtime holds the data in memory;
    /// `None` makes the screen page through [`Self::fetch_page`] instead.
    fn load_dataset(&mut self, resource: ResourceKind) -> Result<Option<Dataset>>;
    fn fetch_page(&mut self, resource: ResourceKind, request: &PageRequest)
    -> Result<ResourcePage>;
    fn write_export(&mut self, screen: Screen, csv: &[u8]) -> Result<PathBuf>;

    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Runs a fetch and reports it on `tx`. The default fetches inline;
    /// runtimes with a network behind them should move this to a worker.
    fn spawn_fetch(
        &mut self,
        screen: Screen,
        seq: u64,
        request: PageRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.fetch_page(screen.resource(), &request);
        tx.send(InternalEvent::Fetched {
            screen,
            seq,
            result,
        })
        .map_err(|_| anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

/// UI-only state: one table per visited screen plus the cursor.
#[derive(Debug, Default)]
pub struct ViewData {
    tables: HashMap<Screen, ScreenTable>,
    selected_row: usize,
    selected_col: usize,
    /// Query being typed; `Some` while the search prompt is open.
    search_input: Option<String>,
    status_token: u64,
}

impl ViewData {
    pub fn table(&self, screen: Screen) -> Option<&ScreenTable> {
        self.tables.get(&screen)
    }

    fn active_table(&self, shell: &ShellState) -> Option<&ScreenTable> {
        shell.screen.and_then(|screen| self.tables.get(&screen))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GrowPageSize,
    ShrinkPageSize,
    CycleSort,
    ClearSort,
    HideCurrentColumn,
    ShowAllColumns,
    ToggleFilter,
    ClearFilters,
    OpenSearch,
    Retry,
    Export,
}

pub fn run_app<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if shell.screen.is_none() {
        shell.dispatch(ShellCommand::Open(Screen::Catalog), routes);
    }
    open_active_table(shell, routes, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(
            shell,
            routes,
            runtime,
            &mut view_data,
            &internal_tx,
            &internal_rx,
        );

        if let Err(error) = terminal.draw(|frame| view::render(frame, shell, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(shell, routes, runtime, &mut view_data, &internal_tx, key)
                    {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                shell.dispatch(ShellCommand::ClearStatus, routes);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetched {
                screen,
                seq,
                result,
            } => {
                let Some(table) = view_data.tables.get_mut(&screen) else {
                    tracing::debug!(
                        screen = screen.label(),
                        seq,
                        "dropping fetch for closed screen"
                    );
                    continue;
                };
                let events = table.receive(seq, result);
                apply_events(shell, routes, runtime, view_data, tx, events);
            }
        }
    }
}

/// Reports what the engine did, then starts any fetch it asked for.
fn apply_events<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<TableEvent>,
) {
    report_events(shell, routes, view_data, tx, &events);
    let failures = dispatch_fetches(runtime, view_data, tx);
    report_events(shell, routes, view_data, tx, &failures);
}

fn report_events(
    shell: &mut ShellState,
    routes: &RouteTable,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: &[TableEvent],
) {
    for event in events {
        match event {
            TableEvent::PageChanged(_)
            | TableEvent::PageSizeChanged(_)
            | TableEvent::FiltersChanged
            | TableEvent::SearchChanged(_) => view_data.selected_row = 0,
            TableEvent::LoadFailed { message } => {
                emit_status(
                    shell,
                    routes,
                    view_data,
                    tx,
                    format!("load failed: {message}; press r to retry"),
                );
            }
            TableEvent::Rejected(error) => {
                emit_status(shell, routes, view_data, tx, error.to_string());
            }
            _ => {}
        }
    }
    clamp_cursor(shell, view_data);
}

fn dispatch_fetches<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) -> Vec<TableEvent> {
    let mut failures = Vec::new();
    for (screen, table) in &mut view_data.tables {
        while let Some(pending) = table.take_pending_fetch() {
            tracing::debug!(
                screen = screen.label(),
                seq = pending.seq,
                "dispatching page fetch"
            );
            let seq = pending.seq;
            if let Err(error) = runtime.spawn_fetch(*screen, seq, pending.request, tx.clone()) {
                failures.extend(table.receive(seq, Err(error)));
            }
        }
    }
    failures
}

fn open_active_table<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(screen) = shell.screen else {
        return;
    };
    if view_data.tables.contains_key(&screen) {
        return;
    }
    match build_table(runtime, screen) {
        Ok(table) => {
            tracing::debug!(screen = screen.label(), mode = ?table.mode(), "opened table");
            view_data.tables.insert(screen, table);
            apply_events(shell, routes, runtime, view_data, tx, Vec::new());
        }
        Err(error) => {
            emit_status(
                shell,
                routes,
                view_data,
                tx,
                format!("open {} failed: {error:#}", screen.label()),
            );
        }
    }
}

fn build_table<R: AppRuntime>(runtime: &mut R, screen: Screen) -> Result<ScreenTable> {
    let page_size = runtime.page_size();
    let dataset = runtime
        .load_dataset(screen.resource())
        .with_context(|| format!("load {}", screen.resource().as_str()))?;
    match dataset {
        Some(dataset) => ScreenTable::local(screen, page_size, dataset),
        None => ScreenTable::remote(screen, page_size),
    }
}

/// CSV of `screen` as it first opens: every row for an in-memory dataset,
/// the first page for a remote one. Runs without a terminal.
pub fn export_screen<R: AppRuntime>(runtime: &mut R, screen: Screen) -> Result<Vec<u8>> {
    let mut table = build_table(runtime, screen)?;
    if let Some(pending) = table.take_pending_fetch() {
        let result = runtime.fetch_page(screen.resource(), &pending.request);
        table.receive(pending.seq, result);
    }
    if let Some(message) = table.state().error() {
        bail!("load {}: {message}", screen.label());
    }
    table.export_visible()
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    shell: &mut ShellState,
    routes: &RouteTable,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    shell.dispatch(ShellCommand::SetStatus(message.into()), routes);
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.search_input.is_some() {
        handle_search_key(shell, routes, runtime, view_data, internal_tx, key);
        return false;
    }

    let navigation = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => Some(ShellCommand::NextScreen),
        KeyCode::BackTab => Some(ShellCommand::PrevScreen),
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            Screen::ALL.get(index).copied().map(ShellCommand::Open)
        }
        _ => None,
    };
    if let Some(command) = navigation {
        navigate(shell, routes, runtime, view_data, internal_tx, command);
        return false;
    }

    if let Some(command) = table_command_for_key(key) {
        apply_table_command(shell, routes, runtime, view_data, internal_tx, command);
    }
    false
}

fn navigate<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: ShellCommand,
) {
    let events = shell.dispatch(command, routes);
    if events
        .iter()
        .any(|event| matches!(event, ShellEvent::ScreenChanged(_)))
    {
        view_data.selected_row = 0;
        view_data.selected_col = 0;
        tracing::debug!(path = %shell.path, layout = ?shell.layout, "screen changed");
        open_active_table(shell, routes, runtime, view_data, internal_tx);
    }
}

fn handle_search_key<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => view_data.search_input = None,
        KeyCode::Enter => {
            let query = view_data.search_input.take().unwrap_or_default();
            let Some(screen) = shell.screen else {
                return;
            };
            let Some(table) = view_data.tables.get_mut(&screen) else {
                return;
            };
            let events = table.set_search(&query);
            apply_events(shell, routes, runtime, view_data, internal_tx, events);
        }
        KeyCode::Backspace => {
            if let Some(input) = view_data.search_input.as_mut() {
                input.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(input) = view_data.search_input.as_mut() {
                input.push(ch);
            }
        }
        _ => {}
    }
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => Some(TableCommand::NextPage),
        (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => Some(TableCommand::PrevPage),
        (KeyCode::Home, _) => Some(TableCommand::FirstPage),
        (KeyCode::End, _) => Some(TableCommand::LastPage),
        (KeyCode::Char('+'), _) => Some(TableCommand::GrowPageSize),
        (KeyCode::Char('-'), _) => Some(TableCommand::ShrinkPageSize),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(TableCommand::CycleSort),
        (KeyCode::Char('S'), _) => Some(TableCommand::ClearSort),
        (KeyCode::Char('c'), KeyModifiers::NONE) => Some(TableCommand::HideCurrentColumn),
        (KeyCode::Char('C'), _) => Some(TableCommand::ShowAllColumns),
        (KeyCode::Char('f'), KeyModifiers::NONE) => Some(TableCommand::ToggleFilter),
        (KeyCode::Char('F'), _) => Some(TableCommand::ClearFilters),
        (KeyCode::Char('/'), _) => Some(TableCommand::OpenSearch),
        (KeyCode::Char('r'), KeyModifiers::NONE) => Some(TableCommand::Retry),
        (KeyCode::Char('e'), KeyModifiers::NONE) => Some(TableCommand::Export),
        _ => None,
    }
}

fn apply_table_command<R: AppRuntime>(
    shell: &mut ShellState,
    routes: &RouteTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TableCommand,
) {
    let Some(screen) = shell.screen else {
        return;
    };
    let Some(table) = view_data.tables.get_mut(&screen) else {
        return;
    };
    let headers = table.headers();
    let current = headers.get(view_data.selected_col);
    let mut status = None;

    let events = match command {
        TableCommand::MoveRow(delta) => {
            view_data.selected_row = offset(view_data.selected_row, delta, table.row_count());
            Vec::new()
        }
        TableCommand::MoveColumn(delta) => {
            view_data.selected_col = offset(view_data.selected_col, delta, headers.len());
            Vec::new()
        }
        TableCommand::NextPage => table.next_page(),
        TableCommand::PrevPage => table.prev_page(),
        TableCommand::FirstPage => table.set_page(0),
        TableCommand::LastPage => table.set_page(usize::MAX),
        TableCommand::GrowPageSize => {
            let size = (table.state().page_size + PAGE_SIZE_STEP).min(MAX_PAGE_SIZE);
            table.set_page_size(size)
        }
        TableCommand::ShrinkPageSize => {
            let size = table
                .state()
                .page_size
                .saturating_sub(PAGE_SIZE_STEP)
                .max(1);
            table.set_page_size(size)
        }
        TableCommand::CycleSort => match current {
            Some(header) => table.cycle_sort(&header.key),
            None => Vec::new(),
        },
        TableCommand::ClearSort => table.clear_sort(),
        TableCommand::HideCurrentColumn => match current {
            Some(header) => table.hide_column(&header.key),
            None => Vec::new(),
        },
        TableCommand::ShowAllColumns => table.show_all_columns(),
        TableCommand::ToggleFilter => match current {
            Some(header) => match table.filter_for_column(&header.key) {
                None => {
                    status = Some(format!("no filter on {}", header.label));
                    Vec::new()
                }
                Some((key, label)) => {
                    let value = table
                        .display_rows()
                        .get(view_data.selected_row)
                        .and_then(|row| row.get(view_data.selected_col))
                        .cloned()
                        .unwrap_or_default();
                    if value.trim().is_empty() {
                        status = Some(format!("nothing to filter on in {}", header.label));
                        Vec::new()
                    } else {
                        let events = table.toggle_filter_value(&key, &value);
                        let selected = table
                            .state()
                            .active_filters
                            .get(&key)
                            .map_or_else(|| "all".to_owned(), |values| values.join(", "));
                        status = Some(format!("{label}: {selected}"));
                        events
                    }
                }
            },
            None => Vec::new(),
        },
        TableCommand::ClearFilters => table.clear_filters(),
        TableCommand::OpenSearch => {
            view_data.search_input = Some(table.state().search_query.clone());
            Vec::new()
        }
        TableCommand::Retry => {
            if table.state().error().is_none() {
                status = Some("nothing to retry".to_owned());
            }
            table.retry()
        }
        TableCommand::Export => {
            let exported = table
                .export_visible()
                .and_then(|csv| runtime.write_export(screen, &csv));
            status = Some(match exported {
                Ok(path) => format!("exported {} to {}", screen.label(), path.display()),
                Err(error) => format!("export failed: {error:#}"),
            });
            Vec::new()
        }
    };

    apply_events(shell, routes, runtime, view_data, internal_tx, events);
    if let Some(message) = status {
        emit_status(shell, routes, view_data, internal_tx, message);
    }
}

fn offset(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn clamp_cursor(shell: &ShellState, view_data: &mut ViewData) {
    let (rows, columns) = view_data
        .active_table(shell)
        .map_or((0, 0), |table| {
            (table.row_count(), table.state().visible_columns.len())
        });
    view_data.selected_row = view_data.selected_row.min(rows.saturating_sub(1));
    view_data.selected_col = view_data.selected_col.min(columns.saturating_sub(1));
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, Dataset, InternalEvent, ResourcePage, ScreenTable, TableCommand, ViewData,
        export_screen, handle_key_event, open_active_table, process_internal_events,
        table_command_for_key, view,
    };
    use anyhow::{Result, bail};
    use coursemart_app::{
        Course, HeaderType, ResourceKind, Screen, ShellCommand, ShellState, SideBarType,
    };
    use coursemart_routes::{RouteTable, marketplace_routes};
    use coursemart_table::{LoadStatus, Page, PageRequest};
    use coursemart_testkit::CourseFaker;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver, Sender};

    #[derive(Debug, Default)]
    struct TestRuntime {
        remote: bool,
        fail_fetches: bool,
        courses: Vec<Course>,
        fetches: Vec<PageRequest>,
        exports: Vec<(Screen, Vec<u8>)>,
    }

    impl TestRuntime {
        fn local(count: usize) -> Self {
            Self {
                courses: CourseFaker::new(21).courses(count),
                ..Self::default()
            }
        }

        fn remote(count: usize) -> Self {
            Self {
                remote: true,
                ..Self::local(count)
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_dataset(&mut self, resource: ResourceKind) -> Result<Option<Dataset>> {
            if self.remote {
                return Ok(None);
            }
            let dataset = match resource {
                ResourceKind::Courses => Dataset::Courses(self.courses.clone()),
                ResourceKind::Instructors => {
                    Dataset::Instructors(CourseFaker::new(2).instructors(12))
                }
                ResourceKind::Orders => Dataset::Orders(CourseFaker::new(3).orders(12)),
            };
            Ok(Some(dataset))
        }

        fn fetch_page(
            &mut self,
            resource: ResourceKind,
            request: &PageRequest,
        ) -> Result<ResourcePage> {
            self.fetches.push(request.clone());
            if self.fail_fetches {
                bail!("server unavailable");
            }
            if resource != ResourceKind::Courses {
                bail!("only courses are served");
            }
            let rows = self
                .courses
                .iter()
                .skip(request.page * request.page_size)
                .take(request.page_size)
                .cloned()
                .collect();
            Ok(ResourcePage::Courses(Page {
                rows,
                total_count: self.courses.len(),
            }))
        }

        fn write_export(&mut self, screen: Screen, csv: &[u8]) -> Result<PathBuf> {
            self.exports.push((screen, csv.to_vec()));
            Ok(PathBuf::from(format!(
                "/tmp/{}.csv",
                screen.resource().as_str()
            )))
        }

        fn page_size(&self) -> usize {
            10
        }
    }

    struct Harness {
        shell: ShellState,
        routes: RouteTable,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn open(runtime: TestRuntime, screen: Screen) -> Self {
            let routes = RouteTable::new(marketplace_routes()).expect("built-in routes");
            let mut shell = ShellState::default();
            shell.dispatch(ShellCommand::Open(screen), &routes);
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                shell,
                routes,
                runtime,
                view_data: ViewData::default(),
                tx,
                rx,
            };
            open_active_table(
                &mut harness.shell,
                &harness.routes,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
            );
            harness.pump();
            harness
        }

        fn pump(&mut self) {
            process_internal_events(
                &mut self.shell,
                &self.routes,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn press(&mut self, code: KeyCode) -> bool {
            let quit = handle_key_event(
                &mut self.shell,
                &self.routes,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, KeyModifiers::NONE),
            );
            self.pump();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn table(&self) -> &ScreenTable {
            let screen = self.shell.screen.expect("screen open");
            self.view_data.table(screen).expect("table open")
        }

        fn footer(&self) -> String {
            view::footer_text(self.table())
        }

        fn header_labels(&self) -> Vec<String> {
            self.table()
                .headers()
                .iter()
                .map(view::header_label)
                .collect()
        }

        fn status(&self) -> &str {
            self.shell.status_line.as_deref().unwrap_or_default()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn key_bindings_map_to_table_commands() {
        assert_eq!(
            table_command_for_key(key(KeyCode::Char('j'))),
            Some(TableCommand::MoveRow(1))
        );
        assert_eq!(
            table_command_for_key(key(KeyCode::PageDown)),
            Some(TableCommand::NextPage)
        );
        assert_eq!(
            table_command_for_key(key(KeyCode::Char('s'))),
            Some(TableCommand::CycleSort)
        );
        assert_eq!(
            table_command_for_key(KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT)),
            Some(TableCommand::ClearSort)
        );
        assert_eq!(
            table_command_for_key(key(KeyCode::Char('/'))),
            Some(TableCommand::OpenSearch)
        );
        assert_eq!(
            table_command_for_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn sort_key_cycles_ascending_descending_then_off() {
        let mut harness = Harness::open(TestRuntime::local(25), Screen::AdminCourses);
        harness.press(KeyCode::Char('l'));

        harness.press(KeyCode::Char('s'));
        assert_eq!(harness.header_labels()[1], "Title ↑");
        harness.press(KeyCode::Char('s'));
        assert_eq!(harness.header_labels()[1], "Title ↓");
        harness.press(KeyCode::Char('s'));
        assert_eq!(harness.header_labels()[1], "Title");
        assert_eq!(harness.table().state().sort, None);
    }

    #[test]
    fn paging_keys_move_through_pages_and_clamp_at_the_end() {
        let mut harness = Harness::open(TestRuntime::local(25), Screen::AdminCourses);
        assert_eq!(harness.footer(), "rows 1-10 of 25 · page 1/3");

        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.footer(), "rows 11-20 of 25 · page 2/3");

        harness.press(KeyCode::End);
        assert_eq!(harness.footer(), "rows 21-25 of 25 · page 3/3");
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.table().state().page_index, 2);

        harness.press(KeyCode::Home);
        assert_eq!(harness.table().state().page_index, 0);
    }

    #[test]
    fn page_size_keys_resize_and_return_to_first_page() {
        let mut harness = Harness::open(TestRuntime::local(25), Screen::AdminCourses);
        harness.press(KeyCode::Char('n'));
        harness.press(KeyCode::Char('+'));
        assert_eq!(harness.table().state().page_size, 15);
        assert_eq!(harness.footer(), "rows 1-15 of 25 · page 1/2");

        for _ in 0..5 {
            harness.press(KeyCode::Char('-'));
        }
        assert_eq!(harness.table().state().page_size, 1);
    }

    #[test]
    fn search_prompt_applies_on_enter_and_cancels_on_escape() {
        let mut harness = Harness::open(TestRuntime::local(25), Screen::AdminCourses);

        harness.press(KeyCode::Char('/'));
        assert!(view::status_text(&harness.shell, &harness.view_data).starts_with("SEARCH"));
        harness.type_text("zzqq");
        assert!(!harness.press(KeyCode::Char('q')), "q types while searching");
        harness.press(KeyCode::Esc);
        assert_eq!(harness.table().state().search_query, "");

        harness.press(KeyCode::Char('/'));
        harness.type_text("zzqq");
        harness.press(KeyCode::Enter);
        assert_eq!(harness.table().state().search_query, "zzqq");
        assert_eq!(
            harness.footer(),
            "rows 0-0 of 0 · page 1/1 | search \"zzqq\""
        );

        harness.press(KeyCode::Char('/'));
        for _ in 0..4 {
            harness.press(KeyCode::Backspace);
        }
        harness.press(KeyCode::Enter);
        assert_eq!(harness.table().state().total_count, 25);
    }

    #[test]
    fn filter_key_toggles_the_selected_cell_value() {
        let mut harness = Harness::open(TestRuntime::local(25), Screen::AdminCourses);
        for _ in 0..3 {
            harness.press(KeyCode::Char('l'));
        }
        let category = harness.table().display_rows()[0][3].clone();

        harness.press(KeyCode::Char('f'));
        let state = harness.table().state();
        assert_eq!(state.active_filters.get("category"), Some(&vec![category.clone()]));
        assert!(
            harness
                .table()
                .display_rows()
                .iter()
                .all(|row| row[3] == category)
        );
        assert_eq!(harness.status(), format!("Category: {category}"));
        assert!(harness.header_labels()[3].ends_with('▼'));

        harness.press(KeyCode::Char('F'));
        assert!(harness.table().state().active_filters.is_empty());
        assert_eq!(harness.table().state().total_count, 25);
    }

    #[test]
    fn filter_key_on_unfiltered_column_reports() {
        let mut harness = Harness::open(TestRuntime::local(5), Screen::AdminCourses);
        harness.press(KeyCode::Char('f'));
        assert_eq!(harness.status(), "no filter on ID");
    }

    #[test]
    fn last_visible_column_cannot_be_hidden() {
        let mut harness = Harness::open(TestRuntime::local(5), Screen::AdminCourses);
        let total = harness.table().headers().len();

        harness.press(KeyCode::Char('c'));
        assert_eq!(harness.table().headers().len(), total - 1);
        for _ in 1..total {
            harness.press(KeyCode::Char('c'));
        }
        assert_eq!(harness.table().headers().len(), 1);
        assert_eq!(harness.status(), "at least one column must stay visible");

        harness.press(KeyCode::Char('C'));
        assert_eq!(harness.table().headers().len(), total);
    }

    #[test]
    fn remote_failure_marks_rows_stale_until_retry_succeeds() {
        let mut runtime = TestRuntime::remote(25);
        runtime.fail_fetches = true;
        let mut harness = Harness::open(runtime, Screen::AdminCourses);

        assert!(harness.table().state().stale);
        assert_eq!(
            harness.status(),
            "load failed: server unavailable; press r to retry"
        );
        assert!(harness.footer().ends_with("error: server unavailable"));

        harness.runtime.fail_fetches = false;
        harness.press(KeyCode::Char('r'));
        let state = harness.table().state();
        assert_eq!(state.status, LoadStatus::Ready);
        assert!(!state.stale);
        assert_eq!(harness.table().row_count(), 10);
        assert_eq!(harness.runtime.fetches.len(), 2);
        assert_eq!(harness.runtime.fetches[0], harness.runtime.fetches[1]);
    }

    #[test]
    fn retry_without_failure_is_a_no_op() {
        let mut harness = Harness::open(TestRuntime::remote(25), Screen::AdminCourses);
        harness.press(KeyCode::Char('r'));
        assert_eq!(harness.status(), "nothing to retry");
        assert_eq!(harness.runtime.fetches.len(), 1);
    }

    #[test]
    fn late_responses_for_old_requests_are_ignored() {
        let mut harness = Harness::open(TestRuntime::remote(25), Screen::AdminCourses);
        harness.press(KeyCode::Char('n'));
        let expected = harness.table().display_rows();
        assert_eq!(harness.runtime.fetches.last().map(|request| request.page), Some(1));

        harness
            .tx
            .send(InternalEvent::Fetched {
                screen: Screen::AdminCourses,
                seq: 1,
                result: Ok(ResourcePage::Courses(Page {
                    rows: Vec::new(),
                    total_count: 0,
                })),
            })
            .expect("send stale page");
        harness.pump();

        assert_eq!(harness.table().display_rows(), expected);
        assert_eq!(harness.table().state().total_count, 25);
    }

    #[test]
    fn export_hands_visible_csv_to_the_runtime() {
        let mut harness = Harness::open(TestRuntime::local(12), Screen::AdminCourses);
        harness.press(KeyCode::Char('c'));
        harness.press(KeyCode::Char('e'));

        assert_eq!(harness.status(), "exported courses to /tmp/courses.csv");
        let (screen, csv) = &harness.runtime.exports[0];
        assert_eq!(*screen, Screen::AdminCourses);
        let text = String::from_utf8(csv.clone()).expect("utf-8 csv");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Title,Instructor,Category,Status,Price,Enrolled,Rating,Published")
        );
        assert_eq!(lines.count(), 12, "local export covers every filtered row");
    }

    #[test]
    fn export_screen_fetches_the_first_remote_page() -> Result<()> {
        let mut runtime = TestRuntime::remote(25);
        let csv = export_screen(&mut runtime, Screen::AdminCourses)?;

        assert_eq!(runtime.fetches.len(), 1);
        assert_eq!(runtime.fetches[0].page, 0);
        let text = String::from_utf8(csv)?;
        assert_eq!(text.lines().count(), 11, "header plus one page");
        Ok(())
    }

    #[test]
    fn export_screen_reports_fetch_failures() {
        let mut runtime = TestRuntime {
            fail_fetches: true,
            ..TestRuntime::remote(5)
        };
        let error = export_screen(&mut runtime, Screen::Catalog).expect_err("fetch fails");
        assert_eq!(error.to_string(), "load catalog: server unavailable");
    }

    #[test]
    fn screen_keys_switch_tables_and_chrome() {
        let mut harness = Harness::open(TestRuntime::local(5), Screen::AdminCourses);
        assert_eq!(harness.shell.layout.sidebar, SideBarType::AdminFull);
        assert_eq!(harness.shell.layout.header, HeaderType::Dark);

        harness.press(KeyCode::Tab);
        assert_eq!(harness.shell.screen, Some(Screen::AdminInstructors));
        assert_eq!(harness.table().headers()[1].label, "Name");

        harness.press(KeyCode::Char('5'));
        assert_eq!(harness.shell.screen, Some(Screen::Catalog));
        assert_eq!(harness.shell.layout.sidebar, SideBarType::None);
        assert_eq!(harness.shell.layout.header, HeaderType::Full);

        harness.press(KeyCode::BackTab);
        assert_eq!(harness.shell.screen, Some(Screen::InstructorCourses));
        assert_eq!(harness.shell.layout.sidebar, SideBarType::Full);
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut harness = Harness::open(TestRuntime::local(5), Screen::AdminCourses);
        assert!(harness.press(KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut harness.shell,
            &harness.routes,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ));
    }

    #[test]
    fn render_draws_chrome_table_and_footer() {
        let mut harness = Harness::open(TestRuntime::local(25), Screen::AdminCourses);
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Char('s'));

        let mut terminal = Terminal::new(TestBackend::new(140, 30)).expect("test terminal");
        terminal
            .draw(|frame| view::render(frame, &harness.shell, &harness.view_data))
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        let screen: String = buffer
            .content()
            .chunks(width)
            .map(|line| {
                let mut text: String = line.iter().map(|cell| cell.symbol()).collect();
                text.push('\n');
                text
            })
            .collect();

        assert!(screen.contains("coursemart"), "{screen}");
        assert!(screen.contains("/admin/courses"), "{screen}");
        assert!(screen.contains("instructors"), "{screen}");
        assert!(screen.contains("Title ↑"), "{screen}");
        assert!(screen.contains("rows 1-10 of 25 · page 1/3"), "{screen}");
    }
}
