// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ViewData;
use crate::screens::{HeaderCell, ScreenTable};
use coursemart_app::{
    ChromeLayout, HeaderType, LinksType, Screen, ShellState, SideBarType, SortDirection,
};
use coursemart_table::{LoadStatus, TableMode};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

const SORT_MARK_ASC: &str = " ↑";
const SORT_MARK_DESC: &str = " ↓";
const FILTER_MARK_ACTIVE: &str = " ▼";
const CURRENT_MARK: &str = "▸";
const KEY_HINTS: &str = "j/k/h/l n/p home/end +/- | s/S c/C f/F / | r e | tab 1-5 | q";

type SidebarEntry = (&'static str, Option<Screen>);

const ADMIN_SIDEBAR: [SidebarEntry; 5] = [
    ("courses", Some(Screen::AdminCourses)),
    ("instructors", Some(Screen::AdminInstructors)),
    ("orders", Some(Screen::AdminOrders)),
    ("plans", None),
    ("settings", None),
];

const MEMBER_SIDEBAR: [SidebarEntry; 4] = [
    ("my courses", Some(Screen::InstructorCourses)),
    ("catalog", Some(Screen::Catalog)),
    ("analytics", None),
    ("payouts", None),
];

pub(crate) fn render(frame: &mut ratatui::Frame<'_>, shell: &ShellState, view_data: &ViewData) {
    let header_height = if shell.layout.header == HeaderType::None {
        0
    } else {
        3
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    if header_height > 0 {
        render_header(frame, layout[0], shell);
    }

    let sidebar_width = sidebar_width(shell.layout.sidebar);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
        .split(layout[1]);
    if sidebar_width > 0 {
        let title = if shell.layout.sidebar.is_admin() {
            "admin"
        } else {
            "menu"
        };
        let sidebar = Paragraph::new(sidebar_text(shell.layout.sidebar, shell.screen))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(sidebar, body[0]);
    }

    render_table(frame, body[1], shell, view_data);

    let footer = view_data
        .active_table(shell)
        .map(footer_text)
        .unwrap_or_default();
    let status = Paragraph::new(format!("{footer}\n{}", status_text(shell, view_data)))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(input) = &view_data.search_input {
        let area = centered_rect(60, 20, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(format!("{input}_")).block(
            Block::default()
                .title("search (enter apply, esc cancel)")
                .borders(Borders::ALL),
        );
        frame.render_widget(prompt, area);
    }
}

fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect, shell: &ShellState) {
    let header = shell.layout.header;
    let mut block = Block::default().title("coursemart");
    if header != HeaderType::Transparent {
        block = block.borders(Borders::ALL);
    }
    let style = match header {
        HeaderType::Dark => Style::default()
            .fg(Color::White)
            .bg(Color::Black)
            .add_modifier(Modifier::BOLD),
        HeaderType::Home => Style::default().fg(Color::Cyan),
        HeaderType::Transparent => Style::default().fg(Color::Gray),
        _ => Style::default(),
    };
    let alignment = if header == HeaderType::Centered {
        Alignment::Center
    } else {
        Alignment::Left
    };
    let widget = Paragraph::new(header_text(shell.layout, &shell.path))
        .style(style)
        .alignment(alignment)
        .block(block);
    frame.render_widget(widget, area);
}

pub(crate) fn header_text(layout: ChromeLayout, path: &str) -> String {
    let links = header_links(layout.links).join(" · ");
    match layout.header {
        HeaderType::None => String::new(),
        HeaderType::Home => format!("{links}   learn something new today"),
        HeaderType::Full | HeaderType::Dark => format!("{path}   {links}"),
        HeaderType::Minimal | HeaderType::Centered => path.to_owned(),
        HeaderType::Transparent => links,
    }
}

fn header_links(links: LinksType) -> &'static [&'static str] {
    match links {
        LinksType::Default => &["catalog", "pricing", "log in", "sign up"],
        LinksType::UserType => &["catalog", "my learning", "account", "sign out"],
    }
}

fn sidebar_width(sidebar: SideBarType) -> u16 {
    match sidebar {
        SideBarType::Full | SideBarType::AdminFull => 22,
        SideBarType::Minimal | SideBarType::AdminMinimal => 7,
        SideBarType::None => 0,
    }
}

/// Minimal sidebars show three-letter stubs of the full entries.
pub(crate) fn sidebar_text(sidebar: SideBarType, current: Option<Screen>) -> String {
    let entries: &[SidebarEntry] = match sidebar {
        SideBarType::AdminFull | SideBarType::AdminMinimal => &ADMIN_SIDEBAR,
        SideBarType::Full | SideBarType::Minimal => &MEMBER_SIDEBAR,
        SideBarType::None => &[],
    };
    let compact = matches!(sidebar, SideBarType::Minimal | SideBarType::AdminMinimal);

    entries
        .iter()
        .map(|(label, screen)| {
            let marker = if screen.is_some() && *screen == current {
                CURRENT_MARK
            } else {
                " "
            };
            let label = if compact {
                label.chars().take(3).collect::<String>()
            } else {
                (*label).to_owned()
            };
            format!("{marker} {label}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    shell: &ShellState,
    view_data: &ViewData,
) {
    let Some((screen, table)) = shell
        .screen
        .and_then(|screen| view_data.table(screen).map(|table| (screen, table)))
    else {
        let empty = Paragraph::new(format!("no table at {}", shell.path))
            .block(Block::default().borders(Borders::ALL).title("coursemart"));
        frame.render_widget(empty, area);
        return;
    };

    let headers = table.headers();
    let widths = vec![Constraint::Min(8); headers.len().max(1)];
    let header = Row::new(headers.iter().map(|cell| {
        Cell::from(header_label(cell)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let stale = table.state().stale;
    let rows = table
        .display_rows()
        .into_iter()
        .enumerate()
        .map(|(row_index, cells)| {
            let selected_row = row_index == view_data.selected_row;
            let cells = cells
                .into_iter()
                .enumerate()
                .map(|(column_index, text)| {
                    let mut style = Style::default();
                    if stale {
                        style = style.fg(Color::DarkGray);
                    }
                    if selected_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if selected_row && column_index == view_data.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(text).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        });

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(screen, table))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

fn table_title(screen: Screen, table: &ScreenTable) -> String {
    let mode = match table.mode() {
        TableMode::Local => "local",
        TableMode::Remote => "remote",
    };
    format!("{} ({mode})", screen.label())
}

pub(crate) fn header_label(cell: &HeaderCell) -> String {
    let mut label = cell.label.clone();
    match cell.sort {
        Some(SortDirection::Asc) => label.push_str(SORT_MARK_ASC),
        Some(SortDirection::Desc) => label.push_str(SORT_MARK_DESC),
        None => {}
    }
    if cell.filtered {
        label.push_str(FILTER_MARK_ACTIVE);
    }
    label
}

/// Pagination summary followed by whatever narrows or delays the view.
pub(crate) fn footer_text(table: &ScreenTable) -> String {
    let state = table.state();
    let mut parts = vec![table.summary().to_string()];
    if let Some(sort) = &state.sort {
        parts.push(format!("sort {} {}", sort.column, sort.direction.as_str()));
    }
    for (key, values) in &state.active_filters {
        let label = table.filter_label(key).unwrap_or_else(|| key.clone());
        parts.push(format!("{label}: {}", values.join(", ")));
    }
    if !state.search_query.is_empty() {
        parts.push(format!("search \"{}\"", state.search_query));
    }
    match &state.status {
        LoadStatus::Loading { .. } if state.stale => parts.push("refreshing stale rows".to_owned()),
        LoadStatus::Loading { .. } => parts.push("loading".to_owned()),
        LoadStatus::Failed { message } => parts.push(format!("error: {message}")),
        LoadStatus::Idle | LoadStatus::Ready => {}
    }
    parts.join(" | ")
}

pub(crate) fn status_text(shell: &ShellState, view_data: &ViewData) -> String {
    let mode = if view_data.search_input.is_some() {
        "SEARCH"
    } else {
        "NAV"
    };
    match &shell.status_line {
        Some(status) => format!("{mode} | {status} | {KEY_HINTS}"),
        None => format!("{mode} | {KEY_HINTS}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
