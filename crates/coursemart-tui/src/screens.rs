// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Column presets per resource and the per-screen table wrapper the UI
//! drives without knowing the row type.

use anyhow::{Result, anyhow, bail};
use coursemart_app::{
    Course, CourseStatus, Instructor, InstructorStatus, Order, OrderStatus, ResourceKind, Screen,
    SortDirection, format_count,
};
use coursemart_table::{
    CellValue, ColumnSpec, FilterDefinition, Page, PageSummary, PendingFetch, SortSpec,
    TableConfig, TableEngine, TableEvent, TableMode, TableState,
};

const COURSE_STATUSES: [CourseStatus; 4] = [
    CourseStatus::Draft,
    CourseStatus::Pending,
    CourseStatus::Published,
    CourseStatus::Archived,
];

const INSTRUCTOR_STATUSES: [InstructorStatus; 3] = [
    InstructorStatus::Active,
    InstructorStatus::Pending,
    InstructorStatus::Suspended,
];

const ORDER_STATUSES: [OrderStatus; 4] = [
    OrderStatus::Paid,
    OrderStatus::Pending,
    OrderStatus::Refunded,
    OrderStatus::Failed,
];

pub fn course_columns() -> Vec<ColumnSpec<Course>> {
    vec![
        ColumnSpec::new("id", "ID", |course: &Course| {
            CellValue::Integer(course.id.get())
        })
        .sortable(),
        ColumnSpec::new("title", "Title", |course: &Course| {
            CellValue::text(course.title.clone())
        })
        .sortable()
        .filterable(),
        ColumnSpec::new("instructor", "Instructor", |course: &Course| {
            CellValue::text(course.instructor.clone())
        })
        .sortable()
        .filterable(),
        ColumnSpec::new("category", "Category", |course: &Course| {
            CellValue::text(course.category.clone())
        })
        .sortable()
        .filterable(),
        ColumnSpec::new("status", "Status", |course: &Course| {
            CellValue::text(course.status.as_str())
        })
        .sortable(),
        // Free courses have no price: they read as "free" and sort last.
        ColumnSpec::new("price", "Price", |course: &Course| {
            CellValue::money(course.price_cents)
        })
        .sortable()
        .render(|value, _: &Course| {
            if value.is_null() {
                "free".to_owned()
            } else {
                value.display()
            }
        }),
        ColumnSpec::new("enrolled", "Enrolled", |course: &Course| {
            CellValue::Integer(course.enrolled)
        })
        .sortable()
        .render(|_, course: &Course| format_count(course.enrolled)),
        ColumnSpec::new("rating", "Rating", |course: &Course| {
            CellValue::decimal(course.rating)
        })
        .sortable(),
        ColumnSpec::new("published_on", "Published", |course: &Course| {
            CellValue::date(course.published_on)
        })
        .sortable(),
    ]
}

pub fn course_filters() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::derived("category", "Category", "category"),
        FilterDefinition::fixed(
            "status",
            "Status",
            "status",
            COURSE_STATUSES.map(CourseStatus::as_str),
        ),
    ]
}

pub fn instructor_columns() -> Vec<ColumnSpec<Instructor>> {
    vec![
        ColumnSpec::new("id", "ID", |instructor: &Instructor| {
            CellValue::Integer(instructor.id.get())
        })
        .sortable(),
        ColumnSpec::new("name", "Name", |instructor: &Instructor| {
            CellValue::text(instructor.name.clone())
        })
        .sortable()
        .filterable(),
        ColumnSpec::new("email", "Email", |instructor: &Instructor| {
            CellValue::text(instructor.email.clone())
        })
        .filterable(),
        ColumnSpec::new("courses", "Courses", |instructor: &Instructor| {
            CellValue::Integer(instructor.courses)
        })
        .sortable(),
        ColumnSpec::new("students", "Students", |instructor: &Instructor| {
            CellValue::Integer(instructor.students)
        })
        .sortable()
        .render(|_, instructor: &Instructor| format_count(instructor.students)),
        ColumnSpec::new("status", "Status", |instructor: &Instructor| {
            CellValue::text(instructor.status.as_str())
        })
        .sortable(),
        ColumnSpec::new("joined_on", "Joined", |instructor: &Instructor| {
            CellValue::Date(instructor.joined_on)
        })
        .sortable(),
    ]
}

pub fn instructor_filters() -> Vec<FilterDefinition> {
    vec![FilterDefinition::fixed(
        "status",
        "Status",
        "status",
        INSTRUCTOR_STATUSES.map(InstructorStatus::as_str),
    )]
}

pub fn order_columns() -> Vec<ColumnSpec<Order>> {
    vec![
        ColumnSpec::new("id", "ID", |order: &Order| CellValue::Integer(order.id.get())).sortable(),
        ColumnSpec::new("student", "Student", |order: &Order| {
            CellValue::text(order.student.clone())
        })
        .sortable()
        .filterable(),
        ColumnSpec::new("course", "Course", |order: &Order| {
            CellValue::text(order.course_title.clone())
        })
        .sortable()
        .filterable(),
        ColumnSpec::new("amount", "Amount", |order: &Order| {
            CellValue::Money(order.amount_cents)
        })
        .sortable(),
        ColumnSpec::new("status", "Status", |order: &Order| {
            CellValue::text(order.status.as_str())
        })
        .sortable(),
        ColumnSpec::new("placed_on", "Placed", |order: &Order| {
            CellValue::Date(order.placed_on)
        })
        .sortable(),
    ]
}

pub fn order_filters() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::fixed(
            "status",
            "Status",
            "status",
            ORDER_STATUSES.map(OrderStatus::as_str),
        ),
        FilterDefinition::derived("course", "Course", "course"),
    ]
}

/// Course table as each course screen presents it: the catalog hides
/// back-office columns and opens on the most popular courses, and the
/// instructor's own list drops the instructor column.
pub fn course_config(screen: Screen, page_size: usize) -> TableConfig<Course> {
    let config = TableConfig::new(course_columns())
        .filters(course_filters())
        .page_size(page_size);
    match screen {
        Screen::Catalog => config
            .hidden(["id", "status"])
            .sort(SortSpec::new("enrolled", SortDirection::Desc)),
        Screen::InstructorCourses => config.hidden(["instructor"]),
        _ => config,
    }
}

pub fn instructor_config(page_size: usize) -> TableConfig<Instructor> {
    TableConfig::new(instructor_columns())
        .filters(instructor_filters())
        .page_size(page_size)
        .hidden(["email"])
}

pub fn order_config(page_size: usize) -> TableConfig<Order> {
    TableConfig::new(order_columns())
        .filters(order_filters())
        .page_size(page_size)
        .sort(SortSpec::new("placed_on", SortDirection::Desc))
}

/// Every row of one resource, for tables held in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Courses(Vec<Course>),
    Instructors(Vec<Instructor>),
    Orders(Vec<Order>),
}

impl Dataset {
    pub const fn resource(&self) -> ResourceKind {
        match self {
            Self::Courses(_) => ResourceKind::Courses,
            Self::Instructors(_) => ResourceKind::Instructors,
            Self::Orders(_) => ResourceKind::Orders,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Courses(rows) => rows.len(),
            Self::Instructors(rows) => rows.len(),
            Self::Orders(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One server page of one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePage {
    Courses(Page<Course>),
    Instructors(Page<Instructor>),
    Orders(Page<Order>),
}

impl ResourcePage {
    pub const fn resource(&self) -> ResourceKind {
        match self {
            Self::Courses(_) => ResourceKind::Courses,
            Self::Instructors(_) => ResourceKind::Instructors,
            Self::Orders(_) => ResourceKind::Orders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub sort: Option<SortDirection>,
    pub sortable: bool,
    /// Some value of the filter attached to this column is selected.
    pub filtered: bool,
}

#[derive(Debug)]
pub enum ScreenTable {
    Courses(TableEngine<Course>),
    Instructors(TableEngine<Instructor>),
    Orders(TableEngine<Order>),
}

macro_rules! with_engine {
    ($table:expr, $engine:ident => $body:expr) => {
        match $table {
            ScreenTable::Courses($engine) => $body,
            ScreenTable::Instructors($engine) => $body,
            ScreenTable::Orders($engine) => $body,
        }
    };
}

impl ScreenTable {
    pub fn local(screen: Screen, page_size: usize, dataset: Dataset) -> Result<Self> {
        if dataset.resource() != screen.resource() {
            bail!(
                "{} screen cannot show {} rows",
                screen.label(),
                dataset.resource().as_str()
            );
        }
        let table = match dataset {
            Dataset::Courses(rows) => {
                Self::Courses(TableEngine::local(course_config(screen, page_size), rows)?)
            }
            Dataset::Instructors(rows) => {
                Self::Instructors(TableEngine::local(instructor_config(page_size), rows)?)
            }
            Dataset::Orders(rows) => {
                Self::Orders(TableEngine::local(order_config(page_size), rows)?)
            }
        };
        Ok(table)
    }

    /// A remote table has its first request pending as soon as it exists.
    pub fn remote(screen: Screen, page_size: usize) -> Result<Self> {
        let table = match screen.resource() {
            ResourceKind::Courses => {
                Self::Courses(TableEngine::remote(course_config(screen, page_size))?)
            }
            ResourceKind::Instructors => {
                Self::Instructors(TableEngine::remote(instructor_config(page_size))?)
            }
            ResourceKind::Orders => Self::Orders(TableEngine::remote(order_config(page_size))?),
        };
        Ok(table)
    }

    pub fn mode(&self) -> TableMode {
        with_engine!(self, engine => engine.mode())
    }

    pub fn state(&self) -> &TableState {
        with_engine!(self, engine => engine.state())
    }

    pub fn summary(&self) -> PageSummary {
        with_engine!(self, engine => engine.summary())
    }

    pub fn headers(&self) -> Vec<HeaderCell> {
        with_engine!(self, engine => {
            let state = engine.state();
            engine
                .visible_columns()
                .into_iter()
                .map(|column| HeaderCell {
                    key: column.key().to_owned(),
                    label: column.header().to_owned(),
                    sort: engine.sort_direction(column.key()),
                    sortable: column.is_sortable(),
                    filtered: engine
                        .filters()
                        .for_column(column.key())
                        .is_some_and(|filter| state.active_filters.contains_key(&filter.key)),
                })
                .collect()
        })
    }

    /// Rows on the current page.
    pub fn row_count(&self) -> usize {
        with_engine!(self, engine => engine.rows().len())
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        with_engine!(self, engine => engine.display_rows())
    }

    /// Key and label of the filter reading `column`.
    pub fn filter_for_column(&self, column: &str) -> Option<(String, String)> {
        with_engine!(self, engine => engine
            .filters()
            .for_column(column)
            .map(|filter| (filter.key.clone(), filter.label.clone())))
    }

    pub fn filter_label(&self, key: &str) -> Option<String> {
        with_engine!(self, engine => engine.filters().get(key).map(|filter| filter.label.clone()))
    }

    pub fn export_visible(&self) -> Result<Vec<u8>> {
        with_engine!(self, engine => engine.export_visible())
    }

    pub fn set_page(&mut self, page_index: usize) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.set_page(page_index))
    }

    pub fn next_page(&mut self) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.next_page())
    }

    pub fn prev_page(&mut self) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.prev_page())
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.set_page_size(page_size))
    }

    pub fn cycle_sort(&mut self, column: &str) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.cycle_sort(column))
    }

    pub fn clear_sort(&mut self) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.clear_sort())
    }

    pub fn toggle_filter_value(&mut self, key: &str, value: &str) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.toggle_filter_value(key, value))
    }

    pub fn clear_filters(&mut self) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.clear_filters())
    }

    pub fn set_search(&mut self, query: &str) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.set_search(query))
    }

    pub fn hide_column(&mut self, key: &str) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.hide_column(key))
    }

    pub fn show_all_columns(&mut self) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.show_all_columns())
    }

    pub fn retry(&mut self) -> Vec<TableEvent> {
        with_engine!(self, engine => engine.retry())
    }

    pub fn take_pending_fetch(&mut self) -> Option<PendingFetch> {
        with_engine!(self, engine => engine.take_pending_fetch())
    }

    /// Hands a fetched page to the engine. A page of the wrong resource is
    /// treated as a failed fetch.
    pub fn receive(&mut self, seq: u64, result: Result<ResourcePage>) -> Vec<TableEvent> {
        match (self, result) {
            (Self::Courses(engine), Ok(ResourcePage::Courses(page))) => {
                engine.receive(seq, Ok(page))
            }
            (Self::Instructors(engine), Ok(ResourcePage::Instructors(page))) => {
                engine.receive(seq, Ok(page))
            }
            (Self::Orders(engine), Ok(ResourcePage::Orders(page))) => engine.receive(seq, Ok(page)),
            (table, Ok(page)) => {
                let error = anyhow!("received {} rows", page.resource().as_str());
                with_engine!(table, engine => engine.receive(seq, Err(error)))
            }
            (table, Err(error)) => with_engine!(table, engine => engine.receive(seq, Err(error))),
        }
    }
}
