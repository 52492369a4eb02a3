// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideBarType {
    #[serde(rename = "minimal")]
    Minimal,
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "admin-full")]
    AdminFull,
    #[serde(rename = "admin-minimal")]
    AdminMinimal,
    #[serde(rename = "none")]
    None,
}

impl SideBarType {
    pub const ALL: [Self; 5] = [
        Self::Minimal,
        Self::Full,
        Self::AdminFull,
        Self::AdminMinimal,
        Self::None,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Full => "full",
            Self::AdminFull => "admin-full",
            Self::AdminMinimal => "admin-minimal",
            Self::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Self::AdminFull | Self::AdminMinimal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderType {
    None,
    Home,
    Minimal,
    Full,
    Centered,
    Transparent,
    Dark,
}

impl HeaderType {
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Home,
        Self::Minimal,
        Self::Full,
        Self::Centered,
        Self::Transparent,
        Self::Dark,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Home => "home",
            Self::Minimal => "minimal",
            Self::Full => "full",
            Self::Centered => "centered",
            Self::Transparent => "transparent",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinksType {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "userType")]
    UserType,
}

impl LinksType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::UserType => "userType",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "userType" => Some(Self::UserType),
            _ => None,
        }
    }
}

/// Navigation chrome wrapping a page: which sidebar, header and link set
/// the shell mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChromeLayout {
    pub sidebar: SideBarType,
    pub header: HeaderType,
    pub links: LinksType,
}

impl ChromeLayout {
    pub const fn new(sidebar: SideBarType, header: HeaderType, links: LinksType) -> Self {
        Self {
            sidebar,
            header,
            links,
        }
    }

    /// Chrome used when no route pattern matches: no sidebar, no header.
    pub const FALLBACK: Self = Self::new(SideBarType::None, HeaderType::None, LinksType::Default);
}

impl Default for ChromeLayout {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Strips trailing slashes; the root path stays `/`. An empty path is
/// treated as the root.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let stripped = trimmed.trim_end_matches('/');
    if stripped.is_empty() {
        return "/".to_owned();
    }
    stripped.to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Courses,
    Instructors,
    Orders,
}

impl ResourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Instructors => "instructors",
            Self::Orders => "orders",
        }
    }
}

/// A table screen of the marketplace, addressed by its navigation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    AdminCourses,
    AdminInstructors,
    AdminOrders,
    InstructorCourses,
    Catalog,
}

impl Screen {
    pub const ALL: [Self; 5] = [
        Self::AdminCourses,
        Self::AdminInstructors,
        Self::AdminOrders,
        Self::InstructorCourses,
        Self::Catalog,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::AdminCourses => "/admin/courses",
            Self::AdminInstructors => "/admin/instructors",
            Self::AdminOrders => "/admin/orders",
            Self::InstructorCourses => "/instructor/courses",
            Self::Catalog => "/courses",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AdminCourses => "courses",
            Self::AdminInstructors => "instructors",
            Self::AdminOrders => "orders",
            Self::InstructorCourses => "my courses",
            Self::Catalog => "catalog",
        }
    }

    pub const fn resource(self) -> ResourceKind {
        match self {
            Self::AdminCourses | Self::InstructorCourses | Self::Catalog => ResourceKind::Courses,
            Self::AdminInstructors => ResourceKind::Instructors,
            Self::AdminOrders => ResourceKind::Orders,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let normalized = normalize_path(path);
        Self::ALL
            .into_iter()
            .find(|screen| screen.path() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Pending,
    Published,
    Archived,
}

impl CourseStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructorStatus {
    Active,
    Pending,
    Suspended,
}

impl InstructorStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Paid,
    Pending,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "paid" => Some(Self::Paid),
            "pending" => Some(Self::Pending),
            "refunded" => Some(Self::Refunded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub instructor: String,
    pub category: String,
    pub status: CourseStatus,
    /// `None` for free courses.
    #[serde(default)]
    pub price_cents: Option<i64>,
    pub enrolled: i64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, with = "iso_date::option")]
    pub published_on: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: InstructorId,
    pub name: String,
    pub email: String,
    pub courses: i64,
    pub students: i64,
    pub status: InstructorStatus,
    #[serde(with = "iso_date")]
    pub joined_on: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub student: String,
    pub course_title: String,
    pub amount_cents: i64,
    pub status: OrderStatus,
    #[serde(with = "iso_date")]
    pub placed_on: Date,
}
