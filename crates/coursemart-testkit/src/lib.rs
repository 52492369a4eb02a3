// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use coursemart_app::{
    Course, CourseId, CourseStatus, Instructor, InstructorId, InstructorStatus, Order, OrderId,
    OrderStatus,
};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Duration};

const CATEGORIES: [&str; 10] = [
    "Business",
    "Data Science",
    "Design",
    "Finance",
    "Languages",
    "Marketing",
    "Music",
    "Photography",
    "Programming",
    "Wellness",
];

const TOPICS: [&str; 20] = [
    "Rust",
    "SQL",
    "Excel",
    "Figma",
    "Spanish",
    "Guitar",
    "Budgeting",
    "Python",
    "Watercolor",
    "SEO",
    "Negotiation",
    "Statistics",
    "Yoga",
    "Portrait Lighting",
    "Copywriting",
    "Kubernetes",
    "Public Speaking",
    "Machine Learning",
    "Bookkeeping",
    "Typography",
];

const TITLE_FORMS: [&str; 8] = [
    "{} for Beginners",
    "Mastering {}",
    "{} in 30 Days",
    "Practical {}",
    "The Complete {} Bootcamp",
    "{} Fundamentals",
    "Advanced {}",
    "{} Masterclass",
];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const PRICE_POINTS: [i64; 8] = [999, 1_499, 1_999, 2_999, 4_999, 7_999, 9_999, 14_999];

const COURSE_STATUSES: [CourseStatus; 4] = [
    CourseStatus::Published,
    CourseStatus::Published,
    CourseStatus::Draft,
    CourseStatus::Pending,
];
const INSTRUCTOR_STATUSES: [InstructorStatus; 4] = [
    InstructorStatus::Active,
    InstructorStatus::Active,
    InstructorStatus::Active,
    InstructorStatus::Pending,
];
const ORDER_STATUSES: [OrderStatus; 6] = [
    OrderStatus::Paid,
    OrderStatus::Paid,
    OrderStatus::Paid,
    OrderStatus::Pending,
    OrderStatus::Refunded,
    OrderStatus::Failed,
];

const REFERENCE_DATE: Date = date!(2026 - 01 - 01);
const HISTORY_DAYS: i64 = 3 * 365;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Seeded generator for marketplace rows. The same seed always yields the
/// same sequence, so tests and the `--demo` dataset are reproducible.
#[derive(Debug, Clone)]
pub struct CourseFaker {
    rng: DeterministicRng,
    seed: u64,
    next_course: i64,
    next_instructor: i64,
    next_order: i64,
}

impl CourseFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            next_course: 1,
            next_instructor: 1,
            next_order: 1,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn person_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    pub fn course_title(&mut self) -> String {
        let form = self.pick(&TITLE_FORMS);
        form.replacen("{}", self.pick(&TOPICS), 1)
    }

    pub fn course(&mut self) -> Course {
        let id = CourseId::new(self.next_course);
        self.next_course += 1;

        let status = COURSE_STATUSES[self.rng.int_n(COURSE_STATUSES.len())];
        let published = status == CourseStatus::Published;
        let price_cents = if self.rng.chance(15) {
            None
        } else {
            Some(PRICE_POINTS[self.rng.int_n(PRICE_POINTS.len())])
        };
        let enrolled = if published {
            self.int_range(0, 25_000)
        } else {
            0
        };
        let rating = (published && enrolled > 0)
            .then(|| 30 + self.int_range(0, 20))
            .map(|tenths| tenths as f64 / 10.0);

        Course {
            id,
            title: self.course_title(),
            instructor: self.person_name(),
            category: self.pick(&CATEGORIES).to_owned(),
            status,
            price_cents,
            enrolled,
            rating,
            published_on: published.then(|| self.recent_date()),
        }
    }

    pub fn instructor(&mut self) -> Instructor {
        let id = InstructorId::new(self.next_instructor);
        self.next_instructor += 1;

        let name = self.person_name();
        let email = format!(
            "{}{}@example.com",
            name.to_lowercase().replace(' ', "."),
            id.get()
        );
        let courses = self.int_range(0, 24);
        Instructor {
            id,
            name,
            email,
            courses,
            students: courses * self.int_range(0, 900),
            status: INSTRUCTOR_STATUSES[self.rng.int_n(INSTRUCTOR_STATUSES.len())],
            joined_on: self.recent_date(),
        }
    }

    pub fn order(&mut self) -> Order {
        let id = OrderId::new(self.next_order);
        self.next_order += 1;

        Order {
            id,
            student: self.person_name(),
            course_title: self.course_title(),
            amount_cents: PRICE_POINTS[self.rng.int_n(PRICE_POINTS.len())],
            status: ORDER_STATUSES[self.rng.int_n(ORDER_STATUSES.len())],
            placed_on: self.recent_date(),
        }
    }

    pub fn courses(&mut self, count: usize) -> Vec<Course> {
        (0..count).map(|_| self.course()).collect()
    }

    pub fn instructors(&mut self, count: usize) -> Vec<Instructor> {
        (0..count).map(|_| self.instructor()).collect()
    }

    pub fn orders(&mut self, count: usize) -> Vec<Order> {
        (0..count).map(|_| self.order()).collect()
    }

    /// A day within the three years before the reference date.
    pub fn recent_date(&mut self) -> Date {
        let offset = self.int_range(0, HISTORY_DAYS);
        REFERENCE_DATE
            .checked_sub(Duration::days(offset))
            .unwrap_or(REFERENCE_DATE)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_cache_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("coursemart-cache.db");
    Ok((dir, path))
}

pub fn reference_date() -> Date {
    REFERENCE_DATE
}

pub fn categories() -> &'static [&'static str] {
    &CATEGORIES
}
