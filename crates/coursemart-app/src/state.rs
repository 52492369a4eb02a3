// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ChromeLayout, Screen, normalize_path};

/// Resolves the navigation chrome for a path.
pub trait LayoutResolver {
    fn layout_for(&self, path: &str) -> ChromeLayout;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    pub path: String,
    pub screen: Option<Screen>,
    pub layout: ChromeLayout,
    pub status_line: Option<String>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            path: "/".to_owned(),
            screen: None,
            layout: ChromeLayout::FALLBACK,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Navigate(String),
    Open(Screen),
    NextScreen,
    PrevScreen,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    PathChanged(String),
    ScreenChanged(Option<Screen>),
    LayoutChanged(ChromeLayout),
    StatusUpdated(String),
    StatusCleared,
}

impl ShellState {
    pub fn dispatch<L>(&mut self, command: ShellCommand, routes: &L) -> Vec<ShellEvent>
    where
        L: LayoutResolver + ?Sized,
    {
        match command {
            ShellCommand::Navigate(path) => self.navigate(&path, routes),
            ShellCommand::Open(screen) => self.navigate(screen.path(), routes),
            ShellCommand::NextScreen => self.rotate_screen(1, routes),
            ShellCommand::PrevScreen => self.rotate_screen(-1, routes),
            ShellCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![ShellEvent::StatusUpdated(message)]
            }
            ShellCommand::ClearStatus => {
                if self.status_line.take().is_none() {
                    return Vec::new();
                }
                vec![ShellEvent::StatusCleared]
            }
        }
    }

    fn navigate<L>(&mut self, path: &str, routes: &L) -> Vec<ShellEvent>
    where
        L: LayoutResolver + ?Sized,
    {
        let path = normalize_path(path);
        if path == self.path {
            return Vec::new();
        }

        let mut events = vec![ShellEvent::PathChanged(path.clone())];
        let screen = Screen::from_path(&path);
        if screen != self.screen {
            self.screen = screen;
            events.push(ShellEvent::ScreenChanged(screen));
        }

        let layout = routes.layout_for(&path);
        if layout != self.layout {
            self.layout = layout;
            events.push(ShellEvent::LayoutChanged(layout));
        }
        self.path = path;
        events
    }

    fn rotate_screen<L>(&mut self, delta: isize, routes: &L) -> Vec<ShellEvent>
    where
        L: LayoutResolver + ?Sized,
    {
        let screens = Screen::ALL;
        let current = self
            .screen
            .and_then(|screen| screens.iter().position(|candidate| *candidate == screen));
        let next = match current {
            Some(index) => {
                let len = screens.len() as isize;
                (index as isize + delta).rem_euclid(len) as usize
            }
            None if delta < 0 => screens.len() - 1,
            None => 0,
        };
        self.navigate(screens[next].path(), routes)
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutResolver, ShellCommand, ShellEvent, ShellState};
    use crate::{ChromeLayout, HeaderType, LinksType, Screen, SideBarType};

    struct PrefixRoutes;

    impl LayoutResolver for PrefixRoutes {
        fn layout_for(&self, path: &str) -> ChromeLayout {
            if path.starts_with("/admin") {
                ChromeLayout::new(SideBarType::AdminFull, HeaderType::Dark, LinksType::UserType)
            } else if path.starts_with("/courses") {
                ChromeLayout::new(SideBarType::None, HeaderType::Home, LinksType::Default)
            } else {
                ChromeLayout::FALLBACK
            }
        }
    }

    #[test]
    fn navigate_reports_path_screen_and_layout() {
        let mut state = ShellState::default();

        let events = state.dispatch(
            ShellCommand::Navigate("/admin/courses/".to_owned()),
            &PrefixRoutes,
        );
        assert_eq!(state.path, "/admin/courses");
        assert_eq!(state.screen, Some(Screen::AdminCourses));
        assert_eq!(
            events,
            vec![
                ShellEvent::PathChanged("/admin/courses".to_owned()),
                ShellEvent::ScreenChanged(Some(Screen::AdminCourses)),
                ShellEvent::LayoutChanged(ChromeLayout::new(
                    SideBarType::AdminFull,
                    HeaderType::Dark,
                    LinksType::UserType,
                )),
            ],
        );
    }

    #[test]
    fn navigate_within_same_chrome_skips_layout_event() {
        let mut state = ShellState::default();
        state.dispatch(ShellCommand::Open(Screen::AdminCourses), &PrefixRoutes);

        let events = state.dispatch(ShellCommand::Open(Screen::AdminOrders), &PrefixRoutes);
        assert_eq!(
            events,
            vec![
                ShellEvent::PathChanged("/admin/orders".to_owned()),
                ShellEvent::ScreenChanged(Some(Screen::AdminOrders)),
            ],
        );
    }

    #[test]
    fn navigate_to_same_path_is_silent() {
        let mut state = ShellState::default();
        state.dispatch(ShellCommand::Open(Screen::Catalog), &PrefixRoutes);
        let events = state.dispatch(
            ShellCommand::Navigate("/courses/".to_owned()),
            &PrefixRoutes,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn screen_rotation_wraps() {
        let mut state = ShellState::default();
        state.dispatch(ShellCommand::Open(Screen::Catalog), &PrefixRoutes);

        state.dispatch(ShellCommand::NextScreen, &PrefixRoutes);
        assert_eq!(state.screen, Some(Screen::AdminCourses));

        state.dispatch(ShellCommand::PrevScreen, &PrefixRoutes);
        assert_eq!(state.screen, Some(Screen::Catalog));
    }

    #[test]
    fn rotation_from_unknown_path_starts_at_edges() {
        let mut state = ShellState::default();
        state.dispatch(ShellCommand::PrevScreen, &PrefixRoutes);
        assert_eq!(state.screen, Some(Screen::Catalog));
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = ShellState::default();
        let set = state.dispatch(ShellCommand::SetStatus("loaded".to_owned()), &PrefixRoutes);
        assert_eq!(set, vec![ShellEvent::StatusUpdated("loaded".to_owned())]);

        let cleared = state.dispatch(ShellCommand::ClearStatus, &PrefixRoutes);
        assert_eq!(cleared, vec![ShellEvent::StatusCleared]);
        assert!(state.dispatch(ShellCommand::ClearStatus, &PrefixRoutes).is_empty());
    }
}
