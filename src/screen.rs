//! Display state for the location screen.
//!
//! The screen is the only writer of [`DisplayState`]. Each fetch gets a
//! ticket; results carrying a ticket older than the latest fetch are dropped.

use serde::Serialize;
use std::fmt::Write;
use tracing::debug;

use crate::location::{Coordinates, FetchOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DisplayState {
    Loading,
    Located { latitude: String, longitude: String },
    Failed { message: String },
}

impl DisplayState {
    pub fn from_outcome(outcome: &FetchOutcome) -> Self {
        match outcome {
            Ok(fix) => Self::located(*fix),
            Err(e) => Self::Failed { message: e.user_message().to_string() },
        }
    }

    fn located(fix: Coordinates) -> Self {
        Self::Located {
            latitude: format!("{:?}", fix.lat),
            longitude: format!("{:?}", fix.lon),
        }
    }
}

/// Identifies one fetch started by [`LocationScreen::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug)]
pub struct LocationScreen {
    state: DisplayState,
    generation: u64,
}

impl Default for LocationScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationScreen {
    pub fn new() -> Self {
        Self { state: DisplayState::Loading, generation: 0 }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Start a new fetch. Any fetch still in flight becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.state = DisplayState::Loading;
        FetchTicket(self.generation)
    }

    /// Apply a fetch result. Returns false when the ticket is stale.
    pub fn apply(&mut self, ticket: FetchTicket, outcome: &FetchOutcome) -> bool {
        if ticket.0 != self.generation {
            debug!(ticket = ticket.0, current = self.generation, "dropping stale fetch result");
            return false;
        }
        self.state = DisplayState::from_outcome(outcome);
        true
    }

    pub fn render(&self) -> String {
        let (lat, lon, note) = match &self.state {
            DisplayState::Loading => ("Loading...", "Loading...", None),
            DisplayState::Located { latitude, longitude } => {
                (latitude.as_str(), longitude.as_str(), None)
            }
            DisplayState::Failed { message } => {
                ("unavailable", "unavailable", Some(message.as_str()))
            }
        };
        let mut out = String::from("Your Location:\n");
        let _ = writeln!(out, "Latitude: {}", lat);
        let _ = writeln!(out, "Longitude: {}", lon);
        if let Some(note) = note {
            let _ = writeln!(out, "{}", note);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::FetchError;

    fn fix(lat: f64, lon: f64) -> FetchOutcome {
        Ok(Coordinates::new(lat, lon).unwrap())
    }

    #[test]
    fn test_starts_loading() {
        let screen = LocationScreen::new();
        assert_eq!(screen.state(), &DisplayState::Loading);
        assert_eq!(
            screen.render(),
            "Your Location:\nLatitude: Loading...\nLongitude: Loading...\n"
        );
    }

    #[test]
    fn test_success_renders_coordinates() {
        let mut screen = LocationScreen::new();
        let t = screen.begin_fetch();
        assert!(screen.apply(t, &fix(12.34, -5.67)));
        assert_eq!(screen.render(), "Your Location:\nLatitude: 12.34\nLongitude: -5.67\n");
    }

    #[test]
    fn test_failure_renders_message() {
        let mut screen = LocationScreen::new();
        let t = screen.begin_fetch();
        screen.apply(t, &Err(FetchError::PermissionDenied));
        assert_eq!(
            screen.state(),
            &DisplayState::Failed { message: "Location permission denied".into() }
        );
        assert!(screen.render().ends_with("Location permission denied\n"));
    }

    #[test]
    fn test_stale_result_dropped() {
        let mut screen = LocationScreen::new();
        let first = screen.begin_fetch();
        let second = screen.begin_fetch();
        assert!(screen.apply(second, &fix(1.0, 2.0)));
        assert!(!screen.apply(first, &Err(FetchError::NotAvailable)));
        assert_eq!(
            screen.state(),
            &DisplayState::Located { latitude: "1.0".into(), longitude: "2.0".into() }
        );
    }

    #[test]
    fn test_whole_degrees_keep_decimal() {
        let mut screen = LocationScreen::new();
        let t = screen.begin_fetch();
        screen.apply(t, &fix(13.0, -16.0));
        assert_eq!(screen.render(), "Your Location:\nLatitude: 13.0\nLongitude: -16.0\n");
    }

    #[test]
    fn test_new_fetch_resets_to_loading() {
        let mut screen = LocationScreen::new();
        let t = screen.begin_fetch();
        screen.apply(t, &fix(1.5, 2.5));
        screen.begin_fetch();
        assert_eq!(screen.state(), &DisplayState::Loading);
    }

    #[test]
    fn test_state_json() {
        let state = DisplayState::from_outcome(&fix(13.45, -16.58));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "located");
        assert_eq!(json["latitude"], "13.45");
    }
}
