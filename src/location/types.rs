//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Build a fix, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self { lat, lon })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.lat, self.lon).is_some()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}, {:?}", self.lat, self.lon)
    }
}

/// Which runtime permission is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    FineLocation,
    CoarseLocation,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FineLocation => write!(f, "fine location"),
            Self::CoarseLocation => write!(f, "coarse location"),
        }
    }
}

/// Grant state of a runtime permission as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Never asked.
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Terminal failure of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchError {
    PermissionDenied,
    NotAvailable,
}

impl FetchError {
    /// The one-line message shown to the user.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location permission denied",
            Self::NotAvailable => "Location not available",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for FetchError {}

/// Result of one `request_location` call.
pub type FetchOutcome = Result<Coordinates, FetchError>;

/// Why a location provider could not answer.
#[derive(Debug)]
pub enum ProviderError {
    Network(String),
    InvalidResponse(String),
    Io(std::io::Error),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid provider response: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(12.34, -5.67).is_some());
        assert!(Coordinates::new(90.0, 180.0).is_some());
        assert!(Coordinates::new(90.5, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.1).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_coordinates_display() {
        let c = Coordinates::new(12.34, -5.67).unwrap();
        assert_eq!(c.to_string(), "12.34, -5.67");
    }

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::PermissionDenied.to_string(), "Location permission denied");
        assert_eq!(FetchError::NotAvailable.to_string(), "Location not available");
    }

    #[test]
    fn test_permission_state_serde() {
        let json = serde_json::to_string(&PermissionState::Granted).unwrap();
        assert_eq!(json, "\"granted\"");
        let back: PermissionState = serde_json::from_str("\"denied\"").unwrap();
        assert_eq!(back, PermissionState::Denied);
    }
}
