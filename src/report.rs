//! JSON summary of one screen load, printed on stdout.

use serde::Serialize;

use crate::location::{FetchError, FetchOutcome};

#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub status: &'static str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchError>,
    pub notifications: Vec<String>,
}

impl FetchReport {
    pub fn new(outcome: &FetchOutcome, notifications: Vec<String>) -> Self {
        match outcome {
            Ok(fix) => Self {
                status: "success",
                latitude: Some(fix.lat),
                longitude: Some(fix.lon),
                error: None,
                notifications,
            },
            Err(e) => Self {
                status: "failure",
                latitude: None,
                longitude: None,
                error: Some(*e),
                notifications,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinates;

    #[test]
    fn test_success_report() {
        let outcome = Ok(Coordinates::new(12.34, -5.67).unwrap());
        let report = FetchReport::new(&outcome, vec![]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["latitude"], 12.34);
        assert!(json.get("error").is_none());
        assert!(report.is_success());
    }

    #[test]
    fn test_failure_report() {
        let outcome = Err(FetchError::PermissionDenied);
        let report = FetchReport::new(&outcome, vec!["Location permission denied".into()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error"], "permission_denied");
        assert!(json["latitude"].is_null());
        assert_eq!(json["notifications"][0], "Location permission denied");
    }
}
