//! Runtime configuration assembled from the command line.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::location::{
    Coordinates, FixedProvider, FusedProvider, HostProvider, IpProvider, LastFixStore,
    PermissionStore, PromptPolicy, TerminalPermissions,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the last known fix comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderMode {
    /// Stored fix, then IP lookup.
    #[default]
    Fused,
    /// Stored fix only.
    Stored,
    /// IP lookup only.
    Ip,
}

impl std::str::FromStr for ProviderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fused" | "auto" => Ok(Self::Fused),
            "stored" | "last" => Ok(Self::Stored),
            "ip" => Ok(Self::Ip),
            _ => Err(format!("Unknown provider '{}'. Use 'fused', 'stored' or 'ip'.", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub provider: ProviderMode,
    /// Manual fix; overrides `provider` when set.
    pub manual: Option<Coordinates>,
    pub prompt: PromptPolicy,
    pub offline: bool,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            provider: ProviderMode::default(),
            manual: None,
            prompt: PromptPolicy::default(),
            offline: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// `~/.gambia`, or `./.gambia` when there is no home directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gambia")
    }

    /// Validate a `--lat/--lon` pair. Both or neither must be given.
    pub fn manual_fix(
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Option<Coordinates>, ConfigError> {
        match (lat, lon) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon)
                .map(Some)
                .ok_or(ConfigError::InvalidCoordinates { lat, lon }),
            _ => Err(ConfigError::PartialCoordinates),
        }
    }

    pub fn permissions(&self) -> TerminalPermissions {
        TerminalPermissions::new(PermissionStore::load_in(&self.data_dir), self.prompt)
    }

    pub fn provider(&self) -> HostProvider {
        if let Some(fix) = self.manual {
            return HostProvider::Fixed(FixedProvider(Some(fix)));
        }
        let store = LastFixStore::in_dir(&self.data_dir);
        match (self.provider, self.offline) {
            (ProviderMode::Stored, _) => HostProvider::Stored(store),
            // Offline IP lookups have nothing to ask.
            (ProviderMode::Ip, true) => HostProvider::Fixed(FixedProvider(None)),
            (ProviderMode::Ip, false) => HostProvider::Ip(IpProvider::new(self.timeout)),
            (ProviderMode::Fused, true) => HostProvider::Fused(FusedProvider::offline(store)),
            (ProviderMode::Fused, false) => {
                HostProvider::Fused(FusedProvider::new(store, Some(IpProvider::new(self.timeout))))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidCoordinates { lat: f64, lon: f64 },
    PartialCoordinates,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCoordinates { lat, lon } => write!(
                f,
                "Invalid coordinates ({}, {}). Lat: -90..90, Lon: -180..180",
                lat, lon
            ),
            Self::PartialCoordinates => write!(f, "--lat and --lon must be given together"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_in(dir: &Path) -> Config {
        Config { data_dir: dir.to_path_buf(), ..Config::default() }
    }

    #[test]
    fn test_provider_mode_parse() {
        assert_eq!("fused".parse::<ProviderMode>(), Ok(ProviderMode::Fused));
        assert_eq!("IP".parse::<ProviderMode>(), Ok(ProviderMode::Ip));
        assert_eq!("last".parse::<ProviderMode>(), Ok(ProviderMode::Stored));
        assert!("gps".parse::<ProviderMode>().is_err());
    }

    #[test]
    fn test_manual_fix() {
        assert_eq!(Config::manual_fix(None, None), Ok(None));
        assert!(Config::manual_fix(Some(12.34), Some(-5.67)).unwrap().is_some());
        assert_eq!(Config::manual_fix(Some(1.0), None), Err(ConfigError::PartialCoordinates));
        assert!(matches!(
            Config::manual_fix(Some(91.0), Some(0.0)),
            Err(ConfigError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_manual_overrides_provider() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = Config {
            manual: Coordinates::new(1.0, 2.0),
            provider: ProviderMode::Ip,
            ..config_in(dir.path())
        };
        assert!(matches!(cfg.provider(), HostProvider::Fixed(FixedProvider(Some(_)))));
    }

    #[test]
    fn test_offline_modes() {
        let dir = tempfile::TempDir::new().unwrap();
        let ip = Config { provider: ProviderMode::Ip, offline: true, ..config_in(dir.path()) };
        assert!(matches!(ip.provider(), HostProvider::Fixed(FixedProvider(None))));
        let fused = Config { offline: true, ..config_in(dir.path()) };
        assert!(matches!(fused.provider(), HostProvider::Fused(_)));
        let stored = Config { provider: ProviderMode::Stored, ..config_in(dir.path()) };
        assert!(matches!(stored.provider(), HostProvider::Stored(_)));
    }

    #[test]
    fn test_default_data_dir_name() {
        assert!(Config::default_data_dir().ends_with(".gambia"));
    }
}
