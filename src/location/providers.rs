//! Location providers: manual fix, stored last fix, IP geolocation, and the
//! fused provider that combines the last two.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::flow::LocationProvider;
use super::types::{Coordinates, ProviderError};

pub const IPAPI_URL: &str = "https://ipapi.co/json/";
const USER_AGENT: &str = concat!("gambia/", env!("CARGO_PKG_VERSION"));

// ─── Fixed ──────────────────────────────────────────────────────

/// Always answers with the same fix, or with none.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProvider(pub Option<Coordinates>);

impl LocationProvider for FixedProvider {
    async fn last_known(&self) -> Result<Option<Coordinates>, ProviderError> {
        Ok(self.0)
    }
}

// ─── Stored last fix ────────────────────────────────────────────

/// A fix as written to `last_fix.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFix {
    pub lat: f64,
    pub lon: f64,
    /// UTC millis when the fix was recorded.
    pub recorded_at: i64,
    #[serde(default)]
    pub source: Option<String>,
}

/// The most recent fix, kept at `<data_dir>/last_fix.json`. No expiry: a last
/// known fix may be arbitrarily stale.
#[derive(Debug, Clone)]
pub struct LastFixStore {
    path: PathBuf,
}

impl LastFixStore {
    pub const FILE_NAME: &'static str = "last_fix.json";

    pub fn in_dir(data_dir: &Path) -> Self {
        Self { path: data_dir.join(Self::FILE_NAME) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<StoredFix>, ProviderError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", self.path.display(), e)))
    }

    pub async fn record(&self, fix: Coordinates, source: &str) -> Result<(), ProviderError> {
        let stored = StoredFix {
            lat: fix.lat,
            lon: fix.lon,
            recorded_at: chrono::Utc::now().timestamp_millis(),
            source: Some(source.to_string()),
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

impl LocationProvider for LastFixStore {
    async fn last_known(&self) -> Result<Option<Coordinates>, ProviderError> {
        match self.load().await? {
            Some(s) => Coordinates::new(s.lat, s.lon).map(Some).ok_or_else(|| {
                let msg = format!("stored fix out of range: {}, {}", s.lat, s.lon);
                ProviderError::InvalidResponse(msg)
            }),
            None => Ok(None),
        }
    }
}

// ─── IP geolocation ─────────────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Coarse fix from the public IP address (ipapi.co).
#[derive(Debug, Clone)]
pub struct IpProvider {
    url: String,
    timeout: Duration,
}

impl IpProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_url(IPAPI_URL, timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self { url: url.into(), timeout }
    }

    fn fetch_blocking(url: &str, timeout: Duration) -> Result<IpApiResult, ProviderError> {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let response = agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        response
            .into_json()
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

impl LocationProvider for IpProvider {
    async fn last_known(&self) -> Result<Option<Coordinates>, ProviderError> {
        let url = self.url.clone();
        let timeout = self.timeout;
        debug!(%url, "querying IP geolocation");
        let result = tokio::task::spawn_blocking(move || Self::fetch_blocking(&url, timeout))
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))??;
        result.into_fix()
    }
}

impl IpApiResult {
    /// A body without coordinates is "no fix".
    fn into_fix(self) -> Result<Option<Coordinates>, ProviderError> {
        if self.error {
            let reason = self.reason.unwrap_or_else(|| "unspecified".into());
            return Err(ProviderError::InvalidResponse(reason));
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map(Some).ok_or_else(|| {
                let msg = format!("coordinates out of range: {}, {}", lat, lon);
                ProviderError::InvalidResponse(msg)
            }),
            _ => Ok(None),
        }
    }
}

// ─── Fused ──────────────────────────────────────────────────────

/// Last stored fix first; otherwise, when online, an IP fix that becomes the
/// new stored fix.
#[derive(Debug, Clone)]
pub struct FusedProvider {
    store: LastFixStore,
    ip: Option<IpProvider>,
}

impl FusedProvider {
    pub fn new(store: LastFixStore, ip: Option<IpProvider>) -> Self {
        Self { store, ip }
    }

    /// Offline: only the stored fix is consulted.
    pub fn offline(store: LastFixStore) -> Self {
        Self { store, ip: None }
    }
}

impl LocationProvider for FusedProvider {
    async fn last_known(&self) -> Result<Option<Coordinates>, ProviderError> {
        let stored = match self.store.last_known().await {
            Ok(fix) => fix,
            Err(e) if self.ip.is_some() => {
                warn!(error = %e, "stored fix unreadable, falling back to IP");
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(fix) = stored {
            debug!("using stored fix");
            return Ok(Some(fix));
        }

        let Some(ip) = &self.ip else {
            return Ok(None);
        };
        let fix = ip.last_known().await?;
        if let Some(fix) = fix {
            info!(path = %self.store.path().display(), "recording IP fix");
            if let Err(e) = self.store.record(fix, "ip").await {
                warn!(error = %e, "could not record fix");
            }
        }
        Ok(fix)
    }
}

// ─── Host dispatch ──────────────────────────────────────────────

/// One of the host providers, chosen at startup.
#[derive(Debug, Clone)]
pub enum HostProvider {
    Fixed(FixedProvider),
    Stored(LastFixStore),
    Ip(IpProvider),
    Fused(FusedProvider),
}

impl LocationProvider for HostProvider {
    async fn last_known(&self) -> Result<Option<Coordinates>, ProviderError> {
        match self {
            Self::Fixed(p) => p.last_known().await,
            Self::Stored(p) => p.last_known().await,
            Self::Ip(p) => p.last_known().await,
            Self::Fused(p) => p.last_known().await,
        }
    }
}
