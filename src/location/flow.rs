//! Location fetch flow: permission check → optional prompt → one last-known query.
//!
//! Every call ends in exactly one outcome. Failures are terminal for the call
//! and are reported once through the notifier; nothing is retried.

use tracing::{debug, info, warn};

use super::types::{
    Coordinates, FetchError, FetchOutcome, PermissionKind, PermissionState, ProviderError,
};
use crate::notify::Notifier;

/// The host's runtime permission subsystem.
#[allow(async_fn_in_trait)]
pub trait PermissionGate {
    /// Current grant state, without prompting.
    fn check(&self, kind: PermissionKind) -> PermissionState;

    /// Prompt the user and wait for the answer.
    async fn request(&self, kind: PermissionKind) -> PermissionState;
}

/// A source of the most recently cached position fix.
#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    /// `Ok(None)` means the provider has no fix.
    async fn last_known(&self) -> Result<Option<Coordinates>, ProviderError>;
}

/// The permission kind this flow asks for.
pub const REQUIRED_PERMISSION: PermissionKind = PermissionKind::FineLocation;

pub struct LocationFlow<G, P, N> {
    gate: G,
    provider: P,
    notifier: N,
}

impl<G, P, N> LocationFlow<G, P, N>
where
    G: PermissionGate,
    P: LocationProvider,
    N: Notifier,
{
    pub fn new(gate: G, provider: P, notifier: N) -> Self {
        Self { gate, provider, notifier }
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one fetch from the top: check, prompt if needed, query once.
    pub async fn request_location(&self) -> FetchOutcome {
        let outcome = match self.gate.check(REQUIRED_PERMISSION) {
            PermissionState::Granted => self.fetch_granted().await,
            current => {
                debug!(%current, "permission not granted, prompting");
                match self.gate.request(REQUIRED_PERMISSION).await {
                    PermissionState::Granted => {
                        info!("permission granted at prompt");
                        self.fetch_granted().await
                    }
                    answer => {
                        info!(%answer, "permission refused at prompt");
                        Err(FetchError::PermissionDenied)
                    }
                }
            }
        };

        match &outcome {
            Ok(fix) => debug!(lat = fix.lat, lon = fix.lon, "location fetched"),
            Err(e) => self.notifier.show_transient(e.user_message()),
        }
        outcome
    }

    async fn fetch_granted(&self) -> FetchOutcome {
        // The grant can be revoked between the prompt and the query.
        let state = self.gate.check(REQUIRED_PERMISSION);
        if !state.is_granted() {
            warn!(%state, "permission lost before query");
            return Err(FetchError::NotAvailable);
        }

        match self.provider.last_known().await {
            Ok(Some(fix)) if fix.is_valid() => Ok(fix),
            Ok(Some(fix)) => {
                warn!(lat = fix.lat, lon = fix.lon, "provider returned out-of-range fix");
                Err(FetchError::NotAvailable)
            }
            Ok(None) => {
                debug!("provider has no last known fix");
                Err(FetchError::NotAvailable)
            }
            Err(e) => {
                warn!(error = %e, "location provider failed");
                Err(FetchError::NotAvailable)
            }
        }
    }
}
