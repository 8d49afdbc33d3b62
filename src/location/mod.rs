//! Location subsystem: permission gate, last-known-location providers and
//! the fetch flow that ties them together.

pub mod flow;
pub mod permission;
pub mod providers;
pub mod types;

pub use flow::{LocationFlow, LocationProvider, PermissionGate, REQUIRED_PERMISSION};
pub use permission::{PermissionStore, PromptPolicy, TerminalPermissions};
pub use providers::{FixedProvider, FusedProvider, HostProvider, IpProvider, LastFixStore};
pub use types::{
    Coordinates, FetchError, FetchOutcome, PermissionKind, PermissionState, ProviderError,
};
