use clap::Parser;
use gambia::config::{Config, ProviderMode, DEFAULT_TIMEOUT_SECS};
use gambia::location::{LocationFlow, PermissionStore, PromptPolicy, REQUIRED_PERMISSION};
use gambia::notify::{RecordingNotifier, StderrNotifier};
use gambia::report::FetchReport;
use gambia::screen::LocationScreen;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Gambia — show this device's last known location.
///
/// Checks the location permission, prompts once if it is missing, then
/// fetches the last known fix a single time.
///
/// Examples:
///   gambia
///   gambia --yes --provider ip
///   gambia --offline
///   gambia --lat 13.4531 --lon -16.5775
///   gambia --reset-permission
#[derive(Parser)]
#[command(name = "gambia", version, about, long_about = None)]
struct Cli {
    /// Location source: "fused" (stored fix, then IP), "stored" or "ip".
    #[arg(long, default_value = "fused")]
    provider: ProviderMode,

    /// Manual latitude (-90 to 90). Requires --lon.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Manual longitude (-180 to 180). Requires --lat.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Offline mode: never query the network.
    #[arg(long)]
    offline: bool,

    /// Answer the permission prompt with "allow".
    #[arg(long, short = 'y', conflicts_with = "no")]
    yes: bool,

    /// Answer the permission prompt with "deny".
    #[arg(long, short = 'n')]
    no: bool,

    /// Forget the stored permission answer before fetching.
    #[arg(long)]
    reset_permission: bool,

    /// State directory. Defaults to ~/.gambia.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Network timeout in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<Config, gambia::config::ConfigError> {
    let prompt = if cli.yes {
        PromptPolicy::Grant
    } else if cli.no {
        PromptPolicy::Deny
    } else {
        PromptPolicy::Ask
    };
    Ok(Config {
        data_dir: cli.data_dir.clone().unwrap_or_else(Config::default_data_dir),
        provider: cli.provider,
        manual: Config::manual_fix(cli.lat, cli.lon)?,
        prompt,
        offline: cli.offline,
        timeout: Duration::from_secs(cli.timeout),
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };
    info!(data_dir = %config.data_dir.display(), provider = ?config.provider, "starting");

    // ── Permission reset ────────────────────────────────────────

    if cli.reset_permission {
        let mut store = PermissionStore::load_in(&config.data_dir);
        match store.reset(REQUIRED_PERMISSION) {
            Ok(true) => eprintln!("  Forgot {} permission answer.", REQUIRED_PERMISSION),
            Ok(false) => {}
            Err(e) => {
                eprintln!("Error: Cannot update {}: {}", store.path().display(), e);
                return ExitCode::from(1);
            }
        }
    }

    // ── Fetch ───────────────────────────────────────────────────

    let flow = LocationFlow::new(
        config.permissions(),
        config.provider(),
        RecordingNotifier::forwarding(StderrNotifier),
    );

    let mut screen = LocationScreen::new();
    let ticket = screen.begin_fetch();
    let outcome = flow.request_location().await;
    screen.apply(ticket, &outcome);

    // Rendered screen to stderr
    eprint!("{}", screen.render());

    // JSON to stdout
    let report = FetchReport::new(&outcome, flow.notifier().messages());
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot encode report: {}", e);
            return ExitCode::from(1);
        }
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_must_be_positive() {
        assert!(Cli::try_parse_from(["gambia", "--timeout", "0"]).is_err());
        let cli = Cli::try_parse_from(["gambia", "--timeout", "3"]).unwrap();
        assert_eq!(build_config(&cli).unwrap().timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_default_timeout() {
        let cli = Cli::try_parse_from(["gambia"]).unwrap();
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_yes_and_no_conflict() {
        assert!(Cli::try_parse_from(["gambia", "--yes", "--no"]).is_err());
        let cli = Cli::try_parse_from(["gambia", "-n"]).unwrap();
        assert_eq!(build_config(&cli).unwrap().prompt, PromptPolicy::Deny);
    }

    #[test]
    fn test_partial_coordinates_rejected() {
        let cli = Cli::try_parse_from(["gambia", "--lat", "13.45"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
