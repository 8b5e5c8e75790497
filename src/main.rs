use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use scubapro_g2::cache::FingerprintCache;
use scubapro_g2::commands::{
    describe, download_dives, dump_device, extract_file, update_settings, write_json,
    SettingsUpdate,
};
use scubapro_g2::g2::config::DeviceFamily;
use scubapro_g2::g2::{Fingerprint, G2Error};
use scubapro_g2::settings::{default_app_data_dir, SettingsManager, ToolSettings};
use scubapro_g2::traits::DiveComputer;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "G2_LOG";

const LONG_ABOUT: &str = "Download dives from Scubapro G2 dive computers.

Talking to a device needs the native HID backend, which is only built with \
`cargo build --features hidapi`. Without it `dump` and `download` fail; \
`extract`, `settings` and `forget` work either way.";

#[derive(Parser, Debug)]
#[command(
    name = "g2tool",
    about = "Download dives from Scubapro G2 dive computers",
    long_about = LONG_ABOUT,
    version
)]
struct Cli {
    /// Settings file (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fingerprint cache directory
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the raw memory dump and its metadata sidecar
    Dump(DumpArgs),
    /// Download new dives and list them as JSON
    Download(DownloadArgs),
    /// List the dives in a dump file without a device
    Extract(ExtractArgs),
    /// Show the stored settings, or change them
    Settings(SettingsArgs),
    /// Drop the cached fingerprint of a device so the next download is full
    Forget(ForgetArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Dump file; metadata goes to "<file>.json"
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// JSON output file (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Neither read nor update the fingerprint cache
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_cache: bool,

    /// Only download dives newer than this fingerprint (hex); used instead
    /// of the cached one, and the cache is still updated afterwards
    #[arg(long, value_name = "HEX")]
    fingerprint: Option<String>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Dump file written by `dump`
    dump: PathBuf,

    /// Metadata sidecar, for dive start times
    #[arg(long, value_name = "PATH")]
    metadata: Option<PathBuf>,

    /// Stop at the first dive not newer than this fingerprint (hex)
    #[arg(long, value_name = "HEX")]
    since: Option<String>,

    /// JSON output file (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Store this fingerprint cache directory
    #[arg(long, value_name = "DIR")]
    fingerprint_dir: Option<PathBuf>,

    /// Store this log filter, e.g. "debug"
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Store whether JSON output is indented
    #[arg(long, value_name = "BOOL")]
    pretty_json: Option<bool>,

    /// Start from the defaults before applying the other flags
    #[arg(long, action = clap::ArgAction::SetTrue)]
    reset: bool,
}

impl From<SettingsArgs> for SettingsUpdate {
    fn from(args: SettingsArgs) -> Self {
        SettingsUpdate {
            reset: args.reset,
            cache_dir: args.fingerprint_dir,
            log_level: args.log_level,
            pretty_json: args.pretty_json,
        }
    }
}

#[derive(Args, Debug)]
struct ForgetArgs {
    /// Device serial number, as reported in the dump metadata
    serial: u32,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Device(String),
    #[error("{0}")]
    Command(String),
    #[error("settings error: {0}")]
    Settings(String),
    #[error("logging initialization failed: {0}")]
    Logging(String),
    #[error("no device backend available; rebuild with the `hidapi` feature")]
    NoBackend,
}

impl From<G2Error> for CliError {
    fn from(error: G2Error) -> Self {
        CliError::Device(describe(&error))
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let app_data_dir = default_app_data_dir().map_err(CliError::Settings)?;
    let manager = match &cli.config {
        Some(path) => SettingsManager::from_file(path),
        None => SettingsManager::new(&app_data_dir),
    };
    let settings = manager.load().map_err(CliError::Settings)?;

    init_logging(&settings)?;
    debug!(
        "Loaded settings from {} (non-default: {})",
        manager.settings_path().display(),
        settings.has_non_default_settings()
    );

    let pretty = cli.pretty || settings.pretty_json;
    let cache_dir = cli
        .cache_dir
        .clone()
        .unwrap_or_else(|| settings.cache_dir_or(&app_data_dir));

    match cli.command {
        Command::Dump(args) => {
            let mut device = open_device(None)?;
            let result = dump_device(device.as_mut(), &args.output).map_err(CliError::Command);
            device.close()?;
            let metadata = result?;
            write_json(&metadata, None, pretty).map_err(CliError::Command)
        }
        Command::Download(args) => {
            let fingerprint = args
                .fingerprint
                .as_deref()
                .map(Fingerprint::from_hex)
                .transpose()?;
            let cache = (!args.no_cache)
                .then(|| FingerprintCache::new(&cache_dir, DeviceFamily::ScubaproG2));

            let mut device = open_device(cache.clone())?;
            let result = download_dives(device.as_mut(), fingerprint, cache.as_ref())
                .map_err(CliError::Command);
            device.close()?;
            write_json(&result?, args.output.as_deref(), pretty).map_err(CliError::Command)
        }
        Command::Extract(args) => {
            let since = args
                .since
                .as_deref()
                .map(Fingerprint::from_hex)
                .transpose()?;
            let dives = extract_file(&args.dump, args.metadata.as_deref(), since)
                .map_err(CliError::Command)?;
            write_json(&dives, args.output.as_deref(), pretty).map_err(CliError::Command)
        }
        Command::Settings(args) => {
            let settings = update_settings(&manager, args.into()).map_err(CliError::Settings)?;
            write_json(&settings, None, pretty).map_err(CliError::Command)
        }
        Command::Forget(args) => {
            let cache = FingerprintCache::new(&cache_dir, DeviceFamily::ScubaproG2);
            let removed = cache.remove(args.serial).map_err(CliError::Command)?;
            let report = serde_json::json!({
                "serial": args.serial,
                "path": cache.path_for(args.serial).display().to_string(),
                "removed": removed,
            });
            write_json(&report, None, pretty).map_err(CliError::Command)
        }
    }
}

/// Install the `tracing` subscriber. `G2_LOG` wins over the settings file.
fn init_logging(settings: &ToolSettings) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(settings.log_filter()))
        .map_err(|e| CliError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

#[cfg(feature = "hidapi")]
fn open_device(cache: Option<FingerprintCache>) -> Result<Box<dyn DiveComputer>, CliError> {
    use scubapro_g2::g2::{DeviceEvent, G2Device};

    let device = G2Device::open(|event: DeviceEvent| debug!("{}", event.message()))?;
    let device = match cache {
        Some(cache) => device.with_fingerprint_cache(cache),
        None => device,
    };

    Ok(Box::new(device))
}

#[cfg(not(feature = "hidapi"))]
fn open_device(_cache: Option<FingerprintCache>) -> Result<Box<dyn DiveComputer>, CliError> {
    Err(CliError::NoBackend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::parse_from([
            "g2tool",
            "--pretty",
            "download",
            "--no-cache",
            "--fingerprint",
            "78563412",
        ]);

        assert!(cli.pretty);
        match cli.command {
            Command::Download(args) => {
                assert!(args.no_cache);
                assert_eq!(args.fingerprint.as_deref(), Some("78563412"));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::parse_from(["g2tool", "extract", "g2.bin", "--metadata", "g2.bin.json"]);

        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.dump, PathBuf::from("g2.bin"));
                assert_eq!(args.metadata, Some(PathBuf::from("g2.bin.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_settings() {
        let cli = Cli::parse_from([
            "g2tool",
            "settings",
            "--log-level",
            "debug",
            "--pretty-json",
            "false",
        ]);

        match cli.command {
            Command::Settings(args) => {
                let update = SettingsUpdate::from(args);
                assert_eq!(update.log_level.as_deref(), Some("debug"));
                assert_eq!(update.pretty_json, Some(false));
                assert!(update.cache_dir.is_none());
                assert!(!update.reset);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_forget() {
        let cli = Cli::parse_from(["g2tool", "--cache-dir", "/tmp/fp", "forget", "12345678"]);

        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/fp")));
        match cli.command {
            Command::Forget(args) => assert_eq!(args.serial, 12_345_678),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_help_names_hid_backend_feature() {
        let command = Cli::command();
        let long_about = command.get_long_about().map(|s| s.to_string()).unwrap_or_default();
        assert!(long_about.contains("--features hidapi"));
        assert!(CliError::NoBackend.to_string().contains("`hidapi` feature"));
    }

    #[test]
    fn test_device_error_shows_code() {
        let err = CliError::from(G2Error::NoDeviceFound);
        assert_eq!(err.to_string(), "[G2-013] No compatible device found");
    }
}
