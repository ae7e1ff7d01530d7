//! replisync - keep a replica directory tree identical to a source tree.
//!
//! Usage:
//!   replisync --source <PATH> --replica <PATH> --interval <SECONDS> --log_path <FILE>
//!
//! Every interval the replica is reconciled against the source: new and
//! changed files are copied, and entries missing from the source are
//! deleted. Press Ctrl+C to stop after the current pass, or twice to exit
//! immediately.

mod logging;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use replisync_core::{ErrorPolicy, SyncConfig, SyncError};
use replisync_engine::{SyncDriver, TracingReporter};

#[derive(Parser)]
#[command(
    name = "replisync",
    version,
    about = "One-way periodic directory synchronization",
    long_about = "replisync makes a replica directory mirror a source directory.\n\n\
                  Files and folders added or changed in the source are copied to the \
                  replica, and anything removed from the source is removed from the \
                  replica. The comparison repeats every interval until interrupted."
)]
struct Cli {
    /// Source folder path
    #[arg(long)]
    source: PathBuf,

    /// Replica folder path (created if missing)
    #[arg(long)]
    replica: PathBuf,

    /// Sync interval in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Log file path (appended to)
    #[arg(long = "log_path")]
    log_path: PathBuf,

    /// Log a failed pass and retry on the next cycle instead of exiting
    #[arg(long)]
    keep_going: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init(&cli.log_path)?;

    let config = SyncConfig::builder()
        .source(cli.source)
        .replica(cli.replica)
        .interval(Duration::from_secs(cli.interval))
        .error_policy(if cli.keep_going {
            ErrorPolicy::SkipCycle
        } else {
            ErrorPolicy::Abort
        })
        .build()
        .map_err(SyncError::from)?;

    let cancel = CancellationToken::new();
    let interrupts = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(interrupts, tokio::signal::ctrl_c).await {
            warn!("Interrupted again. Exiting without waiting for the current pass.");
            std::process::exit(130);
        }
    });

    let driver = SyncDriver::from_config(&config, TracingReporter);

    match driver.run(cancel).await {
        Ok(summary) => {
            debug!(?summary, "Exiting");
            Ok(())
        }
        // A missing or non-directory source is already logged by the driver.
        Err(err @ (SyncError::SourceMissing { .. } | SyncError::NotADirectory { .. }))
            if err.path() == Some(config.source.as_path()) =>
        {
            Ok(())
        }
        Err(err) => Err(err).wrap_err("Synchronization failed"),
    }
}

/// Cancel `cancel` on the first interrupt from `signal`.
///
/// Returns `true` once a second interrupt arrives, `false` if listening
/// fails.
async fn watch_interrupts<S, F>(cancel: CancellationToken, mut signal: S) -> bool
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal().await {
        error!("Failed to listen for interrupt: {err}");
        return false;
    }
    cancel.cancel();
    info!("Stopping after the current pass. Press Ctrl+C again to exit now.");

    match signal().await {
        Ok(()) => true,
        Err(err) => {
            error!("Failed to listen for interrupt: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[tokio::test]
    async fn test_second_interrupt_forces_exit() {
        let cancel = CancellationToken::new();
        let mut received = 0;

        let forced = watch_interrupts(cancel.clone(), || {
            received += 1;
            async { Ok(()) }
        })
        .await;

        assert!(forced);
        assert!(cancel.is_cancelled());
        assert_eq!(received, 2);
    }

    #[tokio::test]
    async fn test_single_interrupt_only_cancels() {
        let cancel = CancellationToken::new();
        let mut received = 0;

        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            watch_interrupts(cancel, move || {
                received += 1;
                let first = received == 1;
                async move {
                    if first {
                        Ok(())
                    } else {
                        std::future::pending().await
                    }
                }
            })
        });

        cancel.cancelled().await;
        assert!(!watcher.is_finished());
        watcher.abort();
    }

    #[tokio::test]
    async fn test_failed_listener_does_not_cancel() {
        let cancel = CancellationToken::new();

        let forced = watch_interrupts(cancel.clone(), || async {
            Err(io::Error::other("no signal handler"))
        })
        .await;

        assert!(!forced);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_config_errors_are_invalid_config() {
        let err = SyncConfig::builder()
            .source("/data/src")
            .replica("/data")
            .interval(Duration::from_secs(1))
            .build()
            .map_err(SyncError::from)
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidConfig { .. }));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_required_flags() {
        let cli = Cli::try_parse_from([
            "replisync",
            "--source",
            "/data",
            "--replica",
            "/backup",
            "--interval",
            "30",
            "--log_path",
            "/tmp/replisync.log",
        ])
        .unwrap();

        assert_eq!(cli.source, PathBuf::from("/data"));
        assert_eq!(cli.replica, PathBuf::from("/backup"));
        assert_eq!(cli.interval, 30);
        assert_eq!(cli.log_path, PathBuf::from("/tmp/replisync.log"));
        assert!(!cli.keep_going);
    }

    #[test]
    fn test_cli_rejects_bad_interval() {
        let base = ["replisync", "--source", "/d", "--replica", "/b", "--log_path", "l"];

        let zero = Cli::try_parse_from(base.iter().copied().chain(["--interval", "0"]));
        assert!(zero.is_err());

        let text = Cli::try_parse_from(base.iter().copied().chain(["--interval", "soon"]));
        assert!(text.is_err());

        let missing = Cli::try_parse_from(base);
        assert!(missing.is_err());
    }
}
