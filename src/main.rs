//! hierscope binary entrypoint kept minimal. The runtime lives in the library.

use std::fmt;
use std::sync::{Arc, OnceLock};

use clap::Parser;

use hierscope::args::{self, Args};
use hierscope::sources::JsonNodeSource;
use hierscope::util::{self, config::load_settings};

struct HierscopeTimer;

impl tracing_subscriber::fmt::time::FormatTime for HierscopeTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        w.write_str(&util::log_timestamp())
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Initialize tracing to the log file, falling back to stderr.
///
/// Inputs:
/// - `level`: Default filter directive when `RUST_LOG` is unset
fn init_logging(level: &str) {
    let make_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let mut log_path = util::paths::logs_dir();
    log_path.push("hierscope.log");
    let opened = std::fs::create_dir_all(util::paths::logs_dir()).and_then(|()| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });
    match opened {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(HierscopeTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(HierscopeTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

/// Load the document, pick the ruleset, then dump or browse.
async fn run(cli: Args) -> Result<()> {
    let settings = load_settings(cli.config.as_deref());
    init_logging(&args::determine_log_level(&cli, &settings));
    tracing::info!(file = %cli.file.display(), dump = cli.dump, "hierscope starting");

    let source = Arc::new(
        JsonNodeSource::from_path(&cli.file)?.with_case_sensitive(settings.case_sensitive_filter),
    );
    let ruleset = args::resolve_ruleset(&cli, &settings, &source)
        .ok_or("the document defines no rulesets")?;

    if cli.dump {
        let out = args::dump::handle_dump(source, ruleset, cli.filter).await?;
        println!("{out}");
        return Ok(());
    }
    hierscope::app::run(&settings, source, ruleset, cli.filter).await
}

#[tokio::main]
async fn main() {
    let cli = Args::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "application error");
        eprintln!("hierscope: {err}");
        std::process::exit(1);
    }
    tracing::info!("hierscope exited");
}
