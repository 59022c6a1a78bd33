mod cli;
mod render;

use cli::{Cli, Command, LogLevel, ScanArgs};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use treediff::Options;
use treediff::manifest_file::MANIFEST_FILENAME;
use treediff::update::{UpdateOptions, compute_status, update_manifest};

struct DiffExitCode;

impl DiffExitCode {
    /// Exit code used when status found changes.
    fn status_unclean() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for other errors (I/O errors, invalid arguments, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return DiffExitCode::any_error();
    }

    let root = PathBuf::from(".");

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Init { scan, dry_run } => handle_init_or_update(
            &root,
            &scan,
            UpdateOptions {
                init: true,
                allow_init: false,
                digest: None,
                dry_run,
            },
        ),
        Command::Status { scan, details } => handle_status(&root, &scan, details),
        Command::Update {
            scan,
            allow_init,
            digest,
            dry_run,
        } => handle_init_or_update(
            &root,
            &scan,
            UpdateOptions {
                init: false,
                allow_init,
                digest,
                dry_run,
            },
        ),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            DiffExitCode::any_error()
        }
    }
}

fn manifest_path(root: &Path, scan: &ScanArgs) -> PathBuf {
    scan.manifest
        .clone()
        .unwrap_or_else(|| root.join(MANIFEST_FILENAME))
}

/// Options from `--config`, overridden by any flags given on the command line.
fn scan_options(scan: &ScanArgs) -> anyhow::Result<Options> {
    let mut options = match &scan.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };

    if !scan.extensions.is_empty() {
        options = options.with_extensions(&scan.extensions);
    }
    if let Some(max_depth) = scan.max_depth {
        options.max_recurse_depth = Some(max_depth);
    }
    if scan.coarse {
        options.skip_directory_contents_on_add_remove = true;
    }
    if scan.force_add_all {
        options.force_add_all = true;
    }

    Ok(options)
}

fn handle_init_or_update(
    root: &Path,
    scan: &ScanArgs,
    update: UpdateOptions,
) -> anyhow::Result<ExitCode> {
    let options = scan_options(scan)?;
    let manifest_path = manifest_path(root, scan);

    let result = update_manifest(root, &manifest_path, &options, &update)?;

    if update.dry_run {
        info!("DRY RUN - manifest was not written");
        render::print_report(&result.report, false);
    }

    info!(
        "Tracking {} files, {} change(s) recorded",
        result.files_tracked, result.report.total_changes
    );

    if !result.manifest_written {
        info!("Manifest already up to date");
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_status(root: &Path, scan: &ScanArgs, details: bool) -> anyhow::Result<ExitCode> {
    let options = scan_options(scan)?;
    let manifest_path = manifest_path(root, scan);

    let result = compute_status(root, &manifest_path, &options)?;

    if result.report.is_clean() {
        return Ok(ExitCode::SUCCESS);
    }

    render::print_report(&result.report, details);

    let digest = result.report.digest();
    println!();
    println!("Digest: {}", digest);

    info!(
        "Run 'treediff update --digest {}' to accept these changes.",
        digest
    );

    Ok(DiffExitCode::status_unclean())
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    // Explicit flags win over RUST_LOG; RUST_LOG wins over the default.
    let explicit_level = match (log_level, verbose) {
        (Some(level), _) => Some(level.as_filter()),
        (None, 0) => None,
        (None, 1) => Some("info"),
        (None, _) => Some("debug"),
    };

    let filter = match explicit_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => writer.write_str("TRACE: ")?,
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
