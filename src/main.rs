//! pvsync - Entry Point

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Headless live-preview synchronization engine for document editors.
///
/// Watches a source document, renders it continuously, and speaks a
/// JSON-lines control protocol with the editor: viewport/cursor commands in
/// on stdin, scroll/status events out on stdout.
#[derive(Parser, Debug)]
#[command(name = "pvsync")]
#[command(version)]
#[command(about = "Headless live-preview synchronization engine for document editors")]
pub struct Args {
    /// Source document to watch and render
    pub file: PathBuf,

    /// Write the rendered preview here (defaults beside the source)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Secondary renderer command (receives the source on stdin)
    #[arg(long)]
    pub secondary_cmd: Option<String>,

    /// Disable the secondary renderer entirely
    #[arg(long)]
    pub no_secondary: bool,

    /// Local render interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Editor soft-wrap column
    #[arg(long)]
    pub wrap_column: Option<u16>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Full precedence chain: Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = pvsync::config::load_config_with_precedence(args.config.clone())?;
        let merged = pvsync::config::merge_config(config_file);
        let with_env = pvsync::config::apply_env_overrides(merged);
        pvsync::config::apply_cli_overrides(
            with_env,
            pvsync::config::CliOverrides {
                refresh_interval_ms: args.interval_ms,
                secondary_command: args.secondary_cmd.clone(),
                disable_secondary: args.no_secondary,
                preview_path: args.out.clone(),
                wrap_column: args.wrap_column,
            },
        )
    };

    pvsync::logging::init(&config.log_file_path)?;
    info!(config = ?config, "Configuration loaded and resolved");

    pvsync::shell::run(pvsync::shell::ShellOptions {
        source: args.file.clone(),
        config,
    })?;

    Ok(())
}
