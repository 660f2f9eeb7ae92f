#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, pretty_kv, render_error, render_mode};
use serde::Serialize;
use std::env;
use std::io::Write;
use tickview_core::config::{self, UserConfig};
use tickview_core::error::ErrorCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "tv",
    author,
    version,
    about = "tickview: render and browse ticket tracker pages",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Render",
        about = "Render a page document",
        long_about = "Run a saved page document through its transformer and templates, and show what each region would display.",
        after_help = "EXAMPLES:\n    # Render a saved report page\n    tv view report.json\n\n    # Read from stdin with a fixed clock and show the view model\n    curl -s 'http://localhost:8000/timeline?format=json' | tv view - --now 2024-06-15T12:00:00Z --model\n\n    # Use the site's own template page\n    tv view ticket.json --templates index.html --json"
    )]
    View(cmd::view::ViewArgs),

    #[command(
        next_help_heading = "Render",
        about = "Visit pages on a live tracker",
        long_about = "Fetch pages as JSON through the navigation controller, decorate closed ticket links, and report the final page.",
        after_help = "EXAMPLES:\n    # Visit the front page\n    tv browse http://localhost:8000/\n\n    # Follow two pages, then step back one\n    tv browse http://localhost:8000/report/1 /ticket/7 --back 1\n\n    # Emit machine-readable output\n    tv browse http://localhost:8000/timeline --json"
    )]
    Browse(cmd::browse::BrowseArgs),

    #[command(
        next_help_heading = "Reference",
        about = "List error codes",
        after_help = "EXAMPLES:\n    # Show every error code with its hint\n    tv codes"
    )]
    Codes,

    #[command(
        next_help_heading = "Reference",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Install bash completions\n    tv completions bash > ~/.local/share/bash-completion/completions/tv"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

#[derive(Debug, Serialize)]
struct CodeEntry {
    code: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

fn run_codes(output: OutputMode) -> anyhow::Result<()> {
    let entries: Vec<CodeEntry> = ErrorCode::ALL
        .into_iter()
        .map(|code| CodeEntry {
            code: code.code(),
            message: code.message(),
            hint: code.hint(),
        })
        .collect();
    render_mode(
        output,
        &entries,
        |entries, w| {
            for e in entries {
                writeln!(w, "{}  {}", e.code, e.message)?;
            }
            Ok(())
        },
        |entries, w| {
            for e in entries {
                pretty_kv(w, e.code, e.message)?;
                if let Some(hint) = e.hint {
                    writeln!(w, "{:<12} {hint}", "")?;
                }
            }
            Ok(())
        },
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TICKVIEW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tv=debug,tickview_core=debug,info"
        } else {
            "tv=info,tickview_core=info,warn"
        })
    });

    let format = env::var("TICKVIEW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_user_config() -> UserConfig {
    config::load_user_config().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable user config");
        UserConfig::default()
    })
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    match cli.command {
        Commands::View(ref args) => {
            let project = config::load_project_config(&project_root)?;
            cmd::view::run_view(args, project.view, output)
        }
        Commands::Browse(ref args) => {
            let project = config::load_project_config(&project_root)?;
            cmd::browse::run_browse(args, project.view, output)
        }
        Commands::Codes => run_codes(output),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user = load_user_config();
    let output = output::resolve_output_mode(cli.json, user.output.as_deref());
    let quiet = cli.quiet;

    if let Err(err) = run(cli, output) {
        if !quiet || output.is_json() {
            render_error(output, &CliError::from(&err))?;
        }
        std::process::exit(1);
    }
    Ok(())
}
