//! Quill CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "quill")]
#[command(version)]
#[command(about = "Document pipeline with variable interpolation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document to the preview (stdout) or an export format
    Render {
        /// Input document
        input: PathBuf,

        /// Definitions file (YAML, or .properties)
        #[arg(short = 'd', long)]
        definitions: Option<PathBuf>,

        /// Export format (none, html, xhtml, markdown, pdf)
        #[arg(short = 't', long, default_value = "none")]
        to: String,

        /// Write output to FILE (defaults to the input name with the format's extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Settings file (defaults to quill.yaml next to the input)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Caret offset, in bytes, marked in the preview
        #[arg(long)]
        caret: Option<usize>,
    },

    /// Print the interpolated definitions
    Definitions {
        /// Definitions file (YAML, or .properties)
        file: PathBuf,

        /// Print values without resolving references
        #[arg(long)]
        raw: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = commands::definitions::Format::Yaml)]
        format: commands::definitions::Format,

        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Find the definition whose value matches TEXT
    Find {
        /// Definitions file (YAML, or .properties)
        file: PathBuf,

        /// Text to search for
        text: String,

        /// How values are compared
        #[arg(long, value_enum, default_value_t = Mode::Contains)]
        mode: Mode,

        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Check settings and definitions for problems
    Check {
        /// Definitions file (YAML, or .properties)
        file: PathBuf,

        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

/// Search mode for `quill find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Exact,
    Contains,
    NoCase,
    Prefix,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=info,quill_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            definitions,
            to,
            output,
            settings,
            caret,
        } => commands::render::execute(commands::render::RenderArgs {
            input,
            definitions,
            to,
            output,
            settings,
            caret,
        }),
        Commands::Definitions {
            file,
            raw,
            format,
            settings,
        } => commands::definitions::execute(commands::definitions::DefinitionsArgs {
            file,
            raw,
            format,
            settings,
        }),
        Commands::Find {
            file,
            text,
            mode,
            settings,
        } => commands::find::execute(commands::find::FindArgs {
            file,
            text,
            mode,
            settings,
        }),
        Commands::Check { file, settings } => {
            commands::check::execute(commands::check::CheckArgs { file, settings })
        }
    }
}
