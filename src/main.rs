use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gllink::commands::{self, Format};
use gllink::{diagnostics, watch};

#[derive(Parser)]
#[command(name = "gllink", about = "Extract, resolve and validate gl: links in markdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every gl: link in markdown files
    Check {
        /// Files or directories to check (default: current directory)
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// List the gl: links found in one file
    Links {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Resolve a gl: link as seen from a document
    Resolve {
        /// Document containing the link
        document: PathBuf,
        /// Link text, e.g. gl:docs/readme.md#L10
        link: String,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Print the document-relative href a renderer should use for a gl: href
    Rewrite {
        document: PathBuf,
        href: String,
    },
    /// Check, then re-check whenever files change
    Watch {
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Commands::Check { paths, format } => commands::check(&paths, format),
        Commands::Links { file, format } => commands::links(&file, format),
        Commands::Resolve { document, link, format } => commands::resolve(&document, &link, format),
        Commands::Rewrite { document, href } => commands::rewrite(&document, &href),
        Commands::Watch { paths, format } => watch::run(&paths, format),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3)
        },
    };
}
