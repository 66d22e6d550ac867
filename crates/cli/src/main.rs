use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "traceviz", version, about = "Profile viewer core, headless")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a profile and print a summary of what it contains.
    Inspect {
        /// Path to the capture (Chrome trace, speedscope, pprof, …).
        file: PathBuf,
        /// Also list the top symbols by self time.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Render the default framing of a profile to an SVG file.
    ExportSvg {
        file: PathBuf,
        /// Output path; defaults to the input with an .svg extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 1280.0)]
        width: f32,
        #[arg(long, default_value_t = 800.0)]
        height: f32,
        /// Use the light palette.
        #[arg(long)]
        light: bool,
    },
    /// Re-serialize a profile to the stable traceviz JSON schema.
    ExportJson {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { file, top } => cmd::inspect(&file, top),
        Commands::ExportSvg {
            file,
            output,
            width,
            height,
            light,
        } => {
            let output = output.unwrap_or_else(|| file.with_extension("svg"));
            cmd::export_svg(&file, &output, width, height, light)
        }
        Commands::ExportJson { file, output } => {
            let output = output.unwrap_or_else(|| file.with_extension("traceviz.json"));
            cmd::export_json(&file, &output)
        }
    }
    .with_context(|| "command failed")
}
