use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vegemap")]
#[command(about = "Vegetation index analysis (ExG, VARI) for drone RGB imagery")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Normalized ExG threshold for the vegetation mask [default: 0.15]
    #[arg(long, global = true)]
    pub threshold: Option<f32>,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one image and write heatmaps plus the mask overlay
    Analyze {
        /// RGB image (PNG, JPEG, TIFF, ...)
        #[arg(short, long)]
        image: PathBuf,

        /// Directory for generated artifacts, created if absent
        #[arg(short, long, default_value = "reports/tmp")]
        output_dir: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the analyses listed in a JSON batch file
    Batch {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Worker threads [default: number of CPUs]
        #[arg(short, long)]
        jobs: Option<usize>,
    },
}
