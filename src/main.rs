//! Pipeline entry point: preprocess, visualize, train, evaluate.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "grademl")]
#[command(about = "Student performance regression pipeline")]
struct Cli {
    /// Input CSV with a numeric G3 target column
    #[arg(long, default_value = "data/student.csv")]
    data: PathBuf,

    /// Directory that receives the run output and canonical models
    #[arg(long, default_value = ".")]
    output_root: PathBuf,

    /// Seed for the split, cross-validation and model RNGs
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grademl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let summary = grademl::run_pipeline(&cli.data, &cli.output_root, cli.seed)?;

    println!("Best model: {}", summary.best_model);
    println!("Run artifacts: {}", summary.run_dir.display());

    Ok(())
}
