use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use imgtext_core::{AppConfig, ExtractorKind, ProcessorKind};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "imgtext")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Preprocess images and extract their text with OCR", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "IMGTEXT_CONFIG")]
    config: Option<PathBuf>,

    /// Input folder containing images
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output folder for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Folder for extracted text files (default: <output>/text)
    #[arg(long)]
    text: Option<PathBuf>,

    /// Path to the OCR data folder
    #[arg(short, long)]
    tessdata: Option<PathBuf>,

    /// OCR language (default: eng)
    #[arg(short, long)]
    lang: Option<String>,

    /// Apply preprocessing (default: true)
    #[arg(short, long)]
    preprocess: Option<bool>,

    /// enhance, experimental, orientations, normalize, none or custom
    #[arg(long)]
    processor: Option<ProcessorKind>,

    /// tesseract or remote
    #[arg(long)]
    extractor: Option<ExtractorKind>,

    /// Endpoint of the remote text extraction API
    #[arg(long)]
    endpoint: Option<String>,

    /// API key for the remote text extraction API
    #[arg(long, env = "IMGTEXT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every image in the input folder (default)
    Run,
    /// Extract text from a single image and print it
    Extract {
        /// Image to process
        image: PathBuf,
    },
}

impl Cli {
    /// Defaults < config file < command line.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(v) = &self.input {
            config.input_folder = v.clone();
        }
        if let Some(v) = &self.output {
            config.output_folder = v.clone();
        }
        if let Some(v) = &self.text {
            config.text_folder = Some(v.clone());
        }
        if let Some(v) = &self.tessdata {
            config.tessdata_path = v.clone();
        }
        if let Some(v) = &self.lang {
            config.language = v.clone();
        }
        if let Some(v) = self.preprocess {
            config.preprocess = v;
        }
        if let Some(v) = self.processor {
            config.processor = v;
        }
        if let Some(v) = self.extractor {
            config.extractor = v;
        }
        if let Some(v) = &self.endpoint {
            config.remote.endpoint = v.clone();
        }
        if let Some(v) = &self.api_key {
            config.remote.api_key = Some(v.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match &cli.command {
        None | Some(Command::Run) => {
            tracing::info!(
                "Input: {}, processed images: {}, text: {}",
                config.input_folder.display(),
                config.processed_dir().display(),
                config.text_dir().display()
            );
            let report = commands::run_batch(&config).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Some(Command::Extract { image }) => {
            let text = commands::extract_single(&config, image).await?;
            println!("{text}");
        }
    }

    Ok(())
}
