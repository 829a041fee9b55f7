//! Command-line interface.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

/// Entity recognition and OCR arbitration for document corpora
#[derive(Parser)]
#[command(name = "foia-ner", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (JSON); discovered automatically when omitted
    #[arg(long, short, global = true, env = "FOIA_NER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recognize entities in a text or image file and print them as JSON
    Recognize {
        /// File to process
        path: PathBuf,

        /// Language code (e.g. "cs", "eng"); detected when omitted
        #[arg(long, short)]
        language: Option<String>,

        /// Format override (e.g. "csv"); taken from the extension when omitted
        #[arg(long, short)]
        format: Option<String>,
    },

    /// Run OCR arbitration on an image and print the chosen transcription
    Ocr {
        /// Image to transcribe
        image: PathBuf,
    },

    /// Validate configuration and show language routing
    CheckConfig,
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings_with_options(LoadOptions {
        config_path: cli.config,
    })
    .await?;

    match cli.command {
        Commands::Recognize {
            path,
            language,
            format,
        } => commands::cmd_recognize(&settings, path, language.as_deref(), format.as_deref()).await,
        Commands::Ocr { image } => commands::cmd_ocr(&settings, &image).await,
        Commands::CheckConfig => commands::cmd_check_config(&settings).await,
    }
}
