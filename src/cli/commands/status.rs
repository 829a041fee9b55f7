//! Check-config command for showing the resolved configuration.

use console::style;

use crate::cli::helpers::truncate;
use crate::config::{default_config_path, Settings};

/// Validate settings and print the language routing table.
pub async fn cmd_check_config(settings: &Settings) -> anyhow::Result<()> {
    let dispatch = match settings.validate() {
        Ok(dispatch) => dispatch,
        Err(e) => {
            println!("{} Invalid configuration: {}", style("✗").red(), e);
            return Ok(());
        }
    };

    println!("\n{}", style("foia-ner Configuration").bold());
    println!("{}", "-".repeat(50));
    println!("{:<20} {}", "User config:", default_config_path().display());
    println!("{:<20} {}", "Batch workers:", settings.batch_workers);
    println!("{:<20} {}", "File workers:", settings.file_workers);
    println!("{:<20} {}", "Max chunk chars:", settings.max_chunk_chars);
    println!("{:<20} {}", "Context length:", settings.context_length);
    println!("{:<20} {}", "NameTag:", settings.nametag_url);
    println!("{:<20} {}", "OCR service:", settings.ocr_service_url);
    println!("{:<20} {}", "Tika:", settings.tika_url);

    let tesseract = match which::which("tesseract") {
        Ok(path) => style(path.display().to_string()).green(),
        Err(_) => style("not found".to_string()).yellow(),
    };
    println!("{:<20} {}", "Tesseract:", tesseract);

    println!("\n{:<10} {:<8} Model", "Language", "Backend");
    println!("{}", "-".repeat(50));
    for (language, kind, model) in dispatch.languages() {
        println!(
            "{:<10} {:<8} {}",
            language.iso_639_1(),
            kind.as_str(),
            truncate(model, 30)
        );
    }

    println!("\n{} Configuration is valid", style("✓").green());
    Ok(())
}
