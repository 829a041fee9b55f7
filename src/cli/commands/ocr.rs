//! OCR command: arbitrate between engines for one image.

use std::path::Path;

use console::style;

use crate::cli::helpers::build_arbiter;
use crate::config::Settings;

pub async fn cmd_ocr(settings: &Settings, image: &Path) -> anyhow::Result<()> {
    let client = settings.http_client()?;
    let arbiter = build_arbiter(settings, &client)?;

    match arbiter.run(image).await {
        Ok(output) => {
            println!(
                "{} {} ({}, {})",
                style("✓").green(),
                image.display(),
                output.engine,
                output.language.iso_639_1()
            );
            println!("{}", output.text);
        }
        Err(e) => {
            println!("{} {}: {}", style("✗").red(), image.display(), e);
        }
    }

    Ok(())
}
