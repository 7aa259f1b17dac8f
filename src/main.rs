//! Kingdom Story Announcement Scanner
//!
//! Batch entry point: processes every announcement folder under the
//! executable's directory and merges new entries into the index READMEs.

use anyhow::{Context, Result};
use std::sync::Arc;

use kingdom_scanner::analysis::SyllableTable;
use kingdom_scanner::ocr::{ensure_tesseract, OcrEngine, TesseractEngine};
use kingdom_scanner::scanner::Scanner;
use kingdom_scanner::{config, log, paths};

fn main() -> Result<()> {
    // Log panics before the process dies
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        eprintln!("[PANIC]{} {}", location, msg);
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    paths::ensure_directories()?;

    let config = config::load_or_default();

    let tesseract = ensure_tesseract().context("Tesseract OCR is required for scanning")?;
    let engine: Arc<dyn OcrEngine + Send + Sync> = Arc::new(TesseractEngine::new(tesseract));

    let table = SyllableTable::new();
    let scanner = Scanner::new(&config, engine, &table)?;
    let summary = scanner.run(paths::get_base_dir())?;

    if summary.processed > 0 {
        log(&format!(
            "Successfully processed {} folders",
            summary.processed
        ));
    } else {
        log("No new content to process");
    }

    Ok(())
}
