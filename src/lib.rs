//! Kingdom Story Announcement Scanner
//!
//! Batch-processes folders of game announcement screenshots: each image is
//! preprocessed with several binarization strategies, run through Tesseract,
//! and the combined text is classified and summarized into a per-folder
//! README. New entries are merged into the repository index documents.

pub mod analysis;
pub mod config;
pub mod ocr;
pub mod paths;
pub mod redeem;
pub mod report;
pub mod scanner;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("kingdom_scanner.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
