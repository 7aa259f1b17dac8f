use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Languages the default engine configurations require.
const REQUIRED_LANGUAGES: &[&str] = &["chi_tra", "eng"];

pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Ensures Tesseract and the required language data are available.
///
/// The executable must already be installed (system package or PATH);
/// missing .traineddata files are downloaded into the local data dir.
pub fn ensure_tesseract() -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;

    if let Some(tessdata) = find_system_tessdata() {
        log(&format!("Using system tessdata: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata,
        });
    }

    // Fall back to the local download directory, fetching what's missing
    let tessdata = crate::paths::get_tessdata_dir();
    fs::create_dir_all(&tessdata)?;
    for lang in REQUIRED_LANGUAGES {
        let path = tessdata.join(format!("{}.traineddata", lang));
        if !path.exists() {
            download_traineddata(lang, &path)?;
        }
    }

    log(&format!("Tesseract ready: {}", executable.display()));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable on PATH or in common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    ];

    for path in &common_paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Please install Tesseract-OCR:\n\
         - Debian/Ubuntu: apt install tesseract-ocr tesseract-ocr-chi-tra\n\
         - macOS: brew install tesseract tesseract-lang\n\
         - Windows: https://github.com/UB-Mannheim/tesseract/releases"
    ))
}

/// Returns a tessdata directory that already carries every required
/// language, if one exists.
fn find_system_tessdata() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = vec![crate::paths::get_tessdata_dir()];

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }

    candidates.extend(
        [
            "/usr/share/tesseract-ocr/5/tessdata",
            "/usr/share/tesseract-ocr/4.00/tessdata",
            "/usr/share/tessdata",
            "/usr/local/share/tessdata",
            "/opt/homebrew/share/tessdata",
            r"C:\Program Files\Tesseract-OCR\tessdata",
        ]
        .iter()
        .map(PathBuf::from),
    );

    candidates.into_iter().find(|dir| {
        REQUIRED_LANGUAGES
            .iter()
            .all(|lang| dir.join(format!("{}.traineddata", lang)).exists())
    })
}

/// Downloads one .traineddata file from the tessdata repository.
fn download_traineddata(lang: &str, dest: &PathBuf) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, lang);
    log(&format!("Downloading {}.traineddata...", lang));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "kingdom-scanner")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            lang,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(dest)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        lang,
        bytes.len()
    ));

    Ok(())
}
