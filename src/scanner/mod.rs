//! Batch scan orchestration.
//!
//! One folder is fully processed (all its images, in filename order)
//! before the next begins. Per-image and per-folder failures are logged
//! and skipped; the index merge is applied once after all folders, so
//! ordering and truncation decisions see a consistent snapshot.

pub mod folders;

pub use folders::{find_announcement_folders, AnnouncementFolder};

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::analysis::{classify, extract_skills, normalize, Category, NameExtractor, Transliterator};
use crate::config::ScannerConfig;
use crate::log;
use crate::ocr::runner::extract_channels;
use crate::ocr::{preprocess, ChannelText, OcrEngine};
use crate::report::document::{is_auto_generated, render_document};
use crate::report::index::{update_index_file, verify_markers, IndexEntry, IndexLocation};

/// Counts reported at the end of every run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub processed: usize,
    pub merged: usize,
}

/// Drives the whole pipeline over an announcements tree.
pub struct Scanner<'a> {
    config: &'a ScannerConfig,
    engine: Arc<dyn OcrEngine + Send + Sync>,
    translit: &'a dyn Transliterator,
    name_extractor: NameExtractor<'a>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        config: &'a ScannerConfig,
        engine: Arc<dyn OcrEngine + Send + Sync>,
        translit: &'a dyn Transliterator,
    ) -> Result<Self> {
        Ok(Self {
            config,
            engine,
            translit,
            name_extractor: NameExtractor::new(&config.name)?,
        })
    }

    /// Processes every folder under `<base_dir>/announcements`, then
    /// merges new entries into both index documents in one batch commit.
    pub fn run(&self, base_dir: &Path) -> Result<RunSummary> {
        let root = base_dir.join("announcements");
        let folders = find_announcement_folders(&root)?;
        log(&format!("Discovered {} announcement folders", folders.len()));

        let mut entries: Vec<IndexEntry> = Vec::new();
        for folder in &folders {
            match self.process_folder(folder) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => {
                    log(&format!("Warning: folder {} failed: {}", folder.slug, e));
                }
            }
        }

        let processed = entries.len();
        let merged = if entries.is_empty() {
            0
        } else {
            let recent_index = root.join("README.md");
            let root_index = base_dir.join("README.md");

            // Neither index is touched unless both carry their markers;
            // a half-updated pair is still partial corruption.
            verify_markers(&recent_index)?;
            verify_markers(&root_index)?;

            update_index_file(
                &recent_index,
                &entries,
                IndexLocation::Announcements,
                self.config.index.recent_cap,
            )?;
            update_index_file(
                &root_index,
                &entries,
                IndexLocation::Root,
                self.config.index.root_cap,
            )?;
            entries.len()
        };

        let summary = RunSummary {
            discovered: folders.len(),
            processed,
            merged,
        };
        log(&format!(
            "Scan complete: {} discovered, {} processed, {} entries merged",
            summary.discovered, summary.processed, summary.merged
        ));

        Ok(summary)
    }

    /// Processes one folder end to end. Returns the index entry on
    /// success, None when the folder is skipped (manual README, no text).
    fn process_folder(&self, folder: &AnnouncementFolder) -> Result<Option<IndexEntry>> {
        log(&format!("Processing folder: {}", folder.slug));
        let readme_path = folder.path.join("README.md");

        // Reprocessing guard: never overwrite a hand-edited document
        if readme_path.exists() {
            let existing = std::fs::read_to_string(&readme_path)
                .with_context(|| format!("Failed to read {}", readme_path.display()))?;
            if !is_auto_generated(&existing) {
                log(&format!(
                    "  Skipping {} - README exists and is not auto-generated",
                    folder.slug
                ));
                return Ok(None);
            }
        }

        let channels = self.collect_text(folder)?;
        if channels.full.trim().is_empty() {
            // Not marked processed; eligible for retry on the next run
            log(&format!(
                "  No text extracted from {} - folder skipped",
                folder.slug
            ));
            return Ok(None);
        }

        let classification = classify(&channels.full, &folder.slug, &self.config.classify);
        let name = self
            .name_extractor
            .extract(&channels, &folder.slug, self.translit);
        if classification.category == Category::NewCharacterRelease && name.is_none() {
            log(&format!("  No character name resolved for {}", folder.slug));
        }
        let skills = extract_skills(&channels.full);

        let image_names: Vec<String> = folder
            .images
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .map(|n| n.to_string())
            .collect();

        let document = render_document(
            &folder.slug,
            &image_names,
            &classification,
            name.as_deref(),
            &skills,
        );
        std::fs::write(&readme_path, &document.content)
            .with_context(|| format!("Failed to write {}", readme_path.display()))?;
        log(&format!("  Generated README.md ({})", classification.category));

        Ok(Some(IndexEntry {
            folder: folder.slug.clone(),
            title: document.title,
            date: document.date,
            category: classification.category.to_string(),
        }))
    }

    /// Gathers normalized channel text for one folder: either the manual
    /// text.txt override, or per-image preprocess + OCR. Decode and OCR
    /// failures skip the image, never the folder.
    fn collect_text(&self, folder: &AnnouncementFolder) -> Result<ChannelText> {
        let override_path = folder.path.join("text.txt");
        if override_path.exists() {
            let raw = std::fs::read_to_string(&override_path)
                .with_context(|| format!("Failed to read {}", override_path.display()))?;
            log(&format!("  Using manual text override for {}", folder.slug));
            return Ok(ChannelText::from_override(&normalize(&raw)));
        }

        let mut combined = ChannelText::default();
        for image_path in folder.images.iter().take(self.config.ocr.max_ocr_images) {
            let img = match image::open(image_path) {
                Ok(img) => img,
                Err(e) => {
                    log(&format!(
                        "  Failed to decode {}: {}. Skipping image.",
                        image_path.display(),
                        e
                    ));
                    continue;
                }
            };

            let set = preprocess(&img, &self.config.preprocess);
            let channels = extract_channels(&self.engine, &set, &self.config.ocr);
            combined.append(&channels.map(normalize));
        }

        Ok(combined)
    }
}
