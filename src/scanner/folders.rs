use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// One announcement folder: identity is the slug (directory name,
/// typically `YYYY-MM-DD-descriptive-slug`), plus its images in filename
/// order.
#[derive(Clone, Debug)]
pub struct AnnouncementFolder {
    pub path: PathBuf,
    pub slug: String,
    pub images: Vec<PathBuf>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Finds all announcement folders under the root: non-hidden directories
/// with an `images/` subdirectory holding at least one image. Folders are
/// returned sorted by slug, images sorted by filename.
///
/// A missing root is fatal: there is nothing meaningful to scan.
pub fn find_announcement_folders(root: &Path) -> Result<Vec<AnnouncementFolder>> {
    if !root.is_dir() {
        return Err(anyhow!(
            "Announcements directory not found: {}",
            root.display()
        ));
    }

    let mut folders = Vec::new();

    for dir_entry in std::fs::read_dir(root)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }

        let slug = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if !name.starts_with('.') => name.to_string(),
            _ => continue,
        };

        let images = list_images(&path.join("images"))?;
        if images.is_empty() {
            continue;
        }

        folders.push(AnnouncementFolder { path, slug, images });
    }

    folders.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(folders)
}

/// Lists image files in a directory, sorted by filename. A missing
/// directory is just an empty listing.
fn list_images(images_dir: &Path) -> Result<Vec<PathBuf>> {
    if !images_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for dir_entry in std::fs::read_dir(images_dir)? {
        let path = dir_entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if path.is_file() && is_image {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}
