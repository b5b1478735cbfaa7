//! Two-phase file storage for recipe uploads.
//!
//! Uploaded files are first written into a per-request staging directory
//! under `<media_root>/.staging`. Nothing outside that directory is touched
//! until [`StagedUpload::commit`] moves the files into place, so an upload
//! that fails validation or a database write leaves no files behind.
//!
//! Layout under the media root:
//! - `recipes/<slug>-<recipe id>/thumbnail.<ext>`
//! - `recipes/<slug>-<recipe id>/steps/step_<n>.jpg`
//! - `ingredients/<slug>.jpg`

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;
use zip::ZipArchive;

use crate::error::StorageError;
use crate::image::validate_image;

const STAGING_DIR: &str = ".staging";
const STEPS_DIR: &str = "steps";
const INGREDIENTS_DIR: &str = "ingredients";
const RECIPES_DIR: &str = "recipes";
const ARCHIVE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Longest slug [`slugify`] produces. Keeps every path component well under
/// the 255-byte file name limit once an id and extension are appended.
pub const MAX_SLUG_LEN: usize = 64;

/// Largest single file accepted from an archive (10MB).
pub const MAX_ARCHIVE_ENTRY_SIZE: u64 = 10 * 1024 * 1024;

/// Lowercase ASCII slug for directory and file names, at most
/// [`MAX_SLUG_LEN`] characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len().min(MAX_SLUG_LEN));
    for c in name.chars() {
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "recipe".to_string()
    } else {
        slug.to_string()
    }
}

/// Name of the file a step is expected under in a step archive.
pub fn step_file_name(step_number: usize) -> String {
    format!("step_{}.jpg", step_number)
}

/// Name of the file an ingredient is expected under in an ingredient archive.
pub fn ingredient_file_name(ingredient: &str) -> String {
    format!("{}.jpg", ingredient)
}

/// Final locations (relative to the media root) for everything staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePlan {
    pub recipe_dir: String,
    pub thumbnail: Option<String>,
    /// (step number, path)
    pub steps: Vec<(i32, String)>,
    /// (ingredient name, path)
    pub ingredient_images: Vec<(String, String)>,
}

impl StoragePlan {
    /// Remove everything this plan placed after a failed commit.
    pub fn discard(&self, media_root: &Path) {
        let dir = media_root.join(&self.recipe_dir);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "Failed to discard recipe files"),
        }

        for (_, image) in &self.ingredient_images {
            let path = media_root.join(image);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to discard ingredient image"),
            }
        }
    }
}

/// Files written to a staging directory, waiting for commit.
///
/// Dropping a `StagedUpload` without committing removes the staging
/// directory.
pub struct StagedUpload {
    media_root: PathBuf,
    dir: TempDir,
    thumbnail: Option<(PathBuf, &'static str)>,
    steps: Vec<(i32, PathBuf)>,
    ingredient_images: Vec<(String, PathBuf)>,
}

impl StagedUpload {
    pub fn new(media_root: &Path) -> Result<Self, StorageError> {
        let staging_root = media_root.join(STAGING_DIR);
        fs::create_dir_all(&staging_root)?;
        let dir = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir_in(&staging_root)?;

        Ok(Self {
            media_root: media_root.to_path_buf(),
            dir,
            thumbnail: None,
            steps: Vec::new(),
            ingredient_images: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn stage_thumbnail(&mut self, data: &[u8]) -> Result<(), StorageError> {
        let ext = validate_image(data)?;
        let path = self.dir.path().join(format!("thumbnail.{}", ext));
        fs::write(&path, data)?;
        self.thumbnail = Some((path, ext));
        Ok(())
    }

    /// Extract a step archive and pair instruction step `n` with
    /// `step_<n>.jpg`. Returns how many steps got an image.
    pub fn stage_steps(&mut self, archive: &[u8], steps: &[&str]) -> Result<usize, StorageError> {
        let extracted = self.extract_archive(archive, STEPS_DIR)?;

        for step_number in 1..=steps.len() {
            let file_name = step_file_name(step_number);
            if extracted.contains(&file_name) {
                let path = self.dir.path().join(STEPS_DIR).join(&file_name);
                self.steps.push((step_number as i32, path));
            } else {
                tracing::warn!(step = step_number, "Step archive has no image for step");
            }
        }

        Ok(self.steps.len())
    }

    /// Extract an ingredient archive and pair each ingredient with
    /// `<name>.jpg`. Returns how many ingredients got an image.
    pub fn stage_ingredient_images(
        &mut self,
        archive: &[u8],
        ingredients: &[String],
    ) -> Result<usize, StorageError> {
        let extracted = self.extract_archive(archive, INGREDIENTS_DIR)?;

        for name in ingredients {
            let file_name = ingredient_file_name(name);
            if extracted.contains(&file_name) {
                let path = self.dir.path().join(INGREDIENTS_DIR).join(&file_name);
                self.ingredient_images.push((name.clone(), path));
            } else {
                tracing::warn!(ingredient = %name, "Ingredient archive has no image for ingredient");
            }
        }

        Ok(self.ingredient_images.len())
    }

    /// Write the image entries of a zip archive into `subdir`, flattening any
    /// directory structure. Returns the file names written.
    fn extract_archive(&self, data: &[u8], subdir: &str) -> Result<HashSet<String>, StorageError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let target = self.dir.path().join(subdir);
        fs::create_dir_all(&target)?;

        let mut written = HashSet::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }

            // enclosed_name rejects absolute paths and `..` components
            let Some(file_name) = entry
                .enclosed_name()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            else {
                tracing::warn!(entry = %entry.name(), "Skipping unsafe archive entry");
                continue;
            };

            if file_name.len() > 255 {
                tracing::warn!(entry = %entry.name(), "Skipping archive entry with over-long name");
                continue;
            }

            if !has_image_extension(&file_name) {
                tracing::debug!(entry = %file_name, "Skipping non-image archive entry");
                continue;
            }

            if entry.size() > MAX_ARCHIVE_ENTRY_SIZE {
                return Err(StorageError::EntryTooLarge {
                    name: file_name,
                    limit: MAX_ARCHIVE_ENTRY_SIZE,
                });
            }

            // The declared size can lie; cap what is actually inflated
            let mut out = File::create(target.join(&file_name))?;
            let copied = io::copy(&mut (&mut entry).take(MAX_ARCHIVE_ENTRY_SIZE + 1), &mut out)?;
            if copied > MAX_ARCHIVE_ENTRY_SIZE {
                return Err(StorageError::EntryTooLarge {
                    name: file_name,
                    limit: MAX_ARCHIVE_ENTRY_SIZE,
                });
            }
            written.insert(file_name);
        }

        Ok(written)
    }

    /// Work out where every staged file will live once committed.
    ///
    /// Ingredient images get a fresh suffix per upload, so names that slug
    /// the same never share a file.
    pub fn plan(&self, title: &str, recipe_id: Uuid) -> StoragePlan {
        let recipe_dir = format!("{}/{}-{}", RECIPES_DIR, slugify(title), recipe_id);

        StoragePlan {
            thumbnail: self
                .thumbnail
                .as_ref()
                .map(|(_, ext)| format!("{}/thumbnail.{}", recipe_dir, ext)),
            steps: self
                .steps
                .iter()
                .map(|(n, _)| (*n, format!("{}/{}/{}", recipe_dir, STEPS_DIR, step_file_name(*n as usize))))
                .collect(),
            ingredient_images: self
                .ingredient_images
                .iter()
                .map(|(name, _)| {
                    (
                        name.clone(),
                        format!(
                            "{}/{}-{}.jpg",
                            INGREDIENTS_DIR,
                            slugify(name),
                            Uuid::new_v4().simple()
                        ),
                    )
                })
                .collect(),
            recipe_dir,
        }
    }

    /// Move staged files to the locations in `plan`.
    ///
    /// `plan` must come from [`StagedUpload::plan`] on this upload. The
    /// recipe directory is only created when something is moved into it.
    pub fn commit(self, plan: &StoragePlan) -> Result<(), StorageError> {
        if let (Some((staged, _)), Some(target)) = (&self.thumbnail, &plan.thumbnail) {
            self.move_into_place(staged, target)?;
        }
        for ((_, staged), (_, target)) in self.steps.iter().zip(&plan.steps) {
            self.move_into_place(staged, target)?;
        }
        for ((_, staged), (_, target)) in self.ingredient_images.iter().zip(&plan.ingredient_images) {
            self.move_into_place(staged, target)?;
        }

        Ok(())
    }

    fn move_into_place(&self, staged: &Path, relative: &str) -> Result<(), StorageError> {
        let target = self.media_root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(staged, &target)?;
        Ok(())
    }
}

fn has_image_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            ARCHIVE_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| e.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}
