/// Moving files into category folders.
///
/// This module owns the watched root: it creates the category folders at
/// startup, decides where each file goes, picks a free name when the
/// destination is taken, and performs the move.
use crate::error::{OrganizeError, StartupError};
use crate::file_category::{Category, Classifier};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A classification decision for one file.
///
/// Exists only for the duration of one [`Organizer::organize`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Where the file is now.
    pub source: PathBuf,
    /// The category it was classified into.
    pub category: Category,
    /// Where the file will be moved, after collision renaming.
    pub destination: PathBuf,
}

/// Why a file was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Not a regular file (directory, broken link, missing path). Silent.
    NotAFile,
    /// Already inside a category folder. Silent.
    AlreadySorted,
    /// Zero bytes, probably still being written. Logged as a warning.
    Empty,
}

/// What [`Organizer::organize`] did with a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was moved.
    Moved(Placement),
    /// The file was left in place.
    Skipped(Skip),
}

/// Organizes files under a watched root by moving them into category folders.
#[derive(Debug, Clone)]
pub struct Organizer {
    root: PathBuf,
    classifier: Classifier,
}

impl Organizer {
    /// Creates an organizer for `root` and makes sure every category folder exists.
    ///
    /// The root is validated before anything is created, so a missing root
    /// leaves the filesystem untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::RootMissing`], [`StartupError::RootNotDirectory`]
    /// or [`StartupError::InspectRoot`] if the root is unusable, and [`StartupError::CreateFolder`] if a category
    /// folder cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidywatch::file_category::Classifier;
    /// use tidywatch::file_organizer::Organizer;
    ///
    /// let organizer = Organizer::new("/home/me/Desktop", Classifier::default())?;
    /// organizer.organize("/home/me/Desktop/photo.JPG".as_ref())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(root: impl Into<PathBuf>, classifier: Classifier) -> Result<Self, StartupError> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StartupError::RootNotDirectory(root)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StartupError::RootMissing(root));
            }
            Err(source) => return Err(StartupError::InspectRoot { path: root, source }),
        }

        let organizer = Self { root, classifier };
        organizer.create_category_folders()?;

        info!(root = %organizer.root.display(), "File organizer initialized");
        Ok(organizer)
    }

    /// The watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The classifier used to pick categories.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Creates any category folder that does not exist yet.
    ///
    /// Idempotent: existing folders are left alone and not logged.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::CreateFolder`] for the first folder that cannot be created.
    pub fn create_category_folders(&self) -> Result<(), StartupError> {
        for category in self.classifier.categories() {
            let path = self.category_dir(category);
            if path.is_dir() {
                continue;
            }
            fs::create_dir_all(&path)
                .map_err(|source| StartupError::CreateFolder { path: path.clone(), source })?;
            info!(folder = category.dir_name(), "Created folder: {}", category);
        }
        Ok(())
    }

    /// The folder for `category` under the watched root.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Moves a file into its category folder.
    ///
    /// Paths that are not regular files or no longer exist, and files whose
    /// parent folder is a category folder, are skipped silently. Empty files are skipped with a
    /// warning. Failures are logged here and returned; they never affect later
    /// calls.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The full path to the file to be moved
    ///
    /// # Returns
    ///
    /// [`Outcome::Moved`] with the final placement, [`Outcome::Skipped`] with
    /// the reason, or an [`OrganizeError`] if the move could not be completed.
    pub fn organize(&self, file_path: &Path) -> OrganizeResult<Outcome> {
        match self.try_organize(file_path) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(path = %file_path.display(), error = %e, "Error organizing file");
                Err(e)
            }
        }
    }

    fn try_organize(&self, file_path: &Path) -> OrganizeResult<Outcome> {
        let meta = match fs::metadata(file_path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Ok(Outcome::Skipped(Skip::NotAFile)),
            Err(e) if is_vanished(&e) => return Ok(Outcome::Skipped(Skip::NotAFile)),
            Err(source) => {
                return Err(OrganizeError::Inspect {
                    path: file_path.to_path_buf(),
                    source,
                });
            }
        };

        if self.is_in_category_dir(file_path) {
            debug!(path = %file_path.display(), "Already in a category folder");
            return Ok(Outcome::Skipped(Skip::AlreadySorted));
        }

        if meta.len() == 0 {
            warn!(
                path = %file_path.display(),
                "File {} appears to be empty or was deleted",
                display_name(file_path)
            );
            return Ok(Outcome::Skipped(Skip::Empty));
        }

        let placement = self.plan(file_path)?;
        move_file(&placement.source, &placement.destination)?;

        info!(
            from = %placement.source.display(),
            to = %placement.destination.display(),
            "Moved: {} → {}/",
            display_name(file_path),
            placement.category
        );
        Ok(Outcome::Moved(placement))
    }

    /// Decides where `file_path` would go without moving it.
    ///
    /// Recreates the category folder if it has gone missing.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::NoFileName`] for paths like `/` or `..`, and
    /// [`OrganizeError::CreateFolder`] if the category folder cannot be recreated.
    pub fn plan(&self, file_path: &Path) -> OrganizeResult<Placement> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: file_path.to_path_buf(),
            })?;

        let extension = dotted_extension(file_path);
        let category = self.classifier.classify(&extension);
        let folder = self.category_dir(category);

        if !folder.is_dir() {
            fs::create_dir_all(&folder).map_err(|source| OrganizeError::CreateFolder {
                path: folder.clone(),
                source,
            })?;
            info!(folder = category.dir_name(), "Created folder: {}", category);
        }

        let destination = free_destination(&folder, Path::new(file_name));

        Ok(Placement {
            source: file_path.to_path_buf(),
            category,
            destination,
        })
    }

    fn is_in_category_dir(&self, file_path: &Path) -> bool {
        file_path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.classifier.is_category_dir(name))
    }
}

/// The extension with its leading dot (`".JPG"`), or empty if there is none.
///
/// Only the last suffix counts, and a lone leading dot (`.bashrc`) is not one.
/// Lossy: the result is only used for classification.
pub fn dotted_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_string_lossy()),
        _ => String::new(),
    }
}

/// First free name in `folder`: the original name, then `{stem}_1{ext}`,
/// `{stem}_2{ext}`, and so on.
///
/// The name is rebuilt from the raw OS string, so names that are not valid
/// UTF-8 keep their bytes. A trailing dot (`notes.`) is part of the stem.
pub fn free_destination(folder: &Path, file_name: &Path) -> PathBuf {
    let mut candidate = folder.join(file_name);
    let (stem, extension) = match (file_name.file_stem(), file_name.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (file_name.as_os_str(), None),
    };

    let mut counter: u64 = 1;
    while candidate.exists() {
        let mut name = OsString::from(stem);
        name.push(format!("_{}", counter));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        candidate = folder.join(name);
        counter += 1;
    }
    candidate
}

// The path is gone, or a parent was replaced by a file.
fn is_vanished(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Renames `from` to `to`, copying and deleting when they are on different devices.
fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let move_error = |source: io::Error| OrganizeError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "Cross-device move, copying instead");
            fs::copy(from, to).map_err(move_error)?;
            if let Err(e) = fs::remove_file(from) {
                // Keep a single copy: drop the new one if the source can't be removed.
                let _ = fs::remove_file(to);
                return Err(move_error(e));
            }
            Ok(())
        }
        Err(e) => Err(move_error(e)),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
