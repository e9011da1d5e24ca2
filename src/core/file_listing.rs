/*
 * Lists the files of one directory that are candidates for renaming. Only regular files
 * directly inside the directory are returned (no recursion, no directories, no hidden
 * files), optionally filtered by a glob pattern matched against the file name. Names are sorted so a batch
 * is always presented in the same order.
 */
use glob::{MatchOptions, Pattern, PatternError};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum FileListingError {
    Io(io::Error),
    Walk(walkdir::Error),
    InvalidPattern(PatternError),
    NotADirectory(PathBuf),
}

impl From<io::Error> for FileListingError {
    fn from(err: io::Error) -> Self {
        FileListingError::Io(err)
    }
}

impl From<walkdir::Error> for FileListingError {
    fn from(err: walkdir::Error) -> Self {
        FileListingError::Walk(err)
    }
}

impl From<PatternError> for FileListingError {
    fn from(err: PatternError) -> Self {
        FileListingError::InvalidPattern(err)
    }
}

impl std::fmt::Display for FileListingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileListingError::Io(e) => write!(f, "I/O error: {e}"),
            FileListingError::Walk(e) => write!(f, "Directory walk error: {e}"),
            FileListingError::InvalidPattern(e) => write!(f, "Invalid file pattern: {e}"),
            FileListingError::NotADirectory(p) => write!(f, "Not a directory: {p:?}"),
        }
    }
}

impl std::error::Error for FileListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileListingError::Io(e) => Some(e),
            FileListingError::Walk(e) => Some(e),
            FileListingError::InvalidPattern(e) => Some(e),
            FileListingError::NotADirectory(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FileListingError>;

/*
 * Returns the names (not paths) of the regular files directly inside `directory`.
 * Names that are not valid UTF-8 are skipped with a warning, since the engine works on
 * `str` names.
 */
pub fn list_candidate_files(directory: &Path, pattern: Option<&str>) -> Result<Vec<String>> {
    if !directory.is_dir() {
        return Err(FileListingError::NotADirectory(directory.to_path_buf()));
    }
    let pattern = pattern.map(Pattern::new).transpose()?;
    let match_options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut names = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            log::warn!(
                "FileListing: Skipping non UTF-8 file name {:?}.",
                entry.file_name()
            );
            continue;
        };
        if name.starts_with('.') {
            /* Splitting drops the leading dot, so a proposal would unhide the file. */
            log::trace!("FileListing: Skipping hidden file {name:?}.");
            continue;
        }
        if let Some(pattern) = &pattern {
            if !pattern.matches_with(name, match_options) {
                log::trace!("FileListing: {name:?} does not match {pattern}.");
                continue;
            }
        }
        names.push(name.to_string());
    }
    names.sort();
    log::debug!(
        "FileListing: Found {} candidate file(s) in {directory:?}.",
        names.len()
    );
    Ok(names)
}
