/*
 * Applies the proposed renames stored in a `RenameCache` to the file system. Every file is
 * handled on its own: a failure is reported for that file and the batch moves on, and
 * earlier successes are never rolled back.
 *
 * File-system access goes through `FileRenameOperations` so the executor can be exercised
 * against a mock. `CoreFileRenamer` is the `std::fs` implementation.
 */
use super::rename_cache::RenameCache;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub enum RenameError {
    /// The source file does not exist.
    NotFound(PathBuf),
    /// The destination exists and is not just a case variant of the source.
    Conflict(PathBuf),
    /// The destination is not a single plain file name.
    InvalidName(String),
    Io(io::Error),
}

impl From<io::Error> for RenameError {
    fn from(err: io::Error) -> Self {
        RenameError::Io(err)
    }
}

impl std::fmt::Display for RenameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenameError::NotFound(p) => write!(f, "Source file not found: {p:?}"),
            RenameError::Conflict(p) => write!(f, "Destination already exists: {p:?}"),
            RenameError::InvalidName(n) => write!(f, "Not a plain file name: {n:?}"),
            RenameError::Io(e) => write!(f, "I/O error during rename: {e}"),
        }
    }
}

impl std::error::Error for RenameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenameError::Io(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenameError>;

#[derive(Debug)]
pub enum RenameStatus {
    Renamed,
    /// The proposed name equals the current one; nothing was touched.
    Unchanged,
    Failed(RenameError),
}

#[derive(Debug)]
pub struct RenameOutcome {
    pub source: String,
    pub destination: String,
    pub status: RenameStatus,
}

impl RenameOutcome {
    pub fn is_renamed(&self) -> bool {
        matches!(self.status, RenameStatus::Renamed)
    }
}

pub trait FileRenameOperations: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// True if both existing paths name the same file on disk.
    fn is_same_file(&self, a: &Path, b: &Path) -> io::Result<bool>;
}

pub struct CoreFileRenamer {}

impl CoreFileRenamer {
    pub fn new() -> Self {
        CoreFileRenamer {}
    }
}

impl Default for CoreFileRenamer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRenameOperations for CoreFileRenamer {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    #[cfg(unix)]
    fn is_same_file(&self, a: &Path, b: &Path) -> io::Result<bool> {
        use std::os::unix::fs::MetadataExt;
        let (a, b) = (fs::metadata(a)?, fs::metadata(b)?);
        Ok(a.dev() == b.dev() && a.ino() == b.ino())
    }

    #[cfg(not(unix))]
    fn is_same_file(&self, a: &Path, b: &Path) -> io::Result<bool> {
        Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
    }
}

fn is_case_variant(source: &str, destination: &str) -> bool {
    source.to_lowercase() == destination.to_lowercase()
}

/* Exactly one normal path component, so the destination stays inside the directory. */
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(component)), None) if component == name
    )
}

/*
 * Renames `directory/source` to `directory/destination`.
 *
 * Fails without touching the disk if the destination is not a plain file name, if the
 * source is missing, or if the destination exists as a different file. A case-only rename
 * is allowed where the file system resolves both names to the same file. On success, and
 * only then, the cache entry for `source` is moved to `destination` when
 * `update_cache_entry` is set.
 */
pub fn rename_one(
    file_ops: &dyn FileRenameOperations,
    cache: &mut RenameCache,
    directory: &Path,
    source: &str,
    destination: &str,
    update_cache_entry: bool,
) -> Result<()> {
    if !is_plain_file_name(destination) {
        log::warn!("BatchExecutor: Refusing to rename {source:?} to {destination:?}.");
        return Err(RenameError::InvalidName(destination.to_string()));
    }
    let source_path = directory.join(source);
    let destination_path = directory.join(destination);

    if !file_ops.exists(&source_path) {
        log::warn!("BatchExecutor: Source {source_path:?} does not exist.");
        return Err(RenameError::NotFound(source_path));
    }
    if file_ops.exists(&destination_path)
        && !(is_case_variant(source, destination)
            && file_ops.is_same_file(&source_path, &destination_path)?)
    {
        log::warn!("BatchExecutor: Destination {destination_path:?} already exists.");
        return Err(RenameError::Conflict(destination_path));
    }

    if let Err(e) = file_ops.move_file(&source_path, &destination_path) {
        log::error!("BatchExecutor: Failed to move {source_path:?} to {destination_path:?}: {e}");
        return Err(RenameError::Io(e));
    }
    log::info!("BatchExecutor: Renamed {source:?} -> {destination:?}.");

    if update_cache_entry && !cache.rekey(source, destination) {
        log::debug!("BatchExecutor: No cache entry for {source:?} to update.");
    }
    Ok(())
}

/*
 * Renames every cached file to its proposed name, in cache order, updating each cache entry
 * that succeeds. Returns one outcome per entry.
 */
pub fn rename_all(
    file_ops: &dyn FileRenameOperations,
    cache: &mut RenameCache,
    directory: &Path,
) -> Vec<RenameOutcome> {
    let proposals = cache.proposals();
    log::debug!(
        "BatchExecutor: Applying {} proposal(s) in {directory:?}.",
        proposals.len()
    );

    let mut outcomes = Vec::with_capacity(proposals.len());
    for (source, destination) in proposals {
        let status = if source == destination {
            RenameStatus::Unchanged
        } else {
            match rename_one(file_ops, cache, directory, &source, &destination, true) {
                Ok(()) => RenameStatus::Renamed,
                Err(e) => RenameStatus::Failed(e),
            }
        };
        outcomes.push(RenameOutcome {
            source,
            destination,
            status,
        });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::token::TokenTree;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn cache_with(entries: &[(&str, &str)]) -> RenameCache {
        let mut cache = RenameCache::new();
        for (original, proposed) in entries {
            cache.insert(original, TokenTree::new(original, " ."), proposed.to_string());
        }
        cache
    }

    /*
     * In-memory file system that compares names case-insensitively, like the default
     * Windows and macOS file systems do.
     */
    struct CaseInsensitiveFs {
        files: Mutex<HashSet<String>>,
        fail_moves: bool,
    }

    impl CaseInsensitiveFs {
        fn new(files: &[&str]) -> Self {
            CaseInsensitiveFs {
                files: Mutex::new(files.iter().map(|f| f.to_lowercase()).collect()),
                fail_moves: false,
            }
        }

        fn key(path: &Path) -> String {
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .to_lowercase()
        }
    }

    impl FileRenameOperations for CaseInsensitiveFs {
        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains(&Self::key(path))
        }

        fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.fail_moves {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "mocked"));
            }
            let mut files = self.files.lock().unwrap();
            files.remove(&Self::key(from));
            files.insert(Self::key(to));
            Ok(())
        }

        fn is_same_file(&self, a: &Path, b: &Path) -> io::Result<bool> {
            Ok(Self::key(a) == Self::key(b))
        }
    }

    #[test]
    fn test_rename_one_moves_file_and_rekeys_cache() -> io::Result<()> {
        // Arrange
        crate::initialize_logging();
        let dir = tempdir()?;
        fs::write(dir.path().join("a_b.txt"), "content")?;
        let mut cache = cache_with(&[("a_b.txt", "a b.txt")]);

        // Act
        let result = rename_one(
            &CoreFileRenamer::new(),
            &mut cache,
            dir.path(),
            "a_b.txt",
            "a b.txt",
            true,
        );

        // Assert
        assert!(result.is_ok());
        assert!(!dir.path().join("a_b.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("a b.txt"))?, "content");
        assert!(cache.contains("a b.txt"));
        assert!(!cache.has_files_to_rename());
        Ok(())
    }

    #[test]
    fn test_rename_one_without_cache_update_keeps_entry() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("x.txt"), "")?;
        let mut cache = cache_with(&[("x.txt", "y.txt")]);

        rename_one(&CoreFileRenamer::new(), &mut cache, dir.path(), "x.txt", "y.txt", false)
            .unwrap();

        assert!(cache.contains("x.txt"));
        assert!(!cache.contains("y.txt"));
        Ok(())
    }

    #[test]
    fn test_rename_one_missing_source_is_not_found() {
        let dir = tempdir().unwrap();
        let mut cache = cache_with(&[("gone.txt", "new.txt")]);

        let result = rename_one(
            &CoreFileRenamer::new(),
            &mut cache,
            dir.path(),
            "gone.txt",
            "new.txt",
            true,
        );

        assert!(matches!(result, Err(RenameError::NotFound(_))));
        assert!(!dir.path().join("new.txt").exists());
        assert!(cache.contains("gone.txt"));
    }

    #[test]
    fn test_rename_one_existing_destination_is_conflict() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("src.txt"), "source")?;
        fs::write(dir.path().join("dst.txt"), "destination")?;
        let mut cache = cache_with(&[("src.txt", "dst.txt")]);

        let result = rename_one(
            &CoreFileRenamer::new(),
            &mut cache,
            dir.path(),
            "src.txt",
            "dst.txt",
            true,
        );

        assert!(matches!(result, Err(RenameError::Conflict(_))));
        assert_eq!(fs::read_to_string(dir.path().join("dst.txt"))?, "destination");
        assert!(dir.path().join("src.txt").exists());
        assert!(cache.contains("src.txt"));
        Ok(())
    }

    #[test]
    fn test_case_only_rename_is_allowed_on_case_insensitive_fs() {
        let file_ops = CaseInsensitiveFs::new(&["a.txt"]);
        let mut cache = cache_with(&[("a.txt", "A.txt")]);

        let result = rename_one(&file_ops, &mut cache, Path::new("/dir"), "a.txt", "A.txt", true);

        assert!(result.is_ok());
        assert!(cache.contains("A.txt"));
    }

    #[test]
    fn test_case_only_rename_on_real_fs() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("Foo.txt"), "")?;
        let mut cache = cache_with(&[("Foo.txt", "foo.txt")]);

        let result = rename_one(
            &CoreFileRenamer::new(),
            &mut cache,
            dir.path(),
            "Foo.txt",
            "foo.txt",
            true,
        );

        assert!(result.is_ok());
        assert!(dir.path().join("foo.txt").exists());
        Ok(())
    }

    #[test]
    fn test_case_variant_of_a_distinct_file_is_conflict() -> io::Result<()> {
        // Arrange
        crate::initialize_logging();
        let dir = tempdir()?;
        fs::write(dir.path().join("Foo.txt"), "upper")?;
        fs::write(dir.path().join("foo.txt"), "lower")?;
        if fs::read_dir(dir.path())?.count() < 2 {
            // Case-insensitive file system; both names are one file.
            return Ok(());
        }
        let mut cache = cache_with(&[("Foo.txt", "foo.txt")]);

        // Act
        let result = rename_one(
            &CoreFileRenamer::new(),
            &mut cache,
            dir.path(),
            "Foo.txt",
            "foo.txt",
            true,
        );

        // Assert
        assert!(matches!(result, Err(RenameError::Conflict(_))));
        assert_eq!(fs::read_to_string(dir.path().join("Foo.txt"))?, "upper");
        assert_eq!(fs::read_to_string(dir.path().join("foo.txt"))?, "lower");
        assert!(cache.contains("Foo.txt"));
        Ok(())
    }

    #[test]
    fn test_destination_outside_directory_is_rejected() -> io::Result<()> {
        let root = tempdir()?;
        let photos = root.path().join("photos");
        fs::create_dir(&photos)?;
        fs::write(photos.join("a.txt"), "")?;
        let mut cache = cache_with(&[("a.txt", "../escaped.txt")]);

        for destination in ["../escaped.txt", "sub/a.txt", "", ".", ".."] {
            let result = rename_one(
                &CoreFileRenamer::new(),
                &mut cache,
                &photos,
                "a.txt",
                destination,
                true,
            );
            assert!(
                matches!(result, Err(RenameError::InvalidName(_))),
                "{destination:?} gave {result:?}"
            );
        }

        assert!(photos.join("a.txt").exists());
        assert!(!root.path().join("escaped.txt").exists());
        assert!(cache.contains("a.txt"));
        Ok(())
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("a b.txt"));
        assert!(is_plain_file_name(".hidden"));
        assert!(!is_plain_file_name("dir/"));
        assert!(!is_plain_file_name("/abs.txt"));
    }

    #[test]
    fn test_move_failure_is_io_error_and_cache_unchanged() {
        let mut file_ops = CaseInsensitiveFs::new(&["locked.txt"]);
        file_ops.fail_moves = true;
        let mut cache = cache_with(&[("locked.txt", "open.txt")]);

        let result = rename_one(
            &file_ops,
            &mut cache,
            Path::new("/dir"),
            "locked.txt",
            "open.txt",
            true,
        );

        match result {
            Err(RenameError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("Expected an I/O error, got {other:?}"),
        }
        assert!(cache.contains("locked.txt"));
        assert!(!cache.contains("open.txt"));
    }

    #[test]
    fn test_rename_all_continues_past_failures() -> io::Result<()> {
        // Arrange
        crate::initialize_logging();
        let dir = tempdir()?;
        fs::write(dir.path().join("one_1.txt"), "")?;
        fs::write(dir.path().join("same.txt"), "")?;
        fs::write(dir.path().join("three_3.txt"), "")?;
        let mut cache = cache_with(&[
            ("one_1.txt", "one 1.txt"),
            ("missing_2.txt", "missing 2.txt"),
            ("same.txt", "same.txt"),
            ("three_3.txt", "three 3.txt"),
        ]);

        // Act
        let outcomes = rename_all(&CoreFileRenamer::new(), &mut cache, dir.path());

        // Assert
        let sources: Vec<&str> = outcomes.iter().map(|o| o.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["one_1.txt", "missing_2.txt", "same.txt", "three_3.txt"]
        );
        assert!(outcomes[0].is_renamed());
        assert!(matches!(
            outcomes[1].status,
            RenameStatus::Failed(RenameError::NotFound(_))
        ));
        assert!(matches!(outcomes[2].status, RenameStatus::Unchanged));
        assert!(outcomes[3].is_renamed());
        assert!(dir.path().join("one 1.txt").exists());
        assert!(dir.path().join("three 3.txt").exists());
        assert!(cache.has_files_to_rename());
        Ok(())
    }
}
