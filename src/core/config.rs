/*
 * Engine configuration and its persistence. `EngineConfig` gathers every policy the engine
 * applies (default separators, extension casing, reconstruction boundaries, strings to
 * strip before tokenizing) so several engines with different policies can coexist.
 *
 * Persistence goes through the `ConfigManagerOperations` trait. `CoreConfigManager` stores
 * the configuration as JSON in the platform's local configuration directory for the
 * application, or in an explicit base directory when one is given.
 */
use super::reconstruct::{BoundaryPolicy, ReconstructOptions};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

const ENGINE_CONFIG_FILENAME: &str = "engine_config.json";
pub const DEFAULT_SEPARATORS: &str = " ._-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separator characters given to every freshly tokenized file name.
    pub default_separators: String,
    pub always_lowercase_extension: bool,
    /// Gate for running the transform pipeline over the active tree.
    pub apply_transforms: bool,
    pub boundary_policy: BoundaryPolicy,
    /// Literals stripped from a file name before it is split.
    pub strings_to_remove: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_separators: DEFAULT_SEPARATORS.to_string(),
            always_lowercase_extension: false,
            apply_transforms: true,
            boundary_policy: BoundaryPolicy::default(),
            strings_to_remove: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn reconstruct_options(&self) -> ReconstructOptions {
        ReconstructOptions {
            boundary_policy: self.boundary_policy,
            lowercase_extension: self.always_lowercase_extension,
        }
    }

    /// `file_name` with every configured literal removed.
    pub fn remove_strings(&self, file_name: &str) -> String {
        self.strings_to_remove
            .iter()
            .filter(|s| !s.is_empty())
            .fold(file_name.to_string(), |name, s| name.replace(s.as_str(), ""))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration format error: {e}"),
            ConfigError::NoConfigDirectory => {
                write!(f, "Could not determine a directory for the configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            ConfigError::NoConfigDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub trait ConfigManagerOperations: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load_engine_config(&self, app_name: &str) -> Result<Option<EngineConfig>>;
    fn save_engine_config(&self, app_name: &str, config: &EngineConfig) -> Result<()>;
}

pub struct CoreConfigManager {
    base_dir: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager { base_dir: None }
    }

    /// Keeps the configuration file directly in `base_dir` instead of the platform location.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        CoreConfigManager {
            base_dir: Some(base_dir),
        }
    }

    /*
     * Resolves the directory holding the configuration file and creates it if missing.
     * Without an explicit base directory, the platform's local (non-roaming) config
     * directory for `app_name` is used.
     */
    fn config_dir(&self, app_name: &str) -> Result<PathBuf> {
        let dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("", "", app_name)
                .map(|dirs| dirs.config_local_dir().to_path_buf())
                .ok_or(ConfigError::NoConfigDirectory)?,
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            log::debug!("CoreConfigManager: Created config directory {dir:?}.");
        }
        Ok(dir)
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_engine_config(&self, app_name: &str) -> Result<Option<EngineConfig>> {
        let file_path = self.config_dir(app_name)?.join(ENGINE_CONFIG_FILENAME);
        if !file_path.exists() {
            log::debug!("CoreConfigManager: No engine config at {file_path:?}.");
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&file_path)?);
        let config: EngineConfig = serde_json::from_reader(reader)?;
        log::debug!("CoreConfigManager: Loaded engine config from {file_path:?}.");
        Ok(Some(config))
    }

    fn save_engine_config(&self, app_name: &str, config: &EngineConfig) -> Result<()> {
        let file_path = self.config_dir(app_name)?.join(ENGINE_CONFIG_FILENAME);
        let mut writer = BufWriter::new(File::create(&file_path)?);
        serde_json::to_writer_pretty(&mut writer, config)?;
        writer.flush()?;
        log::debug!("CoreConfigManager: Saved engine config to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEST_APP: &str = "TokenRenamerTest";

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.default_separators, " ._-");
        assert!(!config.always_lowercase_extension);
        assert!(config.apply_transforms);
        assert_eq!(config.boundary_policy, BoundaryPolicy::AllLeaves);
        assert!(config.strings_to_remove.is_empty());
    }

    #[test]
    fn test_load_missing_config_returns_none() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path().join("nested"));
        let loaded = manager.load_engine_config(TEST_APP).unwrap();
        assert!(loaded.is_none());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_save_then_load_config() {
        // Arrange
        crate::initialize_logging();
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = EngineConfig {
            default_separators: "_".to_string(),
            always_lowercase_extension: true,
            apply_transforms: false,
            boundary_policy: BoundaryPolicy::VisibleLeaves,
            strings_to_remove: vec!["[copy]".to_string()],
        };

        // Act
        manager.save_engine_config(TEST_APP, &config).unwrap();
        let loaded = manager.load_engine_config(TEST_APP).unwrap();

        // Assert
        assert_eq!(loaded, Some(config));
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(ENGINE_CONFIG_FILENAME),
            r#"{ "always_lowercase_extension": true }"#,
        )
        .unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path().to_path_buf());

        let loaded = manager.load_engine_config(TEST_APP).unwrap().unwrap();
        assert!(loaded.always_lowercase_extension);
        assert_eq!(loaded.default_separators, DEFAULT_SEPARATORS);
    }

    #[test]
    fn test_corrupt_config_is_a_serde_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(ENGINE_CONFIG_FILENAME), "not json").unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path().to_path_buf());

        match manager.load_engine_config(TEST_APP) {
            Err(ConfigError::Serde(_)) => {}
            other => panic!("Expected a serde error, got {other:?}"),
        }
    }

    #[test]
    fn test_remove_strings() {
        let config = EngineConfig {
            strings_to_remove: vec!["[copy]".to_string(), String::new(), "_final".to_string()],
            ..EngineConfig::default()
        };
        assert_eq!(config.remove_strings("report_final[copy].doc"), "report.doc");
        assert_eq!(config.remove_strings("plain.txt"), "plain.txt");
    }
}
