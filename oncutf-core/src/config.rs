use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Whether companion (sidecar) handling is active at all.
    #[serde(default = "default_true")]
    pub companion_files: bool,

    /// Whether companions are renamed together with their primaries.
    #[serde(default = "default_true")]
    pub auto_rename_companions: bool,

    /// Whether preflight recomputes hashes to detect modified files.
    #[serde(default)]
    pub check_hash: bool,

    /// Backup directory for overwritten files. Defaults to
    /// `~/.oncutf/backups` when unset.
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Capacity of the conflict resolver's undo stack.
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            companion_files: true,
            auto_rename_companions: true,
            check_hash: false,
            backup_dir: None,
            undo_capacity: default_undo_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_undo_capacity() -> usize {
    100
}

impl Config {
    /// Load config from .oncutf/config.toml if it exists
    pub fn load() -> Result<Self> {
        if let Ok(cwd) = std::env::current_dir() {
            let config_path = cwd.join(".oncutf").join("config.toml");
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }

        // Return default config if no config file exists
        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to .oncutf/config.toml
    pub fn save(&self) -> Result<()> {
        let cwd = std::env::current_dir()?;
        let config_dir = cwd.join(".oncutf");
        let config_path = config_dir.join("config.toml");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        self.save_to_path(&config_path)
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Effective backup directory, falling back to `~/.oncutf/backups`.
    pub fn backup_dir(&self) -> PathBuf {
        self.defaults.backup_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".oncutf")
                .join("backups")
        })
    }

    /// Companions are renamed only when both switches are on.
    pub fn rename_companions(&self) -> bool {
        self.defaults.companion_files && self.defaults.auto_rename_companions
    }
}
