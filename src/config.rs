use crate::error::{MeshError, Result};
use crate::settings::MeshSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current on-disk format version
const CONFIG_VERSION: u32 = 1;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Mesh tuning
    pub settings: MeshSettings,
    /// Preset the settings started from
    pub preset: String,
    /// Device pixel ratio (clamped to 1-2)
    pub pixel_ratio: f32,
    /// Honour reduced motion
    pub reduced_motion: bool,
    /// Start without the sidebar
    pub fullscreen: bool,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| MeshError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| MeshError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| MeshError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig = serde_json::from_str(&content).map_err(|source| MeshError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.settings = config.settings.sanitized();
        Ok(config)
    }

    /// `<config dir>/neural-mesh/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("neural-mesh").join("config.json"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: MeshSettings::default(),
            preset: "Obsidian".to_string(),
            pixel_ratio: 1.0,
            reduced_motion: false,
            fullscreen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;
    use crate::settings::PointerMode;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_config_file_save_and_load() {
        let config = AppConfig {
            settings: MeshSettings {
                drift: 0.3,
                pointer_mode: PointerMode::Attract,
                target_fps: Some(45),
                color_scheme: ColorScheme::Ember,
                ..Default::default()
            },
            preset: "Ember".to_string(),
            pixel_ratio: 2.0,
            reduced_motion: true,
            fullscreen: true,
            ..Default::default()
        };

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();
        let loaded = AppConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        AppConfig::default().save_to_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), r#"{ "settings": { "drift": 0.5 }, "fullscreen": true }"#).unwrap();

        let loaded = AppConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.settings.drift, 0.5);
        assert_eq!(loaded.settings.particle_count, MeshSettings::default().particle_count);
        assert!(loaded.fullscreen);
        assert_eq!(loaded.version, CONFIG_VERSION);
    }

    #[test]
    fn test_loaded_settings_are_sanitized() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), r#"{ "settings": { "damping": 4.0 } }"#).unwrap();

        let loaded = AppConfig::load_from_file(temp_file.path()).unwrap();
        assert!(loaded.settings.damping < 1.0);
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = AppConfig::load_from_file(temp_file.path());
        assert!(matches!(result, Err(MeshError::Parse { .. })));
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(matches!(result, Err(MeshError::Read { .. })));
    }
}
