use crate::color::ColorScheme;
use crate::error::{MeshError, Result};
use crate::settings::{MeshSettings, PointerMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A named bundle of mesh settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: MeshSettings,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: MeshSettings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus whatever lives in the user presets directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// Get the presets directory path
    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("neural-mesh").join("presets"))
    }

    /// Load user presets from disk
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match load_preset(&path) {
                Ok(preset) => self.user.push(preset),
                Err(err) => warn!(%err, "skipping unreadable preset"),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let dir = self.dir.as_ref().ok_or(MeshError::NoConfigDir)?;
        Ok(dir.join(format!("{}.json", sanitize_filename(name))))
    }

    /// Save a preset to disk
    pub fn save_preset(&mut self, preset: Preset) -> Result<()> {
        let path = self.path_for(&preset.name)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| MeshError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json).map_err(|source| MeshError::Write { path, source })?;

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }
        Ok(())
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        self.user.retain(|p| p.name != name);

        let path = self.path_for(name)?;
        if path.exists() {
            fs::remove_file(&path).map_err(|source| MeshError::Write { path, source })?;
        }
        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len()
    }

    /// Preset at a position in `all_presets` order, wrapping around
    pub fn get_wrapped(&self, index: usize) -> Option<&Preset> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.all_presets().nth(index % len)
    }

    /// Position of a preset by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.all_presets().position(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get preset names for display
    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }
}

fn load_preset(path: &Path) -> Result<Preset> {
    let content = fs::read_to_string(path).map_err(|source| MeshError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| MeshError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// The shipped looks
fn builtin_presets() -> Vec<Preset> {
    vec![
        // Obsidian - the default: cyan nodes, slate links, soft glow
        Preset::new(
            "Obsidian",
            "Cyan nodes over an obsidian glow",
            MeshSettings::default(),
        ),
        // Gold - slower glide with a hard speed cap, no glow
        Preset::new(
            "Gold",
            "Slow gold mesh with bright dots",
            MeshSettings {
                drift: 0.1,
                initial_speed: 0.1,
                damping: 0.99,
                max_speed: 0.4,
                link_alpha: 0.2,
                node_alpha: 0.6,
                node_heat_alpha: 0.2,
                glow: false,
                color_scheme: ColorScheme::Gold,
                ..Default::default()
            },
        ),
        // Ember - fewer nodes on narrow surfaces, capped frame rate, pointer pulls
        Preset::new(
            "Ember",
            "Capped at 45 fps, thins out on narrow screens, attracts to the pointer",
            MeshSettings {
                particle_count: 60,
                narrow_particle_count: 28,
                narrow_breakpoint: 160.0,
                drift: 0.14,
                pointer_mode: PointerMode::Attract,
                pointer_strength: 0.3,
                target_fps: Some(45),
                color_scheme: ColorScheme::Ember,
                ..Default::default()
            },
        ),
        // Calm - sparse and quiet
        Preset::new(
            "Calm",
            "Sparse, barely drifting monochrome mesh",
            MeshSettings {
                particle_count: 40,
                narrow_particle_count: 40,
                drift: 0.05,
                damping: 0.99,
                max_speed: 0.25,
                pointer_strength: 0.1,
                link_alpha: 0.18,
                glow: false,
                color_scheme: ColorScheme::Mono,
                ..Default::default()
            },
        ),
    ]
}
