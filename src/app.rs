use crate::braille::DotCanvas;
use crate::config::AppConfig;
use crate::error::{MeshError, Result};
use crate::host::canvas_viewport;
use crate::mesh::{HostEvent, MeshAnimator};
use crate::presets::{Preset, PresetManager};
use crate::render::FrameStats;
use crate::scheduler::Host;
use crate::settings::MeshSettings;
use crate::simulation::Viewport;
use ratatui::layout::Rect;
use std::path::PathBuf;
use tracing::{info, warn};

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Particles,
    Drift,
    Damping,
    MaxSpeed,
    Pointer,
    PointerMode,
    Links,
    Fps,
    ColorScheme,
    Glow,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters top to bottom
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Particles,
            Focus::Particles => Focus::Drift,
            Focus::Drift => Focus::Damping,
            Focus::Damping => Focus::MaxSpeed,
            Focus::MaxSpeed => Focus::Pointer,
            Focus::Pointer => Focus::PointerMode,
            Focus::PointerMode => Focus::Links,
            Focus::Links => Focus::Fps,
            Focus::Fps => Focus::ColorScheme,
            Focus::ColorScheme => Focus::Glow,
            Focus::Glow => Focus::Particles,
        }
    }

    /// Shift+Tab goes the other way
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Glow,
            Focus::Particles => Focus::Glow,
            Focus::Drift => Focus::Particles,
            Focus::Damping => Focus::Drift,
            Focus::MaxSpeed => Focus::Damping,
            Focus::Pointer => Focus::MaxSpeed,
            Focus::PointerMode => Focus::Pointer,
            Focus::Links => Focus::PointerMode,
            Focus::Fps => Focus::Links,
            Focus::ColorScheme => Focus::Fps,
            Focus::Glow => Focus::ColorScheme,
        }
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::Particles => 0,
            Focus::Drift => 1,
            Focus::Damping => 2,
            Focus::MaxSpeed => 3,
            Focus::Pointer => 4,
            Focus::PointerMode => 5,
            Focus::Links => 6,
            Focus::Fps => 7,
            Focus::ColorScheme => 8,
            Focus::Glow => 9,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    /// `None` when the terminal gave us nothing to draw on
    pub animator: Option<MeshAnimator>,
    pub canvas: DotCanvas,
    pub presets: PresetManager,
    pub preset_index: usize,
    /// Configured settings; the animator may run a reduced-motion variant
    pub settings: MeshSettings,
    pub pixel_ratio: f32,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    /// One-line feedback shown in the status box
    pub message: Option<String>,
    config_path: Option<PathBuf>,
}

impl App {
    pub fn new(
        animator: Option<MeshAnimator>,
        presets: PresetManager,
        config: &AppConfig,
        config_path: Option<PathBuf>,
    ) -> Self {
        let preset_index = presets.index_of(&config.preset).unwrap_or(0);
        Self {
            animator,
            canvas: DotCanvas::new(0, 0),
            presets,
            preset_index,
            settings: config.settings.clone(),
            pixel_ratio: config.pixel_ratio,
            focus: Focus::Controls,
            fullscreen_mode: config.fullscreen,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            message: None,
            config_path,
        }
    }

    /// Route one host event to the animator, drawing into the dot canvas
    pub fn dispatch(&mut self, host: &mut dyn Host, event: HostEvent) -> Option<FrameStats> {
        let animator = self.animator.as_mut()?;
        animator.handle(host, event, &mut self.canvas)
    }

    /// Match the dot canvas to a new canvas area; returns the viewport the
    /// animator should see
    pub fn resize_canvas(&mut self, area: Rect) -> Viewport {
        if self.canvas.cell_size() != (area.width, area.height) {
            self.canvas.resize_cells(area.width, area.height);
        }
        canvas_viewport(area, self.pixel_ratio)
    }

    pub fn is_paused(&self) -> bool {
        self.animator.as_ref().is_some_and(|a| a.is_paused())
    }

    pub fn reduced_motion(&self) -> bool {
        self.animator.as_ref().is_some_and(|a| a.reduced_motion())
    }

    pub fn preset_name(&self) -> &str {
        self.presets
            .get_wrapped(self.preset_index)
            .map(|p| p.name.as_str())
            .unwrap_or("Custom")
    }

    /// Change the configured settings and push them to the animator
    fn update_settings(&mut self, f: impl FnOnce(&mut MeshSettings)) {
        f(&mut self.settings);
        if let Some(animator) = self.animator.as_mut() {
            animator.apply_settings(self.settings.clone());
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Particles => self.update_settings(|s| s.adjust_particle_count(10)),
            Focus::Drift => self.update_settings(|s| s.adjust_drift(0.02)),
            Focus::Damping => self.update_settings(|s| s.adjust_damping(0.005)),
            Focus::MaxSpeed => self.update_settings(|s| s.adjust_max_speed(0.1)),
            Focus::Pointer => self.update_settings(|s| s.adjust_pointer_strength(0.02)),
            Focus::PointerMode => self.toggle_pointer_mode(),
            Focus::Links => self.update_settings(|s| s.adjust_link_distance(5.0)),
            Focus::Fps => self.update_settings(|s| s.cycle_target_fps(true)),
            Focus::ColorScheme => self.update_settings(|s| s.color_scheme = s.color_scheme.next()),
            Focus::Glow => self.toggle_glow(),
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Particles => self.update_settings(|s| s.adjust_particle_count(-10)),
            Focus::Drift => self.update_settings(|s| s.adjust_drift(-0.02)),
            Focus::Damping => self.update_settings(|s| s.adjust_damping(-0.005)),
            Focus::MaxSpeed => self.update_settings(|s| s.adjust_max_speed(-0.1)),
            Focus::Pointer => self.update_settings(|s| s.adjust_pointer_strength(-0.02)),
            Focus::PointerMode => self.toggle_pointer_mode(),
            Focus::Links => self.update_settings(|s| s.adjust_link_distance(-5.0)),
            Focus::Fps => self.update_settings(|s| s.cycle_target_fps(false)),
            Focus::ColorScheme => self.update_settings(|s| s.color_scheme = s.color_scheme.prev()),
            Focus::Glow => self.toggle_glow(),
        }
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            let paused = !animator.is_paused();
            animator.set_paused(paused);
        }
    }

    /// Scatter a fresh particle set
    pub fn reset(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            animator.reset();
        }
    }

    pub fn cycle_color_scheme(&mut self) {
        self.update_settings(|s| s.color_scheme = s.color_scheme.next());
    }

    pub fn toggle_glow(&mut self) {
        self.update_settings(|s| s.toggle_glow());
    }

    pub fn toggle_pointer_mode(&mut self) {
        self.update_settings(|s| s.pointer_mode = s.pointer_mode.next());
    }

    pub fn toggle_reduced_motion(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            let reduced = !animator.reduced_motion();
            animator.set_reduced_motion(reduced);
        }
    }

    /// Load the next (or previous) preset's settings
    pub fn cycle_preset(&mut self, forward: bool) {
        let len = self.presets.len();
        if len == 0 {
            return;
        }
        self.preset_index = if forward {
            (self.preset_index + 1) % len
        } else {
            (self.preset_index + len - 1) % len
        };
        if let Some(preset) = self.presets.get_wrapped(self.preset_index) {
            let settings = preset.settings.clone();
            let name = preset.name.clone();
            self.update_settings(|s| *s = settings);
            self.message = Some(format!("preset: {}", name));
        }
    }

    /// Store the current settings as a new user preset and select it
    pub fn save_as_preset(&mut self) {
        let name = (1..)
            .map(|n| format!("Saved {}", n))
            .find(|name| self.presets.find(name).is_none())
            .unwrap_or_else(|| "Saved".to_string());
        let preset = Preset::new(name.clone(), "Saved from the sidebar", self.settings.clone());
        match self.presets.save_preset(preset) {
            Ok(()) => {
                self.preset_index = self.presets.index_of(&name).unwrap_or(self.preset_index);
                info!(preset = %name, "preset saved");
                self.message = Some(format!("saved {}", name));
            }
            Err(err) => {
                warn!(%err, "preset not saved");
                self.message = Some(format!("save failed: {}", err));
            }
        }
    }

    /// Delete the selected preset if it is a user preset
    pub fn delete_current_preset(&mut self) {
        if self.preset_index < self.presets.builtin.len() {
            self.message = Some("built-in presets stay".to_string());
            return;
        }
        let name = self.preset_name().to_string();
        match self.presets.delete_preset(&name) {
            Ok(()) => {
                self.preset_index = 0;
                info!(preset = %name, "preset deleted");
                self.message = Some(format!("deleted {}", name));
            }
            Err(err) => {
                warn!(%err, "preset not deleted");
                self.message = Some(format!("delete failed: {}", err));
            }
        }
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Scroll controls box up
    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    /// Scroll controls box down
    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Snapshot of everything worth restoring next launch
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            settings: self.settings.clone(),
            preset: self.preset_name().to_string(),
            pixel_ratio: self.pixel_ratio,
            reduced_motion: self.reduced_motion(),
            fullscreen: self.fullscreen_mode,
            ..Default::default()
        }
    }

    fn write_config(&self) -> Result<PathBuf> {
        let path = self
            .config_path
            .clone()
            .or_else(AppConfig::default_path)
            .ok_or(MeshError::NoConfigDir)?;
        self.to_config().save_to_file(&path)?;
        Ok(path)
    }

    /// Persist the current configuration, reporting the outcome in the status box
    pub fn save_config(&mut self) {
        match self.write_config() {
            Ok(path) => {
                info!(path = %path.display(), "config saved");
                self.message = Some("config saved".to_string());
            }
            Err(err) => {
                warn!(%err, "config not saved");
                self.message = Some(format!("save failed: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MountOptions;
    use crate::scheduler::ManualHost;
    use crate::settings::PointerMode;
    use tempfile::TempDir;

    fn app_with_animator(host: &mut ManualHost, config_path: Option<PathBuf>) -> App {
        let config = AppConfig::default();
        let mut app = App::new(None, PresetManager::with_dir(None), &config, config_path);
        let viewport = app.resize_canvas(Rect::new(0, 0, 40, 20));
        app.animator = MeshAnimator::mount(
            host,
            viewport,
            config.settings.clone(),
            MountOptions {
                seed: Some(11),
                ..Default::default()
            },
        );
        app
    }

    #[test]
    fn test_focus_cycle_round_trips() {
        let mut focus = Focus::Particles;
        for _ in 0..10 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Particles);
        assert_eq!(Focus::Particles.prev().next(), Focus::Particles);
        assert!(!Focus::Controls.is_param());
    }

    #[test]
    fn test_dispatch_draws_into_canvas() {
        let mut host = ManualHost::new();
        let mut app = app_with_animator(&mut host, None);
        assert_eq!(app.canvas.dot_size(), (80, 80));

        host.take_frame();
        let stats = app.dispatch(&mut host, HostEvent::Frame(std::time::Duration::ZERO));
        assert_eq!(stats.map(|s| s.nodes), Some(70));
        assert!(!app.canvas.cells().is_empty());
    }

    #[test]
    fn test_dispatch_without_animator_is_noop() {
        let mut host = ManualHost::without_surface();
        let mut app = App::new(None, PresetManager::with_dir(None), &AppConfig::default(), None);
        assert!(app.dispatch(&mut host, HostEvent::PointerLeave).is_none());
        app.toggle_pause();
        app.reset();
        assert!(!app.is_paused());
    }

    #[test]
    fn test_adjusting_particles_reaches_animator() {
        let mut host = ManualHost::new();
        let mut app = app_with_animator(&mut host, None);
        app.focus = Focus::Particles;
        app.adjust_focused_up();

        let animator = app.animator.as_ref().unwrap();
        assert_eq!(animator.field().len(), 80);
        assert_eq!(app.settings.particle_count, 80);
    }

    #[test]
    fn test_preset_cycling_applies_settings() {
        let mut host = ManualHost::new();
        let mut app = app_with_animator(&mut host, None);

        app.cycle_preset(true);
        assert_eq!(app.preset_name(), "Gold");
        assert!(!app.settings.glow);

        app.cycle_preset(false);
        app.cycle_preset(false);
        assert_eq!(app.preset_name(), "Calm");
    }

    #[test]
    fn test_pointer_mode_toggle() {
        let mut host = ManualHost::new();
        let mut app = app_with_animator(&mut host, None);
        app.toggle_pointer_mode();
        assert_eq!(app.settings.pointer_mode, PointerMode::Attract);
        assert_eq!(
            app.animator.as_ref().unwrap().settings().pointer_mode,
            PointerMode::Attract
        );
    }

    #[test]
    fn test_save_config_writes_current_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut host = ManualHost::new();
        let mut app = app_with_animator(&mut host, Some(path.clone()));
        app.toggle_glow();
        app.toggle_fullscreen();
        app.save_config();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert!(!loaded.settings.glow);
        assert!(loaded.fullscreen);
        assert_eq!(app.message.as_deref(), Some("config saved"));
    }

    #[test]
    fn test_reduced_motion_toggle() {
        let mut host = ManualHost::new();
        let mut app = app_with_animator(&mut host, None);
        app.toggle_reduced_motion();
        assert!(app.reduced_motion());
        assert_eq!(app.animator.as_ref().unwrap().field().len(), 35);
        // Configured settings are untouched
        assert_eq!(app.settings.particle_count, 70);
    }

    #[test]
    fn test_save_and_delete_user_preset() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(
            None,
            PresetManager::with_dir(Some(dir.path().to_path_buf())),
            &AppConfig::default(),
            None,
        );
        app.update_settings(|s| s.drift = 0.4);
        app.save_as_preset();
        assert_eq!(app.preset_name(), "Saved 1");
        assert!(dir.path().join("Saved_1.json").exists());

        app.delete_current_preset();
        assert_eq!(app.preset_name(), "Obsidian");
        assert!(!dir.path().join("Saved_1.json").exists());

        // Built-ins cannot be deleted
        app.delete_current_preset();
        assert_eq!(app.presets.len(), 4);
    }

    #[test]
    fn test_saving_after_delete_keeps_other_presets() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(
            None,
            PresetManager::with_dir(Some(dir.path().to_path_buf())),
            &AppConfig::default(),
            None,
        );
        app.update_settings(|s| s.drift = 0.4);
        app.save_as_preset();
        app.update_settings(|s| s.drift = 0.6);
        app.save_as_preset();
        assert_eq!(app.preset_name(), "Saved 2");

        app.preset_index = app.presets.index_of("Saved 1").unwrap();
        app.delete_current_preset();

        app.update_settings(|s| s.drift = 0.8);
        app.save_as_preset();
        assert_eq!(app.preset_name(), "Saved 1");

        assert_eq!(app.presets.user.len(), 2);
        assert_eq!(app.presets.find("Saved 1").unwrap().settings.drift, 0.8);
        assert_eq!(app.presets.find("Saved 2").unwrap().settings.drift, 0.6);
        assert!(dir.path().join("Saved_1.json").exists());
        assert!(dir.path().join("Saved_2.json").exists());
    }
}
