use crate::color::ColorScheme;
use serde::{Deserialize, Serialize};

/// How the pointer pushes nearby particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointerMode {
    /// Push particles away from the pointer
    #[default]
    Repel,
    /// Pull particles towards the pointer
    Attract,
}

impl PointerMode {
    pub fn name(&self) -> &str {
        match self {
            PointerMode::Repel => "Repel",
            PointerMode::Attract => "Attract",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            PointerMode::Repel => PointerMode::Attract,
            PointerMode::Attract => PointerMode::Repel,
        }
    }

    pub fn prev(&self) -> Self {
        self.next()
    }

    /// Sign applied to the particle-minus-pointer vector
    pub fn polarity(&self) -> f32 {
        match self {
            PointerMode::Repel => 1.0,
            PointerMode::Attract => -1.0,
        }
    }
}

/// All tuning for one animator instance
///
/// Distances are in logical surface units (Braille dots in the terminal,
/// CSS-like pixels in exports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    // === Population ===
    /// Particle count on wide surfaces (4-400)
    pub particle_count: usize,
    /// Particle count used below `narrow_breakpoint` (4-400)
    pub narrow_particle_count: usize,
    /// Surface width under which the narrow count applies (0 = never)
    pub narrow_breakpoint: f32,

    // === Motion ===
    /// Random drift magnitude (0.0-1.0)
    pub drift: f32,
    /// Spread of seeded velocities (0.0-2.0)
    pub initial_speed: f32,
    /// Velocity multiplier per step, strictly inside (0, 1)
    pub damping: f32,
    /// Per-axis velocity cap (0.05-5.0)
    pub max_speed: f32,

    // === Pointer ===
    /// Pointer force strength (0.0-1.0, 0 = ignore pointer)
    pub pointer_strength: f32,
    /// Distance at which pointer force reaches zero
    pub pointer_radius: f32,
    pub pointer_mode: PointerMode,

    // === Rendering ===
    /// Maximum distance at which two particles are linked
    pub link_distance: f32,
    /// Base dot radius
    pub node_radius: f32,
    /// Link opacity at distance zero
    pub link_alpha: f32,
    /// Node opacity far from the focus point
    pub node_alpha: f32,
    /// Extra node opacity at the focus point
    pub node_heat_alpha: f32,
    /// Distance over which nodes brighten near the focus point
    pub heat_radius: f32,
    /// Draw the ambient radial glow
    pub glow: bool,
    pub color_scheme: ColorScheme,

    // === Scheduling ===
    /// Frame-rate cap (None = every display refresh)
    pub target_fps: Option<u32>,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            particle_count: 70,
            narrow_particle_count: 70,
            narrow_breakpoint: 0.0,

            drift: 0.18,
            initial_speed: 0.25,
            damping: 0.985,
            max_speed: 0.6,

            pointer_strength: 0.22,
            pointer_radius: 64.0,
            pointer_mode: PointerMode::Repel,

            link_distance: 30.0,
            node_radius: 1.4,
            link_alpha: 0.25,
            node_alpha: 0.35,
            node_heat_alpha: 0.35,
            heat_radius: 44.0,
            glow: true,
            color_scheme: ColorScheme::Obsidian,

            target_fps: None,
        }
    }
}

impl MeshSettings {
    /// Number of particles wanted for a surface of the given width
    pub fn particle_count_for(&self, width: f32) -> usize {
        if width < self.narrow_breakpoint {
            self.narrow_particle_count
        } else {
            self.particle_count
        }
    }

    /// Variant honouring a reduced-motion preference: fewer particles, slower
    /// drift and no pointer influence. The effect itself stays on.
    pub fn reduced_motion(&self) -> Self {
        Self {
            particle_count: (self.particle_count / 2).max(1),
            narrow_particle_count: (self.narrow_particle_count / 2).max(1),
            drift: self.drift * 0.45,
            pointer_strength: 0.0,
            ..self.clone()
        }
    }

    /// Bring every field back into its supported range
    pub fn sanitized(mut self) -> Self {
        self.particle_count = self.particle_count.clamp(4, 400);
        self.narrow_particle_count = self.narrow_particle_count.clamp(4, 400);
        self.narrow_breakpoint = finite_or(self.narrow_breakpoint, 0.0).max(0.0);
        self.drift = finite_or(self.drift, 0.18).clamp(0.0, 1.0);
        self.initial_speed = finite_or(self.initial_speed, 0.25).clamp(0.0, 2.0);
        self.damping = finite_or(self.damping, 0.985).clamp(0.5, 0.999);
        self.max_speed = finite_or(self.max_speed, 0.6).clamp(0.05, 5.0);
        self.pointer_strength = finite_or(self.pointer_strength, 0.22).clamp(0.0, 1.0);
        self.pointer_radius = finite_or(self.pointer_radius, 64.0).clamp(1.0, 1000.0);
        self.link_distance = finite_or(self.link_distance, 30.0).clamp(1.0, 1000.0);
        self.node_radius = finite_or(self.node_radius, 1.4).clamp(0.1, 20.0);
        self.link_alpha = finite_or(self.link_alpha, 0.25).clamp(0.0, 1.0);
        self.node_alpha = finite_or(self.node_alpha, 0.35).clamp(0.0, 1.0);
        self.node_heat_alpha = finite_or(self.node_heat_alpha, 0.35).clamp(0.0, 1.0);
        self.heat_radius = finite_or(self.heat_radius, 44.0).clamp(1.0, 1000.0);
        self.target_fps = self.target_fps.map(|fps| fps.clamp(1, 240));
        self
    }

    /// Adjust wide-surface particle count within bounds
    pub fn adjust_particle_count(&mut self, delta: i32) {
        self.particle_count = (self.particle_count as i32 + delta).clamp(4, 400) as usize;
        self.narrow_particle_count = self.narrow_particle_count.min(self.particle_count);
    }

    /// Adjust drift within bounds
    pub fn adjust_drift(&mut self, delta: f32) {
        self.drift = (self.drift + delta).clamp(0.0, 1.0);
    }

    /// Adjust damping within bounds (kept strictly below 1)
    pub fn adjust_damping(&mut self, delta: f32) {
        self.damping = (self.damping + delta).clamp(0.5, 0.999);
    }

    /// Adjust velocity cap within bounds
    pub fn adjust_max_speed(&mut self, delta: f32) {
        self.max_speed = (self.max_speed + delta).clamp(0.05, 5.0);
    }

    /// Adjust pointer strength within bounds
    pub fn adjust_pointer_strength(&mut self, delta: f32) {
        self.pointer_strength = (self.pointer_strength + delta).clamp(0.0, 1.0);
    }

    /// Adjust link distance within bounds
    pub fn adjust_link_distance(&mut self, delta: f32) {
        self.link_distance = (self.link_distance + delta).clamp(1.0, 1000.0);
    }

    /// Step the frame cap through uncapped, 60, 45, 30, 15 fps
    pub fn cycle_target_fps(&mut self, forward: bool) {
        const STEPS: [Option<u32>; 5] = [None, Some(60), Some(45), Some(30), Some(15)];
        let idx = STEPS.iter().position(|s| *s == self.target_fps).unwrap_or(0);
        let next = if forward {
            (idx + 1) % STEPS.len()
        } else {
            (idx + STEPS.len() - 1) % STEPS.len()
        };
        self.target_fps = STEPS[next];
    }

    pub fn toggle_glow(&mut self) {
        self.glow = !self.glow;
    }

    pub fn fps_label(&self) -> String {
        match self.target_fps {
            Some(fps) => format!("{}", fps),
            None => "vsync".to_string(),
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
