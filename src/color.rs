use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Opaque 8-bit colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba {
            rgb: self,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Linear interpolation towards `other` (t in 0..=1)
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// Colour with straight (non-premultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f32,
}

/// One stop of the ambient radial glow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Color scheme for the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    /// Slate links, cyan nodes on an obsidian base
    #[default]
    Obsidian,
    /// Gold links and nodes
    Gold,
    /// Warm orange on deep red
    Ember,
    Mono,
}

impl ColorScheme {
    pub fn name(&self) -> &str {
        match self {
            ColorScheme::Obsidian => "Obsidian",
            ColorScheme::Gold => "Gold",
            ColorScheme::Ember => "Ember",
            ColorScheme::Mono => "Mono",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorScheme::Obsidian => ColorScheme::Gold,
            ColorScheme::Gold => ColorScheme::Ember,
            ColorScheme::Ember => ColorScheme::Mono,
            ColorScheme::Mono => ColorScheme::Obsidian,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ColorScheme::Obsidian => ColorScheme::Mono,
            ColorScheme::Gold => ColorScheme::Obsidian,
            ColorScheme::Ember => ColorScheme::Gold,
            ColorScheme::Mono => ColorScheme::Ember,
        }
    }

    pub fn link(&self) -> Rgb {
        match self {
            ColorScheme::Obsidian => Rgb::new(148, 163, 184),
            ColorScheme::Gold => Rgb::new(252, 202, 70),
            ColorScheme::Ember => Rgb::new(251, 146, 60),
            ColorScheme::Mono => Rgb::new(200, 200, 200),
        }
    }

    pub fn node(&self) -> Rgb {
        match self {
            ColorScheme::Obsidian => Rgb::new(6, 182, 212),
            ColorScheme::Gold => Rgb::new(252, 202, 70),
            ColorScheme::Ember => Rgb::new(253, 186, 116),
            ColorScheme::Mono => Rgb::new(255, 255, 255),
        }
    }

    /// Base colour the frame is cleared to
    pub fn background(&self) -> Rgb {
        match self {
            ColorScheme::Obsidian => Rgb::new(2, 6, 23),
            ColorScheme::Gold => Rgb::new(10, 10, 10),
            ColorScheme::Ember => Rgb::new(24, 6, 6),
            ColorScheme::Mono => Rgb::new(0, 0, 0),
        }
    }

    /// Radial glow stops, inner to outer
    pub fn glow_stops(&self) -> [GlowStop; 3] {
        let (inner, mid) = match self {
            ColorScheme::Obsidian => (Rgb::new(6, 182, 212), Rgb::new(16, 185, 129)),
            ColorScheme::Gold => (Rgb::new(252, 202, 70), Rgb::new(234, 179, 8)),
            ColorScheme::Ember => (Rgb::new(249, 115, 22), Rgb::new(220, 38, 38)),
            ColorScheme::Mono => (Rgb::new(255, 255, 255), Rgb::new(160, 160, 160)),
        };
        [
            GlowStop { offset: 0.0, color: inner.with_alpha(0.06) },
            GlowStop { offset: 0.45, color: mid.with_alpha(0.04) },
            GlowStop { offset: 1.0, color: self.background().with_alpha(0.0) },
        ]
    }
}

/// Sample a gradient defined by sorted stops at position `t`.
///
/// Colour and alpha are interpolated independently.
pub fn sample_gradient(stops: &[GlowStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgb::BLACK.with_alpha(0.0);
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let local = (t - a.offset) / span;
            return Rgba {
                rgb: a.color.rgb.lerp(b.color.rgb, local),
                alpha: a.color.alpha + (b.color.alpha - a.color.alpha) * local,
            };
        }
    }
    stops[stops.len() - 1].color
}
