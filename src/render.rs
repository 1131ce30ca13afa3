use crate::color::{GlowStop, Rgb, Rgba};
use crate::pointer::PointerState;
use crate::settings::MeshSettings;
use crate::simulation::{Particle, ParticleField, Surface};

/// Extra radius a node gains at full heat
const HEAT_GROWTH: f32 = 0.6;

/// Radial gradient filling the whole surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub stops: [GlowStop; 3],
}

/// Anything a frame can be drawn onto.
///
/// Coordinates are logical surface units; implementations apply their own
/// raster scale.
pub trait DrawTarget {
    /// Prepare for a surface of this size and wipe the previous frame
    fn clear(&mut self, surface: Surface, background: Rgb);
    fn fill_glow(&mut self, glow: &Glow);
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba);
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba);
}

/// Counts of what one frame drew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub links: usize,
    pub nodes: usize,
}

/// Opacity of the link between two particles, `None` when too far apart
pub fn link_opacity(a: &Particle, b: &Particle, settings: &MeshSettings) -> Option<f32> {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > settings.link_distance {
        return None;
    }
    Some((1.0 - dist / settings.link_distance) * settings.link_alpha)
}

/// Point nodes brighten around: the pointer, or a resting spot near the top
pub fn focus_point(pointer: PointerState, surface: Surface) -> (f32, f32) {
    if pointer.active {
        (pointer.x, pointer.y)
    } else {
        (surface.width * 0.5, surface.height * 0.3)
    }
}

/// Heat in 0..=1, falling linearly to zero at `heat_radius`
pub fn node_heat(p: &Particle, focus: (f32, f32), settings: &MeshSettings) -> f32 {
    let dx = p.x - focus.0;
    let dy = p.y - focus.1;
    let dist = (dx * dx + dy * dy).sqrt();
    1.0 - (dist / settings.heat_radius).clamp(0.0, 1.0)
}

/// Draw one complete frame. Reads the field only.
pub fn render_frame(
    field: &ParticleField,
    pointer: PointerState,
    settings: &MeshSettings,
    target: &mut dyn DrawTarget,
) -> FrameStats {
    let surface = field.surface();
    let mut stats = FrameStats::default();
    if surface.is_empty() {
        return stats;
    }

    let scheme = settings.color_scheme;
    target.clear(surface, scheme.background());

    if settings.glow {
        target.fill_glow(&Glow {
            cx: surface.width * 0.5,
            cy: surface.height * 0.25,
            radius: surface.width.max(surface.height) * 0.75,
            stops: scheme.glow_stops(),
        });
    }

    // O(n^2) is fine for the tens of particles we draw
    let particles = field.particles();
    let link = scheme.link();
    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            if let Some(alpha) = link_opacity(a, b, settings) {
                target.stroke_line((a.x, a.y), (b.x, b.y), link.with_alpha(alpha));
                stats.links += 1;
            }
        }
    }

    let focus = focus_point(pointer, surface);
    let node = scheme.node();
    for p in particles {
        let heat = node_heat(p, focus, settings);
        let alpha = settings.node_alpha + heat * settings.node_heat_alpha;
        target.fill_circle((p.x, p.y), settings.node_radius + heat * HEAT_GROWTH, node.with_alpha(alpha));
        stats.nodes += 1;
    }

    stats
}
