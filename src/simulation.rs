use crate::pointer::PointerState;
use crate::settings::MeshSettings;
use rand::Rng;

/// Drift is applied as `(u - 0.5) * drift * DRIFT_SCALE` per axis
const DRIFT_SCALE: f32 = 0.02;

/// Pointer force is scaled down by this before it touches velocity
const FORCE_SCALE: f32 = 0.02;

/// Device pixel ratio is clamped into this range
const MIN_PIXEL_RATIO: f32 = 1.0;
const MAX_PIXEL_RATIO: f32 = 2.0;

/// One animated node of the mesh
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// Viewport as reported by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }
}

/// Drawable area in logical units plus the raster scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale: 1.0,
        }
    }
}

impl Surface {
    pub fn from_viewport(viewport: Viewport) -> Self {
        let scale = if viewport.pixel_ratio.is_finite() {
            viewport.pixel_ratio.clamp(MIN_PIXEL_RATIO, MAX_PIXEL_RATIO)
        } else {
            MIN_PIXEL_RATIO
        };
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: sanitize(viewport.width),
            height: sanitize(viewport.height),
            scale,
        }
    }

    /// Zero-area surfaces are never seeded, stepped or drawn
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Backing raster size in device pixels
    pub fn raster_size(&self) -> (usize, usize) {
        (
            (self.width * self.scale).floor() as usize,
            (self.height * self.scale).floor() as usize,
        )
    }
}

/// What a resize did to the particle set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Surface has no area; particles left untouched
    Skipped,
    /// Fresh particle set created
    Seeded(usize),
    /// Target count changed; set rebuilt
    Reseeded(usize),
    /// Existing particles clamped into the new bounds
    Clamped,
}

/// Whether a resize must rebuild the set instead of clamping it
pub fn should_reseed(old_count: usize, new_count: usize) -> bool {
    old_count != new_count
}

/// Particle set bound to the surface it lives on
#[derive(Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    surface: Surface,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Adopt new viewport dimensions, seeding, rebuilding or clamping the set
    pub fn resize<R: Rng>(&mut self, viewport: Viewport, settings: &MeshSettings, rng: &mut R) -> ResizeOutcome {
        self.surface = Surface::from_viewport(viewport);
        if self.surface.is_empty() {
            return ResizeOutcome::Skipped;
        }

        let target = settings.particle_count_for(self.surface.width);
        if self.particles.is_empty() {
            self.seed(target, settings, rng);
            ResizeOutcome::Seeded(target)
        } else if should_reseed(self.particles.len(), target) {
            self.seed(target, settings, rng);
            ResizeOutcome::Reseeded(target)
        } else {
            self.clamp_to_surface();
            ResizeOutcome::Clamped
        }
    }

    /// Throw the current set away and seed `count` fresh particles
    pub fn seed<R: Rng>(&mut self, count: usize, settings: &MeshSettings, rng: &mut R) {
        self.particles.clear();
        if self.surface.is_empty() {
            return;
        }

        let (w, h) = (self.surface.width, self.surface.height);
        let spread = settings.initial_speed;
        self.particles.extend((0..count).map(|_| Particle {
            x: rng.gen_range(0.0..=w),
            y: rng.gen_range(0.0..=h),
            vx: (rng.gen::<f32>() - 0.5) * spread,
            vy: (rng.gen::<f32>() - 0.5) * spread,
        }));
    }

    fn clamp_to_surface(&mut self) {
        let (w, h) = (self.surface.width, self.surface.height);
        for p in &mut self.particles {
            p.x = p.x.clamp(0.0, w);
            p.y = p.y.clamp(0.0, h);
        }
    }

    /// Advance every particle by exactly one step
    pub fn step<R: Rng>(&mut self, pointer: PointerState, settings: &MeshSettings, rng: &mut R) {
        if self.surface.is_empty() {
            return;
        }

        let (w, h) = (self.surface.width, self.surface.height);
        let drift = settings.drift * DRIFT_SCALE;
        let damping = settings.damping;
        let max_speed = if settings.max_speed.is_finite() {
            settings.max_speed.abs()
        } else {
            0.0
        };
        let pointer_on = pointer.active && settings.pointer_strength > 0.0;
        let polarity = settings.pointer_mode.polarity();

        for p in &mut self.particles {
            // Organic wander
            p.vx += (rng.gen::<f32>() - 0.5) * drift;
            p.vy += (rng.gen::<f32>() - 0.5) * drift;

            if pointer_on {
                let dx = (p.x - pointer.x) * polarity;
                let dy = (p.y - pointer.y) * polarity;
                let dist = (dx * dx + dy * dy).sqrt().max(1.0);
                let falloff = 1.0 - (dist / settings.pointer_radius).clamp(0.0, 1.0);
                let force = falloff * settings.pointer_strength * FORCE_SCALE;
                p.vx += dx / dist * force;
                p.vy += dy / dist * force;
            }

            p.vx = finite_or_zero(p.vx * damping).clamp(-max_speed, max_speed);
            p.vy = finite_or_zero(p.vy * damping).clamp(-max_speed, max_speed);

            p.x += p.vx;
            p.y += p.vy;

            // Reflect, then pull back inside
            if p.x < 0.0 || p.x > w {
                p.vx = -p.vx;
            }
            if p.y < 0.0 || p.y > h {
                p.vy = -p.vy;
            }
            p.x = p.x.clamp(0.0, w);
            p.y = p.y.clamp(0.0, h);
        }
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.particles
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn still_settings() -> MeshSettings {
        MeshSettings {
            drift: 0.0,
            pointer_strength: 0.0,
            damping: 0.999,
            max_speed: 2.0,
            ..Default::default()
        }
    }

    fn field(width: f32, height: f32, settings: &MeshSettings, seed: u64) -> (ParticleField, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut field = ParticleField::new();
        field.resize(Viewport::new(width, height), settings, &mut rng);
        (field, rng)
    }

    fn assert_bounded(field: &ParticleField, max_speed: f32) {
        let s = field.surface();
        for p in field.particles() {
            assert!(p.x >= 0.0 && p.x <= s.width, "x out of bounds: {:?}", p);
            assert!(p.y >= 0.0 && p.y <= s.height, "y out of bounds: {:?}", p);
            assert!(p.vx.abs() <= max_speed && p.vy.abs() <= max_speed, "too fast: {:?}", p);
        }
    }

    #[test]
    fn test_seeding_fills_target_count_inside_bounds() {
        let settings = MeshSettings::default();
        let (field, _) = field(200.0, 100.0, &settings, 1);
        assert_eq!(field.len(), settings.particle_count);
        assert_bounded(&field, settings.initial_speed);
    }

    #[test]
    fn test_zero_size_surface_seeds_nothing() {
        let settings = MeshSettings::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut field = ParticleField::new();

        assert_eq!(field.resize(Viewport::new(0.0, 0.0), &settings, &mut rng), ResizeOutcome::Skipped);
        assert!(field.is_empty());

        field.step(PointerState::default(), &settings, &mut rng);
        assert!(field.is_empty());

        assert_eq!(
            field.resize(Viewport::new(50.0, 40.0), &settings, &mut rng),
            ResizeOutcome::Seeded(settings.particle_count)
        );
    }

    #[test]
    fn test_zero_size_resize_leaves_existing_particles() {
        let settings = MeshSettings::default();
        let (mut field, mut rng) = field(100.0, 100.0, &settings, 3);
        let before: Vec<Particle> = field.particles().to_vec();

        field.resize(Viewport::new(0.0, 80.0), &settings, &mut rng);
        field.step(PointerState::default(), &settings, &mut rng);
        assert_eq!(field.particles(), &before[..]);
    }

    #[test]
    fn test_no_divergence_over_many_steps() {
        let settings = MeshSettings::default();
        let (mut field, mut rng) = field(160.0, 90.0, &settings, 42);
        for _ in 0..10_000 {
            field.step(PointerState::default(), &settings, &mut rng);
        }
        for p in field.particles() {
            assert!(p.x.is_finite() && p.y.is_finite());
            assert!(p.vx.is_finite() && p.vy.is_finite());
        }
        assert_bounded(&field, settings.max_speed);
    }

    #[test]
    fn test_resize_smaller_clamps_into_new_bounds() {
        let settings = MeshSettings::default();
        let (mut field, mut rng) = field(300.0, 200.0, &settings, 7);

        let outcome = field.resize(Viewport::new(120.0, 50.0), &settings, &mut rng);
        assert_eq!(outcome, ResizeOutcome::Clamped);
        assert_eq!(field.len(), settings.particle_count);
        for p in field.particles() {
            assert!(p.x <= 120.0 && p.y <= 50.0);
        }
    }

    #[test]
    fn test_resize_across_breakpoint_rebuilds() {
        let settings = MeshSettings {
            particle_count: 40,
            narrow_particle_count: 12,
            narrow_breakpoint: 100.0,
            ..Default::default()
        };
        let (mut field, mut rng) = field(300.0, 200.0, &settings, 9);
        assert_eq!(field.len(), 40);

        assert_eq!(
            field.resize(Viewport::new(80.0, 200.0), &settings, &mut rng),
            ResizeOutcome::Reseeded(12)
        );
        assert_eq!(field.len(), 12);
    }

    #[test]
    fn test_should_reseed_policy() {
        assert!(!should_reseed(70, 70));
        assert!(should_reseed(70, 35));
        assert!(should_reseed(0, 35));
    }

    #[test]
    fn test_edge_bounce_inverts_velocity() {
        let settings = still_settings();
        let (mut field, mut rng) = field(100.0, 100.0, &settings, 5);
        field.particles_mut().truncate(1);
        field.particles_mut()[0] = Particle { x: 100.0, y: 50.0, vx: 1.0, vy: 0.0 };

        field.step(PointerState::default(), &settings, &mut rng);
        let p = field.particles()[0];
        assert!(p.vx < 0.0);
        assert!((p.vx + settings.damping).abs() < 1e-6);
        assert!(p.x <= 100.0);
    }

    #[test]
    fn test_velocity_cap_applies() {
        let settings = MeshSettings {
            max_speed: 0.4,
            ..still_settings()
        };
        let (mut field, mut rng) = field(100.0, 100.0, &settings, 11);
        field.particles_mut()[0] = Particle { x: 50.0, y: 50.0, vx: 9.0, vy: -9.0 };

        field.step(PointerState::default(), &settings, &mut rng);
        let p = field.particles()[0];
        assert_eq!(p.vx, 0.4);
        assert_eq!(p.vy, -0.4);
    }

    #[test]
    fn test_pointer_repels_and_attracts() {
        let mut settings = MeshSettings {
            pointer_strength: 1.0,
            pointer_radius: 50.0,
            ..still_settings()
        };
        let pointer = PointerState { x: 50.0, y: 50.0, active: true };

        let (mut field, mut rng) = field(100.0, 100.0, &settings, 13);
        field.particles_mut().truncate(1);
        field.particles_mut()[0] = Particle { x: 60.0, y: 50.0, vx: 0.0, vy: 0.0 };
        field.step(pointer, &settings, &mut rng);
        assert!(field.particles()[0].vx > 0.0, "repel pushes away");

        settings.pointer_mode = settings.pointer_mode.next();
        field.particles_mut()[0] = Particle { x: 60.0, y: 50.0, vx: 0.0, vy: 0.0 };
        field.step(pointer, &settings, &mut rng);
        assert!(field.particles()[0].vx < 0.0, "attract pulls in");
    }

    #[test]
    fn test_pointer_on_top_of_particle_is_finite() {
        let settings = MeshSettings {
            pointer_strength: 1.0,
            ..still_settings()
        };
        let (mut field, mut rng) = field(100.0, 100.0, &settings, 17);
        field.particles_mut()[0] = Particle { x: 30.0, y: 30.0, vx: 0.0, vy: 0.0 };
        field.step(PointerState { x: 30.0, y: 30.0, active: true }, &settings, &mut rng);
        let p = field.particles()[0];
        assert!(p.vx.is_finite() && p.vy.is_finite());
    }

    #[test]
    fn test_inactive_pointer_is_ignored() {
        let settings = MeshSettings {
            pointer_strength: 1.0,
            ..still_settings()
        };
        let (mut field, mut rng) = field(100.0, 100.0, &settings, 19);
        field.particles_mut()[0] = Particle { x: 60.0, y: 50.0, vx: 0.0, vy: 0.0 };
        field.step(PointerState { x: 50.0, y: 50.0, active: false }, &settings, &mut rng);
        assert_eq!(field.particles()[0].vx, 0.0);
    }

    #[test]
    fn test_pixel_ratio_clamped() {
        let s = Surface::from_viewport(Viewport::new(100.0, 50.0).with_pixel_ratio(3.0));
        assert_eq!(s.scale, 2.0);
        assert_eq!(s.raster_size(), (200, 100));
        let s = Surface::from_viewport(Viewport::new(100.0, 50.0).with_pixel_ratio(f32::NAN));
        assert_eq!(s.scale, 1.0);
        let s = Surface::from_viewport(Viewport::new(-5.0, f32::INFINITY));
        assert!(s.is_empty());
    }

    proptest! {
        #[test]
        fn prop_particles_stay_bounded(
            seed in any::<u64>(),
            width in 1.0f32..400.0,
            height in 1.0f32..400.0,
            steps in 1usize..300,
            drift in 0.0f32..1.0,
            px in -50.0f32..450.0,
            py in -50.0f32..450.0,
            attract in any::<bool>(),
        ) {
            let mut settings = MeshSettings {
                drift,
                pointer_strength: 1.0,
                particle_count: 16,
                ..Default::default()
            };
            if attract {
                settings.pointer_mode = settings.pointer_mode.next();
            }
            let (mut field, mut rng) = field(width, height, &settings, seed);
            let pointer = PointerState { x: px, y: py, active: true };
            for _ in 0..steps {
                field.step(pointer, &settings, &mut rng);
            }
            for p in field.particles() {
                prop_assert!(p.x >= 0.0 && p.x <= width);
                prop_assert!(p.y >= 0.0 && p.y <= height);
                prop_assert!(p.vx.abs() <= settings.max_speed);
                prop_assert!(p.vy.abs() <= settings.max_speed);
            }
        }

        #[test]
        fn prop_shrinking_resize_clamps(
            seed in any::<u64>(),
            w in 10.0f32..400.0,
            h in 10.0f32..400.0,
            shrink_w in 0.05f32..1.0,
            shrink_h in 0.05f32..1.0,
        ) {
            let settings = MeshSettings::default();
            let (mut field, mut rng) = field(w, h, &settings, seed);
            let (nw, nh) = (w * shrink_w, h * shrink_h);
            field.resize(Viewport::new(nw, nh), &settings, &mut rng);
            for p in field.particles() {
                prop_assert!(p.x <= nw && p.y <= nh);
            }
        }
    }
}
