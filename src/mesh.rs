use crate::pointer::{PointerState, PointerTracker};
use crate::render::{render_frame, DrawTarget, FrameStats};
use crate::scheduler::{FrameScheduler, Host};
use crate::settings::MeshSettings;
use crate::simulation::{should_reseed, ParticleField, ResizeOutcome, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the host can tell a mounted animator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resize(Viewport),
    PointerMove { x: f32, y: f32 },
    PointerLeave,
    Visibility(bool),
    /// A requested frame fired; timestamp since an arbitrary epoch
    Frame(Duration),
}

/// Mount-time choices that are not part of the tuning
#[derive(Debug, Clone, Copy, Default)]
pub struct MountOptions {
    /// Honour a reduced-motion preference
    pub reduced_motion: bool,
    /// Fixed RNG seed (None = entropy)
    pub seed: Option<u64>,
}

/// A mounted particle-mesh background
pub struct MeshAnimator {
    field: ParticleField,
    pointer: PointerTracker,
    /// Settings as configured
    base_settings: MeshSettings,
    /// Settings in effect (reduced motion applied)
    settings: MeshSettings,
    reduced_motion: bool,
    scheduler: FrameScheduler,
    rng: StdRng,
    paused: bool,
    frames_rendered: u64,
    frames_dropped: u64,
    last_stats: FrameStats,
}

impl MeshAnimator {
    /// Attach to `host`. Returns `None`, having scheduled nothing, when the
    /// host has no drawing surface.
    pub fn mount(
        host: &mut dyn Host,
        viewport: Viewport,
        settings: MeshSettings,
        options: MountOptions,
    ) -> Option<Self> {
        if !host.has_drawing_surface() {
            warn!("no drawing surface available, mesh background disabled");
            return None;
        }

        let base_settings = settings.sanitized();
        let settings = effective_settings(&base_settings, options.reduced_motion);
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut animator = Self {
            field: ParticleField::new(),
            pointer: PointerTracker::new(),
            scheduler: FrameScheduler::new(settings.target_fps),
            base_settings,
            settings,
            reduced_motion: options.reduced_motion,
            rng,
            paused: false,
            frames_rendered: 0,
            frames_dropped: 0,
            last_stats: FrameStats::default(),
        };
        animator.resize(viewport);
        animator.scheduler.start(host);

        info!(
            width = viewport.width,
            height = viewport.height,
            particles = animator.field.len(),
            reduced_motion = options.reduced_motion,
            "mesh background mounted"
        );
        Some(animator)
    }

    /// Route one host event. Returns frame stats when a frame was drawn.
    pub fn handle(
        &mut self,
        host: &mut dyn Host,
        event: HostEvent,
        target: &mut dyn DrawTarget,
    ) -> Option<FrameStats> {
        match event {
            HostEvent::Resize(viewport) => {
                self.resize(viewport);
                None
            }
            HostEvent::PointerMove { x, y } => {
                self.pointer.moved(x, y);
                None
            }
            HostEvent::PointerLeave => {
                self.pointer.left();
                None
            }
            HostEvent::Visibility(visible) => {
                self.scheduler.set_visible(host, visible);
                None
            }
            HostEvent::Frame(now) => self.frame(host, now, target),
        }
    }

    fn frame(&mut self, host: &mut dyn Host, now: Duration, target: &mut dyn DrawTarget) -> Option<FrameStats> {
        if !self.scheduler.on_frame(host, now) {
            if self.scheduler.is_running() && self.scheduler.is_visible() {
                self.frames_dropped += 1;
            }
            return None;
        }

        let pointer = self.pointer.current();
        if !self.paused {
            self.field.step(pointer, &self.settings, &mut self.rng);
        }
        let stats = render_frame(&self.field, pointer, &self.settings, target);
        self.frames_rendered += 1;
        self.last_stats = stats;
        Some(stats)
    }

    fn resize(&mut self, viewport: Viewport) {
        match self.field.resize(viewport, &self.settings, &mut self.rng) {
            ResizeOutcome::Skipped => debug!(
                width = viewport.width,
                height = viewport.height,
                "zero-area viewport, seeding deferred"
            ),
            ResizeOutcome::Seeded(n) => debug!(particles = n, "particles seeded"),
            ResizeOutcome::Reseeded(n) => debug!(particles = n, "particle count changed, reseeded"),
            ResizeOutcome::Clamped => debug!("particles clamped to new bounds"),
        }
    }

    /// Detach from the host. Nothing scheduled or registered survives.
    pub fn unmount(mut self, host: &mut dyn Host) {
        self.scheduler.stop(host);
        info!(frames = self.frames_rendered, "mesh background unmounted");
    }

    /// Seed a fresh particle set for the current surface
    pub fn reset(&mut self) {
        let count = self.settings.particle_count_for(self.field.surface().width);
        self.field.seed(count, &self.settings, &mut self.rng);
    }

    /// Swap tuning at runtime; rebuilds the set only when the count changes
    pub fn apply_settings(&mut self, settings: MeshSettings) {
        self.base_settings = settings.sanitized();
        self.refresh_effective_settings();
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.reduced_motion = reduced_motion;
        self.refresh_effective_settings();
    }

    fn refresh_effective_settings(&mut self) {
        self.settings = effective_settings(&self.base_settings, self.reduced_motion);
        self.scheduler.set_target_fps(self.settings.target_fps);

        let surface = self.field.surface();
        if surface.is_empty() {
            return;
        }
        let target = self.settings.particle_count_for(surface.width);
        if should_reseed(self.field.len(), target) {
            self.field.seed(target, &self.settings, &mut self.rng);
            debug!(particles = target, "settings changed particle count, reseeded");
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Configured settings (before reduced motion)
    pub fn base_settings(&self) -> &MeshSettings {
        &self.base_settings
    }

    /// Settings currently driving the simulation
    pub fn settings(&self) -> &MeshSettings {
        &self.settings
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer.current()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

fn effective_settings(base: &MeshSettings, reduced_motion: bool) -> MeshSettings {
    if reduced_motion {
        base.reduced_motion()
    } else {
        base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::RecordingTarget;
    use crate::scheduler::ManualHost;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn mount(host: &mut ManualHost, viewport: Viewport, settings: MeshSettings) -> MeshAnimator {
        MeshAnimator::mount(
            host,
            viewport,
            settings,
            MountOptions {
                seed: Some(7),
                ..Default::default()
            },
        )
        .expect("host has a surface")
    }

    /// Fire the pending frame the way a host would
    fn tick(animator: &mut MeshAnimator, host: &mut ManualHost, now: Duration, target: &mut RecordingTarget) -> Option<FrameStats> {
        host.take_frame()?;
        animator.handle(host, HostEvent::Frame(now), target)
    }

    #[test]
    fn test_mount_then_unmount_leaves_nothing_pending() {
        let mut host = ManualHost::new();
        let animator = mount(&mut host, Viewport::new(200.0, 100.0), MeshSettings::default());
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.listener_count(), 4);

        animator.unmount(&mut host);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_unmount_after_running_frames() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let mut animator = mount(&mut host, Viewport::new(200.0, 100.0), MeshSettings::default());
        for i in 0..10 {
            assert!(tick(&mut animator, &mut host, ms(i * 16), &mut target).is_some());
        }
        animator.unmount(&mut host);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_no_surface_means_no_op() {
        let mut host = ManualHost::without_surface();
        let animator = MeshAnimator::mount(
            &mut host,
            Viewport::new(200.0, 100.0),
            MeshSettings::default(),
            MountOptions::default(),
        );
        assert!(animator.is_none());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_zero_size_mount_draws_nothing() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let mut animator = mount(&mut host, Viewport::new(0.0, 0.0), MeshSettings::default());
        assert!(animator.field().is_empty());

        let stats = tick(&mut animator, &mut host, ms(0), &mut target).unwrap();
        assert_eq!(stats, FrameStats::default());
        assert_eq!(target.calls(), 0);

        // A real size later seeds the set
        animator.handle(&mut host, HostEvent::Resize(Viewport::new(80.0, 60.0)), &mut target);
        assert_eq!(animator.field().len(), MeshSettings::default().particle_count);
    }

    #[test]
    fn test_frame_steps_and_renders() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let mut animator = mount(&mut host, Viewport::new(150.0, 90.0), MeshSettings::default());
        let before = animator.field().particles().to_vec();

        let stats = tick(&mut animator, &mut host, ms(0), &mut target).unwrap();
        assert_eq!(stats.nodes, animator.field().len());
        assert_ne!(animator.field().particles(), &before[..]);
        assert_eq!(animator.frames_rendered(), 1);
        assert_eq!(animator.last_stats(), stats);
    }

    #[test]
    fn test_paused_renders_without_moving() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let mut animator = mount(&mut host, Viewport::new(150.0, 90.0), MeshSettings::default());
        animator.set_paused(true);
        let before = animator.field().particles().to_vec();

        assert!(tick(&mut animator, &mut host, ms(0), &mut target).is_some());
        assert_eq!(animator.field().particles(), &before[..]);
        assert_eq!(target.clears, 1);
    }

    #[test]
    fn test_throttled_frames_are_dropped() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let settings = MeshSettings {
            target_fps: Some(30),
            ..Default::default()
        };
        let mut animator = mount(&mut host, Viewport::new(100.0, 100.0), settings);

        assert!(tick(&mut animator, &mut host, ms(0), &mut target).is_some());
        assert!(tick(&mut animator, &mut host, ms(16), &mut target).is_none());
        assert!(tick(&mut animator, &mut host, ms(34), &mut target).is_some());
        assert_eq!(animator.frames_dropped(), 1);
        // Dropped frames still keep the loop alive
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn test_hidden_page_stops_the_loop() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let mut animator = mount(&mut host, Viewport::new(100.0, 100.0), MeshSettings::default());

        animator.handle(&mut host, HostEvent::Visibility(false), &mut target);
        assert_eq!(host.pending_frames(), 0);
        assert!(tick(&mut animator, &mut host, ms(16), &mut target).is_none());

        animator.handle(&mut host, HostEvent::Visibility(true), &mut target);
        assert_eq!(host.pending_frames(), 1);
        assert!(tick(&mut animator, &mut host, ms(5000), &mut target).is_some());
    }

    #[test]
    fn test_pointer_events_reach_tracker() {
        let mut host = ManualHost::new();
        let mut target = RecordingTarget::default();
        let mut animator = mount(&mut host, Viewport::new(100.0, 100.0), MeshSettings::default());

        animator.handle(&mut host, HostEvent::PointerMove { x: 12.0, y: 34.0 }, &mut target);
        assert_eq!(animator.pointer(), PointerState { x: 12.0, y: 34.0, active: true });
        animator.handle(&mut host, HostEvent::PointerLeave, &mut target);
        assert!(!animator.pointer().active);
    }

    #[test]
    fn test_reduced_motion_halves_count_and_ignores_pointer() {
        let mut host = ManualHost::new();
        let animator = MeshAnimator::mount(
            &mut host,
            Viewport::new(200.0, 100.0),
            MeshSettings::default(),
            MountOptions {
                reduced_motion: true,
                seed: Some(1),
            },
        )
        .unwrap();
        assert_eq!(animator.field().len(), 35);
        assert_eq!(animator.settings().pointer_strength, 0.0);
        assert_eq!(animator.base_settings().particle_count, 70);
    }

    #[test]
    fn test_apply_settings_reseeds_only_on_count_change() {
        let mut host = ManualHost::new();
        let mut animator = mount(&mut host, Viewport::new(200.0, 100.0), MeshSettings::default());
        let before = animator.field().particles().to_vec();

        let mut settings = animator.base_settings().clone();
        settings.adjust_drift(0.1);
        animator.apply_settings(settings.clone());
        assert_eq!(animator.field().particles(), &before[..]);

        settings.adjust_particle_count(-20);
        animator.apply_settings(settings);
        assert_eq!(animator.field().len(), 50);
    }

    #[test]
    fn test_reset_reseeds_same_count() {
        let mut host = ManualHost::new();
        let mut animator = mount(&mut host, Viewport::new(200.0, 100.0), MeshSettings::default());
        let before = animator.field().particles().to_vec();
        animator.reset();
        assert_eq!(animator.field().len(), before.len());
        assert_ne!(animator.field().particles(), &before[..]);
    }
}
