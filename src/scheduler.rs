use std::time::Duration;
use tracing::debug;

/// Ticket for a requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Ticket for a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host events the animator subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    PointerMove,
    PointerLeave,
    Visibility,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 4] = [
        ListenerKind::Resize,
        ListenerKind::PointerMove,
        ListenerKind::PointerLeave,
        ListenerKind::Visibility,
    ];
}

/// The environment an animator is mounted into
pub trait Host {
    /// False when no drawing context can be obtained
    fn has_drawing_surface(&self) -> bool;
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
}

/// Optional frame-rate cap.
///
/// Frames arriving before the interval has elapsed are dropped, never queued.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    min_interval: Option<Duration>,
    last: Option<Duration>,
}

impl FrameClock {
    pub fn new(target_fps: Option<u32>) -> Self {
        let mut clock = Self::default();
        clock.set_target_fps(target_fps);
        clock
    }

    pub fn set_target_fps(&mut self, target_fps: Option<u32>) {
        self.min_interval = target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64));
    }

    /// Decide whether the frame at `now` runs
    pub fn admit(&mut self, now: Duration) -> bool {
        let (Some(min), Some(last)) = (self.min_interval, self.last) else {
            self.last = Some(now);
            return true;
        };

        let elapsed = now.saturating_sub(last);
        if elapsed < min {
            return false;
        }
        // Keep the cadence, but never carry more than one interval
        let carry = Duration::from_nanos((elapsed.as_nanos() % min.as_nanos()) as u64);
        self.last = Some(now - carry);
        true
    }

    /// Forget the previous frame so the next one starts a fresh baseline
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Owns the recurring frame request and the listeners of one animator
#[derive(Debug, Default)]
pub struct FrameScheduler {
    clock: FrameClock,
    pending: Option<FrameHandle>,
    listeners: Vec<ListenerId>,
    running: bool,
    visible: bool,
}

impl FrameScheduler {
    pub fn new(target_fps: Option<u32>) -> Self {
        Self {
            clock: FrameClock::new(target_fps),
            ..Default::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn set_target_fps(&mut self, target_fps: Option<u32>) {
        self.clock.set_target_fps(target_fps);
    }

    /// Register listeners and request the first frame
    pub fn start(&mut self, host: &mut dyn Host) {
        if self.running {
            return;
        }
        self.listeners = ListenerKind::ALL
            .iter()
            .map(|kind| host.add_listener(*kind))
            .collect();
        self.running = true;
        self.visible = true;
        self.clock.reset();
        self.pending = Some(host.request_frame());
        debug!(listeners = self.listeners.len(), "frame scheduler started");
    }

    /// A requested frame fired. Returns true when the frame should run.
    pub fn on_frame(&mut self, host: &mut dyn Host, now: Duration) -> bool {
        self.pending = None;
        if !self.running || !self.visible {
            return false;
        }
        self.pending = Some(host.request_frame());
        self.clock.admit(now)
    }

    /// Pause while hidden; resume with a fresh timestamp baseline
    pub fn set_visible(&mut self, host: &mut dyn Host, visible: bool) {
        if !self.running || visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.clock.reset();
            self.pending = Some(host.request_frame());
            debug!("frame loop resumed");
        } else {
            if let Some(handle) = self.pending.take() {
                host.cancel_frame(handle);
            }
            debug!("frame loop paused while hidden");
        }
    }

    /// Cancel the pending frame and detach every listener
    pub fn stop(&mut self, host: &mut dyn Host) {
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        for id in self.listeners.drain(..) {
            host.remove_listener(id);
        }
        if self.running {
            debug!("frame scheduler stopped");
        }
        self.running = false;
    }
}

/// In-memory host: frames fire when the caller says so.
///
/// Drives headless export and doubles as the bookkeeping core of the
/// terminal host.
#[derive(Debug)]
pub struct ManualHost {
    surface_available: bool,
    next_id: u64,
    pending: Vec<FrameHandle>,
    listeners: Vec<(ListenerId, ListenerKind)>,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    pub fn new() -> Self {
        Self {
            surface_available: true,
            next_id: 1,
            pending: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Host that cannot provide a drawing context
    pub fn without_surface() -> Self {
        Self {
            surface_available: false,
            ..Self::new()
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.iter().any(|(_, k)| *k == kind)
    }

    /// Consume the oldest pending frame request, if any
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl Host for ManualHost {
    fn has_drawing_surface(&self) -> bool {
        self.surface_available
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.push((id, kind));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(l, _)| *l != id);
    }
}
