use crate::mesh::HostEvent;
use crate::scheduler::{FrameHandle, Host, ListenerId, ListenerKind, ManualHost};
use crate::simulation::Viewport;
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Refresh interval the terminal pretends to have (~60 Hz)
pub const REFRESH_INTERVAL: Duration = Duration::from_micros(16_667);

/// How long to block on input when no frame is pending
const IDLE_POLL: Duration = Duration::from_millis(250);

/// `Host` backed by a crossterm terminal.
///
/// Frame requests become a deadline one refresh away. Pointer listeners turn
/// on mouse capture and the visibility listener turns on focus reporting.
pub struct TerminalHost<W: Write> {
    registry: ManualHost,
    out: W,
    epoch: Instant,
    frame_interval: Duration,
    deadline: Option<Instant>,
    canvas: Rect,
    pixel_ratio: f32,
    pointer_inside: bool,
    mouse_capture: bool,
    focus_reporting: bool,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W, surface_available: bool) -> Self {
        Self {
            registry: if surface_available {
                ManualHost::new()
            } else {
                ManualHost::without_surface()
            },
            out,
            epoch: Instant::now(),
            frame_interval: REFRESH_INTERVAL,
            deadline: None,
            canvas: Rect::default(),
            pixel_ratio: 1.0,
            pointer_inside: false,
            mouse_capture: false,
            focus_reporting: false,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Time to block on input before the next frame is due
    pub fn poll_timeout(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => IDLE_POLL,
        }
    }

    /// Fire the pending frame if its deadline has passed, returning the
    /// frame timestamp
    pub fn due_frame(&mut self) -> Option<Duration> {
        let now = Instant::now();
        if self.deadline.is_some_and(|d| d > now) {
            return None;
        }
        self.registry.take_frame()?;
        self.deadline = None;
        Some(now.duration_since(self.epoch))
    }

    /// The canvas moved or changed size. Returns a resize event when someone
    /// is listening and the canvas actually changed.
    pub fn set_canvas(&mut self, canvas: Rect, pixel_ratio: f32) -> Option<HostEvent> {
        if canvas == self.canvas && pixel_ratio == self.pixel_ratio {
            return None;
        }
        self.canvas = canvas;
        self.pixel_ratio = pixel_ratio;
        debug!(cols = canvas.width, rows = canvas.height, "canvas resized");
        self.registry
            .is_listening(ListenerKind::Resize)
            .then(|| HostEvent::Resize(canvas_viewport(canvas, pixel_ratio)))
    }

    /// Logical position of the centre of a terminal cell, if it is on the canvas
    pub fn cell_to_logical(&self, column: u16, row: u16) -> Option<(f32, f32)> {
        let c = self.canvas;
        if column < c.x || row < c.y || column >= c.x + c.width || row >= c.y + c.height {
            return None;
        }
        let ratio = self.pixel_ratio.max(f32::EPSILON);
        let x = ((column - c.x) as f32 * 2.0 + 1.0) / ratio;
        let y = ((row - c.y) as f32 * 4.0 + 2.0) / ratio;
        Some((x, y))
    }

    /// Translate a terminal event into the host events someone listens for
    pub fn translate(&mut self, event: &Event) -> Vec<HostEvent> {
        let mut events = Vec::new();
        match event {
            Event::Mouse(mouse) => {
                if !matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                    return events;
                }
                match self.cell_to_logical(mouse.column, mouse.row) {
                    Some((x, y)) => {
                        self.pointer_inside = true;
                        if self.registry.is_listening(ListenerKind::PointerMove) {
                            events.push(HostEvent::PointerMove { x, y });
                        }
                    }
                    None => {
                        if std::mem::take(&mut self.pointer_inside)
                            && self.registry.is_listening(ListenerKind::PointerLeave)
                        {
                            events.push(HostEvent::PointerLeave);
                        }
                    }
                }
            }
            Event::FocusLost => {
                if self.registry.is_listening(ListenerKind::Visibility) {
                    events.push(HostEvent::Visibility(false));
                }
                if std::mem::take(&mut self.pointer_inside)
                    && self.registry.is_listening(ListenerKind::PointerLeave)
                {
                    events.push(HostEvent::PointerLeave);
                }
            }
            Event::FocusGained => {
                if self.registry.is_listening(ListenerKind::Visibility) {
                    events.push(HostEvent::Visibility(true));
                }
            }
            _ => {}
        }
        events
    }

    fn sync_terminal_modes(&mut self) {
        let want_mouse = self.registry.is_listening(ListenerKind::PointerMove)
            || self.registry.is_listening(ListenerKind::PointerLeave);
        if want_mouse != self.mouse_capture {
            let result = if want_mouse {
                execute!(self.out, EnableMouseCapture)
            } else {
                execute!(self.out, DisableMouseCapture)
            };
            match result {
                Ok(()) => self.mouse_capture = want_mouse,
                Err(err) => warn!(%err, "could not toggle mouse capture"),
            }
        }

        let want_focus = self.registry.is_listening(ListenerKind::Visibility);
        if want_focus != self.focus_reporting {
            let result = if want_focus {
                execute!(self.out, EnableFocusChange)
            } else {
                execute!(self.out, DisableFocusChange)
            };
            match result {
                Ok(()) => self.focus_reporting = want_focus,
                Err(err) => warn!(%err, "could not toggle focus reporting"),
            }
        }
    }
}

impl<W: Write> Host for TerminalHost<W> {
    fn has_drawing_surface(&self) -> bool {
        self.registry.has_drawing_surface()
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = self.registry.request_frame();
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.frame_interval);
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.registry.cancel_frame(handle);
        if self.registry.pending_frames() == 0 {
            self.deadline = None;
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = self.registry.add_listener(kind);
        self.sync_terminal_modes();
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.registry.remove_listener(id);
        self.sync_terminal_modes();
    }
}

/// Viewport for a canvas of terminal cells at the given pixel ratio
pub fn canvas_viewport(canvas: Rect, pixel_ratio: f32) -> Viewport {
    let ratio = pixel_ratio.max(f32::EPSILON);
    Viewport::new(
        canvas.width as f32 * 2.0 / ratio,
        canvas.height as f32 * 4.0 / ratio,
    )
    .with_pixel_ratio(pixel_ratio)
}
