/// Latest known pointer position in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    /// Pointer is currently over the surface
    pub active: bool,
}

/// Records pointer movement as it arrives.
///
/// Only the most recent value is kept; the simulation reads whatever is
/// current when a frame runs.
#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moved(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.state = PointerState { x, y, active: true };
    }

    /// Pointer left the surface; the last position is kept but ignored
    pub fn left(&mut self) {
        self.state.active = false;
    }

    pub fn current(&self) -> PointerState {
        self.state
    }
}
