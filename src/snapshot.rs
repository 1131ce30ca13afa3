use crate::error::{MeshError, Result};
use crate::mesh::{HostEvent, MeshAnimator, MountOptions};
use crate::raster::PixelCanvas;
use crate::scheduler::ManualHost;
use crate::settings::MeshSettings;
use crate::simulation::{Surface, Viewport};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Simulated display refresh for headless runs
const REFRESH_HZ: u64 = 60;

/// Headless render parameters
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Logical width
    pub width: f32,
    /// Logical height
    pub height: f32,
    pub pixel_ratio: f32,
    /// Display refreshes to simulate
    pub frames: usize,
    /// Capture every Nth rendered frame into a GIF
    pub gif_stride: usize,
    /// Move a synthetic pointer across the surface
    pub sweep_pointer: bool,
    pub reduced_motion: bool,
    pub seed: Option<u64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 270.0,
            pixel_ratio: 2.0,
            frames: 240,
            gif_stride: 3,
            sweep_pointer: false,
            reduced_motion: false,
            seed: None,
        }
    }
}

impl ExportOptions {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height).with_pixel_ratio(self.pixel_ratio)
    }

    /// Pointer position at refresh `i` on a slow Lissajous path
    fn pointer_at(&self, i: usize) -> (f32, f32) {
        let t = i as f32 / REFRESH_HZ as f32;
        (
            self.width * (0.5 + 0.4 * (t * 0.9).sin()),
            self.height * (0.5 + 0.4 * (t * 1.3).cos()),
        )
    }
}

/// Raster size for the export, rejecting empty or oversized surfaces
fn raster_dims(options: &ExportOptions) -> Result<(u16, u16)> {
    let (w, h) = Surface::from_viewport(options.viewport()).raster_size();
    match (u16::try_from(w), u16::try_from(h)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(MeshError::NoSurface),
    }
}

/// Run the animator off-screen, handing every rendered frame to `on_frame`.
/// Returns the number of frames rendered.
pub fn render_frames<F>(settings: MeshSettings, options: &ExportOptions, mut on_frame: F) -> Result<u64>
where
    F: FnMut(&PixelCanvas) -> Result<()>,
{
    let viewport = options.viewport();
    raster_dims(options)?;

    let mut host = ManualHost::new();
    let mount_options = MountOptions {
        reduced_motion: options.reduced_motion,
        seed: options.seed,
    };
    let mut animator =
        MeshAnimator::mount(&mut host, viewport, settings, mount_options).ok_or(MeshError::NoSurface)?;
    let mut canvas = PixelCanvas::new();
    let mut result = Ok(());

    for i in 0..options.frames {
        if options.sweep_pointer {
            let (x, y) = options.pointer_at(i);
            animator.handle(&mut host, HostEvent::PointerMove { x, y }, &mut canvas);
        }
        if host.take_frame().is_none() {
            break;
        }
        let now = Duration::from_micros(i as u64 * 1_000_000 / REFRESH_HZ);
        if animator.handle(&mut host, HostEvent::Frame(now), &mut canvas).is_some() {
            result = on_frame(&canvas);
            if result.is_err() {
                break;
            }
        }
    }

    let rendered = animator.frames_rendered();
    animator.unmount(&mut host);
    result.map(|_| rendered)
}

/// Render `options.frames` refreshes and write the final frame as a PNG
pub fn export_png(settings: MeshSettings, options: &ExportOptions, path: &Path) -> Result<()> {
    let mut last = None;
    render_frames(settings, options, |canvas| {
        last = Some(canvas.to_image());
        Ok(())
    })?;

    let image = last.ok_or(MeshError::NoSurface)?;
    image.save(path)?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "png exported");
    Ok(())
}

/// Render `options.frames` refreshes into a looping animated GIF
pub fn export_gif(settings: MeshSettings, options: &ExportOptions, path: &Path) -> Result<()> {
    let (w, h) = raster_dims(options)?;
    let file = File::create(path).map_err(|source| MeshError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    let mut encoder = gif::Encoder::new(file, w, h, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    let stride = options.gif_stride.max(1);
    let delay = (stride as u64 * 100 / REFRESH_HZ).max(2) as u16;
    let mut index = 0usize;
    let mut written = 0usize;

    render_frames(settings, options, |canvas| {
        index += 1;
        if (index - 1) % stride != 0 {
            return Ok(());
        }
        let mut bytes = canvas.as_bytes();
        let mut frame = gif::Frame::from_rgba_speed(w, h, &mut bytes, 10);
        frame.delay = delay;
        encoder.write_frame(&frame)?;
        written += 1;
        Ok(())
    })?;

    info!(path = %path.display(), frames = written, "gif exported");
    Ok(())
}
