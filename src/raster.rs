use crate::color::{sample_gradient, Rgb, Rgba};
use crate::render::{DrawTarget, Glow};
use crate::simulation::Surface;
use image::{Rgba as ImageRgba, RgbaImage};

/// Off-screen RGBA pixel buffer, used for PNG and GIF export
#[derive(Debug)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    scale: f32,
    pixels: Vec<[u8; 4]>,
}

impl Default for PixelCanvas {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            scale: 1.0,
            pixels: Vec::new(),
        }
    }
}

impl PixelCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Blend `color` over the pixel at (x, y)
    fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        let dst = self.pixels[idx];
        let a = color.alpha;
        let mix = |d: u8, s: u8| (d as f32 + (s as f32 - d as f32) * a).round() as u8;
        self.pixels[idx] = [
            mix(dst[0], color.rgb.r),
            mix(dst[1], color.rgb.g),
            mix(dst[2], color.rgb.b),
            255,
        ];
    }

    pub fn to_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = ImageRgba(self.pixels[(y * self.width + x) as usize]);
        }
        img
    }

    /// Flat RGBA bytes, row-major
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}

impl DrawTarget for PixelCanvas {
    fn clear(&mut self, surface: Surface, background: Rgb) {
        let (w, h) = surface.raster_size();
        self.width = w as u32;
        self.height = h as u32;
        self.scale = surface.scale;
        self.pixels.clear();
        self.pixels
            .resize(w * h, [background.r, background.g, background.b, 255]);
    }

    fn fill_glow(&mut self, glow: &Glow) {
        let radius = glow.radius.max(f32::EPSILON);
        for y in 0..self.height {
            for x in 0..self.width {
                let lx = (x as f32 + 0.5) / self.scale;
                let ly = (y as f32 + 0.5) / self.scale;
                let t = ((lx - glow.cx).hypot(ly - glow.cy) / radius).min(1.0);
                let sample = sample_gradient(&glow.stops, t);
                if sample.alpha > 0.0 {
                    self.blend(x as i64, y as i64, sample);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba) {
        let mut x0 = (from.0 * self.scale).floor() as i64;
        let mut y0 = (from.1 * self.scale).floor() as i64;
        let x1 = (to.0 * self.scale).floor() as i64;
        let y1 = (to.1 * self.scale).floor() as i64;

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba) {
        let cx = center.0 * self.scale;
        let cy = center.1 * self.scale;
        let r = (radius * self.scale).max(0.5);
        let (min_x, max_x) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (min_y, max_y) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.blend(x, y, color);
                }
            }
        }
    }
}
