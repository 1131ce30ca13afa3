use crate::color::{sample_gradient, Rgb, Rgba};
use crate::render::{DrawTarget, Glow};
use crate::simulation::Surface;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Dots dimmer than this stay unlit
const LIT_THRESHOLD: f32 = 0.02;

/// Terminal cells have no sub-cell alpha, so faint strokes are boosted
const INTENSITY_GAIN: f32 = 2.5;
const GLOW_GAIN: f32 = 3.0;

/// A single rendered Braille cell with position and colors
#[derive(Clone, Copy, Debug)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
    pub background: Option<Color>,
}

/// Dot raster backing the terminal canvas
#[derive(Debug, Default)]
pub struct DotCanvas {
    cols: u16,
    rows: u16,
    scale: f32,
    background: Rgb,
    /// Coverage per dot (0..=1)
    intensity: Vec<f32>,
    /// Colour of the strongest stroke per dot
    color: Vec<Rgb>,
    /// Glow tint per cell
    tint: Vec<Option<Rgb>>,
}

impl DotCanvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        let mut canvas = Self {
            scale: 1.0,
            ..Default::default()
        };
        canvas.resize_cells(cols, rows);
        canvas
    }

    /// Match the canvas to a new terminal area and blank it
    pub fn resize_cells(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let (w, h) = calculate_dot_size(cols, rows);
        self.intensity = vec![0.0; w * h];
        self.color = vec![Rgb::BLACK; w * h];
        self.tint = vec![None; cols as usize * rows as usize];
    }

    pub fn dot_size(&self) -> (usize, usize) {
        calculate_dot_size(self.cols, self.rows)
    }

    pub fn cell_size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn to_dots(&self, x: f32, y: f32) -> (i32, i32) {
        ((x * self.scale).floor() as i32, (y * self.scale).floor() as i32)
    }

    fn plot(&mut self, x: i32, y: i32, color: Rgba) {
        let (w, h) = self.dot_size();
        if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
            return;
        }
        let idx = y as usize * w + x as usize;
        let current = self.intensity[idx];
        if color.alpha >= current {
            self.color[idx] = color.rgb;
        }
        // Source-over coverage
        self.intensity[idx] = 1.0 - (1.0 - current) * (1.0 - color.alpha);
    }

    /// Is the dot at (x, y) bright enough to show
    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        let (w, h) = self.dot_size();
        x < w && y < h && self.intensity[y * w + x] * INTENSITY_GAIN >= LIT_THRESHOLD
    }

    /// Convert the dot raster into Braille cells (only non-empty cells)
    pub fn cells(&self) -> Vec<BrailleCell> {
        let (w, _) = self.dot_size();
        let mut cells = Vec::new();

        for cy in 0..self.rows {
            for cx in 0..self.cols {
                let mut pattern: u8 = 0;
                let mut peak: f32 = 0.0;
                let mut peak_color = Rgb::BLACK;

                let base_bx = cx as usize * 2;
                let base_by = cy as usize * 4;

                for dx in 0..2 {
                    for dy in 0..4 {
                        let (bx, by) = (base_bx + dx, base_by + dy);
                        if !self.is_lit(bx, by) {
                            continue;
                        }
                        pattern |= BRAILLE_DOTS[dx][dy];
                        let idx = by * w + bx;
                        if self.intensity[idx] > peak {
                            peak = self.intensity[idx];
                            peak_color = self.color[idx];
                        }
                    }
                }

                let tint = self.tint[cy as usize * self.cols as usize + cx as usize];
                if pattern == 0 && tint.is_none() {
                    continue;
                }

                let base = tint.unwrap_or(self.background);
                let fg = base.lerp(peak_color, (peak * INTENSITY_GAIN).min(1.0));
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' '),
                    color: fg.into(),
                    background: tint.map(Color::from),
                });
            }
        }

        cells
    }
}

impl DrawTarget for DotCanvas {
    fn clear(&mut self, surface: Surface, background: Rgb) {
        self.scale = surface.scale;
        self.background = background;
        self.intensity.fill(0.0);
        self.color.fill(Rgb::BLACK);
        self.tint.fill(None);
    }

    fn fill_glow(&mut self, glow: &Glow) {
        let radius = glow.radius.max(f32::EPSILON);
        for cy in 0..self.rows as usize {
            for cx in 0..self.cols as usize {
                // Cell centre in logical units
                let x = (cx as f32 * 2.0 + 1.0) / self.scale;
                let y = (cy as f32 * 4.0 + 2.0) / self.scale;
                let t = ((x - glow.cx).hypot(y - glow.cy) / radius).min(1.0);
                let sample = sample_gradient(&glow.stops, t);
                let strength = (sample.alpha * GLOW_GAIN).min(1.0);
                if strength * 255.0 >= 1.0 {
                    self.tint[cy * self.cols as usize + cx] =
                        Some(self.background.lerp(sample.rgb, strength));
                }
            }
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba) {
        let (mut x0, mut y0) = self.to_dots(from.0, from.1);
        let (x1, y1) = self.to_dots(to.0, to.1);

        // Bresenham
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x0, y0, color);
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
        let (cx, cy) = self.to_dots(center.0, center.1);
        // Dots are coarse; a radius under one dot still lights the centre
        let r = (radius * self.scale * 0.5).floor() as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.plot(cx + dx, cy + dy, color);
                }
            }
        }
    }
}

/// Dot raster size for a canvas of the given cell size
pub fn calculate_dot_size(canvas_cols: u16, canvas_rows: u16) -> (usize, usize) {
    // Braille gives 2x4 resolution per character
    (canvas_cols as usize * 2, canvas_rows as usize * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;

    fn surface(w: f32, h: f32) -> Surface {
        Surface { width: w, height: h, scale: 1.0 }
    }

    #[test]
    fn test_braille_pattern() {
        // Test that single dot patterns work correctly
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        // All dots should give 0xFF
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_single_node_lights_one_dot() {
        let mut canvas = DotCanvas::new(4, 2);
        canvas.clear(surface(8.0, 8.0), Rgb::BLACK);
        canvas.fill_circle((0.5, 0.5), 1.4, Rgb::new(6, 182, 212).with_alpha(0.5));

        assert!(canvas.is_lit(0, 0));
        let cells = canvas.cells();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].char, '\u{2801}');
        assert_eq!((cells[0].x, cells[0].y), (0, 0));
    }

    #[test]
    fn test_horizontal_line_spans_cells() {
        let mut canvas = DotCanvas::new(4, 1);
        canvas.clear(surface(8.0, 4.0), Rgb::BLACK);
        canvas.stroke_line((0.0, 0.0), (7.0, 0.0), Rgb::new(255, 255, 255).with_alpha(1.0));

        let cells = canvas.cells();
        assert_eq!(cells.len(), 4);
        // Top row of both columns
        assert!(cells.iter().all(|c| c.char == '\u{2809}'));
    }

    #[test]
    fn test_clear_wipes_previous_frame() {
        let mut canvas = DotCanvas::new(2, 2);
        canvas.clear(surface(4.0, 8.0), Rgb::BLACK);
        canvas.stroke_line((0.0, 0.0), (3.0, 7.0), Rgb::new(255, 0, 0).with_alpha(1.0));
        assert!(!canvas.cells().is_empty());

        canvas.clear(surface(4.0, 8.0), Rgb::BLACK);
        assert!(canvas.cells().is_empty());
    }

    #[test]
    fn test_out_of_range_strokes_are_clipped() {
        let mut canvas = DotCanvas::new(2, 1);
        canvas.clear(surface(4.0, 4.0), Rgb::BLACK);
        canvas.stroke_line((-10.0, -10.0), (50.0, 50.0), Rgb::new(255, 0, 0).with_alpha(1.0));
        canvas.fill_circle((100.0, 100.0), 3.0, Rgb::new(255, 0, 0).with_alpha(1.0));
        assert!(canvas.cells().len() <= 2);
    }

    #[test]
    fn test_glow_tints_cells_near_centre() {
        let mut canvas = DotCanvas::new(10, 5);
        let scheme = ColorScheme::Obsidian;
        canvas.clear(surface(20.0, 20.0), scheme.background());
        canvas.fill_glow(&Glow {
            cx: 10.0,
            cy: 5.0,
            radius: 15.0,
            stops: scheme.glow_stops(),
        });
        let cells = canvas.cells();
        assert!(cells.iter().any(|c| c.background.is_some()));
    }

    #[test]
    fn test_zero_size_canvas_yields_no_cells() {
        let mut canvas = DotCanvas::new(0, 0);
        canvas.clear(surface(0.0, 0.0), Rgb::BLACK);
        canvas.stroke_line((0.0, 0.0), (5.0, 5.0), Rgb::BLACK.with_alpha(1.0));
        assert!(canvas.cells().is_empty());
    }
}
