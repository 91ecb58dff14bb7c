//! Software framebuffer with 32-bit ARGB pixels

use super::sprite::Sprite;

/// Caller-owned drawing surface. Any size is allowed, including zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0xFF000000; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Change the size, clearing to black.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0xFF000000);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Fill a rectangle, clipped to the surface
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for row in y0..y1 {
            let start = row as usize * self.width;
            self.pixels[start + x0 as usize..start + x1 as usize].fill(color);
        }
    }

    /// Horizontal span `[x0, x1)` on row `y`, clipped
    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, color: u32) {
        self.fill_rect(x0, y, x1.saturating_sub(x0), 1, color);
    }

    pub fn rect_outline(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    /// Bresenham line, clipped per pixel
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            self.set(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Blit an RGBA sprite with its top-left corner at (x, y), alpha blended.
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
        let sw = sprite.width() as i32;
        let sh = sprite.height() as i32;
        let pixels = sprite.pixels();

        for sy in 0..sh {
            let dy = y + sy;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..sw {
                let dx = x + sx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }

                let src_idx = (sy * sw + sx) as usize * 4;
                if src_idx + 3 >= pixels.len() {
                    continue;
                }

                let r = pixels[src_idx] as u32;
                let g = pixels[src_idx + 1] as u32;
                let b = pixels[src_idx + 2] as u32;
                let a = pixels[src_idx + 3] as u32;

                if a == 0 {
                    continue;
                }

                let dst_idx = dy as usize * self.width + dx as usize;
                if a >= 255 {
                    self.pixels[dst_idx] = 0xFF000000 | (r << 16) | (g << 8) | b;
                } else {
                    let dst = self.pixels[dst_idx];
                    let dr = (dst >> 16) & 0xFF;
                    let dg = (dst >> 8) & 0xFF;
                    let db = dst & 0xFF;
                    let inv_a = 255 - a;
                    let out_r = (r * a + dr * inv_a) / 255;
                    let out_g = (g * a + dg * inv_a) / 255;
                    let out_b = (b * a + db * inv_a) / 255;
                    self.pixels[dst_idx] = 0xFF000000 | (out_r << 16) | (out_g << 8) | out_b;
                }
            }
        }
    }
}

/// Scale `src` onto `dst` with per-axis nearest-neighbor sampling.
///
/// Both buffers are row-major. Mismatched lengths or zero sizes draw nothing.
pub fn scale_nearest(src: &[u32], src_w: usize, src_h: usize, dst: &mut [u32], dst_w: usize, dst_h: usize) {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return;
    }
    if src.len() < src_w * src_h || dst.len() < dst_w * dst_h {
        return;
    }
    for dy in 0..dst_h {
        let sy = (dy * src_h) / dst_h;
        let dst_row = dy * dst_w;
        let src_row = sy * src_w;
        for dx in 0..dst_w {
            let sx = (dx * src_w) / dst_w;
            dst[dst_row + dx] = src[src_row + sx];
        }
    }
}
