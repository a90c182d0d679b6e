pub const VOID_COLOR: [u8; 4] = [0, 0, 0, 255];

/// CPU-side RGBA8 destination bitmap, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.rgba.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    pub fn write_pixel_rgba_clipped(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let Some(pixel_offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
        else {
            return;
        };
        let byte_offset = pixel_offset * 4;
        if let Some(target) = self.rgba.get_mut(byte_offset..byte_offset + 4) {
            target.copy_from_slice(&color);
        }
    }

    /// Fills a `size`x`size` square whose top-left corner is `(left, top)`.
    pub fn draw_square(&mut self, left: i32, top: i32, size: i32, color: [u8; 4]) {
        let x_range = left.max(0)..(left + size).min(self.width as i32);
        for y in top.max(0)..(top + size).min(self.height as i32) {
            for x in x_range.clone() {
                self.write_pixel_rgba_clipped(x, y, color);
            }
        }
    }
}
