/// Owned RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Self {
        let rgba = fill.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Self { width, height, rgba }
    }

    /// Wraps a raw buffer; `None` if its length doesn't match the dimensions.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self { width, height, rgba })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn rgba(&self) -> &[u8] { &self.rgba }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        self.rgba[i..i + 4].copy_from_slice(&px);
    }

    /// Copies a `w × h` region starting at `(x, y)` into a new bitmap.
    /// The region is clipped to this bitmap's bounds.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Bitmap {
        let w = w.min(self.width.saturating_sub(x));
        let h = h.min(self.height.saturating_sub(y));
        let mut rgba = Vec::with_capacity(w as usize * h as usize * 4);
        for row in y..y + h {
            let start = self.index(x, row);
            rgba.extend_from_slice(&self.rgba[start..start + w as usize * 4]);
        }
        Bitmap { width: w, height: h, rgba }
    }

    /// Copies `src` into this bitmap with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, src: &Bitmap, x: u32, y: u32) {
        let w = src.width.min(self.width.saturating_sub(x));
        let h = src.height.min(self.height.saturating_sub(y));
        for row in 0..h {
            let from = src.index(0, row);
            let to = self.index(x, y + row);
            self.rgba[to..to + w as usize * 4].copy_from_slice(&src.rgba[from..from + w as usize * 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_length() {
        assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Bitmap::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn crop_clips_at_the_edge() {
        let mut bmp = Bitmap::new(5, 3, [0, 0, 0, 255]);
        bmp.set_pixel(4, 2, [9, 8, 7, 255]);
        let piece = bmp.crop(3, 1, 4, 4);
        assert_eq!((piece.width(), piece.height()), (2, 2));
        assert_eq!(piece.pixel(1, 1), Some([9, 8, 7, 255]));
        assert_eq!(piece.pixel(2, 0), None);
    }
}
