//! Cover art: decoding fetched bytes and the procedural placeholder used
//! whenever a real cover can't be had.

use image::imageops::FilterType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bitmap::Bitmap;
use crate::error::AlbumProviderError;

const BORDER: u32 = 2;

/// Decodes PNG/JPEG bytes and scales them to exactly `target_w × target_h`.
pub fn decode(bytes: &[u8], target_w: u32, target_h: u32) -> Result<Bitmap, AlbumProviderError> {
    let img = image::load_from_memory(bytes).map_err(|e| AlbumProviderError::Decode(e.to_string()))?;
    let rgba = img.resize_exact(target_w, target_h, FilterType::Triangle).to_rgba8();
    let (w, h) = rgba.dimensions();
    Bitmap::from_rgba(w, h, rgba.into_raw())
        .ok_or_else(|| AlbumProviderError::Decode("pixel buffer size mismatch".into()))
}

/// Stable 64-bit FNV-1a hash, used to seed placeholders per album.
pub fn seed_for(key: &str) -> u64 {
    key.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

/// Gradient placeholder with per-pixel jitter and a coloured border.
/// Identical seeds give identical bitmaps.
pub fn placeholder(width: u32, height: u32, seed: u64) -> Bitmap {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bmp = Bitmap::new(width, height, [0, 0, 0, 255]);
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;

    for y in 0..height {
        for x in 0..width {
            let px = x as f32 / w;
            let py = y as f32 / h;
            let r = 128.0 + 127.0 * (px + rng.gen_range(0.0..0.3));
            let g = 128.0 + 127.0 * (py + rng.gen_range(0.0..0.3));
            let b = 128.0 + 127.0 * ((px + py) / 2.0 + rng.gen_range(0.0..0.3));
            bmp.set_pixel(x, y, [channel(r), channel(g), channel(b), 255]);
        }
    }

    let border = [rng.gen_range(100..=255), rng.gen_range(100..=255), rng.gen_range(100..=255), 255];
    for y in 0..height {
        for x in 0..width {
            if x < BORDER || y < BORDER || x + BORDER >= width || y + BORDER >= height {
                bmp.set_pixel(x, y, border);
            }
        }
    }
    bmp
}

fn channel(v: f32) -> u8 {
    v.clamp(50.0, 255.0) as u8
}
