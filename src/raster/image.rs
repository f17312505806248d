use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::Point;
use crate::raster::surface::unpremultiply_rgba8_in_place;

const XXH3_SEED: u64 = 0x6163_636f_7264_696f;

/// A rendered accordion as RGBA8 pixels.
///
/// Pixels are premultiplied alpha. `origin` is the screen-space position of the top-left pixel,
/// relative to the left edge of the folded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Screen-space position of pixel `(0, 0)`.
    pub origin: Point,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Stable 128-bit digest of a composite's dimensions and pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageFingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl CompositeImage {
    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Digest of dimensions and pixels (the origin is not included).
    pub fn fingerprint(&self) -> ImageFingerprint {
        let mut h = Xxh3::with_seed(XXH3_SEED);
        h.update(&self.width.to_le_bytes());
        h.update(&self.height.to_le_bytes());
        h.update(&[u8::from(self.premultiplied)]);
        h.update(&self.data);
        let v = h.digest128();
        ImageFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }

    /// Largest per-channel difference against an image of the same size.
    pub fn max_channel_diff(&self, other: &Self) -> Option<u8> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a.abs_diff(*b))
                .max()
                .unwrap_or(0),
        )
    }

    /// Mean absolute per-channel difference against an image of the same size.
    pub fn mean_abs_diff(&self, other: &Self) -> Option<f64> {
        if self.width != other.width || self.height != other.height || self.data.is_empty() {
            return None;
        }
        let total: u64 = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| u64::from(a.abs_diff(*b)))
            .sum();
        Some(total as f64 / self.data.len() as f64)
    }

    /// Convert to a straight-alpha `image` buffer for encoding.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
    }
}
