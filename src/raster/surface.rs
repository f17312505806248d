use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{AccordionError, AccordionResult};

/// Read-only content the accordion samples from.
///
/// Implementations are owned by the host; the rasterizer never writes to them. Pixels are
/// premultiplied RGBA8, tightly packed, row-major.
pub trait ContentSurface: Send + Sync {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Borrow the current pixels. Fails when the content cannot be read right now.
    fn read_rgba8_premul(&self) -> AccordionResult<&[u8]>;
}

/// In-memory premultiplied RGBA8 surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSurface {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl ImageSurface {
    /// Wrap premultiplied pixels, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> AccordionResult<Self> {
        if width == 0 || height == 0 {
            return Err(AccordionError::invalid_parameter(
                "content surface must be at least 1x1",
            ));
        }
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(AccordionError::invalid_parameter(format!(
                "content surface expects {expected} bytes for {width}x{height}, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Convert a straight-alpha image into a premultiplied surface.
    pub fn from_rgba_image(img: image::RgbaImage) -> AccordionResult<Self> {
        let (width, height) = img.dimensions();
        let mut rgba = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba);
        Self::from_premul(width, height, rgba)
    }

    /// Decode encoded image bytes (PNG, JPEG, ...).
    pub fn decode(bytes: &[u8]) -> AccordionResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        Self::from_rgba_image(dyn_img.to_rgba8())
    }

    /// Decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> AccordionResult<Self> {
        let path = path.as_ref();
        let dyn_img =
            image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Self::from_rgba_image(dyn_img.to_rgba8())
    }

    /// A single-color surface.
    pub fn solid(width: u32, height: u32, color: Rgba8Premul) -> AccordionResult<Self> {
        let n = (width as usize).saturating_mul(height as usize);
        let mut data = Vec::with_capacity(n.saturating_mul(4));
        for _ in 0..n {
            data.extend_from_slice(&color.to_array());
        }
        Self::from_premul(width, height, data)
    }

    /// Build a surface by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Rgba8Premul,
    ) -> AccordionResult<Self> {
        let n = (width as usize).saturating_mul(height as usize);
        let mut data = Vec::with_capacity(n.saturating_mul(4));
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_array());
            }
        }
        Self::from_premul(width, height, data)
    }
}

impl ContentSurface for ImageSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_rgba8_premul(&self) -> AccordionResult<&[u8]> {
        Ok(self.rgba8_premul.as_slice())
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/surface.rs"]
mod tests;
