//! Premultiplied RGBA8 pixel operations used by the panel rasterizer.

use crate::foundation::error::{AccordionError, AccordionResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8_weight};

pub(crate) type PremulRgba8 = [u8; 4];

/// Inclusive pixel bounds that sampling is clamped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SampleRegion {
    pub(crate) x0: i32,
    pub(crate) y0: i32,
    pub(crate) x1: i32,
    pub(crate) y1: i32,
}

impl SampleRegion {
    pub(crate) fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width as i32 - 1,
            y1: height as i32 - 1,
        }
    }
}

/// Borrowed premultiplied RGBA8 image.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PixelSource<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl<'a> PixelSource<'a> {
    pub(crate) fn new(data: &'a [u8], width: u32, height: u32) -> AccordionResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if data.len() != expected || width == 0 || height == 0 {
            return Err(AccordionError::rasterization(format!(
                "content pixels hold {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    fn fetch(&self, region: SampleRegion, x: i32, y: i32) -> PremulRgba8 {
        let x = x.clamp(region.x0, region.x1);
        let y = y.clamp(region.y0, region.y1);
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Sample the pixel containing `(x, y)`.
    pub(crate) fn sample_nearest(&self, region: SampleRegion, x: f64, y: f64) -> PremulRgba8 {
        self.fetch(region, x.floor() as i32, y.floor() as i32)
    }

    /// Bilinear sample with 8-bit fractional weights; pixel centres sample exactly.
    pub(crate) fn sample_bilinear(&self, region: SampleRegion, x: f64, y: f64) -> PremulRgba8 {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = ((fx - x0) * 256.0).round() as u32;
        let ty = ((fy - y0) * 256.0).round() as u32;
        let (xi, yi) = (x0 as i32, y0 as i32);

        let p00 = self.fetch(region, xi, yi);
        let p10 = self.fetch(region, xi + 1, yi);
        let p01 = self.fetch(region, xi, yi + 1);
        let p11 = self.fetch(region, xi + 1, yi + 1);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = u32::from(p00[c]) * (256 - tx) + u32::from(p10[c]) * tx;
            let bottom = u32::from(p01[c]) * (256 - tx) + u32::from(p11[c]) * tx;
            let v = (top * (256 - ty) + bottom * ty + 32768) >> 16;
            out[c] = v.min(255) as u8;
        }
        out
    }
}

/// Darken color channels by `amount` in `[0, 1]`, keeping alpha.
pub(crate) fn shade_px(px: PremulRgba8, amount: f32) -> PremulRgba8 {
    if amount <= 0.0 {
        return px;
    }
    let keep = unit_to_u8_weight(1.0 - amount);
    [
        mul_div255_u8(u16::from(px[0]), keep),
        mul_div255_u8(u16::from(px[1]), keep),
        mul_div255_u8(u16::from(px[2]), keep),
        px[3],
    ]
}

/// Source-over for premultiplied pixels.
pub(crate) fn premul_over_px(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3] as u16;
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = add_sat_u8(src[3], mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        let dc = mul_div255_u8(u16::from(dst[c]), inv);
        out[c] = add_sat_u8(src[c], dc);
    }
    out
}

/// Composite `src` over the pixel at `(x, y)` of a tightly packed RGBA8 buffer.
pub(crate) fn over_at(dst: &mut [u8], width: u32, x: u32, y: u32, src: PremulRgba8) {
    let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
    let d = &mut dst[idx..idx + 4];
    let out = premul_over_px([d[0], d[1], d[2], d[3]], src);
    d.copy_from_slice(&out);
}

/// Fill a buffer with one color.
pub(crate) fn fill(dst: &mut [u8], px: PremulRgba8) {
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/composite.rs"]
mod tests;
