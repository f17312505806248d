use std::path::Path;

use anyhow::Context;

use crate::cache::composite_cache::CachePolicy;
use crate::fold::geometry::DEFAULT_MIN_FOLD_RATIO;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{AccordionError, AccordionResult};
use crate::raster::rasterize::{CanvasMode, RasterOpts, SampleFilter};

/// Controller configuration.
///
/// Every field has a default, so a JSON document only needs the keys it changes:
///
/// ```json
/// { "cache_policy": "lazy", "shading": 0.35 }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccordionOpts {
    /// Whether stale composites render before a read returns or in the background.
    pub cache_policy: CachePolicy,
    /// Floor for the folded/natural width ratio, in `(0, 1]`.
    pub min_fold_ratio: f64,
    /// Source sampling filter.
    pub filter: SampleFilter,
    /// Darkening of backward-facing panels at a right-angle fold, in `[0, 1]`.
    pub shading: f32,
    /// Canvas sizing.
    pub canvas_mode: CanvasMode,
    /// Straight-alpha RGBA background.
    pub clear_rgba: [u8; 4],
}

impl Default for AccordionOpts {
    fn default() -> Self {
        let raster = RasterOpts::default();
        Self {
            cache_policy: CachePolicy::default(),
            min_fold_ratio: DEFAULT_MIN_FOLD_RATIO,
            filter: raster.filter,
            shading: raster.shading,
            canvas_mode: raster.canvas_mode,
            clear_rgba: [0, 0, 0, 0],
        }
    }
}

impl AccordionOpts {
    /// Parse and validate options from JSON.
    pub fn from_json_str(s: &str) -> AccordionResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| AccordionError::serde(format!("accordion opts: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Read, parse and validate options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> AccordionResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read accordion opts from {}", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> AccordionResult<()> {
        let r = self.min_fold_ratio;
        if r.is_nan() || r <= 0.0 || r > 1.0 {
            return Err(AccordionError::invalid_parameter(format!(
                "min_fold_ratio must be in (0, 1], got {r}"
            )));
        }
        self.raster_opts().validate()
    }

    /// Rasterizer settings derived from these options.
    pub fn raster_opts(&self) -> RasterOpts {
        let [r, g, b, a] = self.clear_rgba;
        RasterOpts {
            filter: self.filter,
            shading: self.shading,
            canvas_mode: self.canvas_mode,
            clear: Rgba8Premul::from_straight_rgba(r, g, b, a),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/controller/opts.rs"]
mod tests;
