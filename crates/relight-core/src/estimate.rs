//! Boundary to the monocular depth-estimation collaborator.
//!
//! The engine only consumes the resulting `DepthMap`. Estimation may take
//! seconds and must complete before normal reconstruction starts.

use image::RgbaImage;

use crate::error::EstimateError;
use crate::types::DepthMap;

/// Coarse phase of a depth estimation run, reported through `ProgressSink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateStage {
    LoadingModel,
    Preprocessing,
    Inference,
    Postprocessing,
    Done,
}

/// Receives `(stage, message, percent)` progress updates. Percent is 0–100.
pub trait ProgressSink {
    fn report(&mut self, stage: EstimateStage, message: &str, percent: f32);
}

impl<F: FnMut(EstimateStage, &str, f32)> ProgressSink for F {
    fn report(&mut self, stage: EstimateStage, message: &str, percent: f32) {
        self(stage, message, percent)
    }
}

/// Opaque image → depth function. Cancellation is the implementor's concern.
#[allow(async_fn_in_trait)]
pub trait DepthEstimator {
    async fn estimate(
        &self,
        image: &RgbaImage,
        progress: &mut dyn ProgressSink,
    ) -> Result<DepthMap, EstimateError>;
}

/// Stand-in estimator that treats brighter pixels as nearer.
///
/// Rec. 709 luma, mapped so that white is depth 0.0 (near) and black is 1.0 (far).
/// Useful for demos and tests where no model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuminanceDepthEstimator {
    /// Treat darker pixels as nearer instead.
    pub invert: bool,
}

impl DepthEstimator for LuminanceDepthEstimator {
    async fn estimate(
        &self,
        image: &RgbaImage,
        progress: &mut dyn ProgressSink,
    ) -> Result<DepthMap, EstimateError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EstimateError::EmptyImage);
        }
        progress.report(EstimateStage::Preprocessing, "computing luminance", 0.0);

        let values = image
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                let luma = (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0;
                if self.invert {
                    luma
                } else {
                    1.0 - luma
                }
            })
            .collect();

        progress.report(EstimateStage::Postprocessing, "building depth map", 90.0);
        let depth = DepthMap::new(image.width(), image.height(), values)?;
        progress.report(EstimateStage::Done, "depth ready", 100.0);
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_luminance_bright_is_near() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));

        let mut stages = Vec::new();
        let mut sink = |stage: EstimateStage, _msg: &str, pct: f32| stages.push((stage, pct));
        let depth = pollster::block_on(LuminanceDepthEstimator::default().estimate(&img, &mut sink))
            .expect("estimate");

        assert!(depth.values()[0] < 1e-4);
        assert_eq!(depth.values()[1], 1.0);
        assert_eq!(stages.last(), Some(&(EstimateStage::Done, 100.0)));
    }

    #[test]
    fn test_luminance_empty_image() {
        let img = RgbaImage::new(0, 0);
        let mut sink = |_: EstimateStage, _: &str, _: f32| {};
        let result = pollster::block_on(LuminanceDepthEstimator::default().estimate(&img, &mut sink));
        assert!(matches!(result, Err(EstimateError::EmptyImage)));
    }
}
