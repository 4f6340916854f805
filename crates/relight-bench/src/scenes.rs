use glam::Vec2;
use image::RgbaImage;
use relight_core::math::{hash_to_float, pixel_hash};
use relight_core::{
    DepthEstimator, DepthMap, EstimateError, EstimateStage, LuminanceDepthEstimator,
};

/// How a scene's depth map is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthPattern {
    /// Constant mid depth: no shadows, no occlusion.
    Flat,
    /// Near left half against a far right half.
    Step,
    /// Hemisphere bulging toward the camera at the center.
    Dome,
    /// Depth estimated from the color image (bright = near).
    Luminance,
}

/// Configuration for a single benchmark scene.
pub struct SceneConfig {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub depth: DepthPattern,
    pub light_count: usize,
}

/// Return the standard suite of benchmark scenes (320×240 to 1280×720, 1 to 4 lights).
pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "flat-240p",
            width: 320,
            height: 240,
            depth: DepthPattern::Flat,
            light_count: 1,
        },
        SceneConfig {
            name: "step-480p",
            width: 640,
            height: 480,
            depth: DepthPattern::Step,
            light_count: 2,
        },
        SceneConfig {
            name: "dome-480p",
            width: 640,
            height: 480,
            depth: DepthPattern::Dome,
            light_count: 4,
        },
        SceneConfig {
            name: "luma-720p",
            width: 1280,
            height: 720,
            depth: DepthPattern::Luminance,
            light_count: 4,
        },
    ]
}

/// Deterministic color image: a warm/cool gradient with hashed grain and a
/// bright disc in the middle.
pub fn generate_color(width: u32, height: u32) -> RgbaImage {
    let center = Vec2::new(width as f32, height as f32) * 0.5;
    let radius = width.min(height) as f32 * 0.3;

    RgbaImage::from_fn(width, height, |x, y| {
        let u = x as f32 / width as f32;
        let v = y as f32 / height as f32;
        let grain = hash_to_float(pixel_hash(x, y)) * 24.0;
        let disc = if Vec2::new(x as f32, y as f32).distance(center) < radius {
            60.0
        } else {
            0.0
        };
        let r = 90.0 + 110.0 * u + grain + disc;
        let g = 80.0 + 60.0 * (1.0 - v) + grain + disc;
        let b = 120.0 + 80.0 * v + grain * 0.5 + disc;
        image::Rgba([r.min(255.0) as u8, g.min(255.0) as u8, b.min(255.0) as u8, 255])
    })
}

/// Build the depth map for `pattern`. Only `Luminance` can fail.
pub fn generate_depth(pattern: DepthPattern, color: &RgbaImage) -> Result<DepthMap, EstimateError> {
    let (width, height) = color.dimensions();
    let values: Vec<f32> = match pattern {
        DepthPattern::Flat => vec![0.5; (width * height) as usize],
        DepthPattern::Step => (0..height)
            .flat_map(|_| (0..width).map(move |x| if x < width / 2 { 0.2 } else { 0.8 }))
            .collect(),
        DepthPattern::Dome => {
            let center = Vec2::new(width as f32, height as f32) * 0.5;
            let radius = width.min(height) as f32 * 0.4;
            (0..height)
                .flat_map(|y| (0..width).map(move |x| (x, y)))
                .map(|(x, y)| {
                    let r = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center) / radius;
                    let bulge = (1.0 - (r * r).min(1.0)).sqrt();
                    0.9 - 0.6 * bulge
                })
                .collect()
        }
        DepthPattern::Luminance => {
            let mut progress = |stage: EstimateStage, message: &str, percent: f32| {
                log::debug!("  depth {stage:?}: {message} ({percent:.0}%)");
            };
            let estimator = LuminanceDepthEstimator::default();
            return pollster::block_on(estimator.estimate(color, &mut progress));
        }
    };
    Ok(DepthMap::new(width, height, values)?)
}

/// Starting light positions for a scene with `count` lights, one per quadrant.
pub fn initial_light_positions(count: usize) -> Vec<Vec2> {
    [
        Vec2::new(0.3, 0.3),
        Vec2::new(0.7, 0.3),
        Vec2::new(0.7, 0.7),
        Vec2::new(0.3, 0.7),
    ]
    .into_iter()
    .take(count)
    .collect()
}

/// Orbit position of the animated light at `tick`.
pub fn orbit_position(tick: u32, tick_count: u32) -> Vec2 {
    let angle = tick as f32 / tick_count.max(1) as f32 * std::f32::consts::TAU;
    Vec2::new(0.5 + 0.35 * angle.cos(), 0.5 + 0.35 * angle.sin())
}
