use std::time::Instant;

use glam::Vec3;
use relight_core::{BackendPreference, RelightError, RenderConfig};
use relight_normals::{generate_normal_map_with, NormalOptions};
use relight_render::{Renderer, TextureSource};

use crate::scenes::{self, SceneConfig};

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub width: u32,
    pub height: u32,
    pub light_count: u32,
    pub backend: String,
    /// GPU adapter name; `None` on the CPU kernel.
    #[serde(default)]
    pub adapter: Option<String>,
    pub tick_count: u32,
    /// One-off normal reconstruction time for the scene's depth map.
    pub normals_ms: f64,
    pub timings: TimingSeries,
}

/// Drives a `Renderer` through the standard scenes, timing each `render()`.
pub struct BenchmarkRunner {
    preference: BackendPreference,
    tick_count: u32,
    config: RenderConfig,
}

impl BenchmarkRunner {
    pub fn new(preference: BackendPreference, tick_count: u32, config: RenderConfig) -> Self {
        Self {
            preference,
            tick_count,
            config,
        }
    }

    /// Run a single benchmark scene. Fails only if the renderer cannot initialize.
    pub fn run_scene(&self, scene: &SceneConfig) -> Result<BenchmarkResult, RelightError> {
        log::info!(
            "Running scene '{}' ({}x{}, {} lights)...",
            scene.name,
            scene.width,
            scene.height,
            scene.light_count
        );

        let mut renderer = Renderer::new();
        renderer.init((scene.width, scene.height), self.preference)?;
        let backend = renderer
            .backend_kind()
            .map_or_else(|| "none".to_string(), |kind| format!("{kind:?}"));
        let adapter = renderer.adapter_name().map(str::to_string);
        if let Some(name) = &adapter {
            log::info!("  Adapter: {name}");
        }

        let color = scenes::generate_color(scene.width, scene.height);
        renderer.set_image(TextureSource::Raster(&color));

        // Without a depth map the renderer falls back to flat shading.
        let mut normals_ms = 0.0;
        match scenes::generate_depth(scene.depth, &color) {
            Ok(depth) => {
                let normal_start = Instant::now();
                let options = NormalOptions::from(self.config.normals);
                let normals = generate_normal_map_with(&depth, &options);
                normals_ms = normal_start.elapsed().as_secs_f64() * 1000.0;

                renderer.set_depth(&depth);
                renderer.set_normals(&normals);
            }
            Err(e) => log::warn!("  Depth generation failed ({e}), rendering flat"),
        }

        renderer.apply_config(&self.config);
        if self.config.lights.is_empty() {
            let tints = [
                Vec3::new(1.0, 0.92, 0.8),
                Vec3::new(0.6, 0.75, 1.0),
                Vec3::new(1.0, 0.6, 0.5),
                Vec3::new(0.7, 1.0, 0.7),
            ];
            for (pos, tint) in scenes::initial_light_positions(scene.light_count)
                .into_iter()
                .zip(tints)
            {
                renderer.registry_mut().add_light(pos, tint, 1.2);
            }
        }
        let animated = renderer.registry().lights().first().map(|l| l.id);
        let light_count = renderer.registry().len() as u32;

        // Move one light per tick so every frame is a genuine recompute.
        let mut frame_times = Vec::with_capacity(self.tick_count as usize);
        for tick in 0..self.tick_count {
            if let Some(id) = animated {
                renderer
                    .registry_mut()
                    .move_light(id, scenes::orbit_position(tick, self.tick_count));
            }

            let frame_start = Instant::now();
            if renderer.render().is_none() {
                log::warn!("  Frame {tick} produced no output");
                continue;
            }
            frame_times.push(frame_start.elapsed().as_secs_f64() * 1000.0);
        }
        renderer.dispose();

        let timings = compute_timings(&frame_times);
        log::info!(
            "  Done: mean={:.2}ms, p95={:.2}ms, p99={:.2}ms, normals={:.2}ms",
            timings.mean_ms,
            timings.p95_ms,
            timings.p99_ms,
            normals_ms
        );

        Ok(BenchmarkResult {
            scene_name: scene.name.to_string(),
            width: scene.width,
            height: scene.height,
            light_count,
            backend,
            adapter,
            tick_count: self.tick_count,
            normals_ms,
            timings,
        })
    }
}

/// Compute timing statistics from a list of frame times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::DepthPattern;

    #[test]
    fn test_compute_timings() {
        let t = compute_timings(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(t.min_ms, 1.0);
        assert_eq!(t.max_ms, 4.0);
        assert_eq!(t.mean_ms, 2.5);
        assert_eq!(t.median_ms, 2.5);
        assert_eq!(t.p95_ms, 4.0);
    }

    #[test]
    fn test_compute_timings_empty() {
        let t = compute_timings(&[]);
        assert_eq!(t.mean_ms, 0.0);
        assert_eq!(t.max_ms, 0.0);
    }

    #[test]
    fn test_run_small_scene_on_cpu() {
        let runner = BenchmarkRunner::new(BackendPreference::Cpu, 3, RenderConfig::default());
        let scene = SceneConfig {
            name: "tiny",
            width: 24,
            height: 16,
            depth: DepthPattern::Step,
            light_count: 2,
        };
        let result = runner.run_scene(&scene).expect("cpu run");
        assert_eq!(result.backend, "Cpu");
        assert!(result.adapter.is_none());
        assert_eq!(result.light_count, 2);
        assert_eq!(result.tick_count, 3);
        assert!(result.timings.max_ms >= result.timings.min_ms);
    }

    #[test]
    fn test_config_lights_override_scene_rig() {
        let config = relight_core::load_config_from_str(
            "(lights: [(position: (0.5, 0.5))], settings: (shadow_strength: 0.0))",
        )
        .expect("parse");
        let runner = BenchmarkRunner::new(BackendPreference::Cpu, 1, config);
        let scene = SceneConfig {
            name: "tiny",
            width: 16,
            height: 16,
            depth: DepthPattern::Flat,
            light_count: 4,
        };
        let result = runner.run_scene(&scene).expect("cpu run");
        assert_eq!(result.light_count, 1);
    }
}
