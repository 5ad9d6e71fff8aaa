//! Headless comparison of two LOD configurations on the same scene.
//!
//! Both frames are traced with identical geometry and camera, so coverage
//! must match exactly and any lambda difference comes from the footprint
//! models alone.

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};
use raylod_render::{save_debug_view, DebugView, LodConfig, LodFrame, LodStrategy, LodTracer, RenderConfig};

use crate::scenes::TestScene;
use crate::{ComparisonConfig, Result, TestError};

/// Per-pixel lambda differences between two frames.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    width: u32,
    height: u32,
    /// `candidate - baseline` where both lambdas are finite.
    differences: Vec<Option<f32>>,
    coverage_mismatches: usize,
    non_finite: usize,
}

impl ComparisonReport {
    /// Compare two frames of the same size.
    pub fn compare(baseline: &LodFrame, candidate: &LodFrame) -> Result<Self> {
        if (baseline.width(), baseline.height()) != (candidate.width(), candidate.height()) {
            return Err(TestError::Comparison(format!(
                "Frame dimensions don't match: {}x{} vs {}x{}",
                baseline.width(),
                baseline.height(),
                candidate.width(),
                candidate.height()
            )));
        }

        let mut coverage_mismatches = 0;
        let mut non_finite = 0;
        let differences = baseline
            .pixels()
            .iter()
            .zip(candidate.pixels())
            .map(|pair| match pair {
                (Some(a), Some(b)) if a.lambda.is_finite() && b.lambda.is_finite() => {
                    Some(b.lambda - a.lambda)
                }
                (Some(_), Some(_)) => {
                    non_finite += 1;
                    None
                }
                (None, None) => None,
                _ => {
                    coverage_mismatches += 1;
                    None
                }
            })
            .collect();

        Ok(Self {
            width: baseline.width(),
            height: baseline.height(),
            differences,
            coverage_mismatches,
            non_finite,
        })
    }

    /// Pixels with a finite lambda in both frames.
    pub fn compared(&self) -> usize {
        self.differences.iter().flatten().count()
    }

    /// Pixels covered in exactly one of the frames.
    pub const fn coverage_mismatches(&self) -> usize {
        self.coverage_mismatches
    }

    /// Covered pixels with a non-finite lambda in either frame.
    pub const fn non_finite(&self) -> usize {
        self.non_finite
    }

    /// `candidate - baseline` at a pixel.
    pub fn difference(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.differences[(y * self.width + x) as usize]
    }

    /// Iterator over all compared differences.
    pub fn differences(&self) -> impl Iterator<Item = f32> + '_ {
        self.differences.iter().flatten().copied()
    }

    pub fn max_abs_difference(&self) -> f32 {
        self.differences().map(f32::abs).fold(0.0, f32::max)
    }

    pub fn mean_abs_difference(&self) -> f32 {
        self.mean(f32::abs)
    }

    /// Mean signed difference; positive when the candidate picks coarser mips.
    pub fn mean_difference(&self) -> f32 {
        self.mean(|d| d)
    }

    fn mean(&self, f: impl Fn(f32) -> f32) -> f32 {
        let count = self.compared();
        if count == 0 {
            return 0.0;
        }
        self.differences().map(f).sum::<f32>() / count as f32
    }

    /// Visual diff: red above `threshold`, gray scaled by the difference
    /// below it, black where nothing was compared.
    pub fn difference_image(&self, threshold: f32) -> RgbaImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            match self.difference(x, y) {
                Some(d) if d.abs() > threshold => Rgba([255, 0, 0, 255]),
                Some(d) => {
                    let level = (d.abs() / threshold.max(f32::EPSILON) * 127.0) as u8;
                    Rgba([level, level, level, 255])
                }
                None => Rgba([0, 0, 0, 255]),
            }
        })
    }
}

/// Renders a scene with two LOD configurations and compares the results.
pub struct StrategyComparison {
    config: ComparisonConfig,
    baseline: LodConfig,
    candidate: LodConfig,
}

impl StrategyComparison {
    /// Create a comparison of `candidate` against `baseline`.
    pub const fn new(config: ComparisonConfig, baseline: LodConfig, candidate: LodConfig) -> Self {
        Self {
            config,
            baseline,
            candidate,
        }
    }

    /// Ray cones measured against ray differentials.
    pub fn cones_vs_differentials(config: ComparisonConfig) -> Self {
        Self::new(
            config,
            LodConfig::new(LodStrategy::RayDifferentials),
            LodConfig::new(LodStrategy::RayCones),
        )
    }

    /// Trace the baseline and candidate frames.
    pub fn render(&self, test_scene: &TestScene) -> Result<(LodFrame, LodFrame)> {
        let tracer = LodTracer::new(&test_scene.scene, &test_scene.camera);
        let render = RenderConfig::new(self.config.width, self.config.height);
        let baseline = tracer.render(&render.with_lod(self.baseline))?;
        let candidate = tracer.render(&render.with_lod(self.candidate))?;
        Ok((baseline, candidate))
    }

    /// Trace both frames and compare them.
    pub fn run(&self, test_scene: &TestScene) -> Result<ComparisonReport> {
        let (baseline, candidate) = self.render(test_scene)?;
        ComparisonReport::compare(&baseline, &candidate)
    }

    /// Trace, save both frames as rainbow images and fail when any pixel
    /// differs by more than the configured threshold.
    pub fn run_and_save(&self, test_scene: &TestScene) -> Result<ComparisonReport> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let output = Path::new(&self.config.output_dir);
        let name = test_scene.name;

        let (baseline, candidate) = self.render(test_scene)?;
        save_debug_view(&baseline, DebugView::Rainbow, output.join(format!("{name}_baseline.png")))?;
        save_debug_view(&candidate, DebugView::Rainbow, output.join(format!("{name}_candidate.png")))?;

        let report = ComparisonReport::compare(&baseline, &candidate)?;
        let max = report.max_abs_difference();
        if max > self.config.threshold {
            let diff_path = output.join(format!("{name}_diff.png"));
            report.difference_image(self.config.threshold).save(&diff_path)?;
            return Err(TestError::Comparison(format!(
                "Lambda difference {max:.4} exceeds threshold {:.4} (see {})",
                self.config.threshold,
                diff_path.display()
            )));
        }

        tracing::info!(
            scene = name,
            compared = report.compared(),
            mean_abs = report.mean_abs_difference(),
            max_abs = max,
            "Strategy comparison passed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::{mirror_corridor, sphere_on_plane, textured_plane};
    use approx::assert_relative_eq;
    use raylod_render::{ConeEncoding, SurfaceSpread};

    fn small() -> ComparisonConfig {
        ComparisonConfig {
            width: 65,
            height: 65,
            ..ComparisonConfig::default()
        }
    }

    #[test]
    fn cones_match_differentials_on_a_facing_plane() {
        let plane = textured_plane().unwrap();
        let report = StrategyComparison::cones_vs_differentials(small())
            .run(&plane)
            .unwrap();
        assert_eq!(report.coverage_mismatches(), 0);
        assert_eq!(report.non_finite(), 0);
        assert_eq!(report.compared(), 65 * 65);

        assert!(report.difference(32, 32).unwrap().abs() < 0.02);
        // Off-axis cones grow with distance and obliquity; differentials stay
        // uniform on a facing plane. The gap is at most -2 log2(cos) at the
        // corners.
        assert!(report.differences().all(|d| d > -0.01));
        assert!(report.max_abs_difference() < 0.45);
        assert!(report.mean_difference() > 0.0);
    }

    #[test]
    fn cones_match_differentials_through_a_flat_mirror() {
        let corridor = mirror_corridor().unwrap();
        let comparison = StrategyComparison::cones_vs_differentials(small());
        let (baseline, candidate) = comparison.render(&corridor).unwrap();

        let centre = baseline.pixel(32, 32).unwrap();
        assert_eq!(centre.bounces, 1);
        assert_eq!(candidate.pixel(32, 32).unwrap().bounces, 1);

        let report = ComparisonReport::compare(&baseline, &candidate).unwrap();
        assert_eq!(report.coverage_mismatches(), 0);
        assert!(report.difference(32, 32).unwrap().abs() < 0.02);
    }

    #[test]
    fn packed_cones_match_full_cones() {
        let corridor = mirror_corridor().unwrap();
        let report = StrategyComparison::new(
            small(),
            LodConfig::default(),
            LodConfig::default().with_cone_encoding(ConeEncoding::PackedHalf),
        )
        .run(&corridor)
        .unwrap();
        assert_eq!(report.coverage_mismatches(), 0);
        assert!(report.max_abs_difference() < 0.01);
    }

    #[test]
    fn curved_mirrors_widen_reflected_cones() {
        let sphere = sphere_on_plane().unwrap();
        let comparison = StrategyComparison::new(
            small(),
            LodConfig::default(),
            LodConfig::default().with_surface_spread(SurfaceSpread::ScreenSpace(Default::default())),
        );
        let (flat, curved) = comparison.render(&sphere).unwrap();
        assert!(flat.pixels().iter().flatten().any(|p| p.bounces == 1));

        let report = ComparisonReport::compare(&flat, &curved).unwrap();
        assert_eq!(report.coverage_mismatches(), 0);
        assert!(report.mean_difference() > 0.0);
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let plane = textured_plane().unwrap();
        let tracer = LodTracer::new(&plane.scene, &plane.camera);
        let a = tracer.render(&RenderConfig::new(8, 8)).unwrap();
        let b = tracer.render(&RenderConfig::new(8, 9)).unwrap();
        assert!(matches!(
            ComparisonReport::compare(&a, &b),
            Err(TestError::Comparison(_))
        ));
    }

    #[test]
    fn identical_frames_have_no_difference() {
        let plane = textured_plane().unwrap();
        let tracer = LodTracer::new(&plane.scene, &plane.camera);
        let frame = tracer.render(&RenderConfig::new(16, 16)).unwrap();
        let report = ComparisonReport::compare(&frame, &frame).unwrap();
        assert_eq!(report.max_abs_difference(), 0.0);
        assert_relative_eq!(report.mean_abs_difference(), 0.0);

        let image = report.difference_image(0.1);
        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(image.get_pixel(8, 8).0, [0, 0, 0, 255]);
    }

    #[test]
    fn run_and_save_writes_images() {
        let config = ComparisonConfig {
            width: 17,
            height: 17,
            output_dir: std::env::temp_dir()
                .join(format!("raylod-harness-{}", std::process::id()))
                .to_string_lossy()
                .into_owned(),
            ..ComparisonConfig::default()
        };
        let output = config.output_dir.clone();
        let plane = textured_plane().unwrap();
        StrategyComparison::cones_vs_differentials(config)
            .run_and_save(&plane)
            .unwrap();
        assert!(Path::new(&output).join("textured_plane_baseline.png").exists());
        assert!(Path::new(&output).join("textured_plane_candidate.png").exists());
        std::fs::remove_dir_all(&output).unwrap();
    }
}
