//! Command line parsing.

use std::path::PathBuf;

use anyhow::{bail, Context};
use raylod_footprint::{SpreadAngleCalibration, UvFootprint};
use raylod_geometry::BarycentricMethod;
use raylod_render::{ConeEncoding, DebugView, LodConfig, LodStrategy, RenderConfig, SurfaceSpread};
use raylod_test::SceneKind;

/// Parsed snapshot options.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotArgs {
    pub scene: SceneKind,
    pub render: RenderConfig,
    pub output: PathBuf,
    pub help: bool,
}

impl Default for SnapshotArgs {
    fn default() -> Self {
        Self {
            scene: SceneKind::default(),
            render: RenderConfig::default(),
            output: PathBuf::from("lod.png"),
            help: false,
        }
    }
}

impl SnapshotArgs {
    /// Parse from the process arguments.
    pub fn from_args() -> anyhow::Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::parse_args(&args)
    }

    /// Parse from a slice of arguments; the first is the program name.
    pub fn parse_args(args: &[String]) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut lod = LodConfig::default();

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .map(String::as_str)
                    .with_context(|| format!("{arg} expects a value"))
            };
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--width" => parsed.render.width = parse_number(arg, value()?)?,
                "--height" => parsed.render.height = parse_number(arg, value()?)?,
                "--strategy" => {
                    lod.strategy = match value()? {
                        "cone" | "cones" => LodStrategy::RayCones,
                        "diff" | "differentials" => LodStrategy::RayDifferentials,
                        other => bail!("unknown strategy {other:?}, expected cone or diff"),
                    };
                }
                "--packed" => lod.cone_encoding = ConeEncoding::PackedHalf,
                "--ray-direction-barys" => lod.barycentric_method = BarycentricMethod::RayDirection,
                "--pbrt" => lod.uv_footprint = UvFootprint::PbrtMaxAxis,
                "--screen-space" => {
                    lod.surface_spread = SurfaceSpread::ScreenSpace(SpreadAngleCalibration::default());
                }
                "--bounces" => lod.max_bounces = parse_number(arg, value()?)?,
                "--scene" => parsed.scene = value()?.parse()?,
                "--view" => {
                    parsed.render.view = match value()? {
                        "rainbow" => DebugView::Rainbow,
                        "grayscale" => DebugView::Grayscale,
                        "normals" => DebugView::Normals,
                        other => bail!("unknown view {other:?}"),
                    };
                }
                "-o" | "--output" => parsed.output = PathBuf::from(value()?),
                other => bail!("unknown argument {other:?}, see --help"),
            }
        }

        parsed.render.lod = lod;
        Ok(parsed)
    }
}

fn parse_number(flag: &str, value: &str) -> anyhow::Result<u32> {
    value
        .parse()
        .with_context(|| format!("{flag} expects a non-negative integer, got {value:?}"))
}
