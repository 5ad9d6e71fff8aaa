//! raylod snapshot tool
//!
//! Traces one of the canonical scenes on the CPU and writes a debug image of
//! the per-pixel texture LOD.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p raylod-snapshot -- [OPTIONS]
//! ```
//!
//! ## Examples
//!
//! ```bash
//! # Ray cones on the textured plane
//! cargo run -p raylod-snapshot
//!
//! # Ray differentials through the mirror corridor
//! cargo run -p raylod-snapshot -- --scene mirror --strategy diff -o mirror_diff.png
//!
//! # Packed cones with screen-space curvature on the mirrored sphere
//! cargo run -p raylod-snapshot -- --scene sphere --packed --screen-space
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod args;

use raylod_render::{save_debug_view, LodTracer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::SnapshotArgs;

fn main() -> anyhow::Result<()> {
    let args = SnapshotArgs::from_args()?;
    if args.help {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let test_scene = args.scene.build()?;
    info!(
        scene = test_scene.name,
        triangles = test_scene.scene.triangle_count(),
        width = args.render.width,
        height = args.render.height,
        lod = ?args.render.lod,
        "Rendering snapshot"
    );

    let frame = LodTracer::new(&test_scene.scene, &test_scene.camera).render(&args.render)?;
    let stats = frame.stats();
    info!(
        covered = stats.covered,
        non_finite = stats.non_finite,
        min = stats.min,
        max = stats.max,
        mean = stats.mean,
        "Lambda statistics"
    );

    save_debug_view(&frame, args.render.view, &args.output)?;
    Ok(())
}

fn print_help() {
    eprintln!(
        "raylod snapshot: texture LOD debug images

USAGE:
    cargo run -p raylod-snapshot -- [OPTIONS]

FRAME OPTIONS:
    --width <N>             Image width (default: 640)
    --height <N>            Image height (default: 360)
    --scene <NAME>          plane, mirror or sphere (default: plane)
    --view <VIEW>           rainbow, grayscale or normals (default: rainbow)
    -o, --output <PATH>     Output image path (default: lod.png)

LOD OPTIONS:
    --strategy <NAME>       cone or diff (default: cone)
    --packed                Store ray cones as two half floats
    --screen-space          Estimate cone surface spread from G-buffer derivatives
    --ray-direction-barys   Barycentric differentials from the ray direction
                            instead of edge planes
    --pbrt                  Per-axis UV footprint instead of max squared length
    --bounces <N>           Mirror reflections to follow (default: 2)

OTHER:
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
