//! FEA Static Example - axial cantilever and a braced portal frame
//!
//! Usage: `fea-example [options.json]`. Set `RUST_LOG=debug` to see the
//! assembly phases.

use anyhow::{Context, Result};
use fea_static::prelude::*;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading analysis options from {}", path))?;
            AnalysisOptions::from_json(&json)?
        }
        None => AnalysisOptions::default().with_logging(),
    };
    info!("Analysis options: {:?}", options);

    cantilever(&options)?;
    portal_with_infill(&options)?;

    println!("\n=== Analysis Complete ===");
    Ok(())
}

/// Single frame element pulled along its axis
fn cantilever(options: &AnalysisOptions) -> Result<()> {
    println!("=== Axial Cantilever ===\n");

    let mut model = FEModel::new().with_node_tolerance(options.node_tolerance);
    let material = Material::new(2e11, 0.3, 7849.0474);
    let section = Section::new(4.8e-3, 1.537e-7, 3.196e-5, 5.64e-6);

    let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
    let n1 = model.add_node(Node::new(1.0, 0.0, 0.0).with_load([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
    model.add_frame(n0, n1, &material, &section)?;

    let report = model.analyze_linear(options)?;
    let d = model.node_displacement(n1)?;
    let expected = 1000.0 / (material.e * section.a / 1.0);

    println!("  Solver: {:?}, {} iterations, residual {:.3e}", report.method, report.iterations, report.residual);
    println!("  DX at tip: {:.6e} m (closed form {:.6e} m)", d.dx, expected);
    println!("  Other DOFs: {:?}", &d.as_array()[1..]);
    Ok(())
}

/// Two-column portal with a membrane infill panel
///
/// ```text
///     N3 -------- N2
///     |  \  Q0    |
///     |    \      |
///     N0 -------- N1
///    Fixed      Fixed
/// ```
fn portal_with_infill(options: &AnalysisOptions) -> Result<()> {
    println!("\n=== Portal Frame with Infill Panel ===\n");

    let mut model = FEModel::new().with_node_tolerance(options.node_tolerance);
    let steel = Material::steel();
    let concrete = Material::concrete(25e6);
    let column = Section::rectangular(0.3, 0.3);
    let beam = Section::rectangular(0.3, 0.5);

    let height = 4.0;
    let span = 6.0;

    let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
    let n1 = model.add_node(Node::new(span, 0.0, 0.0).fixed());
    let n2 = model.add_node(Node::new(span, 0.0, height));
    let n3 = model.add_node(
        Node::new(0.0, 0.0, height).with_load([10000.0, 0.0, -60000.0, 0.0, 0.0, 0.0]),
    );

    model.add_frame(n0, n3, &steel, &column)?;
    model.add_frame(n1, n2, &steel, &column)?;
    let girder = FrameElement::new(model.nodes(), n3, n2, &steel, &beam)?
        .with_name("Girder")
        .with_releases(FrameReleases::pin_both());
    model.add_frame_element(girder)?;
    model.add_quad_membrane([n0, n1, n2, n3], 0.15, &concrete)?;

    let report = model.analyze_linear(options)?;
    println!(
        "  {} nodes, {} frames, {} quads, {} DOFs ({} free)",
        model.node_count(),
        model.frame_count(),
        model.quad_count(),
        report.total_dofs,
        report.free_dofs
    );
    for hid in [n2, n3] {
        let d = model.node_displacement(hid)?;
        println!(
            "  N{}: DX={:.4}mm, DZ={:.4}mm, RY={:.6}rad",
            hid,
            d.dx * 1000.0,
            d.dz * 1000.0,
            d.ry
        );
    }
    println!("  Max translation: {:.4}mm", report.max_translation * 1000.0);
    Ok(())
}
