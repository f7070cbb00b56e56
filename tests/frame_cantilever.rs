use approx::assert_relative_eq;
use fea_static::prelude::*;

const E: f64 = 2e11;
const A: f64 = 4.8e-3;
const I2: f64 = 1.537e-7;
const I3: f64 = 3.196e-5;

fn material() -> Material {
    Material::new(E, 0.3, 7849.0474)
}

fn section() -> Section {
    Section::new(A, I2, I3, 5.64e-6)
}

fn cantilever(load: [f64; 6]) -> (FEModel, usize) {
    let mut model = FEModel::new();
    let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
    let n1 = model.add_node(Node::new(1.0, 0.0, 0.0).with_load(load));
    model.add_frame(n0, n1, &material(), &section()).unwrap();
    (model, n1)
}

#[test]
fn axial_tip_load() {
    let (mut model, tip) = cantilever([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let report = model.analyze_linear(&AnalysisOptions::default()).unwrap();

    assert!(model.is_solved());
    assert_eq!(report.total_dofs, 12);
    assert_eq!(report.free_dofs, 6);

    let d = model.node_displacement(tip).unwrap();
    assert_relative_eq!(d.dx, 1000.0 / (E * A / 1.0), max_relative = 1e-6);
    assert_relative_eq!(d.dx, 1.0417e-6, max_relative = 1e-4);
    for other in &d.as_array()[1..] {
        assert!(other.abs() < 1e-15, "unexpected displacement {}", other);
    }

    let base = model.node_displacement(0).unwrap();
    assert!(base.translation_magnitude() < 1e-15);
}

#[test]
fn axial_tip_load_with_pcg() {
    let (mut model, tip) = cantilever([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let options = AnalysisOptions::default().with_solver(SolverMethod::Pcg);
    model.analyze_linear(&options).unwrap();
    assert_relative_eq!(model.node_displacement(tip).unwrap().dx, 1000.0 / (E * A), max_relative = 1e-6);
}

#[test]
fn transverse_tip_loads() {
    let p = 500.0;
    // Member along X: local y is global Z (I3), local z is -global Y (I2)
    let (mut model, tip) = cantilever([0.0, p, p, 0.0, 0.0, 0.0]);
    model.analyze_linear(&AnalysisOptions::default()).unwrap();
    let d = model.node_displacement(tip).unwrap();

    assert_relative_eq!(d.dz, p / (3.0 * E * I3), max_relative = 1e-6);
    assert_relative_eq!(d.dy, p / (3.0 * E * I2), max_relative = 1e-6);
    // tip rotations P L^2 / 2EI
    assert_relative_eq!(d.ry.abs(), p / (2.0 * E * I3), max_relative = 1e-6);
    assert_relative_eq!(d.rz.abs(), p / (2.0 * E * I2), max_relative = 1e-6);
}

#[test]
fn hinged_span_between_fixed_ends() {
    // n0 fixed -- n1 -- n2 fixed, hinge on the right of n1.
    // Left span acts as a cantilever (3EI/L^3), right span as a propped
    // member (3EI/L^3), so the joint deflects P L^3 / 6EI.
    let l = 2.0;
    let p = 1000.0;
    let mut model = FEModel::new();
    let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
    let n1 = model.add_node(Node::new(l, 0.0, 0.0).with_load([0.0, 0.0, -p, 0.0, 0.0, 0.0]));
    let n2 = model.add_node(Node::new(2.0 * l, 0.0, 0.0).fixed());

    model.add_frame(n0, n1, &material(), &section()).unwrap();
    let right = FrameElement::new(model.nodes(), n1, n2, &material(), &section())
        .unwrap()
        .with_releases(FrameReleases::pin_i());
    model.add_frame_element(right).unwrap();

    model.analyze_linear(&AnalysisOptions::default()).unwrap();
    let d = model.node_displacement(n1).unwrap();
    assert_relative_eq!(d.dz, -p * l.powi(3) / (6.0 * E * I3), max_relative = 1e-6);
}

#[test]
fn prescribed_settlement() {
    // Tip pushed axially by a prescribed displacement, no load
    let mut model = FEModel::new();
    let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
    let n1 = model.add_node(Node::new(0.0, 0.0, 2.5).with_prescribed(2, 1e-3));
    model.add_frame(n0, n1, &material(), &section()).unwrap();

    let report = model.analyze_linear(&AnalysisOptions::default()).unwrap();
    assert_eq!(report.free_dofs, 5);
    let d = model.node_displacement(n1).unwrap();
    assert_relative_eq!(d.dz, 1e-3, max_relative = 1e-8);
    assert!(d.dx.abs() < 1e-12);
}
