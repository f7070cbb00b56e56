//! FEA Static - linear static structural analysis core
//!
//! Builds a mesh of nodes joined by structural elements, assembles the global
//! sparse stiffness, mass and load, folds supports in with the penalty method
//! and solves for nodal displacements:
//! - Frame elements (3D Euler-Bernoulli beams with end releases)
//! - Triangular and quadrilateral plane-stress membranes
//! - Restarted GMRES or preconditioned CG on the constrained system
//!
//! ## Example
//! ```rust
//! use fea_static::prelude::*;
//!
//! let mut model = FEModel::new();
//!
//! let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
//! let n1 = model.add_node(Node::new(1.0, 0.0, 0.0).with_load([1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
//!
//! let material = Material::new(2e11, 0.3, 7849.0474);
//! let section = Section::new(4.8e-3, 1.537e-7, 3.196e-5, 5.64e-6);
//! model.add_frame(n0, n1, &material, &section).unwrap();
//!
//! model.analyze_linear(&AnalysisOptions::default()).unwrap();
//!
//! let d = model.node_displacement(n1).unwrap();
//! assert!((d.dx - 1000.0 / (2e11 * 4.8e-3)).abs() < 1e-9);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod math;
pub mod model;
pub mod registry;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, SolverMethod};
    pub use crate::elements::{
        Element, FrameElement, FrameReleases, Material, Node, QuadMembrane, Section, TriMembrane,
    };
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::model::FEModel;
    pub use crate::registry::{NodeRegistry, DEFAULT_NODE_TOL};
    pub use crate::results::{NodeDisplacement, SolveReport};
}
