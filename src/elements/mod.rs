//! Structural elements module

mod frame;
mod material;
mod node;
mod quad_membrane;
mod section;
mod tri_membrane;

pub use frame::{FrameElement, FrameReleases, MIN_LENGTH};
pub use material::Material;
pub use node::Node;
pub use quad_membrane::{shape_functions, QuadMembrane, DEFAULT_QUADRATURE};
pub use section::Section;
pub use tri_membrane::{TriMembrane, MIN_AREA_RATIO};

use crate::error::FEAResult;
use crate::math::{Mat, Vec as FEVec};

/// Contract shared by every element variant the assembler understands
///
/// Matrices returned by the `assembly_*` methods are in local coordinates and
/// sized `6 * nodes().len()`; the assembler rotates them with
/// `transform_matrix()` and scatters them by node.
pub trait Element {
    fn name(&self) -> Option<&str>;

    fn assign_name(&mut self, name: String);

    /// Registry indices of the element's nodes, in local order
    fn nodes(&self) -> &[usize];

    fn dof_count(&self) -> usize {
        6 * self.nodes().len()
    }

    /// Block-diagonal local rotation covering every element DOF
    fn transform_matrix(&self) -> Mat;

    fn assembly_stiffness(&self) -> FEAResult<Mat>;

    fn assembly_mass(&self) -> FEAResult<Mat>;

    fn assembly_load(&self) -> FEAResult<FEVec>;

    /// Global DOF numbers in element order
    fn global_dofs(&self) -> Vec<usize> {
        self.nodes()
            .iter()
            .flat_map(|&n| (0..6).map(move |d| 6 * n + d))
            .collect()
    }
}
