//! FE Model - node/element container and global assembler
//!
//! The pipeline runs in fixed phases: `assemble_km` builds the sparse global
//! stiffness and mass, `assemble_f` the load vector, `assemble_boundary`
//! folds prescribed displacements in with the penalty method, and
//! `solve_linear` solves the constrained system.

use log::{debug, info, warn};
use nalgebra_sparse::{CsrMatrix, SparseEntryMut};

use crate::analysis::{self, AnalysisOptions};
use crate::elements::{Element, FrameElement, Material, Node, QuadMembrane, Section, TriMembrane};
use crate::error::{FEAError, FEAResult};
use crate::math::{SparseMatrixBuilder, Vec as FEVec};
use crate::registry::{ElementRegistry, NodeRegistry, DEFAULT_NODE_TOL};
use crate::results::{NodeDisplacement, SolveReport};

/// Global system after boundary folding
#[derive(Debug, Clone)]
struct ConstrainedSystem {
    k_bar: CsrMatrix<f64>,
    m_bar: CsrMatrix<f64>,
    f_bar: FEVec,
    dof: usize,
}

/// The 3D finite element model
#[derive(Debug, Clone)]
pub struct FEModel {
    nodes: NodeRegistry,
    frames: ElementRegistry<FrameElement>,
    tris: ElementRegistry<TriMembrane>,
    quads: ElementRegistry<QuadMembrane>,
    node_tol: f64,

    k: Option<CsrMatrix<f64>>,
    m: Option<CsrMatrix<f64>>,
    f: Option<FEVec>,
    constrained: Option<ConstrainedSystem>,

    displacements: Option<FEVec>,
    solved: bool,
}

impl Default for FEModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FEModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self {
            nodes: NodeRegistry::new(),
            frames: ElementRegistry::new("F"),
            tris: ElementRegistry::new("T"),
            quads: ElementRegistry::new("Q"),
            node_tol: DEFAULT_NODE_TOL,
            k: None,
            m: None,
            f: None,
            constrained: None,
            displacements: None,
            solved: false,
        }
    }

    /// Use `tol` as the merge tolerance for [`FEModel::add_node`]
    pub fn with_node_tolerance(mut self, tol: f64) -> Self {
        self.node_tol = tol;
        self
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node, merging it into an existing node within the model tolerance
    ///
    /// Returns the node's index; a merged node returns the existing index.
    pub fn add_node(&mut self, node: Node) -> usize {
        self.add_node_with_tol(node, self.node_tol)
    }

    pub fn add_node_with_tol(&mut self, node: Node, tol: f64) -> usize {
        let before = self.nodes.len();
        let carries_data = node.constrained_count() > 0 || node.load.iter().any(|&v| v != 0.0);
        let (x, y, z) = (node.x, node.y, node.z);

        let hid = self.nodes.register(node, tol);
        if self.nodes.len() > before {
            self.discard_system();
        } else if carries_data {
            warn!(
                "Node at ({}, {}, {}) merged into node {}; its supports and loads were dropped",
                x, y, z, hid
            );
        }
        hid
    }

    /// Add a frame element between nodes `i` and `j`
    ///
    /// A member joining the same two nodes in either order is not added
    /// twice; the existing index is returned.
    pub fn add_frame(
        &mut self,
        i: usize,
        j: usize,
        material: &Material,
        section: &Section,
    ) -> FEAResult<usize> {
        if let Some(existing) = self.find_frame(i, j) {
            debug!("Frame between nodes {} and {} already exists as #{}", i, j, existing);
            return Ok(existing);
        }
        let element = FrameElement::new(&self.nodes, i, j, material, section)?;
        self.add_frame_element(element)
    }

    /// Add a prebuilt frame element (named or with releases)
    pub fn add_frame_element(&mut self, element: FrameElement) -> FEAResult<usize> {
        self.check_nodes(element.nodes())?;
        let [i, j] = [element.nodes()[0], element.nodes()[1]];
        if let Some(existing) = self.find_frame(i, j) {
            debug!("Frame between nodes {} and {} already exists as #{}", i, j, existing);
            return Ok(existing);
        }
        let index = self.frames.add(element)?;
        self.discard_system();
        Ok(index)
    }

    pub fn add_tri_membrane(
        &mut self,
        nodes: [usize; 3],
        thickness: f64,
        material: &Material,
    ) -> FEAResult<usize> {
        let element = TriMembrane::new(&self.nodes, nodes, thickness, material)?;
        self.add_tri_element(element)
    }

    pub fn add_tri_element(&mut self, element: TriMembrane) -> FEAResult<usize> {
        self.check_nodes(element.nodes())?;
        let index = self.tris.add(element)?;
        self.discard_system();
        Ok(index)
    }

    pub fn add_quad_membrane(
        &mut self,
        nodes: [usize; 4],
        thickness: f64,
        material: &Material,
    ) -> FEAResult<usize> {
        let element = QuadMembrane::new(&self.nodes, nodes, thickness, material)?;
        self.add_quad_element(element)
    }

    pub fn add_quad_element(&mut self, element: QuadMembrane) -> FEAResult<usize> {
        self.check_nodes(element.nodes())?;
        let index = self.quads.add(element)?;
        self.discard_system();
        Ok(index)
    }

    fn find_frame(&self, i: usize, j: usize) -> Option<usize> {
        self.frames.position(|f| {
            let n = f.nodes();
            (n[0] == i && n[1] == j) || (n[0] == j && n[1] == i)
        })
    }

    fn check_nodes(&self, nodes: &[usize]) -> FEAResult<()> {
        match nodes.iter().find(|&&n| n >= self.nodes.len()) {
            Some(&missing) => Err(FEAError::NodeNotFound(missing)),
            None => Ok(()),
        }
    }

    /// Drop every assembled quantity; their dimensions no longer match
    fn discard_system(&mut self) {
        self.k = None;
        self.m = None;
        self.f = None;
        self.constrained = None;
    }

    // ========================
    // Lookup
    // ========================

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn tri_count(&self) -> usize {
        self.tris.len()
    }

    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn node(&self, hid: usize) -> FEAResult<&Node> {
        self.nodes.get(hid)
    }

    /// Mutable node access; supports or loads may change, so assembly is reset
    pub fn node_mut(&mut self, hid: usize) -> FEAResult<&mut Node> {
        self.discard_system();
        self.nodes.get_mut(hid)
    }

    pub fn frame(&self, index: usize) -> FEAResult<&FrameElement> {
        self.frames.get(index)
    }

    pub fn frame_by_name(&self, name: &str) -> FEAResult<&FrameElement> {
        self.frames.by_name(name)
    }

    /// Mutable frame access (releases, nodal load); assembly is reset
    pub fn frame_mut(&mut self, index: usize) -> FEAResult<&mut FrameElement> {
        self.discard_system();
        self.frames.get_mut(index)
    }

    pub fn tri(&self, index: usize) -> FEAResult<&TriMembrane> {
        self.tris.get(index)
    }

    pub fn tri_by_name(&self, name: &str) -> FEAResult<&TriMembrane> {
        self.tris.by_name(name)
    }

    pub fn tri_mut(&mut self, index: usize) -> FEAResult<&mut TriMembrane> {
        self.discard_system();
        self.tris.get_mut(index)
    }

    pub fn quad(&self, index: usize) -> FEAResult<&QuadMembrane> {
        self.quads.get(index)
    }

    pub fn quad_by_name(&self, name: &str) -> FEAResult<&QuadMembrane> {
        self.quads.by_name(name)
    }

    pub fn quad_mut(&mut self, index: usize) -> FEAResult<&mut QuadMembrane> {
        self.discard_system();
        self.quads.get_mut(index)
    }

    // ========================
    // Assembly
    // ========================

    /// Assemble the global stiffness and mass matrices
    pub fn assemble_km(&mut self) -> FEAResult<()> {
        let n_dofs = self.nodes.len() * 6;
        let mut k = SparseMatrixBuilder::new(n_dofs);
        let mut m = SparseMatrixBuilder::new(n_dofs);

        for frame in self.frames.iter() {
            scatter_km(frame, &mut k, &mut m)?;
        }
        for tri in self.tris.iter() {
            scatter_km(tri, &mut k, &mut m)?;
        }
        for quad in self.quads.iter() {
            scatter_km(quad, &mut k, &mut m)?;
        }

        let k = k.to_csr();
        let m = m.to_csr();
        debug!(
            "Assembled K and M: {} nodes, {} DOFs, {} frames, {} triangles, {} quads, nnz(K) = {}",
            self.nodes.len(),
            n_dofs,
            self.frames.len(),
            self.tris.len(),
            self.quads.len(),
            k.nnz()
        );

        self.k = Some(k);
        self.m = Some(m);
        self.constrained = None;
        Ok(())
    }

    /// Assemble the global load vector from nodal and element loads
    pub fn assemble_f(&mut self) -> FEAResult<()> {
        let mut f = FEVec::zeros(self.nodes.len() * 6);

        for (hid, node) in self.nodes.iter().enumerate() {
            let load = node.transform_matrix().transpose() * FEVec::from_column_slice(&node.load);
            for d in 0..6 {
                f[6 * hid + d] += load[d];
            }
        }
        for frame in self.frames.iter() {
            scatter_f(frame, &mut f)?;
        }
        for tri in self.tris.iter() {
            scatter_f(tri, &mut f)?;
        }
        for quad in self.quads.iter() {
            scatter_f(quad, &mut f)?;
        }

        debug!("Assembled load vector, |f| = {:.6e}", f.norm());
        self.f = Some(f);
        self.constrained = None;
        Ok(())
    }

    /// Fold prescribed displacements into copies of K, M and f
    ///
    /// For each constrained DOF the stiffness and mass diagonals are scaled by
    /// `penalty` and the load entry becomes the scaled stiffness diagonal times
    /// the prescribed value. A stiffness diagonal that is exactly zero is set
    /// to `penalty` instead so the row is not left empty.
    pub fn assemble_boundary(&mut self, penalty: f64) -> FEAResult<()> {
        if penalty.is_nan() || penalty <= 0.0 {
            return Err(FEAError::InvalidInput(format!(
                "penalty factor must be positive, got {}",
                penalty
            )));
        }
        let mut k_bar = self.k()?.clone();
        let mut m_bar = self.m()?.clone();
        let mut f_bar = self.f()?.clone();
        let mut dof = self.nodes.len() * 6;

        for (hid, node) in self.nodes.iter().enumerate() {
            for (d, prescribed) in node.prescribed.iter().enumerate() {
                let Some(value) = *prescribed else { continue };
                let idx = 6 * hid + d;

                let k_ii = diagonal_mut(&mut k_bar, idx)?;
                *k_ii = if *k_ii == 0.0 { penalty } else { *k_ii * penalty };
                f_bar[idx] = *k_ii * value;

                let m_ii = diagonal_mut(&mut m_bar, idx)?;
                *m_ii *= penalty;

                dof -= 1;
            }
        }

        debug!("Boundary folded with penalty {:e}: {} free DOFs", penalty, dof);
        self.constrained = Some(ConstrainedSystem { k_bar, m_bar, f_bar, dof });
        Ok(())
    }

    /// Run all three assembly phases
    pub fn assemble(&mut self, penalty: f64) -> FEAResult<()> {
        self.assemble_km()?;
        self.assemble_f()?;
        self.assemble_boundary(penalty)
    }

    pub fn is_assembled(&self) -> bool {
        self.constrained.is_some()
    }

    pub fn k(&self) -> FEAResult<&CsrMatrix<f64>> {
        self.k.as_ref().ok_or(FEAError::NotAssembled("K"))
    }

    pub fn m(&self) -> FEAResult<&CsrMatrix<f64>> {
        self.m.as_ref().ok_or(FEAError::NotAssembled("M"))
    }

    pub fn f(&self) -> FEAResult<&FEVec> {
        self.f.as_ref().ok_or(FEAError::NotAssembled("f"))
    }

    fn constrained(&self, what: &'static str) -> FEAResult<&ConstrainedSystem> {
        self.constrained.as_ref().ok_or(FEAError::NotAssembled(what))
    }

    pub fn k_bar(&self) -> FEAResult<&CsrMatrix<f64>> {
        Ok(&self.constrained("K_bar")?.k_bar)
    }

    pub fn m_bar(&self) -> FEAResult<&CsrMatrix<f64>> {
        Ok(&self.constrained("M_bar")?.m_bar)
    }

    pub fn f_bar(&self) -> FEAResult<&FEVec> {
        Ok(&self.constrained("f_bar")?.f_bar)
    }

    /// Number of free DOFs after boundary folding
    pub fn dof(&self) -> FEAResult<usize> {
        Ok(self.constrained("dof")?.dof)
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Solve the constrained system assembled by [`FEModel::assemble`]
    pub fn solve_linear(&mut self, options: &AnalysisOptions) -> FEAResult<SolveReport> {
        let system = self.constrained("K_bar")?;
        self.check_supported(&system.f_bar)?;
        let solution = analysis::solve_constrained(&system.k_bar, &system.f_bar, options)?;

        let max_translation = (0..self.nodes.len())
            .map(|n| {
                let base = 6 * n;
                (solution.x[base].powi(2) + solution.x[base + 1].powi(2) + solution.x[base + 2].powi(2))
                    .sqrt()
            })
            .fold(0.0, f64::max);

        let report = SolveReport {
            method: options.solver,
            iterations: solution.iterations,
            residual: solution.residual_norm,
            total_dofs: self.nodes.len() * 6,
            free_dofs: system.dof,
            max_translation,
        };
        info!(
            "Linear solve finished: {} DOFs ({} free), {} iterations, max translation {:.6e}",
            report.total_dofs, report.free_dofs, report.iterations, report.max_translation
        );

        self.displacements = Some(solution.x);
        self.solved = true;
        Ok(report)
    }

    /// Reject constrained systems that are singular by construction
    ///
    /// A mesh part with no prescribed DOF keeps its rigid-body modes, and a
    /// free DOF that no element stiffens has a zero row. Krylov solvers can
    /// still meet the residual test on such systems when the load happens to
    /// be consistent (balanced or zero), so both are caught before solving.
    fn check_supported(&self, f_bar: &FEVec) -> FEAResult<()> {
        let singular = |reason: String| -> FEAResult<()> {
            warn!("Constrained system is singular: {}", reason);
            Err(FEAError::ConvergenceFailed { iterations: 0, residual: f_bar.norm() })
        };

        let k = self.k()?;
        let max_diag = (0..k.nrows())
            .filter_map(|i| k.get_entry(i, i).map(|e| e.into_value().abs()))
            .fold(0.0, f64::max);
        let floor = 1e-12 * max_diag;
        for (hid, node) in self.nodes.iter().enumerate() {
            for (d, prescribed) in node.prescribed.iter().enumerate() {
                if prescribed.is_some() {
                    continue;
                }
                let idx = 6 * hid + d;
                let k_ii = k.get_entry(idx, idx).map_or(0.0, |e| e.into_value());
                if !k_ii.is_finite() || k_ii.abs() <= floor {
                    return singular(format!("free DOF {} of node {} has no stiffness", d, hid));
                }
            }
        }

        let mut parts = Connectivity::new(self.nodes.len());
        for nodes in self
            .frames
            .iter()
            .map(|e| e.nodes())
            .chain(self.tris.iter().map(|e| e.nodes()))
            .chain(self.quads.iter().map(|e| e.nodes()))
        {
            for pair in nodes.windows(2) {
                parts.join(pair[0], pair[1]);
            }
        }
        let mut supported = vec![false; self.nodes.len()];
        for (hid, node) in self.nodes.iter().enumerate() {
            if node.prescribed.iter().any(Option::is_some) {
                let root = parts.root(hid);
                supported[root] = true;
            }
        }
        for hid in 0..self.nodes.len() {
            let root = parts.root(hid);
            if !supported[root] {
                return singular(format!("node {} belongs to a mesh part with no supports", hid));
            }
        }
        Ok(())
    }

    /// Assemble with `options.penalty` and solve
    pub fn analyze_linear(&mut self, options: &AnalysisOptions) -> FEAResult<SolveReport> {
        self.assemble(options.penalty)?;
        self.solve_linear(options)
    }

    /// Whether a solve has ever succeeded on this model
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Global displacement vector, 6 entries per node
    pub fn displacements(&self) -> FEAResult<&FEVec> {
        self.displacements.as_ref().ok_or(FEAError::NotSolved)
    }

    pub fn node_displacement(&self, hid: usize) -> FEAResult<NodeDisplacement> {
        let d = self.displacements()?;
        if 6 * hid + 6 > d.len() {
            return Err(FEAError::NodeNotFound(hid));
        }
        let mut arr = [0.0; 6];
        arr.copy_from_slice(&d.as_slice()[6 * hid..6 * hid + 6]);
        Ok(NodeDisplacement::from_array(arr))
    }
}

/// Rotate an element's local K and M to global axes and scatter-add them
fn scatter_km<E: Element>(
    element: &E,
    k: &mut SparseMatrixBuilder,
    m: &mut SparseMatrixBuilder,
) -> FEAResult<()> {
    let t = element.transform_matrix();
    let tt = t.transpose();
    let dofs = element.global_dofs();

    let k_global = &tt * element.assembly_stiffness()? * &t;
    let m_global = &tt * element.assembly_mass()? * &t;
    k.add_scattered(&dofs, &k_global);
    m.add_scattered(&dofs, &m_global);
    Ok(())
}

/// Rotate an element's local nodal force to global axes and add it to `f`
fn scatter_f<E: Element>(element: &E, f: &mut FEVec) -> FEAResult<()> {
    let load = element.transform_matrix().transpose() * element.assembly_load()?;
    for (a, dof) in element.global_dofs().into_iter().enumerate() {
        f[dof] += load[a];
    }
    Ok(())
}

/// Union-find over node indices, joined along element connectivity
struct Connectivity {
    parent: Vec<usize>,
}

impl Connectivity {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn root(&mut self, mut a: usize) -> usize {
        while self.parent[a] != a {
            self.parent[a] = self.parent[self.parent[a]];
            a = self.parent[a];
        }
        a
    }

    fn join(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.root(a), self.root(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

fn diagonal_mut(csr: &mut CsrMatrix<f64>, idx: usize) -> FEAResult<&mut f64> {
    match csr.get_entry_mut(idx, idx) {
        Some(SparseEntryMut::NonZero(value)) => Ok(value),
        _ => Err(FEAError::InvalidInput(format!(
            "global matrix has no stored diagonal for DOF {}",
            idx
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::FrameReleases;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn section() -> Section {
        Section::new(4.8e-3, 1.537e-7, 3.196e-5, 5.64e-6)
    }

    fn material() -> Material {
        Material::new(2e11, 0.3, 7849.0474)
    }

    /// Portal frame with a membrane panel between the columns
    fn portal(order: &[usize]) -> FEModel {
        let mut model = FEModel::new();
        let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
        let n1 = model.add_node(Node::new(4.0, 0.0, 0.0).fixed());
        let n2 = model.add_node(Node::new(4.0, 0.0, 3.0));
        let n3 = model.add_node(Node::new(0.0, 0.0, 3.0));

        for &step in order {
            match step {
                0 => {
                    model.add_frame(n0, n3, &material(), &section()).unwrap();
                }
                1 => {
                    model.add_frame(n1, n2, &material(), &section()).unwrap();
                }
                2 => {
                    model.add_frame(n3, n2, &material(), &section()).unwrap();
                }
                3 => {
                    model.add_quad_membrane([n0, n1, n2, n3], 0.01, &material()).unwrap();
                }
                _ => {
                    model.add_tri_membrane([n0, n1, n2], 0.01, &material()).unwrap();
                }
            }
        }
        model
    }

    #[test]
    fn test_assembly_is_order_independent() {
        let mut a = portal(&[0, 1, 2, 3, 4]);
        let mut b = portal(&[4, 3, 2, 1, 0]);
        a.assemble_km().unwrap();
        b.assemble_km().unwrap();

        let ka = DMatrix::from(a.k().unwrap());
        let kb = DMatrix::from(b.k().unwrap());
        assert_relative_eq!(ka, kb, max_relative = 1e-12, epsilon = 1e-3);

        let ma = DMatrix::from(a.m().unwrap());
        let mb = DMatrix::from(b.m().unwrap());
        assert_relative_eq!(ma, mb, max_relative = 1e-12, epsilon = 1e-9);
    }

    #[test]
    fn test_global_stiffness_symmetric() {
        let mut model = portal(&[0, 1, 2, 3]);
        model.assemble_km().unwrap();
        let k = DMatrix::from(model.k().unwrap());
        assert_relative_eq!(k, k.transpose(), max_relative = 1e-12, epsilon = 1e-3);
    }

    #[test]
    fn test_boundary_folding() {
        let mut model = FEModel::new();
        let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed().with_prescribed(2, -0.01));
        let n1 = model.add_node(Node::new(2.0, 0.0, 0.0));
        model.add_frame(n0, n1, &material(), &section()).unwrap();
        model.assemble(1e10).unwrap();

        let k = model.k().unwrap();
        let k_bar = model.k_bar().unwrap();
        let f_bar = model.f_bar().unwrap();
        for d in 0..6 {
            let original = k.get_entry(d, d).unwrap().into_value();
            let folded = k_bar.get_entry(d, d).unwrap().into_value();
            assert_relative_eq!(folded, original * 1e10, max_relative = 1e-15);
        }
        let k22 = k_bar.get_entry(2, 2).unwrap().into_value();
        assert_relative_eq!(f_bar[2], k22 * -0.01, max_relative = 1e-15);
        assert_eq!(f_bar[0], 0.0);
        assert_eq!(model.dof().unwrap(), 6);

        // mass diagonals scale too
        let m00 = model.m().unwrap().get_entry(0, 0).unwrap().into_value();
        let m_bar00 = model.m_bar().unwrap().get_entry(0, 0).unwrap().into_value();
        assert_relative_eq!(m_bar00, m00 * 1e10, max_relative = 1e-15);
    }

    #[test]
    fn test_zero_stiffness_diagonal_gets_penalty() {
        // A membrane has no stiffness in its drilling DOF
        let mut model = FEModel::new();
        let n0 = model.add_node(Node::new(0.0, 0.0, 0.0).fixed());
        let n1 = model.add_node(Node::new(1.0, 0.0, 0.0));
        let n2 = model.add_node(Node::new(0.0, 1.0, 0.0));
        model.add_tri_membrane([n0, n1, n2], 0.01, &material()).unwrap();
        model.assemble(1e10).unwrap();

        let k_bar = model.k_bar().unwrap();
        assert_eq!(k_bar.get_entry(5, 5).unwrap().into_value(), 1e10);
        assert_eq!(k_bar.get_entry(11, 11).unwrap().into_value(), 0.0);
    }

    #[test]
    fn test_node_loads_and_oblique_nodes() {
        let mut model = FEModel::new();
        // Node axes rotated 90 degrees about Z: local x is global Y
        #[rustfmt::skip]
        let rotation = crate::math::Mat3::new(
            0.0, 1.0, 0.0,
            -1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
        );
        model.add_node(Node::new(0.0, 0.0, 0.0).with_rotation(rotation).with_load([10.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        model.assemble_f().unwrap();
        let f = model.f().unwrap();
        assert_relative_eq!(f[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(f[1], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_element_loads_are_scattered() {
        let mut model = FEModel::new();
        let n0 = model.add_node(Node::new(0.0, 0.0, 0.0));
        let n1 = model.add_node(Node::new(0.0, 0.0, 3.0));
        let idx = model.add_frame(n0, n1, &material(), &section()).unwrap();
        // Local axial push at the j-end of a vertical member points along global Z
        let mut re = [0.0; 12];
        re[6] = 5.0;
        model.frame_mut(idx).unwrap().set_re(&re).unwrap();
        model.assemble_f().unwrap();
        let f = model.f().unwrap();
        assert_relative_eq!(f[6 + 2], 5.0, epsilon = 1e-12);
        assert_relative_eq!(f.norm(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_nodes_and_frames() {
        let mut model = FEModel::new();
        let a = model.add_node(Node::new(0.0, 0.0, 0.0));
        let b = model.add_node(Node::new(1.0, 0.0, 0.0));
        let again = model.add_node(Node::new(1.0, 1e-8, 0.0));
        assert_eq!(again, b);
        assert_eq!(model.node_count(), 2);

        let first = model.add_frame(a, b, &material(), &section()).unwrap();
        let reversed = model.add_frame(b, a, &material(), &section()).unwrap();
        assert_eq!(first, reversed);
        assert_eq!(model.frame_count(), 1);
        assert_eq!(model.frame_by_name("F0").unwrap().nodes(), &[a, b]);
    }

    #[test]
    fn test_prebuilt_frame_with_releases() {
        let mut model = FEModel::new();
        let a = model.add_node(Node::new(0.0, 0.0, 0.0));
        let b = model.add_node(Node::new(3.0, 0.0, 0.0));
        let frame = FrameElement::new(model.nodes(), a, b, &material(), &section())
            .unwrap()
            .with_name("girder")
            .with_releases(FrameReleases::pin_j());
        let idx = model.add_frame_element(frame).unwrap();
        assert_eq!(model.frame_by_name("girder").unwrap().releases(), &FrameReleases::pin_j());
        assert_eq!(model.frame(idx).unwrap().name(), Some("girder"));
    }

    #[test]
    fn test_unassembled_access_errors() {
        let mut model = portal(&[0, 1, 2]);
        assert!(matches!(model.k(), Err(FEAError::NotAssembled("K"))));
        assert!(matches!(model.f_bar(), Err(FEAError::NotAssembled(_))));
        assert!(matches!(model.dof(), Err(FEAError::NotAssembled(_))));
        assert!(matches!(
            model.solve_linear(&AnalysisOptions::default()),
            Err(FEAError::NotAssembled(_))
        ));
        assert!(matches!(model.displacements(), Err(FEAError::NotSolved)));

        model.assemble_km().unwrap();
        // boundary folding needs the load vector too
        assert!(matches!(model.assemble_boundary(1e10), Err(FEAError::NotAssembled("f"))));
    }

    #[test]
    fn test_additions_discard_assembly() {
        let mut model = portal(&[0, 1, 2]);
        model.assemble(1e10).unwrap();
        assert!(model.is_assembled());
        model.add_node(Node::new(9.0, 9.0, 9.0));
        assert!(!model.is_assembled());
        assert!(model.k().is_err());
    }

    #[test]
    fn test_elements_must_reference_known_nodes() {
        let mut other = NodeRegistry::new();
        for x in [0.0, 1.0, 2.0, 3.0] {
            other.register(Node::new(x, 0.0, 0.0), DEFAULT_NODE_TOL);
        }
        let frame = FrameElement::new(&other, 2, 3, &material(), &section()).unwrap();

        let mut model = FEModel::new();
        model.add_node(Node::new(0.0, 0.0, 0.0));
        assert!(matches!(model.add_frame_element(frame), Err(FEAError::NodeNotFound(2))));
    }
}
