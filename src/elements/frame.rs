//! Frame element - 2-node 3D beam/column with end releases

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{Element, Material, Section};
use crate::error::{FEAError, FEAResult};
use crate::math::{self, Condensed, CoordinateSystem, Mat, Mat12, Vec as FEVec, Vec12};
use crate::registry::NodeRegistry;

/// Members shorter than this are rejected as degenerate
pub const MIN_LENGTH: f64 = 1e-10;

/// Tolerance used to detect members parallel to global Z
const AXIS_TOL: f64 = 1e-6;

/// End releases for a frame element (locally freed DOFs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReleases {
    /// i-node releases [DX, DY, DZ, RX, RY, RZ]
    pub i_node: [bool; 6],
    /// j-node releases [DX, DY, DZ, RX, RY, RZ]
    pub j_node: [bool; 6],
}

impl FrameReleases {
    pub fn none() -> Self {
        Self::default()
    }

    /// Moment releases (RY, RZ) at the i-node
    pub fn pin_i() -> Self {
        Self {
            i_node: [false, false, false, false, true, true],
            j_node: [false; 6],
        }
    }

    /// Moment releases (RY, RZ) at the j-node
    pub fn pin_j() -> Self {
        Self {
            i_node: [false; 6],
            j_node: [false, false, false, false, true, true],
        }
    }

    /// Moment releases at both ends
    pub fn pin_both() -> Self {
        Self {
            i_node: [false, false, false, false, true, true],
            j_node: [false, false, false, false, true, true],
        }
    }

    /// Build from 12 flags, i-node first
    pub fn from_slice(flags: &[bool]) -> FEAResult<Self> {
        if flags.len() != 12 {
            return Err(FEAError::InvalidInput(format!(
                "frame releases must have 12 entries, got {}",
                flags.len()
            )));
        }
        let mut releases = Self::default();
        releases.i_node.copy_from_slice(&flags[0..6]);
        releases.j_node.copy_from_slice(&flags[6..12]);
        Ok(releases)
    }

    /// Get combined releases as 12-element array
    pub fn as_array(&self) -> [bool; 12] {
        let mut arr = [false; 12];
        arr[0..6].copy_from_slice(&self.i_node);
        arr[6..12].copy_from_slice(&self.j_node);
        arr
    }

    pub fn is_empty(&self) -> bool {
        !self.as_array().iter().any(|&r| r)
    }
}

/// A 3D frame element between two registered nodes
///
/// Local matrices are formed once at construction. The condensed view that
/// accounts for end releases is computed lazily and cached until the releases
/// or the nodal load change.
#[derive(Debug, Clone)]
pub struct FrameElement {
    name: Option<String>,
    nodes: [usize; 2],
    length: f64,
    csys: CoordinateSystem,
    releases: FrameReleases,
    ke: Mat12,
    me: Mat12,
    re: Vec12,
    condensed: OnceLock<Condensed>,
}

impl FrameElement {
    /// Create a frame element between nodes `i` and `j` of `registry`
    pub fn new(
        registry: &NodeRegistry,
        i: usize,
        j: usize,
        material: &Material,
        section: &Section,
    ) -> FEAResult<Self> {
        let node_i = registry.get(i)?;
        let node_j = registry.get(j)?;

        let length = node_i.distance_to(node_j);
        if i == j || length < MIN_LENGTH {
            return Err(FEAError::InvalidGeometry(format!(
                "frame element between nodes {} and {} has zero length",
                i, j
            )));
        }

        // Third point off the member axis fixes the local 1-2 plane
        let origin = node_i.coords();
        let mut pt2 = origin;
        if (node_i.x - node_j.x).abs() < AXIS_TOL && (node_i.y - node_j.y).abs() < AXIS_TOL {
            pt2[0] += 1.0;
        } else {
            pt2[2] += 1.0;
        }
        let csys = CoordinateSystem::cartesian(origin, node_j.coords(), pt2)?;

        let ke = math::frame_local_stiffness(
            material.e,
            material.g(),
            section.a,
            section.i2,
            section.i3,
            section.j,
            length,
        );
        let me = math::frame_lumped_mass(material.rho, section.a, length);

        Ok(Self {
            name: None,
            nodes: [i, j],
            length,
            csys,
            releases: FrameReleases::none(),
            ke,
            me,
            re: Vec12::zeros(),
            condensed: OnceLock::new(),
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_releases(mut self, releases: FrameReleases) -> Self {
        self.set_end_releases(releases);
        self
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn local_csys(&self) -> &CoordinateSystem {
        &self.csys
    }

    /// Uncondensed local stiffness
    pub fn ke(&self) -> &Mat12 {
        &self.ke
    }

    /// Uncondensed local (lumped) mass
    pub fn me(&self) -> &Mat12 {
        &self.me
    }

    /// Uncondensed local nodal force
    pub fn re(&self) -> &Vec12 {
        &self.re
    }

    /// Set the local equivalent nodal force; must have 12 entries
    pub fn set_re(&mut self, force: &[f64]) -> FEAResult<()> {
        if force.len() != 12 {
            return Err(FEAError::InvalidInput(format!(
                "frame nodal force must have 12 entries, got {}",
                force.len()
            )));
        }
        self.re = Vec12::from_column_slice(force);
        self.condensed = OnceLock::new();
        Ok(())
    }

    pub fn releases(&self) -> &FrameReleases {
        &self.releases
    }

    /// Set releases from 12 flags (i-node first)
    pub fn set_releases(&mut self, flags: &[bool]) -> FEAResult<()> {
        let releases = FrameReleases::from_slice(flags)?;
        self.set_end_releases(releases);
        Ok(())
    }

    pub fn set_end_releases(&mut self, releases: FrameReleases) {
        self.releases = releases;
        self.condensed = OnceLock::new();
    }

    /// Condensed stiffness, mass and load for the current releases
    pub fn static_condensation(&self) -> FEAResult<&Condensed> {
        if let Some(c) = self.condensed.get() {
            return Ok(c);
        }
        let c = math::static_condensation(&self.ke, &self.me, &self.re, &self.releases.as_array())?;
        Ok(self.condensed.get_or_init(|| c))
    }

    /// Condensed local stiffness
    pub fn ke_condensed(&self) -> FEAResult<&Mat12> {
        Ok(&self.static_condensation()?.k)
    }

    /// Condensed local mass
    pub fn me_condensed(&self) -> FEAResult<&Mat12> {
        Ok(&self.static_condensation()?.m)
    }

    /// Condensed local nodal force
    pub fn re_condensed(&self) -> FEAResult<&Vec12> {
        Ok(&self.static_condensation()?.r)
    }

    /// Whether this element joins the same two nodes as `other`, in either order
    pub fn same_members(&self, other: &FrameElement) -> bool {
        let [a, b] = self.nodes;
        let [c, d] = other.nodes;
        (a == c && b == d) || (a == d && b == c)
    }
}

impl Element for FrameElement {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn assign_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    fn transform_matrix(&self) -> Mat {
        math::block_diagonal(&self.csys.transform_matrix(), 4)
    }

    fn assembly_stiffness(&self) -> FEAResult<Mat> {
        Ok(math::to_dynamic(self.ke_condensed()?))
    }

    fn assembly_mass(&self) -> FEAResult<Mat> {
        Ok(math::to_dynamic(self.me_condensed()?))
    }

    fn assembly_load(&self) -> FEAResult<FEVec> {
        Ok(FEVec::from_column_slice(self.re_condensed()?.as_slice()))
    }
}
