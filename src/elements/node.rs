//! Node element - a point in 3D space carrying six DOFs

use serde::{Deserialize, Serialize};

use crate::math::{block_diagonal, Mat, Mat3};

/// A 3D node in the finite element model
///
/// DOF order is [DX, DY, DZ, RX, RY, RZ].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,

    /// Prescribed displacement per DOF; `None` leaves the DOF free
    pub prescribed: [Option<f64>; 6],

    /// Applied load per DOF, in the node's own frame
    pub load: [f64; 6],

    /// Rotation whose rows are the node's own axes, for oblique supports
    /// (global axes when unset)
    pub rotation: Option<Mat3>,

    /// Contiguous global index assigned at registration
    #[serde(skip)]
    pub(crate) hid: Option<usize>,
}

impl Node {
    /// Create a free, unloaded node at the given coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            prescribed: [None; 6],
            load: [0.0; 6],
            rotation: None,
            hid: None,
        }
    }

    /// Fix all six DOFs at zero displacement
    pub fn fixed(mut self) -> Self {
        self.prescribed = [Some(0.0); 6];
        self
    }

    /// Fix translations, leave rotations free
    pub fn pinned(mut self) -> Self {
        self.prescribed = [Some(0.0), Some(0.0), Some(0.0), None, None, None];
        self
    }

    /// Prescribe the displacement of a single DOF
    ///
    /// `dof` is 0..6 in the order DX, DY, DZ, RX, RY, RZ.
    ///
    /// # Panics
    ///
    /// Panics if `dof` is 6 or greater.
    pub fn with_prescribed(mut self, dof: usize, value: f64) -> Self {
        assert!(dof < 6, "node DOF index must be 0..6, got {}", dof);
        self.prescribed[dof] = Some(value);
        self
    }

    /// Set the applied load [FX, FY, FZ, MX, MY, MZ]
    pub fn with_load(mut self, load: [f64; 6]) -> Self {
        self.load = load;
        self
    }

    /// Set the node's own axes (rows of `rotation`) for an oblique support
    pub fn with_rotation(mut self, rotation: Mat3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Global index, if the node has been registered
    pub fn hid(&self) -> Option<usize> {
        self.hid
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Sum of absolute coordinate differences, used for duplicate detection
    pub fn manhattan_distance(&self, other: &Node) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    /// 6x6 global-to-node rotation over translations and rotations
    pub fn transform_matrix(&self) -> Mat {
        block_diagonal(&self.rotation.unwrap_or_else(Mat3::identity), 2)
    }

    /// Number of DOFs with a prescribed displacement
    pub fn constrained_count(&self) -> usize {
        self.prescribed.iter().filter(|d| d.is_some()).count()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}
