//! Triangular membrane - 3-node constant-strain plane-stress panel

use nalgebra::SMatrix;

use super::{Element, Material};
use crate::error::{FEAError, FEAResult};
use crate::math::{self, CoordinateSystem, Mat, Mat18, Vec as FEVec};
use crate::registry::NodeRegistry;

/// Relative area below which a triangle counts as collinear
pub const MIN_AREA_RATIO: f64 = 1e-10;

/// A flat 3-node membrane carrying in-plane stresses only
///
/// The local origin is the centroid; local x points at the j-node and the
/// i-node lies on the positive-y side. Stiffness is formed in the 2-DOF
/// in-plane subspace and scattered to 6 DOF per node, leaving out-of-plane
/// and rotational DOFs without stiffness.
#[derive(Debug, Clone)]
pub struct TriMembrane {
    name: Option<String>,
    nodes: [usize; 3],
    csys: CoordinateSystem,
    thickness: f64,
    signed_area: f64,
    local_xy: [[f64; 2]; 3],
    ke: Mat18,
    me: Mat18,
    re: FEVec,
}

impl TriMembrane {
    pub fn new(
        registry: &NodeRegistry,
        nodes: [usize; 3],
        thickness: f64,
        material: &Material,
    ) -> FEAResult<Self> {
        if thickness <= 0.0 {
            return Err(FEAError::InvalidInput(format!(
                "membrane thickness must be positive, got {}",
                thickness
            )));
        }

        let pts = [
            registry.get(nodes[0])?.coords(),
            registry.get(nodes[1])?.coords(),
            registry.get(nodes[2])?.coords(),
        ];
        let centroid = [0, 1, 2].map(|d| (pts[0][d] + pts[1][d] + pts[2][d]) / 3.0);
        let csys = CoordinateSystem::cartesian(centroid, pts[1], pts[0]).map_err(|_| {
            FEAError::InvalidGeometry(format!("triangle {:?} is degenerate", nodes))
        })?;

        let local_xy = pts.map(|p| {
            let v = csys.to_local(p);
            [v.x, v.y]
        });

        let [x, y] = [0, 1].map(|d| local_xy.map(|p| p[d]));
        #[rustfmt::skip]
        let homogeneous = nalgebra::Matrix3::new(
            1.0, x[0], y[0],
            1.0, x[1], y[1],
            1.0, x[2], y[2],
        );
        let signed_area = 0.5 * homogeneous.determinant();

        let longest_edge = (0..3)
            .map(|a| {
                let b = (a + 1) % 3;
                (x[b] - x[a]).hypot(y[b] - y[a])
            })
            .fold(0.0, f64::max);
        if signed_area.abs() <= MIN_AREA_RATIO * longest_edge * longest_edge {
            return Err(FEAError::InvalidGeometry(format!(
                "triangle {:?} has zero area",
                nodes
            )));
        }

        let mut element = Self {
            name: None,
            nodes,
            csys,
            thickness,
            signed_area,
            local_xy,
            ke: Mat18::zeros(),
            me: Mat18::zeros(),
            re: FEVec::zeros(18),
        };

        let d = math::plane_stress_matrix(material.e, material.nu);
        let b = element.strain_displacement();
        let k_in_plane = b.transpose() * d * b * (element.area() * thickness);
        let k_full = math::expand_in_plane(&Mat::from_column_slice(6, 6, k_in_plane.as_slice()), 3);
        element.ke = Mat18::from_column_slice(k_full.as_slice());

        // Lumped: one third of the panel mass on every DOF
        element.me = Mat18::identity() * (material.rho * element.area() * thickness / 3.0);

        Ok(element)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Panel area (always positive)
    pub fn area(&self) -> f64 {
        self.signed_area.abs()
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn local_csys(&self) -> &CoordinateSystem {
        &self.csys
    }

    /// Nodal coordinates in the element plane
    pub fn local_coordinates(&self) -> &[[f64; 2]; 3] {
        &self.local_xy
    }

    /// Conversion constants (a, b, c) of the area coordinate opposite `j`-`m`
    fn abc(&self, j: usize, m: usize) -> [f64; 3] {
        let [xj, yj] = self.local_xy[j];
        let [xm, ym] = self.local_xy[m];
        [xj * ym - xm * yj, yj - ym, xm - xj]
    }

    /// Constant 3x6 strain-displacement matrix
    ///
    /// Built with the signed area, so node order only flips the sign of both
    /// the gradients and the area and the product stays correct.
    pub fn strain_displacement(&self) -> SMatrix<f64, 3, 6> {
        let mut b = SMatrix::<f64, 3, 6>::zeros();
        for (a, (j, m)) in [(1, 2), (2, 0), (0, 1)].into_iter().enumerate() {
            let [_, bi, ci] = self.abc(j, m);
            b[(0, 2 * a)] = bi;
            b[(1, 2 * a + 1)] = ci;
            b[(2, 2 * a)] = ci;
            b[(2, 2 * a + 1)] = bi;
        }
        b / (2.0 * self.signed_area)
    }

    pub fn ke(&self) -> &Mat18 {
        &self.ke
    }

    pub fn me(&self) -> &Mat18 {
        &self.me
    }

    pub fn re(&self) -> &FEVec {
        &self.re
    }

    /// Set the local equivalent nodal force; must have 18 entries
    pub fn set_re(&mut self, force: &[f64]) -> FEAResult<()> {
        if force.len() != 18 {
            return Err(FEAError::InvalidInput(format!(
                "triangle nodal force must have 18 entries, got {}",
                force.len()
            )));
        }
        self.re = FEVec::from_column_slice(force);
        Ok(())
    }
}

impl Element for TriMembrane {
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
        math::block_diagonal(&self.csys.transform_matrix(), 6)
    }

    fn assembly_stiffness(&self) -> FEAResult<Mat> {
        Ok(math::to_dynamic(&self.ke))
    }

    fn assembly_mass(&self) -> FEAResult<Mat> {
        Ok(math::to_dynamic(&self.me))
    }

    fn assembly_load(&self) -> FEAResult<FEVec> {
        Ok(self.re.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Node;
    use approx::assert_relative_eq;

    fn registry_with(points: &[[f64; 3]]) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        for p in points {
            registry.register(Node::new(p[0], p[1], p[2]), 1e-6);
        }
        registry
    }

    fn right_triangle() -> TriMembrane {
        let registry = registry_with(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        TriMembrane::new(&registry, [0, 1, 2], 0.01, &Material::new(2e11, 0.25, 7850.0)).unwrap()
    }

    #[test]
    fn test_area_and_mass() {
        let tri = right_triangle();
        assert_relative_eq!(tri.area(), 1.0, epsilon = 1e-12);
        let expected = 7850.0 * 1.0 * 0.01 / 3.0;
        for i in 0..18 {
            assert_relative_eq!(tri.me()[(i, i)], expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_stiffness_symmetric_and_in_plane_only() {
        let tri = right_triangle();
        let k = tri.ke();
        for i in 0..18 {
            for j in 0..18 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], max_relative = 1e-12);
            }
            // out-of-plane and rotational slots carry nothing
            for dof in [2, 3, 4, 5] {
                assert_eq!(k[(i, 6 * (i / 6) + dof)], 0.0);
            }
        }
    }

    #[test]
    fn test_rigid_body_modes() {
        let tri = right_triangle();
        let xy = tri.local_coordinates();
        let k = tri.ke();

        let theta = 1e-3;
        let mut translation = nalgebra::SVector::<f64, 18>::zeros();
        let mut rotation = nalgebra::SVector::<f64, 18>::zeros();
        for a in 0..3 {
            translation[6 * a] = 0.4;
            translation[6 * a + 1] = -0.7;
            rotation[6 * a] = -theta * xy[a][1];
            rotation[6 * a + 1] = theta * xy[a][0];
        }
        assert_relative_eq!((k * translation).norm(), 0.0, epsilon = 1e-3);
        assert_relative_eq!((k * rotation).norm(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_uniform_strain_energy() {
        let tri = right_triangle();
        let xy = tri.local_coordinates();
        let eps = 1e-4;
        let mut u = nalgebra::SVector::<f64, 18>::zeros();
        for a in 0..3 {
            u[6 * a] = eps * xy[a][0];
        }
        let energy = (u.transpose() * tri.ke() * u)[(0, 0)];
        let d00 = 2e11 / (1.0 - 0.25 * 0.25);
        assert_relative_eq!(energy, d00 * eps * eps * tri.area() * 0.01, max_relative = 1e-10);
    }

    #[test]
    fn test_tilted_panel_matches_flat_one() {
        let flat = right_triangle();
        // Same triangle rotated out of the XY plane
        let registry = registry_with(&[[0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]]);
        let tilted = TriMembrane::new(&registry, [0, 1, 2], 0.01, &Material::new(2e11, 0.25, 7850.0)).unwrap();
        assert_relative_eq!(tilted.area(), flat.area(), epsilon = 1e-12);
        assert_relative_eq!(tilted.ke(), flat.ke(), max_relative = 1e-10, epsilon = 1e-3);
    }

    #[test]
    fn test_collinear_nodes_rejected() {
        let registry = registry_with(&[[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [2.0, 2.0, 0.0]]);
        let err = TriMembrane::new(&registry, [0, 1, 2], 0.01, &Material::steel()).unwrap_err();
        assert!(matches!(err, FEAError::InvalidGeometry(_)));
    }

    #[test]
    fn test_set_re_validates_length() {
        let mut tri = right_triangle();
        assert!(tri.set_re(&[0.0; 12]).is_err());
        assert!(tri.set_re(&[1.0; 18]).is_ok());
        assert_eq!(tri.re().len(), 18);
    }
}
