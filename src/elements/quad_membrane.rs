//! Quadrilateral membrane - 4-node bilinear plane-stress panel

use nalgebra::{Matrix2, SMatrix, Vector2};

use super::tri_membrane::MIN_AREA_RATIO;
use super::{Element, Material};
use crate::error::{FEAError, FEAResult};
use crate::math::{self, gauss_legendre, CoordinateSystem, Mat, Mat24, Vec as FEVec};
use crate::registry::NodeRegistry;

/// Gauss-Legendre order used by [`QuadMembrane::new`]
pub const DEFAULT_QUADRATURE: usize = 2;

/// Reference-square corner coordinates, counter-clockwise from (-1, -1)
const XI: [f64; 4] = [-1.0, 1.0, 1.0, -1.0];
const ETA: [f64; 4] = [-1.0, -1.0, 1.0, 1.0];

/// A flat 4-node isoparametric membrane
///
/// Nodes are ordered around the perimeter. The local origin is the centroid
/// of the four nodes, local x points at the midpoint of edge i-j and local y
/// lies towards the midpoint of edge j-k.
#[derive(Debug, Clone)]
pub struct QuadMembrane {
    name: Option<String>,
    nodes: [usize; 4],
    csys: CoordinateSystem,
    thickness: f64,
    area: f64,
    quadrature: usize,
    local_xy: [[f64; 2]; 4],
    ke: Mat24,
    me: Mat24,
    re: FEVec,
}

/// Derivatives of the bilinear shape functions w.r.t. (xi, eta)
fn shape_derivatives(xi: f64, eta: f64) -> SMatrix<f64, 2, 4> {
    let mut dn = SMatrix::<f64, 2, 4>::zeros();
    for a in 0..4 {
        dn[(0, a)] = 0.25 * XI[a] * (1.0 + ETA[a] * eta);
        dn[(1, a)] = 0.25 * ETA[a] * (1.0 + XI[a] * xi);
    }
    dn
}

/// Shape function values at (xi, eta)
pub fn shape_functions(xi: f64, eta: f64) -> [f64; 4] {
    [0, 1, 2, 3].map(|a| 0.25 * (1.0 + XI[a] * xi) * (1.0 + ETA[a] * eta))
}

impl QuadMembrane {
    /// Build with the default 2x2 Gauss rule
    pub fn new(
        registry: &NodeRegistry,
        nodes: [usize; 4],
        thickness: f64,
        material: &Material,
    ) -> FEAResult<Self> {
        Self::with_quadrature(registry, nodes, thickness, material, DEFAULT_QUADRATURE)
    }

    /// Build with an `order` x `order` Gauss-Legendre rule (1 to 4)
    pub fn with_quadrature(
        registry: &NodeRegistry,
        nodes: [usize; 4],
        thickness: f64,
        material: &Material,
        order: usize,
    ) -> FEAResult<Self> {
        if thickness <= 0.0 {
            return Err(FEAError::InvalidInput(format!(
                "membrane thickness must be positive, got {}",
                thickness
            )));
        }
        let rule = gauss_legendre(order)?;

        let pts = [
            registry.get(nodes[0])?.coords(),
            registry.get(nodes[1])?.coords(),
            registry.get(nodes[2])?.coords(),
            registry.get(nodes[3])?.coords(),
        ];
        let centroid = [0, 1, 2].map(|d| pts.iter().map(|p| p[d]).sum::<f64>() / 4.0);
        let mid_ij = [0, 1, 2].map(|d| 0.5 * (pts[0][d] + pts[1][d]));
        let mid_jk = [0, 1, 2].map(|d| 0.5 * (pts[1][d] + pts[2][d]));
        let csys = CoordinateSystem::cartesian(centroid, mid_ij, mid_jk).map_err(|_| {
            FEAError::InvalidGeometry(format!("quadrilateral {:?} is degenerate", nodes))
        })?;

        let local_xy = pts.map(|p| {
            let v = csys.to_local(p);
            [v.x, v.y]
        });

        // Two-triangle split along the i-k diagonal
        let tri_area = |a: usize, b: usize, c: usize| {
            let [xa, ya] = local_xy[a];
            let [xb, yb] = local_xy[b];
            let [xc, yc] = local_xy[c];
            0.5 * ((xb - xa) * (yc - ya) - (xc - xa) * (yb - ya))
        };
        let area = (tri_area(0, 1, 2) + tri_area(2, 3, 0)).abs();

        let longest_edge = (0..4)
            .map(|a| {
                let b = (a + 1) % 4;
                (local_xy[b][0] - local_xy[a][0]).hypot(local_xy[b][1] - local_xy[a][1])
            })
            .fold(0.0, f64::max);
        if area <= MIN_AREA_RATIO * longest_edge * longest_edge {
            return Err(FEAError::InvalidGeometry(format!(
                "quadrilateral {:?} has zero area",
                nodes
            )));
        }

        let mut element = Self {
            name: None,
            nodes,
            csys,
            thickness,
            area,
            quadrature: order,
            local_xy,
            ke: Mat24::zeros(),
            me: Mat24::zeros(),
            re: FEVec::zeros(24),
        };

        let d = math::plane_stress_matrix(material.e, material.nu);
        let det_floor = MIN_AREA_RATIO * longest_edge * longest_edge;
        let mut k_in_plane = SMatrix::<f64, 8, 8>::zeros();
        let mut det_sign = 0.0;
        for &(xi, wx) in rule {
            for &(eta, wy) in rule {
                let (b, det_j) = element.strain_displacement(xi, eta)?;
                if det_j.abs() <= det_floor || (det_sign != 0.0 && det_j.signum() != det_sign) {
                    return Err(FEAError::InvalidGeometry(format!(
                        "quadrilateral {:?} is distorted (det J = {:.3e} at ({}, {}))",
                        nodes, det_j, xi, eta
                    )));
                }
                det_sign = det_j.signum();
                k_in_plane += b.transpose() * d * b * (det_j.abs() * thickness * wx * wy);
            }
        }
        let k_full = math::expand_in_plane(&Mat::from_column_slice(8, 8, k_in_plane.as_slice()), 4);
        element.ke = Mat24::from_column_slice(k_full.as_slice());

        // Lumped: a quarter of the panel mass on each in-plane translation
        let nodal_mass = material.rho * area * thickness / 4.0;
        for a in 0..4 {
            element.me[(6 * a, 6 * a)] = nodal_mass;
            element.me[(6 * a + 1, 6 * a + 1)] = nodal_mass;
        }

        Ok(element)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn quadrature_order(&self) -> usize {
        self.quadrature
    }

    pub fn local_csys(&self) -> &CoordinateSystem {
        &self.csys
    }

    pub fn local_coordinates(&self) -> &[[f64; 2]; 4] {
        &self.local_xy
    }

    /// Jacobian of the reference-to-local map at (xi, eta)
    pub fn jacobian(&self, xi: f64, eta: f64) -> Matrix2<f64> {
        let dn = shape_derivatives(xi, eta);
        let mut j = Matrix2::zeros();
        for a in 0..4 {
            let [x, y] = self.local_xy[a];
            j[(0, 0)] += dn[(0, a)] * x;
            j[(0, 1)] += dn[(0, a)] * y;
            j[(1, 0)] += dn[(1, a)] * x;
            j[(1, 1)] += dn[(1, a)] * y;
        }
        j
    }

    /// 3x8 strain-displacement matrix and Jacobian determinant at (xi, eta)
    pub fn strain_displacement(&self, xi: f64, eta: f64) -> FEAResult<(SMatrix<f64, 3, 8>, f64)> {
        let j = self.jacobian(xi, eta);
        let det_j = j.determinant();
        let j_inv = j.try_inverse().ok_or_else(|| {
            FEAError::InvalidGeometry(format!(
                "singular Jacobian in quadrilateral {:?} at ({}, {})",
                self.nodes, xi, eta
            ))
        })?;

        let dn = shape_derivatives(xi, eta);
        let mut b = SMatrix::<f64, 3, 8>::zeros();
        for a in 0..4 {
            let g: Vector2<f64> = j_inv * Vector2::new(dn[(0, a)], dn[(1, a)]);
            b[(0, 2 * a)] = g.x;
            b[(1, 2 * a + 1)] = g.y;
            b[(2, 2 * a)] = g.y;
            b[(2, 2 * a + 1)] = g.x;
        }
        Ok((b, det_j))
    }

    pub fn ke(&self) -> &Mat24 {
        &self.ke
    }

    pub fn me(&self) -> &Mat24 {
        &self.me
    }

    pub fn re(&self) -> &FEVec {
        &self.re
    }

    /// Set the local equivalent nodal force; must have 24 entries
    pub fn set_re(&mut self, force: &[f64]) -> FEAResult<()> {
        if force.len() != 24 {
            return Err(FEAError::InvalidInput(format!(
                "quadrilateral nodal force must have 24 entries, got {}",
                force.len()
            )));
        }
        self.re = FEVec::from_column_slice(force);
        Ok(())
    }
}

impl Element for QuadMembrane {
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
        math::block_diagonal(&self.csys.transform_matrix(), 8)
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
