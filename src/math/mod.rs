//! Mathematical utilities for element formulation

pub mod csys;
pub mod gauss;
pub mod sparse;

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

use crate::error::{FEAError, FEAResult};

pub use csys::CoordinateSystem;
pub use gauss::gauss_legendre;
pub use sparse::{solve_gmres, solve_pcg, sparse_matvec, IterativeSolution, SparseMatrixBuilder};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for frame stiffness/mass
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for frame nodal forces
pub type Vec12 = SVector<f64, 12>;
/// 18x18 matrix for triangular membranes (3 nodes x 6 DOF)
pub type Mat18 = SMatrix<f64, 18, 18>;
/// 24x24 matrix for quadrilateral membranes (4 nodes x 6 DOF)
pub type Mat24 = SMatrix<f64, 24, 24>;

/// Replicate a 3x3 rotation along the diagonal of a `3 * blocks` square matrix
pub fn block_diagonal(v: &Mat3, blocks: usize) -> Mat {
    let mut t = Mat::zeros(3 * blocks, 3 * blocks);
    for b in 0..blocks {
        t.fixed_view_mut::<3, 3>(3 * b, 3 * b).copy_from(v);
    }
    t
}

/// Copy a statically sized square matrix into dynamic storage
pub fn to_dynamic<const N: usize>(m: &SMatrix<f64, N, N>) -> Mat {
    Mat::from_column_slice(N, N, m.as_slice())
}

/// Local stiffness matrix of a 3D Euler-Bernoulli frame element
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `a` - Cross-sectional area
/// * `i2` - Second moment of area about local 2 (bending in the local x-z plane)
/// * `i3` - Second moment of area about local 3 (bending in the local x-y plane)
/// * `j` - Torsion constant
/// * `l` - Element length
///
/// Local DOF order per end is [ux, uy, uz, rx, ry, rz].
pub fn frame_local_stiffness(e: f64, g: f64, a: f64, i2: f64, i3: f64, j: f64, l: f64) -> Mat12 {
    let l2 = l * l;
    let l3 = l2 * l;
    let mut k = Mat12::zeros();

    // Upper triangle only, mirrored at the end
    let mut set = |r: usize, c: usize, v: f64| k[(r, c)] = v;

    set(0, 0, e * a / l);
    set(0, 6, -e * a / l);

    set(1, 1, 12.0 * e * i3 / l3);
    set(1, 5, 6.0 * e * i3 / l2);
    set(1, 7, -12.0 * e * i3 / l3);
    set(1, 11, 6.0 * e * i3 / l2);

    set(2, 2, 12.0 * e * i2 / l3);
    set(2, 4, -6.0 * e * i2 / l2);
    set(2, 8, -12.0 * e * i2 / l3);
    set(2, 10, -6.0 * e * i2 / l2);

    set(3, 3, g * j / l);
    set(3, 9, -g * j / l);

    set(4, 4, 4.0 * e * i2 / l);
    set(4, 8, 6.0 * e * i2 / l2);
    set(4, 10, 2.0 * e * i2 / l);

    set(5, 5, 4.0 * e * i3 / l);
    set(5, 7, -6.0 * e * i3 / l2);
    set(5, 11, 2.0 * e * i3 / l);

    set(6, 6, e * a / l);

    set(7, 7, 12.0 * e * i3 / l3);
    set(7, 11, -6.0 * e * i3 / l2);

    set(8, 8, 12.0 * e * i2 / l3);
    set(8, 10, 6.0 * e * i2 / l2);

    set(9, 9, g * j / l);
    set(10, 10, 4.0 * e * i2 / l);
    set(11, 11, 4.0 * e * i3 / l);

    k.fill_lower_triangle_with_upper_triangle();
    k
}

/// Boolean scatter of an in-plane (2 DOF per node) matrix into 6 DOF per node
///
/// In-plane DOF `2a + p` of node `a` lands on full DOF `6a + p`; all other
/// rows and columns stay zero.
pub fn expand_in_plane(k: &Mat, node_count: usize) -> Mat {
    let mut full = Mat::zeros(6 * node_count, 6 * node_count);
    for a in 0..node_count {
        for b in 0..node_count {
            for p in 0..2 {
                for q in 0..2 {
                    full[(6 * a + p, 6 * b + q)] = k[(2 * a + p, 2 * b + q)];
                }
            }
        }
    }
    full
}

/// Lumped frame mass: half the member mass on every local DOF
pub fn frame_lumped_mass(rho: f64, a: f64, l: f64) -> Mat12 {
    Mat12::identity() * (rho * a * l / 2.0)
}

/// Isotropic plane-stress constitutive matrix
pub fn plane_stress_matrix(e: f64, nu: f64) -> Mat3 {
    let d0 = e / (1.0 - nu * nu);
    #[rustfmt::skip]
    let d = Mat3::new(
        1.0, nu, 0.0,
        nu, 1.0, 0.0,
        0.0, 0.0, (1.0 - nu) / 2.0,
    );
    d * d0
}

/// Condensed frame matrices after eliminating released DOFs
#[derive(Debug, Clone, PartialEq)]
pub struct Condensed {
    pub k: Mat12,
    pub m: Mat12,
    pub r: Vec12,
}

/// Eliminate released local DOFs from the frame stiffness, mass and load
///
/// Each released DOF `n` is removed in ascending index order from the running
/// (already partially condensed) matrices:
/// `K'[i,j] = K[i,j] - K[i,n] K[n,j] / K[n,n]` and
/// `r'[i] = r[i] - r[n] K[n,i] / K[n,n]`, with the same update for the mass.
pub fn static_condensation(
    k: &Mat12,
    m: &Mat12,
    r: &Vec12,
    releases: &[bool; 12],
) -> FEAResult<Condensed> {
    let mut k_bar = *k;
    let mut m_bar = *m;
    let mut r_bar = *r;

    let scale = (0..12).map(|i| k[(i, i)].abs()).fold(0.0, f64::max);
    let pivot_tol = scale * 1e-12;

    for n in (0..12).filter(|&n| releases[n]) {
        let k_nn = k_bar[(n, n)];
        if k_nn.abs() <= pivot_tol {
            return Err(FEAError::SingularPivot { dof: n, pivot: k_nn });
        }

        let k_prev = k_bar;
        let r_n = r_bar[n];
        for i in 0..12 {
            for j in 0..12 {
                k_bar[(i, j)] = k_prev[(i, j)] - k_prev[(i, n)] * k_prev[(n, j)] / k_nn;
            }
            r_bar[i] -= r_n * k_prev[(n, i)] / k_nn;
        }

        let m_nn = m_bar[(n, n)];
        let m_row_empty = (0..12).all(|j| m_bar[(n, j)] == 0.0);
        if m_row_empty {
            continue;
        }
        if m_nn == 0.0 {
            return Err(FEAError::SingularPivot { dof: n, pivot: m_nn });
        }
        let m_prev = m_bar;
        for i in 0..12 {
            for j in 0..12 {
                m_bar[(i, j)] = m_prev[(i, j)] - m_prev[(i, n)] * m_prev[(n, j)] / m_nn;
            }
        }
    }

    Ok(Condensed { k: k_bar, m: m_bar, r: r_bar })
}
