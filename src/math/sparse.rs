//! Sparse matrix utilities for global assembly and iterative solves
//!
//! Global stiffness matrices are mostly empty: each node couples only to the
//! nodes it shares an element with. Element contributions are accumulated as
//! COO triplets and converted to CSR once assembly is complete.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse matrix builder using COO format
/// Duplicate entries are summed on conversion, so accumulation order is free
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // 6 DOFs per node with a handful of neighbours each
        let estimated_nnz = size * 60;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Scatter-add an element matrix: local row/col `a` lands on global `dofs[a]`
    pub fn add_scattered(&mut self, dofs: &[usize], k_elem: &DMatrix<f64>) {
        for (a, &da) in dofs.iter().enumerate() {
            for (b, &db) in dofs.iter().enumerate() {
                self.add(da, db, k_elem[(a, b)]);
            }
        }
    }

    /// Convert to CSR format
    ///
    /// Every diagonal position is stored explicitly, even when zero, so that
    /// diagonals can be rewritten in place afterwards.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);
        for i in 0..self.size {
            coo.push(i, i, 0.0);
        }
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        CsrMatrix::from(&coo)
    }

    /// Convert to dense matrix (for comparison/debugging)
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);
        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }
        mat
    }

    /// Number of accumulated triplets (before duplicates are merged)
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

/// Outcome of an iterative solve
#[derive(Debug, Clone)]
pub struct IterativeSolution {
    pub x: DVector<f64>,
    pub iterations: usize,
    /// Norm of the true residual `b - A x` at exit
    pub residual_norm: f64,
    pub converged: bool,
}

impl IterativeSolution {
    fn finish(csr: &CsrMatrix<f64>, b: &DVector<f64>, x: DVector<f64>, iterations: usize, target: f64) -> Self {
        let residual_norm = (b - sparse_matvec(csr, &x)).norm();
        let finite = residual_norm.is_finite() && x.iter().all(|v| v.is_finite());
        Self {
            converged: finite && residual_norm <= target,
            x,
            iterations,
            residual_norm,
        }
    }
}

/// Diagonal of `csr` for Jacobi scaling; empty diagonals fall back to 1
fn jacobi_diagonal(csr: &CsrMatrix<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut diag = DVector::from_element(n, 1.0);
    for (row, col, &val) in csr.triplet_iter() {
        if row == col && val.abs() > 1e-300 {
            diag[row] = val;
        }
    }
    diag
}

/// Restarted GMRES(m) with optional right Jacobi preconditioning
///
/// Converges when `||b - A x|| <= tol * ||b||`. A Krylov breakdown that does
/// not meet the tolerance (singular, inconsistent system) stops the solve and
/// is reported as not converged.
pub fn solve_gmres(
    csr: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
    restart: usize,
    precondition: bool,
) -> IterativeSolution {
    let n = csr.nrows();
    let b_norm = b.norm();
    let target = tol * b_norm;
    let mut x = DVector::zeros(n);

    if b_norm == 0.0 {
        return IterativeSolution { x, iterations: 0, residual_norm: 0.0, converged: true };
    }

    let diag = if precondition {
        jacobi_diagonal(csr)
    } else {
        DVector::from_element(n, 1.0)
    };
    let m = restart.clamp(1, n.max(1));
    let mut total_iter = 0;

    loop {
        let r = b - sparse_matvec(csr, &x);
        let beta = r.norm();
        if !beta.is_finite() || beta <= target || total_iter >= max_iter {
            return IterativeSolution::finish(csr, b, x, total_iter, target);
        }

        let mut v: Vec<DVector<f64>> = Vec::with_capacity(m + 1);
        v.push(r / beta);
        let mut h = DMatrix::<f64>::zeros(m + 1, m);
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut g = DVector::<f64>::zeros(m + 1);
        g[0] = beta;

        let mut k = 0;
        let mut breakdown = false;
        for j in 0..m {
            if total_iter >= max_iter {
                break;
            }

            let mut w = sparse_matvec(csr, &v[j].component_div(&diag));
            let w_norm = w.norm();
            for i in 0..=j {
                h[(i, j)] = w.dot(&v[i]);
                w.axpy(-h[(i, j)], &v[i], 1.0);
            }
            let h_next = w.norm();
            h[(j + 1, j)] = h_next;

            for i in 0..j {
                let temp = cs[i] * h[(i, j)] + sn[i] * h[(i + 1, j)];
                h[(i + 1, j)] = -sn[i] * h[(i, j)] + cs[i] * h[(i + 1, j)];
                h[(i, j)] = temp;
            }
            let (c, s, rho) = givens_rotation(h[(j, j)], h[(j + 1, j)]);
            cs[j] = c;
            sn[j] = s;
            h[(j, j)] = rho;
            h[(j + 1, j)] = 0.0;
            g[j + 1] = -s * g[j];
            g[j] *= c;

            k = j + 1;
            total_iter += 1;

            if h_next <= 1e-12 * w_norm {
                breakdown = true;
                break;
            }
            if g[k].abs() <= target {
                break;
            }
            v.push(w / h_next);
        }

        // Least-squares update from the triangularised Hessenberg system
        let mut y = DVector::<f64>::zeros(k);
        for i in (0..k).rev() {
            let mut sum = g[i];
            for l in (i + 1)..k {
                sum -= h[(i, l)] * y[l];
            }
            if h[(i, i)] != 0.0 {
                y[i] = sum / h[(i, i)];
            }
        }
        let mut dz = DVector::<f64>::zeros(n);
        for i in 0..k {
            dz.axpy(y[i], &v[i], 1.0);
        }
        x += dz.component_div(&diag);

        if breakdown {
            return IterativeSolution::finish(csr, b, x, total_iter, target);
        }
    }
}

fn givens_rotation(a: f64, b: f64) -> (f64, f64, f64) {
    if b == 0.0 {
        (1.0, 0.0, a)
    } else if b.abs() > a.abs() {
        let tau = a / b;
        let s = 1.0 / (1.0 + tau * tau).sqrt();
        (s * tau, s, b * (1.0 + tau * tau).sqrt())
    } else {
        let tau = b / a;
        let c = 1.0 / (1.0 + tau * tau).sqrt();
        (c, c * tau, a * (1.0 + tau * tau).sqrt())
    }
}

/// Preconditioned Conjugate Gradient for symmetric positive definite systems
///
/// Uses the Jacobi (diagonal) preconditioner when `precondition` is set.
pub fn solve_pcg(
    csr: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
    precondition: bool,
) -> IterativeSolution {
    let n = csr.nrows();
    let b_norm = b.norm();
    let target = tol * b_norm;
    let mut x = DVector::zeros(n);

    if b_norm == 0.0 {
        return IterativeSolution { x, iterations: 0, residual_norm: 0.0, converged: true };
    }

    let diag = if precondition {
        jacobi_diagonal(csr)
    } else {
        DVector::from_element(n, 1.0)
    };

    let mut r = b.clone();
    let mut z = r.component_div(&diag);
    let mut p = z.clone();
    let mut r_dot_z = r.dot(&z);

    for iter in 0..max_iter {
        let ap = sparse_matvec(csr, &p);
        let p_dot_ap = p.dot(&ap);
        if !p_dot_ap.is_finite() || p_dot_ap.abs() <= f64::MIN_POSITIVE {
            return IterativeSolution::finish(csr, b, x, iter, target);
        }

        let alpha = r_dot_z / p_dot_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() <= target {
            return IterativeSolution::finish(csr, b, x, iter + 1, target);
        }

        z = r.component_div(&diag);
        let r_dot_z_new = r.dot(&z);
        let beta = r_dot_z_new / r_dot_z;
        r_dot_z = r_dot_z_new;
        p = &z + beta * &p;
    }

    IterativeSolution::finish(csr, b, x, max_iter, target)
}

/// Sparse matrix-vector multiplication
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let mut sum = 0.0;
        for idx in row_offsets[row]..row_offsets[row + 1] {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }

    y
}
