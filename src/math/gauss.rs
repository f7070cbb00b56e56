//! Gauss-Legendre quadrature on [-1, 1]
//!
//! Tensor products of these rules integrate over the bi-unit square used by
//! the quadrilateral membrane. An n-point rule is exact for polynomials up to
//! degree 2n - 1.

use crate::error::{FEAError, FEAResult};

/// Points and weights of the n-point Gauss-Legendre rule (n = 1..=4)
pub fn gauss_legendre(order: usize) -> FEAResult<&'static [(f64, f64)]> {
    static G1: [(f64, f64); 1] = [(0.0, 2.0)];
    static G2: [(f64, f64); 2] = [
        (-0.577_350_269_189_625_8, 1.0),
        (0.577_350_269_189_625_8, 1.0),
    ];
    static G3: [(f64, f64); 3] = [
        (-0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
        (0.0, 0.888_888_888_888_888_9),
        (0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
    ];
    static G4: [(f64, f64); 4] = [
        (-0.861_136_311_594_052_6, 0.347_854_845_137_453_9),
        (-0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
        (0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
        (0.861_136_311_594_052_6, 0.347_854_845_137_453_9),
    ];

    match order {
        1 => Ok(&G1[..]),
        2 => Ok(&G2[..]),
        3 => Ok(&G3[..]),
        4 => Ok(&G4[..]),
        _ => Err(FEAError::InvalidInput(format!(
            "Gauss-Legendre order must be between 1 and 4, got {}",
            order
        ))),
    }
}
