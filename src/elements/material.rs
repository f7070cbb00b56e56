//! Material properties

use serde::{Deserialize, Serialize};

/// Isotropic linear-elastic material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Density in kg/m³
    pub rho: f64,
}

impl Material {
    pub fn new(e: f64, nu: f64, rho: f64) -> Self {
        Self { e, nu, rho }
    }

    /// Shear modulus G = E / 2(1 + nu)
    pub fn g(&self) -> f64 {
        self.e / (2.0 * (1.0 + self.nu))
    }

    /// Structural steel
    pub fn steel() -> Self {
        Self {
            e: 200e9,
            nu: 0.3,
            rho: 7850.0,
        }
    }

    /// Create a standard concrete material
    pub fn concrete(fc: f64) -> Self {
        // fc is compressive strength in Pa
        // E estimated using ACI formula: E = 4700 * sqrt(f'c in MPa) MPa
        let fc_mpa = fc / 1e6;
        Self {
            e: 4700.0 * fc_mpa.sqrt() * 1e6,
            nu: 0.2,
            rho: 2400.0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}
