//! Section properties for frame elements

use serde::{Deserialize, Serialize};

/// Cross-section properties for frame elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Cross-sectional area in m²
    pub a: f64,
    /// Second moment of area about local 2 in m⁴
    pub i2: f64,
    /// Second moment of area about local 3 in m⁴
    pub i3: f64,
    /// Torsional constant in m⁴
    pub j: f64,
}

impl Section {
    pub fn new(a: f64, i2: f64, i3: f64, j: f64) -> Self {
        Self { a, i2, i3, j }
    }

    /// Solid rectangle, `width` along local 2 and `depth` along local 3
    pub fn rectangular(width: f64, depth: f64) -> Self {
        let a = width * depth;
        let i2 = depth * width.powi(3) / 12.0;
        let i3 = width * depth.powi(3) / 12.0;

        // Torsional constant for rectangle (approximate)
        let (long, short) = if width > depth { (width, depth) } else { (depth, width) };
        let j = long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long);

        Self { a, i2, i3, j }
    }

    /// Solid circle
    pub fn circular(diameter: f64) -> Self {
        let r = diameter / 2.0;
        let a = std::f64::consts::PI * r.powi(2);
        let i = std::f64::consts::PI * r.powi(4) / 4.0;
        Self { a, i2: i, i3: i, j: 2.0 * i }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_section() {
        let sec = Section::rectangular(0.3, 0.5);
        assert!((sec.a - 0.15).abs() < 1e-10);
        assert!((sec.i3 - 0.3 * 0.125 / 12.0).abs() < 1e-10);
        assert!(sec.i3 > sec.i2);
    }

    #[test]
    fn test_circular_section() {
        let sec = Section::circular(0.2);
        assert!((sec.j - sec.i2 - sec.i3).abs() < 1e-15);
    }
}
