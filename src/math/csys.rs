//! Local Cartesian coordinate systems for elements

use crate::error::{FEAError, FEAResult};
use super::{Mat3, Vec3};

/// Orthonormal local frame defined by an origin and two reference points
///
/// The local x-axis points from the origin to `pt1`, the local y-axis lies in
/// the plane of the three points on the side of `pt2`, and z completes a
/// right-handed set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    origin: Vec3,
    x: Vec3,
    y: Vec3,
    z: Vec3,
}

impl CoordinateSystem {
    /// Build the frame from an origin and two reference points
    pub fn cartesian(origin: [f64; 3], pt1: [f64; 3], pt2: [f64; 3]) -> FEAResult<Self> {
        let o = Vec3::from(origin);
        let v1 = Vec3::from(pt1) - o;
        let v2 = Vec3::from(pt2) - o;

        let x = v1.try_normalize(1e-12).ok_or_else(|| {
            FEAError::InvalidGeometry(format!(
                "reference point {:?} coincides with origin {:?}",
                pt1, origin
            ))
        })?;
        let z = x.cross(&v2).try_normalize(1e-12 * v2.norm().max(1.0)).ok_or_else(|| {
            FEAError::InvalidGeometry(format!(
                "points {:?}, {:?}, {:?} are collinear",
                origin, pt1, pt2
            ))
        })?;
        let y = z.cross(&x);

        Ok(Self { origin: o, x, y, z })
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Local axes as global unit vectors
    pub fn axes(&self) -> [Vec3; 3] {
        [self.x, self.y, self.z]
    }

    /// 3x3 matrix mapping global vector components into local ones
    ///
    /// Rows are the local x, y and z axes.
    pub fn transform_matrix(&self) -> Mat3 {
        Mat3::from_rows(&[self.x.transpose(), self.y.transpose(), self.z.transpose()])
    }

    /// Local coordinates of a global point
    pub fn to_local(&self, point: [f64; 3]) -> Vec3 {
        self.transform_matrix() * (Vec3::from(point) - self.origin)
    }
}
