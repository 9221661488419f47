//! Rigid-body superposition via the Kabsch algorithm.

use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{calculate_rmsd, centroid};
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

/// Fewest point pairs that determine a rotation.
pub const MIN_POINTS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SuperpositionError {
    #[error("Superposition needs at least {MIN_POINTS} point pairs, got {found}")]
    InsufficientPoints { found: usize },
    #[error("Point sets differ in length: {moving} moving vs {fixed} fixed")]
    LengthMismatch { moving: usize, fixed: usize },
    #[error("Singular value decomposition did not converge")]
    Decomposition,
}

/// A proper rotation followed by a translation: `p' = R·p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Moves every atom of every model in place.
    pub fn apply_to(&self, structure: &mut Structure) {
        for (_, atom) in structure.atoms_iter_mut() {
            atom.position = self.apply(&atom.position);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub transform: RigidTransform,
    /// RMSD between the transformed moving set and the fixed set.
    pub rmsd: f64,
}

/// Finds the rigid transform that best maps `moving` onto `fixed` in the
/// least-squares sense.
///
/// # Errors
///
/// Returns [`SuperpositionError::LengthMismatch`] for sets of different
/// length and [`SuperpositionError::InsufficientPoints`] for fewer than
/// [`MIN_POINTS`] pairs.
pub fn superpose(
    moving: &[Point3<f64>],
    fixed: &[Point3<f64>],
) -> Result<Superposition, SuperpositionError> {
    if moving.len() != fixed.len() {
        return Err(SuperpositionError::LengthMismatch {
            moving: moving.len(),
            fixed: fixed.len(),
        });
    }
    if moving.len() < MIN_POINTS {
        return Err(SuperpositionError::InsufficientPoints {
            found: moving.len(),
        });
    }

    let (Some(moving_center), Some(fixed_center)) = (centroid(moving), centroid(fixed)) else {
        return Err(SuperpositionError::InsufficientPoints { found: 0 });
    };

    let mut covariance = Matrix3::<f64>::zeros();
    for (p, q) in moving.iter().zip(fixed.iter()) {
        covariance += (p - moving_center) * (q - fixed_center).transpose();
    }

    let svd = covariance.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(SuperpositionError::Decomposition);
    };
    let v = v_t.transpose();

    // Flip the smallest axis when the optimal orthogonal map is a reflection.
    let d = (v * u.transpose()).determinant().signum();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation = v * correction * u.transpose();
    let translation = fixed_center.coords - rotation * moving_center.coords;

    let transform = RigidTransform {
        rotation,
        translation,
    };
    let moved: Vec<Point3<f64>> = moving.iter().map(|p| transform.apply(p)).collect();
    let rmsd = calculate_rmsd(&moved, fixed).unwrap_or(0.0);

    Ok(Superposition { transform, rmsd })
}
