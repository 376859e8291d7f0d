//! Simulator-frame to render-frame conversion
//!
//! The wire carries poses in the simulator's right-handed, Z-up convention.
//! The renderer works in a left-handed, Y-up convention. The change of basis
//! maps `(x, y, z)` to `(-x, z, -y)`; because the mapping flips handedness,
//! rotation axes map through the same matrix with the angle negated, which
//! for a `(w, x, y, z)` quaternion gives `(w, x, -z, y)`.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::model::Pose;

pub fn position_to_render(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-p.x, p.z, -p.y)
}

pub fn orientation_to_render(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, -q.k, q.j))
}

pub fn pose_to_render(pose: &Pose) -> Pose {
    Pose {
        position: position_to_render(&pose.position),
        orientation: orientation_to_render(&pose.orientation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn position_axis_permutation() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(position_to_render(&p), Vector3::new(-1.0, 3.0, -2.0));
    }

    #[test]
    fn conversion_commutes_with_rotation() {
        // Rotating then converting must equal converting the rotation and the
        // vector separately: render(R v) == render(R) render(v).
        let rot = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let v = Vector3::new(1.0, 0.0, 0.0);

        let lhs = position_to_render(&(rot * v));
        let rhs = orientation_to_render(&rot) * position_to_render(&v);
        assert!(close(&lhs, &rhs), "{lhs:?} != {rhs:?}");

        // and for an arbitrary axis
        let axis = nalgebra::Unit::new_normalize(Vector3::new(0.3, -0.7, 0.64));
        let rot = UnitQuaternion::from_axis_angle(&axis, 1.234);
        let v = Vector3::new(-2.0, 0.5, 4.0);
        let lhs = position_to_render(&(rot * v));
        let rhs = orientation_to_render(&rot) * position_to_render(&v);
        assert!(close(&lhs, &rhs), "{lhs:?} != {rhs:?}");
    }

    #[test]
    fn identity_stays_identity() {
        let pose = Pose::default();
        let out = pose_to_render(&pose);
        assert_eq!(out.position, Vector3::zeros());
        assert!(out.orientation.angle() < 1e-12);
    }
}
