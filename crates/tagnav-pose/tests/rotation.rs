use glam::{DMat3, DQuat, DVec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tagnav_pose::{quat_from_rotation_matrix, tag_orientation};

/// Uniformly distributed random rotation (Shoemake's method).
fn random_rotation(rng: &mut StdRng) -> DMat3 {
    let r1: f64 = rng.random();
    let r2: f64 = rng.random();
    let r3: f64 = rng.random();

    let tau = std::f64::consts::TAU;
    let q = DQuat::from_xyzw(
        (1.0 - r1).sqrt() * (tau * r2).cos(),
        r1.sqrt() * (tau * r3).sin(),
        r1.sqrt() * (tau * r3).cos(),
        (1.0 - r1).sqrt() * (tau * r2).sin(),
    );
    DMat3::from_quat(q.normalize())
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum Branch {
    PositiveTrace,
    X,
    Y,
    Z,
}

fn branch_of(m: &DMat3) -> Branch {
    let (r00, r11, r22) = (m.x_axis.x, m.y_axis.y, m.z_axis.z);
    if r00 + r11 + r22 > 0.0 {
        Branch::PositiveTrace
    } else if r00 > r11 && r00 > r22 {
        Branch::X
    } else if r11 > r22 {
        Branch::Y
    } else {
        Branch::Z
    }
}

fn assert_reconstructs(m: &DMat3) {
    let q = quat_from_rotation_matrix(m);
    assert!((q.length() - 1.0).abs() < 1e-6, "not unit: {q:?}");

    let back = DMat3::from_quat(q);
    for (a, b) in back.to_cols_array().iter().zip(m.to_cols_array().iter()) {
        assert!((a - b).abs() < 1e-5, "{back:?} != {m:?}");
    }
}

#[test]
fn random_rotations_cover_all_branches() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut hits = std::collections::HashMap::new();

    for _ in 0..2000 {
        let m = random_rotation(&mut rng);
        *hits.entry(branch_of(&m)).or_insert(0usize) += 1;
        assert_reconstructs(&m);
    }

    for branch in [Branch::PositiveTrace, Branch::X, Branch::Y, Branch::Z] {
        assert!(hits.get(&branch).copied().unwrap_or(0) > 0, "{branch:?} never hit");
    }
}

#[test]
fn near_half_turns_are_stable() {
    let pi = std::f64::consts::PI;
    for axis in [
        DVec3::X,
        DVec3::Y,
        DVec3::Z,
        DVec3::new(1.0, 1.0, 0.0).normalize(),
        DVec3::new(0.0, -1.0, 1.0).normalize(),
        DVec3::new(1.0, 1.0, 1.0).normalize(),
    ] {
        for delta in [0.0, 1e-9, 1e-6, 1e-3] {
            let m = DMat3::from_axis_angle(axis, pi - delta);
            assert_reconstructs(&m);
        }
    }
}

#[test]
fn tag_orientation_is_unit() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let m = random_rotation(&mut rng);
        let q = tag_orientation(&m);
        assert!((q.length() - 1.0).abs() < 1e-6);
    }
}
