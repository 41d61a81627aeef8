use approx::assert_relative_eq;
use nalgebra::{linalg::Cholesky, DMatrix, DVector, Dyn};

use super::*;

const MODIFICATIONS: [HessianModKind; 4] = [
    HessianModKind::Eigenvalue,
    HessianModKind::Cholesky,
    HessianModKind::Gmw,
    HessianModKind::Se99,
];

fn indefinite_matrices() -> Vec<DMatrix<f64>> {
    vec![
        DMatrix::from_row_slice(3, 3, &[4.0, 2.0, 1.0, 2.0, 6.0, 3.0, 1.0, 3.0, -0.004]),
        DMatrix::from_row_slice(4, 4, &[
            1890.3, -1750.6, -315.8, 3000.3,
            -1705.6, 1538.3, 284.9, -2706.6,
            -315.8, 284.9, 52.5, -501.2,
            3000.3, -2706.6, -501.2, 4760.8,
        ]),
        DMatrix::from_row_slice(2, 2, &[-2.0, 0.5, 0.5, -1.0]),
        DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -3.0]),
        DMatrix::from_row_slice(1, 1, &[-5.0]),
        DMatrix::zeros(2, 2),
    ]
}

fn positive_definite() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &[4.0, 2.0, 1.0, 2.0, 6.0, 3.0, 1.0, 3.0, 5.0])
}

fn gradient(n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| 1.0 - 0.75 * i as f64)
}

#[test]
fn modified_matrix_is_positive_definite() {
    for kind in MODIFICATIONS {
        for hessian in indefinite_matrices() {
            let g = gradient(hessian.nrows());
            let modified = modify(kind, &hessian, &g, 0).unwrap();
            let b = &modified.matrix;
            assert_relative_eq!(*b, b.transpose(), epsilon = 1e-9 * b.amax().max(1.0));
            assert!(
                Cholesky::<f64, Dyn>::new(b.clone()).is_some(),
                "{:?} left an indefinite matrix: {}",
                kind,
                b
            );
            assert!(g.dot(&modified.direction) < 0.0, "{:?} gave an ascent direction", kind);
            let scale = b.amax().max(1.0) * modified.direction.amax().max(1.0);
            assert_relative_eq!(b * &modified.direction, -&g, epsilon = 1e-10 * scale);
        }
    }
}

#[test]
fn positive_definite_matrix_is_kept() {
    let hessian = positive_definite();
    let g = gradient(3);
    for kind in MODIFICATIONS {
        let modified = modify(kind, &hessian, &g, 0).unwrap();
        assert_relative_eq!(modified.matrix, hessian, epsilon = 1e-10);
    }
    let newton = modify(HessianModKind::Unmodified, &hessian, &g, 0).unwrap();
    assert_relative_eq!(&hessian * newton.direction, -g, epsilon = 1e-12);
}

#[test]
fn unmodified_solves_indefinite_systems() {
    let hessian = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -3.0]);
    let g = DVector::from_vec(vec![2.0, 3.0]);
    let newton = modify(HessianModKind::Unmodified, &hessian, &g, 0).unwrap();
    assert_relative_eq!(newton.direction, DVector::from_vec(vec![-2.0, 1.0]), epsilon = 1e-14);
    assert_eq!(
        modify(HessianModKind::Unmodified, &DMatrix::zeros(2, 2), &g, 0),
        Err(Warning::singular())
    );
}

#[test]
fn input_is_symmetrised() {
    let hessian = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 0.0, 2.0]);
    let g = gradient(2);
    let modified = modify(HessianModKind::Gmw, &hessian, &g, 0).unwrap();
    assert_relative_eq!(
        modified.matrix,
        DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 2.0]),
        epsilon = 1e-14
    );
}

#[test]
fn eigenvalues_are_floored() {
    let hessian = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -3.0]);
    let modified = modify(HessianModKind::Eigenvalue, &hessian, &gradient(2), 0).unwrap();
    assert_relative_eq!(modified.matrix[(0, 0)], 1.0, epsilon = 1e-14);
    assert_relative_eq!(modified.matrix[(1, 1)], f64::EPSILON.sqrt(), epsilon = 1e-14);
}
