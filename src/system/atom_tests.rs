use approx::assert_relative_eq;
use ndarray::{array, Array1, Array2};
use num_complex::Complex;

use crate::basis::atom::BasisAtom;
use crate::basis::ket::KetAtom;
use crate::basis::Parity;
use crate::model::atom::FieldConfiguration;
use crate::operator::{OperatorType, UnsupportedOperatorError};
use crate::system::atom::SystemAtom;
use crate::system::{AtomSystem, DiagonalDiagonalizer, Diagonalizer};

/// Cyclic Jacobi eigensolver for small real symmetric matrices.
struct JacobiDiagonalizer;

impl Diagonalizer<f64> for JacobiDiagonalizer {
    fn diagonalize(
        &self,
        matrix: &Array2<f64>,
    ) -> Result<(Array1<f64>, Array2<f64>), anyhow::Error> {
        let n = matrix.nrows();
        let mut a = matrix.clone();
        let mut v = Array2::<f64>::eye(n);
        for _ in 0..100 {
            let off: f64 = a
                .indexed_iter()
                .filter(|((i, j), _)| i != j)
                .map(|(_, x)| x * x)
                .sum();
            if off < 1e-40 {
                break;
            }
            for p in 0..n {
                for q in (p + 1)..n {
                    if a[(p, q)].abs() < 1e-300 {
                        continue;
                    }
                    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * a[(p, q)]);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;
                    let mut rot = Array2::<f64>::eye(n);
                    rot[(p, p)] = c;
                    rot[(q, q)] = c;
                    rot[(p, q)] = s;
                    rot[(q, p)] = -s;
                    a = rot.t().dot(&a).dot(&rot);
                    v = v.dot(&rot);
                }
            }
        }
        Ok((a.diag().to_owned(), v))
    }
}

fn ket(l: f64, m: f64, energy: f64) -> KetAtom {
    KetAtom::builder()
        .species("Rb")
        .n(60)
        .nu(56.87)
        .l(l)
        .j(0.5)
        .f(0.5)
        .m(m)
        .parity(Parity::from_l(l as i32))
        .energy(energy)
        .build()
        .unwrap()
}

fn basis() -> BasisAtom {
    BasisAtom::new(vec![
        ket(0.0, 0.5, -1.0e-4),
        ket(1.0, 0.5, -0.9e-4),
        ket(0.0, -0.5, -1.0e-4),
    ])
    .unwrap()
}

fn dipole_z() -> Array2<f64> {
    array![[0.0, 100.0, 0.0], [100.0, 0.0, 0.0], [0.0, 0.0, 0.0]]
}

#[test]
fn test_system_atom_field_free() {
    let mut system = SystemAtom::<f64>::builder().basis(basis()).build().unwrap();
    assert!(!system.is_diagonal());
    assert_eq!(system.number_of_states(), 3);
    assert_eq!(system.quantum_number_m(2), Some(-0.5));
    assert_eq!(system.corresponding_ket_index(1), Some(1));

    system.diagonalize(&DiagonalDiagonalizer::default()).unwrap();
    assert!(system.is_diagonal());
    assert_relative_eq!(system.eigenenergy(1), -0.9e-4);
    assert!(system.has_quantum_number_m());
    assert!(system.has_parity());
    assert_eq!(system.parity(1), Parity::Odd);
    assert_eq!(
        system.corresponding_ket(0).map(ToString::to_string),
        Some("Rb:60,S_1/2,1/2".to_string())
    );
}

#[test]
fn test_system_atom_stark_mixing() {
    let ez = 1e-8;
    let mut system = SystemAtom::<f64>::builder()
        .basis(basis())
        .fields(&FieldConfiguration {
            electric_field: [0.0, 0.0, ez],
            magnetic_field: [0.0; 3],
        })
        .operator(OperatorType::ElectricDipole, 0, dipole_z())
        .build()
        .unwrap();
    assert_relative_eq!(system.hamiltonian()[(0, 1)], -ez * 100.0);
    assert!(system
        .diagonalize(&DiagonalDiagonalizer::default())
        .is_err());
    assert!(!system.is_diagonal());

    system.diagonalize(&JacobiDiagonalizer).unwrap();
    assert!(system.is_diagonal());
    let mean = -0.95e-4;
    let split = (5.0e-6f64.powi(2) + (ez * 100.0).powi(2)).sqrt();
    let mut energies = system.eigenenergies().to_vec();
    energies.sort_by(|a, b| a.total_cmp(b));
    assert_relative_eq!(energies[0], mean - split, max_relative = 1e-10);
    assert_relative_eq!(energies[1], -1.0e-4, max_relative = 1e-10);
    assert_relative_eq!(energies[2], mean + split, max_relative = 1e-10);

    for state in 0..3 {
        if system.corresponding_ket_index(state) == Some(2) {
            assert_eq!(system.quantum_number_m(state), Some(-0.5));
            assert_eq!(system.parity(state), Parity::Even);
        } else {
            assert_eq!(system.quantum_number_m(state), Some(0.5));
            assert_eq!(system.parity(state), Parity::Unknown);
        }
    }
    assert!(system.has_quantum_number_m());
    assert!(!system.has_parity());
}

#[test]
fn test_system_atom_validation() {
    // A real representation cannot hold y-components.
    assert!(SystemAtom::<f64>::builder()
        .basis(basis())
        .electric_field([0.0, 1e-9, 0.0])
        .build()
        .is_err());

    // The field couples to a dipole component that was not supplied.
    assert!(SystemAtom::<f64>::builder()
        .basis(basis())
        .electric_field([1e-9, 0.0, 0.0])
        .build()
        .is_err());

    // Wrong shape.
    assert!(SystemAtom::<f64>::builder()
        .basis(basis())
        .operator(OperatorType::ElectricDipole, 0, Array2::zeros((2, 2)))
        .build()
        .is_err());

    let zeros = Array2::<Complex<f64>>::zeros((3, 3));
    let system = SystemAtom::<Complex<f64>>::builder()
        .basis(basis())
        .electric_field([0.0, 1e-9, 0.0])
        .operator(OperatorType::ElectricDipole, -1, zeros.clone())
        .operator(OperatorType::ElectricDipole, 1, zeros)
        .build()
        .unwrap();
    assert_eq!(system.electric_field(), [0.0, 1e-9, 0.0]);
}

#[test]
fn test_system_atom_operator_matrix() {
    let system = SystemAtom::<f64>::builder()
        .basis(basis())
        .operator(OperatorType::ElectricDipole, 0, dipole_z())
        .build()
        .unwrap();
    assert_eq!(
        system.operator_matrix(OperatorType::Identity, 0).unwrap(),
        Array2::<f64>::eye(3)
    );
    assert_eq!(
        system.operator_matrix(OperatorType::Energy, 0).unwrap()[(1, 1)],
        -0.9e-4
    );
    assert_eq!(
        system.operator_matrix(OperatorType::ElectricDipole, 0).unwrap(),
        dipole_z()
    );

    let err = system
        .operator_matrix(OperatorType::ElectricDipole, 1)
        .unwrap_err();
    assert!(err.downcast_ref::<UnsupportedOperatorError>().is_some());
    let err = system
        .operator_matrix(OperatorType::Identity, 1)
        .unwrap_err();
    assert!(err.downcast_ref::<UnsupportedOperatorError>().is_some());
    assert!(system.operator_matrix(OperatorType::Arbitrary, 0).is_err());
}
