use std::sync::Arc;

use crate::basis::atom::BasisAtom;
use crate::basis::ket::KetAtom;
use crate::basis::pair::{BasisPairRestrictions, SharedAtomSystem};
use crate::basis::Parity;
use crate::drivers::pair_basis_construction::{
    PairBasisConstructionDriver, PairBasisConstructionParams,
};
use crate::drivers::PairIntDriver;
use crate::model::parameter::InvalidParameterError;
use crate::system::atom::SystemAtom;
use crate::system::{DiagonalDiagonalizer, MissingDiagonalizationError};

fn ket(n: i32, l: f64, m: f64, energy: f64) -> KetAtom {
    KetAtom::builder()
        .species("Rb")
        .n(n)
        .nu(f64::from(n) - 3.13)
        .l(l)
        .j(l + 0.5)
        .f(l + 0.5)
        .m(m)
        .parity(Parity::from_l(l as i32))
        .energy(energy)
        .build()
        .unwrap()
}

fn system(diagonalize: bool) -> SharedAtomSystem<f64> {
    let basis = BasisAtom::new(vec![
        ket(60, 0.0, 0.5, -1.0e-4),
        ket(60, 0.0, -0.5, -1.0e-4),
        ket(60, 1.0, 0.5, -0.9e-4),
        ket(61, 0.0, 0.5, -0.8e-4),
    ])
    .unwrap();
    let mut system = SystemAtom::<f64>::builder().basis(basis).build().unwrap();
    if diagonalize {
        system.diagonalize(&DiagonalDiagonalizer::default()).unwrap();
    }
    Arc::new(system)
}

#[test]
fn test_drivers_pair_basis_construction_unrestricted() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = PairBasisConstructionParams::default();
    let mut driver = PairBasisConstructionDriver::<f64>::builder()
        .parameters(&params)
        .systems([system(true), system(true)])
        .build()
        .unwrap();
    assert!(driver.result().is_err());
    assert!(driver.run().is_ok());
    let basis = driver.result().unwrap().basis();
    assert_eq!(basis.number_of_kets(), 16);
    assert_eq!(basis.number_of_states(), 16);
}

#[test]
fn test_drivers_pair_basis_construction_restricted() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = PairBasisConstructionParams::builder()
        .restrictions(
            BasisPairRestrictions::builder()
                .m(1.0, 1.0)
                .product_of_parities(Parity::Even)
                .energy(-2.0e-4, -1.75e-4, None)
                .build()
                .unwrap(),
        )
        .print_kets(true)
        .build()
        .unwrap();
    let mut driver = PairBasisConstructionDriver::<f64>::builder()
        .parameters(&params)
        .systems([system(true), system(true)])
        .build()
        .unwrap();
    assert!(driver.run().is_ok());
    let basis = driver.result().unwrap().basis();

    // |60S, 60S⟩, |60S, 61S⟩, |61S, 60S⟩ and |60P, 60P⟩.
    assert_eq!(basis.number_of_states(), 4);
    for ket in basis.kets() {
        assert_eq!(ket.m(), Some(1.0));
        assert_eq!(ket.parity(), Parity::Even);
        assert!(ket.energy() <= -1.75e-4);
    }
}

#[test]
fn test_drivers_pair_basis_construction_requires_diagonalization() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = PairBasisConstructionParams::default();
    let mut driver = PairBasisConstructionDriver::<f64>::builder()
        .parameters(&params)
        .systems([system(true), system(false)])
        .build()
        .unwrap();
    let err = driver.run().unwrap_err();
    assert!(err.downcast_ref::<MissingDiagonalizationError>().is_some());
    assert!(driver.result().is_err());
}

#[test]
fn test_drivers_pair_basis_construction_params_yaml() {
    let params: PairBasisConstructionParams = serde_yaml::from_str(
        r#"
restrictions:
  m: [0.0, 1.0]
  energy:
    min: -10.0
    max: 10.0
    unit: GHz
print_kets: true
"#,
    )
    .unwrap();
    assert!(params.print_kets);
    assert_eq!(params.restrictions.m(), Some((0.0, 1.0)));
    assert_eq!(
        params
            .restrictions
            .energy()
            .and_then(|window| window.unit.as_deref()),
        Some("GHz")
    );

    let empty: PairBasisConstructionParams = serde_yaml::from_str("{}").unwrap();
    assert_eq!(empty, PairBasisConstructionParams::default());

    // An empty window is only detected when the basis is built.
    let inverted: PairBasisConstructionParams =
        serde_yaml::from_str("restrictions:\n  m: [1.0, 0.0]\n").unwrap();
    let mut driver = PairBasisConstructionDriver::<f64>::builder()
        .parameters(&inverted)
        .systems([system(true), system(true)])
        .build()
        .unwrap();
    let err = driver.run().unwrap_err();
    assert!(err.downcast_ref::<InvalidParameterError>().is_some());
}
