use crate::basis::ket::{KetAtom, KetPair};
use crate::basis::Parity;

fn rb_ket(n: i32, l: f64, j: f64, m: f64) -> KetAtom {
    KetAtom::builder()
        .species("Rb")
        .n(n)
        .nu(n as f64 - 3.13)
        .l(l)
        .j(j)
        .f(j)
        .m(m)
        .parity(Parity::from_l(l as i32))
        .energy(-0.5 / (n as f64 - 3.13).powi(2))
        .build()
        .unwrap()
}

#[test]
fn test_ket_atom_label() {
    let ket = rb_ket(60, 0.0, 0.5, 0.5);
    assert_eq!(ket.to_string(), "Rb:60,S_1/2,1/2");

    let ket = rb_ket(58, 3.0, 3.5, -2.5);
    assert_eq!(ket.to_string(), "Rb:58,F_7/2,-5/2");

    let singlet = KetAtom::builder()
        .species("Sr88_singlet")
        .nu(42.27)
        .l(2.0)
        .s(0.0)
        .j(2.0)
        .f(2.0)
        .m(-1.0)
        .energy(-2.8e-4)
        .build()
        .unwrap();
    assert_eq!(singlet.n(), 0);
    assert_eq!(singlet.parity(), Parity::Unknown);
    assert_eq!(singlet.to_string(), "Sr88_singlet:42.3,^{1}D_2,-1");
}

#[test]
fn test_ket_atom_builder_requires_quantum_numbers() {
    assert!(KetAtom::builder().species("Rb").nu(60.0).build().is_err());
}

#[test]
fn test_ket_pair() {
    let pair = KetPair::new(
        [2, 1],
        [4, 3],
        -1e-4,
        Some(1.0),
        Parity::Odd,
        [rb_ket(60, 0.0, 0.5, 0.5), rb_ket(60, 1.0, 0.5, 0.5)],
    );
    assert_eq!(pair.id(), 7);
    assert_eq!(pair.state_indices(), [2, 1]);
    assert_eq!(pair.to_string(), "|Rb:60,S_1/2,1/2; Rb:60,P_1/2,1/2⟩");
}
