use approx::assert_relative_eq;
use ndarray::array;

use crate::units::{
    composite_unit_factor, from_base_unit, to_base_unit, Dimension, Quantity,
    UnsupportedUnitError,
};

#[test]
fn test_units_energy_conversions() {
    assert_relative_eq!(
        to_base_unit(27.211386245988, "eV", Dimension::Energy).unwrap(),
        1.0,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        to_base_unit(6.579683920502e6, "GHz", Dimension::Energy).unwrap(),
        1.0,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        from_base_unit(1.0, "1/cm", Dimension::Energy).unwrap(),
        219474.6313632,
        max_relative = 1e-12
    );
    assert_eq!(to_base_unit(0.25, "hartree", Dimension::Energy).unwrap(), 0.25);
}

#[test]
fn test_units_field_conversions_round_trip_through_base_unit() {
    let au = to_base_unit(3.0, "V/cm", Dimension::ElectricField).unwrap();
    assert_relative_eq!(au, 3.0e2 / 5.14220674763e11, max_relative = 1e-12);
    assert_relative_eq!(
        from_base_unit(au, "V/cm", Dimension::ElectricField).unwrap(),
        3.0,
        max_relative = 1e-12
    );

    let gauss = to_base_unit(1.0e4, "G", Dimension::MagneticField).unwrap();
    let tesla = to_base_unit(1.0, "T", Dimension::MagneticField).unwrap();
    assert_relative_eq!(gauss, tesla, max_relative = 1e-12);
}

#[test]
fn test_units_unsupported() {
    let err = to_base_unit(1.0, "furlong", Dimension::Distance).unwrap_err();
    assert!(matches!(err, UnsupportedUnitError(_)));

    // Registered for another dimension only.
    assert!(to_base_unit(1.0, "GHz", Dimension::ElectricField).is_err());
    assert!(Dimension::ElectricQuadrupole.unit_factor("debye").is_err());
    assert_eq!(Dimension::ElectricQuadrupole.supported_units(), vec!["au"]);
}

#[test]
fn test_units_composite() {
    let dims = [Dimension::ElectricDipole, Dimension::ElectricDipole];
    assert_eq!(composite_unit_factor("au", &dims).unwrap(), 1.0);
    assert_relative_eq!(
        composite_unit_factor("debye * debye", &dims).unwrap(),
        1.0 / (2.541746473 * 2.541746473),
        max_relative = 1e-12
    );
    assert!(composite_unit_factor("debye", &dims).is_err());
    assert!(composite_unit_factor("debye * GHz", &dims).is_err());

    assert_eq!(composite_unit_factor("", &[]).unwrap(), 1.0);
    assert!(composite_unit_factor("debye", &[]).is_err());
}

#[test]
fn test_units_quantity() {
    let q = Quantity::from_unit(&array![1.0, 2.0], "debye", &[Dimension::ElectricDipole]).unwrap();
    assert_relative_eq!(q.to_base_unit()[1], 2.0 / 2.541746473, max_relative = 1e-12);
    let back = q.to_unit("debye").unwrap();
    assert_relative_eq!(back[0], 1.0, max_relative = 1e-12);
    assert_relative_eq!(back[1], 2.0, max_relative = 1e-12);
    assert_eq!(q.dimensions(), &[Dimension::ElectricDipole]);

    let e = Quantity::from_base_unit(1.0, &[Dimension::Energy]);
    assert_relative_eq!(
        e.to_unit("GHz").unwrap(),
        6.579683920502e6,
        max_relative = 1e-12
    );
}
