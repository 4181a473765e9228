use approx::assert_relative_eq;

use crate::model::atom::{
    BoundTriple, ModelAtom, ModelAtomInput, ModelAtomKind, MultiChannelBounds, ScalarKind,
    SingleChannelBounds,
};
use crate::model::parameter::{InvalidParameterError, Parameter};
use crate::model::state::ModelStateAtomInput;
use crate::model::SpeciesMismatchError;
use crate::units::{Dimension, UnsupportedUnitError};

fn rubidium_input() -> ModelAtomInput {
    ModelAtomInput {
        species: "Rb".to_string(),
        quantum_numbers: ModelAtomKind::SingleChannel(SingleChannelBounds {
            n: BoundTriple::new(Some(58), Some(62), None),
            l: BoundTriple::new(Some(0), Some(2), None),
            ..Default::default()
        }),
        states_of_interest: vec![ModelStateAtomInput {
            n: Some(60.0),
            l: Some(0.0),
            j: Some(0.5),
            m: Some(0.5),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[test]
fn test_model_atom_species_propagation() {
    let atom = ModelAtom::new(&rubidium_input()).unwrap();
    assert_eq!(atom.species(), "Rb");
    assert_eq!(atom.states_of_interest().len(), 1);
    assert_eq!(atom.states_of_interest()[0].species(), "Rb");
    assert_eq!(atom.states_of_interest()[0].m(), Some(0.5));

    let mut input = rubidium_input();
    input.additionally_included_states.push(ModelStateAtomInput {
        species: Some("Rb".to_string()),
        n: Some(61.0),
        ..Default::default()
    });
    let atom = ModelAtom::new(&input).unwrap();
    assert_eq!(atom.additionally_included_states()[0].species(), "Rb");
}

#[test]
fn test_model_atom_species_mismatch() {
    let mut input = rubidium_input();
    input.states_of_interest[0].species = Some("Cs".to_string());
    let err = ModelAtom::new(&input).unwrap_err();
    assert!(err.downcast_ref::<SpeciesMismatchError>().is_some());
    assert!(err.to_string().contains("Cs"));

    let violations = input.violations();
    assert_eq!(violations.len(), 1);
}

#[test]
fn test_model_atom_invalid_bounds() {
    let mut input = rubidium_input();
    input.energy = BoundTriple::new(Some(1.0), Some(-1.0), None);
    let err = ModelAtom::new(&input).unwrap_err();
    assert!(err.downcast_ref::<InvalidParameterError>().is_some());

    let mut input = rubidium_input();
    input.quantum_numbers = ModelAtomKind::SingleChannel(SingleChannelBounds {
        n: BoundTriple::new(Some(0), Some(3), None),
        j: BoundTriple::new(Some(0.3), None, None),
        ..Default::default()
    });
    assert_eq!(input.violations().len(), 2);

    let mut input = rubidium_input();
    input.states_of_interest[0].f = Some(1.0);
    assert!(ModelAtom::new(&input)
        .unwrap_err()
        .downcast_ref::<InvalidParameterError>()
        .is_some());

    let mut input = rubidium_input();
    input.quantum_numbers = ModelAtomKind::MultiChannel(MultiChannelBounds {
        nu: BoundTriple::new(Some(50.0), Some(60.0), Some(-1.0)),
        ..Default::default()
    });
    input.states_of_interest[0].f = Some(1.0);
    let violations = input.violations();
    assert_eq!(violations.len(), 1);
    assert!(violations[0].to_string().contains("negative step"));
}

#[test]
fn test_model_atom_unit_normalisation() {
    let mut input = rubidium_input();
    input.energy = BoundTriple::new(Some(-1.0), Some(1.0), None);
    input.energy_unit = Some("GHz".to_string());
    input.efield_z = Parameter::range(0.0, 2.0, 1.0).unwrap();
    input.efield_unit = Some("V/cm".to_string());
    let atom = ModelAtom::new(&input).unwrap();

    let ghz = Dimension::Energy.unit_factor("GHz").unwrap();
    assert_relative_eq!(atom.energy().max.unwrap(), ghz, max_relative = 1e-12);
    let vcm = Dimension::ElectricField.unit_factor("V/cm").unwrap();
    assert_relative_eq!(atom.electric_field()[2].get_max(), 2.0 * vcm, max_relative = 1e-12);

    input.bfield_unit = Some("furlong".to_string());
    let err = ModelAtom::new(&input).unwrap_err();
    assert!(err.downcast_ref::<UnsupportedUnitError>().is_some());
}

#[test]
fn test_model_atom_is_real() {
    let mut input = rubidium_input();
    input.efield_x = Parameter::constant(1e-10).unwrap();
    input.bfield_z = Parameter::list(&[0.0, 1e-6]).unwrap();
    let atom = ModelAtom::new(&input).unwrap();
    assert!(atom.is_real());
    assert_eq!(atom.scalar_kind(), ScalarKind::Real);

    input.bfield_y = Parameter::range(0.0, 1e-6, 5e-7).unwrap();
    let atom = ModelAtom::new(&input).unwrap();
    assert!(!atom.is_real());
    assert_eq!(atom.scalar_kind(), ScalarKind::Complex);
}

#[test]
fn test_model_atom_field_configurations() {
    let mut input = rubidium_input();
    input.efield_x = Parameter::list(&[1.0, 2.0]).unwrap();
    input.efield_z = Parameter::range(0.0, 2.0, 1.0).unwrap();
    input.bfield_z = Parameter::list(&[5.0, 6.0]).unwrap();
    let atom = ModelAtom::new(&input).unwrap();

    assert_eq!(atom.number_of_configurations(), 12);
    let configurations = atom.field_configurations();
    assert_eq!(configurations.len(), 12);
    assert_eq!(configurations[0].electric_field, [1.0, 0.0, 0.0]);
    assert_eq!(configurations[0].magnetic_field, [0.0, 0.0, 5.0]);
    assert_eq!(configurations[1].magnetic_field, [0.0, 0.0, 6.0]);
    assert_eq!(configurations[2].electric_field, [1.0, 0.0, 1.0]);
    assert_eq!(configurations[11].electric_field, [2.0, 0.0, 2.0]);
    assert_eq!(configurations[11].magnetic_field, [0.0, 0.0, 6.0]);
}

#[test]
fn test_model_atom_yaml() {
    let yaml = r#"
species: Sr88_singlet
quantum_numbers:
  channel: multi_channel
  nu:
    min: 40.0
    max: 45.0
  f:
    min: 0
    max: 2
energy_unit: GHz
energy:
  min: -10
  max: 10
efield_z: [0.0, 1.0, 2.0]
efield_unit: V/cm
states_of_interest:
  - nu: 42.3
    f: 1
    m: 0
"#;
    let atom: ModelAtom = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(atom.species(), "Sr88_singlet");
    assert!(atom.kind().is_multi_channel());
    assert_eq!(atom.states_of_interest()[0].species(), "Sr88_singlet");
    assert_eq!(atom.number_of_configurations(), 3);

    let conflicting = yaml.replace("  - nu: 42.3", "  - species: Sr87\n    nu: 42.3");
    let err = serde_yaml::from_str::<ModelAtom>(&conflicting).unwrap_err();
    assert!(err.to_string().contains("Species mismatch"));

    // Written models are already in atomic units.
    let written = serde_yaml::to_string(&atom).unwrap();
    let reread: ModelAtom = serde_yaml::from_str(&written).unwrap();
    assert_eq!(reread, atom);

    // State descriptors are written with their resolved species and checked again on reading.
    let species = "species: Sr88_singlet";
    assert_eq!(written.matches(species).count(), 2);
    let (index, _) = written.match_indices(species).last().unwrap();
    let tampered = format!(
        "{}species: Sr87{}",
        &written[..index],
        &written[index + species.len()..]
    );
    let err = serde_yaml::from_str::<ModelAtom>(&tampered).unwrap_err();
    assert!(err.to_string().contains("Species mismatch"));
}
