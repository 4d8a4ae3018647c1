//! Assembly of a small multi-block network through the model API.

use nalgebra::DVector;
use zd_algebra::{AlgebraError, SparseSystem, TripletBudget};
use zd_core::{Tolerances, nearly_equal};
use zd_model::{BlockState, BlockType, Model, ModelConfig, ModelError};

fn network() -> Model {
    let mut model = Model::new(ModelConfig {
        cardiac_period: 1.0,
    })
    .unwrap();

    let vessel = model.add_block(BlockType::BloodVessel, "BV0").unwrap();
    model.set_block_param(vessel, "R_poiseuille", 100.0).unwrap();
    model.set_block_param(vessel, "C", 1e-4).unwrap();
    model.set_block_param(vessel, "L", 1.0).unwrap();
    model.set_block_param(vessel, "stenosis_coefficient", 0.5).unwrap();

    let lv = model.add_block(BlockType::LinearElastanceChamber, "LV").unwrap();
    model.set_block_param(lv, "Emax", 2.0).unwrap();
    model.set_block_param(lv, "Epass", 0.5).unwrap();
    model.set_block_param(lv, "Vrest", 10.0).unwrap();
    let mut activation = model.create_activation("half_cosine").unwrap();
    activation.set_param("t_active", 0.2).unwrap();
    activation.set_param("t_twitch", 0.3).unwrap();
    activation.finalize().unwrap();
    model.set_activation_function(lv, activation).unwrap();

    let aorta = model.add_block(BlockType::BloodVesselCRL, "aorta").unwrap();
    model.set_block_param(aorta, "R_poiseuille", 50.0).unwrap();
    model.set_block_param(aorta, "C", 2e-4).unwrap();
    model.set_block_param(aorta, "L", 0.5).unwrap();

    model
}

fn state(seed: f64) -> (DVector<f64>, DVector<f64>) {
    let y = DVector::from_fn(13, |i, _| seed + i as f64);
    let ydot = DVector::from_fn(13, |i, _| 0.1 * seed - 0.05 * i as f64);
    (y, ydot)
}

#[test]
fn finalize_numbers_blocks_in_order() {
    let mut model = network();
    let system = model.finalize().unwrap();

    let dofs = model.dofhandler();
    assert_eq!(dofs.num_variables(), 13);
    assert_eq!(dofs.num_equations(), 7);
    assert_eq!(dofs.variable_name(0), Some("pressure_in:BV0"));
    assert_eq!(dofs.variable_name(8), Some("Vc:LV"));
    assert_eq!(dofs.variable_name(12), Some("flow_out:aorta"));

    let lv = model.block(model.block_id("LV").unwrap()).unwrap();
    assert_eq!(lv.core().global_var_ids(), [4, 5, 6, 7, 8]);
    assert_eq!(lv.core().global_eqn_ids(), [2, 3, 4]);
    assert_eq!(lv.core().global_param_ids(), [4, 5, 6]);

    assert_eq!(model.parameters().len(), 11);
    assert_eq!(model.num_triplets(), TripletBudget::new(16, 8, 4));
    assert_eq!(system.reserved(), TripletBudget::new(16, 8, 4));
    assert_eq!(system.num_equations(), 7);
    assert_eq!(system.num_variables(), 13);
}

#[test]
fn repeated_cycles_stay_within_reservation() {
    let mut model = network();
    let mut system = model.finalize().unwrap();
    model.update_constant(&mut system).unwrap();

    for (step, time) in [0.0, 0.25, 0.35, 0.5].into_iter().enumerate() {
        model.update_time(&mut system, time).unwrap();
        for iteration in 0..3 {
            let (y, ydot) = state(step as f64 + 0.5 * iteration as f64);
            model.update_solution(&mut system, &y, &ydot).unwrap();
            assert!(system.used().fits_within(&system.reserved()));
            assert_eq!(system.used(), TripletBudget::new(16, 6, 3));
        }
    }

    for block in model.blocks() {
        assert_eq!(block.core().state(), BlockState::SolutionUpdated);
    }
    assert_eq!(model.time(), 0.5);
}

#[test]
fn chamber_tracks_activation_peak() {
    let mut model = network();
    let mut system = model.finalize().unwrap();
    model.update_constant(&mut system).unwrap();

    // t_contract = 0.15 = t_twitch / 2, the half-cosine maximum.
    model.update_time(&mut system, 0.35).unwrap();
    let elastance = -system.f().value(2, 8);
    assert!(nearly_equal(elastance, 2.5, Tolerances::default()));
    assert!(nearly_equal(system.c()[2], 25.0, Tolerances::default()));

    // Outside the twitch only the passive elastance remains.
    model.update_time(&mut system, 0.9).unwrap();
    assert_eq!(system.f().value(2, 8), -0.5);
    assert_eq!(system.c()[2], 5.0);
}

#[test]
fn parameter_change_after_finalize_reaches_next_phase() {
    let mut model = network();
    let mut system = model.finalize().unwrap();
    model.update_constant(&mut system).unwrap();
    assert_eq!(system.e().value(0, 3), -1.0);

    let vessel = model.block_id("BV0").unwrap();
    model.set_block_param(vessel, "L", 4.0).unwrap();
    model.update_constant(&mut system).unwrap();
    assert_eq!(system.e().value(0, 3), -4.0);
    assert_eq!(system.used().e, 3);
}

#[test]
fn missing_activation_fails_time_update() {
    let mut model = Model::new(ModelConfig::default()).unwrap();
    let lv = model.add_block(BlockType::LinearElastanceChamber, "LV").unwrap();
    model.set_block_param(lv, "Emax", 1.0).unwrap();
    let mut system = model.finalize().unwrap();
    model.update_constant(&mut system).unwrap();

    let err = model.update_time(&mut system, 0.1).unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingActivation {
            block: "LV".into()
        }
    );
    assert_eq!(system.f().get(0, 4), None);
    assert_eq!(
        model.block(lv).unwrap().core().state(),
        BlockState::ConstantsWritten
    );
}

#[test]
fn undersized_reservation_is_reported() {
    let mut model = network();
    let system = model.finalize().unwrap();

    let mut small = SparseSystem::new(
        system.num_equations(),
        system.num_variables(),
        TripletBudget::new(10, 8, 4),
    );
    let err = model.update_constant(&mut small).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Algebra(AlgebraError::BudgetExceeded { matrix: "F", .. })
    ));
}

#[test]
fn mismatched_system_is_rejected() {
    let mut model = network();
    model.finalize().unwrap();
    let mut wrong = SparseSystem::new(6, 13, TripletBudget::new(16, 8, 4));
    assert!(matches!(
        model.update_constant(&mut wrong),
        Err(ModelError::Algebra(AlgebraError::DimensionMismatch { .. }))
    ));
}
