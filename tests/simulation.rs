use gridsir::conflicts::{check_distancing_conflicts, check_position_conflicts};
use gridsir::movement::MovementStrategy;
use gridsir::parameters::ParametersBuilder;
use gridsir::{DiseaseParameters, InfectionStatus, Model, SimulationError};

#[test]
fn invariants_hold_for_a_full_run() {
    for movement in [MovementStrategy::TwoPhase, MovementStrategy::Sequential] {
        let parameters = ParametersBuilder::default()
            .percent_distancing(0.2)
            .movement(movement)
            .seed(3)
            .build()
            .unwrap();
        let mut model = Model::new(parameters).unwrap();
        for _ in 0..100 {
            let counts = model.step();
            assert_eq!(counts.living() + counts.dead, 250);
            assert!(check_position_conflicts(model.agents()).is_empty());
            assert!(check_distancing_conflicts(model.agents(), model.grid()).is_empty());
        }
    }
}

#[test]
fn the_epidemic_burns_out() {
    // Without deaths and after every infection has run its course, nobody is left infected.
    let parameters = ParametersBuilder::default()
        .num_steps(400)
        .disease(DiseaseParameters {
            death_probability: 0.0,
            ..DiseaseParameters::default()
        })
        .build()
        .unwrap();
    let mut model = Model::new(parameters).unwrap();
    let last = *model.run().last().unwrap();
    assert_eq!(last.dead, 0);
    assert_eq!(last.infected + last.quarantined, 0);
    assert!(last.recovered >= 10);
    assert!(model
        .agents()
        .iter()
        .all(|a| a.status() != InfectionStatus::Infected && a.days_infected() == 0));
}

#[test]
fn seeds_decide_the_outcome() {
    let run = |seed| {
        let parameters = ParametersBuilder::default()
            .num_steps(40)
            .seed(seed)
            .build()
            .unwrap();
        Model::new(parameters).unwrap().run().to_vec()
    };
    assert_eq!(run(11), run(11));
    assert_ne!(run(11), run(12));
}

#[test]
fn no_infection_no_epidemic() {
    let parameters = ParametersBuilder::default()
        .initial_infections(0)
        .num_steps(50)
        .build()
        .unwrap();
    let mut model = Model::new(parameters).unwrap();
    assert!(model.run().iter().all(|row| row.susceptible == 250));
}

#[test]
fn impossible_layouts_are_reported() {
    let parameters = ParametersBuilder::default()
        .grid_size(10)
        .population(90)
        .initial_infections(1)
        .percent_distancing(0.5)
        .build()
        .unwrap();
    assert!(matches!(
        Model::new(parameters),
        Err(SimulationError::PlacementError(_))
    ));
}
