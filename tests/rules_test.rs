use approx::assert_relative_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;

use rusty_neurons::core::aux_state::{AuxiliaryState, DataKind};
use rusty_neurons::core::clock::SimulationClock;
use rusty_neurons::core::noise::RandomVariate;
use rusty_neurons::core::unit::Unit;
use rusty_neurons::rules::binary::BinaryRule;
use rusty_neurons::rules::iac::IacRule;
use rusty_neurons::rules::kuramoto::KuramotoRule;
use rusty_neurons::rules::sigmoidal::{SigmoidalRule, SquashingFunction};
use rusty_neurons::rules::sinusoidal::SinusoidalRule;
use rusty_neurons::rules::sorn::SornRule;
use rusty_neurons::rules::{NeuronRule, UpdateRule};

#[test]
fn test_kuramoto_unit_advances_by_natural_frequency() {
    let clock = SimulationClock::build(0.1).unwrap();
    let mut unit = Unit::new(0, NeuronRule::Kuramoto(KuramotoRule::default()));
    unit.update(&mut [], &clock).unwrap();
    assert_eq!(unit.activation(), 0.1);
}

#[test]
fn test_iac_unit_converges_to_rest() {
    let mut clock = SimulationClock::build(0.1).unwrap();
    let mut unit = Unit::new(0, NeuronRule::Iac(IacRule::build(0.2, 0.1).unwrap()));
    unit.state_mut().set_activation(0.95);
    for _ in 0..5_000 {
        unit.update(&mut [], &clock).unwrap();
        clock.advance();
    }
    assert_relative_eq!(unit.activation(), 0.1, epsilon = 1e-9);
}

#[test]
fn test_binary_unit_uses_its_bias() {
    let clock = SimulationClock::build(0.1).unwrap();
    let mut unit = Unit::build(
        0,
        NeuronRule::Binary(BinaryRule::build(0.0, 1.0, 0.5).unwrap()),
        AuxiliaryState::ScalarBias(0.4),
    )
    .unwrap();
    unit.state_mut().set_input(0.2);
    unit.update(&mut [], &clock).unwrap();
    assert_eq!(unit.activation(), 1.0);

    unit.set_aux(AuxiliaryState::ScalarBias(0.25)).unwrap();
    unit.state_mut().set_input(0.2);
    unit.update(&mut [], &clock).unwrap();
    assert_eq!(unit.activation(), 0.0);
}

#[test]
fn test_sinusoidal_twins_stay_identical() {
    let template = NeuronRule::Sinusoidal(SinusoidalRule::build(0.5, 0.3).unwrap());
    let mut first = Unit::new(0, template.fork(1));
    let mut second = Unit::new(1, template.fork(2));
    let mut clock = SimulationClock::build(0.05).unwrap();
    for _ in 0..2_000 {
        first.update(&mut [], &clock).unwrap();
        second.update(&mut [], &clock).unwrap();
        assert_eq!(first.activation(), second.activation());
        assert!(first.activation().abs() <= 1.0);
        clock.advance();
    }
}

#[test]
fn test_noisy_forks_diverge() {
    let mut rule = IacRule::default();
    rule.set_add_noise(true);
    rule.set_noise_generator(RandomVariate::normal(0.0, 0.01, 0).unwrap());
    let template = NeuronRule::Iac(rule);

    let clock = SimulationClock::build(0.1).unwrap();
    let mut first = Unit::new(0, template.fork(10));
    let mut second = Unit::new(1, template.fork(11));
    let mut replay = Unit::new(2, template.fork(10));
    first.update(&mut [], &clock).unwrap();
    second.update(&mut [], &clock).unwrap();
    replay.update(&mut [], &clock).unwrap();
    assert_ne!(first.activation(), second.activation());
    assert_eq!(first.activation(), replay.activation());
}

#[test]
fn test_sorn_unit_refractory_cycle() {
    let mut rule = SornRule::default();
    rule.set_refractory_period(1.5).unwrap();
    let mut unit = Unit::new(0, NeuronRule::Sorn(rule));
    let mut clock = SimulationClock::build(1.0).unwrap();

    let mut spikes = Vec::new();
    for _ in 0..6 {
        unit.state_mut().set_input(10.0);
        unit.update(&mut [], &clock).unwrap();
        spikes.push(unit.is_spike());
        clock.advance();
    }
    assert_eq!(spikes, vec![true, false, true, false, true, false]);
}

#[test]
fn test_rule_configuration_round_trip() {
    let mut sorn = SornRule::default();
    sorn.set_threshold(0.42);
    sorn.set_max_threshold(Some(2.0));
    sorn.set_refractory_period(3.0).unwrap();
    let rules = vec![
        NeuronRule::Sorn(sorn),
        NeuronRule::Sigmoidal(
            SigmoidalRule::build(SquashingFunction::Arctan, -1.0, 1.0, 2.5).unwrap(),
        ),
        NeuronRule::Kuramoto(KuramotoRule::build(0.75).unwrap()),
    ];
    let json = serde_json::to_string_pretty(&rules).unwrap();
    let restored: Vec<NeuronRule> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, rules);
}

#[test]
fn test_data_kinds() {
    let biased = [
        NeuronRule::Binary(BinaryRule::default()),
        NeuronRule::Sigmoidal(SigmoidalRule::default()),
    ];
    assert!(biased.iter().all(|rule| rule.data_kind() == DataKind::Biased));
    let empty = [
        NeuronRule::Iac(IacRule::default()),
        NeuronRule::Kuramoto(KuramotoRule::default()),
        NeuronRule::Sinusoidal(SinusoidalRule::default()),
        NeuronRule::Sorn(SornRule::default()),
    ];
    assert!(empty.iter().all(|rule| rule.data_kind() == DataKind::Empty));
}

#[test]
fn test_random_values_are_reproducible() {
    let rule = NeuronRule::Kuramoto(KuramotoRule::default());
    let mut first = ChaCha8Rng::seed_from_u64(5);
    let mut second = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..100 {
        let value = rule.random_value(&mut first);
        assert_eq!(value, rule.random_value(&mut second));
        assert!((0.0..TAU).contains(&value));
    }
}

#[test]
fn test_contextual_nudges() {
    let mut unit = Unit::new(0, NeuronRule::Iac(IacRule::default()));
    unit.state_mut().set_activation(0.95);
    unit.contextual_increment();
    assert_eq!(unit.activation(), 1.0);
    unit.contextual_decrement();
    assert_relative_eq!(unit.activation(), 0.9);

    let mut unit = Unit::new(1, NeuronRule::Kuramoto(KuramotoRule::default()));
    unit.contextual_decrement();
    assert_relative_eq!(unit.activation(), TAU - 0.1, epsilon = 1e-12);
}
