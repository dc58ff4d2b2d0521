use std::{
	io,
	sync::{Arc, Mutex},
};

use crate::{
	bias::{BiasController, BiasSources, BiasState},
	config::BiasConfig,
	store::{ActorId, ActorKey, ScopeId},
};

const KEY: ActorKey = ActorKey::new(ScopeId(1), ActorId(1));

fn state(luck: u8, karma_debt: f64) -> BiasState {
	BiasState { luck, karma_debt }
}

#[test]
fn default_state_is_neutral() {
	let controller = BiasController::default();
	let state = BiasState::default();
	assert_eq!(state.luck, 50);
	assert_eq!(state.karma_debt, 0.0);
	assert!(controller.bias_for(&state, BiasSources::BOTH).is_neutral());
}

#[test]
fn sources_are_inert_below_the_threshold() {
	let controller = BiasController::default();
	assert!(controller.source_bias(4.9).is_neutral());
	assert!(controller.source_bias(-4.9).is_neutral());
	assert_eq!(controller.source_bias(5.0).get(), 0.1);
	assert_eq!(controller.source_bias(-5.0).get(), -0.1);
}

#[test]
fn strength_scales_and_caps() {
	let controller = BiasController::default();
	assert_eq!(controller.source_bias(25.0).get(), 0.5);
	assert_eq!(controller.source_bias(-30.0).get(), -0.6);
	assert_eq!(controller.source_bias(50.0).get(), 1.0);
	assert_eq!(controller.source_bias(80.0).get(), 1.0);
	assert!(controller.source_bias(f64::INFINITY).is_neutral());
}

#[test]
fn luck_is_measured_from_fifty() {
	let controller = BiasController::default();
	assert!(controller.luck_bias(&state(54, 0.0)).is_neutral());
	assert_eq!(controller.luck_bias(&state(55, 0.0)).get(), 0.1);
	assert_eq!(controller.luck_bias(&state(100, 0.0)).get(), 1.0);
	assert_eq!(controller.luck_bias(&state(0, 0.0)).get(), -1.0);
}

#[test]
fn only_enabled_sources_apply() {
	let controller = BiasController::default();
	let lucky_and_owed = state(75, -40.0);
	assert!(controller.bias_for(&lucky_and_owed, BiasSources::STANDARD).is_neutral());
	assert_eq!(controller.bias_for(&lucky_and_owed, BiasSources::LUCK).get(), 0.5);
	assert_eq!(controller.bias_for(&lucky_and_owed, BiasSources::KARMA).get(), -0.8);
}

#[test]
fn combined_sources_add_and_clamp() {
	let controller = BiasController::default();
	assert_eq!(controller.bias_for(&state(75, 75.0), BiasSources::BOTH).get(), 1.0);
	assert!(controller.bias_for(&state(25, 25.0), BiasSources::BOTH).is_neutral());
	assert_eq!(controller.bias_for(&state(0, -100.0), BiasSources::BOTH).get(), -1.0);
}

#[test]
fn percentiles_feed_back_into_debt() {
	let controller = BiasController::default();
	let mut state = BiasState::default();
	assert_eq!(controller.record_percentile(KEY, &mut state, 90.0), -40.0);
	assert_eq!(controller.record_percentile(KEY, &mut state, 10.0), 0.0);
	assert_eq!(controller.record_percentile(KEY, &mut state, 50.0), 0.0);
	assert_eq!(controller.record_percentile(KEY, &mut state, 0.0), 50.0);
	assert_eq!(state.karma_debt, 50.0);
}

#[test]
fn debt_is_clamped() {
	let controller = BiasController::default();
	let mut state = state(50, 90.0);
	assert_eq!(controller.record_percentile(KEY, &mut state, 0.0), 100.0);
	assert_eq!(controller.record_percentile(KEY, &mut state, 0.0), 100.0);

	let mut state = self::state(50, -90.0);
	assert_eq!(controller.record_percentile(KEY, &mut state, 100.0), -100.0);
}

#[test]
fn nan_debt_resets() {
	let controller = BiasController::default();
	assert_eq!(controller.clamp_debt(KEY, f64::NAN), 0.0);
	assert_eq!(controller.clamp_debt(KEY, 250.0), 100.0);
	assert_eq!(controller.clamp_debt(KEY, -12.5), -12.5);
}

#[test]
fn custom_tuning_is_respected() {
	let controller = BiasController::new(BiasConfig {
		activation_threshold: 10.0,
		full_strength_deviation: 20.0,
		karma_debt_limit: 30.0,
	});
	assert!(controller.source_bias(9.0).is_neutral());
	assert_eq!(controller.source_bias(10.0).get(), 0.5);
	assert_eq!(controller.clamp_debt(KEY, 45.0), 30.0);
}

/// Writer that collects formatted log output
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

#[test]
fn clamp_warning_names_the_actor() {
	let captured = Captured::default();
	let writer = captured.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::WARN)
		.with_ansi(false)
		.with_writer(move || writer.clone())
		.finish();

	let controller = BiasController::default();
	let key = ActorKey::new(ScopeId(4), ActorId(7));
	tracing::subscriber::with_default(subscriber, || {
		let mut state = state(50, 90.0);
		assert_eq!(controller.record_percentile(key, &mut state, 0.0), 100.0);
	});

	let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
	assert!(output.contains("WARN"), "{output}");
	assert!(output.contains("key=4/7"), "{output}");
	assert!(output.contains("clamped=100"), "{output}");
}
