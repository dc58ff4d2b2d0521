use std::thread;

use crate::{
	bias::BiasSources,
	dice::roller::FastRand,
	expr::{DiceExpression, ModifierExpression},
	store::{ActorId, ActorKey, MemoryStore, ScopeId, StateStore},
	variant::RuleConfig,
	Dice, Engine,
};

const THREADS: u32 = 8;
const UPDATES: u32 = 1000;

#[test]
fn records_start_with_defaults() {
	let store = MemoryStore::new();
	let key = ActorKey::new(ScopeId(3), ActorId(9));
	let state = store.with_bias_state(key, |state| *state);
	assert_eq!(state.luck, 50);
	assert_eq!(state.karma_debt, 0.0);
	assert_eq!(store.rule_config(ScopeId(3)), RuleConfig::default());
	assert!(store.with_initiative_group(ScopeId(3), |group| group.is_empty()));
}

#[test]
fn rule_configs_are_per_scope() {
	let store = MemoryStore::new();
	store.set_rule_config(ScopeId(1), RuleConfig { variant_mode: true });
	assert!(store.rule_config(ScopeId(1)).variant_mode);
	assert!(!store.rule_config(ScopeId(2)).variant_mode);
}

#[test]
fn concurrent_updates_to_one_key_are_not_lost() {
	let store = MemoryStore::new();
	let key = ActorKey::new(ScopeId(1), ActorId(1));

	thread::scope(|scope| {
		for _ in 0..THREADS {
			scope.spawn(|| {
				for _ in 0..UPDATES {
					store.with_bias_state(key, |state| state.karma_debt += 1.0);
				}
			});
		}
	});

	assert_eq!(store.with_bias_state(key, |state| state.karma_debt), f64::from(THREADS * UPDATES));
}

#[test]
fn concurrent_updates_to_different_keys_are_independent() {
	let store = MemoryStore::new();

	thread::scope(|scope| {
		for actor in 0..u64::from(THREADS) {
			let store = &store;
			scope.spawn(move || {
				let key = ActorKey::new(ScopeId(1), ActorId(actor));
				for _ in 0..UPDATES {
					store.with_bias_state(key, |state| state.karma_debt -= 0.5);
				}
			});
		}
	});

	for actor in 0..u64::from(THREADS) {
		let debt = store.with_bias_state(ActorKey::new(ScopeId(1), ActorId(actor)), |state| state.karma_debt);
		assert_eq!(debt, -f64::from(UPDATES) / 2.0);
	}
}

#[test]
fn concurrent_karma_rolls_keep_debt_in_bounds() {
	let engine = Engine::new(MemoryStore::new());
	let key = ActorKey::new(ScopeId(1), ActorId(1));
	let expr = DiceExpression::new(Dice::new(1, 20));

	thread::scope(|scope| {
		for seed in 0..u64::from(THREADS) {
			let (engine, expr) = (&engine, &expr);
			scope.spawn(move || {
				let mut roller = FastRand::with_seed(seed);
				for _ in 0..100 {
					let result = engine.roll(key, expr, BiasSources::BOTH, &mut roller).unwrap();
					assert!((1..=20).contains(&result.total));
				}
			});
		}
	});

	let debt = engine.bias_state(key).karma_debt;
	assert!((-100.0..=100.0).contains(&debt), "{debt}");
}

#[test]
fn initiative_groups_are_per_scope() {
	let store = MemoryStore::new();
	store.with_initiative_group(ScopeId(1), |group| {
		group.add("Darius", ModifierExpression::new(vec![3])).map(|_| ())
	})
	.unwrap();

	assert_eq!(store.with_initiative_group(ScopeId(1), |group| group.len()), 1);
	assert_eq!(store.with_initiative_group(ScopeId(2), |group| group.len()), 0);
}
