use fastrand::Rng;
use proptest::prelude::*;

use crate::{
	bias::BiasSources,
	dice::{operation::Condition, roller::FastRand, roller::Iter as IterRoller, Dice, Faces, Operation, Roller},
	expr::DiceExpression,
	percentile::single_die_percentile,
	sampler::{fudge_faces_for_sum, sample_face, Bias},
	store::{ActorId, ActorKey, MemoryStore, ScopeId},
	Engine,
};

fn operation() -> impl Strategy<Value = Operation> {
	prop_oneof![
		(0u8..=100).prop_map(Operation::KeepHigh),
		(0u8..=100).prop_map(Operation::KeepLow),
		(0u8..=100).prop_map(Operation::DropHigh),
		(0u8..=100).prop_map(Operation::DropLow),
		(1u16..=1000).prop_map(Operation::Min),
		(1u16..=1000).prop_map(Operation::Max),
		(1u16..=1000).prop_map(|val| Operation::RerollAdd { cond: Condition::Lte(val) }),
		any::<bool>().prop_map(|recurse| Operation::Explode { cond: None, recurse }),
	]
}

/// Dice count, sides, how many to drop, and the faces that will be rolled.
fn pool() -> impl Strategy<Value = (u8, u16, u8, Vec<u16>)> {
	(2u8..=10, 2u16..=20).prop_flat_map(|(count, sides)| {
		(
			Just(count),
			Just(sides),
			1..count,
			prop::collection::vec(1..=sides, usize::from(count)),
		)
	})
}

fn total_with(dice: &Dice, faces: &[u16]) -> i32 {
	IterRoller::new(faces.to_vec())
		.roll(dice, Bias::NEUTRAL, true)
		.unwrap()
		.total()
		.unwrap()
}

proptest! {
	#[test]
	fn normalizing_is_idempotent(
		count in 0u8..=110,
		sides in 0u16..=1010,
		op in operation(),
		modifiers in prop::collection::vec(-100i32..=100, 0..4),
	) {
		let mut expr = DiceExpression::new(Dice::builder().count(count).sides(sides).build());
		expr.dice.operations.push(op);
		expr.modifiers = modifiers;

		if let Ok(normalized) = expr.normalize() {
			prop_assert!(normalized.is_canonical());
			prop_assert_eq!(normalized.clone().normalize(), Ok(normalized));
		}
	}

	#[test]
	fn dropping_lowest_keeps_highest((count, sides, drop, faces) in pool()) {
		let dropped = Dice::builder().count(count).sides(sides).drop_low(drop).build();
		let kept = Dice::builder().count(count).sides(sides).keep_high(count - drop).build();
		prop_assert_eq!(total_with(&dropped, &faces), total_with(&kept, &faces));
	}

	#[test]
	fn dropping_highest_keeps_lowest((count, sides, drop, faces) in pool()) {
		let dropped = Dice::builder().count(count).sides(sides).drop_high(drop).build();
		let kept = Dice::builder().count(count).sides(sides).keep_low(count - drop).build();
		prop_assert_eq!(total_with(&dropped, &faces), total_with(&kept, &faces));
	}

	#[test]
	fn sampled_faces_stay_on_the_die(seed in any::<u64>(), sides in 1u16..=1000, bias in -1.5f64..=1.5) {
		let mut rng = Rng::with_seed(seed);
		for _ in 0..16 {
			let face = sample_face(&mut rng, sides, Bias::new(bias));
			prop_assert!((1..=sides).contains(&face));
		}
	}

	#[test]
	fn fudge_faces_hit_their_target(
		seed in any::<u64>(),
		(count, target) in (1u8..=20).prop_flat_map(|count| (Just(count), -i32::from(count)..=i32::from(count))),
	) {
		let faces = fudge_faces_for_sum(&mut Rng::with_seed(seed), count, target);
		prop_assert_eq!(faces.len(), usize::from(count));
		prop_assert!(faces.iter().all(|face| (-1..=1).contains(face)));
		prop_assert_eq!(faces.iter().map(|face| i32::from(*face)).sum::<i32>(), target);
	}

	#[test]
	fn higher_faces_rank_higher(sides in 2u16..=1000, a in 1u16..=1000, b in 1u16..=1000) {
		let (low, high) = (a.min(b).min(sides), a.max(b).min(sides));
		let (low_pct, high_pct) = (
			single_die_percentile(i32::from(low), sides),
			single_die_percentile(i32::from(high), sides),
		);
		prop_assert!((0.0..=100.0).contains(&low_pct));
		if low < high {
			prop_assert!(low_pct < high_pct);
		} else {
			prop_assert_eq!(low_pct, high_pct);
		}
	}
}

#[test]
fn karma_pulls_percentiles_toward_the_middle() {
	let engine = Engine::new(MemoryStore::new());
	let key = ActorKey::new(ScopeId(1), ActorId(1));
	let expr = DiceExpression::new(Dice::new(1, 20));
	let mut roller = FastRand::with_seed(0xca7);

	engine.set_karma_debt(key, 80.0);
	let rolls = 4000;
	let mut sum = 0.0;
	for _ in 0..rolls {
		sum += engine.roll(key, &expr, BiasSources::KARMA, &mut roller).unwrap().percentile;
	}

	let mean = sum / f64::from(rolls);
	assert!((mean - 50.0).abs() < 3.0, "{mean}");
	assert!(engine.bias_state(key).karma_debt.abs() <= 100.0);
}

#[test]
fn symbolic_faces_never_take_operations() {
	for faces in [Faces::Fudge, Faces::Fallout] {
		let mut expr = DiceExpression::new(Dice::with_faces(2, faces));
		expr.dice.operations.push(Operation::KeepHigh(1));
		assert!(expr.normalize().is_err());
	}
}
