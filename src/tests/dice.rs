use crate::{
	dice::{
		operation::{Condition, Operation, MAX_ADDITIONAL_ROLLS},
		roller::{FastRand, Iter as IterRoller, Max as MaxRoller, Roller, Val as ValRoller},
		Dice, DieRoll, Error, Faces, Rolled,
	},
	expr::Describe,
	sampler::Bias,
};

#[test]
fn single_d20() {
	let dice = Dice::new(1, 20);
	let rolled = rolls_successfully_and_in_range(&dice);
	assert_eq!(rolled.rolls.len(), 1);
	assert_eq!(*rolled.dice, dice);
}

#[test]
fn hundred_d1000s() {
	let dice = Dice::new(100, 1000);
	let rolled = rolls_successfully_and_in_range(&dice);
	assert_eq!(rolled.rolls.len(), 100);
}

#[test]
fn all_dice_sides_occur() {
	let dice = Dice::new(100, 20);
	let mut roller = FastRand::with_seed(0x5eed);
	let mut rolls = Vec::new();

	for _ in 0..100 {
		let mut rolled = roller.roll(&dice, Bias::NEUTRAL, true).unwrap();
		rolls.append(&mut rolled.rolls);
	}

	rolls_in_range(&rolls, 20);
	for side in 1..=20 {
		assert!(rolls.iter().any(|roll| roll.val == side));
	}
}

#[test]
fn biased_rolls_stay_in_range() {
	let dice = Dice::new(100, 7);
	let mut roller = FastRand::with_seed(42);
	for bias in [-1.0, -0.3, 0.0, 0.6, 1.0] {
		let rolled = roller.roll(&dice, Bias::new(bias), true).unwrap();
		rolls_in_range(&rolled.rolls, 7);
	}
}

#[test]
fn keep_high_drops_the_rest() {
	let dice = Dice::builder().count(4).sides(6).keep_high(2).build();
	let rolled = IterRoller::new([3, 6, 1, 2]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.total().unwrap(), 9);
	assert_eq!(rolled.rolls.iter().filter(|roll| roll.is_dropped()).count(), 2);
}

#[test]
fn keep_low_drops_the_rest() {
	let dice = Dice::builder().count(4).sides(6).keep_low(1).build();
	let rolled = IterRoller::new([3, 6, 1, 2]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.total().unwrap(), 1);
}

#[test]
fn drop_low_matches_keep_high() {
	let values = [5, 2, 6, 2, 4];
	let dropped = Dice::builder().count(5).sides(6).drop_low(2).build();
	let kept = Dice::builder().count(5).sides(6).keep_high(3).build();

	let dropped = IterRoller::new(values).roll(&dropped, Bias::NEUTRAL, true).unwrap();
	let kept = IterRoller::new(values).roll(&kept, Bias::NEUTRAL, true).unwrap();
	assert_eq!(dropped.total().unwrap(), kept.total().unwrap());
	assert_eq!(dropped.total().unwrap(), 15);
}

#[test]
fn reroll_once_only_rerolls_once() {
	let dice = Dice::builder().count(2).sides(6).reroll(Condition::Eq(1), false).build();
	let rolled = IterRoller::new([1, 4, 1]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.len(), 3);
	assert_eq!(rolled.total().unwrap(), 5);
}

#[test]
fn reroll_recursively_until_condition_fails() {
	let dice = Dice::builder().count(1).sides(6).reroll(Condition::Lte(2), true).build();
	let rolled = IterRoller::new([1, 2, 1, 5]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.len(), 4);
	assert_eq!(rolled.total().unwrap(), 5);
}

#[test]
fn reroll_and_add_keeps_the_original() {
	let dice = Dice::builder().count(3).sides(6).reroll_add(Condition::Eq(1)).build();
	let rolled = IterRoller::new([1, 4, 1, 6]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.len(), 4);
	assert!(rolled.rolls.iter().all(|roll| !roll.is_dropped()));
	assert!(rolled.rolls[3].is_additional());
	assert_eq!(rolled.total().unwrap(), 12);

	let rolled = MaxRoller.roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.len(), 3);
}

#[test]
fn recursive_explosions_stop_at_the_cap() {
	let dice = Dice::builder().count(1).sides(2).explode(None, true).build();
	let rolled = MaxRoller.roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.len(), MAX_ADDITIONAL_ROLLS + 1);
	assert!(rolled.rolls.iter().skip(1).all(DieRoll::is_additional));
}

#[test]
fn explode_once_with_condition() {
	let dice = Dice::builder()
		.count(3)
		.sides(10)
		.explode(Some(Condition::Gte(9)), false)
		.build();
	let rolled = IterRoller::new([9, 3, 10, 10, 1]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.len(), 5);
	assert_eq!(rolled.total().unwrap(), 33);
}

#[test]
fn infinite_dice_are_rejected() {
	let dice = Dice::builder().count(4).sides(1).explode(None, true).build();
	assert!(matches!(
		ValRoller(1).roll(&dice, Bias::NEUTRAL, true),
		Err(Error::InfiniteRolls(..))
	));

	let dice = Dice::builder().count(2).sides(6).reroll(Condition::Lte(6), true).build();
	assert!(matches!(
		ValRoller(3).roll(&dice, Bias::NEUTRAL, true),
		Err(Error::InfiniteRolls(..))
	));
}

#[test]
fn min_and_max_clamp_values() {
	let dice = Dice::builder().count(3).sides(6).min(3).max(5).build();
	let rolled = IterRoller::new([1, 6, 4]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.rolls.iter().map(|roll| roll.val).collect::<Vec<_>>(), vec![3, 5, 4]);
	assert!(rolled.rolls[0].is_changed());
	assert!(!rolled.rolls[2].is_changed());
	assert_eq!(rolled.total().unwrap(), 12);
}

#[test]
fn operations_can_be_skipped() {
	let dice = Dice::builder().count(2).sides(6).keep_high(1).build();
	let rolled = IterRoller::new([2, 5]).roll(&dice, Bias::NEUTRAL, false).unwrap();
	assert_eq!(rolled.total().unwrap(), 7);
}

#[test]
fn fudge_values() {
	let dice = Dice::with_faces(4, Faces::Fudge);
	let rolled = IterRoller::new([1, 2, 3, 3]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.total().unwrap(), 1);
	assert_eq!(rolled.describe(None), "4dF[-, 0, +, +]");
}

#[test]
fn fallout_damage_and_effects() {
	let dice = Dice::with_faces(3, Faces::Fallout);
	let rolled = IterRoller::new([5, 2, 6]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.total().unwrap(), 4);
	assert_eq!(rolled.effects(), 2);
	assert_eq!(rolled.to_string(), "3dD[1E, 2, 1E]");
}

#[test]
fn symbolic_faces_from_fastrand_stay_in_range() {
	let mut roller = FastRand::with_seed(9);
	for faces in [Faces::Fudge, Faces::Fallout] {
		let dice = Dice::with_faces(50, faces);
		for bias in [-1.0, 0.0, 1.0] {
			let rolled = roller.roll(&dice, Bias::new(bias), true).unwrap();
			assert_eq!(rolled.rolls.len(), 50);
			assert!(rolled.out_of_domain().is_none());
		}
	}
}

#[test]
fn out_of_domain_faces_are_found() {
	let dice = Dice::new(2, 6);
	let rolled = IterRoller::new([3, 7]).roll(&dice, Bias::NEUTRAL, true).unwrap();
	assert_eq!(rolled.out_of_domain().map(|roll| roll.val), Some(7));
}

#[test]
fn dice_display() {
	let dice = Dice::builder()
		.count(4)
		.sides(6)
		.reroll(Condition::Lt(3), false)
		.explode(None, true)
		.keep_high(3)
		.min(2)
		.build();
	assert_eq!(dice.to_string(), "4d6ro<3xkh3min2");
	assert_eq!(Dice::with_faces(2, Faces::Fudge).to_string(), "2dF");
	assert_eq!(Operation::Reroll { cond: Condition::Eq(1), recurse: true }.to_string(), "rr=1");
}

#[test]
fn dice_equality() {
	assert_eq!(Dice::new(4, 8), Dice::builder().count(4).sides(8).build());
	assert_ne!(Dice::new(4, 8), Dice::new(4, 20));
	assert_ne!(Dice::new(4, 8), Dice::new(2, 8));
	assert_ne!(
		Dice::new(4, 8),
		Dice::builder().count(4).sides(8).explode(None, true).build()
	);
}

#[test]
fn rolled_equality() {
	let dice = Dice::builder().count(2).sides(8).explode(None, false).build();
	let a = Rolled::from_dice_and_rolls(&dice, [8, 3, 5]);
	let b = Rolled::from_dice_and_rolls(&dice, [8, 3, 5]);
	let c = Rolled::from_dice_and_rolls(&dice, [8, 3, 6]);
	assert_eq!(a, b);
	assert_ne!(a, c);
}

fn rolls_successfully_and_in_range(dice: &Dice) -> Rolled<'_> {
	let rolled = FastRand::default().roll(dice, Bias::NEUTRAL, true).unwrap();
	rolls_in_range(&rolled.rolls, dice.faces.len());
	rolled
}

fn rolls_in_range(rolls: &[DieRoll], sides: u16) {
	assert!(!rolls.iter().any(|roll| roll.val < 1 || roll.val > sides));
}
