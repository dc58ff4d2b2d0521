//! Dice operations (keep/drop, reroll, explode, clamps) and their related types.

use std::fmt;

use super::{roller::Roller, Error, Rolled};
use crate::sampler::Bias;

/// Maximum number of additional dice a single recursive reroll or explosion may add before it stops
pub const MAX_ADDITIONAL_ROLLS: usize = 1000;

/// Routines that can be applied to [`Dice`](super::Dice) to automatically manipulate resulting [`Rolled`] dice sets
/// from them as part of their rolling process.
///
/// [`DropHigh`](Self::DropHigh) and [`DropLow`](Self::DropLow) are convenience syntax only: normalizing a
/// [`DiceExpression`](crate::expr::DiceExpression) rewrites them in terms of keep operations, which is the only form
/// the percentile calculator understands. They can still be applied directly, with the same results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Operation {
	/// Rerolls (drops original and adds a newly-rolled die) dice that meet a condition.
	///
	/// # Examples
	///
	/// ## Reroll recursively (`rr`)
	/// ```
	/// use chimera::{dice::{operation::{Condition, Operation}, roller::{Iter as IterRoller, Roller}, Dice, Rolled}, sampler::Bias};
	///
	/// let dice = Dice::builder().count(4).sides(6).reroll(Condition::Eq(1), true).build();
	/// let premade_rolls = [3, 6, 1, 2, 1, 4];
	/// let mut rng = IterRoller::new(premade_rolls);
	///
	/// // Only the first four values are used for the initial roll, the rest are left for the rerolls
	/// let mut rolled = rng.roll(&dice, Bias::NEUTRAL, false)?;
	/// let rr1_op = Operation::Reroll {
	/// 	cond: Condition::Eq(1),
	/// 	recurse: true,
	/// };
	/// rr1_op.apply(&mut rolled, &mut rng, Bias::NEUTRAL)?;
	///
	/// // 4d6rr1[3, 6, 1 (d), 2, 1 (d), 4]
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[2].drop(rr1_op);
	/// expected.rolls[4].add(rr1_op);
	/// expected.rolls[4].drop(rr1_op);
	/// expected.rolls[5].add(rr1_op);
	/// assert_eq!(rolled, expected);
	/// # Ok::<(), chimera::dice::Error>(())
	/// ```
	Reroll {
		/// Condition that rolls must pass in order to be rerolled
		cond: Condition,

		/// Whether the reroll should be done repeatedly until the rerolled die no longer meets the condition
		recurse: bool,
	},

	/// Rerolls up to one die that meets a condition, keeping the original and adding the reroll alongside it.
	///
	/// # Examples
	/// ```
	/// use chimera::{dice::{operation::{Condition, Operation}, roller::{Iter as IterRoller, Roller}, Dice, Rolled}, sampler::Bias};
	///
	/// let dice = Dice::builder().count(3).sides(6).reroll_add(Condition::Eq(1)).build();
	/// let premade_rolls = [1, 4, 1, 5];
	/// let mut rng = IterRoller::new(premade_rolls);
	///
	/// let mut rolled = rng.roll(&dice, Bias::NEUTRAL, false)?;
	/// let ra1_op = Operation::RerollAdd { cond: Condition::Eq(1) };
	/// ra1_op.apply(&mut rolled, &mut rng, Bias::NEUTRAL)?;
	///
	/// // 3d6ra1[1, 4, 1, 5]
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[3].add(ra1_op);
	/// assert_eq!(rolled, expected);
	/// assert_eq!(rolled.total()?, 11);
	/// # Ok::<(), chimera::dice::Error>(())
	/// ```
	RerollAdd {
		/// Condition that a roll must pass in order to be rerolled
		cond: Condition,
	},

	/// Explodes (keeps original and adds an additional newly-rolled die) dice that meet a condition.
	///
	/// # Examples
	/// ```
	/// use chimera::{dice::{operation::Operation, roller::{Iter as IterRoller, Roller}, Dice, Rolled}, sampler::Bias};
	///
	/// let dice = Dice::builder().count(4).sides(6).explode(None, false).build();
	/// let premade_rolls = [3, 6, 1, 2, 6];
	/// let mut rng = IterRoller::new(premade_rolls);
	///
	/// let mut rolled = rng.roll(&dice, Bias::NEUTRAL, false)?;
	/// let xo_op = Operation::Explode {
	/// 	cond: None,
	/// 	recurse: false,
	/// };
	/// xo_op.apply(&mut rolled, &mut rng, Bias::NEUTRAL)?;
	///
	/// // 4d6xo[3, 6, 1, 2, 6]
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[4].add(xo_op);
	/// assert_eq!(rolled, expected);
	/// # Ok::<(), chimera::dice::Error>(())
	/// ```
	Explode {
		/// Condition that rolls must pass in order to explode.
		/// If `None`, the roll values must be equal to the number of sides of the dice being rolled.
		cond: Option<Condition>,

		/// Whether the explosion should be done repeatedly for any additional rolls that also meet the condition
		recurse: bool,
	},

	/// Keeps only the highest x dice, dropping the rest.
	///
	/// # Examples
	/// ```
	/// use chimera::{dice::{operation::Operation, roller::{Iter as IterRoller, Roller}, Dice, Rolled}, sampler::Bias};
	///
	/// let dice = Dice::builder().count(4).sides(6).keep_high(2).build();
	/// let premade_rolls = [3, 6, 1, 2];
	/// let mut rng = IterRoller::new(premade_rolls);
	///
	/// let mut rolled = rng.roll(&dice, Bias::NEUTRAL, false)?;
	/// let kh2_op = Operation::KeepHigh(2);
	/// kh2_op.apply(&mut rolled, &mut rng, Bias::NEUTRAL)?;
	///
	/// // 4d6kh2[3, 6, 1 (d), 2 (d)]
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[2].drop(kh2_op);
	/// expected.rolls[3].drop(kh2_op);
	/// assert_eq!(rolled, expected);
	/// # Ok::<(), chimera::dice::Error>(())
	/// ```
	KeepHigh(u8),

	/// Keeps only the lowest x dice, dropping the rest.
	KeepLow(u8),

	/// Drops the highest x dice, keeping the rest.
	DropHigh(u8),

	/// Drops the lowest x dice, keeping the rest.
	DropLow(u8),

	/// Replaces values of rolls lower than a minimum with the minimum.
	Min(u16),

	/// Replaces values of rolls higher than a maximum with the maximum.
	Max(u16),
}

impl Operation {
	/// Applies the operation to a set of rolls, using a given roller (and bias) if additional die rolls are needed.
	///
	/// # Errors
	/// If applying the operation would result in infinite additional die rolls, an error variant is returned.
	pub fn apply(self, rolled: &mut Rolled, rng: &mut impl Roller, bias: Bias) -> Result<(), Error> {
		match self {
			Self::Reroll { cond, recurse } => self.apply_reroll(rolled, rng, bias, cond, recurse)?,
			Self::RerollAdd { cond } => self.apply_reroll_add(rolled, rng, bias, cond),
			Self::Explode { cond, recurse } => self.apply_explode(rolled, rng, bias, cond, recurse)?,
			Self::KeepHigh(count) => self.apply_keep_high(rolled, count),
			Self::KeepLow(count) => self.apply_keep_low(rolled, count),
			Self::DropHigh(count) => self.apply_drop_high(rolled, count),
			Self::DropLow(count) => self.apply_drop_low(rolled, count),
			Self::Min(min) => self.apply_min(rolled, min),
			Self::Max(max) => self.apply_max(rolled, max),
		}

		Ok(())
	}

	/// Checks whether the operation would keep producing dice forever on dice with the given number of sides.
	#[must_use]
	pub const fn is_infinite_for(self, sides: u16) -> bool {
		match self {
			Self::Reroll { cond, recurse: true } => cond.matches_all(sides),
			Self::Explode {
				cond: Some(cond),
				recurse: true,
			} => cond.matches_all(sides),
			Self::Explode { cond: None, recurse: true } => sides == 1,
			_ => false,
		}
	}

	/// Indicates whether this is a keep or drop operation.
	#[must_use]
	pub const fn is_selection(self) -> bool {
		matches!(
			self,
			Self::KeepHigh(..) | Self::KeepLow(..) | Self::DropHigh(..) | Self::DropLow(..)
		)
	}

	/// Applies the [`Self::Reroll`] variant to a set of rolled dice.
	fn apply_reroll(
		self,
		rolled: &mut Rolled,
		rng: &mut impl Roller,
		bias: Bias,
		cond: Condition,
		recurse: bool,
	) -> Result<(), Error> {
		if self.is_infinite_for(rolled.dice.faces.len()) {
			return Err(Error::InfiniteRolls((*rolled.dice).clone()));
		}

		let mut added = 0;
		loop {
			// Determine which rolls qualify for reroll
			let mut to_reroll = rolled
				.rolls
				.iter_mut()
				.filter(|roll| roll.is_kept())
				.filter(|roll| cond.check(roll.val))
				.collect::<Vec<_>>();

			if to_reroll.is_empty() {
				break;
			}

			// Roll additional dice and drop the originals
			let mut rerolls = Vec::with_capacity(to_reroll.len());
			for roll in &mut to_reroll {
				let mut reroll = rng.roll_die(rolled.dice.faces.len(), bias);
				reroll.add(self);
				rerolls.push(reroll);
				roll.drop(self);
			}

			// Add the rerolls to the rolls
			added += rerolls.len();
			rolled.rolls.append(&mut rerolls);

			if !recurse {
				break;
			}
			if added >= MAX_ADDITIONAL_ROLLS {
				tracing::debug!(dice = %rolled.dice, added, "reroll stopped at the additional roll cap");
				break;
			}
		}

		Ok(())
	}

	/// Applies the [`Self::RerollAdd`] variant to a set of rolled dice.
	fn apply_reroll_add(self, rolled: &mut Rolled, rng: &mut impl Roller, bias: Bias, cond: Condition) {
		if rolled.rolls.iter().any(|roll| roll.is_kept() && cond.check(roll.val)) {
			let mut reroll = rng.roll_die(rolled.dice.faces.len(), bias);
			reroll.add(self);
			rolled.rolls.push(reroll);
		}
	}

	/// Applies the [`Self::Explode`] variant to a set of rolled dice.
	fn apply_explode(
		self,
		rolled: &mut Rolled,
		rng: &mut impl Roller,
		bias: Bias,
		cond: Option<Condition>,
		recurse: bool,
	) -> Result<(), Error> {
		let sides = rolled.dice.faces.len();
		if self.is_infinite_for(sides) {
			return Err(Error::InfiniteRolls((*rolled.dice).clone()));
		}

		let explodes = |val: u16| match cond {
			Some(cond) => cond.check(val),
			None => val == sides,
		};

		// Determine how many initial rolls qualify for explosion
		let mut to_explode = rolled
			.rolls
			.iter()
			.filter(|roll| roll.is_kept())
			.filter(|roll| explodes(roll.val))
			.count();

		let mut added = 0;
		loop {
			// Roll additional dice
			let mut explosions = Vec::with_capacity(to_explode);
			for _ in 0..to_explode {
				let mut roll = rng.roll_die(sides, bias);
				roll.add(self);
				explosions.push(roll);
			}
			added += explosions.len();

			// Determine how many additional rolls qualify for explosion
			to_explode = if recurse {
				explosions.iter().filter(|roll| explodes(roll.val)).count()
			} else {
				0
			};

			// Add the explosions to the rolls and finish if there are no further rolls to explode
			rolled.rolls.append(&mut explosions);
			if to_explode == 0 {
				break;
			}
			if added >= MAX_ADDITIONAL_ROLLS {
				tracing::debug!(dice = %rolled.dice, added, "explosion stopped at the additional roll cap");
				break;
			}
		}

		Ok(())
	}

	/// Applies the [`Self::KeepHigh`] variant to a set of rolled dice.
	fn apply_keep_high(self, rolled: &mut Rolled, count: u8) {
		let mut refs = rolled
			.rolls
			.iter_mut()
			.filter(|roll| roll.is_kept())
			.collect::<Vec<_>>();
		refs.sort();
		refs.reverse();
		refs.iter_mut().skip(count as usize).for_each(|roll| roll.drop(self));
	}

	/// Applies the [`Self::KeepLow`] variant to a set of rolled dice.
	fn apply_keep_low(self, rolled: &mut Rolled, count: u8) {
		let mut refs = rolled
			.rolls
			.iter_mut()
			.filter(|roll| roll.is_kept())
			.collect::<Vec<_>>();
		refs.sort();
		refs.iter_mut().skip(count as usize).for_each(|roll| roll.drop(self));
	}

	/// Applies the [`Self::DropHigh`] variant to a set of rolled dice.
	fn apply_drop_high(self, rolled: &mut Rolled, count: u8) {
		let mut refs = rolled
			.rolls
			.iter_mut()
			.filter(|roll| roll.is_kept())
			.collect::<Vec<_>>();
		refs.sort();
		refs.reverse();
		refs.iter_mut().take(count as usize).for_each(|roll| roll.drop(self));
	}

	/// Applies the [`Self::DropLow`] variant to a set of rolled dice.
	fn apply_drop_low(self, rolled: &mut Rolled, count: u8) {
		let mut refs = rolled
			.rolls
			.iter_mut()
			.filter(|roll| roll.is_kept())
			.collect::<Vec<_>>();
		refs.sort();
		refs.iter_mut().take(count as usize).for_each(|roll| roll.drop(self));
	}

	/// Applies the [`Self::Min`] variant to a set of rolled dice.
	fn apply_min(self, rolled: &mut Rolled, min: u16) {
		rolled
			.rolls
			.iter_mut()
			.filter(|roll| roll.is_kept() && roll.val < min)
			.for_each(|roll| roll.change(self, min));
	}

	/// Applies the [`Self::Max`] variant to a set of rolled dice.
	fn apply_max(self, rolled: &mut Rolled, max: u16) {
		rolled
			.rolls
			.iter_mut()
			.filter(|roll| roll.is_kept() && roll.val > max)
			.for_each(|roll| roll.change(self, max));
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Reroll { cond, recurse } => write!(f, "r{}{cond}", if *recurse { "r" } else { "o" }),
			Self::RerollAdd { cond } => write!(f, "ra{cond}"),
			Self::Explode { cond, recurse } => {
				write!(f, "x{}", if *recurse { "" } else { "o" })?;
				match cond {
					Some(cond) => write!(f, "{cond}"),
					None => Ok(()),
				}
			}
			Self::KeepHigh(count) => write!(f, "kh{count}"),
			Self::KeepLow(count) => write!(f, "kl{count}"),
			Self::DropHigh(count) => write!(f, "dh{count}"),
			Self::DropLow(count) => write!(f, "dl{count}"),
			Self::Min(min) => write!(f, "min{min}"),
			Self::Max(max) => write!(f, "max{max}"),
		}
	}
}

/// Test that die values can be checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "Unlikely to change, no logical fallback")]
pub enum Condition {
	/// Checks whether values are equal to its own value. Symbol: `=`
	Eq(u16),

	/// Checks whether values are greater than its own value. Symbol: `>`
	Gt(u16),

	/// Checks whether values are greater than or equal to its own value. Symbol: `>=`
	Gte(u16),

	/// Checks whether values are less than its own value. Symbol: `<`
	Lt(u16),

	/// Checks whether values are less than or equal to its own value. Symbol: `<=`
	Lte(u16),
}

impl Condition {
	/// Creates a condition from its corresponding symbol and a given value.
	///
	/// # Errors
	/// If the symbol doesn't match to a known condition variant, an error variant will be returned.
	pub fn from_symbol_and_val(symbol: &str, val: u16) -> Result<Self, Error> {
		Ok(match symbol {
			"=" => Self::Eq(val),
			">" => Self::Gt(val),
			">=" => Self::Gte(val),
			"<" => Self::Lt(val),
			"<=" => Self::Lte(val),
			_ => return Err(Error::UnknownCondition(symbol.to_owned())),
		})
	}

	/// Checks a value against the condition.
	#[must_use]
	pub const fn check(&self, val: u16) -> bool {
		match self {
			Self::Eq(expected) => val == *expected,
			Self::Gt(expected) => val > *expected,
			Self::Gte(expected) => val >= *expected,
			Self::Lt(expected) => val < *expected,
			Self::Lte(expected) => val <= *expected,
		}
	}

	/// Checks whether every face of a die with the given number of sides passes the condition.
	#[must_use]
	pub const fn matches_all(&self, sides: u16) -> bool {
		match self {
			Self::Eq(expected) => *expected == 1 && sides == 1,
			Self::Gt(expected) => *expected == 0,
			Self::Gte(expected) => *expected <= 1,
			Self::Lt(expected) => *expected > sides,
			Self::Lte(expected) => *expected >= sides,
		}
	}

	/// Gets the symbol that represents the condition.
	#[must_use]
	pub const fn symbol(&self) -> &'static str {
		match self {
			Self::Eq(..) => "=",
			Self::Gt(..) => ">",
			Self::Gte(..) => ">=",
			Self::Lt(..) => "<",
			Self::Lte(..) => "<=",
		}
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}{}",
			self.symbol(),
			match self {
				Self::Eq(expected)
				| Self::Gt(expected)
				| Self::Gte(expected)
				| Self::Lt(expected)
				| Self::Lte(expected) => expected,
			}
		)
	}
}
