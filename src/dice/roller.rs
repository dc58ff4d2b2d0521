//! Abstractions for rolling [`DieRoll`]s using various means.

use std::{borrow::Cow, iter::Peekable};

use fastrand::Rng;

use super::{Dice, DieRoll, Error, Faces, Rolled};
use crate::sampler::{self, Bias};

/// Rolls dice - what else is there to say?
///
/// Every roller receives the [`Bias`] the roll is made under. Rollers that produce predetermined values (for tests
/// and forced results) are free to ignore it.
pub trait Roller {
	/// Rolls a single die with faces `1..=sides`.
	#[must_use]
	fn roll_die(&mut self, sides: u16, bias: Bias) -> DieRoll;

	/// Rolls `count` fudge dice at once, returning face indices (`1` = `-`, `2` = `0`, `3` = `+`).
	///
	/// The default implementation rolls each die independently with [`Self::roll_die()`].
	#[must_use]
	fn roll_fudge(&mut self, count: u8, bias: Bias) -> Vec<DieRoll> {
		(0..count).map(|_| self.roll_die(Faces::Fudge.len(), bias)).collect()
	}

	/// Rolls a set of dice and optionally applies all of its operations to the rolls.
	///
	/// Fallout dice are always rolled without bias.
	///
	/// # Errors
	/// If any errors are encountered while applying the dice's operations, an error variant is returned.
	fn roll<'d, 'r>(&mut self, dice: &'d Dice, bias: Bias, apply_ops: bool) -> Result<Rolled<'r>, Error>
	where
		'd: 'r,
		Self: Sized,
	{
		// Roll the dice!
		let rolls: Vec<DieRoll> = match dice.faces {
			Faces::Numeric(sides) => (0..dice.count).map(|_| self.roll_die(sides, bias)).collect(),
			Faces::Fudge => self.roll_fudge(dice.count, bias),
			Faces::Fallout => (0..dice.count)
				.map(|_| self.roll_die(Faces::Fallout.len(), Bias::NEUTRAL))
				.collect(),
		};

		let mut rolled = Rolled {
			rolls,
			dice: Cow::Borrowed(dice),
		};

		// Apply all of the dice's operations
		if apply_ops {
			for operation in &dice.operations {
				operation.apply(&mut rolled, self, bias)?;
			}
		}

		Ok(rolled)
	}
}

/// Generates rolls with random values using [fastrand], weighted by the roll's [`Bias`] (see [`crate::sampler`]).
///
/// # Examples
///
/// ## Default fastrand roller
/// ```
/// use chimera::{dice::{roller::{FastRand as FastRandRoller, Roller}, Dice}, sampler::Bias};
///
/// let mut roller = FastRandRoller::default();
///
/// let dice = Dice::new(4, 6);
/// let _ = roller.roll(&dice, Bias::NEUTRAL, true)?;
/// let _ = roller.roll(&dice, Bias::new(0.5), true)?;
/// # Ok::<(), chimera::dice::Error>(())
/// ```
///
/// ## Manually seeded fastrand roller
/// ```
/// use chimera::{dice::{roller::{FastRand as FastRandRoller, Roller}, Dice}, sampler::Bias};
///
/// let mut roller = FastRandRoller::with_seed(0x750c38d574400);
///
/// let dice = Dice::new(4, 6);
/// let _ = roller.roll(&dice, Bias::NEUTRAL, true)?;
/// # Ok::<(), chimera::dice::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FastRand(Rng);

impl FastRand {
	/// Creates a new fastrand roller that uses the given RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub const fn new(rng: Rng) -> Self {
		Self(rng)
	}

	/// Creates a new fastrand roller that uses a pre-seeded RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub fn with_seed(seed: u64) -> Self {
		Self(Rng::with_seed(seed))
	}
}

impl Roller for FastRand {
	/// Rolls a single die using the [`fastrand::Rng`] the roller was created with.
	#[inline]
	fn roll_die(&mut self, sides: u16, bias: Bias) -> DieRoll {
		DieRoll::new(sampler::sample_face(&mut self.0, sides, bias))
	}

	/// Rolls fudge dice by sampling their biased sum first and then generating faces that add up to it.
	fn roll_fudge(&mut self, count: u8, bias: Bias) -> Vec<DieRoll> {
		sampler::sample_fudge(&mut self.0, count, bias)
			.into_iter()
			.map(|face| DieRoll::new(fudge_index(face)))
			.collect()
	}
}

/// Converts a fudge face (`-1`, `0`, `1`) to its face index.
const fn fudge_index(face: i8) -> u16 {
	if face < 0 {
		1
	} else if face == 0 {
		2
	} else {
		3
	}
}

/// Generates rolls that always have a specific value.
///
/// # Examples
/// ```
/// use chimera::{dice::{roller::{Roller, Val as ValRoller}, Dice}, sampler::Bias};
///
/// let mut roller = ValRoller(4);
///
/// let dice = Dice::new(4, 6);
/// let rolled = roller.roll(&dice, Bias::NEUTRAL, true)?;
/// assert!(rolled.rolls.iter().all(|roll| roll.val == 4));
/// # Ok::<(), chimera::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Val(pub u16);

impl Roller for Val {
	/// Rolls a single die, always with one specific value.
	#[inline]
	fn roll_die(&mut self, _sides: u16, _bias: Bias) -> DieRoll {
		DieRoll::new(self.0)
	}
}

/// Generates rolls that always have their max value.
///
/// # Examples
/// ```
/// use chimera::{dice::{roller::{Max as MaxRoller, Roller}, Dice}, sampler::Bias};
///
/// let mut roller = MaxRoller;
///
/// let dice = Dice::new(2, 20);
/// let rolled = roller.roll(&dice, Bias::NEUTRAL, true)?;
/// assert!(rolled.rolls.iter().all(|roll| roll.val == 20));
/// # Ok::<(), chimera::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Max;

impl Roller for Max {
	/// Rolls a single die, always with the max value (same as the number of sides).
	#[inline]
	fn roll_die(&mut self, sides: u16, _bias: Bias) -> DieRoll {
		DieRoll::new(sides)
	}
}

/// Generates rolls from an iterator of values. Mainly useful for testing purposes and for forcing faces.
///
/// # Examples
/// ```
/// use chimera::{dice::{roller::{Iter as IterRoller, Roller}, Dice, DieRoll}, sampler::Bias};
///
/// let mut roller = IterRoller::new(vec![1, 2, 3, 4, 6]);
/// let dice = Dice::new(5, 6);
/// assert_eq!(
/// 	roller.roll(&dice, Bias::NEUTRAL, true)?.rolls,
/// 	vec![DieRoll::new(1), DieRoll::new(2), DieRoll::new(3), DieRoll::new(4), DieRoll::new(6)]
/// );
/// # Ok::<(), chimera::dice::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Iter<I: Iterator<Item = u16>>(Peekable<I>);

impl<I: Iterator<Item = u16>> Iter<I> {
	/// Checks whether the iterator still has values available.
	#[inline]
	pub fn can_roll(&mut self) -> bool {
		self.0.peek().is_some()
	}

	/// Creates a new roller that uses the given iterator to provide roll values.
	#[must_use]
	#[inline]
	pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
		Self(iter.into_iter().peekable())
	}
}

impl<I: Iterator<Item = u16>> Roller for Iter<I> {
	/// Rolls a die with the value from the next iteration.
	///
	/// # Panics
	/// If the iterator has finished, this will panic.
	#[inline]
	#[expect(
		clippy::expect_used,
		reason = "Mostly for testing, otherwise manual checking of can_roll() is expected"
	)]
	fn roll_die(&mut self, _sides: u16, _bias: Bias) -> DieRoll {
		DieRoll::new(self.0.next().expect("iterator is finished"))
	}
}
