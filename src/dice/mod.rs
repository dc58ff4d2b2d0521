//! All functionality for directly creating dice, rolling them, and working with their resulting rolls.
//!
//! This is the home of the dice "primitives". For a full expression with flat modifiers and a label, see
//! [`DiceExpression`].
//!
//! [`DiceExpression`]: crate::expr::DiceExpression

pub mod operation;
pub mod roller;

use std::{borrow::Cow, cmp, fmt};

use self::operation::Condition;
pub use self::{operation::Operation, roller::Roller};
use crate::expr::Describe;

/// Maximum number of dice in a single term
pub const MAX_DICE: u8 = 100;

/// Maximum number of sides on a numeric die
pub const MAX_SIDES: u16 = 1000;

/// Faces of a Fallout damage die, in die order
pub const FALLOUT_FACES: [FalloutFace; 6] = [
	FalloutFace::new(1, false),
	FalloutFace::new(2, false),
	FalloutFace::new(0, false),
	FalloutFace::new(0, false),
	FalloutFace::new(1, true),
	FalloutFace::new(1, true),
];

/// Set of faces every die in a [`Dice`] term is rolled from.
///
/// Symbolic face sets are stored in [`DieRoll`]s by their 1-based face index, so every die of every kind is rolled
/// the same way (`1..=len`) and interpreted afterwards with [`Faces::value()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_enums, reason = "Closed set of supported die kinds")]
pub enum Faces {
	/// Ordinary die numbered `1..=sides`
	Numeric(u16),

	/// Fudge/Fate die with faces `-1`, `0`, and `+1`
	Fudge,

	/// Fallout damage die (see [`FALLOUT_FACES`])
	Fallout,
}

impl Faces {
	/// Number of distinct faces on one die.
	#[must_use]
	pub const fn len(self) -> u16 {
		match self {
			Self::Numeric(sides) => sides,
			Self::Fudge => 3,
			Self::Fallout => 6,
		}
	}

	/// Whether the face set is anything other than a numbered die.
	#[must_use]
	#[inline]
	pub const fn is_symbolic(self) -> bool {
		!matches!(self, Self::Numeric(..))
	}

	/// Checks whether a rolled face index belongs to this face set.
	#[must_use]
	#[inline]
	pub const fn contains(self, val: u16) -> bool {
		val >= 1 && val <= self.len()
	}

	/// Numeric value a rolled face index contributes to a total.
	///
	/// # Examples
	/// ```
	/// use chimera::dice::Faces;
	///
	/// assert_eq!(Faces::Numeric(20).value(17), 17);
	/// assert_eq!(Faces::Fudge.value(1), -1);
	/// assert_eq!(Faces::Fudge.value(3), 1);
	/// assert_eq!(Faces::Fallout.value(2), 2);
	/// ```
	#[must_use]
	pub fn value(self, val: u16) -> i32 {
		match self {
			Self::Numeric(..) => i32::from(val),
			Self::Fudge => i32::from(val) - 2,
			Self::Fallout => FALLOUT_FACES
				.get(usize::from(val).saturating_sub(1))
				.map_or(0, |face| i32::from(face.damage)),
		}
	}

	/// Text shown for a rolled face index.
	#[must_use]
	pub fn label(self, val: u16) -> String {
		match self {
			Self::Numeric(..) => val.to_string(),
			Self::Fudge => match self.value(val) {
				1 => "+".to_owned(),
				-1 => "-".to_owned(),
				_ => "0".to_owned(),
			},
			Self::Fallout => FALLOUT_FACES
				.get(usize::from(val).saturating_sub(1))
				.map_or_else(|| "?".to_owned(), ToString::to_string),
		}
	}
}

impl fmt::Display for Faces {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Numeric(sides) => write!(f, "{sides}"),
			Self::Fudge => f.write_str("F"),
			Self::Fallout => f.write_str("D"),
		}
	}
}

/// A single face of a Fallout damage die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct FalloutFace {
	/// Damage the face deals
	pub damage: u8,

	/// Whether the face also triggers an effect
	pub effect: bool,
}

impl FalloutFace {
	/// Creates a face description.
	#[must_use]
	pub const fn new(damage: u8, effect: bool) -> Self {
		Self { damage, effect }
	}
}

impl fmt::Display for FalloutFace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.damage, if self.effect { "E" } else { "" })
	}
}

/// A set of one or more rollable dice sharing a face set, along with a collection of operations to apply to any
/// resulting rolls from them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct Dice {
	/// Number of dice to roll
	pub count: u8,

	/// Faces of each die
	pub faces: Faces,

	/// Operations to automatically apply to rolls from this set of dice, in order
	pub operations: Vec<Operation>,
}

impl Dice {
	/// Creates a new set of numeric dice with a given count and number of sides.
	#[must_use]
	pub const fn new(count: u8, sides: u16) -> Self {
		Self::with_faces(count, Faces::Numeric(sides))
	}

	/// Creates a new set of dice with a given count and face set.
	#[must_use]
	pub const fn with_faces(count: u8, faces: Faces) -> Self {
		Self {
			count,
			faces,
			operations: Vec::new(),
		}
	}

	/// Creates a new dice builder.
	#[must_use]
	#[inline]
	pub fn builder() -> Builder {
		Builder::default()
	}
}

impl Default for Dice {
	/// Creates the default dice (1d20).
	#[inline]
	fn default() -> Self {
		Self::new(1, 20)
	}
}

impl fmt::Display for Dice {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{}d{}{}",
			self.count,
			self.faces,
			self.operations.iter().map(ToString::to_string).collect::<String>()
		)
	}
}

/// Single die produced from rolling [`Dice`] and optionally applying [`Operation`]s
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct DieRoll {
	/// Face that was rolled (the face index for symbolic face sets)
	pub val: u16,

	/// Operation that caused the addition of this die, if any
	pub added_by: Option<Operation>,

	/// Operation that caused the drop of this die, if any
	pub dropped_by: Option<Operation>,

	/// Modifications that were made to the value of the roll
	pub changes: Vec<ValChange>,
}

impl DieRoll {
	/// Marks this die roll as added by a given operation, setting [`Self::added_by`].
	///
	/// # Panics
	/// Panics if `Self::added_by` is already [`Some`].
	pub fn add(&mut self, from: Operation) {
		assert!(
			self.added_by.is_none(),
			"marking a die as added that has already been marked as added by another operation"
		);
		self.added_by = Some(from);
	}

	/// Marks this die roll as dropped by a given operation, setting [`Self::dropped_by`].
	///
	/// # Panics
	/// Panics if `Self::dropped_by` is already [`Some`].
	pub fn drop(&mut self, from: Operation) {
		assert!(
			self.dropped_by.is_none(),
			"marking a die as dropped that has already been marked as dropped by another operation"
		);
		self.dropped_by = Some(from);
	}

	/// Replaces the die roll's value and logs the change made.
	pub fn change(&mut self, from: Operation, new_val: u16) {
		self.changes.push(ValChange {
			before: self.val,
			after: new_val,
			cause: from,
		});
		self.val = new_val;
	}

	/// Indicates whether this die roll was part of the original set (not added by an operation).
	#[must_use]
	#[inline]
	pub const fn is_original(&self) -> bool {
		self.added_by.is_none()
	}

	/// Indicates whether this die roll was added as the result of an operation being applied.
	/// This is the direct inverse of [`DieRoll::is_original()`].
	#[must_use]
	#[inline]
	pub const fn is_additional(&self) -> bool {
		self.added_by.is_some()
	}

	/// Indicates whether this die roll has been dropped by an operation.
	#[must_use]
	#[inline]
	pub const fn is_dropped(&self) -> bool {
		self.dropped_by.is_some()
	}

	/// Indicates whether this die roll is being kept (has *not* been dropped by an operation).
	/// This is the direct inverse of [`DieRoll::is_dropped()`].
	#[must_use]
	#[inline]
	pub const fn is_kept(&self) -> bool {
		self.dropped_by.is_none()
	}

	/// Indicates whether this die roll's value has been directly changed by an operation.
	#[must_use]
	#[inline]
	pub fn is_changed(&self) -> bool {
		!self.changes.is_empty()
	}

	/// Creates a new die roll with the given value.
	#[must_use]
	pub const fn new(val: u16) -> Self {
		Self {
			val,
			added_by: None,
			dropped_by: None,
			changes: Vec::new(),
		}
	}

	/// Describes the roll using the text of its face within a face set, along with the same markers as
	/// [`DieRoll::fmt()`].
	///
	/// [`DieRoll::fmt()`]: ./struct.DieRoll.html#method.fmt
	#[must_use]
	pub fn describe_face(&self, faces: Faces) -> String {
		format!(
			"{}{}{}",
			faces.label(self.val),
			if self.is_changed() { " (m)" } else { "" },
			if self.is_dropped() { " (d)" } else { "" }
		)
	}
}

impl PartialOrd for DieRoll {
	fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for DieRoll {
	fn cmp(&self, other: &Self) -> cmp::Ordering {
		self.val.cmp(&other.val)
	}
}

impl fmt::Display for DieRoll {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The format of a die roll is simply the plain numeric value of the roll.
	/// If the roll was changed, it is appended with ` (m)`. If it was dropped, it is appended with ` (d)`.
	///
	/// # Examples
	/// ```
	/// use chimera::dice::DieRoll;
	///
	/// let roll = DieRoll::new(4);
	/// assert_eq!(roll.to_string(), "4");
	/// ```
	///
	/// ```
	/// use chimera::dice::{DieRoll, Operation};
	///
	/// let mut roll = DieRoll::new(16);
	/// roll.drop(Operation::KeepHigh(1));
	/// assert_eq!(roll.to_string(), "16 (d)");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}{}{}",
			self.val,
			if self.is_changed() { " (m)" } else { "" },
			if self.is_dropped() { " (d)" } else { "" }
		)
	}
}

/// Details about a modification made to a [`DieRoll`] as a result of an [`Operation`] being applied to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct ValChange {
	/// Roll value before the change was made
	pub before: u16,

	/// Roll value after the change was made
	pub after: u16,

	/// Operation that caused the change
	pub cause: Operation,
}

/// Representation of the result from rolling [`Dice`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct Rolled<'a> {
	/// Each individual die roll that was made
	pub rolls: Vec<DieRoll>,

	/// Dice that were rolled to produce this
	pub dice: Cow<'a, Dice>,
}

impl Rolled<'_> {
	/// Calculates the total of all kept roll values, interpreted through the dice's face set.
	///
	/// # Errors
	/// If there is an integer overflow while summing the die rolls, an error variant is returned.
	///
	/// # Examples
	/// ```
	/// use chimera::{dice::{roller::{FastRand as FastRandRoller, Roller}, Dice}, sampler::Bias};
	///
	/// let dice = Dice::new(4, 8);
	/// let rolled = FastRandRoller::default().roll(&dice, Bias::NEUTRAL, true)?;
	/// let total = rolled.total()?;
	/// assert_eq!(total, rolled.rolls.iter().map(|roll| i32::from(roll.val)).sum::<i32>());
	/// # Ok::<(), chimera::dice::Error>(())
	/// ```
	pub fn total(&self) -> Result<i32, Error> {
		let mut sum: i32 = 0;

		// Sum all rolls that haven't been dropped
		for r in self.rolls.iter().filter(|roll| roll.is_kept()) {
			sum = sum
				.checked_add(self.dice.faces.value(r.val))
				.ok_or_else(|| Error::Overflow(self.clone().into_owned()))?;
		}

		Ok(sum)
	}

	/// Counts the kept Fallout faces that trigger an effect. Always zero for other face sets.
	#[must_use]
	pub fn effects(&self) -> usize {
		if self.dice.faces != Faces::Fallout {
			return 0;
		}

		self.rolls
			.iter()
			.filter(|roll| roll.is_kept())
			.filter_map(|roll| FALLOUT_FACES.get(usize::from(roll.val).saturating_sub(1)))
			.filter(|face| face.effect)
			.count()
	}

	/// Finds the first roll whose face lies outside of the dice's face set, if any.
	#[must_use]
	pub fn out_of_domain(&self) -> Option<&DieRoll> {
		self.rolls.iter().find(|roll| !self.dice.faces.contains(roll.val))
	}

	/// Moves all of self's owned data into a new instance and clones any unowned data in order to create a `'static`
	/// instance of self.
	#[must_use]
	pub fn into_owned(self) -> Rolled<'static> {
		Rolled {
			rolls: self.rolls,
			dice: Cow::Owned(self.dice.into_owned()),
		}
	}

	/// Creates a new rolled set of dice from a given set of dice and an iterator of values.
	#[must_use]
	pub fn from_dice_and_rolls(dice: &Dice, rolls: impl IntoIterator<Item = u16>) -> Rolled {
		Rolled {
			rolls: rolls.into_iter().map(DieRoll::new).collect(),
			dice: Cow::Borrowed(dice),
		}
	}
}

impl Describe for Rolled<'_> {
	/// Builds a string of the dice the roll is from and a list of all of the individual rolled dice
	/// (see [`DieRoll::describe_face()`]).
	///
	/// If `list_limit` is specified and there are more rolls than it, the list of rolled dice will be truncated and
	/// appended with "X more..." (where X is the remaining roll count past the max).
	///
	/// # Examples
	/// ```
	/// use std::borrow::Cow;
	/// use chimera::{dice::{Dice, DieRoll, Rolled}, expr::Describe};
	///
	/// let dice = Dice::builder().count(4).sides(6).keep_high(2).build();
	/// let kh_op = dice.operations[0];
	/// let rolled = Rolled {
	/// 	rolls: vec![
	/// 		DieRoll::new(6),
	/// 		{
	/// 			let mut roll = DieRoll::new(2);
	/// 			roll.drop(kh_op);
	/// 			roll
	/// 		},
	/// 		DieRoll::new(5),
	/// 		{
	/// 			let mut roll = DieRoll::new(3);
	/// 			roll.drop(kh_op);
	/// 			roll
	/// 		},
	/// 	],
	/// 	dice: Cow::Borrowed(&dice),
	/// };
	///
	/// assert_eq!(rolled.describe(None), "4d6kh2[6, 2 (d), 5, 3 (d)]");
	/// assert_eq!(rolled.describe(Some(2)), "4d6kh2[6, 2 (d), 2 more...]");
	/// ```
	fn describe(&self, list_limit: Option<usize>) -> String {
		let list_limit = list_limit.unwrap_or(usize::MAX);
		let total_rolls = self.rolls.len();
		let truncated_rolls = total_rolls.saturating_sub(list_limit);

		format!(
			"{}[{}{}]",
			self.dice,
			self.rolls
				.iter()
				.take(list_limit)
				.map(|roll| roll.describe_face(self.dice.faces))
				.collect::<Vec<_>>()
				.join(", "),
			if truncated_rolls > 0 {
				format!(", {truncated_rolls} more...")
			} else {
				String::new()
			}
		)
	}
}

impl fmt::Display for Rolled<'_> {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is equivalent to calling [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

/// An error resulting from a dice operation
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// There was an integer overflow when performing mathematical operations on roll values.
	/// This normally should not ever happen given the types used for die counts, sides, and totals.
	#[error("integer overflow")]
	Overflow(Rolled<'static>),

	/// Rolling the dice specified would result in infinite rolls.
	///
	/// # Examples
	/// ```
	/// use chimera::{dice::{roller::{FastRand as FastRandRoller, Roller}, Dice, Error}, sampler::Bias};
	///
	/// let dice = Dice::builder().count(4).sides(1).explode(None, true).build();
	/// assert!(matches!(FastRandRoller::default().roll(&dice, Bias::NEUTRAL, true), Err(Error::InfiniteRolls(..))));
	/// ```
	#[error("{0} would result in infinite rolls")]
	InfiniteRolls(Dice),

	/// The provided symbol doesn't match to a known condition.
	///
	/// # Examples
	/// ```
	/// use chimera::dice::{operation::Condition, Error};
	///
	/// let cond = Condition::from_symbol_and_val("!", 4);
	/// assert!(matches!(cond, Err(Error::UnknownCondition(..))));
	/// ```
	#[error("unknown condition symbol: {0}")]
	UnknownCondition(String),
}

/// Builds [`Dice`] with a fluent interface.
///
/// # Examples
///
/// ## Basic dice
/// ```
/// use chimera::Dice;
///
/// let dice = Dice::builder().count(2).sides(6).build();
/// assert_eq!(dice, Dice::new(2, 6));
/// ```
///
/// ## Multiple operations
/// ```
/// use chimera::dice::{operation::{Condition, Operation}, Dice, Faces};
///
/// let dice = Dice::builder()
/// 	.count(6)
/// 	.sides(8)
/// 	.reroll(Condition::Eq(1), false)
/// 	.keep_high(4)
/// 	.build();
/// assert_eq!(
/// 	dice,
/// 	Dice {
/// 		count: 6,
/// 		faces: Faces::Numeric(8),
/// 		operations: vec![
/// 			Operation::Reroll {
/// 				cond: Condition::Eq(1),
/// 				recurse: false
/// 			},
/// 			Operation::KeepHigh(4),
/// 		],
/// 	},
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder(Dice);

impl Builder {
	/// Sets the number of dice to roll.
	#[must_use]
	pub const fn count(mut self, count: u8) -> Self {
		self.0.count = count;
		self
	}

	/// Sets the number of sides per (numeric) die.
	#[must_use]
	pub const fn sides(mut self, sides: u16) -> Self {
		self.0.faces = Faces::Numeric(sides);
		self
	}

	/// Sets the face set of the dice.
	#[must_use]
	pub const fn faces(mut self, faces: Faces) -> Self {
		self.0.faces = faces;
		self
	}

	/// Adds a reroll operation to the dice.
	#[must_use]
	pub fn reroll(mut self, cond: Condition, recurse: bool) -> Self {
		self.0.operations.push(Operation::Reroll { cond, recurse });
		self
	}

	/// Adds a reroll-and-add operation to the dice.
	#[must_use]
	pub fn reroll_add(mut self, cond: Condition) -> Self {
		self.0.operations.push(Operation::RerollAdd { cond });
		self
	}

	/// Adds an exploding operation to the dice.
	#[must_use]
	pub fn explode(mut self, cond: Option<Condition>, recurse: bool) -> Self {
		self.0.operations.push(Operation::Explode { cond, recurse });
		self
	}

	/// Adds a keep highest operation to the dice.
	#[must_use]
	pub fn keep_high(mut self, count: u8) -> Self {
		self.0.operations.push(Operation::KeepHigh(count));
		self
	}

	/// Adds a keep lowest operation to the dice.
	#[must_use]
	pub fn keep_low(mut self, count: u8) -> Self {
		self.0.operations.push(Operation::KeepLow(count));
		self
	}

	/// Adds a drop highest operation to the dice.
	#[must_use]
	pub fn drop_high(mut self, count: u8) -> Self {
		self.0.operations.push(Operation::DropHigh(count));
		self
	}

	/// Adds a drop lowest operation to the dice.
	#[must_use]
	pub fn drop_low(mut self, count: u8) -> Self {
		self.0.operations.push(Operation::DropLow(count));
		self
	}

	/// Adds a minimum operation to the dice.
	#[must_use]
	pub fn min(mut self, min: u16) -> Self {
		self.0.operations.push(Operation::Min(min));
		self
	}

	/// Adds a maximum operation to the dice.
	#[must_use]
	pub fn max(mut self, max: u16) -> Self {
		self.0.operations.push(Operation::Max(max));
		self
	}

	/// Finalizes the dice.
	#[must_use]
	pub fn build(self) -> Dice {
		self.0
	}
}
