//! Rolling full expressions into structured [`RollResult`]s and rendering them.

use std::fmt;

use crate::{
	dice::{DieRoll, Faces, Roller},
	error::{Error, InternalInconsistency},
	expr::DiceExpression,
	percentile,
	sampler::Bias,
	variant::RollShape,
};

/// How a roll turned out, carrying exactly the details its case needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Outcome {
	/// Nothing special happened.
	Normal,

	/// Every fudge die landed on the same non-blank face, adding a bonus of half the dice (rounded up) in that
	/// direction.
	Swept {
		/// Signed bonus added to the total
		bonus: i32,
	},

	/// Fallout damage dice, some of which may trigger effects.
	Damage {
		/// Number of effect faces rolled
		effects: usize,
	},

	/// A single d10 came up 10 and one extra d10 was added.
	Exploded {
		/// Face of the extra die
		extra: u16,
	},

	/// A single d10 came up 1 and one extra d10 was subtracted.
	Imploded {
		/// Face of the extra die
		extra: u16,

		/// Total the roll would have had without the penalty (`1 + modifier`)
		alt_total: i32,
	},

	/// A d6 pool showed two or more sixes and earned a bonus.
	Critical {
		/// Number of sixes rolled
		sixes: usize,

		/// Bonus added to the total
		bonus: i32,
	},
}

/// Result of rolling an expression. Never modified after it's produced by the engine.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct RollResult {
	/// Expression that was rolled
	pub expression: DiceExpression,

	/// Every die rolled for the dice term, including dropped and added ones
	pub rolls: Vec<DieRoll>,

	/// Final total, including flat modifiers and any bonus or penalty
	pub total: i32,

	/// Rank of the dice total in its theoretical distribution, in `[0, 100]`
	pub percentile: f64,

	/// Shape of the expression
	pub shape: RollShape,

	/// What happened
	pub outcome: Outcome,
}

impl RollResult {
	/// Faces of the kept dice, interpreted through the dice's face set.
	#[must_use]
	pub fn kept_values(&self) -> Vec<i32> {
		let faces = self.expression.dice.faces;
		self.rolls
			.iter()
			.filter(|roll| roll.is_kept())
			.map(|roll| faces.value(roll.val))
			.collect()
	}

	/// Total of the kept dice and flat modifiers, without any bonus or penalty.
	#[must_use]
	pub fn base_total(&self) -> i32 {
		match self.outcome {
			Outcome::Swept { bonus } | Outcome::Critical { bonus, .. } => self.total - bonus,
			Outcome::Exploded { extra } => self.total - i32::from(extra),
			Outcome::Imploded { extra, .. } => self.total + i32::from(extra),
			Outcome::Normal | Outcome::Damage { .. } => self.total,
		}
	}

	/// Comma-separated faces of every rolled die.
	fn face_list(&self) -> String {
		let faces = self.expression.dice.faces;
		self.rolls
			.iter()
			.map(|roll| roll.describe_face(faces))
			.collect::<Vec<_>>()
			.join(", ")
	}
}

impl fmt::Display for RollResult {
	/// Renders the result in the fixed display format for its outcome, e.g. `1d20 (14) +5 = 19` or
	/// `1d10 (10->10!+3) +5 = 18`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let dice = &self.expression.dice;
		let modifier = modifier_clause(self.expression.modifier_total());
		let total = self.total;

		match self.outcome {
			Outcome::Normal => write!(f, "{dice} ({}){modifier} = {total}", self.face_list()),
			Outcome::Swept { bonus } => write!(
				f,
				"{dice} ({}) {bonus:+} ({}){modifier} = {total}",
				self.face_list(),
				if bonus > 0 { "all +" } else { "all -" }
			),
			Outcome::Damage { effects } => write!(
				f,
				"{dice} ({}){modifier} = {total} ({effects} effects)",
				self.face_list()
			),
			Outcome::Exploded { extra } => write!(f, "{dice} (10->10!+{extra}){modifier} = {total}"),
			Outcome::Imploded { extra, alt_total } => {
				let modifier_total = self.expression.modifier_total();
				let breakdown = if modifier_total >= 0 {
					format!("1+{modifier_total}")
				} else {
					format!("1{modifier_total}")
				};
				write!(
					f,
					"{dice} (1->1!-{extra}){modifier} = {total} [Luck? **{alt_total}** ({breakdown})]"
				)
			}
			Outcome::Critical { bonus, .. } => {
				let faces = self
					.rolls
					.iter()
					.map(|roll| {
						if roll.val == 6 {
							"**6**".to_owned()
						} else {
							roll.to_string()
						}
					})
					.collect::<Vec<_>>()
					.join(", ");
				write!(
					f,
					"{dice} ({faces}){modifier} = {} **{bonus:+}** = **{total}** Critical Damage",
					self.base_total()
				)
			}
		}
	}
}

/// Rolls an expression under a bias, without any rule variants.
///
/// Fudge dice that all land on `+` (or all on `-`) earn the sweep bonus. The percentile ranks the dice total alone,
/// before flat modifiers and bonuses.
///
/// # Errors
/// If a die lands outside of its face set, the total overflows, the percentile is out of range, or the dice would
/// roll forever, an [`Error::Internal`] is returned (and logged).
///
/// # Examples
/// ```
/// use chimera::{dice::roller::Iter as IterRoller, parse, roll::{self, Outcome}, sampler::Bias};
///
/// let expr = parse::expression("1d20+5")?;
/// let result = roll::roll(&expr, Bias::NEUTRAL, &mut IterRoller::new([14]))?;
/// assert_eq!(result.total, 19);
/// assert_eq!(result.outcome, Outcome::Normal);
/// assert_eq!(result.to_string(), "1d20 (14) +5 = 19");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn roll(expr: &DiceExpression, bias: Bias, roller: &mut impl Roller) -> Result<RollResult, Error> {
	let rolled = roller.roll(&expr.dice, bias, true)?;
	if let Some(bad) = rolled.out_of_domain() {
		return Err(Error::internal(InternalInconsistency::FaceOutOfDomain {
			face: bad.val,
			dice: expr.dice.to_string(),
		}));
	}

	let dice_total = rolled.total()?;
	let outcome = match expr.dice.faces {
		Faces::Fudge => {
			sweep_bonus(&rolled.rolls, expr.dice.count).map_or(Outcome::Normal, |bonus| Outcome::Swept { bonus })
		}
		Faces::Fallout => Outcome::Damage {
			effects: rolled.effects(),
		},
		Faces::Numeric(..) => Outcome::Normal,
	};
	let bonus = match outcome {
		Outcome::Swept { bonus } => bonus,
		_ => 0,
	};

	let total = dice_total
		.checked_add(bonus)
		.and_then(|total| total.checked_add(expr.modifier_total()))
		.ok_or_else(|| Error::internal(InternalInconsistency::Overflow(expr.to_string())))?;
	let percentile = checked_percentile(percentile::dice_percentile(dice_total, &expr.dice), dice_total, expr)?;

	Ok(RollResult {
		expression: expr.clone(),
		rolls: rolled.rolls,
		total,
		percentile,
		shape: expr.shape(),
		outcome,
	})
}

/// Rolls one numeric die outside of any dice term and makes sure it landed on one of its faces.
pub(crate) fn roll_checked_die(roller: &mut impl Roller, sides: u16, bias: Bias) -> Result<u16, Error> {
	let roll = roller.roll_die(sides, bias);
	if !Faces::Numeric(sides).contains(roll.val) {
		return Err(Error::internal(InternalInconsistency::FaceOutOfDomain {
			face: roll.val,
			dice: format!("1d{sides}"),
		}));
	}
	Ok(roll.val)
}

/// Makes sure a percentile is within `[0, 100]`.
pub(crate) fn checked_percentile(percentile: f64, total: i32, expr: &DiceExpression) -> Result<f64, Error> {
	if (0.0..=100.0).contains(&percentile) {
		Ok(percentile)
	} else {
		Err(Error::internal(InternalInconsistency::PercentileOutOfRange {
			percentile,
			total,
			expression: expr.to_string(),
		}))
	}
}

/// Sweep bonus for a set of fudge rolls, if every die shows `+` or every die shows `-`.
fn sweep_bonus(rolls: &[DieRoll], count: u8) -> Option<i32> {
	let half = i32::from(count.div_ceil(2));
	let mut values = rolls.iter().filter(|roll| roll.is_kept()).map(|roll| Faces::Fudge.value(roll.val));
	let first = values.next()?;
	if first == 0 || !values.all(|value| value == first) {
		return None;
	}
	Some(first * half)
}

/// Flat modifier as shown after the dice: ` +5`, ` -2`, or nothing for zero.
pub(crate) fn modifier_clause(modifier: i32) -> String {
	match modifier {
		0 => String::new(),
		m if m < 0 => format!(" {m}"),
		m => format!(" +{m}"),
	}
}
