//! Full dice expressions (a dice term with flat modifiers and a label) and their canonical form.

use std::fmt;

use crate::{
	dice::{Dice, Faces, Operation, MAX_DICE, MAX_SIDES},
	error::ValidationError,
	variant::RollShape,
};

/// A parsed dice expression: one dice term, a chain of flat integer modifiers, and an optional free-text label.
///
/// Expressions produced by the parser are always normalized (see [`Self::normalize()`]).
///
/// # Examples
/// ```
/// use chimera::{expr::DiceExpression, Dice};
///
/// let expr = DiceExpression::new(Dice::builder().count(4).sides(6).drop_low(1).build())
/// 	.with_modifier(2)
/// 	.normalize()?;
/// assert_eq!(expr.to_string(), "4d6kh3+2");
/// # Ok::<(), chimera::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct DiceExpression {
	/// Dice term to roll
	pub dice: Dice,

	/// Flat modifiers added to the dice total, in written order
	pub modifiers: Vec<i32>,

	/// Free text following the expression
	pub label: Option<String>,
}

impl DiceExpression {
	/// Creates an expression with no modifiers and no label.
	#[must_use]
	pub const fn new(dice: Dice) -> Self {
		Self {
			dice,
			modifiers: Vec::new(),
			label: None,
		}
	}

	/// Appends a flat modifier.
	#[must_use]
	pub fn with_modifier(mut self, modifier: i32) -> Self {
		self.modifiers.push(modifier);
		self
	}

	/// Sets the label.
	#[must_use]
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Sum of all flat modifiers.
	#[must_use]
	pub fn modifier_total(&self) -> i32 {
		self.modifiers.iter().fold(0i32, |acc, m| acc.saturating_add(*m))
	}

	/// Validates the expression and rewrites it into canonical form.
	///
	/// Drop operations are rewritten in terms of keep operations: dropping the `k` lowest of `n` dice keeps the
	/// `n - k` highest, and dropping the `k` highest keeps the `n - k` lowest. Normalizing a canonical expression
	/// returns it unchanged.
	///
	/// # Errors
	/// If the count or sides are out of bounds, an operation is applied to symbolic dice, a drop would leave no dice,
	/// a keep would keep no dice, a clamp value isn't one of the die's faces, or an operation would roll forever, a
	/// [`ValidationError`] is returned.
	///
	/// # Examples
	/// ```
	/// use chimera::{dice::Operation, expr::DiceExpression, Dice};
	///
	/// let expr = DiceExpression::new(Dice::builder().count(4).sides(6).drop_high(1).build()).normalize()?;
	/// assert_eq!(expr.dice.operations, vec![Operation::KeepLow(3)]);
	/// assert_eq!(expr.clone().normalize()?, expr);
	/// # Ok::<(), chimera::ValidationError>(())
	/// ```
	pub fn normalize(mut self) -> Result<Self, ValidationError> {
		let count = self.dice.count;
		if count == 0 {
			return Err(ValidationError::new("Must roll at least 1 die"));
		}
		if count > MAX_DICE {
			return Err(ValidationError::new(format!("Too many dice: {count} (max {MAX_DICE})")));
		}

		match self.dice.faces {
			Faces::Numeric(0) => return Err(ValidationError::new("Invalid die size: 0 (min 1)")),
			Faces::Numeric(sides) if sides > MAX_SIDES => {
				return Err(ValidationError::new(format!(
					"Die size too large: {sides} (max {MAX_SIDES})"
				)));
			}
			faces if faces.is_symbolic() && !self.dice.operations.is_empty() => {
				return Err(ValidationError::new(format!(
					"Operations are not supported on d{faces} dice"
				)));
			}
			_ => {}
		}

		let sides = self.dice.faces.len();
		let mut operations = Vec::with_capacity(self.dice.operations.len());
		for op in self.dice.operations {
			let op = match op {
				Operation::DropLow(k) => Operation::KeepHigh(remaining_after_drop(count, k)?),
				Operation::DropHigh(k) => Operation::KeepLow(remaining_after_drop(count, k)?),
				Operation::KeepHigh(0) | Operation::KeepLow(0) => {
					return Err(ValidationError::new("Must keep at least 1 die"));
				}
				Operation::Min(val) | Operation::Max(val) if val == 0 || val > sides => {
					return Err(ValidationError::new(format!(
						"{op} is outside the faces of d{sides} (1-{sides})"
					)));
				}
				op => op,
			};

			if op.is_infinite_for(sides) {
				return Err(ValidationError::new(format!(
					"{op} on d{sides} would result in infinite rolls"
				)));
			}
			operations.push(op);
		}
		self.dice.operations = operations;

		Ok(self)
	}

	/// Whether the expression is already in canonical form (no drop operations).
	#[must_use]
	pub fn is_canonical(&self) -> bool {
		!self
			.dice
			.operations
			.iter()
			.any(|op| matches!(op, Operation::DropHigh(..) | Operation::DropLow(..)))
	}

	/// Classifies the expression for the rule variant layer.
	#[must_use]
	#[inline]
	pub fn shape(&self) -> RollShape {
		RollShape::classify(self)
	}
}

/// Number of dice left after dropping `k` of `count`.
fn remaining_after_drop(count: u8, k: u8) -> Result<u8, ValidationError> {
	if k >= count {
		return Err(ValidationError::new(format!("Cannot drop {k} of {count} dice")));
	}
	Ok(count - k)
}

impl fmt::Display for DiceExpression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.dice)?;
		for modifier in &self.modifiers {
			write!(f, "{modifier:+}")?;
		}
		Ok(())
	}
}

/// Chain of signed integers used as an initiative modifier (e.g. `+14+2`), evaluated left to right.
///
/// # Examples
/// ```
/// use chimera::expr::ModifierExpression;
///
/// let modifier = ModifierExpression::new(vec![14, 2]);
/// assert_eq!(modifier.total(), 16);
/// assert_eq!(modifier.to_string(), "14+2");
/// assert_eq!(ModifierExpression::new(vec![-2]).to_string(), "-2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierExpression {
	terms: Vec<i32>,
}

impl ModifierExpression {
	/// Creates a modifier from its signed terms.
	#[must_use]
	pub const fn new(terms: Vec<i32>) -> Self {
		Self { terms }
	}

	/// The signed terms, in order.
	#[must_use]
	pub fn terms(&self) -> &[i32] {
		&self.terms
	}

	/// Sum of all terms.
	#[must_use]
	pub fn total(&self) -> i32 {
		self.terms.iter().fold(0i32, |acc, t| acc.saturating_add(*t))
	}
}

impl fmt::Display for ModifierExpression {
	/// Writes the terms without spaces. A leading `+` is omitted while a leading `-` is kept.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, term) in self.terms.iter().enumerate() {
			if i == 0 {
				write!(f, "{term}")?;
			} else {
				write!(f, "{term:+}")?;
			}
		}
		Ok(())
	}
}

/// Trait to allow creation of expanded descriptions with an optional max number of individual listed results where
/// applicable
pub trait Describe {
	/// Builds a detailed string with additional information about non-deterministic elements.
	/// Any elements that can have a different result between multiple evaluations or multiple results should list all
	/// of the specific individual results that occurred (ideally, up to `list_limit` of them).
	#[must_use]
	fn describe(&self, list_limit: Option<usize>) -> String;
}
