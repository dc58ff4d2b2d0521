//! Game-system rule variants applied on top of ordinary rolls.
//!
//! When variant mode is enabled for a scope, two expression shapes get special treatment:
//!
//! - a single d10 (with any flat modifiers) explodes on a 10 and implodes on a 1, drawing exactly one extra d10
//! - a pool of two or more d6 (with any flat modifiers) is critical when at least two dice show a 6
//!
//! Every other expression rolls normally. Initiative batches and critical injury tables live in the submodules.

pub mod initiative;
pub mod injury;

use crate::{
	dice::{Faces, Roller},
	error::{Error, InternalInconsistency},
	expr::DiceExpression,
	roll::{self, Outcome, RollResult},
	sampler::Bias,
};

/// Sides of the die used by the single-die explosion/implosion rule
pub const VARIANT_DIE: u16 = 10;

/// Sides of the dice in a critical pool
pub const POOL_DIE: u16 = 6;

/// Classification of an expression for the rule variant layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_enums, reason = "Closed set of shapes")]
pub enum RollShape {
	/// `1d10` with only flat modifiers
	SingleD10,

	/// `Nd6` with `N >= 2` and only flat modifiers
	D6Pool(u8),

	/// Anything else
	Other,
}

impl RollShape {
	/// Classifies an expression.
	///
	/// # Examples
	/// ```
	/// use chimera::{expr::DiceExpression, variant::RollShape, Dice};
	///
	/// assert_eq!(RollShape::classify(&DiceExpression::new(Dice::new(1, 10)).with_modifier(3)), RollShape::SingleD10);
	/// assert_eq!(RollShape::classify(&DiceExpression::new(Dice::new(4, 6))), RollShape::D6Pool(4));
	/// assert_eq!(RollShape::classify(&DiceExpression::new(Dice::new(1, 6))), RollShape::Other);
	/// ```
	#[must_use]
	pub fn classify(expr: &DiceExpression) -> Self {
		if !expr.dice.operations.is_empty() {
			return Self::Other;
		}

		match (expr.dice.count, expr.dice.faces) {
			(1, Faces::Numeric(VARIANT_DIE)) => Self::SingleD10,
			(count, Faces::Numeric(POOL_DIE)) if count >= 2 => Self::D6Pool(count),
			_ => Self::Other,
		}
	}
}

/// Rule configuration of one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct RuleConfig {
	/// Whether rule variants apply to rolls in the scope
	pub variant_mode: bool,
}

/// Applies the rule variant for a result's shape, if variant mode is enabled.
///
/// At most one extra die is drawn: a 10 on a single d10 adds one extra d10 and a 1 subtracts one, with no chaining
/// even if the extra die is another 10 or 1. A d6 pool with two or more sixes gets `critical_bonus` added. The
/// percentile is left as computed from the base dice.
///
/// # Errors
/// If the extra die lands outside of its faces or the total overflows, an [`Error::Internal`] is returned.
///
/// # Examples
/// ```
/// use chimera::{
/// 	dice::roller::Iter as IterRoller,
/// 	parse,
/// 	roll::{self, Outcome},
/// 	sampler::Bias,
/// 	variant::{apply_variant, RuleConfig},
/// };
///
/// let expr = parse::expression("1d10+5")?;
/// let mut roller = IterRoller::new([10, 3]);
/// let base = roll::roll(&expr, Bias::NEUTRAL, &mut roller)?;
/// let result = apply_variant(base, RuleConfig { variant_mode: true }, 5, &mut roller, Bias::NEUTRAL)?;
/// assert_eq!(result.outcome, Outcome::Exploded { extra: 3 });
/// assert_eq!(result.to_string(), "1d10 (10->10!+3) +5 = 18");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn apply_variant(
	mut result: RollResult,
	config: RuleConfig,
	critical_bonus: i32,
	roller: &mut impl Roller,
	bias: Bias,
) -> Result<RollResult, Error> {
	if !config.variant_mode || result.outcome != Outcome::Normal {
		return Ok(result);
	}

	let overflow = |result: &RollResult| Error::internal(InternalInconsistency::Overflow(result.expression.to_string()));

	match result.shape {
		RollShape::SingleD10 => {
			let base = result.rolls.first().map_or(0, |roll| roll.val);
			if base == VARIANT_DIE {
				let extra = roll::roll_checked_die(roller, VARIANT_DIE, bias)?;
				let total = result.total.checked_add(i32::from(extra)).ok_or_else(|| overflow(&result))?;
				result.total = total;
				result.outcome = Outcome::Exploded { extra };
				tracing::debug!(base, extra, total = result.total, "d10 exploded");
			} else if base == 1 {
				let extra = roll::roll_checked_die(roller, VARIANT_DIE, bias)?;
				let alt_total = result.total;
				let total = result.total.checked_sub(i32::from(extra)).ok_or_else(|| overflow(&result))?;
				result.total = total;
				result.outcome = Outcome::Imploded { extra, alt_total };
				tracing::debug!(base, extra, total = result.total, alt_total, "d10 imploded");
			}
		}
		RollShape::D6Pool(..) => {
			let sixes = result
				.rolls
				.iter()
				.filter(|roll| roll.is_kept() && roll.val == POOL_DIE)
				.count();
			if sixes >= 2 {
				let total = result.total.checked_add(critical_bonus).ok_or_else(|| overflow(&result))?;
				result.total = total;
				result.outcome = Outcome::Critical {
					sixes,
					bonus: critical_bonus,
				};
				tracing::debug!(sixes, total = result.total, "d6 pool critical");
			}
		}
		RollShape::Other => {}
	}

	Ok(result)
}
