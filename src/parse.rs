//! Parser generators and entry points for dice expressions and initiative modifiers, built on [chumsky].
//!
//! Dice terms are matched case-insensitively. The supported syntax is:
//!
//! - `[count]d<sides>`, `[count]dF` (fudge), and `[count]dD` (Fallout damage); the count defaults to `1`
//! - `kh[n]`/`k[n]`, `kl[n]`, `dh[n]`, and `dl[n]` keep/drop operations; `n` defaults to `1`
//! - `p[n]` as a shorthand for `dl[n]`
//! - `r`/`ro` (reroll once) and `rr` (reroll recursively) followed by a condition like `1`, `<3`, or `>=19`
//! - `ra` (reroll and add) followed by a condition
//! - `x`/`e` (explode recursively) and `xo` (explode once), optionally followed by a condition
//! - `min`/`mi` and `max`/`ma` followed by a face value
//! - any number of `+N`/`-N` flat modifiers
//!
//! Anything after the first whitespace is a free-text label.

#![cfg(feature = "parse")]

use std::str::FromStr;

use chumsky::{error::RichReason, prelude::*};

use crate::{
	dice::{operation::Condition, Dice, Faces, Operation, MAX_DICE, MAX_SIDES},
	error::ValidationError,
	expr::{DiceExpression, ModifierExpression},
};

/// Maximum length (in characters) of a full expression, including its label
pub const MAX_EXPRESSION_LEN: usize = 150;

/// Parser state and error type shared by every parser in this module
type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Parses and normalizes a full dice expression like `4d6dl1+2 stats`.
///
/// # Errors
/// If the text is empty, too long, uses an unknown token, exceeds the dice bounds, or has a malformed modifier chain,
/// a [`ValidationError`] describing the problem is returned.
///
/// # Examples
/// ```
/// use chimera::{dice::Operation, parse};
///
/// let expr = parse::expression("4D6dl+2 Strength score")?;
/// assert_eq!(expr.dice.count, 4);
/// assert_eq!(expr.dice.operations, vec![Operation::KeepHigh(3)]);
/// assert_eq!(expr.modifiers, vec![2]);
/// assert_eq!(expr.label.as_deref(), Some("Strength score"));
/// # Ok::<(), chimera::ValidationError>(())
/// ```
pub fn expression(text: &str) -> Result<DiceExpression, ValidationError> {
	let offset = text.len() - text.trim_start().len();
	let text = text.trim();
	if text.is_empty() {
		return Err(ValidationError::new("Dice expression is empty"));
	}
	if text.chars().count() > MAX_EXPRESSION_LEN {
		return Err(ValidationError::new(format!(
			"Dice expression too long (max {MAX_EXPRESSION_LEN} characters)"
		)));
	}

	let (term, label) = match text.split_once(char::is_whitespace) {
		Some((term, label)) => (term, Some(label.trim())),
		None => (text, None),
	};
	let term = term.to_lowercase();

	let mut expr = dice_expression()
		.parse(term.as_str())
		.into_result()
		.map_err(|errs| validation_error(errs, offset, "dice expression"))?;
	expr.label = label.filter(|label| !label.is_empty()).map(ToOwned::to_owned);

	expr.normalize()
}

/// Parses an initiative modifier like `+14+2`, `-2`, or `8`.
///
/// Only digits, `+`, `-`, and spaces are accepted. Spaces may surround a sign, but can't separate two numbers.
///
/// # Errors
/// If the text contains any other character, is empty, has a dangling/doubled sign, or has two numbers without a sign
/// between them, a [`ValidationError`] is returned.
///
/// # Examples
/// ```
/// use chimera::parse;
///
/// let modifier = parse::modifier_expression("+14 + 2")?;
/// assert_eq!(modifier.total(), 16);
/// assert_eq!(modifier.to_string(), "14+2");
/// # Ok::<(), chimera::ValidationError>(())
/// ```
pub fn modifier_expression(text: &str) -> Result<ModifierExpression, ValidationError> {
	if let Some((pos, bad)) = text
		.char_indices()
		.find(|(_, c)| !c.is_ascii_digit() && !matches!(c, '+' | '-' | ' '))
	{
		return Err(ValidationError::new(format!(
			"Invalid character '{bad}' in modifier (only digits, +, -, and spaces are allowed)"
		))
		.with_span(pos..pos + bad.len_utf8()));
	}

	if text.trim().is_empty() {
		return Err(ValidationError::new("Modifier is empty"));
	}

	modifier_chain()
		.parse(text)
		.into_result()
		.map_err(|errs| validation_error(errs, 0, "modifier"))
}

/// Generates a parser that handles a dice term followed by flat modifiers and expects end of input.
/// The input must already be lowercase and must not contain a label.
#[must_use]
pub fn dice_expression<'src>() -> impl Parser<'src, &'src str, DiceExpression, Extra<'src>> + Clone {
	dice_part()
		.then(signed_int().repeated().collect::<Vec<_>>())
		.then_ignore(end())
		.map(|(dice, modifiers)| DiceExpression {
			dice,
			modifiers,
			label: None,
		})
}

/// Generates a parser that specifically handles dice terms like "d20", "2d20kh", "8d6x", "4df", etc.
#[must_use]
pub fn dice_part<'src>() -> impl Parser<'src, &'src str, Dice, Extra<'src>> + Clone {
	count()
		.then_ignore(just('d'))
		.then(faces())
		.then(operation().repeated().collect::<Vec<_>>())
		.map(|((count, faces), operations)| Dice {
			count,
			faces,
			operations,
		})
}

/// Generates a parser for a chain of signed integers whose first sign is optional, expecting end of input.
/// Spaces are allowed around signs and at either end.
#[must_use]
pub fn modifier_chain<'src>() -> impl Parser<'src, &'src str, ModifierExpression, Extra<'src>> + Clone {
	let term = sign()
		.padded()
		.then(text::int(10))
		.try_map(|(sign, digits): (i32, &str), span| signed_value(sign, digits, span));

	text::whitespace()
		.ignore_then(sign().padded().or_not())
		.then(text::int(10))
		.try_map(|(sign, digits): (Option<i32>, &str), span| signed_value(sign.unwrap_or(1), digits, span))
		.then(term.repeated().collect::<Vec<_>>())
		.then_ignore(text::whitespace())
		.then_ignore(end())
		.map(|(first, rest)| {
			let mut terms = Vec::with_capacity(rest.len() + 1);
			terms.push(first);
			terms.extend(rest);
			ModifierExpression::new(terms)
		})
}

/// Optional number of dice, bounded by [`MAX_DICE`] and defaulting to 1.
fn count<'src>() -> impl Parser<'src, &'src str, u8, Extra<'src>> + Clone {
	text::int(10).or_not().try_map(|digits: Option<&str>, span| {
		let Some(digits) = digits else {
			return Ok(1);
		};
		digits
			.parse::<u8>()
			.ok()
			.filter(|count| *count <= MAX_DICE)
			.ok_or_else(|| Rich::custom(span, format!("Too many dice: {digits} (max {MAX_DICE})")))
	})
}

/// Face set: a number of sides bounded by [`MAX_SIDES`], `f` for fudge dice, or `d` for Fallout dice.
fn faces<'src>() -> impl Parser<'src, &'src str, Faces, Extra<'src>> + Clone {
	choice((
		just('f').to(Faces::Fudge),
		just('d').to(Faces::Fallout),
		text::int(10).try_map(|digits: &str, span| {
			let sides = digits
				.parse::<u16>()
				.ok()
				.filter(|sides| *sides <= MAX_SIDES)
				.ok_or_else(|| Rich::custom(span, format!("Die size too large: {digits} (max {MAX_SIDES})")))?;
			if sides == 0 {
				return Err(Rich::custom(span, "Invalid die size: 0 (min 1)"));
			}
			Ok(Faces::Numeric(sides))
		}),
	))
}

/// Any single dice operation.
fn operation<'src>() -> impl Parser<'src, &'src str, Operation, Extra<'src>> + Clone {
	choice((
		just("kh").ignore_then(amount("Keep highest")).map(Operation::KeepHigh),
		just("kl").ignore_then(amount("Keep lowest")).map(Operation::KeepLow),
		just('k').ignore_then(amount("Keep highest")).map(Operation::KeepHigh),
		just("dh").ignore_then(amount("Drop highest")).map(Operation::DropHigh),
		just("dl").ignore_then(amount("Drop lowest")).map(Operation::DropLow),
		just('p').ignore_then(amount("Drop lowest")).map(Operation::DropLow),
		just("ra")
			.ignore_then(condition())
			.map(|cond| Operation::RerollAdd { cond }),
		just("rr")
			.ignore_then(condition())
			.map(|cond| Operation::Reroll { cond, recurse: true }),
		just("ro")
			.or(just("r"))
			.ignore_then(condition())
			.map(|cond| Operation::Reroll { cond, recurse: false }),
		just("xo")
			.ignore_then(condition().or_not())
			.map(|cond| Operation::Explode { cond, recurse: false }),
		just('x')
			.or(just('e'))
			.ignore_then(condition().or_not())
			.map(|cond| Operation::Explode { cond, recurse: true }),
		just("min")
			.or(just("mi"))
			.ignore_then(face_value("Minimum"))
			.map(Operation::Min),
		just("max")
			.or(just("ma"))
			.ignore_then(face_value("Maximum"))
			.map(Operation::Max),
	))
}

/// Optional count for a keep/drop operation, defaulting to 1.
fn amount<'src>(name: &'static str) -> impl Parser<'src, &'src str, u8, Extra<'src>> + Clone {
	text::int(10).or_not().try_map(move |digits: Option<&str>, span| {
		digits
			.unwrap_or("1")
			.parse::<u8>()
			.map_err(|err| Rich::custom(span, format!("{name} count: {err}")))
	})
}

/// Face value operand for a clamp operation.
fn face_value<'src>(name: &'static str) -> impl Parser<'src, &'src str, u16, Extra<'src>> + Clone {
	text::int(10).try_map(move |digits: &str, span| {
		digits
			.parse::<u16>()
			.map_err(|err| Rich::custom(span, format!("{name} value: {err}")))
	})
}

/// Comparison condition for rerolls and explosions. A bare number means equality.
fn condition<'src>() -> impl Parser<'src, &'src str, Condition, Extra<'src>> + Clone {
	choice((just(">="), just("<="), just(">"), just("<"), just("=")))
		.or_not()
		.then(text::int(10))
		.try_map(|(symbol, digits): (Option<&str>, &str), span| {
			let val = digits
				.parse::<u16>()
				.map_err(|err| Rich::custom(span, format!("Condition value: {err}")))?;
			Condition::from_symbol_and_val(symbol.unwrap_or("="), val).map_err(|err| Rich::custom(span, err))
		})
}

/// `+` or `-` as a multiplier.
fn sign<'src>() -> impl Parser<'src, &'src str, i32, Extra<'src>> + Clone {
	choice((just('+').to(1), just('-').to(-1)))
}

/// Integer with a mandatory sign.
fn signed_int<'src>() -> impl Parser<'src, &'src str, i32, Extra<'src>> + Clone {
	sign()
		.then(text::int(10))
		.try_map(|(sign, digits): (i32, &str), span| signed_value(sign, digits, span))
}

/// Applies a sign to a run of digits.
fn signed_value<'src>(sign: i32, digits: &str, span: SimpleSpan) -> Result<i32, Rich<'src, char>> {
	digits
		.parse::<i32>()
		.map(|val| if sign < 0 { -val } else { val })
		.map_err(|err| Rich::custom(span, format!("Modifier value: {err}")))
}

/// Converts the first parser error into a user-facing [`ValidationError`].
fn validation_error(errs: Vec<Rich<'_, char>>, offset: usize, what: &str) -> ValidationError {
	let Some(err) = errs.into_iter().next() else {
		return ValidationError::new(format!("Invalid {what}"));
	};

	let message = match custom_message(err.reason()) {
		Some(msg) => msg.to_owned(),
		None => match err.found() {
			Some(found) => format!("Unexpected '{found}' in {what}"),
			None => format!("Unexpected end of {what}"),
		},
	};

	let span = err.span();
	ValidationError::new(message).with_span(span.start + offset..span.end + offset)
}

/// Finds a custom message in an error reason. Errors from alternatives at the same position get merged, which can
/// bury a bounds message (like the one for `1d0`) among the expected tokens of the other branches.
fn custom_message<'a>(reason: &'a RichReason<'_, char>) -> Option<&'a str> {
	match reason {
		RichReason::Custom(msg) => Some(msg.as_str()),
		RichReason::Many(reasons) => reasons.iter().find_map(custom_message),
		RichReason::ExpectedFound { .. } => None,
	}
}

impl FromStr for DiceExpression {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		expression(s)
	}
}

impl FromStr for ModifierExpression {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		modifier_expression(s)
	}
}
