//! Error types shared by the whole engine.

use std::ops::Range;

use crate::dice;

/// Invalid user input: a bad expression, a bad modifier, an unknown initiative name, or an out-of-range setting.
///
/// The message is meant to be shown to the user verbatim.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
	/// Human-readable description of what was wrong
	pub message: String,

	/// Byte range of the offending input, when it came from parsing text
	pub span: Option<Range<usize>>,
}

impl ValidationError {
	/// Creates a validation error with the given message.
	#[must_use]
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			span: None,
		}
	}

	/// Attaches the byte range of the offending input.
	#[must_use]
	pub fn with_span(mut self, span: Range<usize>) -> Self {
		self.span = Some(span);
		self
	}
}

/// Violation of a guarantee the engine itself makes. Always a defect, never the user's fault.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum InternalInconsistency {
	/// A sampled face lies outside of the face set it was sampled from.
	#[error("face {face} is outside of the face set of {dice}")]
	FaceOutOfDomain {
		/// Face index that was produced
		face: u16,

		/// Dice the face was rolled for
		dice: String,
	},

	/// A computed percentile lies outside of `[0, 100]`.
	#[error("percentile {percentile} for total {total} of {expression} is outside of [0, 100]")]
	PercentileOutOfRange {
		/// The offending percentile
		percentile: f64,

		/// Total that was ranked
		total: i32,

		/// Expression the total was rolled from
		expression: String,
	},

	/// Arithmetic on roll values overflowed.
	#[error("integer overflow while totaling {0}")]
	Overflow(String),

	/// Dice that were validated as finite tried to roll forever.
	#[error("{0} would result in infinite rolls")]
	InfiniteRolls(String),
}

/// Top-level engine error
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
	/// The caller's input was invalid. The message can be shown as-is.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// The engine broke one of its own invariants. Details are logged where detected and kept in the value, but the
	/// display is generic.
	#[error("an internal error occurred while rolling")]
	Internal(InternalInconsistency),
}

impl Error {
	/// Logs an internal inconsistency with its full context and wraps it.
	pub(crate) fn internal(inconsistency: InternalInconsistency) -> Self {
		tracing::error!(error = %inconsistency, detail = ?inconsistency, "internal inconsistency");
		Self::Internal(inconsistency)
	}
}

impl From<dice::Error> for Error {
	fn from(err: dice::Error) -> Self {
		match err {
			dice::Error::Overflow(rolled) => {
				Self::internal(InternalInconsistency::Overflow(rolled.dice.to_string()))
			}
			dice::Error::InfiniteRolls(dice) => Self::internal(InternalInconsistency::InfiniteRolls(dice.to_string())),
			dice::Error::UnknownCondition(symbol) => {
				Self::Validation(ValidationError::new(format!("Unknown condition: {symbol}")))
			}
		}
	}
}

/// Alias of [`std::result::Result`] defaulting to the engine [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

