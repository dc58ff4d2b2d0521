//! Luck and karma: per-actor state and the [`Bias`] derived from it.
//!
//! Both sources work the same way. A source's deviation from neutral (`luck - 50` for luck, the debt itself for
//! karma) is ignored below the activation threshold. Past it, the bias points in the direction of the deviation with
//! a strength of `min(|deviation| / 50, 1)`. When both sources are enabled their biases are added together.
//!
//! Karma debt feeds back on itself: every roll made with karma enabled adds `50 - percentile` to the debt, so a run of
//! high rolls pushes it negative (biasing future rolls low) and a run of low rolls pushes it positive.

use crate::{config::BiasConfig, sampler::Bias, store::ActorKey};

/// Luck value that produces no bias
pub const NEUTRAL_LUCK: u8 = 50;

/// Highest settable luck value
pub const MAX_LUCK: u8 = 100;

/// Percentile that leaves karma debt untouched
pub const NEUTRAL_PERCENTILE: f64 = 50.0;

/// Luck and karma state of one actor within one scope
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct BiasState {
	/// Administratively set luck, `0..=100` with 50 as neutral
	pub luck: u8,

	/// Accumulated karma debt. Positive debt is owed good rolls.
	pub karma_debt: f64,
}

impl Default for BiasState {
	fn default() -> Self {
		Self {
			luck: NEUTRAL_LUCK,
			karma_debt: 0.0,
		}
	}
}

/// Which bias sources apply to a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Closed set of sources")]
pub struct BiasSources {
	/// Apply the actor's luck
	pub luck: bool,

	/// Apply the actor's karma debt, and fold the roll's percentile back into it
	pub karma: bool,
}

impl BiasSources {
	/// Unbiased roll
	pub const STANDARD: Self = Self {
		luck: false,
		karma: false,
	};

	/// Luck only
	pub const LUCK: Self = Self {
		luck: true,
		karma: false,
	};

	/// Karma only
	pub const KARMA: Self = Self {
		luck: false,
		karma: true,
	};

	/// Luck and karma together
	pub const BOTH: Self = Self { luck: true, karma: true };
}

/// Derives biases from [`BiasState`] and updates karma debt from roll percentiles.
///
/// # Examples
/// ```
/// use chimera::{
/// 	bias::{BiasController, BiasSources, BiasState},
/// 	store::{ActorId, ActorKey, ScopeId},
/// };
///
/// let controller = BiasController::default();
/// let key = ActorKey::new(ScopeId(1), ActorId(1));
/// let mut state = BiasState { luck: 100, karma_debt: 0.0 };
/// assert_eq!(controller.bias_for(&state, BiasSources::LUCK).get(), 1.0);
/// assert!(controller.bias_for(&state, BiasSources::KARMA).is_neutral());
///
/// controller.record_percentile(key, &mut state, 90.0);
/// assert_eq!(state.karma_debt, -40.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BiasController {
	/// Thresholds and limits
	config: BiasConfig,
}

impl BiasController {
	/// Creates a controller with the given tuning.
	#[must_use]
	pub const fn new(config: BiasConfig) -> Self {
		Self { config }
	}

	/// Tuning in use.
	#[must_use]
	pub const fn config(&self) -> &BiasConfig {
		&self.config
	}

	/// Bias produced by a single source deviating from neutral by `deviation` points.
	#[must_use]
	pub fn source_bias(&self, deviation: f64) -> Bias {
		if !deviation.is_finite() || deviation.abs() < self.config.activation_threshold {
			return Bias::NEUTRAL;
		}

		let strength = (deviation.abs() / self.config.full_strength_deviation).min(1.0);
		Bias::new(deviation.signum() * strength)
	}

	/// Bias produced by an actor's luck.
	#[must_use]
	pub fn luck_bias(&self, state: &BiasState) -> Bias {
		self.source_bias(f64::from(state.luck) - f64::from(NEUTRAL_LUCK))
	}

	/// Bias produced by an actor's karma debt.
	#[must_use]
	pub fn karma_bias(&self, state: &BiasState) -> Bias {
		self.source_bias(state.karma_debt)
	}

	/// Combined bias of the enabled sources.
	#[must_use]
	pub fn bias_for(&self, state: &BiasState, sources: BiasSources) -> Bias {
		let luck = if sources.luck {
			self.luck_bias(state)
		} else {
			Bias::NEUTRAL
		};
		let karma = if sources.karma {
			self.karma_bias(state)
		} else {
			Bias::NEUTRAL
		};

		let bias = Bias::new(luck.get() + karma.get());
		tracing::debug!(
			luck = state.luck,
			karma_debt = state.karma_debt,
			luck_bias = luck.get(),
			karma_bias = karma.get(),
			bias = bias.get(),
			"derived bias"
		);
		bias
	}

	/// Folds a roll's percentile into the karma debt (`debt + (50 - percentile)`), clamping the result.
	/// Returns the new debt.
	pub fn record_percentile(&self, key: ActorKey, state: &mut BiasState, percentile: f64) -> f64 {
		let raw = state.karma_debt + (NEUTRAL_PERCENTILE - percentile);
		state.karma_debt = self.clamp_debt(key, raw);
		tracing::debug!(percentile, karma_debt = state.karma_debt, "recorded percentile");
		state.karma_debt
	}

	/// Bounds an actor's karma debt to the configured limit, warning when it has to be clamped.
	#[must_use]
	pub fn clamp_debt(&self, key: ActorKey, debt: f64) -> f64 {
		let limit = self.config.karma_debt_limit;
		if debt.is_nan() {
			tracing::warn!(%key, "karma debt was NaN, resetting it to 0");
			return 0.0;
		}
		if debt.abs() > limit {
			let clamped = debt.clamp(-limit, limit);
			tracing::warn!(%key, raw = debt, clamped, "karma debt exceeded its limit and was clamped");
			return clamped;
		}
		debt
	}
}
