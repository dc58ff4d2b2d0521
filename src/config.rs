//! Runtime tuning for the engine.

/// Default minimum deviation from neutral before a bias source has any effect
pub const ACTIVATION_THRESHOLD: f64 = 5.0;

/// Default deviation at which a bias source reaches full strength
pub const FULL_STRENGTH_DEVIATION: f64 = 50.0;

/// Default bound on the magnitude of karma debt
pub const KARMA_DEBT_LIMIT: f64 = 100.0;

/// Default bonus added to critical d6 pools
pub const CRITICAL_BONUS: i32 = 5;

/// Tuning of the luck and karma bias sources
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain configuration data")]
pub struct BiasConfig {
	/// Deviation (in points) below which a source is inert
	pub activation_threshold: f64,

	/// Deviation (in points) at which a source's strength caps at 1
	pub full_strength_deviation: f64,

	/// Largest magnitude karma debt may reach before it's clamped
	pub karma_debt_limit: f64,
}

impl Default for BiasConfig {
	fn default() -> Self {
		Self {
			activation_threshold: ACTIVATION_THRESHOLD,
			full_strength_deviation: FULL_STRENGTH_DEVIATION,
			karma_debt_limit: KARMA_DEBT_LIMIT,
		}
	}
}

/// Engine-wide configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain configuration data")]
pub struct EngineConfig {
	/// Bias source tuning
	pub bias: BiasConfig,

	/// Bonus added to a d6 pool showing two or more sixes
	pub critical_bonus: i32,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			bias: BiasConfig::default(),
			critical_bonus: CRITICAL_BONUS,
		}
	}
}
