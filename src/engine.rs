//! The [`Engine`] facade: parsing, biased rolling, rule variants and karma feedback wired together over a
//! [`StateStore`].

use crate::{
	bias::{BiasController, BiasSources, BiasState, MAX_LUCK},
	config::EngineConfig,
	dice::Roller,
	error::{Error, ValidationError},
	expr::{DiceExpression, ModifierExpression},
	roll::{self, RollResult},
	store::{ActorKey, ScopeId, StateStore},
	variant::{
		apply_variant,
		initiative::{roll_batch, InitiativeEntry, InitiativeOrder},
		RuleConfig,
	},
};

/// Rolls expressions for actors, keeping their luck, karma and their scopes' rules in a [`StateStore`]
///
/// Every roll for an actor holds that actor's state exclusively from the moment its bias is derived until its karma
/// debt is updated, so concurrent rolls for the same actor never lose an update. Failed rolls leave state untouched.
///
/// # Examples
/// ```
/// use chimera::{
/// 	bias::BiasSources,
/// 	dice::roller::Iter as IterRoller,
/// 	store::{ActorId, ActorKey, MemoryStore, ScopeId},
/// 	Engine,
/// };
///
/// let engine = Engine::new(MemoryStore::new());
/// let key = ActorKey::new(ScopeId(1), ActorId(1));
///
/// let result = engine.roll_str(key, "1d20+2", BiasSources::KARMA, &mut IterRoller::new([20]))?;
/// assert_eq!(result.total, 22);
/// assert_eq!(engine.bias_state(key).karma_debt, -50.0);
/// # Ok::<(), chimera::Error>(())
/// ```
#[derive(Debug)]
pub struct Engine<S> {
	/// Where all mutable state lives
	store: S,

	/// Tuning
	config: EngineConfig,

	/// Bias derivation and karma feedback
	controller: BiasController,
}

impl<S: StateStore> Engine<S> {
	/// Creates an engine with the default configuration.
	#[must_use]
	pub fn new(store: S) -> Self {
		Self::with_config(store, EngineConfig::default())
	}

	/// Creates an engine with a custom configuration.
	#[must_use]
	pub fn with_config(store: S, config: EngineConfig) -> Self {
		Self {
			store,
			config,
			controller: BiasController::new(config.bias),
		}
	}

	/// Store backing the engine.
	#[must_use]
	pub const fn store(&self) -> &S {
		&self.store
	}

	/// Configuration in use.
	#[must_use]
	pub const fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Rolls an expression for an actor.
	///
	/// The bias comes from the actor's state and the enabled sources. If the scope has variant mode on, the result
	/// goes through [`apply_variant()`]. When karma is enabled, the result's percentile is folded back into the
	/// actor's karma debt.
	///
	/// # Errors
	/// If the roll hits an internal inconsistency, an [`Error::Internal`] is returned and the actor's state is left
	/// unchanged.
	pub fn roll(
		&self,
		key: ActorKey,
		expr: &DiceExpression,
		sources: BiasSources,
		roller: &mut impl Roller,
	) -> Result<RollResult, Error> {
		let span = tracing::debug_span!("roll", %key, %expr);
		let _entered = span.enter();

		let rules = self.store.rule_config(key.scope);
		self.store.with_bias_state(key, |state| {
			let bias = self.controller.bias_for(state, sources);
			let result = roll::roll(expr, bias, roller)?;
			let result = apply_variant(result, rules, self.config.critical_bonus, roller, bias)?;

			if sources.karma {
				self.controller.record_percentile(key, state, result.percentile);
			}
			Ok(result)
		})
	}

	/// Parses an expression and rolls it for an actor (see [`Self::roll()`]).
	///
	/// # Errors
	/// If the expression is invalid, an [`Error::Validation`] is returned. Otherwise, errors are the same as
	/// [`Self::roll()`].
	#[cfg(feature = "parse")]
	pub fn roll_str(
		&self,
		key: ActorKey,
		text: &str,
		sources: BiasSources,
		roller: &mut impl Roller,
	) -> Result<RollResult, Error> {
		let expr = crate::parse::expression(text)?;
		self.roll(key, &expr, sources, roller)
	}

	/// Snapshot of an actor's bias state.
	#[must_use]
	pub fn bias_state(&self, key: ActorKey) -> BiasState {
		self.store.with_bias_state(key, |state| *state)
	}

	/// Sets an actor's luck.
	///
	/// # Errors
	/// If the luck is outside of `0..=100`, a [`ValidationError`] is returned.
	pub fn set_luck(&self, key: ActorKey, luck: i32) -> Result<(), ValidationError> {
		let luck = u8::try_from(luck)
			.ok()
			.filter(|luck| *luck <= MAX_LUCK)
			.ok_or_else(|| ValidationError::new(format!("Luck value must be between 0 and {MAX_LUCK}.")))?;
		self.store.with_bias_state(key, |state| state.luck = luck);
		tracing::debug!(%key, luck, "set luck");
		Ok(())
	}

	/// Sets an actor's karma debt, clamped to the configured limit. Returns the debt that was stored.
	pub fn set_karma_debt(&self, key: ActorKey, debt: f64) -> f64 {
		let span = tracing::debug_span!("set_karma_debt", %key);
		let _entered = span.enter();

		let debt = self.controller.clamp_debt(key, debt);
		self.store.with_bias_state(key, |state| state.karma_debt = debt);
		debt
	}

	/// Resets an actor's karma debt to 0.
	pub fn reset_karma(&self, key: ActorKey) {
		self.store.with_bias_state(key, |state| state.karma_debt = 0.0);
		tracing::debug!(%key, "reset karma");
	}

	/// Whether a scope has variant mode on.
	#[must_use]
	pub fn variant_mode(&self, scope: ScopeId) -> bool {
		self.store.rule_config(scope).variant_mode
	}

	/// Turns variant mode on or off for a scope.
	pub fn set_variant_mode(&self, scope: ScopeId, enabled: bool) {
		self.store.set_rule_config(scope, RuleConfig { variant_mode: enabled });
		tracing::debug!(scope = scope.0, enabled, "set variant mode");
	}

	/// Adds (or replaces) an initiative entry in a scope's group. Returns the stored entry.
	///
	/// # Errors
	/// If the name is blank, a [`ValidationError`] is returned.
	pub fn add_initiative(
		&self,
		scope: ScopeId,
		name: &str,
		modifier: ModifierExpression,
	) -> Result<InitiativeEntry, ValidationError> {
		self.store
			.with_initiative_group(scope, |group| group.add(name, modifier).cloned())
	}

	/// Parses a modifier and adds (or replaces) an initiative entry with it. Returns the stored entry.
	///
	/// # Errors
	/// If the name is blank or the modifier is invalid, a [`ValidationError`] is returned.
	#[cfg(feature = "parse")]
	pub fn add_initiative_str(
		&self,
		scope: ScopeId,
		name: &str,
		modifier: &str,
	) -> Result<InitiativeEntry, ValidationError> {
		let modifier = crate::parse::modifier_expression(modifier)?;
		self.add_initiative(scope, name, modifier)
	}

	/// Removes an initiative entry by name, case-insensitively.
	///
	/// # Errors
	/// If no entry matches, a [`ValidationError`] is returned.
	pub fn remove_initiative(&self, scope: ScopeId, name: &str) -> Result<InitiativeEntry, ValidationError> {
		self.store.with_initiative_group(scope, |group| group.remove(name))
	}

	/// Removes every initiative entry of a scope.
	pub fn clear_initiative(&self, scope: ScopeId) {
		self.store.with_initiative_group(scope, |group| group.clear());
	}

	/// Entries of a scope's initiative group, in case-folded name order.
	#[must_use]
	pub fn initiative_entries(&self, scope: ScopeId) -> Vec<InitiativeEntry> {
		self.store
			.with_initiative_group(scope, |group| group.entries().cloned().collect())
	}

	/// Rolls initiative for every entry of a scope's group.
	///
	/// # Errors
	/// If the group is empty, an [`Error::Validation`] is returned. If a roll hits an internal inconsistency, an
	/// [`Error::Internal`] is returned.
	pub fn roll_initiative(&self, scope: ScopeId, roller: &mut impl Roller) -> Result<InitiativeOrder, Error> {
		self.store.with_initiative_group(scope, |group| {
			if group.is_empty() {
				return Err(ValidationError::new("No initiative entries to roll").into());
			}
			roll_batch(group.entries(), roller)
		})
	}
}
