//! Keyed mutable state the engine reads and updates around every roll.
//!
//! The engine never owns state of its own. Everything it needs is reached through a [`StateStore`], which hands out
//! exclusive access to one key at a time. Operations on different keys are independent; operations on the same key
//! are serialized for as long as the closure runs.

use std::{
	collections::HashMap,
	fmt,
	hash::Hash,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{bias::BiasState, variant::initiative::InitiativeGroup, variant::RuleConfig};

/// Identifier of a scope (a channel, table, or campaign) that rule and initiative state belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Newtype")]
pub struct ScopeId(pub u64);

/// Identifier of an actor (a player) within a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Newtype")]
pub struct ActorId(pub u64);

/// Key of one actor's bias state within one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct ActorKey {
	/// Scope the state belongs to
	pub scope: ScopeId,

	/// Actor the state belongs to
	pub actor: ActorId,
}

impl ActorKey {
	/// Creates a key.
	#[must_use]
	#[inline]
	pub const fn new(scope: ScopeId, actor: ActorId) -> Self {
		Self { scope, actor }
	}
}

impl fmt::Display for ActorKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.scope.0, self.actor.0)
	}
}

/// Source of the state the engine works on.
///
/// Missing records are created with their defaults on first access. Implementations must give each closure exclusive
/// access to its key for the whole call.
pub trait StateStore {
	/// Runs `f` with exclusive access to an actor's bias state.
	fn with_bias_state<R>(&self, key: ActorKey, f: impl FnOnce(&mut BiasState) -> R) -> R;

	/// Rule configuration of a scope.
	fn rule_config(&self, scope: ScopeId) -> RuleConfig;

	/// Replaces the rule configuration of a scope.
	fn set_rule_config(&self, scope: ScopeId, config: RuleConfig);

	/// Runs `f` with exclusive access to a scope's initiative group.
	fn with_initiative_group<R>(&self, scope: ScopeId, f: impl FnOnce(&mut InitiativeGroup) -> R) -> R;
}

/// In-memory [`StateStore`] with one lock per key
///
/// # Examples
/// ```
/// use chimera::store::{ActorId, ActorKey, MemoryStore, ScopeId, StateStore};
///
/// let store = MemoryStore::new();
/// let key = ActorKey::new(ScopeId(1), ActorId(7));
/// store.with_bias_state(key, |state| state.luck = 80);
/// assert_eq!(store.with_bias_state(key, |state| state.luck), 80);
/// assert_eq!(store.with_bias_state(ActorKey::new(ScopeId(2), ActorId(7)), |state| state.luck), 50);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
	/// Bias state per actor
	bias: KeyedCells<ActorKey, BiasState>,

	/// Rule configuration per scope
	rules: KeyedCells<ScopeId, RuleConfig>,

	/// Initiative group per scope
	initiative: KeyedCells<ScopeId, InitiativeGroup>,
}

impl MemoryStore {
	/// Creates an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl StateStore for MemoryStore {
	fn with_bias_state<R>(&self, key: ActorKey, f: impl FnOnce(&mut BiasState) -> R) -> R {
		self.bias.with(key, f)
	}

	fn rule_config(&self, scope: ScopeId) -> RuleConfig {
		self.rules.with(scope, |config| *config)
	}

	fn set_rule_config(&self, scope: ScopeId, config: RuleConfig) {
		self.rules.with(scope, |current| *current = config);
	}

	fn with_initiative_group<R>(&self, scope: ScopeId, f: impl FnOnce(&mut InitiativeGroup) -> R) -> R {
		self.initiative.with(scope, f)
	}
}

/// Map of independently locked values. The map lock is only held long enough to find or create a key's cell.
#[derive(Debug)]
struct KeyedCells<K, V> {
	cells: Mutex<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> Default for KeyedCells<K, V> {
	fn default() -> Self {
		Self {
			cells: Mutex::new(HashMap::new()),
		}
	}
}

impl<K: Eq + Hash, V: Default> KeyedCells<K, V> {
	fn with<R>(&self, key: K, f: impl FnOnce(&mut V) -> R) -> R {
		let cell = Arc::clone(lock(&self.cells).entry(key).or_default());
		let mut value = lock(&cell);
		f(&mut value)
	}
}

/// Locks a mutex, carrying on with the inner value if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
