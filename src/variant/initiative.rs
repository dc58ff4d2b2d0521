//! Group initiative: a named set of modifiers rolled together into a turn order.

use std::{
	collections::{btree_map::Entry, BTreeMap},
	fmt,
};

use super::VARIANT_DIE;
use crate::{
	dice::Roller,
	error::{Error, InternalInconsistency, ValidationError},
	expr::ModifierExpression,
	roll,
	sampler::Bias,
};

/// One participant in a group's initiative
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain data")]
pub struct InitiativeEntry {
	/// Name as it was last entered
	pub name: String,

	/// Modifier added to the participant's d10
	pub modifier: ModifierExpression,
}

impl InitiativeEntry {
	/// Creates an entry.
	#[must_use]
	pub fn new(name: impl Into<String>, modifier: ModifierExpression) -> Self {
		Self {
			name: name.into(),
			modifier,
		}
	}

	/// Total of the entry's modifier.
	#[must_use]
	#[inline]
	pub fn modifier_total(&self) -> i32 {
		self.modifier.total()
	}
}

/// Initiative entries of one scope, keyed by case-folded name
///
/// # Examples
/// ```
/// use chimera::{expr::ModifierExpression, variant::initiative::InitiativeGroup};
///
/// let mut group = InitiativeGroup::default();
/// group.add("Darius", ModifierExpression::new(vec![14, 2]))?;
/// group.add("DARIUS", ModifierExpression::new(vec![12]))?;
/// assert_eq!(group.len(), 1);
/// assert_eq!(group.get("darius").map(|e| e.name.as_str()), Some("DARIUS"));
/// # Ok::<(), chimera::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitiativeGroup {
	/// Entries keyed by their case-folded name
	entries: BTreeMap<String, InitiativeEntry>,
}

impl InitiativeGroup {
	/// Adds an entry, replacing any entry whose name matches case-insensitively. The new name's casing is kept.
	///
	/// # Errors
	/// If the name is blank, a [`ValidationError`] is returned.
	pub fn add(&mut self, name: &str, modifier: ModifierExpression) -> Result<&InitiativeEntry, ValidationError> {
		let name = name.trim();
		if name.is_empty() {
			return Err(ValidationError::new("Initiative name cannot be empty"));
		}

		let entry = InitiativeEntry::new(name, modifier);
		let slot = match self.entries.entry(fold(name)) {
			Entry::Occupied(mut occupied) => {
				occupied.insert(entry);
				occupied.into_mut()
			}
			Entry::Vacant(vacant) => vacant.insert(entry),
		};
		Ok(slot)
	}

	/// Parses a modifier and adds an entry with it (see [`Self::add()`]).
	///
	/// # Errors
	/// If the name is blank or the modifier is invalid, a [`ValidationError`] is returned.
	#[cfg(feature = "parse")]
	pub fn add_parsed(&mut self, name: &str, modifier: &str) -> Result<&InitiativeEntry, ValidationError> {
		let modifier = crate::parse::modifier_expression(modifier)?;
		self.add(name, modifier)
	}

	/// Removes the entry matching a name case-insensitively.
	///
	/// # Errors
	/// If no entry matches, a [`ValidationError`] is returned.
	pub fn remove(&mut self, name: &str) -> Result<InitiativeEntry, ValidationError> {
		self.entries
			.remove(&fold(name.trim()))
			.ok_or_else(|| ValidationError::new(format!("No initiative entry named '{}'", name.trim())))
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Finds the entry matching a name case-insensitively.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&InitiativeEntry> {
		self.entries.get(&fold(name.trim()))
	}

	/// Iterates over the entries in case-folded name order.
	pub fn entries(&self) -> impl Iterator<Item = &InitiativeEntry> {
		self.entries.values()
	}

	/// Number of entries.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the group has no entries.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Key used to match names regardless of case.
fn fold(name: &str) -> String {
	name.to_lowercase()
}

/// Rolled initiative of one participant
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct InitiativeRoll {
	/// Position in the turn order, starting at 1
	pub rank: usize,

	/// Participant's name
	pub name: String,

	/// Face of the d10
	pub base: u16,

	/// Face of the extra d10 added when the base was a 10
	pub extra: Option<u16>,

	/// Modifier that was added
	pub modifier: ModifierExpression,

	/// Final initiative
	pub total: i32,
}

impl InitiativeRoll {
	/// How the total was reached, e.g. `7+14+2`, `10!+4+14+2`, or `7-2`.
	#[must_use]
	pub fn breakdown(&self) -> String {
		let mut breakdown = self.base.to_string();
		if let Some(extra) = self.extra {
			breakdown.push_str(&format!("!+{extra}"));
		}
		for term in self.modifier.terms() {
			breakdown.push_str(&format!("{term:+}"));
		}
		breakdown
	}
}

impl fmt::Display for InitiativeRoll {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}. {} [{}] ({})", self.rank, self.name, self.total, self.breakdown())
	}
}

/// Initiative rolls sorted into turn order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitiativeOrder(Vec<InitiativeRoll>);

impl InitiativeOrder {
	/// Rolls in turn order.
	#[must_use]
	pub fn rolls(&self) -> &[InitiativeRoll] {
		&self.0
	}

	/// Consumes the order, returning the rolls.
	#[must_use]
	pub fn into_rolls(self) -> Vec<InitiativeRoll> {
		self.0
	}
}

impl fmt::Display for InitiativeOrder {
	/// Writes one `<rank>. <name> [<total>] (<breakdown>)` line per participant.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, roll) in self.0.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{roll}")?;
		}
		Ok(())
	}
}

/// Rolls a d10 for every entry and sorts them into turn order.
///
/// A 10 adds exactly one extra d10 (no chaining); a 1 is never penalized. Higher totals go first; equal totals are
/// ordered by case-folded name, then by name.
///
/// # Errors
/// If a die lands outside of its faces or a total overflows, an [`Error::Internal`] is returned.
///
/// # Examples
/// ```
/// use chimera::{
/// 	dice::roller::Iter as IterRoller,
/// 	expr::ModifierExpression,
/// 	variant::initiative::{roll_batch, InitiativeEntry},
/// };
///
/// let entries = [
/// 	InitiativeEntry::new("Darius", ModifierExpression::new(vec![14, 2])),
/// 	InitiativeEntry::new("Sasha", ModifierExpression::new(vec![-2])),
/// ];
/// let order = roll_batch(&entries, &mut IterRoller::new([7, 10, 4]))?;
/// assert_eq!(order.to_string(), "1. Darius [23] (7+14+2)\n2. Sasha [12] (10!+4-2)");
/// # Ok::<(), chimera::Error>(())
/// ```
pub fn roll_batch<'e>(
	entries: impl IntoIterator<Item = &'e InitiativeEntry>,
	roller: &mut impl Roller,
) -> Result<InitiativeOrder, Error> {
	let mut rolls = Vec::new();
	for entry in entries {
		let base = roll::roll_checked_die(roller, VARIANT_DIE, Bias::NEUTRAL)?;
		let extra = if base == VARIANT_DIE {
			Some(roll::roll_checked_die(roller, VARIANT_DIE, Bias::NEUTRAL)?)
		} else {
			None
		};

		let total = i32::from(base)
			.checked_add(extra.map_or(0, i32::from))
			.and_then(|total| total.checked_add(entry.modifier_total()))
			.ok_or_else(|| Error::internal(InternalInconsistency::Overflow(format!("initiative of {}", entry.name))))?;
		tracing::debug!(name = %entry.name, base, ?extra, total, "rolled initiative");

		rolls.push(InitiativeRoll {
			rank: 0,
			name: entry.name.clone(),
			base,
			extra,
			modifier: entry.modifier.clone(),
			total,
		});
	}

	rolls.sort_by(|a, b| {
		b.total
			.cmp(&a.total)
			.then_with(|| fold(&a.name).cmp(&fold(&b.name)))
			.then_with(|| a.name.cmp(&b.name))
	});
	for (i, roll) in rolls.iter_mut().enumerate() {
		roll.rank = i + 1;
	}

	Ok(InitiativeOrder(rolls))
}
