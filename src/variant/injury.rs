//! Critical injury tables, keyed by a 2d6 roll.

use std::fmt;

use crate::{
	dice::Roller,
	error::{Error, InternalInconsistency},
	roll,
	sampler::Bias,
};

/// Lowest possible 2d6 roll
pub const MIN_INJURY_ROLL: u8 = 2;

/// Highest possible 2d6 roll
pub const MAX_INJURY_ROLL: u8 = 12;

/// Part of the body that took the critical hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[expect(clippy::exhaustive_enums, reason = "Closed set of tables")]
pub enum Location {
	/// Body table
	Body,

	/// Head table
	Head,
}

impl Location {
	/// Table of injuries for the location, indexed by `roll - 2`.
	const fn table(self) -> &'static [CriticalInjury; 11] {
		match self {
			Self::Body => &BODY,
			Self::Head => &HEAD,
		}
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Body => "body",
			Self::Head => "head",
		})
	}
}

/// One entry of a critical injury table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct CriticalInjury {
	/// Name of the injury
	pub name: &'static str,

	/// What the injury does until it's treated
	pub effect: &'static str,

	/// Check that stabilizes the injury, or `N/A`
	pub quick_fix: &'static str,

	/// Check that removes the injury
	pub treatment: &'static str,
}

impl CriticalInjury {
	const fn new(
		name: &'static str,
		effect: &'static str,
		quick_fix: &'static str,
		treatment: &'static str,
	) -> Self {
		Self {
			name,
			effect,
			quick_fix,
			treatment,
		}
	}
}

impl fmt::Display for CriticalInjury {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}: {} (Quick Fix: {}; Treatment: {})",
			self.name, self.effect, self.quick_fix, self.treatment
		)
	}
}

const FOREIGN_OBJECT: CriticalInjury = CriticalInjury::new(
	"Foreign Object",
	"At the end of every Turn where you move further than 4m/yds on foot, you re-suffer this Critical Injury's Bonus \
	 Damage directly to your Hit Points.",
	"First Aid or Paramedic DV13",
	"Quick Fix removes Injury Effect permanently",
);

static BODY: [CriticalInjury; 11] = [
	CriticalInjury::new(
		"Dismembered Arm",
		"The Dismembered Arm is gone. You drop any items in that dismembered arm's hand immediately. Base Death Save \
		 Penalty is increased by 1.",
		"N/A",
		"Surgery DV17",
	),
	CriticalInjury::new(
		"Dismembered Hand",
		"The Dismembered Hand is gone. You drop any items in the dismembered hand immediately. Base Death Save Penalty \
		 is increased by 1.",
		"N/A",
		"Surgery DV17",
	),
	CriticalInjury::new(
		"Collapsed Lung",
		"-2 to MOVE (minimum 1). Base Death Save Penalty is increased by 1.",
		"Paramedic DV15",
		"Surgery DV15",
	),
	CriticalInjury::new(
		"Broken Ribs",
		"At the end of every Turn where you move further than 4m/yds on foot, you re-suffer this Critical Injury's \
		 Bonus Damage directly to your Hit Points.",
		"Paramedic DV13",
		"Paramedic DV15 or Surgery DV13",
	),
	CriticalInjury::new(
		"Broken Arm",
		"The Broken Arm cannot be used. You drop any items in that arm's hand immediately.",
		"Paramedic DV13",
		"Paramedic DV15 or Surgery DV13",
	),
	FOREIGN_OBJECT,
	CriticalInjury::new(
		"Broken Leg",
		"-4 to MOVE (minimum 1).",
		"Paramedic DV13",
		"Paramedic DV15 or Surgery DV13",
	),
	CriticalInjury::new(
		"Torn Muscle",
		"-2 to Melee Attacks.",
		"First Aid or Paramedic DV13",
		"Quick Fix removes Injury Effect permanently",
	),
	CriticalInjury::new(
		"Spinal Injury",
		"Next Turn, you cannot take an Action, but you can still take a Move Action. Base Death Save Penalty is \
		 increased by 1.",
		"Paramedic DV15",
		"Surgery DV15",
	),
	CriticalInjury::new(
		"Crushed Fingers",
		"-4 to all Actions involving that hand.",
		"Paramedic DV13",
		"Surgery DV15",
	),
	CriticalInjury::new(
		"Dismembered Leg",
		"The Dismembered Leg is gone. -6 to MOVE (minimum 1). You cannot dodge attacks. Base Death Save Penalty is \
		 increased by 1.",
		"N/A",
		"Surgery DV17",
	),
];

static HEAD: [CriticalInjury; 11] = [
	CriticalInjury::new(
		"Lost Eye",
		"The Lost Eye is gone. -4 to Ranged Attacks & Perception Checks involving vision. Base Death Save Penalty is \
		 increased by 1.",
		"N/A",
		"Surgery DV17",
	),
	CriticalInjury::new(
		"Brain Injury",
		"-2 to all Actions. Base Death Save Penalty is increased by 1.",
		"N/A",
		"Surgery DV17",
	),
	CriticalInjury::new(
		"Damaged Eye",
		"-2 to Ranged Attacks & Perception Checks involving vision.",
		"Paramedic DV15",
		"Surgery DV13",
	),
	CriticalInjury::new(
		"Concussion",
		"-2 to all Actions.",
		"First Aid or Paramedic DV13",
		"Quick Fix removes Injury Effect permanently",
	),
	CriticalInjury::new(
		"Broken Jaw",
		"-4 to all Actions involving speech.",
		"Paramedic DV13",
		"Paramedic or Surgery DV13",
	),
	FOREIGN_OBJECT,
	CriticalInjury::new(
		"Whiplash",
		"Base Death Save Penalty is increased by 1.",
		"Paramedic DV13",
		"Paramedic or Surgery DV13",
	),
	CriticalInjury::new(
		"Cracked Skull",
		"Aimed Shots to your head multiply the damage that gets through your SP by 3 instead of 2. Base Death Save \
		 Penalty is increased by 1.",
		"Paramedic DV15",
		"Paramedic or Surgery DV15",
	),
	CriticalInjury::new(
		"Damaged Ear",
		"Whenever you move further than 4m/yds on foot in a Turn, you cannot take a Move Action on your next Turn. \
		 Additionally you take a -2 to Perception Checks involving hearing.",
		"Paramedic DV13",
		"Surgery DV13",
	),
	CriticalInjury::new(
		"Crushed Windpipe",
		"You cannot speak. Base Death Save Penalty is increased by 1.",
		"N/A",
		"Surgery DV15",
	),
	CriticalInjury::new(
		"Lost Ear",
		"The Lost Ear is gone. Whenever you move further than 4m/yds on foot in a Turn, you cannot take a Move Action \
		 on your next Turn. Additionally you take a -4 to Perception Checks involving hearing. Base Death Save Penalty \
		 is increased by 1.",
		"N/A",
		"Surgery DV17",
	),
];

/// Looks up the injury for a 2d6 roll at a location. Rolls outside of `2..=12` have no injury.
///
/// # Examples
/// ```
/// use chimera::variant::injury::{lookup_critical_injury, Location};
///
/// assert_eq!(lookup_critical_injury(Location::Body, 8).map(|i| i.name), Some("Broken Leg"));
/// assert_eq!(lookup_critical_injury(Location::Head, 12).map(|i| i.name), Some("Lost Ear"));
/// assert!(lookup_critical_injury(Location::Head, 13).is_none());
/// ```
#[must_use]
pub fn lookup_critical_injury(location: Location, roll: u8) -> Option<&'static CriticalInjury> {
	let index = roll.checked_sub(MIN_INJURY_ROLL)?;
	location.table().get(usize::from(index))
}

/// Rolls 2d6 unbiased and looks up the resulting injury. Returns the roll alongside the injury.
///
/// # Errors
/// If a die lands outside of its faces, an [`Error::Internal`] is returned.
///
/// # Examples
/// ```
/// use chimera::{
/// 	dice::roller::Iter as IterRoller,
/// 	variant::injury::{roll_critical_injury, Location},
/// };
///
/// let (roll, injury) = roll_critical_injury(Location::Head, &mut IterRoller::new([2, 3]))?;
/// assert_eq!(roll, 5);
/// assert_eq!(injury.name, "Concussion");
/// # Ok::<(), chimera::Error>(())
/// ```
pub fn roll_critical_injury(
	location: Location,
	roller: &mut impl Roller,
) -> Result<(u8, &'static CriticalInjury), Error> {
	let first = roll::roll_checked_die(roller, 6, Bias::NEUTRAL)?;
	let second = roll::roll_checked_die(roller, 6, Bias::NEUTRAL)?;
	let total = u8::try_from(first + second)
		.map_err(|_err| Error::internal(InternalInconsistency::Overflow(format!("2d6 for {location} injury"))))?;

	let injury = lookup_critical_injury(location, total).ok_or_else(|| {
		Error::internal(InternalInconsistency::FaceOutOfDomain {
			face: u16::from(total),
			dice: "2d6".to_owned(),
		})
	})?;
	tracing::debug!(%location, roll = total, injury = injury.name, "rolled critical injury");
	Ok((total, injury))
}
