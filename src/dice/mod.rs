//! All functionality for directly creating dice, rolling them, and working with their resulting rolls.
//!
//! This is the home of the dice "primitives". For using dice as part of a larger formula, see [`Term::Dice`].
//!
//! [`Term::Dice`]: crate::term::Term::Dice

pub mod modifier;
pub mod roller;

use core::{cmp, fmt};

use serde::{Deserialize, Serialize};

use self::modifier::Condition;
pub use self::{modifier::Modifier, roller::Roller};
use crate::term::Describe;

/// Most dice a single group can roll at once
pub const MAX_COUNT: u32 = 10_000;

/// A set of one or more rollable dice with a specific number of sides, along with a collection of modifiers to apply to
/// any resulting rolls from them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs, reason = "Mirrors the formula grammar exactly")]
pub struct Dice {
	/// Number of dice to roll
	pub count: u32,

	/// Number of sides for each die
	pub sides: u32,

	/// Modifiers to automatically apply to rolls from this set of dice, in written order
	pub modifiers: Vec<Modifier>,
}

impl Dice {
	/// Creates a new set of dice matching this one but without any modifiers.
	#[must_use]
	#[inline]
	pub const fn plain(&self) -> Self {
		Self::new(self.count, self.sides)
	}

	/// Creates a new set of dice with a given count and number of sides.
	#[must_use]
	pub const fn new(count: u32, sides: u32) -> Self {
		Self {
			count,
			sides,
			modifiers: Vec::new(),
		}
	}

	/// Creates a new dice builder.
	#[must_use]
	#[inline]
	pub fn builder() -> Builder {
		Builder::default()
	}

	/// Gets the counting condition of the dice, if they score successes rather than summing faces.
	#[must_use]
	pub fn success_condition(&self) -> Option<Condition> {
		self.modifiers.iter().find_map(|modifier| match modifier {
			Modifier::CountSuccess(cond) => Some(*cond),
			_ => None,
		})
	}
}

impl Default for Dice {
	/// Creates the default dice (1d6).
	#[inline]
	fn default() -> Self {
		Self::new(1, 6)
	}
}

impl fmt::Display for Dice {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{}d{}{}",
			self.count,
			self.sides,
			self.modifiers.iter().map(ToString::to_string).collect::<String>()
		)
	}
}

/// Single die produced from rolling [`Dice`] and optionally applying [`Modifier`]s.
/// Pool members are represented the same way, with their evaluated total as the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct DieRoll {
	/// Value that was rolled
	pub val: i64,

	/// Modifier that caused the addition of this die, if any
	pub added_by: Option<Modifier>,

	/// Modifier that caused the drop of this die, if any
	pub dropped_by: Option<Modifier>,

	/// Modifications that were made to the value of the roll
	pub changes: Vec<ValChange>,

	/// Whether the die scored as a success (`Some(true)`) or failure (`Some(false)`).
	/// Only set once a counting modifier has been applied.
	pub success: Option<bool>,
}

impl DieRoll {
	/// Marks this die roll as added by a given modifier, setting [`Self::added_by`].
	///
	/// # Panics
	/// Panics if `Self::added_by` is already [`Some`].
	pub fn add(&mut self, from: Modifier) {
		assert!(
			self.added_by.is_none(),
			"marking a die as added that has already been marked as added by another modifier"
		);
		self.added_by = Some(from);
	}

	/// Marks this die roll as dropped by a given modifier, setting [`Self::dropped_by`].
	///
	/// # Panics
	/// Panics if `Self::dropped_by` is already [`Some`].
	pub fn drop(&mut self, from: Modifier) {
		assert!(
			self.dropped_by.is_none(),
			"marking a die as dropped that has already been marked as dropped by another modifier"
		);
		self.dropped_by = Some(from);
	}

	/// Replaces the die roll's value and logs the change made.
	pub fn change(&mut self, from: Modifier, new_val: i64) {
		self.changes.push(ValChange {
			before: self.val,
			after: new_val,
			cause: from,
		});
		self.val = new_val;
	}

	/// Indicates whether this die roll was part of the original set (not added by a modifier).
	#[must_use]
	#[inline]
	pub const fn is_original(&self) -> bool {
		self.added_by.is_none()
	}

	/// Indicates whether this die roll was added as the result of a modifier being applied.
	/// This is the direct inverse of [`DieRoll::is_original()`].
	#[must_use]
	#[inline]
	pub const fn is_additional(&self) -> bool {
		self.added_by.is_some()
	}

	/// Indicates whether this die roll has been dropped by a modifier.
	#[must_use]
	#[inline]
	pub const fn is_dropped(&self) -> bool {
		self.dropped_by.is_some()
	}

	/// Indicates whether this die roll is being kept (has *not* been dropped by a modifier).
	/// This is the direct inverse of [`DieRoll::is_dropped()`].
	#[must_use]
	#[inline]
	pub const fn is_kept(&self) -> bool {
		self.dropped_by.is_none()
	}

	/// Indicates whether this die roll's value has been directly changed by a modifier.
	#[must_use]
	#[inline]
	pub fn is_changed(&self) -> bool {
		!self.changes.is_empty()
	}

	/// Indicates whether this die roll scored as a success.
	#[must_use]
	#[inline]
	pub const fn is_success(&self) -> bool {
		matches!(self.success, Some(true))
	}

	/// Indicates whether this die roll scored as a failure.
	#[must_use]
	#[inline]
	pub const fn is_failure(&self) -> bool {
		matches!(self.success, Some(false))
	}

	/// Builds the render-ready view of this die roll.
	#[must_use]
	pub const fn result(&self) -> DieResult {
		DieResult {
			face_value: self.val,
			active: self.is_kept(),
			success: self.success,
		}
	}

	/// Creates a new die roll with the given value.
	#[must_use]
	pub const fn new(val: i64) -> Self {
		Self {
			val,
			added_by: None,
			dropped_by: None,
			changes: Vec::new(),
			success: None,
		}
	}
}

impl PartialOrd for DieRoll {
	fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for DieRoll {
	fn cmp(&self, other: &Self) -> cmp::Ordering {
		self.val.cmp(&other.val)
	}
}

impl fmt::Display for DieRoll {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The format of a die roll is simply the plain numeric value of the roll.
	/// A changed value is appended with ` (m)`, a success with ` (s)`, a failure with ` (f)`, and a dropped roll with
	/// ` (d)`.
	///
	/// # Examples
	/// ```
	/// use alea::dice::DieRoll;
	///
	/// let roll = DieRoll::new(4);
	/// assert_eq!(roll.to_string(), "4");
	/// ```
	///
	/// ```
	/// use alea::dice::{DieRoll, Modifier};
	///
	/// let mut roll = DieRoll::new(16);
	/// let kh_mod = Modifier::KeepHigh(1);
	/// roll.drop(kh_mod);
	/// assert_eq!(roll.to_string(), "16 (d)");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}{}{}{}",
			self.val,
			if self.is_changed() { " (m)" } else { "" },
			match self.success {
				Some(true) => " (s)",
				Some(false) => " (f)",
				None => "",
			},
			if self.is_dropped() { " (d)" } else { "" }
		)
	}
}

/// Render-ready view of a single die: everything a presentation layer needs, independent of markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::exhaustive_structs, reason = "Rendering handoff record")]
pub struct DieResult {
	/// Value shown on the die
	pub face_value: i64,

	/// Whether the die still counts towards the result (not dropped or superseded)
	pub active: bool,

	/// Success classification, if a counting modifier was in effect
	pub success: Option<bool>,
}

/// Details about a modification made to a [`DieRoll`] as a result of a [`Modifier`] being applied to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct ValChange {
	/// Roll value before the change was made
	pub before: i64,

	/// Roll value after the change was made
	pub after: i64,

	/// Modifier that caused the change
	pub cause: Modifier,
}

/// Representation of the result from rolling [`Dice`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct Rolled {
	/// Each individual die roll that was made
	pub rolls: Vec<DieRoll>,

	/// Dice that were rolled to produce this
	pub dice: Dice,
}

impl Rolled {
	/// Calculates the total of the rolls. Dice with a counting modifier total the number of successes (or failures,
	/// when only failures are counted); all other dice total the sum of their kept roll values.
	///
	/// # Errors
	/// If there is an integer overflow while summing the die rolls, an error variant is returned.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{roller::{Iter as IterRoller, Roller}, Dice};
	///
	/// let dice: Dice = "3d6cs<=4".parse()?;
	/// let rolled = IterRoller::new([2, 5, 4]).roll(&dice, true)?;
	/// assert_eq!(rolled.total()?, 2);
	///
	/// let rolled = IterRoller::new([2, 5, 4]).roll(&dice.plain(), true)?;
	/// assert_eq!(rolled.total()?, 11);
	/// # Ok::<(), Box<dyn std::error::Error>>(())
	/// ```
	pub fn total(&self) -> Result<i64, Error> {
		tally(&self.rolls, &self.dice.modifiers)
	}

	/// Counts the kept rolls that scored as successes.
	#[must_use]
	pub fn successes(&self) -> u32 {
		count_where(&self.rolls, DieRoll::is_success)
	}

	/// Counts the kept rolls that scored as failures.
	#[must_use]
	pub fn failures(&self) -> u32 {
		count_where(&self.rolls, DieRoll::is_failure)
	}

	/// Builds the render-ready view of every roll, in roll order.
	#[must_use]
	pub fn results(&self) -> Vec<DieResult> {
		self.rolls.iter().map(DieRoll::result).collect()
	}

	/// Creates a new rolled set of dice from a given set of dice and an iterator of values.
	#[must_use]
	pub fn from_dice_and_rolls(dice: &Dice, rolls: impl IntoIterator<Item = i64>) -> Self {
		Self {
			rolls: rolls.into_iter().map(DieRoll::new).collect(),
			dice: dice.clone(),
		}
	}
}

impl Describe for Rolled {
	/// Builds a string of the dice the roll is from and a list of all of the individual rolled dice
	/// (see [`DieRoll::fmt()`]).
	///
	/// If `list_limit` is specified and there are more rolls than it, the list of rolled dice will be truncated and
	/// appended with "X more..." (where X is the remaining roll count past the max).
	///
	/// # Examples
	/// ```
	/// use alea::{dice::{Dice, DieRoll, Rolled}, term::Describe};
	///
	/// let dice = Dice::builder().count(4).sides(6).keep_high(2).build();
	/// let kh_mod = dice.modifiers[0];
	/// let rolled = Rolled {
	/// 	rolls: vec![
	/// 		DieRoll::new(6),
	/// 		{
	/// 			let mut roll = DieRoll::new(2);
	/// 			roll.drop(kh_mod);
	/// 			roll
	/// 		},
	/// 		DieRoll::new(5),
	/// 		{
	/// 			let mut roll = DieRoll::new(3);
	/// 			roll.drop(kh_mod);
	/// 			roll
	/// 		},
	/// 	],
	/// 	dice,
	/// };
	///
	/// assert_eq!(rolled.describe(None), "4d6kh2[6, 2 (d), 5, 3 (d)]");
	/// assert_eq!(rolled.describe(Some(2)), "4d6kh2[6, 2 (d), 2 more...]");
	/// ```
	///
	/// [`DieRoll::fmt()`]: ./struct.DieRoll.html#method.fmt
	fn describe(&self, list_limit: Option<usize>) -> String {
		format!("{}{}", self.dice, describe_rolls(&self.rolls, list_limit))
	}
}

impl fmt::Display for Rolled {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is equivalent to calling [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

/// Totals a set of rolls under the scoring rule implied by the given modifiers.
///
/// # Errors
/// If there is an integer overflow while summing the die rolls, an error variant is returned.
pub fn tally(rolls: &[DieRoll], modifiers: &[Modifier]) -> Result<i64, Error> {
	let counts_successes = modifiers.iter().any(|m| matches!(m, Modifier::CountSuccess(..)));
	let counts_failures = modifiers.iter().any(|m| matches!(m, Modifier::CountFailure(..)));

	if counts_successes {
		return Ok(i64::from(count_where(rolls, DieRoll::is_success)));
	}
	if counts_failures {
		return Ok(i64::from(count_where(rolls, DieRoll::is_failure)));
	}

	let mut sum: i64 = 0;
	for r in rolls.iter().filter(|roll| roll.is_kept()) {
		sum = sum.checked_add(r.val).ok_or(Error::Overflow)?;
	}
	Ok(sum)
}

/// Counts the kept rolls matching a predicate.
fn count_where(rolls: &[DieRoll], pred: impl Fn(&DieRoll) -> bool) -> u32 {
	let count = rolls.iter().filter(|roll| roll.is_kept() && pred(roll)).count();
	u32::try_from(count).unwrap_or(u32::MAX)
}

/// Renders a bracketed, optionally truncated list of rolls.
pub(crate) fn describe_rolls(rolls: &[DieRoll], list_limit: Option<usize>) -> String {
	let list_limit = list_limit.unwrap_or(usize::MAX);
	let truncated_rolls = rolls.len().saturating_sub(list_limit);

	format!(
		"[{}{}]",
		rolls
			.iter()
			.take(list_limit)
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(", "),
		if truncated_rolls > 0 {
			format!(", {truncated_rolls} more...")
		} else {
			String::new()
		}
	)
}

/// An error resulting from a dice operation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// There was an integer overflow when performing mathematical operations on roll values.
	#[error("integer overflow")]
	Overflow,

	/// Rolling the dice specified would result in infinite rolls.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{roller::{FastRand as FastRandRoller, Roller}, Dice, Error};
	///
	/// let dice = Dice::builder().count(4).sides(1).explode(None, true).build();
	/// assert!(matches!(FastRandRoller::default().roll(&dice, true), Err(Error::InfiniteRolls { .. })));
	/// ```
	#[error("{modifier} on d{sides} would result in infinite rolls")]
	InfiniteRolls {
		/// Modifier that would never stop rolling
		modifier: Modifier,

		/// Number of sides of the dice it was applied to
		sides: u32,
	},

	/// The dice ask for more rolls than a single group may make.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{roller::{Val as ValRoller, Roller}, Dice, Error};
	///
	/// let dice = Dice::new(4_000_000_000, 6);
	/// assert!(matches!(ValRoller(1).roll(&dice, true), Err(Error::TooManyDice { .. })));
	/// ```
	#[error("{count} dice is more than the limit of {max}")]
	TooManyDice {
		/// Number of dice requested
		count: u32,

		/// Most dice allowed in a group
		max: u32,
	},

	/// The provided symbol doesn't match to a known condition.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{modifier::Condition, Error};
	///
	/// let cond = Condition::from_symbol_and_val("!", 4);
	/// assert!(matches!(cond, Err(Error::UnknownCondition(..))));
	/// ```
	#[error("unknown condition symbol: {0}")]
	UnknownCondition(String),
}

/// Builds [`Dice`] with a fluent interface.
///
/// # Examples
///
/// ## Basic dice
/// ```
/// use alea::Dice;
///
/// let dice = Dice::builder().count(2).sides(6).build();
/// assert_eq!(dice, Dice::new(2, 6));
/// ```
///
/// ## Multiple modifiers
/// ```
/// use alea::dice::{modifier::{Condition, Modifier}, Dice};
///
/// let dice = Dice::builder()
/// 	.count(4)
/// 	.sides(6)
/// 	.reroll(Condition::Eq(1), false)
/// 	.count_success(Condition::Lte(3))
/// 	.build();
/// assert_eq!(
/// 	dice,
/// 	Dice {
/// 		count: 4,
/// 		sides: 6,
/// 		modifiers: vec![
/// 			Modifier::Reroll {
/// 				cond: Condition::Eq(1),
/// 				recurse: false
/// 			},
/// 			Modifier::CountSuccess(Condition::Lte(3)),
/// 		],
/// 	},
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder(Dice);

impl Builder {
	/// Sets the number of dice to roll.
	#[must_use]
	pub const fn count(mut self, count: u32) -> Self {
		self.0.count = count;
		self
	}

	/// Sets the number of sides per die.
	#[must_use]
	pub const fn sides(mut self, sides: u32) -> Self {
		self.0.sides = sides;
		self
	}

	/// Adds a reroll modifier to the dice.
	#[must_use]
	pub fn reroll(mut self, cond: Condition, recurse: bool) -> Self {
		self.0.modifiers.push(Modifier::Reroll { cond, recurse });
		self
	}

	/// Adds an exploding modifier to the dice.
	#[must_use]
	pub fn explode(mut self, cond: Option<Condition>, recurse: bool) -> Self {
		self.0.modifiers.push(Modifier::Explode { cond, recurse });
		self
	}

	/// Adds a keep highest modifier to the dice.
	#[must_use]
	pub fn keep_high(mut self, count: u32) -> Self {
		self.0.modifiers.push(Modifier::KeepHigh(count));
		self
	}

	/// Adds a keep lowest modifier to the dice.
	#[must_use]
	pub fn keep_low(mut self, count: u32) -> Self {
		self.0.modifiers.push(Modifier::KeepLow(count));
		self
	}

	/// Adds a drop highest modifier to the dice.
	#[must_use]
	pub fn drop_high(mut self, count: u32) -> Self {
		self.0.modifiers.push(Modifier::DropHigh(count));
		self
	}

	/// Adds a drop lowest modifier to the dice.
	#[must_use]
	pub fn drop_low(mut self, count: u32) -> Self {
		self.0.modifiers.push(Modifier::DropLow(count));
		self
	}

	/// Adds a minimum modifier to the dice.
	#[must_use]
	pub fn min(mut self, min: i64) -> Self {
		self.0.modifiers.push(Modifier::Min(min));
		self
	}

	/// Adds a maximum modifier to the dice.
	#[must_use]
	pub fn max(mut self, max: i64) -> Self {
		self.0.modifiers.push(Modifier::Max(max));
		self
	}

	/// Adds a success-counting modifier to the dice.
	#[must_use]
	pub fn count_success(mut self, cond: Condition) -> Self {
		self.0.modifiers.push(Modifier::CountSuccess(cond));
		self
	}

	/// Adds a failure-counting modifier to the dice.
	#[must_use]
	pub fn count_failure(mut self, cond: Condition) -> Self {
		self.0.modifiers.push(Modifier::CountFailure(cond));
		self
	}

	/// Finalizes the dice.
	#[must_use]
	pub fn build(self) -> Dice {
		self.0
	}
}
