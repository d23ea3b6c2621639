//! Success-counting checks against a difficulty, and their one-time single-die reroll.
//!
//! A check rolls a pool of d6s and counts each die at or under the difficulty as a success. The check passes when the
//! number of successes reaches its baseline. If it falls short, one die may be rerolled once: the outcome then
//! becomes amended and can never be rerolled again.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
	data::Context,
	dice::{describe_rolls, modifier::Condition, DieResult, DieRoll, Modifier, Roller},
	roll::{Error, Roll, StateError},
	term::Describe,
};

/// Number of sides of the dice used for checks
pub const CHECK_SIDES: u32 = 6;

/// Whether a check rolls extra or fewer dice than normal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::exhaustive_enums, reason = "A check is either normal, advantaged, or disadvantaged")]
pub enum Advantage {
	/// Roll the normal number of dice
	#[default]
	Normal,

	/// Roll one extra die
	Advantage,

	/// Roll one fewer die
	Disadvantage,
}

impl Advantage {
	/// Adjusts a number of dice for the advantage.
	#[must_use]
	pub const fn adjust(self, dice: u32) -> u32 {
		match self {
			Self::Normal => dice,
			Self::Advantage => dice.saturating_add(1),
			Self::Disadvantage => dice.saturating_sub(1),
		}
	}
}

/// Success-counting check: roll a number of d6s, and count each at or under the difficulty as a success
///
/// # Examples
/// ```
/// use alea::{check::{Advantage, Check}, dice::roller::Iter as IterRoller};
///
/// let check = Check::new("Athletics", 3, 4).with_advantage(Advantage::Advantage);
/// assert_eq!(check.formula(), "4d6cs<=4");
///
/// let outcome = check.roll(&mut IterRoller::new([1, 6, 4, 5]))?;
/// assert_eq!(outcome.success_count(), 2);
/// assert!(!outcome.passed());
/// assert!(outcome.reroll_available());
/// # Ok::<(), alea::roll::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Check {
	/// Name of what's being checked
	pub label: String,

	/// Number of dice to roll before advantage, which is also the number of successes needed to pass
	pub dice: u32,

	/// Highest face that counts as a success
	pub difficulty: u32,

	/// Advantage or disadvantage on the check
	pub advantage: Advantage,
}

impl Check {
	/// Creates a new check without advantage.
	#[must_use]
	pub fn new(label: impl Into<String>, dice: u32, difficulty: u32) -> Self {
		Self {
			label: label.into(),
			dice,
			difficulty,
			advantage: Advantage::Normal,
		}
	}

	/// Sets the advantage of the check.
	#[must_use]
	pub fn with_advantage(mut self, advantage: Advantage) -> Self {
		self.advantage = advantage;
		self
	}

	/// Builds the formula the check rolls.
	#[must_use]
	pub fn formula(&self) -> String {
		format!(
			"{}d{CHECK_SIDES}cs<={}",
			self.advantage.adjust(self.dice),
			self.difficulty
		)
	}

	/// Rolls the check.
	///
	/// # Errors
	/// If the check's formula can't be evaluated, an error variant is returned.
	pub fn roll(&self, rng: &mut impl Roller) -> Result<RollOutcome, Error> {
		let mut roll = Roll::new(&self.formula(), &Context::new())?;
		roll.evaluate(rng)?;
		RollOutcome::from_roll(self.label.clone(), self.dice, &roll).map_err(Error::from)
	}
}

/// Marks each kept die as a success or failure against a condition, returning the number of successes.
///
/// # Examples
/// ```
/// use alea::{check::classify, dice::{modifier::Condition, DieRoll}};
///
/// let mut dice = vec![DieRoll::new(1), DieRoll::new(2), DieRoll::new(3), DieRoll::new(9)];
/// assert_eq!(classify(&mut dice, Condition::Lte(8)), 3);
/// assert_eq!(dice[3].success, Some(false));
/// ```
pub fn classify(dice: &mut [DieRoll], condition: Condition) -> u32 {
	condition.score(dice)
}

/// Whether an outcome has been amended by a reroll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::exhaustive_enums, reason = "Outcomes only ever go from presented to amended")]
pub enum OutcomeState {
	/// Freshly rolled
	#[default]
	Presented,

	/// A die has been rerolled, so no further rerolls are allowed
	Amended,
}

/// Result of a reroll request
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Reroll {
	/// The die was replaced.
	Applied {
		/// Die that was replaced (now inactive)
		replaced: DieRoll,

		/// Newly rolled die
		new: DieRoll,
	},

	/// The outcome was already amended, so nothing happened.
	Ignored,
}

/// Outcome of a success-counting check, ready to present and possibly amend with a single reroll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcome {
	/// Name of what was checked
	label: String,

	/// Highest face that counts as a success
	difficulty: i64,

	/// Number of successes needed to pass
	baseline: u32,

	/// Number of sides of the dice
	sides: u32,

	/// Condition each die is classified with
	condition: Condition,

	/// Every die, in roll order, including replaced ones
	dice: Vec<DieRoll>,

	/// Number of active dice that are successes
	success_count: u32,

	/// Whether a reroll has been used
	state: OutcomeState,
}

impl RollOutcome {
	/// Builds an outcome from an evaluated roll, using its first group of success-counting dice.
	///
	/// # Errors
	/// If the roll hasn't been evaluated or doesn't have any success-counting dice, an error variant is returned.
	pub fn from_roll(label: impl Into<String>, baseline: u32, roll: &Roll) -> Result<Self, StateError> {
		if !roll.is_evaluated() {
			return Err(StateError::NotEvaluated);
		}

		let (rolled, condition) = roll
			.dice()
			.iter()
			.find_map(|rolled| rolled.dice.success_condition().map(|cond| (rolled, cond)))
			.ok_or(StateError::NoCountingDice)?;

		Ok(Self {
			label: label.into(),
			difficulty: condition.val(),
			baseline,
			sides: rolled.dice.sides,
			condition,
			dice: rolled.rolls.clone(),
			success_count: rolled.successes(),
			state: OutcomeState::Presented,
		})
	}

	/// Rerolls a single die, replacing it with a new one and marking the outcome as amended.
	///
	/// The replaced die stays in the list as inactive, with the new die directly after it. Once an outcome is amended,
	/// further reroll requests are ignored.
	///
	/// # Errors
	/// If the index doesn't refer to an active die, an error variant is returned and the outcome is left as it was.
	///
	/// # Examples
	/// ```
	/// use alea::{check::{Check, Reroll}, dice::roller::Iter as IterRoller};
	///
	/// let mut outcome = Check::new("Stealth", 2, 3).roll(&mut IterRoller::new([2, 6]))?;
	/// assert_eq!(outcome.success_count(), 1);
	///
	/// let reroll = outcome.reroll(1, &mut IterRoller::new([3]))?;
	/// assert!(matches!(reroll, Reroll::Applied { .. }));
	/// assert_eq!(outcome.success_count(), 2);
	/// assert!(outcome.passed());
	///
	/// assert_eq!(outcome.reroll(0, &mut IterRoller::new([6]))?, Reroll::Ignored);
	/// # Ok::<(), alea::roll::Error>(())
	/// ```
	pub fn reroll(&mut self, index: usize, rng: &mut impl Roller) -> Result<Reroll, StateError> {
		if self.state == OutcomeState::Amended {
			tracing::debug!(label = %self.label, index, "ignoring reroll of an amended outcome");
			return Ok(Reroll::Ignored);
		}

		let Some(old) = self.dice.get_mut(index).filter(|die| die.is_kept()) else {
			return Err(StateError::InvalidDie { index });
		};

		let marker = Modifier::Reroll {
			cond: Condition::Eq(old.val),
			recurse: false,
		};
		old.drop(marker);
		let was_success = old.is_success();
		let replaced = old.clone();

		let mut new = rng.roll_die(self.sides);
		new.add(marker);
		new.success = Some(self.condition.check(new.val));

		self.success_count = self
			.success_count
			.saturating_sub(u32::from(was_success))
			.saturating_add(u32::from(new.is_success()));
		self.dice.insert(index + 1, new.clone());
		self.state = OutcomeState::Amended;

		tracing::debug!(label = %self.label, index, old = replaced.val, new = new.val, "rerolled die");
		Ok(Reroll::Applied { replaced, new })
	}

	/// Checks whether the check passed (reached its baseline of successes).
	#[must_use]
	pub const fn passed(&self) -> bool {
		self.success_count >= self.baseline
	}

	/// Checks whether a reroll is offered: the outcome hasn't been amended yet and the check fell short.
	#[must_use]
	pub fn reroll_available(&self) -> bool {
		self.state == OutcomeState::Presented && !self.passed()
	}

	/// Gets the name of what was checked.
	#[must_use]
	#[inline]
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Gets the highest face that counts as a success.
	#[must_use]
	#[inline]
	pub const fn difficulty(&self) -> i64 {
		self.difficulty
	}

	/// Gets the number of successes needed to pass.
	#[must_use]
	#[inline]
	pub const fn baseline(&self) -> u32 {
		self.baseline
	}

	/// Gets every die, in roll order, including replaced ones.
	#[must_use]
	#[inline]
	pub fn dice(&self) -> &[DieRoll] {
		&self.dice
	}

	/// Gets the number of active dice that are successes.
	#[must_use]
	#[inline]
	pub const fn success_count(&self) -> u32 {
		self.success_count
	}

	/// Gets whether a reroll has been used.
	#[must_use]
	#[inline]
	pub const fn state(&self) -> OutcomeState {
		self.state
	}

	/// Builds the render-ready view of every die, in roll order.
	#[must_use]
	pub fn breakdown(&self) -> Vec<DieResult> {
		self.dice.iter().map(DieRoll::result).collect()
	}

	/// Builds a short summary for a tooltip, like "Athletics: 2/3 successes".
	#[must_use]
	pub fn tooltip(&self) -> String {
		format!("{}: {}/{} successes", self.label, self.success_count, self.baseline)
	}
}

impl Describe for RollOutcome {
	/// Builds the check's dice and a list of every individual die (see [`DieRoll::fmt()`]), followed by the number of
	/// successes.
	///
	/// [`DieRoll::fmt()`]: crate::dice::DieRoll#method.fmt
	fn describe(&self, list_limit: Option<usize>) -> String {
		format!(
			"{}d{}cs{}{} = {}",
			self.dice.iter().filter(|die| die.is_original()).count(),
			self.sides,
			self.condition,
			describe_rolls(&self.dice, list_limit),
			self.success_count
		)
	}
}

impl fmt::Display for RollOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}
