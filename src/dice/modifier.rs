//! Dice modifiers and their related types.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{roller::Roller, DieRoll, Error};

/// Routines that can be applied to [`Dice`](super::Dice) (or a pool of sub-formulas) to automatically manipulate the
/// resulting rolls as part of their rolling process. Modifiers apply in written order; each one only ever looks at the
/// rolls that are still kept after the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Modifier {
	/// Rerolls (drops original and adds a newly-rolled die) dice that meet a condition.
	///
	/// # Examples
	///
	/// ## Reroll once (`r`)
	/// ```
	/// use alea::dice::{modifier::{Condition, Modifier}, roller::{Iter as IterRoller, Roller}, Dice, Rolled};
	///
	/// // Build the 4d6r1 dice set and create a roller that has predetermined values for the dice rolls
	/// let dice = Dice::builder().count(4).sides(6).reroll(Condition::Eq(1), false).build();
	/// let premade_rolls = [3, 6, 1, 2, 1];
	/// let mut rng = IterRoller::new(premade_rolls);
	///
	/// // Roll the dice without applying its modifiers, then apply an r1 modifier by hand.
	/// let mut rolled = rng.roll(&dice, false)?;
	/// let r1_mod = Modifier::Reroll {
	/// 	cond: Condition::Eq(1),
	/// 	recurse: false,
	/// };
	/// r1_mod.apply(&mut rolled.rolls, dice.sides, &mut rng)?;
	///
	/// // The 1 is dropped and a new 1 is rolled in its place, which is kept since the reroll only happens once.
	/// // Final expected rolled dice set, after r1 modifier: 4d6r=1[3, 6, 1 (d), 2, 1]
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[2].drop(r1_mod);
	/// expected.rolls[4].add(r1_mod);
	/// assert_eq!(rolled, expected);
	/// # Ok::<(), alea::dice::Error>(())
	/// ```
	Reroll {
		/// Condition that rolls must pass in order to be rerolled
		cond: Condition,

		/// Whether the reroll should be done repeatedly until the rerolled die no longer meets the condition
		recurse: bool,
	},

	/// Explodes (keeps original and adds an additional newly-rolled die) dice that meet a condition.
	///
	/// # Examples
	///
	/// ## Explode recursively (`x`)
	/// ```
	/// use alea::dice::{modifier::{Condition, Modifier}, roller::{Iter as IterRoller, Roller}, Dice, Rolled};
	///
	/// let dice = Dice::builder().count(4).sides(6).explode(None, true).build();
	/// let premade_rolls = [3, 6, 1, 2, 6, 4];
	/// let mut rng = IterRoller::new(premade_rolls);
	/// let rolled = rng.roll(&dice, true)?;
	///
	/// // The 6 explodes into another 6, which explodes again into a 4.
	/// let x_mod = dice.modifiers[0];
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[4].add(x_mod);
	/// expected.rolls[5].add(x_mod);
	/// assert_eq!(rolled, expected);
	/// # Ok::<(), alea::dice::Error>(())
	/// ```
	Explode {
		/// Condition that rolls must pass in order to explode.
		/// If `None`, the roll values must be equal to the number of sides of the dice being rolled.
		cond: Option<Condition>,

		/// Whether the explosion should be done repeatedly for any additional rolls that also meet the condition
		recurse: bool,
	},

	/// Keeps only the highest x dice, dropping the rest.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{modifier::Modifier, roller::{Iter as IterRoller, Roller}, Dice, Rolled};
	///
	/// let dice = Dice::builder().count(4).sides(6).keep_high(2).build();
	/// let premade_rolls = [3, 6, 1, 2];
	/// let rolled = IterRoller::new(premade_rolls).roll(&dice, true)?;
	///
	/// // Final expected rolled dice set, after kh2 modifier: 4d6kh2[3, 6, 1 (d), 2 (d)]
	/// let mut expected = Rolled::from_dice_and_rolls(&dice, premade_rolls);
	/// expected.rolls[2].drop(Modifier::KeepHigh(2));
	/// expected.rolls[3].drop(Modifier::KeepHigh(2));
	/// assert_eq!(rolled, expected);
	/// assert_eq!(rolled.total()?, 9);
	/// # Ok::<(), alea::dice::Error>(())
	/// ```
	KeepHigh(u32),

	/// Keeps only the lowest x dice, dropping the rest.
	KeepLow(u32),

	/// Drops the highest x dice, keeping the rest.
	DropHigh(u32),

	/// Drops the lowest x dice, keeping the rest.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{roller::{Iter as IterRoller, Roller}, Dice};
	///
	/// let dice = Dice::builder().count(4).sides(6).drop_low(1).build();
	/// let rolled = IterRoller::new([3, 6, 1, 2]).roll(&dice, true)?;
	/// assert_eq!(rolled.total()?, 11);
	/// # Ok::<(), alea::dice::Error>(())
	/// ```
	DropLow(u32),

	/// Replaces values of rolls lower than a minimum with the minimum.
	Min(i64),

	/// Replaces values of rolls higher than a maximum with the maximum.
	Max(i64),

	/// Marks every kept roll as a success or failure depending on whether it meets the condition.
	/// The dice then total the number of successes instead of the sum of their values.
	///
	/// # Examples
	/// ```
	/// use alea::dice::{modifier::Condition, roller::{Iter as IterRoller, Roller}, Dice};
	///
	/// let dice = Dice::builder().count(3).sides(6).count_success(Condition::Lte(3)).build();
	/// let rolled = IterRoller::new([2, 5, 3]).roll(&dice, true)?;
	/// assert_eq!(rolled.rolls.iter().map(|roll| roll.success).collect::<Vec<_>>(), [Some(true), Some(false), Some(true)]);
	/// assert_eq!(rolled.total()?, 2);
	/// # Ok::<(), alea::dice::Error>(())
	/// ```
	CountSuccess(Condition),

	/// Marks every kept roll meeting the condition as a failure.
	/// Without a success-counting modifier, the dice then total the number of failures.
	CountFailure(Condition),
}

impl Modifier {
	/// Applies the modifier to a set of rolls from dice with the given number of sides, using a given roller if
	/// additional die rolls are needed.
	///
	/// # Errors
	/// If applying the modifier would result in infinite additional die rolls, an error variant is returned.
	pub fn apply(self, rolls: &mut Vec<DieRoll>, sides: u32, rng: &mut impl Roller) -> Result<(), Error> {
		match self {
			Self::Reroll { cond, recurse } => self.apply_reroll(rolls, sides, rng, cond, recurse)?,
			Self::Explode { cond, recurse } => self.apply_explode(rolls, sides, rng, cond, recurse)?,
			Self::KeepHigh(count) => self.apply_keep(rolls, count, true),
			Self::KeepLow(count) => self.apply_keep(rolls, count, false),
			Self::DropHigh(count) => self.apply_drop(rolls, count, true),
			Self::DropLow(count) => self.apply_drop(rolls, count, false),
			Self::Min(min) => self.apply_min(rolls, min),
			Self::Max(max) => self.apply_max(rolls, max),
			Self::CountSuccess(cond) => Self::apply_count_success(rolls, cond),
			Self::CountFailure(cond) => Self::apply_count_failure(rolls, cond),
		}

		Ok(())
	}

	/// Indicates whether the modifier only selects or scores existing rolls, never rolling new dice or changing values.
	/// Only these modifiers are meaningful on pools.
	#[must_use]
	pub const fn is_selective(&self) -> bool {
		matches!(
			self,
			Self::KeepHigh(..)
				| Self::KeepLow(..)
				| Self::DropHigh(..)
				| Self::DropLow(..)
				| Self::CountSuccess(..)
				| Self::CountFailure(..)
		)
	}

	/// Applies the [`Self::Reroll`] variant to a set of rolled dice.
	fn apply_reroll(
		self,
		rolls: &mut Vec<DieRoll>,
		sides: u32,
		rng: &mut impl Roller,
		cond: Condition,
		recurse: bool,
	) -> Result<(), Error> {
		// Prevent recursively rerolling dice that would result in infinite rerolls
		if recurse && cond.always_met(sides) {
			return Err(Error::InfiniteRolls { modifier: self, sides });
		}

		loop {
			// Determine which rolls qualify for reroll
			let mut to_reroll = rolls
				.iter_mut()
				.filter(|roll| roll.is_kept())
				.filter(|roll| cond.check(roll.val))
				.collect::<Vec<_>>();

			if to_reroll.is_empty() {
				break;
			}

			// Roll additional dice and drop the originals
			let mut rerolls = Vec::with_capacity(to_reroll.len());
			for roll in &mut to_reroll {
				let mut reroll = rng.roll_die(sides);
				reroll.add(self);
				rerolls.push(reroll);
				roll.drop(self);
			}

			rolls.append(&mut rerolls);

			if !recurse {
				break;
			}
		}

		Ok(())
	}

	/// Applies the [`Self::Explode`] variant to a set of rolled dice.
	fn apply_explode(
		self,
		rolls: &mut Vec<DieRoll>,
		sides: u32,
		rng: &mut impl Roller,
		cond: Option<Condition>,
		recurse: bool,
	) -> Result<(), Error> {
		let explodes = |roll: &DieRoll| match cond {
			Some(cond) => cond.check(roll.val),
			None => roll.val == i64::from(sides),
		};

		// Prevent recursively exploding dice that would result in infinite explosions
		if recurse {
			let endless = match cond {
				Some(cond) => cond.always_met(sides),
				None => sides == 1,
			};
			if endless {
				return Err(Error::InfiniteRolls { modifier: self, sides });
			}
		}

		// Determine how many initial rolls qualify for explosion
		let mut to_explode = rolls.iter().filter(|roll| roll.is_kept()).filter(|roll| explodes(roll)).count();

		while to_explode > 0 {
			let mut explosions = Vec::with_capacity(to_explode);
			for _ in 0..to_explode {
				let mut roll = rng.roll_die(sides);
				roll.add(self);
				explosions.push(roll);
			}

			to_explode = if recurse {
				explosions.iter().filter(|roll| explodes(roll)).count()
			} else {
				0
			};

			rolls.append(&mut explosions);
		}

		Ok(())
	}

	/// Applies the keep variants to a set of rolled dice.
	fn apply_keep(self, rolls: &mut [DieRoll], count: u32, highest: bool) {
		let mut refs = rolls.iter_mut().filter(|roll| roll.is_kept()).collect::<Vec<_>>();
		refs.sort();
		if highest {
			refs.reverse();
		}
		refs.iter_mut().skip(count as usize).for_each(|roll| roll.drop(self));
	}

	/// Applies the drop variants to a set of rolled dice.
	fn apply_drop(self, rolls: &mut [DieRoll], count: u32, highest: bool) {
		let mut refs = rolls.iter_mut().filter(|roll| roll.is_kept()).collect::<Vec<_>>();
		refs.sort();
		if highest {
			refs.reverse();
		}
		refs.iter_mut().take(count as usize).for_each(|roll| roll.drop(self));
	}

	/// Applies the [`Self::Min`] variant to a set of rolled dice.
	fn apply_min(self, rolls: &mut [DieRoll], min: i64) {
		rolls
			.iter_mut()
			.filter(|roll| roll.is_kept() && roll.val < min)
			.for_each(|roll| roll.change(self, min));
	}

	/// Applies the [`Self::Max`] variant to a set of rolled dice.
	fn apply_max(self, rolls: &mut [DieRoll], max: i64) {
		rolls
			.iter_mut()
			.filter(|roll| roll.is_kept() && roll.val > max)
			.for_each(|roll| roll.change(self, max));
	}

	/// Applies the [`Self::CountSuccess`] variant to a set of rolled dice.
	fn apply_count_success(rolls: &mut [DieRoll], cond: Condition) {
		cond.score(rolls);
	}

	/// Applies the [`Self::CountFailure`] variant to a set of rolled dice.
	fn apply_count_failure(rolls: &mut [DieRoll], cond: Condition) {
		rolls
			.iter_mut()
			.filter(|roll| roll.is_kept() && cond.check(roll.val))
			.for_each(|roll| roll.success = Some(false));
	}
}

impl fmt::Display for Modifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let count = |count: u32| if count > 1 { count.to_string() } else { String::new() };
		match self {
			Self::Reroll { cond, recurse } => write!(f, "r{}{cond}", if *recurse { "r" } else { "" }),
			Self::Explode { cond, recurse } => write!(
				f,
				"x{}{}",
				if *recurse { "" } else { "o" },
				cond.map(|cond| cond.to_string()).unwrap_or_default()
			),
			Self::KeepHigh(n) => write!(f, "kh{}", count(*n)),
			Self::KeepLow(n) => write!(f, "kl{}", count(*n)),
			Self::DropHigh(n) => write!(f, "dh{}", count(*n)),
			Self::DropLow(n) => write!(f, "dl{}", count(*n)),
			Self::Min(min) => write!(f, "min{min}"),
			Self::Max(max) => write!(f, "max{max}"),
			Self::CountSuccess(cond) => write!(f, "cs{cond}"),
			Self::CountFailure(cond) => write!(f, "cf{cond}"),
		}
	}
}

/// Test that die values can be checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::exhaustive_enums, reason = "Unlikely to change, no logical fallback")]
pub enum Condition {
	/// Checks whether values are equal to its own value. Symbol: `=`
	Eq(i64),

	/// Checks whether values are greater than its own value. Symbol: `>`
	Gt(i64),

	/// Checks whether values are greater than or equal to its own value. Symbol: `>=`
	Gte(i64),

	/// Checks whether values are less than its own value. Symbol: `<`
	Lt(i64),

	/// Checks whether values are less than or equal to its own value. Symbol: `<=`
	Lte(i64),
}

impl Condition {
	/// Creates a condition from its corresponding symbol and a given value.
	///
	/// # Errors
	/// If the symbol doesn't match to a known condition variant, an error variant will be returned.
	pub fn from_symbol_and_val(symbol: &str, val: i64) -> Result<Self, Error> {
		Ok(match symbol {
			"=" => Self::Eq(val),
			">" => Self::Gt(val),
			">=" => Self::Gte(val),
			"<" => Self::Lt(val),
			"<=" => Self::Lte(val),
			_ => return Err(Error::UnknownCondition(symbol.to_owned())),
		})
	}

	/// Checks a value against the condition.
	#[must_use]
	pub const fn check(&self, val: i64) -> bool {
		match self {
			Self::Eq(expected) => val == *expected,
			Self::Gt(expected) => val > *expected,
			Self::Gte(expected) => val >= *expected,
			Self::Lt(expected) => val < *expected,
			Self::Lte(expected) => val <= *expected,
		}
	}

	/// Checks whether every face of a die with the given number of sides meets the condition.
	#[must_use]
	pub fn always_met(&self, sides: u32) -> bool {
		let sides = i64::from(sides);
		match *self {
			Self::Eq(expected) => expected == 1 && sides == 1,
			Self::Gt(expected) => expected < 1,
			Self::Gte(expected) => expected <= 1,
			Self::Lt(expected) => expected > sides,
			Self::Lte(expected) => expected >= sides,
		}
	}

	/// Marks every kept roll as a success or failure depending on whether it meets the condition, returning the number
	/// of successes. Dropped rolls are left unmarked.
	pub fn score(&self, rolls: &mut [DieRoll]) -> u32 {
		let mut successes: u32 = 0;
		for roll in rolls.iter_mut().filter(|roll| roll.is_kept()) {
			let success = self.check(roll.val);
			roll.success = Some(success);
			successes = successes.saturating_add(u32::from(success));
		}
		successes
	}

	/// Gets the value the condition compares against.
	#[must_use]
	pub const fn val(&self) -> i64 {
		match self {
			Self::Eq(expected) | Self::Gt(expected) | Self::Gte(expected) | Self::Lt(expected) | Self::Lte(expected) => {
				*expected
			}
		}
	}

	/// Gets the symbol that represents the condition.
	#[must_use]
	pub const fn symbol(&self) -> &'static str {
		match self {
			Self::Eq(..) => "=",
			Self::Gt(..) => ">",
			Self::Gte(..) => ">=",
			Self::Lt(..) => "<",
			Self::Lte(..) => "<=",
		}
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.symbol(), self.val())
	}
}
