//! Abstractions for rolling [`DieRoll`]s using various means.

use core::iter::Peekable;

#[cfg(feature = "fastrand")]
use fastrand::Rng;

use super::{Dice, DieRoll, Error, Rolled, MAX_COUNT};

/// Rolls dice - what else is there to say?
pub trait Roller {
	/// Rolls a single die.
	#[must_use]
	fn roll_die(&mut self, sides: u32) -> DieRoll;

	/// Rolls a set of dice and optionally applies all of its modifiers to the rolls.
	/// Dice are rolled in ascending index order and modifiers are applied in written order.
	///
	/// # Errors
	/// If there are more dice than [`MAX_COUNT`] or any errors are encountered while applying the dice's modifiers, an
	/// error variant is returned.
	fn roll(&mut self, dice: &Dice, apply_mods: bool) -> Result<Rolled, Error>
	where
		Self: Sized,
	{
		if dice.count > MAX_COUNT {
			return Err(Error::TooManyDice {
				count: dice.count,
				max: MAX_COUNT,
			});
		}

		// Roll the dice!
		let mut rolls = Vec::with_capacity(dice.count as usize);
		for _ in 0..dice.count {
			rolls.push(self.roll_die(dice.sides));
		}

		// Apply all of the dice's modifiers
		if apply_mods {
			for modifier in &dice.modifiers {
				modifier.apply(&mut rolls, dice.sides, self)?;
			}
		}

		Ok(Rolled {
			rolls,
			dice: dice.clone(),
		})
	}
}

impl<R: Roller + ?Sized> Roller for Box<R> {
	#[inline]
	fn roll_die(&mut self, sides: u32) -> DieRoll {
		(**self).roll_die(sides)
	}
}

impl<R: Roller + ?Sized> Roller for &mut R {
	#[inline]
	fn roll_die(&mut self, sides: u32) -> DieRoll {
		(**self).roll_die(sides)
	}
}

/// Generates rolls with random values using [fastrand]. Requires the `fastrand` feature (enabled by default).
///
/// Each die is an independent, uniformly-distributed draw over `1..=sides`.
///
/// # Examples
///
/// ## Default fastrand roller
/// ```
/// use alea::dice::{roller::{FastRand as FastRandRoller, Roller}, Dice};
///
/// let mut roller = FastRandRoller::default();
///
/// let dice = Dice::new(4, 6);
/// let _ = roller.roll(&dice, true)?;
/// let _ = roller.roll(&dice, true)?;
/// # Ok::<(), alea::dice::Error>(())
/// ```
///
/// ## Manually seeded fastrand roller
/// ```
/// use alea::dice::{roller::{FastRand as FastRandRoller, Roller}, Dice};
///
/// let mut roller = FastRandRoller::with_seed(0x750c38d574400);
///
/// let dice = Dice::new(4, 6);
/// let _ = roller.roll(&dice, true)?;
/// # Ok::<(), alea::dice::Error>(())
/// ```
#[cfg(feature = "fastrand")]
#[derive(Debug, Clone, Default)]
pub struct FastRand(Rng);

#[cfg(feature = "fastrand")]
impl FastRand {
	/// Creates a new fastrand roller that uses the given RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub const fn new(rng: Rng) -> Self {
		Self(rng)
	}

	/// Creates a new fastrand roller that uses a pre-seeded RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub fn with_seed(seed: u64) -> Self {
		Self(Rng::with_seed(seed))
	}
}

#[cfg(feature = "fastrand")]
impl Roller for FastRand {
	/// Rolls a single die using the [`fastrand::Rng`] the roller was created with.
	#[inline]
	fn roll_die(&mut self, sides: u32) -> DieRoll {
		if sides > 0 {
			DieRoll::new(i64::from(self.0.u32(1..=sides)))
		} else {
			DieRoll::new(0)
		}
	}
}

/// Generates rolls that always have a specific value.
///
/// # Examples
/// ```
/// use alea::dice::{roller::{Roller, Val as ValRoller}, Dice};
///
/// let mut roller = ValRoller(42);
///
/// let dice = Dice::new(4, 6);
/// let rolled = roller.roll(&dice, true)?;
/// assert!(rolled.rolls.iter().all(|roll| roll.val == 42));
/// # Ok::<(), alea::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Val(pub i64);

impl Roller for Val {
	/// Rolls a single die, always with one specific value.
	#[inline]
	fn roll_die(&mut self, _sides: u32) -> DieRoll {
		DieRoll::new(self.0)
	}
}

/// Generates rolls that always have their min value (the minimize evaluation mode).
///
/// # Examples
/// ```
/// use alea::dice::{roller::{Min as MinRoller, Roller}, Dice};
///
/// let rolled = MinRoller.roll(&Dice::new(4, 6), true)?;
/// assert!(rolled.rolls.iter().all(|roll| roll.val == 1));
/// # Ok::<(), alea::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Min;

impl Roller for Min {
	/// Rolls a single die, always with the lowest face (or 0 for a die without sides).
	#[inline]
	fn roll_die(&mut self, sides: u32) -> DieRoll {
		DieRoll::new(i64::from(sides.min(1)))
	}
}

/// Generates rolls that always have their max value (the maximize evaluation mode).
///
/// # Examples
/// ```
/// use alea::dice::{roller::{Max as MaxRoller, Roller}, Dice};
///
/// let mut roller = MaxRoller;
///
/// let dice = Dice::new(4, 6);
/// let rolled = roller.roll(&dice, true)?;
/// assert!(rolled.rolls.iter().all(|roll| roll.val == 6));
///
/// let dice = Dice::new(2, 20);
/// let rolled = roller.roll(&dice, true)?;
/// assert!(rolled.rolls.iter().all(|roll| roll.val == 20));
/// # Ok::<(), alea::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Max;

impl Roller for Max {
	/// Rolls a single die, always with the max value (same as the number of sides).
	#[inline]
	fn roll_die(&mut self, sides: u32) -> DieRoll {
		DieRoll::new(i64::from(sides))
	}
}

/// Generates rolls from an iterator of values. Mainly useful for testing purposes.
///
/// # Examples
/// ```
/// use alea::dice::{roller::{Iter as IterRoller, Roller}, Dice, DieRoll};
///
/// let mut roller = IterRoller::new(vec![1, 2, 3, 4, 10]);
/// let dice = Dice::new(5, 6);
/// assert_eq!(
/// 	roller.roll(&dice, true)?.rolls,
/// 	vec![DieRoll::new(1), DieRoll::new(2), DieRoll::new(3), DieRoll::new(4), DieRoll::new(10)]
/// );
/// # Ok::<(), alea::dice::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Iter<I: Iterator<Item = i64>>(Peekable<I>);

impl<I: Iterator<Item = i64>> Iter<I> {
	/// Checks whether the iterator still has values available.
	#[inline]
	pub fn can_roll(&mut self) -> bool {
		self.0.peek().is_some()
	}

	/// Creates a new roller that uses the given iterator to provide roll values.
	#[must_use]
	#[inline]
	pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
		Self(iter.into_iter().peekable())
	}
}

impl<I: Iterator<Item = i64>> Roller for Iter<I> {
	/// Rolls a die with the value from the next iteration.
	///
	/// # Panics
	/// If the iterator has finished, this will panic.
	#[inline]
	#[expect(
		clippy::expect_used,
		reason = "Mostly for testing, otherwise manual checking of can_roll() is expected"
	)]
	fn roll_die(&mut self, _sides: u32) -> DieRoll {
		DieRoll::new(self.0.next().expect("iterator is finished"))
	}
}
