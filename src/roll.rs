//! Rolls: parsed formulas that can be evaluated exactly once.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
	arith::{self, CalcError},
	data::{substitute, Context, MissingData},
	dice::{DieResult, DieRoll, Error as DiceError, Rolled, Roller},
	options::RollOptions,
	parse::{self, FormatError, Spanned},
	term::{describe_terms, terms_formula, Describe, NumTerm, PoolTerm, Term},
};

/// A roll formula, parsed into terms, along with its results once evaluated
///
/// # Examples
/// ```
/// use alea::{dice::roller::Iter as IterRoller, Context, Roll};
///
/// let mut data = Context::new();
/// data.set("prof", 2);
///
/// let mut roll = Roll::new("2d6kh + @prof", &data)?;
/// assert_eq!(roll.formula(), "2d6kh + 2");
///
/// let total = roll.evaluate(&mut IterRoller::new([3, 5]))?;
/// assert_eq!(total, 7.0);
/// assert_eq!(roll.result_formula(), "2d6kh[3 (d), 5] + 2");
/// # Ok::<(), alea::roll::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roll {
	/// Formula after data substitution
	formula: String,

	/// Data the formula was substituted from
	data: Context,

	/// Terms of the formula (evaluated once the roll is)
	terms: Vec<Term>,

	/// Every group of dice rolled during evaluation, in the order they were rolled
	dice: Vec<Rolled>,

	/// Final total
	total: Option<f64>,

	/// Whether the roll has been successfully evaluated
	evaluated: bool,

	/// Data references that couldn't be resolved
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	missing: Vec<MissingData>,
}

impl Roll {
	/// Substitutes data into a formula and parses it with the default options.
	///
	/// # Errors
	/// If the formula can't be parsed, an error variant is returned.
	pub fn new(formula: &str, data: &Context) -> Result<Self, FormatError> {
		Self::with_options(formula, data, &RollOptions::default())
	}

	/// Substitutes data into a formula and parses it using the given options.
	///
	/// # Errors
	/// If the formula can't be parsed, an error variant is returned.
	pub fn with_options(formula: &str, data: &Context, options: &RollOptions) -> Result<Self, FormatError> {
		let substituted = substitute(formula, data, options.missing_data.as_deref(), options.warn_missing);
		let mut roll = Self::parse(&substituted.formula)?;
		roll.data = data.clone();
		roll.missing = substituted.missing;
		Ok(roll)
	}

	/// Parses a formula that has already had its data substituted.
	///
	/// # Errors
	/// If the formula is empty or can't be parsed, an error variant is returned.
	pub fn parse(formula: &str) -> Result<Self, FormatError> {
		if formula.trim().is_empty() {
			return Err(FormatError::Empty);
		}

		let terms = parse::terms(formula)?;
		tracing::debug!(formula, terms = terms.len(), "parsed roll formula");
		let mut roll = Self::from_terms(terms);
		formula.clone_into(&mut roll.formula);
		Ok(roll)
	}

	/// Creates an unevaluated roll directly from a list of terms.
	#[must_use]
	pub fn from_terms(terms: Vec<Term>) -> Self {
		Self {
			formula: terms_formula(&terms),
			data: Context::new(),
			terms,
			dice: Vec::new(),
			total: None,
			evaluated: false,
			missing: Vec::new(),
		}
	}

	/// Evaluates the roll, generating all dice results with the given roller and calculating the total.
	///
	/// Nested groups are evaluated first (innermost first), then the remaining terms are simplified once more, the
	/// top-level dice are rolled left to right, and finally the total is calculated.
	///
	/// If evaluation fails after some dice have been rolled, those dice are still available from [`Self::dice()`], but
	/// the roll is left unevaluated.
	///
	/// # Errors
	/// If the roll has already been evaluated, a term can't be resolved, a dice modifier fails, or the arithmetic fails,
	/// an error variant is returned.
	pub fn evaluate(&mut self, rng: &mut impl Roller) -> Result<f64, Error> {
		if self.evaluated {
			return Err(StateError::AlreadyEvaluated.into());
		}

		let mut evaluator = Evaluator {
			rng,
			dice: Vec::new(),
		};
		let result = evaluator.evaluate(self.terms.clone());
		self.dice = evaluator.dice;

		let (terms, total) = result.inspect_err(|err| {
			tracing::debug!(formula = %self.formula, error = %err, "roll evaluation failed");
		})?;
		self.terms = terms;
		self.total = Some(total);
		self.evaluated = true;
		tracing::debug!(formula = %self.formula, total, "evaluated roll");

		Ok(total)
	}

	/// Gets the formula of the roll, after data substitution.
	#[must_use]
	#[inline]
	pub fn formula(&self) -> &str {
		&self.formula
	}

	/// Gets the data context the formula was substituted from.
	#[must_use]
	#[inline]
	pub const fn data(&self) -> &Context {
		&self.data
	}

	/// Gets the terms of the roll.
	#[must_use]
	#[inline]
	pub fn terms(&self) -> &[Term] {
		&self.terms
	}

	/// Gets every group of dice rolled during evaluation, in the order they were rolled.
	#[must_use]
	#[inline]
	pub fn dice(&self) -> &[Rolled] {
		&self.dice
	}

	/// Gets the total, if the roll has been evaluated.
	#[must_use]
	#[inline]
	pub const fn total(&self) -> Option<f64> {
		self.total
	}

	/// Checks whether the roll has been evaluated.
	#[must_use]
	#[inline]
	pub const fn is_evaluated(&self) -> bool {
		self.evaluated
	}

	/// Gets the data references that couldn't be resolved during substitution.
	#[must_use]
	#[inline]
	pub fn missing(&self) -> &[MissingData] {
		&self.missing
	}

	/// Builds the render-ready view of every die rolled, across all dice groups, in roll order.
	#[must_use]
	pub fn breakdown(&self) -> Vec<DieResult> {
		self.dice
			.iter()
			.flat_map(|rolled| rolled.rolls.iter().map(DieRoll::result))
			.collect()
	}

	/// Builds the formula with each evaluated dice group replaced by a listing of its results.
	#[must_use]
	pub fn result_formula(&self) -> String {
		self.describe(None)
	}
}

impl Describe for Roll {
	fn describe(&self, list_limit: Option<usize>) -> String {
		describe_terms(&self.terms, list_limit)
	}
}

impl fmt::Display for Roll {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// Unevaluated rolls show their formula; evaluated rolls show their result formula and total.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.total {
			Some(total) if self.evaluated => write!(f, "{} = {}", self.result_formula(), total),
			_ => write!(f, "{}", self.formula),
		}
	}
}

impl FromStr for Roll {
	type Err = FormatError;

	/// Parses a formula without any data to substitute.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s, &Context::new())
	}
}

/// Evaluates term lists, collecting every dice group it rolls
struct Evaluator<'r, R: Roller> {
	/// Roller that generates die results
	rng: &'r mut R,

	/// Dice rolled so far
	dice: Vec<Rolled>,
}

impl<R: Roller> Evaluator<'_, R> {
	/// Evaluates a term list, returning the evaluated terms and their total.
	fn evaluate(&mut self, terms: Vec<Term>) -> Result<(Vec<Term>, f64), Error> {
		// Nested groups
		let terms = terms
			.into_iter()
			.map(|term| self.resolve_group(term))
			.collect::<Result<Vec<_>, _>>()?;

		// Now that every group has a value, fragments beside them can be merged and classified
		let terms = Spanned::unwrap_all(parse::simplify(Spanned::bare_all(terms), true)?);

		// Top-level dice
		let terms = terms
			.into_iter()
			.map(|term| self.roll_dice(term))
			.collect::<Result<Vec<_>, _>>()?;

		let total = arith::evaluate_terms(&terms).map_err(EvalError::Calc)?;
		Ok((terms, total))
	}

	/// Evaluates a parenthetical, math call, or pool into its resolved form. Other terms are returned as-is.
	fn resolve_group(&mut self, term: Term) -> Result<Term, Error> {
		match term {
			Term::Paren(paren) => {
				let (_, val) = self.evaluate(paren.inner)?;
				Ok(Term::Num(NumTerm {
					val,
					flavor: paren.flavor,
				}))
			}

			Term::Math(math) => {
				let mut args = Vec::with_capacity(math.args.len());
				for arg in math.args {
					args.push(self.evaluate(arg)?.1);
				}
				let val = math.func.apply(&args).map_err(EvalError::Calc)?;
				Ok(Term::Num(NumTerm {
					val,
					flavor: math.flavor,
				}))
			}

			Term::Pool(pool) if !pool.evaluated => self.resolve_pool(pool),

			term => Ok(term),
		}
	}

	/// Evaluates every member of a pool and applies the pool's modifiers to their totals.
	#[allow(clippy::cast_possible_truncation, reason = "Member totals are rounded to whole results first")]
	fn resolve_pool(&mut self, mut pool: PoolTerm) -> Result<Term, Error> {
		let mut members = Vec::with_capacity(pool.members.len());
		let mut results = Vec::with_capacity(pool.members.len());
		for member in pool.members {
			let (terms, total) = self.evaluate(member)?;
			members.push(terms);
			results.push(DieRoll::new(total.round() as i64));
		}

		for modifier in &pool.modifiers {
			modifier
				.apply(&mut results, 0, &mut *self.rng)
				.map_err(|source| EvalError::Dice {
					term: format!("{{...}}{modifier}"),
					source,
				})?;
		}

		pool.members = members;
		pool.results = results;
		pool.evaluated = true;
		Ok(Term::Pool(pool))
	}

	/// Rolls an unevaluated dice term.
	fn roll_dice(&mut self, term: Term) -> Result<Term, Error> {
		match term {
			Term::Dice(mut dice) if !dice.evaluated => {
				let rolled = self.rng.roll(dice.dice(), true).map_err(|source| EvalError::Dice {
					term: dice.dice().to_string(),
					source,
				})?;
				tracing::trace!(%rolled, "rolled dice");

				self.dice.push(rolled.clone());
				dice.rolled = rolled;
				dice.evaluated = true;
				Ok(Term::Dice(dice))
			}
			term => Ok(term),
		}
	}
}

/// Error resulting from building or evaluating a [`Roll`]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
	/// The formula couldn't be parsed or resolved.
	#[error(transparent)]
	Format(#[from] FormatError),

	/// The operation isn't valid in the current state.
	#[error(transparent)]
	State(#[from] StateError),

	/// Evaluation failed.
	#[error(transparent)]
	Eval(#[from] EvalError),
}

/// Error for operations that aren't valid in the current state of a roll or outcome
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
	/// The roll has already been evaluated.
	#[error("roll has already been evaluated")]
	AlreadyEvaluated,

	/// The roll hasn't been evaluated yet.
	#[error("roll hasn't been evaluated")]
	NotEvaluated,

	/// The roll doesn't contain any dice that count successes.
	#[error("roll doesn't have any success-counting dice")]
	NoCountingDice,

	/// The index doesn't refer to a die that can be rerolled.
	#[error("die {index} can't be rerolled")]
	InvalidDie {
		/// Index that was given
		index: usize,
	},
}

/// Error that can occur while evaluating a [`Roll`]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
	/// Dice-related error (likely during rolling)
	#[error("dice error while evaluating \"{term}\": {source}")]
	Dice {
		/// Dice (or pool) being evaluated
		term: String,

		/// Underlying dice error
		#[source]
		source: DiceError,
	},

	/// Arithmetic error
	#[error(transparent)]
	Calc(#[from] CalcError),
}
