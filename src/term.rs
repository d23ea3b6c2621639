//! Flat term model for parsed roll formulas and working with their evaluated results.
//!
//! A formula such as `(2+1)d6kh2 + @prof` is parsed into an ordered list of [`Term`]s: values, operators, and nested
//! groups. Nested groups (parentheticals, math calls, pools) own term lists of their own.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
	arith::MathFn,
	dice::{self, describe_rolls, Dice, DieRoll, Modifier, Rolled},
};

/// Arithmetic operator joining two terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::exhaustive_enums, reason = "The formula grammar only has these operators")]
pub enum Operator {
	/// `+`
	Add,

	/// `-`
	Sub,

	/// `*`
	Mul,

	/// `/`
	Div,
}

impl Operator {
	/// Gets the symbol that represents the operator.
	#[must_use]
	pub const fn symbol(&self) -> char {
		match self {
			Self::Add => '+',
			Self::Sub => '-',
			Self::Mul => '*',
			Self::Div => '/',
		}
	}

	/// Gets the operator represented by a symbol, if any.
	#[must_use]
	pub const fn from_symbol(symbol: char) -> Option<Self> {
		match symbol {
			'+' => Some(Self::Add),
			'-' => Some(Self::Sub),
			'*' => Some(Self::Mul),
			'/' => Some(Self::Div),
			_ => None,
		}
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

/// Numeric literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct NumTerm {
	/// Value of the number
	pub val: f64,

	/// Flavor text attached to the number
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flavor: Option<String>,
}

/// Group of same-faced dice, along with their results once evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct DiceTerm {
	/// Dice and their rolls (empty until evaluated)
	pub rolled: Rolled,

	/// Whether the dice have been rolled
	pub evaluated: bool,

	/// Flavor text attached to the dice
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flavor: Option<String>,
}

impl DiceTerm {
	/// Creates a new, unrolled dice term.
	#[must_use]
	pub const fn new(dice: Dice) -> Self {
		Self {
			rolled: Rolled {
				rolls: Vec::new(),
				dice,
			},
			evaluated: false,
			flavor: None,
		}
	}

	/// Gets the dice of the term.
	#[must_use]
	#[inline]
	pub const fn dice(&self) -> &Dice {
		&self.rolled.dice
	}
}

/// Braced group of sub-formulas scored together, e.g. `{1d8, 1d6 + 2}kh`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct PoolTerm {
	/// Term lists of each member of the pool
	pub members: Vec<Vec<Term>>,

	/// Modifiers applied to the member results, in written order
	pub modifiers: Vec<Modifier>,

	/// Totals of each member once evaluated, one per member
	pub results: Vec<DieRoll>,

	/// Whether the members have been evaluated
	pub evaluated: bool,

	/// Flavor text attached to the pool
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flavor: Option<String>,
}

/// Whitelisted math function call, e.g. `floor(1d6 / 2)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct MathTerm {
	/// Function to call
	pub func: MathFn,

	/// Term lists of each argument
	pub args: Vec<Vec<Term>>,

	/// Flavor text attached to the call
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flavor: Option<String>,
}

/// Parenthesized sub-formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::exhaustive_structs)]
pub struct ParenTerm {
	/// Terms inside the parentheses
	pub inner: Vec<Term>,

	/// Flavor text attached to the group
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flavor: Option<String>,
}

/// Individual elements of a roll formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", content = "data", rename_all = "camelCase")]
#[non_exhaustive]
pub enum Term {
	/// Numeric literal
	Num(NumTerm),

	/// Arithmetic operator
	Op(Operator),

	/// Dice group
	Dice(DiceTerm),

	/// Dice pool
	Pool(PoolTerm),

	/// Math function call
	Math(MathTerm),

	/// Parenthetical sub-formula
	Paren(ParenTerm),

	/// Unresolved string fragment, only present between parsing passes
	Str(String),
}

impl Term {
	/// Creates a plain numeric term.
	#[must_use]
	pub const fn num(val: f64) -> Self {
		Self::Num(NumTerm { val, flavor: None })
	}

	/// Creates an unrolled dice term.
	#[must_use]
	pub const fn dice(dice: Dice) -> Self {
		Self::Dice(DiceTerm::new(dice))
	}

	/// Checks whether the term is an operator.
	#[must_use]
	#[inline]
	pub const fn is_operator(&self) -> bool {
		matches!(self, Self::Op(..))
	}

	/// Checks whether the term can't be resolved to a value without further evaluation or splitting.
	/// String fragments next to such terms are left alone by intermediate classification.
	#[must_use]
	pub const fn is_intermediate(&self) -> bool {
		match self {
			Self::Str(..) | Self::Paren(..) | Self::Math(..) => true,
			Self::Pool(pool) => !pool.evaluated,
			Self::Num(..) | Self::Op(..) | Self::Dice(..) => false,
		}
	}

	/// Gets the numeric value of the term, if it has been resolved to one.
	#[must_use]
	#[allow(clippy::cast_precision_loss, reason = "Totals are far below 2^52")]
	pub fn total(&self) -> Option<f64> {
		match self {
			Self::Num(num) => Some(num.val),
			Self::Dice(dice) if dice.evaluated => dice.rolled.total().ok().map(|total| total as f64),
			Self::Pool(pool) if pool.evaluated => dice::tally(&pool.results, &pool.modifiers)
				.ok()
				.map(|total| total as f64),
			Self::Dice(..) | Self::Pool(..) | Self::Op(..) | Self::Math(..) | Self::Paren(..) | Self::Str(..) => None,
		}
	}

	/// Gets the flavor text attached to the term, if any.
	#[must_use]
	pub fn flavor(&self) -> Option<&str> {
		match self {
			Self::Num(NumTerm { flavor, .. })
			| Self::Dice(DiceTerm { flavor, .. })
			| Self::Pool(PoolTerm { flavor, .. })
			| Self::Math(MathTerm { flavor, .. })
			| Self::Paren(ParenTerm { flavor, .. }) => flavor.as_deref(),
			Self::Op(..) | Self::Str(..) => None,
		}
	}

	/// Attaches flavor text to the term. Operators and string fragments can't carry flavor, so this does nothing for
	/// them.
	pub fn set_flavor(&mut self, text: Option<String>) {
		match self {
			Self::Num(NumTerm { flavor, .. })
			| Self::Dice(DiceTerm { flavor, .. })
			| Self::Pool(PoolTerm { flavor, .. })
			| Self::Math(MathTerm { flavor, .. })
			| Self::Paren(ParenTerm { flavor, .. }) => *flavor = text,
			Self::Op(..) | Self::Str(..) => {}
		}
	}

	/// Builds a re-parseable formula fragment for the term.
	#[must_use]
	pub fn formula(&self) -> String {
		let body = match self {
			Self::Num(num) => format_number(num.val),
			Self::Op(op) => op.to_string(),
			Self::Dice(dice) => dice.dice().to_string(),
			Self::Pool(pool) => format!(
				"{{{}}}{}",
				pool.members.iter().map(|member| terms_formula(member)).collect::<Vec<_>>().join(", "),
				pool.modifiers.iter().map(ToString::to_string).collect::<String>()
			),
			Self::Math(math) => format!(
				"{}({})",
				math.func,
				math.args.iter().map(|arg| terms_formula(arg)).collect::<Vec<_>>().join(", ")
			),
			Self::Paren(paren) => format!("({})", terms_formula(&paren.inner)),
			Self::Str(text) => return text.clone(),
		};
		with_flavor(body, self.flavor())
	}
}

impl Describe for Term {
	/// Builds the formula fragment for the term, replacing evaluated dice and pools with a listing of their individual
	/// results.
	fn describe(&self, list_limit: Option<usize>) -> String {
		match self {
			Self::Dice(dice) if dice.evaluated => with_flavor(dice.rolled.describe(list_limit), dice.flavor.as_deref()),
			Self::Pool(pool) if pool.evaluated => with_flavor(
				format!(
					"{{{}}}{}{}",
					pool.members
						.iter()
						.map(|member| describe_terms(member, list_limit))
						.collect::<Vec<_>>()
						.join(", "),
					pool.modifiers.iter().map(ToString::to_string).collect::<String>(),
					describe_rolls(&pool.results, list_limit)
				),
				pool.flavor.as_deref(),
			),
			_ => self.formula(),
		}
	}
}

impl fmt::Display for Term {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output of this implementation is equivalent to [`Self::formula()`].
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.formula())
	}
}

/// Builds a full formula from a list of terms. Operators are spaced out from their operands.
///
/// # Examples
/// ```
/// use alea::{parse, term::terms_formula};
///
/// let terms = parse::terms("4d6kh3+floor(1d8/2)")?;
/// assert_eq!(terms_formula(&terms), "4d6kh3 + floor(1d8 / 2)");
/// # Ok::<(), alea::parse::FormatError>(())
/// ```
#[must_use]
pub fn terms_formula(terms: &[Term]) -> String {
	join_terms(terms, Term::formula)
}

/// Builds a detailed description of a list of terms (see [`Describe`]).
#[must_use]
pub fn describe_terms(terms: &[Term], list_limit: Option<usize>) -> String {
	join_terms(terms, |term| term.describe(list_limit))
}

/// Joins rendered terms, spacing out binary operators. A sign directly in front of an operand stays attached to it.
fn join_terms(terms: &[Term], render: impl Fn(&Term) -> String) -> String {
	let mut out = String::new();
	for (i, term) in terms.iter().enumerate() {
		let follows_operand = i > 0 && terms.get(i - 1).is_some_and(|prior| !prior.is_operator());
		match term {
			Term::Op(op) if follows_operand => {
				out.push(' ');
				out.push(op.symbol());
				out.push(' ');
			}
			Term::Op(op) => out.push(op.symbol()),
			_ => out.push_str(&render(term)),
		}
	}
	out
}

/// Renders a number the way formulas write it.
#[must_use]
pub fn format_number(val: f64) -> String {
	if val == 0.0 {
		// Avoids rendering negative zero as "-0"
		return "0".to_owned();
	}
	val.to_string()
}

/// Appends bracketed flavor text to a rendered term.
fn with_flavor(mut text: String, flavor: Option<&str>) -> String {
	if let Some(flavor) = flavor {
		text.push('[');
		text.push_str(flavor);
		text.push(']');
	}
	text
}

/// Trait to allow creation of expanded descriptions with an optional max number of individual listed results where
/// applicable
pub trait Describe {
	/// Builds a detailed expression string with additional information about non-deterministic elements.
	/// Any elements of the expression that can have a different result between multiple evaluations or multiple results
	/// should list all of the specific individual results that occurred (ideally, up to `list_limit` of them).
	#[must_use]
	fn describe(&self, list_limit: Option<usize>) -> String;
}
