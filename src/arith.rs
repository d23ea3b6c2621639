//! Restricted arithmetic evaluation for fully-resolved formulas.
//!
//! Once every dice group and nested group in a formula has been resolved to a number, the remaining term list is
//! rendered to a plain expression string and evaluated here. The grammar only admits numbers, `+ - * /`, parentheses,
//! unary signs, and calls to a fixed set of [`MathFn`]s, so nothing outside of that can ever be executed.

use core::fmt;

use chumsky::prelude::*;
use serde::{Deserialize, Serialize};

use crate::term::{format_number, Term};

/// Math functions that formulas are allowed to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum MathFn {
	/// Absolute value
	Abs,
	/// Round towards positive infinity
	Ceil,
	/// Round towards negative infinity
	Floor,
	/// Round to the nearest integer, halves away from zero
	Round,
	/// Round towards zero
	Trunc,
	/// Sign of the value (-1, 0, or 1)
	Sign,
	/// Square root
	Sqrt,
	/// Cube root
	Cbrt,
	/// Exponential (e^x)
	Exp,
	/// Natural logarithm
	Ln,
	/// Base-2 logarithm
	Log2,
	/// Base-10 logarithm
	Log10,
	/// Smallest of any number of values
	Min,
	/// Largest of any number of values
	Max,
	/// First value raised to the power of the second
	Pow,
	/// Square root of the sum of squares of any number of values
	Hypot,
}

impl MathFn {
	/// All allowed functions
	pub const ALL: [Self; 16] = [
		Self::Abs,
		Self::Ceil,
		Self::Floor,
		Self::Round,
		Self::Trunc,
		Self::Sign,
		Self::Sqrt,
		Self::Cbrt,
		Self::Exp,
		Self::Ln,
		Self::Log2,
		Self::Log10,
		Self::Min,
		Self::Max,
		Self::Pow,
		Self::Hypot,
	];

	/// Gets the name formulas call the function by.
	#[must_use]
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Abs => "abs",
			Self::Ceil => "ceil",
			Self::Floor => "floor",
			Self::Round => "round",
			Self::Trunc => "trunc",
			Self::Sign => "sign",
			Self::Sqrt => "sqrt",
			Self::Cbrt => "cbrt",
			Self::Exp => "exp",
			Self::Ln => "ln",
			Self::Log2 => "log2",
			Self::Log10 => "log10",
			Self::Min => "min",
			Self::Max => "max",
			Self::Pow => "pow",
			Self::Hypot => "hypot",
		}
	}

	/// Looks up a function by name (case-insensitive).
	#[must_use]
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|func| func.name().eq_ignore_ascii_case(name))
	}

	/// Gets the minimum and (if bounded) maximum number of arguments the function accepts.
	#[must_use]
	pub const fn arity(&self) -> (usize, Option<usize>) {
		match self {
			Self::Min | Self::Max | Self::Hypot => (1, None),
			Self::Pow => (2, Some(2)),
			_ => (1, Some(1)),
		}
	}

	/// Calls the function with the given arguments.
	///
	/// # Errors
	/// If the number of arguments doesn't match the function's arity, or the result isn't a finite number, an error
	/// variant is returned.
	///
	/// # Examples
	/// ```
	/// use alea::arith::MathFn;
	///
	/// assert_eq!(MathFn::Floor.apply(&[3.5])?, 3.0);
	/// assert_eq!(MathFn::Max.apply(&[1.0, 7.0, 4.0])?, 7.0);
	/// assert!(MathFn::Pow.apply(&[2.0]).is_err());
	/// # Ok::<(), alea::arith::CalcError>(())
	/// ```
	pub fn apply(&self, args: &[f64]) -> Result<f64, CalcError> {
		let (min, max) = self.arity();
		if args.len() < min || max.is_some_and(|max| args.len() > max) {
			return Err(CalcError::Arity {
				func: *self,
				got: args.len(),
			});
		}

		let first = args.first().copied().unwrap_or_default();
		let result = match self {
			Self::Abs => first.abs(),
			Self::Ceil => first.ceil(),
			Self::Floor => first.floor(),
			Self::Round => first.round(),
			Self::Trunc => first.trunc(),
			Self::Sign => {
				if first == 0.0 {
					0.0
				} else {
					first.signum()
				}
			}
			Self::Sqrt => first.sqrt(),
			Self::Cbrt => first.cbrt(),
			Self::Exp => first.exp(),
			Self::Ln => first.ln(),
			Self::Log2 => first.log2(),
			Self::Log10 => first.log10(),
			Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
			Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
			Self::Pow => first.powf(args.get(1).copied().unwrap_or_default()),
			Self::Hypot => args.iter().map(|arg| arg * arg).sum::<f64>().sqrt(),
		};

		finite(result, || {
			format!(
				"{self}({})",
				args.iter().map(|arg| format_number(*arg)).collect::<Vec<_>>().join(", ")
			)
		})
	}
}

impl fmt::Display for MathFn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// Parsed arithmetic expression
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Expr {
	/// Standalone number
	Num(f64),

	/// Negation of an expression (makes the result of it negative)
	Neg(Box<Self>),

	/// Sum of two expressions
	Add(Box<Self>, Box<Self>),

	/// Difference of two expressions
	Sub(Box<Self>, Box<Self>),

	/// Product of two expressions
	Mul(Box<Self>, Box<Self>),

	/// Quotient of two expressions
	Div(Box<Self>, Box<Self>),

	/// Math function call
	Call(MathFn, Vec<Self>),
}

impl Expr {
	/// Calculates the value of the expression.
	///
	/// # Errors
	/// If any operation results in a non-finite value (such as division by zero), or a function is called with the
	/// wrong number of arguments, an error variant is returned.
	pub fn calc(&self) -> Result<f64, CalcError> {
		let result = match self {
			Self::Num(x) => *x,
			Self::Neg(x) => -x.calc()?,
			Self::Add(a, b) => a.calc()? + b.calc()?,
			Self::Sub(a, b) => a.calc()? - b.calc()?,
			Self::Mul(a, b) => a.calc()? * b.calc()?,
			Self::Div(a, b) => a.calc()? / b.calc()?,
			Self::Call(func, args) => {
				let args = args.iter().map(Self::calc).collect::<Result<Vec<_>, _>>()?;
				return func.apply(&args);
			}
		};
		finite(result, || self.to_string())
	}

	/// Gets the type of this expression.
	#[must_use]
	pub const fn op_type(&self) -> OpType {
		match self {
			Self::Num(..) | Self::Call(..) => OpType::Value,
			Self::Neg(..) => OpType::Unary,
			Self::Add(..) | Self::Sub(..) => OpType::Additive,
			Self::Mul(..) | Self::Div(..) => OpType::Multiplicative,
		}
	}

	/// Formats one side of a binary expression, wrapping it in parentheses whenever the order of operations would
	/// otherwise change when re-parsing it.
	fn operand(&self, side: &Self, right: bool) -> String {
		let needs_parens = match (self.op_type(), side.op_type()) {
			(OpType::Multiplicative | OpType::Unary, OpType::Additive) | (OpType::Unary, OpType::Multiplicative) => {
				true
			}
			(OpType::Additive, OpType::Additive) | (OpType::Multiplicative, OpType::Multiplicative) => {
				right && matches!(self, Self::Sub(..) | Self::Div(..))
			}
			_ => false,
		};

		if needs_parens {
			format!("({side})")
		} else {
			side.to_string()
		}
	}
}

impl fmt::Display for Expr {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// Operations are grouped with parentheses whenever the order of operations would be ambiguous, so the output
	/// always re-parses to the same expression layout.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Num(x) => write!(f, "{}", format_number(*x)),
			Self::Neg(x) => match x.as_ref() {
				Self::Num(..) | Self::Call(..) => write!(f, "-{x}"),
				_ => write!(f, "-({x})"),
			},
			Self::Add(a, b) => write!(f, "{} + {}", self.operand(a, false), self.operand(b, true)),
			Self::Sub(a, b) => write!(f, "{} - {}", self.operand(a, false), self.operand(b, true)),
			Self::Mul(a, b) => write!(f, "{} * {}", self.operand(a, false), self.operand(b, true)),
			Self::Div(a, b) => write!(f, "{} / {}", self.operand(a, false), self.operand(b, true)),
			Self::Call(func, args) => write!(
				f,
				"{func}({})",
				args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
			),
		}
	}
}

/// Operation type for an individual expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::exhaustive_enums)]
pub enum OpType {
	/// Single value, no operation
	Value,

	/// Unary operation
	Unary,

	/// Additive operation (sum or difference)
	Additive,

	/// Multiplicative operation (product or quotient)
	Multiplicative,
}

/// Generates a parser for arithmetic expressions with numbers, operators, parentheses, and whitelisted function calls.
pub fn expr_part<'src>() -> impl Parser<'src, &'src str, Expr, extra::Err<Rich<'src, char>>> + Clone {
	// Helper function for operators
	let op = |c| just(c).padded();

	recursive(|expr| {
		// Parser for numbers, with an optional fractional part
		let digits = one_of("0123456789").repeated().at_least(1).collect::<String>();
		let num = digits
			.clone()
			.then(just('.').ignore_then(digits).or_not())
			.try_map(|(int, frac): (String, Option<String>), span| {
				let text = match frac {
					Some(frac) => format!("{int}.{frac}"),
					None => int,
				};
				text.parse()
					.map(Expr::Num)
					.map_err(|err| Rich::custom(span, format!("Number: {err}")))
			});

		// Parser for whitelisted function names. Longer names sharing a prefix must come first.
		let func = choice((
			just("abs").to(MathFn::Abs),
			just("ceil").to(MathFn::Ceil),
			just("floor").to(MathFn::Floor),
			just("round").to(MathFn::Round),
			just("trunc").to(MathFn::Trunc),
			just("sign").to(MathFn::Sign),
			just("sqrt").to(MathFn::Sqrt),
			just("cbrt").to(MathFn::Cbrt),
			just("exp").to(MathFn::Exp),
			just("ln").to(MathFn::Ln),
			just("log10").to(MathFn::Log10),
			just("log2").to(MathFn::Log2),
			just("min").to(MathFn::Min),
			just("max").to(MathFn::Max),
			just("pow").to(MathFn::Pow),
			just("hypot").to(MathFn::Hypot),
		));

		// Parser for function calls
		let call = func
			.then(
				expr.clone()
					.separated_by(just(','))
					.at_least(1)
					.collect::<Vec<_>>()
					.delimited_by(just('('), just(')')),
			)
			.map(|(func, args)| Expr::Call(func, args));

		// Parser for expressions enclosed in parentheses
		let atom = num.or(call).or(expr.delimited_by(just('('), just(')'))).padded();

		// Parser for unary signs
		let unary = choice((op('-').to(true), op('+').to(false)))
			.repeated()
			.foldr(atom, |negate, rhs| if negate { Expr::Neg(Box::new(rhs)) } else { rhs });

		// Parser for multiplication and division
		let product = unary.clone().foldl(
			choice((
				op('*').to(Expr::Mul as fn(_, _) -> _),
				op('/').to(Expr::Div as fn(_, _) -> _),
			))
			.then(unary)
			.repeated(),
			|lhs, (op, rhs)| op(Box::new(lhs), Box::new(rhs)),
		);

		// Parser for addition and subtraction operators
		product.clone().foldl(
			choice((
				op('+').to(Expr::Add as fn(_, _) -> _),
				op('-').to(Expr::Sub as fn(_, _) -> _),
			))
			.then(product)
			.repeated(),
			|lhs, (op, rhs)| op(Box::new(lhs), Box::new(rhs)),
		)
	})
}

/// Generates a parser for arithmetic expressions that expects end of input
pub fn expr<'src>() -> impl Parser<'src, &'src str, Expr, extra::Err<Rich<'src, char>>> + Clone {
	expr_part().then_ignore(end())
}

/// Parses and calculates an arithmetic expression.
///
/// # Errors
/// If the expression isn't valid within the restricted grammar, or its calculation fails, an error variant is
/// returned.
///
/// # Examples
/// ```
/// use alea::arith::evaluate;
///
/// assert_eq!(evaluate("2 + 3 * 4")?, 14.0);
/// assert_eq!(evaluate("floor(7 / 2) - -1")?, 4.0);
/// assert!(evaluate("2 + alert(1)").is_err());
/// # Ok::<(), alea::arith::CalcError>(())
/// ```
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
	let parsed = expr().parse(expression).into_result().map_err(|errs| CalcError::Syntax {
		expression: expression.to_owned(),
		reason: errs.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
	})?;
	parsed.calc()
}

/// Calculates the total of a fully-resolved term list. Every non-operator term must have a numeric value.
///
/// # Errors
/// If any term doesn't have a value yet, or the calculation fails, an error variant is returned.
pub fn evaluate_terms(terms: &[Term]) -> Result<f64, CalcError> {
	evaluate_terms_by(terms, Term::total)
}

/// Calculates the total of a term list using a custom function to determine the value of each non-operator term.
pub(crate) fn evaluate_terms_by(terms: &[Term], value: impl Fn(&Term) -> Option<f64>) -> Result<f64, CalcError> {
	let mut expression = String::new();
	for term in terms {
		match term {
			Term::Op(op) => {
				expression.push(' ');
				expression.push(op.symbol());
				expression.push(' ');
			}
			_ => {
				let val = value(term).ok_or_else(|| CalcError::Unresolved(term.formula()))?;
				if val < 0.0 {
					expression.push('(');
					expression.push_str(&format_number(val));
					expression.push(')');
				} else {
					expression.push_str(&format_number(val));
				}
			}
		}
	}
	evaluate(&expression)
}

/// Ensures a calculated value is finite.
fn finite(val: f64, describe: impl FnOnce() -> String) -> Result<f64, CalcError> {
	if val.is_finite() {
		Ok(val)
	} else {
		Err(CalcError::NonFinite(describe()))
	}
}

/// Error that can occur while evaluating arithmetic
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CalcError {
	/// The expression isn't valid within the restricted grammar.
	#[error("invalid arithmetic expression \"{expression}\": {reason}")]
	Syntax {
		/// Expression that failed to parse
		expression: String,

		/// Details from the parser
		reason: String,
	},

	/// A calculation produced infinity or NaN (likely division by zero).
	#[error("non-finite result while calculating {0}")]
	NonFinite(String),

	/// A function was called with the wrong number of arguments.
	#[error("{func}() called with {got} argument(s)")]
	Arity {
		/// Function that was called
		func: MathFn,

		/// Number of arguments it was given
		got: usize,
	},

	/// A term didn't have a numeric value to calculate with.
	#[error("unresolved term \"{0}\"")]
	Unresolved(String),
}
