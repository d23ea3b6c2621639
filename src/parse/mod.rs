//! Parsing of roll formulas into flat [`Term`] lists.
//!
//! Parsing happens in stages: parenthetical and math-call groups are split out first, then braced pools, then the
//! remaining text is split on arithmetic operators, and finally each leftover string fragment is classified as a number
//! or dice group. Fragments that sit next to a group that can't be resolved until evaluation are left as
//! [`Term::Str`] so they can be merged with the group's result later (e.g. `(1d4)d6`).

pub mod classify;
pub mod dice;
pub mod group;
pub mod split;

use core::ops::Range;

use crate::{
	arith,
	term::{format_number, NumTerm, Operator, Term},
};

/// Parses a formula into a list of terms.
///
/// # Errors
/// If the formula has unbalanced brackets, malformed dice, unknown terms, or invalid pool modifiers, an error variant
/// is returned along with the byte span in the formula where the problem is.
///
/// # Examples
/// ```
/// use alea::{parse, term::{Operator, Term}, Dice};
///
/// let terms = parse::terms("2d6 + 3")?;
/// assert_eq!(terms, [Term::dice(Dice::new(2, 6)), Term::Op(Operator::Add), Term::num(3.0)]);
///
/// let terms = parse::terms("(2+1)D6")?;
/// assert_eq!(terms, [Term::dice(Dice::new(3, 6))]);
///
/// assert!(parse::terms("2d6 + (1").is_err());
/// # Ok::<(), alea::parse::FormatError>(())
/// ```
pub fn terms(formula: &str) -> Result<Vec<Term>, FormatError> {
	Ok(Spanned::unwrap_all(terms_at(formula, 0)?))
}

/// Parses a portion of a formula that starts at a given byte offset, keeping track of where each term came from.
pub(crate) fn terms_at(formula: &str, offset: usize) -> Result<Vec<Spanned>, FormatError> {
	let pieces = vec![Spanned::fragment(formula, offset)];
	let pieces = group::split(pieces, group::Group::Paren)?;
	let pieces = group::split(pieces, group::Group::Brace)?;
	let pieces = split::operators(pieces);
	let pieces = classify::classify_all(pieces)?;
	simplify(pieces, false)
}

/// Term along with the byte range of the formula it was parsed from (if it came directly from one)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
	/// The term itself
	pub(crate) term: Term,

	/// Byte range in the formula
	pub(crate) span: Option<Range<usize>>,
}

impl Spanned {
	/// Wraps a term with a span.
	pub(crate) const fn new(term: Term, span: Range<usize>) -> Self {
		Self { term, span: Some(span) }
	}

	/// Wraps a term without any span.
	pub(crate) const fn bare(term: Term) -> Self {
		Self { term, span: None }
	}

	/// Wraps every term of a list without any span.
	pub(crate) fn bare_all(terms: Vec<Term>) -> Vec<Self> {
		terms.into_iter().map(Self::bare).collect()
	}

	/// Unwraps every term of a list.
	pub(crate) fn unwrap_all(pieces: Vec<Self>) -> Vec<Term> {
		pieces.into_iter().map(|piece| piece.term).collect()
	}

	/// Creates a string fragment term for a slice of text starting at a byte offset.
	pub(crate) fn fragment(text: &str, offset: usize) -> Self {
		Self::new(Term::Str(text.to_owned()), offset..offset + text.len())
	}
}

/// Joins two optional spans into one covering both.
fn join_spans(a: Option<Range<usize>>, b: Option<Range<usize>>) -> Option<Range<usize>> {
	match (a, b) {
		(Some(a), Some(b)) => Some(a.start.min(b.start)..a.end.max(b.end)),
		(a, b) => a.or(b),
	}
}

/// Simplifies a term list by merging string fragments with the values next to them and classifying any fragments that
/// can be resolved.
///
/// During parsing (`terminal = false`), deterministic groups next to string fragments are folded into plain numbers
/// first, and fragments still adjacent to an unresolved group are left alone. During evaluation (`terminal = true`),
/// every fragment must resolve, and stray leading or trailing operators are discarded.
pub(crate) fn simplify(pieces: Vec<Spanned>, terminal: bool) -> Result<Vec<Spanned>, FormatError> {
	let pieces = if terminal { pieces } else { fold_constant_groups(pieces) };
	let pieces = merge_fragments(pieces);

	let mut out = Vec::with_capacity(pieces.len());
	for (i, piece) in pieces.iter().enumerate() {
		let Term::Str(text) = &piece.term else {
			out.push(piece.clone());
			continue;
		};

		let prior = i.checked_sub(1).and_then(|i| pieces.get(i)).map(|piece| &piece.term);
		let next = pieces.get(i + 1).map(|piece| &piece.term);

		// Fragments beside a group that's still unresolved wait for evaluation, everything else must resolve now
		let pending = !terminal && (prior.is_some_and(Term::is_intermediate) || next.is_some_and(Term::is_intermediate));
		let term = if pending {
			check_pending(text, prior, next).map_err(|err| err.at(piece.span.clone()))?;
			Term::Str(text.clone())
		} else {
			classify::classify(text, prior, next, false).map_err(|err| err.at(piece.span.clone()))?
		};
		out.push(Spanned {
			term,
			span: piece.span.clone(),
		});
	}

	if terminal {
		strip_stray_operators(&mut out);
	}
	Ok(out)
}

/// Makes sure a fragment waiting on unresolved neighbors will be able to resolve once they have values, by classifying
/// it with a 1 in place of each neighbor's value.
fn check_pending(text: &str, prior: Option<&Term>, next: Option<&Term>) -> Result<(), FormatError> {
	let placeholder = |term: Option<&Term>| if term.is_some_and(Term::is_intermediate) { "1" } else { "" };
	let (body, flavor) = classify::split_flavor(text.trim());
	let mut trial = format!("{}{body}{}", placeholder(prior), placeholder(next));
	if let Some(flavor) = flavor {
		trial = format!("{trial}[{flavor}]");
	}

	match classify::classify(&trial, None, None, false) {
		Ok(..) => Ok(()),
		Err(FormatError::MalformedDice { reason, span, .. }) => Err(FormatError::MalformedDice {
			term: text.trim().to_owned(),
			reason,
			span,
		}),
		Err(FormatError::Unresolved { span, .. }) => Err(FormatError::Unresolved {
			term: text.trim().to_owned(),
			span,
		}),
		Err(err) => Err(err),
	}
}

/// Folds parenthetical and math groups that don't contain any dice into numbers when they're next to a string
/// fragment, so the fragment can be merged with them (e.g. `(2+1)d6`).
fn fold_constant_groups(pieces: Vec<Spanned>) -> Vec<Spanned> {
	let beside_fragment = |i: usize| {
		let is_str = |piece: &Spanned| matches!(piece.term, Term::Str(..));
		i.checked_sub(1).and_then(|i| pieces.get(i)).is_some_and(is_str) || pieces.get(i + 1).is_some_and(is_str)
	};

	let folded = pieces
		.iter()
		.enumerate()
		.map(|(i, piece)| match &piece.term {
			Term::Paren(..) | Term::Math(..) if beside_fragment(i) => constant_value(&piece.term).map(|val| Spanned {
				term: Term::Num(NumTerm {
					val,
					flavor: piece.term.flavor().map(ToOwned::to_owned),
				}),
				span: piece.span.clone(),
			}),
			_ => None,
		})
		.collect::<Vec<_>>();

	pieces
		.into_iter()
		.zip(folded)
		.map(|(piece, folded)| folded.unwrap_or(piece))
		.collect()
}

/// Calculates the value of a term if it's the same for every evaluation.
fn constant_value(term: &Term) -> Option<f64> {
	match term {
		Term::Num(num) => Some(num.val),
		Term::Paren(paren) => arith::evaluate_terms_by(&paren.inner, constant_value).ok(),
		Term::Math(math) => {
			let args = math
				.args
				.iter()
				.map(|arg| arith::evaluate_terms_by(arg, constant_value).ok())
				.collect::<Option<Vec<_>>>()?;
			math.func.apply(&args).ok()
		}
		Term::Op(..) | Term::Dice(..) | Term::Pool(..) | Term::Str(..) => None,
	}
}

/// Merges string fragments with the resolved values directly beside them. A value following a fragment is appended to
/// it, and a value preceding a fragment is prepended to it.
fn merge_fragments(pieces: Vec<Spanned>) -> Vec<Spanned> {
	let mut out: Vec<Spanned> = Vec::with_capacity(pieces.len());
	for piece in pieces {
		if let Some(prior) = out.last_mut() {
			let merged = match (&prior.term, &piece.term) {
				// Value directly after a fragment
				(Term::Str(text), term) if !term.is_operator() => term
					.total()
					.map(|val| format!("{text}{}{}", format_number(val), flavor_suffix(term.flavor(), text))),

				// Fragment directly after a value
				(term, Term::Str(text)) if !term.is_operator() => term.total().map(|val| {
					let merged = format!("{}{text}", format_number(val));
					let flavor = flavor_suffix(term.flavor(), &merged);
					merged + &flavor
				}),

				_ => None,
			};

			if let Some(merged) = merged {
				prior.term = Term::Str(merged);
				prior.span = join_spans(prior.span.take(), piece.span);
				continue;
			}
		}

		out.push(piece);
	}
	out
}

/// Renders the flavor of a merged value, unless the fragment it's merged into already has its own.
fn flavor_suffix(flavor: Option<&str>, fragment: &str) -> String {
	match flavor {
		Some(flavor) if !has_flavor(fragment) => format!("[{flavor}]"),
		_ => String::new(),
	}
}

/// Checks whether a fragment ends with bracketed flavor text.
fn has_flavor(fragment: &str) -> bool {
	fragment.trim_end().ends_with(']')
}

/// Discards operators at the end of the list, and at the start other than a leading minus sign.
fn strip_stray_operators(pieces: &mut Vec<Spanned>) {
	while pieces.last().is_some_and(|piece| piece.term.is_operator()) {
		pieces.pop();
	}
	while pieces
		.first()
		.is_some_and(|piece| piece.term.is_operator() && piece.term != Term::Op(Operator::Sub))
	{
		pieces.remove(0);
	}
}

/// Error that can occur while parsing a formula
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
	/// The formula is empty.
	#[error("empty formula")]
	Empty,

	/// An opening bracket was never closed.
	#[error("unclosed '{symbol}'")]
	Unclosed {
		/// Opening bracket
		symbol: char,

		/// Byte range from the opening bracket to the end of the text
		span: Option<Range<usize>>,
	},

	/// A closing bracket appeared without a matching opening one.
	#[error("unexpected '{symbol}' without a matching '{opening}'")]
	UnexpectedClose {
		/// Closing bracket
		symbol: char,

		/// Opening bracket it should match
		opening: char,

		/// Byte range of the closing bracket
		span: Option<Range<usize>>,
	},

	/// A group has nothing inside of it.
	#[error("empty group \"{group}\"")]
	EmptyGroup {
		/// Text of the group
		group: String,

		/// Byte range of the group
		span: Option<Range<usize>>,
	},

	/// A comma-separated argument or pool member has nothing in it.
	#[error("empty argument in \"{group}\"")]
	EmptyArgument {
		/// Text of the group containing the argument
		group: String,

		/// Byte range of the group
		span: Option<Range<usize>>,
	},

	/// A dice group was recognized but isn't valid.
	#[error("malformed dice \"{term}\": {reason}")]
	MalformedDice {
		/// Text of the dice group
		term: String,

		/// Details from the dice parser
		reason: String,

		/// Byte range of the dice group
		span: Option<Range<usize>>,
	},

	/// The modifiers following a pool aren't valid.
	#[error("invalid pool modifiers \"{modifiers}\": {reason}")]
	PoolModifiers {
		/// Text of the modifiers
		modifiers: String,

		/// What's wrong with them
		reason: String,

		/// Byte range of the modifiers
		span: Option<Range<usize>>,
	},

	/// A fragment couldn't be resolved into any kind of term.
	#[error("unresolved term \"{term}\"")]
	Unresolved {
		/// Text of the fragment
		term: String,

		/// Byte range of the fragment
		span: Option<Range<usize>>,
	},
}

impl FormatError {
	/// Gets the byte range of the formula (after data substitution) where the problem is, if known.
	#[must_use]
	pub fn span(&self) -> Option<Range<usize>> {
		match self {
			Self::Empty => None,
			Self::Unclosed { span, .. }
			| Self::UnexpectedClose { span, .. }
			| Self::EmptyGroup { span, .. }
			| Self::EmptyArgument { span, .. }
			| Self::MalformedDice { span, .. }
			| Self::PoolModifiers { span, .. }
			| Self::Unresolved { span, .. } => span.clone(),
		}
	}

	/// Fills in the span of the error if it doesn't have one yet.
	#[must_use]
	pub(crate) fn at(mut self, at: Option<Range<usize>>) -> Self {
		match &mut self {
			Self::Empty => {}
			Self::Unclosed { span, .. }
			| Self::UnexpectedClose { span, .. }
			| Self::EmptyGroup { span, .. }
			| Self::EmptyArgument { span, .. }
			| Self::MalformedDice { span, .. }
			| Self::PoolModifiers { span, .. }
			| Self::Unresolved { span, .. } => {
				if span.is_none() {
					*span = at;
				}
			}
		}
		self
	}
}
