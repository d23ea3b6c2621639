//! Classification of string fragments into numbers and dice groups.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{dice::dice_term, FormatError, Spanned};
use crate::term::{DiceTerm, NumTerm, Term};

/// Matches plain (optionally signed, optionally fractional) numbers
#[expect(clippy::expect_used, reason = "Pattern is a literal")]
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric pattern should be valid"));

/// Matches the start of anything written like a dice group, even if the rest of it is malformed
#[expect(clippy::expect_used, reason = "Pattern is a literal")]
static DICE_PREFIX: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)^(\d+\s*)?d\d").expect("dice prefix pattern should be valid"));

/// Checks whether a fragment is a plain number.
#[must_use]
pub fn is_numeric(fragment: &str) -> bool {
	NUMERIC.is_match(fragment)
}

/// Classifies a string fragment as a number or dice group, given its neighbors in the term list.
///
/// Numbers are recognized first, then dice. In the intermediate pass (`intermediate = true`), dice must have an explicit
/// count, and a fragment is left as [`Term::Str`] if it doesn't match anything or if either neighbor still needs
/// resolving (since it may yet be merged with that neighbor's value). In the terminal pass, a missing dice count is
/// taken to be 1 and every fragment must resolve.
///
/// Trailing bracketed text is split off and kept as the term's flavor.
///
/// # Errors
/// If the fragment looks like dice but is malformed, or (in the terminal pass) doesn't match anything, an error variant
/// is returned.
///
/// # Examples
/// ```
/// use alea::{parse::classify::classify, term::Term, Dice};
///
/// assert_eq!(classify("4", None, None, false)?, Term::num(4.0));
/// assert_eq!(classify("d20", None, None, false)?, Term::dice(Dice::new(1, 20)));
/// assert_eq!(classify("d20", None, None, true)?, Term::Str("d20".to_owned()));
/// assert!(classify("foo", None, None, false).is_err());
/// # Ok::<(), alea::parse::FormatError>(())
/// ```
pub fn classify(
	fragment: &str,
	prior: Option<&Term>,
	next: Option<&Term>,
	intermediate: bool,
) -> Result<Term, FormatError> {
	let (body, flavor) = split_flavor(fragment);

	if is_numeric(body) {
		if let Ok(val) = body.parse() {
			return Ok(Term::Num(NumTerm { val, flavor }));
		}
	}

	let pending_neighbor = prior.is_some_and(Term::is_intermediate) || next.is_some_and(Term::is_intermediate);
	let deferred = intermediate && pending_neighbor;

	match dice_term(&body.to_lowercase(), !intermediate) {
		Ok(Some(dice)) if !deferred => {
			tracing::trace!(fragment, %dice, "classified dice");
			let mut term = DiceTerm::new(dice);
			term.flavor = flavor;
			Ok(Term::Dice(term))
		}
		_ if intermediate => Ok(Term::Str(fragment.to_owned())),
		Err(reason) if DICE_PREFIX.is_match(body) => Err(FormatError::MalformedDice {
			term: body.to_owned(),
			reason,
			span: None,
		}),
		_ => Err(FormatError::Unresolved {
			term: fragment.trim().to_owned(),
			span: None,
		}),
	}
}

/// Classifies every string fragment of a term list in the intermediate pass.
pub(crate) fn classify_all(pieces: Vec<Spanned>) -> Result<Vec<Spanned>, FormatError> {
	let mut out = Vec::with_capacity(pieces.len());
	for (i, piece) in pieces.iter().enumerate() {
		let Term::Str(text) = &piece.term else {
			out.push(piece.clone());
			continue;
		};

		let prior = i.checked_sub(1).and_then(|i| pieces.get(i)).map(|piece| &piece.term);
		let next = pieces.get(i + 1).map(|piece| &piece.term);
		let term = classify(text, prior, next, true).map_err(|err| err.at(piece.span.clone()))?;
		out.push(Spanned {
			term,
			span: piece.span.clone(),
		});
	}
	Ok(out)
}

/// Splits trailing bracketed flavor text off of a fragment, trimming both parts.
pub(crate) fn split_flavor(fragment: &str) -> (&str, Option<String>) {
	let trimmed = fragment.trim();
	if trimmed.ends_with(']') {
		if let Some(open) = trimmed.rfind('[') {
			let flavor = &trimmed[open + 1..trimmed.len() - 1];
			return (trimmed[..open].trim_end(), Some(flavor.to_owned()));
		}
	}
	(trimmed, None)
}
