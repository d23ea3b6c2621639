//! Parsers for dice groups and their modifiers, like "d20", "4d6kh3", "8d6x", or "3d6cs<=4".

use core::str::FromStr;

use chumsky::prelude::*;

use super::FormatError;
use crate::dice::{modifier::Condition, Dice, Modifier, MAX_COUNT};

/// Generates a parser for modifier conditions like "<=4" or "6"
fn condition<'src>() -> impl Parser<'src, &'src str, Condition, extra::Err<Rich<'src, char>>> + Clone {
	choice((just(">="), just("<="), just(">"), just("<"), just("=")))
		.or_not()
		.then(text::int::<&'src str, _, _>(10))
		.try_map(|(symbol, val), span| {
			let val = val
				.parse()
				.map_err(|err| Rich::custom(span, format!("Modifier condition: {err}")))?;
			Condition::from_symbol_and_val(symbol.unwrap_or("="), val)
				.map_err(|err| Rich::custom(span, format!("Modifier condition: {err}")))
		})
}

/// Generates a parser for an optional modifier count (defaulting to 1), like the "2" in "kh2"
fn count<'src>(label: &'static str) -> impl Parser<'src, &'src str, u32, extra::Err<Rich<'src, char>>> + Clone {
	text::int(10).or_not().try_map(move |count: Option<&str>, span| {
		count
			.unwrap_or("1")
			.parse()
			.map_err(|err| Rich::custom(span, format!("{label} count: {err}")))
	})
}

/// Generates a parser for numeric modifier values like the "3" in "min3"
fn value<'src>(label: &'static str) -> impl Parser<'src, &'src str, i64, extra::Err<Rich<'src, char>>> + Clone {
	text::int(10).try_map(move |val: &str, span| {
		val.parse()
			.map_err(|err| Rich::custom(span, format!("{label} value: {err}")))
	})
}

/// Generates a parser for a single dice modifier
pub fn modifier_part<'src>() -> impl Parser<'src, &'src str, Modifier, extra::Err<Rich<'src, char>>> + Clone {
	choice((
		// Reroll dice (e.g. r1, rr1, r<=2, r)
		just('r')
			.ignored()
			.then(just('r').ignored().or_not().map(|r| r.is_some()))
			.then(condition().or_not())
			.map(|((_, recurse), cond)| Modifier::Reroll {
				cond: cond.unwrap_or(Condition::Eq(1)),
				recurse,
			}),
		// Exploding dice (e.g. x, xo, x>4)
		just('x')
			.ignored()
			.then(just('o').ignored().or_not().map(|o| o.is_none()))
			.then(condition().or_not())
			.map(|((_, recurse), cond)| Modifier::Explode { cond, recurse }),
		// Keep lowest (e.g. kl, kl2)
		just("kl").ignore_then(count("Keep lowest")).map(Modifier::KeepLow),
		// Keep highest (e.g. k, kh, kh2)
		just('k')
			.ignored()
			.then_ignore(just('h').or_not())
			.ignore_then(count("Keep highest"))
			.map(Modifier::KeepHigh),
		// Drop highest (e.g. dh, dh2)
		just("dh").ignore_then(count("Drop highest")).map(Modifier::DropHigh),
		// Drop lowest (e.g. d, dl, dl2)
		just('d')
			.ignored()
			.then_ignore(just('l').or_not())
			.ignore_then(count("Drop lowest"))
			.map(Modifier::DropLow),
		// Minimum and maximum values (e.g. min2, max5)
		just("min").ignore_then(value("Minimum")).map(Modifier::Min),
		just("max").ignore_then(value("Maximum")).map(Modifier::Max),
		// Success and failure counting (e.g. cs>=5, cs<=3, cf1)
		just("cs").ignore_then(condition()).map(Modifier::CountSuccess),
		just("cf").ignore_then(condition()).map(Modifier::CountFailure),
	))
}

/// Generates a parser that specifically handles dice terms like "d20", "2d20kh", "8d6x", "4 d6", etc.
pub fn dice_part<'src>() -> impl Parser<'src, &'src str, Dice, extra::Err<Rich<'src, char>>> + Clone {
	text::int(10)
		.padded()
		.or_not()
		.then_ignore(just('d'))
		.then(text::int(10))
		.then(modifier_part().repeated().collect::<Vec<_>>())
		.try_map(|((count, sides), modifiers): ((Option<&str>, &str), _), span| {
			let count = count
				.unwrap_or("1")
				.parse()
				.map_err(|err| Rich::custom(span, format!("Dice count: {err}")))?;
			if count > MAX_COUNT {
				return Err(Rich::custom(span, format!("Dice count: too many dice (at most {MAX_COUNT})")));
			}
			let sides = sides
				.parse()
				.map_err(|err| Rich::custom(span, format!("Dice sides: {err}")))?;
			if sides == 0 {
				return Err(Rich::custom(span, "Dice sides: must be at least 1"));
			}

			Ok(Dice {
				count,
				sides,
				modifiers,
			})
		})
}

/// Generates a parser that specifically handles dice terms like "d20", "2d20kh", "8d6x", etc.
/// and expects end of input
pub fn dice<'src>() -> impl Parser<'src, &'src str, Dice, extra::Err<Rich<'src, char>>> + Clone {
	dice_part().then_ignore(end())
}

/// Parses a (lowercase) fragment as a dice group. Without an explicit count, the fragment only counts as dice when
/// `impute_count` is set, and `Ok(None)` is returned otherwise.
pub(crate) fn dice_term(text: &str, impute_count: bool) -> Result<Option<Dice>, String> {
	let text = text.trim();
	let dice = dice().parse(text).into_result().map_err(|errs| join_errors(&errs))?;
	if !impute_count && text.starts_with('d') {
		return Ok(None);
	}
	Ok(Some(dice))
}

/// Parses a (lowercase) run of modifiers, like the "kh2" following a pool.
pub(crate) fn modifiers(text: &str) -> Result<Vec<Modifier>, String> {
	modifier_part()
		.repeated()
		.collect::<Vec<_>>()
		.then_ignore(end())
		.parse(text)
		.into_result()
		.map_err(|errs| join_errors(&errs))
}

/// Joins parser errors into a single message.
fn join_errors(errs: &[Rich<'_, char>]) -> String {
	errs.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl FromStr for Dice {
	type Err = FormatError;

	/// Parses a single dice group (case-insensitive) like "4d6kh3" or "3d6cs<=4". A missing count is taken to be 1.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lc = s.to_lowercase();
		dice_term(&lc, true)
			.map_err(|reason| FormatError::MalformedDice {
				term: s.to_owned(),
				reason,
				span: None,
			})?
			.ok_or_else(|| FormatError::Unresolved {
				term: s.to_owned(),
				span: None,
			})
	}
}
