//! Splitting of bracketed groups (parentheticals, math calls, and pools) out of formula text.

use super::{dice::modifiers, terms_at, FormatError, Spanned};
use crate::{
	arith::MathFn,
	term::{MathTerm, ParenTerm, PoolTerm, Term},
};

/// Kind of bracketed group to split out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(clippy::exhaustive_enums, reason = "Only two kinds of brackets delimit groups")]
pub enum Group {
	/// `( ... )`: parentheticals and math function calls
	Paren,

	/// `{ ... }`: pools
	Brace,
}

impl Group {
	/// Gets the opening bracket of the group.
	#[must_use]
	pub const fn open(self) -> char {
		match self {
			Self::Paren => '(',
			Self::Brace => '{',
		}
	}

	/// Gets the closing bracket of the group.
	#[must_use]
	pub const fn close(self) -> char {
		match self {
			Self::Paren => ')',
			Self::Brace => '}',
		}
	}
}

/// Splits every outermost group of the given kind out of the string fragments in a term list. Other terms pass through
/// untouched. Text between groups remains as string fragments.
///
/// Flavor text (`[...]`) is opaque while scanning, and flavor directly after a closing bracket is attached to the group.
pub(crate) fn split(pieces: Vec<Spanned>, group: Group) -> Result<Vec<Spanned>, FormatError> {
	let mut out = Vec::with_capacity(pieces.len());
	for piece in pieces {
		match (piece.term, piece.span) {
			(Term::Str(text), Some(span)) => out.extend(split_fragment(&text, span.start, group)?),
			(Term::Str(text), None) => out.extend(split_fragment(&text, 0, group)?),
			(term, span) => out.push(Spanned { term, span }),
		}
	}
	Ok(out)
}

/// Splits groups out of a single piece of text that starts at the given byte offset of the formula.
fn split_fragment(text: &str, offset: usize, group: Group) -> Result<Vec<Spanned>, FormatError> {
	let mut out = Vec::new();
	let mut depth: usize = 0;
	let mut start = 0;
	let mut open_at = 0;
	let mut pos = 0;

	while let Some(c) = text.get(pos..).and_then(|rest| rest.chars().next()) {
		if c == '[' {
			pos = flavor_end(text, pos, offset)?;
			continue;
		}

		// Pools are split after parentheticals, so their contents stay whole until then
		if group == Group::Paren && c == Group::Brace.open() {
			pos = group_end(text, pos, offset, Group::Brace)?;
			continue;
		}

		if c == group.open() {
			if depth == 0 {
				open_at = pos;
			}
			depth += 1;
		} else if c == group.close() {
			if depth == 0 {
				return Err(FormatError::UnexpectedClose {
					symbol: c,
					opening: group.open(),
					span: Some(offset + pos..offset + pos + 1),
				});
			}

			depth -= 1;
			if depth == 0 {
				let inner = &text[open_at + 1..pos];
				let group_span = offset + open_at..offset + pos + 1;
				if inner.trim().is_empty() {
					return Err(FormatError::EmptyGroup {
						group: text[open_at..=pos].to_owned(),
						span: Some(group_span),
					});
				}

				let mut end = pos + 1;
				let (prefix, mut term) = match group {
					Group::Paren => paren_group(&text[start..open_at], inner, offset + open_at + 1)?,
					Group::Brace => {
						let mods_len = text[end..]
							.find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '<' | '>' | '=')))
							.unwrap_or(text.len() - end);
						let term = pool_group(inner, &text[end..end + mods_len], offset + open_at + 1, offset + end)?;
						end += mods_len;
						(&text[start..open_at], term)
					}
				};

				// Flavor attached directly to the group
				if text[end..].starts_with('[') {
					let flavor_end = flavor_end(text, end, offset)?;
					term.set_flavor(Some(text[end + 1..flavor_end - 1].to_owned()));
					end = flavor_end;
				}

				if !prefix.trim().is_empty() {
					out.push(Spanned::fragment(prefix, offset + start));
				}
				let group_start = offset + start + prefix.len();
				out.push(Spanned::new(term, group_start..offset + end));

				start = end;
				pos = end;
				continue;
			}
		}

		pos += c.len_utf8();
	}

	if depth > 0 {
		return Err(FormatError::Unclosed {
			symbol: group.open(),
			span: Some(offset + open_at..offset + text.len()),
		});
	}

	let rest = &text[start..];
	if !rest.trim().is_empty() {
		out.push(Spanned::fragment(rest, offset + start));
	}
	Ok(out)
}

/// Finds the byte position just after the bracket closing the group that opens at `pos`.
fn group_end(text: &str, pos: usize, offset: usize, group: Group) -> Result<usize, FormatError> {
	let mut depth: usize = 0;
	let mut i = pos;
	while let Some(c) = text.get(i..).and_then(|rest| rest.chars().next()) {
		if c == '[' {
			i = flavor_end(text, i, offset)?;
			continue;
		}
		if c == group.open() {
			depth += 1;
		} else if c == group.close() {
			depth -= 1;
			if depth == 0 {
				return Ok(i + 1);
			}
		}
		i += c.len_utf8();
	}

	Err(FormatError::Unclosed {
		symbol: group.open(),
		span: Some(offset + pos..offset + text.len()),
	})
}

/// Finds the byte position just after the `]` closing the flavor text that opens at `pos`.
pub(crate) fn flavor_end(text: &str, pos: usize, offset: usize) -> Result<usize, FormatError> {
	text[pos..]
		.find(']')
		.map(|close| pos + close + 1)
		.ok_or(FormatError::Unclosed {
			symbol: '[',
			span: Some(offset + pos..offset + text.len()),
		})
}

/// Builds the term for a parenthetical group, returning it along with the text before it that isn't part of it.
/// A whitelisted function name directly before the parentheses makes the group a math call.
fn paren_group<'a>(before: &'a str, inner: &str, inner_offset: usize) -> Result<(&'a str, Term), FormatError> {
	let name_start = before
		.char_indices()
		.rev()
		.take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
		.last()
		.map_or(before.len(), |(i, _)| i);

	if let Some(func) = MathFn::from_name(&before[name_start..]) {
		let args = split_arguments(inner, inner_offset)?;
		return Ok((
			&before[..name_start],
			Term::Math(MathTerm {
				func,
				args,
				flavor: None,
			}),
		));
	}

	let inner = Spanned::unwrap_all(terms_at(inner, inner_offset)?);
	Ok((before, Term::Paren(ParenTerm { inner, flavor: None })))
}

/// Builds the term for a pool group, parsing the modifiers written directly after its closing brace.
fn pool_group(inner: &str, mods: &str, inner_offset: usize, mods_offset: usize) -> Result<Term, FormatError> {
	let members = split_arguments(inner, inner_offset)?;

	let mods_lower = mods.to_lowercase();
	let modifiers = modifiers(&mods_lower).map_err(|reason| FormatError::PoolModifiers {
		modifiers: mods.to_owned(),
		reason,
		span: Some(mods_offset..mods_offset + mods.len()),
	})?;
	if let Some(modifier) = modifiers.iter().find(|modifier| !modifier.is_selective()) {
		return Err(FormatError::PoolModifiers {
			modifiers: mods.to_owned(),
			reason: format!("{modifier} can't be applied to a pool"),
			span: Some(mods_offset..mods_offset + mods.len()),
		});
	}

	Ok(Term::Pool(PoolTerm {
		members,
		modifiers,
		results: Vec::new(),
		evaluated: false,
		flavor: None,
	}))
}

/// Splits the comma-separated contents of a math call or pool into term lists. Commas that appear inside something that
/// wouldn't parse on its own (such as a nested call) don't split, since pieces are accumulated until they form a valid
/// sub-formula.
///
/// # Errors
/// If an argument is empty, or the remaining text after the last valid argument doesn't parse, an error variant is
/// returned.
pub(crate) fn split_arguments(inner: &str, offset: usize) -> Result<Vec<Vec<Term>>, FormatError> {
	let mut args = Vec::new();
	let mut acc_start = 0;
	let mut cursor = 0;

	for piece in inner.split(',') {
		cursor += piece.len();
		let acc = &inner[acc_start..cursor];

		if acc.trim().is_empty() {
			return Err(FormatError::EmptyArgument {
				group: inner.to_owned(),
				span: Some(offset + acc_start..offset + cursor),
			});
		}

		if let Ok(terms) = terms_at(acc, offset + acc_start) {
			args.push(Spanned::unwrap_all(terms));
			acc_start = cursor + 1;
		}

		// Skip past the comma
		cursor += 1;
	}

	// Anything left over never formed a valid argument, so surface the real reason
	if acc_start < inner.len() {
		let rest = &inner[acc_start..];
		terms_at(rest, offset + acc_start)?;
	}

	Ok(args)
}
