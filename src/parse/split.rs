//! Splitting of formula text on arithmetic operators.

use super::{classify::is_numeric, Spanned};
use crate::term::{Operator, Term};

/// Splits the string fragments in a term list on the arithmetic operators `+ - * /`, producing [`Term::Op`]s between
/// the trimmed pieces. Operators inside flavor text are ignored.
///
/// A `-` in operand position (at the start, or right after another operator) directly followed by a number is folded
/// into that number as its sign. Any other `-` in operand position stays an operator and is treated as unary negation
/// during evaluation.
pub(crate) fn operators(pieces: Vec<Spanned>) -> Vec<Spanned> {
	let mut out = Vec::with_capacity(pieces.len());
	let mut expect_operand = true;

	for piece in pieces {
		let Term::Str(text) = &piece.term else {
			expect_operand = piece.term.is_operator();
			out.push(piece);
			continue;
		};
		let base = piece.span.as_ref().map_or(0, |span| span.start);

		let tokens = tokenize(text);
		let mut i = 0;
		while let Some(&(pos, token)) = tokens.get(i) {
			let at = base + pos;
			let op = single_operator(token);

			if op == Some(Operator::Sub) && expect_operand {
				if let Some(&(next_pos, next)) = tokens.get(i + 1) {
					if single_operator(next).is_none() && is_numeric(next) {
						let next_at = base + next_pos;
						out.push(Spanned::new(Term::Str(format!("-{next}")), at..next_at + next.len()));
						expect_operand = false;
						i += 2;
						continue;
					}
				}
			}

			match op {
				Some(op) => {
					out.push(Spanned::new(Term::Op(op), at..at + 1));
					expect_operand = true;
				}
				None => {
					out.push(Spanned::fragment(token, at));
					expect_operand = false;
				}
			}
			i += 1;
		}
	}

	out
}

/// Gets the operator a token consists of, if it's a lone operator.
fn single_operator(token: &str) -> Option<Operator> {
	let mut chars = token.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => Operator::from_symbol(c),
		_ => None,
	}
}

/// Breaks text into trimmed operand and operator tokens along with their byte positions, skipping over flavor text.
fn tokenize(text: &str) -> Vec<(usize, &str)> {
	let mut tokens = Vec::new();
	let mut start = 0;
	let mut in_flavor = false;

	for (i, c) in text.char_indices() {
		match c {
			'[' => in_flavor = true,
			']' => in_flavor = false,
			c if !in_flavor && Operator::from_symbol(c).is_some() => {
				push_trimmed(&mut tokens, text, start, i);
				tokens.push((i, &text[i..i + 1]));
				start = i + 1;
			}
			_ => {}
		}
	}
	push_trimmed(&mut tokens, text, start, text.len());

	tokens
}

/// Adds the trimmed text between two byte positions as a token, unless it's blank.
fn push_trimmed<'a>(tokens: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
	let slice = &text[start..end];
	let trimmed = slice.trim_start();
	let pos = start + (slice.len() - trimmed.len());
	let trimmed = trimmed.trim_end();
	if !trimmed.is_empty() {
		tokens.push((pos, trimmed));
	}
}
