use pretty_assertions::assert_eq;

use crate::{
	arith::MathFn,
	dice::{modifier::Condition, Dice, Modifier},
	parse::{
		classify::{classify, is_numeric},
		terms, FormatError,
	},
	term::{terms_formula, DiceTerm, MathTerm, NumTerm, Operator, ParenTerm, PoolTerm, Term},
};

fn dice(count: u32, sides: u32) -> Term {
	Term::dice(Dice::new(count, sides))
}

#[test]
fn simple_formula() {
	assert_eq!(
		terms("2d6 + 3").unwrap(),
		[dice(2, 6), Term::Op(Operator::Add), Term::num(3.0)]
	);
	assert_eq!(
		terms("1d20+5-1d4").unwrap(),
		[
			dice(1, 20),
			Term::Op(Operator::Add),
			Term::num(5.0),
			Term::Op(Operator::Sub),
			dice(1, 4)
		]
	);
}

#[test]
fn dice_with_modifiers() {
	assert_eq!(
		terms("4d6kh3").unwrap(),
		[Term::dice(Dice::builder().count(4).sides(6).keep_high(3).build())]
	);
	assert_eq!(
		terms("3D6CS<=4").unwrap(),
		[Term::dice(Dice::builder().count(3).sides(6).count_success(Condition::Lte(4)).build())]
	);
}

#[test]
fn implied_dice_count() {
	assert_eq!(terms("d20").unwrap(), [dice(1, 20)]);
	assert_eq!(terms("d20 + d4").unwrap(), [dice(1, 20), Term::Op(Operator::Add), dice(1, 4)]);
}

#[test]
fn whitespace_before_dice() {
	assert_eq!(terms("4 D6").unwrap(), [dice(4, 6)]);
}

#[test]
fn computed_dice_count() {
	assert_eq!(terms("(2+1)D6").unwrap(), [dice(3, 6)]);
	assert_eq!(terms("floor(5 / 2)d6").unwrap(), [dice(2, 6)]);
}

#[test]
fn random_dice_count_waits_for_evaluation() {
	assert_eq!(
		terms("(1d4)d6").unwrap(),
		[
			Term::Paren(ParenTerm {
				inner: vec![dice(1, 4)],
				flavor: None,
			}),
			Term::Str("d6".to_owned()),
		]
	);
}

#[test]
fn fragments_waiting_on_groups_are_still_checked() {
	assert_eq!(
		terms("(1d4)dfoo"),
		Err(FormatError::Unresolved {
			term: "dfoo".to_owned(),
			span: Some(5..9)
		})
	);
	assert!(matches!(
		terms("(1d4)d0 + 2"),
		Err(FormatError::MalformedDice { term, span: Some(span), .. }) if term == "d0" && span == (5..7)
	));

	// Fragments that only need a value from their neighbor are fine
	assert!(terms("(1d4)d6kh[fire]").is_ok());
	assert!(terms("2d(1d4 + 2)").is_ok());
}

#[test]
fn signed_numbers() {
	assert_eq!(
		terms("-3 + 2").unwrap(),
		[Term::num(-3.0), Term::Op(Operator::Add), Term::num(2.0)]
	);
	assert_eq!(
		terms("2 - -3").unwrap(),
		[Term::num(2.0), Term::Op(Operator::Sub), Term::num(-3.0)]
	);
	assert_eq!(
		terms("2 * -1.5").unwrap(),
		[Term::num(2.0), Term::Op(Operator::Mul), Term::num(-1.5)]
	);

	// Only numbers take the sign, so negated dice keep their operator
	assert_eq!(terms("-1d6").unwrap(), [Term::Op(Operator::Sub), dice(1, 6)]);
}

#[test]
fn flavor_text() {
	let mut fire = DiceTerm::new(Dice::new(2, 6));
	fire.flavor = Some("fire".to_owned());
	assert_eq!(
		terms("2d6[fire] + 3").unwrap(),
		[Term::Dice(fire), Term::Op(Operator::Add), Term::num(3.0)]
	);

	// Operators inside flavor text don't split anything
	let parsed = terms("1d8[cold + wet]").unwrap();
	assert_eq!(parsed.len(), 1);
	assert_eq!(parsed[0].flavor(), Some("cold + wet"));

	assert_eq!(
		terms("3[bonus]").unwrap(),
		[Term::Num(NumTerm {
			val: 3.0,
			flavor: Some("bonus".to_owned()),
		})]
	);
}

#[test]
fn group_flavor() {
	let parsed = terms("(1 + 2)[bonus] * 2").unwrap();
	assert_eq!(
		parsed,
		[
			Term::Paren(ParenTerm {
				inner: vec![Term::num(1.0), Term::Op(Operator::Add), Term::num(2.0)],
				flavor: Some("bonus".to_owned()),
			}),
			Term::Op(Operator::Mul),
			Term::num(2.0),
		]
	);
	assert_eq!(terms_formula(&parsed), "(1 + 2)[bonus] * 2");
}

#[test]
fn nested_parentheses() {
	assert_eq!(
		terms("((1d4 + 1) * 2)").unwrap(),
		[Term::Paren(ParenTerm {
			inner: vec![
				Term::Paren(ParenTerm {
					inner: vec![dice(1, 4), Term::Op(Operator::Add), Term::num(1.0)],
					flavor: None,
				}),
				Term::Op(Operator::Mul),
				Term::num(2.0),
			],
			flavor: None,
		})]
	);
}

#[test]
fn math_calls() {
	assert_eq!(
		terms("floor(7 / 2)").unwrap(),
		[Term::Math(MathTerm {
			func: MathFn::Floor,
			args: vec![vec![Term::num(7.0), Term::Op(Operator::Div), Term::num(2.0)]],
			flavor: None,
		})]
	);

	let parsed = terms("1 + MAX(1d6, 3, 2)").unwrap();
	let Term::Math(math) = &parsed[2] else {
		panic!("expected a math call, got {parsed:?}");
	};
	assert_eq!(math.func, MathFn::Max);
	assert_eq!(math.args, [vec![dice(1, 6)], vec![Term::num(3.0)], vec![Term::num(2.0)]]);
}

#[test]
fn nested_math_arguments() {
	let parsed = terms("max(min(1, 2), 3)").unwrap();
	assert_eq!(
		parsed,
		[Term::Math(MathTerm {
			func: MathFn::Max,
			args: vec![
				vec![Term::Math(MathTerm {
					func: MathFn::Min,
					args: vec![vec![Term::num(1.0)], vec![Term::num(2.0)]],
					flavor: None,
				})],
				vec![Term::num(3.0)],
			],
			flavor: None,
		})]
	);
}

#[test]
fn unknown_functions_are_plain_groups() {
	// "alert" isn't a known function, so the parenthetical's value is merged into the name, which can't be resolved
	assert!(matches!(
		terms("alert(1) + 2"),
		Err(FormatError::Unresolved { term, .. }) if term == "alert1"
	));
}

#[test]
fn pools() {
	assert_eq!(
		terms("{1d8, 1d6 + 2}kh").unwrap(),
		[Term::Pool(PoolTerm {
			members: vec![
				vec![dice(1, 8)],
				vec![dice(1, 6), Term::Op(Operator::Add), Term::num(2.0)]
			],
			modifiers: vec![Modifier::KeepHigh(1)],
			results: Vec::new(),
			evaluated: false,
			flavor: None,
		})]
	);

	let parsed = terms("{4, (1d6), 2}cs>=3 + 1").unwrap();
	let Term::Pool(pool) = &parsed[0] else {
		panic!("expected a pool, got {parsed:?}");
	};
	assert_eq!(pool.members.len(), 3);
	assert_eq!(pool.modifiers, [Modifier::CountSuccess(Condition::Gte(3))]);
	assert_eq!(&parsed[1..], &[Term::Op(Operator::Add), Term::num(1.0)]);
}

#[test]
fn pool_modifiers_must_select() {
	assert!(matches!(
		terms("{1, 2}x"),
		Err(FormatError::PoolModifiers { span: Some(span), .. }) if span == (6..7)
	));
	assert!(matches!(terms("{1, 2}zz"), Err(FormatError::PoolModifiers { .. })));
}

#[test]
fn unbalanced_brackets() {
	assert_eq!(
		terms("2d6 + (1"),
		Err(FormatError::Unclosed {
			symbol: '(',
			span: Some(6..8)
		})
	);
	assert_eq!(
		terms("2d6)"),
		Err(FormatError::UnexpectedClose {
			symbol: ')',
			opening: '(',
			span: Some(3..4)
		})
	);
	assert!(matches!(terms("{1, 2"), Err(FormatError::Unclosed { symbol: '{', .. })));
	assert!(matches!(terms("1d6[fire"), Err(FormatError::Unclosed { symbol: '[', .. })));
}

#[test]
fn empty_groups_and_arguments() {
	assert!(matches!(terms("2 + ()"), Err(FormatError::EmptyGroup { .. })));
	assert!(matches!(terms("max(1, , 2)"), Err(FormatError::EmptyArgument { .. })));
	assert!(matches!(terms("{1d6,}"), Err(FormatError::EmptyArgument { .. })));
}

#[test]
fn unresolved_fragments() {
	assert_eq!(
		terms("2d6 + foo"),
		Err(FormatError::Unresolved {
			term: "foo".to_owned(),
			span: Some(6..9)
		})
	);
	assert!(matches!(terms("1d6 + @missing"), Err(FormatError::Unresolved { .. })));
}

#[test]
fn malformed_dice() {
	assert!(matches!(
		terms("4d6zz"),
		Err(FormatError::MalformedDice { term, span: Some(span), .. }) if term == "4d6zz" && span == (0..5)
	));
	assert!(matches!(terms("1 + 4d0"), Err(FormatError::MalformedDice { .. })));
}

#[test]
fn classification() {
	assert_eq!(classify("12", None, None, true).unwrap(), Term::num(12.0));
	assert_eq!(classify("-0.5", None, None, false).unwrap(), Term::num(-0.5));
	assert_eq!(classify("2d8", None, None, true).unwrap(), dice(2, 8));

	// Waits on a neighbor that isn't resolved yet
	let paren = Term::Paren(ParenTerm {
		inner: vec![dice(1, 4)],
		flavor: None,
	});
	assert_eq!(
		classify("2d8", Some(&paren), None, true).unwrap(),
		Term::Str("2d8".to_owned())
	);
	assert_eq!(classify("2d8", Some(&paren), None, false).unwrap(), dice(2, 8));

	assert_eq!(classify("bar", None, None, true).unwrap(), Term::Str("bar".to_owned()));
	assert!(matches!(
		classify("bar", None, None, false),
		Err(FormatError::Unresolved { .. })
	));
}

#[test]
fn numeric_fragments() {
	assert!(is_numeric("3"));
	assert!(is_numeric("-3"));
	assert!(is_numeric("3.25"));
	assert!(!is_numeric("3."));
	assert!(!is_numeric(".5"));
	assert!(!is_numeric("1d6"));
	assert!(!is_numeric("+3"));
}

#[test]
fn formulas_reparse() {
	for formula in [
		"4d6kh3 + 2",
		"(1d4)d6",
		"floor((2d10 + 5) / 2)[fire]",
		"{1d8, 1d6 + 2}kh",
		"-1d6 * 2",
		"2d20kl - -3",
		"max(1d6, 1d8) + 1d4[cold]",
	] {
		let parsed = terms(formula).unwrap();
		let written = terms_formula(&parsed);
		assert_eq!(written, formula);
		assert_eq!(terms(&written).unwrap(), parsed);
	}
}

#[test]
fn terms_serialize() {
	let parsed = terms("2d6[fire] + floor(1d4 / 2)").unwrap();
	let json = serde_json::to_value(&parsed).unwrap();
	assert_eq!(json[0]["class"], "dice");
	assert_eq!(json[0]["data"]["flavor"], "fire");
	assert_eq!(json[1], serde_json::json!({ "class": "op", "data": "add" }));
	assert_eq!(json[2]["class"], "math");

	let restored: Vec<Term> = serde_json::from_value(json).unwrap();
	assert_eq!(restored, parsed);
}
