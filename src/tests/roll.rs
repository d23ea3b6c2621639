use pretty_assertions::assert_eq;

use crate::{
	arith::CalcError,
	data::Context,
	dice::{
		roller::{Iter as IterRoller, Max as MaxRoller, Min as MinRoller},
		Dice, DieResult,
	},
	options::{EvalMode, RollOptions},
	parse::FormatError,
	roll::{Error, EvalError, Roll, StateError},
	term::{Describe, Term},
};

fn parse_roll(formula: &str) -> Roll {
	formula.parse().unwrap()
}

#[test]
fn basic_roll() {
	let mut roll = parse_roll("2d6 + 3");
	assert!(!roll.is_evaluated());
	assert_eq!(roll.total(), None);

	let total = roll.evaluate(&mut IterRoller::new([2, 5])).unwrap();
	assert_eq!(total, 10.0);
	assert_eq!(roll.total(), Some(10.0));
	assert!(roll.is_evaluated());
	assert_eq!(roll.dice().len(), 1);
	assert_eq!(roll.result_formula(), "2d6[2, 5] + 3");
	assert_eq!(roll.to_string(), "2d6[2, 5] + 3 = 10");
}

#[test]
fn evaluates_once() {
	let mut roll = parse_roll("1d20");
	roll.evaluate(&mut MaxRoller).unwrap();
	assert_eq!(
		roll.evaluate(&mut MaxRoller),
		Err(Error::State(StateError::AlreadyEvaluated))
	);
	assert_eq!(roll.total(), Some(20.0));
}

#[test]
fn empty_formula() {
	assert_eq!(Roll::parse("   "), Err(FormatError::Empty));
	assert_eq!(Roll::new("", &Context::new()), Err(FormatError::Empty));
}

#[test]
fn operator_precedence() {
	let mut roll = parse_roll("1d4 + 2 * 3");
	assert_eq!(roll.evaluate(&mut IterRoller::new([4])).unwrap(), 10.0);

	let mut roll = parse_roll("(1d4 + 2) * 3");
	assert_eq!(roll.evaluate(&mut IterRoller::new([4])).unwrap(), 18.0);
}

#[test]
fn negation() {
	let mut roll = parse_roll("-1d6 + 10");
	assert_eq!(roll.evaluate(&mut IterRoller::new([4])).unwrap(), 6.0);

	let mut roll = parse_roll("2 - -3");
	assert_eq!(roll.evaluate(&mut MinRoller).unwrap(), 5.0);
}

#[test]
fn random_dice_count() {
	let mut roll = parse_roll("(1d4)d6");
	let total = roll.evaluate(&mut IterRoller::new([3, 2, 4, 6])).unwrap();
	assert_eq!(total, 12.0);

	// The inner dice are rolled first, then the dice they determined the count of
	let rolled = roll.dice();
	assert_eq!(rolled.len(), 2);
	assert_eq!(rolled[0].dice, Dice::new(1, 4));
	assert_eq!(rolled[1].dice, Dice::new(3, 6));
	assert_eq!(roll.result_formula(), "3d6[2, 4, 6]");
}

#[test]
fn malformed_fragments_fail_before_rolling() {
	assert!(matches!(
		"(1d4)dfoo".parse::<Roll>(),
		Err(FormatError::Unresolved { term, .. }) if term == "dfoo"
	));
	assert!(matches!(
		"4000000000d6".parse::<Roll>(),
		Err(FormatError::MalformedDice { .. })
	));
}

#[test]
fn math_calls() {
	let mut roll = parse_roll("floor(7 / 2) + max(1d6, 3)");
	assert_eq!(roll.evaluate(&mut IterRoller::new([5])).unwrap(), 8.0);
	assert_eq!(roll.result_formula(), "3 + 5");

	let mut roll = parse_roll("round(1d6 / 4)");
	assert_eq!(roll.evaluate(&mut IterRoller::new([2])).unwrap(), 1.0);
}

#[test]
fn flavor_survives_evaluation() {
	let mut roll = parse_roll("2d6[fire] + (1 + 1)[bonus]");
	assert_eq!(roll.evaluate(&mut IterRoller::new([1, 6])).unwrap(), 9.0);
	assert_eq!(roll.terms()[0].flavor(), Some("fire"));
	assert_eq!(roll.terms()[2].flavor(), Some("bonus"));
	assert_eq!(roll.result_formula(), "2d6[1, 6][fire] + 2[bonus]");
}

#[test]
fn pools() {
	let mut roll = parse_roll("{1d8, 1d6 + 2}kh");
	let total = roll.evaluate(&mut IterRoller::new([5, 1])).unwrap();
	assert_eq!(total, 5.0);
	assert_eq!(roll.dice().len(), 2);
	assert_eq!(roll.result_formula(), "{1d8[5], 1d6[1] + 2}kh[5, 3 (d)]");

	let Term::Pool(pool) = &roll.terms()[0] else {
		panic!("pool should stay a pool once evaluated");
	};
	assert!(pool.evaluated);
	assert_eq!(pool.results.iter().map(|result| result.val).collect::<Vec<_>>(), [5, 3]);
}

#[test]
fn pool_success_counting() {
	let mut roll = parse_roll("{4, 2, 6}cs>=4 + 1");
	assert_eq!(roll.evaluate(&mut MinRoller).unwrap(), 3.0);
}

#[test]
fn stray_operators_are_dropped() {
	let mut roll = parse_roll("2d6 +");
	assert_eq!(roll.evaluate(&mut IterRoller::new([3, 4])).unwrap(), 7.0);

	let mut roll = parse_roll("* 3 + 2");
	assert_eq!(roll.evaluate(&mut MinRoller).unwrap(), 5.0);
}

#[test]
fn failed_evaluation_keeps_dice() {
	let mut roll = parse_roll("1d6 / 0");
	let result = roll.evaluate(&mut IterRoller::new([4]));
	assert!(matches!(result, Err(Error::Eval(EvalError::Calc(CalcError::NonFinite(..))))));
	assert_eq!(roll.dice().len(), 1);
	assert!(!roll.is_evaluated());
	assert_eq!(roll.total(), None);
}

#[test]
fn failed_dice() {
	let mut roll = parse_roll("4d1x");
	assert!(matches!(
		roll.evaluate(&mut MaxRoller),
		Err(Error::Eval(EvalError::Dice { .. }))
	));
}

#[test]
fn evaluation_modes() {
	let mut roll = parse_roll("2d6 + 1d4");
	assert_eq!(roll.clone().evaluate(&mut EvalMode::Minimize.roller(None)).unwrap(), 3.0);
	assert_eq!(roll.evaluate(&mut EvalMode::Maximize.roller(None)).unwrap(), 16.0);

	let mut seeded = parse_roll("10d20");
	let mut again = seeded.clone();
	assert_eq!(
		seeded.evaluate(&mut EvalMode::Random.roller(Some(42))).unwrap(),
		again.evaluate(&mut EvalMode::Random.roller(Some(42))).unwrap()
	);
}

#[test]
fn data_substitution() {
	let mut data = Context::new();
	data.set("attributes.str", 3);

	let mut roll = Roll::new("1d20 + @attributes.str + @bonus", &data).unwrap();
	assert_eq!(roll.formula(), "1d20 + 3 + 0");
	assert_eq!(roll.missing().len(), 1);
	assert_eq!(roll.missing()[0].path, "bonus");
	assert_eq!(roll.data(), &data);
	assert_eq!(roll.evaluate(&mut IterRoller::new([10])).unwrap(), 13.0);
}

#[test]
fn missing_data_without_fallback() {
	let options = RollOptions::builder().missing_data(None::<String>).warn_missing(false).build();
	assert_eq!(
		Roll::with_options("1d6 + @bonus", &Context::new(), &options),
		Err(FormatError::Unresolved {
			term: "@bonus".to_owned(),
			span: Some(6..12)
		})
	);
}

#[test]
fn breakdown() {
	let mut roll = parse_roll("2d6kh + 1d4");
	roll.evaluate(&mut IterRoller::new([2, 5, 3])).unwrap();
	assert_eq!(
		roll.breakdown(),
		[
			DieResult {
				face_value: 2,
				active: false,
				success: None
			},
			DieResult {
				face_value: 5,
				active: true,
				success: None
			},
			DieResult {
				face_value: 3,
				active: true,
				success: None
			},
		]
	);
}

#[test]
fn described_with_limit() {
	let mut roll = parse_roll("5d6");
	roll.evaluate(&mut IterRoller::new([1, 2, 3, 4, 5])).unwrap();
	assert_eq!(roll.describe(Some(2)), "5d6[1, 2, 3 more...]");
}

#[test]
fn from_terms() {
	let terms = crate::parse::terms("3d6 - 1").unwrap();
	let mut roll = Roll::from_terms(terms);
	assert_eq!(roll.formula(), "3d6 - 1");
	assert_eq!(roll.evaluate(&mut MaxRoller).unwrap(), 17.0);
}

#[test]
fn serializes() {
	let mut roll = parse_roll("2d6kh + {1, 2}kl[low]");
	roll.evaluate(&mut IterRoller::new([3, 6])).unwrap();

	let json = serde_json::to_string(&roll).unwrap();
	let restored: Roll = serde_json::from_str(&json).unwrap();
	assert_eq!(restored, roll);
	assert_eq!(restored.total(), Some(7.0));
}
