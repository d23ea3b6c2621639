//! End-to-end scenarios: data substitution, parsing, evaluation, and checks through the public API.

use alea::{
	check::{Advantage, Check, OutcomeState, Reroll, RollOutcome},
	data::substitute,
	dice::roller::Iter as IterRoller,
	parse::{self, FormatError},
	Context, Dice, Roll, RollOptions, Term,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn counting_successes_under_a_difficulty() {
	let mut roll: Roll = "3D6cs<=10".parse().unwrap();
	roll.evaluate(&mut IterRoller::new([2, 7, 10])).unwrap();
	let outcome = RollOutcome::from_roll("Resist", 3, &roll).unwrap();

	// Every face at or under the difficulty counts
	assert_eq!(outcome.success_count(), 3);
	assert!(outcome.passed());

	let mut roll: Roll = "3d6cs<=4".parse().unwrap();
	roll.evaluate(&mut IterRoller::new([2, 5, 4])).unwrap();
	let outcome = RollOutcome::from_roll("Resist", 3, &roll).unwrap();
	assert_eq!(outcome.success_count(), 2);
	assert_eq!(
		outcome.dice().iter().map(|die| die.success).collect::<Vec<_>>(),
		[Some(true), Some(false), Some(true)]
	);
}

#[test]
fn advantage_adds_a_die() {
	let check = Check::new("Athletics", 3, 8).with_advantage(Advantage::Advantage);
	assert_eq!(check.formula(), "4d6cs<=8");

	let mut roll: Roll = "4D6cs<=8".parse().unwrap();
	assert_eq!(roll.evaluate(&mut IterRoller::new([1, 2, 3, 9])).unwrap(), 3.0);
	assert_eq!(check.roll(&mut IterRoller::new([1, 2, 3, 9])).unwrap().success_count(), 3);
}

#[test]
fn parenthetical_dice_count() {
	assert_eq!(parse::terms("(2+1)D6").unwrap(), [Term::dice(Dice::new(3, 6))]);
}

#[test]
fn substituted_dice_count() {
	let data = Context::from(json!({ "qualites": { "costaud": 4 } }));
	let substituted = substitute("@qualites.costaud D6", &data, Some("0"), false);
	assert_eq!(substituted.formula, "4 D6");

	let roll = Roll::new("@qualites.costaud D6", &data).unwrap();
	assert_eq!(roll.terms(), [Term::dice(Dice::new(4, 6))]);
}

#[test]
fn unbalanced_parenthesis() {
	let err = Roll::new("(2+1D6", &Context::new()).unwrap_err();
	assert!(matches!(err, FormatError::Unclosed { symbol: '(', .. }));
	assert_eq!(err.span(), Some(0..6));
}

#[test]
fn missing_data_with_custom_fallback() {
	let options = RollOptions::builder().missing_data(Some("1")).warn_missing(false).build();
	let mut roll = Roll::with_options("2d6 + @bonus", &Context::new(), &options).unwrap();
	assert_eq!(roll.formula(), "2d6 + 1");
	assert_eq!(roll.evaluate(&mut IterRoller::new([3, 3])).unwrap(), 7.0);
}

#[test]
fn full_check_lifecycle() {
	let check = Check::new("Climb", 3, 3);
	let mut outcome = check.roll(&mut IterRoller::new([2, 6, 4])).unwrap();
	assert_eq!(outcome.tooltip(), "Climb: 1/3 successes");
	assert!(outcome.reroll_available());

	let Reroll::Applied { replaced, new } = outcome.reroll(2, &mut IterRoller::new([1])).unwrap() else {
		panic!("first reroll should apply");
	};
	assert_eq!((replaced.val, new.val), (4, 1));
	assert_eq!(outcome.success_count(), 2);
	assert_eq!(outcome.state(), OutcomeState::Amended);

	// Still short of the baseline, but the reroll has been used up
	assert!(!outcome.passed());
	assert!(!outcome.reroll_available());
	assert_eq!(outcome.reroll(1, &mut IterRoller::new([1])).unwrap(), Reroll::Ignored);
	assert_eq!(outcome.success_count(), 2);
}

#[test]
fn evaluated_rolls_round_trip_through_json() {
	let mut data = Context::new();
	data.set("prof", 2);
	let mut roll = Roll::new("(1d4)d6 + max(1d8, @prof)[bonus]", &data).unwrap();
	roll.evaluate(&mut IterRoller::new([2, 3, 5, 7])).unwrap();

	// Grouped dice roll before the dice they feed into
	assert_eq!(roll.total(), Some(15.0));

	let json = serde_json::to_string(&roll).unwrap();
	let restored: Roll = serde_json::from_str(&json).unwrap();
	assert_eq!(restored, roll);
	assert_eq!(restored.result_formula(), "2d6[5, 7] + 3[bonus]");
}
