//! Property-based tests for formula parsing and evaluation

use alea::{
	dice::roller::{FastRand, Max, Min},
	parse,
	term::terms_formula,
	Roll,
};
use proptest::prelude::*;

/// Generate dice groups with an optional modifier
fn dice_strategy() -> impl Strategy<Value = String> {
	(
		1_u32..20,
		1_u32..100,
		prop_oneof![
			Just(String::new()),
			Just("kh".to_owned()),
			Just("kl2".to_owned()),
			Just("dl".to_owned()),
			Just("xo".to_owned()),
			Just("r<=1".to_owned()),
			(1_i64..10).prop_map(|val| format!("cs>={val}")),
			(1_i64..5).prop_map(|val| format!("min{val}")),
		],
	)
		.prop_map(|(count, sides, modifier)| format!("{count}d{sides}{modifier}"))
}

/// Generate operands: dice, numbers, or small groups of them
fn operand_strategy() -> impl Strategy<Value = String> {
	let leaf = prop_oneof![dice_strategy(), (0_u32..1000).prop_map(|val| val.to_string())];
	leaf.prop_recursive(2, 8, 3, |inner| {
		prop_oneof![
			inner.clone().prop_map(|operand| format!("({operand})")),
			(inner.clone(), inner.clone()).prop_map(|(a, b)| format!("max({a}, {b})")),
			(inner.clone(), inner).prop_map(|(a, b)| format!("{{{a}, {b}}}kh")),
		]
	})
}

/// Generate formulas of operands joined by operators
fn formula_strategy() -> impl Strategy<Value = String> {
	(
		operand_strategy(),
		prop::collection::vec((prop_oneof![Just(" + "), Just(" - "), Just(" * ")], operand_strategy()), 0..4),
	)
		.prop_map(|(first, rest)| {
			rest.into_iter().fold(first, |mut formula, (op, operand)| {
				formula.push_str(op);
				formula.push_str(&operand);
				formula
			})
		})
}

proptest! {
	#[test]
	fn written_formulas_reparse(formula in formula_strategy()) {
		let terms = parse::terms(&formula).unwrap();
		let written = terms_formula(&terms);
		prop_assert_eq!(parse::terms(&written).unwrap(), terms);
	}

	#[test]
	fn dice_totals_stay_in_range(count in 1_u32..50, sides in 1_u32..100, seed in any::<u64>()) {
		let mut roll: Roll = format!("{count}d{sides}").parse().unwrap();
		let total = roll.evaluate(&mut FastRand::with_seed(seed)).unwrap();
		prop_assert!(total >= f64::from(count));
		prop_assert!(total <= f64::from(count) * f64::from(sides));
	}

	#[test]
	fn random_totals_fall_between_extremes(formula in formula_strategy(), seed in any::<u64>()) {
		let roll: Roll = formula.parse().unwrap();
		let low = roll.clone().evaluate(&mut Min);
		let high = roll.clone().evaluate(&mut Max);
		let random = roll.clone().evaluate(&mut FastRand::with_seed(seed));

		// Only formulas without subtraction are monotonic in their dice
		if let (Ok(low), Ok(high), Ok(random), false) = (low, high, random, formula.contains(" - ")) {
			prop_assert!(low <= random && random <= high, "{} <= {} <= {} for {}", low, random, high, formula);
		}
	}
}
