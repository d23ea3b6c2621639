use chumsky::Parser;
use pretty_assertions::assert_eq;

use crate::{
	arith::{evaluate, evaluate_terms, CalcError, Expr, MathFn},
	term::{Operator, Term},
};

#[test]
fn basic_negation() {
	let expr = Expr::Neg(Box::new(Expr::Num(42.0)));
	assert_eq!(expr.calc().unwrap(), -42.0);
}

#[test]
fn basic_addition() {
	let expr = Expr::Add(Box::new(Expr::Num(42.0)), Box::new(Expr::Num(69.0)));
	assert_eq!(expr.calc().unwrap(), 111.0);
}

#[test]
fn basic_subtraction() {
	let expr = Expr::Sub(Box::new(Expr::Num(42.0)), Box::new(Expr::Num(69.0)));
	assert_eq!(expr.calc().unwrap(), -27.0);
}

#[test]
fn basic_multiplication() {
	let expr = Expr::Mul(Box::new(Expr::Num(42.0)), Box::new(Expr::Num(69.0)));
	assert_eq!(expr.calc().unwrap(), 2898.0);
}

#[test]
fn basic_division() {
	let expr = Expr::Div(Box::new(Expr::Num(10.0)), Box::new(Expr::Num(4.0)));
	assert_eq!(expr.calc().unwrap(), 2.5);
}

#[test]
fn complex_math() {
	// (-5 * (3 + 1)) - (-4 / 2)
	let expr = Expr::Sub(
		Box::new(Expr::Mul(
			Box::new(Expr::Neg(Box::new(Expr::Num(5.0)))),
			Box::new(Expr::Add(Box::new(Expr::Num(3.0)), Box::new(Expr::Num(1.0)))),
		)),
		Box::new(Expr::Div(
			Box::new(Expr::Neg(Box::new(Expr::Num(4.0)))),
			Box::new(Expr::Num(2.0)),
		)),
	);
	assert_eq!(expr.calc().unwrap(), -18.0);
	assert_eq!(evaluate(&expr.to_string()).unwrap(), -18.0);
}

#[test]
fn division_by_zero() {
	assert!(matches!(evaluate("4 / 0"), Err(CalcError::NonFinite(..))));
	assert!(matches!(evaluate("0 / 0"), Err(CalcError::NonFinite(..))));
}

#[test]
fn precedence_and_grouping() {
	assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
	assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
	assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
	assert_eq!(evaluate("24 / 4 / 2").unwrap(), 3.0);
	assert_eq!(evaluate("2 - -3").unwrap(), 5.0);
	assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
	assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
}

#[test]
fn function_calls() {
	assert_eq!(evaluate("floor(7 / 2)").unwrap(), 3.0);
	assert_eq!(evaluate("ceil(7 / 2)").unwrap(), 4.0);
	assert_eq!(evaluate("round(2.5) + round(-2.5)").unwrap(), 0.0);
	assert_eq!(evaluate("round(2.5)").unwrap(), 3.0);
	assert_eq!(evaluate("trunc(-3.7)").unwrap(), -3.0);
	assert_eq!(evaluate("abs(-4)").unwrap(), 4.0);
	assert_eq!(evaluate("sign(-4) + sign(0)").unwrap(), -1.0);
	assert_eq!(evaluate("max(1, 7, 4)").unwrap(), 7.0);
	assert_eq!(evaluate("min(3, max(1, 2))").unwrap(), 2.0);
	assert_eq!(evaluate("pow(2, 10)").unwrap(), 1024.0);
	assert_eq!(evaluate("hypot(3, 4)").unwrap(), 5.0);
	assert_eq!(evaluate("sqrt(16)").unwrap(), 4.0);
	assert_eq!(evaluate("log2(8) + log10(100)").unwrap(), 5.0);
}

#[test]
fn function_names_are_case_insensitive() {
	assert_eq!(MathFn::from_name("FLOOR"), Some(MathFn::Floor));
	assert_eq!(MathFn::from_name("Max"), Some(MathFn::Max));
	assert_eq!(MathFn::from_name("eval"), None);
	assert_eq!(MathFn::from_name(""), None);
}

#[test]
fn wrong_arity() {
	assert_eq!(
		evaluate("pow(2)"),
		Err(CalcError::Arity {
			func: MathFn::Pow,
			got: 1
		})
	);
	assert!(matches!(evaluate("floor(1, 2)"), Err(CalcError::Arity { .. })));
}

#[test]
fn non_finite_functions() {
	assert!(matches!(evaluate("sqrt(-4)"), Err(CalcError::NonFinite(..))));
	assert!(matches!(evaluate("ln(0)"), Err(CalcError::NonFinite(..))));
}

#[test]
fn only_the_restricted_grammar_is_accepted() {
	for expression in ["", "2 +", "alert(1)", "2 ** 3", "2; 3", "process.exit()", "1 + (2", "max()", "x"] {
		assert!(
			matches!(evaluate(expression), Err(CalcError::Syntax { .. })),
			"{expression:?} should be rejected"
		);
	}
}

#[test]
fn term_lists() {
	let terms = [Term::num(7.0), Term::Op(Operator::Mul), Term::num(-2.0)];
	assert_eq!(evaluate_terms(&terms).unwrap(), -14.0);

	let terms = [Term::Op(Operator::Sub), Term::num(3.0), Term::Op(Operator::Add), Term::num(10.0)];
	assert_eq!(evaluate_terms(&terms).unwrap(), 7.0);
}

#[test]
fn unresolved_term_lists() {
	let terms = [Term::num(1.0), Term::Op(Operator::Add), Term::Str("d6".to_owned())];
	assert_eq!(evaluate_terms(&terms), Err(CalcError::Unresolved("d6".to_owned())));
}

#[test]
fn display_keeps_grouping() {
	for expression in ["(1 + 2) * 3", "1 - (2 - 3)", "8 / (4 / 2)", "-(1 + 2)", "max(1, 2 * 3) - 4"] {
		let parsed = crate::arith::expr().parse(expression).into_result().unwrap();
		assert_eq!(parsed.to_string(), expression);
	}
}
