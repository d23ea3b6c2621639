use std::{
	env,
	io::{self, Write},
	process::ExitCode,
};

use alea::{
	data::substitute,
	parse::FormatError,
	term::{describe_terms, Describe},
	Context, EvalMode, Roll, RollOptions,
};
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

fn main() -> ExitCode {
	init_tracing();

	let mut options = RollOptions::default();
	let mut data = Context::new();
	let mut words = Vec::new();

	let mut args = env::args().skip(1);
	while let Some(arg) = args.next() {
		match arg.as_str() {
			"--min" => options.mode = EvalMode::Minimize,
			"--max" => options.mode = EvalMode::Maximize,
			"--data" => {
				let Some(json) = args.next() else {
					eprintln!("--data needs a JSON object");
					return ExitCode::FAILURE;
				};
				match serde_json::from_str::<serde_json::Value>(&json) {
					Ok(value) => data = Context::from(value),
					Err(err) => {
						eprintln!("Invalid data: {err}");
						return ExitCode::FAILURE;
					}
				}
			}
			// Obtain the formula by combining all other args, so that it can be left unquoted even with spaces
			_ => words.push(arg),
		}
	}

	let input = if words.is_empty() {
		let mut lines = io::stdin().lines();

		// If there isn't already input available in stdin, display a prompt for it
		if lines.size_hint().1.is_none() {
			print!("Enter roll formula: ");
			if let Err(err) = io::stdout().flush() {
				eprintln!("Couldn't show the prompt: {err}");
				return ExitCode::FAILURE;
			}
		}

		// Grab the first line available from stdin
		match lines.next() {
			Some(Ok(line)) => line,
			_ => return ExitCode::FAILURE,
		}
	} else {
		words.join(" ")
	};

	println!("Input: {input}");

	let substituted = substitute(&input, &data, options.missing_data.as_deref(), options.warn_missing);
	for missing in &substituted.missing {
		println!("Missing: {missing}");
	}

	let mut roll = match Roll::parse(&substituted.formula) {
		Ok(roll) => roll,
		Err(err) => {
			report(&substituted.formula, &err);
			return ExitCode::FAILURE;
		}
	};
	println!("Parsed: {}", describe_terms(roll.terms(), None));

	match roll.evaluate(&mut options.mode.roller(None)) {
		Ok(total) => {
			println!("Described: {}", roll.describe(options.list_limit));
			println!("Total: {total}");
			ExitCode::SUCCESS
		}
		Err(err) => {
			eprintln!("Evaluation error: {err}");
			ExitCode::FAILURE
		}
	}
}

/// Prints a parse error, pointing at the problem in the formula when possible.
fn report(formula: &str, err: &FormatError) {
	let Some(span) = err.span() else {
		eprintln!("Parse error: {err}");
		return;
	};

	let printed = Report::build(ReportKind::Error, span.clone())
		.with_config(Config::default().with_index_type(IndexType::Byte))
		.with_message("Parse error")
		.with_label(Label::new(span).with_message(err.to_string()).with_color(Color::Red))
		.finish()
		.eprint(Source::from(formula));
	if printed.is_err() {
		eprintln!("Parse error: {err}");
	}
}

/// Sets up logging, controlled by `RUST_LOG` (e.g. `RUST_LOG=alea=debug`).
fn init_tracing() {
	use tracing_subscriber::{fmt, prelude::*, EnvFilter};

	if env::var("RUST_LOG").is_ok() {
		tracing_subscriber::registry()
			.with(fmt::layer().with_writer(io::stderr).with_target(true))
			.with(EnvFilter::from_default_env())
			.init();
	}
}
