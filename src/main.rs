#[cfg(feature = "parse")]
fn main() -> std::process::ExitCode {
	use std::{
		env,
		io::{self, Write},
		process::ExitCode,
	};

	use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
	use chimera::{
		bias::BiasSources,
		dice::roller::FastRand,
		store::{ActorId, ActorKey, MemoryStore, ScopeId},
		Engine, Error,
	};
	use tracing_subscriber::EnvFilter;

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(io::stderr)
		.init();

	let engine = Engine::new(MemoryStore::new());
	let key = ActorKey::new(ScopeId(0), ActorId(0));
	let mut sources = BiasSources::STANDARD;

	// Leading flags tweak the session; everything after them is the expression, so it can be left unquoted even with
	// spaces. The first argument is ignored since it is typically the name of the executable itself.
	let mut args = env::args().skip(1).peekable();
	while let Some(flag) = args.next_if(|arg| arg.starts_with("--")) {
		match flag.as_str() {
			"--variant" => engine.set_variant_mode(key.scope, true),
			"--karma" => sources.karma = true,
			"--luck" => {
				let luck = args.next().and_then(|luck| luck.parse::<i32>().ok()).unwrap_or(-1);
				if let Err(err) = engine.set_luck(key, luck) {
					eprintln!("{err}");
					return ExitCode::FAILURE;
				}
				sources.luck = true;
			}
			other => {
				eprintln!("Unknown flag: {other} (expected --variant, --karma, or --luck <0-100>)");
				return ExitCode::FAILURE;
			}
		}
	}

	let input = if args.peek().is_some() {
		args.collect::<Vec<String>>().join(" ")
	} else {
		let mut lines = io::stdin().lines();

		// If there isn't already input available in stdin, display a prompt for it
		if lines.size_hint().1.is_none() {
			print!("Enter dice expression: ");
			if io::stdout().flush().is_err() {
				return ExitCode::FAILURE;
			}
		}

		match lines.next() {
			Some(Ok(line)) => line,
			_ => {
				eprintln!("No dice expression given");
				return ExitCode::FAILURE;
			}
		}
	};

	match engine.roll_str(key, &input, sources, &mut FastRand::default()) {
		Ok(result) => {
			println!("{result}");
			if let Some(label) = &result.expression.label {
				println!("Label: {label}");
			}
			println!("Percentile: {:.1}", result.percentile);
			ExitCode::SUCCESS
		}
		Err(Error::Validation(err)) => {
			let span = err.span.clone().unwrap_or(0..input.len());
			let report = Report::build(ReportKind::Error, ("input", span.clone()))
				.with_config(Config::default().with_index_type(IndexType::Byte))
				.with_message(&err.message)
				.with_label(
					Label::new(("input", span))
						.with_message(&err.message)
						.with_color(Color::Red),
				)
				.finish();
			if report.eprint(("input", Source::from(&input))).is_err() {
				eprintln!("{err}");
			}
			ExitCode::FAILURE
		}
		Err(err) => {
			eprintln!("{err}");
			ExitCode::FAILURE
		}
	}
}

#[cfg(not(feature = "parse"))]
fn main() {
	println!("Nothing to do since the parse feature is disabled.");
}
