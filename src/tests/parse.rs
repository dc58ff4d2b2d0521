use crate::{
	dice::{operation::Condition, Dice, Faces, Operation},
	expr::DiceExpression,
	parse::{expression, MAX_EXPRESSION_LEN},
};

fn message(text: &str) -> String {
	expression(text).unwrap_err().message
}

#[test]
fn count_defaults_to_one() {
	let expr = expression("d20").unwrap();
	assert_eq!(expr.dice, Dice::new(1, 20));
	assert!(expr.modifiers.is_empty());
	assert_eq!(expr.label, None);
}

#[test]
fn face_sets() {
	assert_eq!(expression("4dF").unwrap().dice, Dice::with_faces(4, Faces::Fudge));
	assert_eq!(expression("3dD").unwrap().dice, Dice::with_faces(3, Faces::Fallout));
	assert_eq!(expression("df").unwrap().dice, Dice::with_faces(1, Faces::Fudge));
	assert_eq!(expression("1D1000").unwrap().dice, Dice::new(1, 1000));
}

#[test]
fn keep_and_drop() {
	let expr = expression("2d20kh").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::KeepHigh(1)]);

	let expr = expression("2d20k").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::KeepHigh(1)]);

	let expr = expression("2d20kl").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::KeepLow(1)]);

	// Drops are rewritten as keeps
	let expr = expression("4d6dl").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::KeepHigh(3)]);
	assert!(expr.is_canonical());

	let expr = expression("5d8dh2").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::KeepLow(3)]);
}

#[test]
fn rerolls_and_explosions() {
	let expr = expression("1d6ro<3").unwrap();
	assert_eq!(
		expr.dice.operations,
		vec![Operation::Reroll {
			cond: Condition::Lt(3),
			recurse: false,
		}]
	);

	let expr = expression("1d6r1").unwrap();
	assert_eq!(
		expr.dice.operations,
		vec![Operation::Reroll {
			cond: Condition::Eq(1),
			recurse: false,
		}]
	);

	let expr = expression("1d20rr<=2").unwrap();
	assert_eq!(
		expr.dice.operations,
		vec![Operation::Reroll {
			cond: Condition::Lte(2),
			recurse: true,
		}]
	);

	let expr = expression("8d6x").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::Explode { cond: None, recurse: true }]);

	let expr = expression("8d6xo>=5").unwrap();
	assert_eq!(
		expr.dice.operations,
		vec![Operation::Explode {
			cond: Some(Condition::Gte(5)),
			recurse: false,
		}]
	);
}

#[test]
fn dice_library_aliases() {
	let expr = expression("2d10e10").unwrap();
	assert_eq!(
		expr.dice.operations,
		vec![Operation::Explode {
			cond: Some(Condition::Eq(10)),
			recurse: true,
		}]
	);

	assert_eq!(expression("4d6p1").unwrap().dice.operations, vec![Operation::KeepHigh(3)]);
	assert_eq!(expression("4d6p").unwrap().dice.operations, vec![Operation::KeepHigh(3)]);
	assert_eq!(message("2d6p2"), "Cannot drop 2 of 2 dice");

	let expr = expression("2d6ra1").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::RerollAdd { cond: Condition::Eq(1) }]);
	assert_eq!(expr.to_string(), "2d6ra=1");
	assert!(expression("2d6ra").is_err());
}

#[test]
fn clamps_and_chained_operations() {
	let expr = expression("3d6min2max5").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::Min(2), Operation::Max(5)]);

	let expr = expression("3d6mi2ma5").unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::Min(2), Operation::Max(5)]);

	let expr = expression("4d6ro<3xkh3").unwrap();
	assert_eq!(expr.to_string(), "4d6ro<3xkh3");
}

#[test]
fn modifiers_and_labels() {
	let expr = expression("1d20+5-2 Attack roll").unwrap();
	assert_eq!(expr.modifiers, vec![5, -2]);
	assert_eq!(expr.modifier_total(), 3);
	assert_eq!(expr.label.as_deref(), Some("Attack roll"));
	assert_eq!(expr.to_string(), "1d20+5-2");

	let expr = expression("  2D6+1   Fire Bolt  ").unwrap();
	assert_eq!(expr.dice, Dice::new(2, 6));
	assert_eq!(expr.label.as_deref(), Some("Fire Bolt"));
}

#[test]
fn from_str_parses_and_normalizes() {
	let expr: DiceExpression = "4d6dl1".parse().unwrap();
	assert_eq!(expr.dice.operations, vec![Operation::KeepHigh(3)]);
}

#[test]
fn empty_expressions() {
	assert_eq!(message(""), "Dice expression is empty");
	assert_eq!(message("   "), "Dice expression is empty");
}

#[test]
fn length_limit() {
	let longest = format!("1d20 {}", "a".repeat(MAX_EXPRESSION_LEN - 5));
	assert!(expression(&longest).is_ok());

	let too_long = format!("{longest}a");
	assert_eq!(message(&too_long), "Dice expression too long (max 150 characters)");
}

#[test]
fn dice_bounds() {
	let err = expression("101d6").unwrap_err();
	assert_eq!(err.message, "Too many dice: 101 (max 100)");
	assert_eq!(err.span, Some(0..3));

	assert_eq!(message("300d6"), "Too many dice: 300 (max 100)");
	assert_eq!(message("1d1001"), "Die size too large: 1001 (max 1000)");
	assert_eq!(message("1d0"), "Invalid die size: 0 (min 1)");
	assert_eq!(message("0d6"), "Must roll at least 1 die");
}

#[test]
fn spans_account_for_leading_whitespace() {
	let err = expression("  101d6").unwrap_err();
	assert_eq!(err.span, Some(2..5));

	let err = expression("1d0").unwrap_err();
	assert_eq!(err.span, Some(2..3));
}

#[test]
fn unknown_tokens() {
	let err = expression("1d20q").unwrap_err();
	assert_eq!(err.message, "Unexpected 'q' in dice expression");
	assert_eq!(err.span, Some(4..5));

	assert!(expression("1d20+").is_err());
	assert!(expression("1d20++2").is_err());
	assert!(expression("20").is_err());
	assert!(expression("1d").is_err());
}

#[test]
fn invalid_operations() {
	assert_eq!(message("4d6dl4"), "Cannot drop 4 of 4 dice");
	assert_eq!(message("4d6kh0"), "Must keep at least 1 die");
	assert_eq!(message("1d1rr1"), "rr=1 on d1 would result in infinite rolls");
	assert_eq!(message("1d6rr<=6"), "rr<=6 on d6 would result in infinite rolls");
	assert_eq!(message("1d1x"), "x on d1 would result in infinite rolls");
	assert_eq!(message("4dFkh2"), "Operations are not supported on dF dice");
	assert_eq!(message("3dDx"), "Operations are not supported on dD dice");
}

#[test]
fn clamps_must_be_faces_of_the_die() {
	assert_eq!(message("1d6min10"), "min10 is outside the faces of d6 (1-6)");
	assert_eq!(message("2d6max0"), "max0 is outside the faces of d6 (1-6)");
	assert_eq!(message("3d20mi0"), "min0 is outside the faces of d20 (1-20)");
	assert!(expression("1d6min6").is_ok());
	assert!(expression("1d6ma1").is_ok());
}

#[test]
fn finite_operations_are_allowed() {
	assert!(expression("1d1ro1").is_ok());
	assert!(expression("1d6xo>=1").is_ok());
	assert!(expression("1d6rr<6").is_ok());
}
