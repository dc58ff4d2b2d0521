#![feature(test)]

extern crate test;

use chimera::{
	expr::{DiceExpression, ModifierExpression},
	parse,
};
use chumsky::Parser;
use test::Bencher;

const COMPLEX_EXPR: &str = "8d6ro<3xkh3+2-1 Fireball at the goblins";
const ABSURD_EXPR: &str = "100d42min3max40rr<6x>37kh20kl10xo>29+1000-200+3000-4000+5";

#[bench]
fn parse_basic(b: &mut Bencher) {
	b.iter(|| parse::expression("4d8+4").unwrap());
}

#[bench]
fn parse_complex(b: &mut Bencher) {
	b.iter(|| parse::expression(COMPLEX_EXPR).unwrap());
}

#[bench]
fn parse_absurd(b: &mut Bencher) {
	b.iter(|| parse::expression(ABSURD_EXPR).unwrap())
}

#[bench]
fn parse_modifier(b: &mut Bencher) {
	b.iter(|| parse::modifier_expression("+14 + 2 - 3").unwrap())
}

#[bench]
fn raw_parser_absurd(b: &mut Bencher) {
	let parser = parse::dice_expression();
	b.iter(|| parser.parse(ABSURD_EXPR).into_result().unwrap())
}

#[bench]
fn parser_creation(b: &mut Bencher) {
	b.iter(parse::dice_expression);
}

#[bench]
fn fromstr_basic(b: &mut Bencher) {
	b.iter(|| "4d8+4".parse::<DiceExpression>().unwrap());
}

#[bench]
fn fromstr_modifier(b: &mut Bencher) {
	b.iter(|| "+14+2".parse::<ModifierExpression>().unwrap());
}
