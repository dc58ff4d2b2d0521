//! Ranking of rolled totals within their theoretical distributions.
//!
//! Every function here returns a percentile in `[0, 100]`. The rank of a total `t` is `P(X < t) + P(X = t) / 2`
//! wherever the distribution is computed exactly, so the middle of a symmetric distribution ranks at 50.
//!
//! | Dice                          | Method                                                       |
//! |-------------------------------|--------------------------------------------------------------|
//! | one numeric die               | linear position of the face, `(face - 1) / (sides - 1)`      |
//! | several numeric dice          | normal approximation of the sum of uniforms                  |
//! | numeric dice keeping one die  | exact distribution of that order statistic                   |
//! | numeric dice keeping several  | normal approximation from the kept order statistics' moments |
//! | fudge dice                    | exact sum distribution                                       |
//! | Fallout dice                  | exact damage-sum distribution                                |
//!
//! Keeping several dice ignores the covariance between the kept order statistics, so it is a known-imprecise
//! approximation. Rerolls, explosions, and clamps are ranked as if the dice were plain.

use crate::{
	dice::{Dice, Faces, Operation, FALLOUT_FACES},
	expr::DiceExpression,
	sampler::{self, fudge_sum_distribution},
};

/// Rank given to totals of dice with only one possible outcome
pub const DETERMINISTIC: f64 = 50.0;

/// Ranks a final total (including flat modifiers) of an expression.
///
/// # Examples
/// ```
/// use chimera::{expr::DiceExpression, percentile::percentile, Dice};
///
/// let expr = DiceExpression::new(Dice::new(1, 20)).with_modifier(5);
/// assert_eq!(percentile(6, &expr), 0.0);
/// assert_eq!(percentile(25, &expr), 100.0);
/// ```
#[must_use]
pub fn percentile(total: i32, expr: &DiceExpression) -> f64 {
	dice_percentile(total.saturating_sub(expr.modifier_total()), &expr.dice)
}

/// Ranks the total of a set of dice alone (without flat modifiers).
#[must_use]
pub fn dice_percentile(total: i32, dice: &Dice) -> f64 {
	let rank = match dice.faces {
		Faces::Numeric(sides) => numeric_percentile(total, dice.count, sides, &dice.operations),
		Faces::Fudge => fudge_percentile(total, dice.count),
		Faces::Fallout => fallout_percentile(total, dice.count),
	};
	rank.clamp(0.0, 100.0)
}

/// Ranks a face of a single numeric die.
#[must_use]
pub fn single_die_percentile(face: i32, sides: u16) -> f64 {
	if sides <= 1 {
		return DETERMINISTIC;
	}
	(f64::from(face - 1) / f64::from(sides - 1) * 100.0).clamp(0.0, 100.0)
}

/// Ranks the plain sum of `count` numeric dice with a normal approximation.
#[must_use]
pub fn sum_percentile(total: i32, count: u8, sides: u16) -> f64 {
	if count == 1 {
		return single_die_percentile(total, sides);
	}

	let n = f64::from(count);
	let s = f64::from(sides);
	let mean = n * (s + 1.0) / 2.0;
	let variance = n * s.mul_add(s, -1.0) / 12.0;
	normal_percentile(f64::from(total), mean, variance)
}

/// Ranks the total of an exactly-known discrete distribution (`dist[i]` is the probability of `i + min`).
#[must_use]
pub fn discrete_percentile(total: i32, min: i32, dist: &[f64]) -> f64 {
	if dist.len() <= 1 {
		return DETERMINISTIC;
	}

	let Ok(idx) = usize::try_from(i64::from(total) - i64::from(min)) else {
		return 0.0;
	};
	if idx >= dist.len() {
		return 100.0;
	}

	let below: f64 = dist.iter().take(idx).sum();
	let at = dist.get(idx).copied().unwrap_or(0.0);
	(below + at / 2.0) * 100.0
}

/// Ranks a fudge dice sum using its exact distribution.
#[must_use]
pub fn fudge_percentile(total: i32, count: u8) -> f64 {
	discrete_percentile(total, -i32::from(count), &fudge_sum_distribution(count))
}

/// Ranks a Fallout damage sum using its exact distribution.
#[must_use]
pub fn fallout_percentile(total: i32, count: u8) -> f64 {
	// Probability of each damage value (0, 1, 2) on one die
	let mut face = [0.0; 3];
	for f in FALLOUT_FACES {
		if let Some(p) = face.get_mut(usize::from(f.damage)) {
			*p += 1.0 / 6.0;
		}
	}

	let mut dist = vec![1.0];
	for _ in 0..count {
		let mut next = vec![0.0; dist.len() + face.len() - 1];
		for (i, p) in dist.iter().enumerate() {
			for (d, q) in face.iter().enumerate() {
				next[i + d] += p * q;
			}
		}
		dist = next;
	}

	discrete_percentile(total, 0, &dist)
}

/// Ranks the total of numeric dice according to their (canonical) operations.
fn numeric_percentile(total: i32, count: u8, sides: u16, operations: &[Operation]) -> f64 {
	if sides <= 1 {
		return DETERMINISTIC;
	}

	match operations {
		[Operation::KeepHigh(keep)] if *keep < count => keep_percentile(total, count, sides, *keep, true),
		[Operation::KeepLow(keep)] if *keep < count => keep_percentile(total, count, sides, *keep, false),
		_ => sum_percentile(total, count, sides),
	}
}

/// Ranks the total of the `keep` highest (or lowest) of `count` dice.
fn keep_percentile(total: i32, count: u8, sides: u16, keep: u8, high: bool) -> f64 {
	let stats = OrderStatistics::new(count, sides);

	// Order statistics are numbered from the lowest (1) to the highest (count)
	let kept = if high {
		usize::from(count - keep + 1)..=usize::from(count)
	} else {
		1..=usize::from(keep)
	};

	if keep == 1 {
		let j = *kept.start();
		let dist = (1..=sides).map(|x| stats.pmf(j, x)).collect::<Vec<_>>();
		return discrete_percentile(total, 1, &dist);
	}

	let (mean, variance) = kept.fold((0.0, 0.0), |(mean, variance), j| {
		let (m, v) = stats.moments(j);
		(mean + m, variance + v)
	});
	normal_percentile(f64::from(total), mean, variance)
}

/// Distribution of every order statistic of `count` fair dice with `sides` faces.
///
/// `cdf[x][j - 1]` holds `P(X_(j) <= x)` for `x` in `0..=sides`.
struct OrderStatistics {
	/// Cumulative probabilities, indexed by face then by order statistic
	cdf: Vec<Vec<f64>>,
}

impl OrderStatistics {
	/// Computes the cumulative distributions of all order statistics at once.
	///
	/// `P(X_(j) <= x)` is the probability that at least `j` of the dice show `x` or less, which is a binomial tail.
	fn new(count: u8, sides: u16) -> Self {
		let n = i32::from(count);
		let cdf = (0..=sides)
			.map(|x| {
				let f = f64::from(x) / f64::from(sides);
				let pmf = (0..=n)
					.map(|i| sampler::binomial(n, i) * f.powi(i) * (1.0 - f).powi(n - i))
					.collect::<Vec<_>>();

				// Tail sums from the top down
				let mut tails = vec![0.0; pmf.len()];
				let mut acc = 0.0;
				for (i, p) in pmf.iter().enumerate().rev() {
					acc += p;
					tails[i] = acc;
				}
				tails.into_iter().skip(1).collect::<Vec<_>>()
			})
			.collect::<Vec<_>>();

		Self { cdf }
	}

	/// `P(X_(j) <= x)`
	fn cdf(&self, j: usize, x: u16) -> f64 {
		self.cdf
			.get(usize::from(x))
			.and_then(|row| row.get(j.saturating_sub(1)))
			.copied()
			.unwrap_or(1.0)
	}

	/// `P(X_(j) = x)`
	fn pmf(&self, j: usize, x: u16) -> f64 {
		self.cdf(j, x) - self.cdf(j, x.saturating_sub(1))
	}

	/// Mean and variance of `X_(j)`.
	fn moments(&self, j: usize) -> (f64, f64) {
		let sides = u16::try_from(self.cdf.len().saturating_sub(1)).unwrap_or(u16::MAX);
		let (mean, square) = (1..=sides).fold((0.0, 0.0), |(mean, square), x| {
			let p = self.pmf(j, x);
			let x = f64::from(x);
			(x.mul_add(p, mean), (x * x).mul_add(p, square))
		});
		(mean, mean.mul_add(-mean, square).max(0.0))
	}
}

/// Percentile of `x` under a normal distribution.
fn normal_percentile(x: f64, mean: f64, variance: f64) -> f64 {
	if variance <= 0.0 {
		return DETERMINISTIC;
	}
	let z = (x - mean) / (variance.sqrt() * std::f64::consts::SQRT_2);
	(0.5 * (1.0 + erf(z)) * 100.0).clamp(0.0, 100.0)
}

/// Error function (Abramowitz and Stegun 7.1.26, maximum error 1.5e-7).
fn erf(x: f64) -> f64 {
	const A1: f64 = 0.254_829_592;
	const A2: f64 = -0.284_496_736;
	const A3: f64 = 1.421_413_741;
	const A4: f64 = -1.453_152_027;
	const A5: f64 = 1.061_405_429;
	const P: f64 = 0.327_591_1;

	let sign = x.signum();
	let x = x.abs();
	let t = 1.0 / P.mul_add(x, 1.0);
	let poly = t * A5.mul_add(t, A4).mul_add(t, A3).mul_add(t, A2).mul_add(t, A1);
	sign * poly.mul_add(-(-x * x).exp(), 1.0)
}
