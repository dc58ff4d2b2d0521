//! Face sampling skewed by a signed [`Bias`].
//!
//! Numeric dice are sampled from a reweighted face distribution: the favored half of the faces (the top half for a
//! positive bias, the bottom half for a negative one) gains up to [`FAVORED_BOOST`] of relative mass, the rest loses
//! up to [`UNFAVORED_CUT`], and the weights are renormalized. A neutral bias is a plain uniform roll.
//!
//! Fudge dice are weighted on the distribution of their *sum* instead, after which individual faces adding up to the
//! sampled sum are generated.

use fastrand::Rng;

/// Maximum relative mass gained by favored faces at full bias strength
pub const FAVORED_BOOST: f64 = 0.4;

/// Maximum relative mass lost by unfavored faces at full bias strength
pub const UNFAVORED_CUT: f64 = 0.2;

/// Signed sampling bias in `[-1, 1]`. The sign is the favored direction, the magnitude is the strength.
///
/// # Examples
/// ```
/// use chimera::sampler::Bias;
///
/// assert_eq!(Bias::new(3.0).get(), 1.0);
/// assert_eq!(Bias::new(-0.25).strength(), 0.25);
/// assert!(Bias::new(f64::NAN).is_neutral());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Bias(f64);

impl Bias {
	/// Bias that samples uniformly
	pub const NEUTRAL: Self = Self(0.0);

	/// Creates a bias, clamping the value into `[-1, 1]`. NaN is treated as neutral.
	#[must_use]
	pub fn new(val: f64) -> Self {
		if val.is_nan() {
			Self::NEUTRAL
		} else {
			Self(val.clamp(-1.0, 1.0))
		}
	}

	/// Signed value of the bias.
	#[must_use]
	#[inline]
	pub const fn get(self) -> f64 {
		self.0
	}

	/// Magnitude of the bias.
	#[must_use]
	#[inline]
	pub fn strength(self) -> f64 {
		self.0.abs()
	}

	/// Whether sampling under this bias is uniform.
	#[must_use]
	#[inline]
	pub fn is_neutral(self) -> bool {
		self.0 == 0.0
	}

	/// Multipliers applied to favored and unfavored outcomes, respectively.
	fn multipliers(self) -> (f64, f64) {
		(
			FAVORED_BOOST.mul_add(self.strength(), 1.0),
			UNFAVORED_CUT.mul_add(-self.strength(), 1.0),
		)
	}
}

/// Computes the normalized probability of each face (`1..=sides`, in order) of a numeric die under a bias.
///
/// # Examples
/// ```
/// use chimera::sampler::{face_weights, Bias};
///
/// let uniform = face_weights(4, Bias::NEUTRAL);
/// assert!(uniform.iter().all(|w| (w - 0.25).abs() < 1e-12));
///
/// let lucky = face_weights(4, Bias::new(1.0));
/// assert!(lucky[3] > lucky[0]);
/// assert!((lucky.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn face_weights(sides: u16, bias: Bias) -> Vec<f64> {
	if sides == 0 {
		return Vec::new();
	}

	let favored = sides.div_ceil(2);
	let (boost, cut) = bias.multipliers();
	let base = 1.0 / f64::from(sides);
	let mut weights = (1..=sides)
		.map(|face| {
			let is_favored = if bias.get() >= 0.0 {
				face > sides - favored
			} else {
				face <= favored
			};
			base * if is_favored { boost } else { cut }
		})
		.collect::<Vec<_>>();

	normalize(&mut weights);
	weights
}

/// Samples one face in `1..=sides` of a numeric die under a bias.
///
/// The returned face is always within `1..=sides` for any `sides >= 1`.
#[must_use]
pub fn sample_face(rng: &mut Rng, sides: u16, bias: Bias) -> u16 {
	if sides <= 1 {
		return 1;
	}
	if bias.is_neutral() {
		return rng.u16(1..=sides);
	}

	let weights = face_weights(sides, bias);
	let idx = weighted_index(rng, &weights);
	u16::try_from(idx).map_or(sides, |idx| idx + 1).min(sides)
}

/// Computes the exact probability of each possible sum of `count` fair fudge dice.
///
/// Index `i` of the result holds the probability of the sum `i - count`.
///
/// # Examples
/// ```
/// use chimera::sampler::fudge_sum_distribution;
///
/// let dist = fudge_sum_distribution(2);
/// assert_eq!(dist.len(), 5);
/// assert!((dist[2] - 3.0 / 9.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn fudge_sum_distribution(count: u8) -> Vec<f64> {
	let mut dist = vec![1.0];
	for _ in 0..count {
		let mut next = vec![0.0; dist.len() + 2];
		for (i, p) in dist.iter().enumerate() {
			for offset in 0..3 {
				next[i + offset] += p / 3.0;
			}
		}
		dist = next;
	}
	dist
}

/// Computes the normalized probability of each fudge sum (indexed like [`fudge_sum_distribution()`]) under a bias.
///
/// Sums on the favored side of zero gain mass and sums on the other side lose it; a zero sum is left unweighted.
#[must_use]
pub fn fudge_sum_weights(count: u8, bias: Bias) -> Vec<f64> {
	let mut weights = fudge_sum_distribution(count);
	if bias.is_neutral() {
		return weights;
	}

	let (boost, cut) = bias.multipliers();
	let direction = bias.get().signum();
	let offset = i32::from(count);
	for (i, weight) in weights.iter_mut().enumerate() {
		let sum = i32::try_from(i).unwrap_or(i32::MAX) - offset;
		let side = f64::from(sum.signum()) * direction;
		if side > 0.0 {
			*weight *= boost;
		} else if side < 0.0 {
			*weight *= cut;
		}
	}

	normalize(&mut weights);
	weights
}

/// Samples `count` fudge faces (`-1`, `0`, `1`) under a bias.
///
/// The sum is drawn from [`fudge_sum_weights()`] and the faces are then generated with
/// [`fudge_faces_for_sum()`]. A neutral bias rolls every die independently.
#[must_use]
pub fn sample_fudge(rng: &mut Rng, count: u8, bias: Bias) -> Vec<i8> {
	if bias.is_neutral() {
		return (0..count).map(|_| rng.i8(-1..=1)).collect();
	}

	let weights = fudge_sum_weights(count, bias);
	let target = i32::try_from(weighted_index(rng, &weights)).unwrap_or(0) - i32::from(count);
	fudge_faces_for_sum(rng, count, target)
}

/// Generates `count` fudge faces that add up to exactly `target` (clamped to the reachable range).
///
/// The split between `+`, `0`, and `-` faces is drawn with the same relative likelihood a fair roll would give it,
/// skipping splits where every die shows the same face whenever any other split reaches the target. The faces are
/// shuffled afterwards.
///
/// # Examples
/// ```
/// use chimera::sampler::fudge_faces_for_sum;
///
/// let mut rng = fastrand::Rng::with_seed(7);
/// let faces = fudge_faces_for_sum(&mut rng, 4, 2);
/// assert_eq!(faces.len(), 4);
/// assert_eq!(faces.iter().map(|&f| i32::from(f)).sum::<i32>(), 2);
/// ```
#[must_use]
pub fn fudge_faces_for_sum(rng: &mut Rng, count: u8, target: i32) -> Vec<i8> {
	let n = i32::from(count);
	let target = target.clamp(-n, n);

	// Every split is (plus, minus) with plus - minus == target and plus + minus <= n
	let splits = (target.min(0).abs()..=(n - target) / 2)
		.map(|minus| (target + minus, minus))
		.filter(|&(plus, minus)| plus >= 0 && plus + minus <= n)
		.collect::<Vec<_>>();

	let is_degenerate = |&(plus, minus): &(i32, i32)| n >= 2 && (plus == n || minus == n || plus + minus == 0);
	let preferred = splits.iter().copied().filter(|split| !is_degenerate(split)).collect::<Vec<_>>();
	let candidates = if preferred.is_empty() { splits } else { preferred };

	let weights = candidates
		.iter()
		.map(|&(plus, minus)| binomial(n, plus) * binomial(n - plus, minus))
		.collect::<Vec<_>>();
	let (plus, minus) = candidates
		.get(weighted_index(rng, &weights))
		.copied()
		.unwrap_or((0, 0));

	let mut faces = Vec::with_capacity(usize::from(count));
	for i in 0..n {
		faces.push(if i < plus {
			1
		} else if i < plus + minus {
			-1
		} else {
			0
		});
	}
	rng.shuffle(&mut faces);
	faces
}

/// Picks an index with probability proportional to its weight. Falls back to the last index on rounding drift.
fn weighted_index(rng: &mut Rng, weights: &[f64]) -> usize {
	let total: f64 = weights.iter().sum();
	let mut remaining = rng.f64() * total;
	for (i, weight) in weights.iter().enumerate() {
		if remaining < *weight {
			return i;
		}
		remaining -= weight;
	}
	weights.len().saturating_sub(1)
}

/// Scales weights so they add up to one.
fn normalize(weights: &mut [f64]) {
	let total: f64 = weights.iter().sum();
	if total > 0.0 {
		weights.iter_mut().for_each(|w| *w /= total);
	}
}

/// Binomial coefficient as a float, exact enough for weighting purposes.
pub(crate) fn binomial(n: i32, k: i32) -> f64 {
	if k < 0 || k > n {
		return 0.0;
	}
	let k = k.min(n - k);
	(0..k).fold(1.0, |acc, i| acc * f64::from(n - i) / f64::from(i + 1))
}
