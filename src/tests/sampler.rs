use fastrand::Rng;

use crate::sampler::{
	face_weights, fudge_faces_for_sum, fudge_sum_distribution, fudge_sum_weights, sample_face, sample_fudge, Bias,
};

const EPSILON: f64 = 1e-9;

#[test]
fn bias_is_clamped() {
	assert_eq!(Bias::new(1.5).get(), 1.0);
	assert_eq!(Bias::new(-7.0).get(), -1.0);
	assert_eq!(Bias::new(0.3).get(), 0.3);
	assert!(Bias::new(f64::NAN).is_neutral());
	assert!(Bias::default().is_neutral());
}

#[test]
fn neutral_weights_are_uniform() {
	let weights = face_weights(10, Bias::NEUTRAL);
	assert_eq!(weights.len(), 10);
	assert!(weights.iter().all(|w| (w - 0.1).abs() < EPSILON));
}

#[test]
fn full_positive_bias_favors_the_top_half() {
	let weights = face_weights(6, Bias::new(1.0));
	let total: f64 = weights.iter().sum();
	assert!((total - 1.0).abs() < EPSILON);

	// 1.4 against 0.8 before renormalizing
	for low in &weights[..3] {
		for high in &weights[3..] {
			assert!((high / low - 1.75).abs() < EPSILON);
		}
	}
}

#[test]
fn full_negative_bias_favors_the_bottom_half() {
	let weights = face_weights(6, Bias::new(-1.0));
	assert!(weights[0] > weights[5]);
	assert!((weights[0] - weights[2]).abs() < EPSILON);
	assert!((weights[3] - weights[5]).abs() < EPSILON);
}

#[test]
fn odd_dice_favor_the_larger_half() {
	let weights = face_weights(5, Bias::new(0.5));
	assert!((weights[1] - weights[0]).abs() < EPSILON);
	assert!(weights[2] > weights[1]);
	assert!((weights[4] - weights[2]).abs() < EPSILON);

	let weights = face_weights(5, Bias::new(-0.5));
	assert!((weights[2] - weights[0]).abs() < EPSILON);
	assert!(weights[3] < weights[2]);
}

#[test]
fn weaker_bias_skews_less() {
	let strong = face_weights(20, Bias::new(1.0));
	let weak = face_weights(20, Bias::new(0.25));
	assert!(strong[19] > weak[19]);
	assert!(strong[0] < weak[0]);
}

#[test]
fn one_sided_die_always_rolls_one() {
	let mut rng = Rng::with_seed(1);
	for bias in [-1.0, 0.0, 1.0] {
		assert_eq!(sample_face(&mut rng, 1, Bias::new(bias)), 1);
	}
}

#[test]
fn biased_sampling_shifts_the_mean() {
	let mut rng = Rng::with_seed(0xc0ffee);
	let mean = |rng: &mut Rng, bias: f64| {
		let sum: u32 = (0..20_000).map(|_| u32::from(sample_face(rng, 20, Bias::new(bias)))).sum();
		f64::from(sum) / 20_000.0
	};

	// Expected means: 10.5 unbiased, about 11.86 with full positive bias, about 9.14 with full negative bias
	let neutral = mean(&mut rng, 0.0);
	let lucky = mean(&mut rng, 1.0);
	let unlucky = mean(&mut rng, -1.0);
	assert!((neutral - 10.5).abs() < 0.3, "neutral mean {neutral}");
	assert!(lucky > 11.4, "lucky mean {lucky}");
	assert!(unlucky < 9.6, "unlucky mean {unlucky}");
}

#[test]
fn fudge_distribution_is_symmetric() {
	let dist = fudge_sum_distribution(4);
	assert_eq!(dist.len(), 9);
	assert!((dist.iter().sum::<f64>() - 1.0).abs() < EPSILON);
	for i in 0..dist.len() {
		assert!((dist[i] - dist[dist.len() - 1 - i]).abs() < EPSILON);
	}
	assert!((dist[4] - 19.0 / 81.0).abs() < EPSILON);
}

#[test]
fn fudge_weights_shift_mass_toward_the_favored_side() {
	let weights = fudge_sum_weights(4, Bias::new(1.0));
	let below: f64 = weights[..4].iter().sum();
	let above: f64 = weights[5..].iter().sum();
	assert!(above > below);
	assert!((weights.iter().sum::<f64>() - 1.0).abs() < EPSILON);
}

#[test]
fn fudge_faces_hit_their_target() {
	let mut rng = Rng::with_seed(3);
	for count in 1..=8u8 {
		let n = i32::from(count);
		for target in -n..=n {
			let faces = fudge_faces_for_sum(&mut rng, count, target);
			assert_eq!(faces.len(), usize::from(count));
			assert_eq!(faces.iter().map(|&f| i32::from(f)).sum::<i32>(), target);
		}
	}
}

#[test]
fn fudge_faces_clamp_unreachable_targets() {
	let mut rng = Rng::with_seed(3);
	assert_eq!(fudge_faces_for_sum(&mut rng, 3, 10), vec![1, 1, 1]);
	assert_eq!(fudge_faces_for_sum(&mut rng, 3, -10), vec![-1, -1, -1]);
}

#[test]
fn fudge_faces_avoid_all_blanks() {
	let mut rng = Rng::with_seed(11);
	for _ in 0..500 {
		let faces = fudge_faces_for_sum(&mut rng, 4, 0);
		assert!(faces.iter().any(|&f| f != 0), "{faces:?}");
	}
}

#[test]
fn single_fudge_die_can_be_blank() {
	let mut rng = Rng::with_seed(11);
	assert_eq!(fudge_faces_for_sum(&mut rng, 1, 0), vec![0]);
}

#[test]
fn biased_fudge_sums_lean_in_the_bias_direction() {
	let mut rng = Rng::with_seed(77);
	let total = |rng: &mut Rng, bias: f64| -> i32 {
		(0..5_000)
			.map(|_| sample_fudge(rng, 4, Bias::new(bias)).iter().map(|&f| i32::from(f)).sum::<i32>())
			.sum()
	};

	assert!(total(&mut rng, 1.0) > 0);
	assert!(total(&mut rng, -1.0) < 0);
}
