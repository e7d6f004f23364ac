
use std::collections::VecDeque;

use num_complex::Complex;

/// Signal-to-noise-variance C/N0 estimate over a buffer of prompt correlator
/// outputs, in dB-Hz.  coh_integration_time_s is the coherent integration
/// period of a single prompt sample.  Clamped to be non-negative.
pub fn cn0_svn_estimator(prompt_buffer:&VecDeque<Complex<f64>>, coh_integration_time_s:f64) -> f64 {
	let n:f64 = prompt_buffer.len() as f64;
	let nbp:f64 = prompt_buffer.iter().sum::<Complex<f64>>().norm_sqr();
	let nbw:f64 = prompt_buffer.iter().map(|c| c.norm_sqr()).sum();
	if nbw <= 0.0 { return 0.0; }

	let wbp:f64 = nbp / nbw;
	let snr:f64 = if n - wbp > 0.0 { (wbp * n - 1.0) / (n - wbp) } else { f64::INFINITY };
	if snr <= 0.0 { return 0.0; }

	let cn0:f64 = 10.0 * (snr / (n * coh_integration_time_s)).log10();
	if cn0 < 0.0 { 0.0 } else { cn0 }
}

/// Carrier lock test over the same prompt buffer.  Fully coherent BPSK
/// drives the statistic to the buffer length; noise drives it toward zero.
pub fn carrier_lock_detector(prompt_buffer:&VecDeque<Complex<f64>>) -> f64 {
	let tmp_sum_i:f64 = prompt_buffer.iter().map(|c| c.re).sum();
	let tmp_sum_q:f64 = prompt_buffer.iter().map(|c| c.im).sum();
	let nbd:f64 = tmp_sum_i * tmp_sum_i - tmp_sum_q * tmp_sum_q;
	let nbp:f64 = prompt_buffer.iter().map(|c| c.re * c.re + c.im * c.im).sum();
	if nbp > 0.0 { nbd / nbp } else { 0.0 }
}

#[cfg(test)]
mod tests {

	use std::collections::VecDeque;

	use num_complex::Complex;

	use super::*;

	fn buffer_from(vals:&[(f64, f64)]) -> VecDeque<Complex<f64>> {
		vals.iter().map(|(re, im)| Complex{ re: *re, im: *im }).collect()
	}

	// Ten prompts with a deterministic wobble around a strong in-phase signal
	fn noisy_prompts(amplitude:f64) -> VecDeque<Complex<f64>> {
		(0..10).map(|i| {
			let wobble:f64 = ((i * 7 + 3) % 11) as f64 / 11.0 - 0.5;
			Complex{ re: amplitude * (1.0 + 0.05 * wobble), im: amplitude * 0.1 * wobble }
		}).collect()
	}

	#[test]
	fn cn0_is_invariant_under_amplitude_scaling() {
		let a:f64 = cn0_svn_estimator(&noisy_prompts(1.0), 1.0e-3);
		let b:f64 = cn0_svn_estimator(&noisy_prompts(7.3), 1.0e-3);
		let c:f64 = cn0_svn_estimator(&noisy_prompts(0.002), 1.0e-3);
		assert!(a > 0.0);
		assert!((a - b).abs() < 0.5);
		assert!((a - c).abs() < 0.5);
	}

	#[test]
	fn cn0_of_pure_noise_stays_low() {
		let noise = buffer_from(&[(0.4, -0.3), (-0.2, 0.6), (0.1, 0.1), (-0.5, -0.4), (0.3, -0.6),
								  (-0.4, 0.2), (0.6, 0.5), (-0.1, -0.2), (0.2, 0.4), (-0.3, 0.3)]);
		let strong:f64 = cn0_svn_estimator(&noisy_prompts(1.0), 1.0e-3);
		let weak:f64 = cn0_svn_estimator(&noise, 1.0e-3);
		assert!(weak < strong);
		assert!(weak < 30.0);
	}

	#[test]
	fn cn0_of_an_empty_window_is_zero() {
		assert_eq!(cn0_svn_estimator(&VecDeque::new(), 1.0e-3), 0.0);
	}

	#[test]
	fn lock_test_peaks_for_coherent_bpsk() {
		let coherent = buffer_from(&[(3.0, 0.0); 10]);
		assert!((carrier_lock_detector(&coherent) - 10.0).abs() < 1.0e-12);

		// Energy on the quadrature arm drives the statistic negative
		let quadrature = buffer_from(&[(0.0, 3.0); 10]);
		assert!((carrier_lock_detector(&quadrature) + 10.0).abs() < 1.0e-12);

		assert_eq!(carrier_lock_detector(&VecDeque::new()), 0.0);
	}

}
