
use num_complex::Complex;

/// Costas-style two-quadrant arctangent on the prompt correlator, insensitive
/// to BPSK navigation bit flips.  Returns the carrier phase error in radians.
pub fn pll_two_quadrant_atan(prompt:Complex<f64>) -> f64 {
	if prompt.re == 0.0 { 0.0 } else { (prompt.im / prompt.re).atan() }
}

/// Normalized non-coherent early-minus-late envelope discriminator.
pub fn dll_nc_e_minus_l_normalized(early:Complex<f64>, late:Complex<f64>) -> f64 {
	let e:f64 = early.norm();
	let l:f64 = late.norm();
	if e + l > 0.0 { (e - l) / (e + l) } else { 0.0 }
}

#[cfg(test)]
mod tests {

	use num_complex::Complex;

	use super::*;

	#[test]
	fn pll_discriminator_recovers_phase() {
		assert_eq!(pll_two_quadrant_atan(Complex{ re: 1.0, im: 0.0 }), 0.0);
		assert!((pll_two_quadrant_atan(Complex{ re: 1.0, im: 1.0 }) - 0.25 * std::f64::consts::PI).abs() < 1.0e-12);
		// A navigation bit flip negates both components and leaves the error unchanged
		let err_pos:f64 = pll_two_quadrant_atan(Complex{ re: 2.0, im: 0.4 });
		let err_neg:f64 = pll_two_quadrant_atan(Complex{ re: -2.0, im: -0.4 });
		assert_eq!(err_pos, err_neg);
		// Guard against a prompt collapsed onto the quadrature axis
		assert_eq!(pll_two_quadrant_atan(Complex{ re: 0.0, im: 5.0 }), 0.0);
	}

	#[test]
	fn dll_discriminator_is_balanced_and_normalized() {
		let e = Complex{ re: 2.0, im: 0.0 };
		let l = Complex{ re: 1.0, im: 0.0 };
		assert!((dll_nc_e_minus_l_normalized(e, l) - 1.0/3.0).abs() < 1.0e-12);
		assert_eq!(dll_nc_e_minus_l_normalized(l, e), -(dll_nc_e_minus_l_normalized(e, l)));
		assert_eq!(dll_nc_e_minus_l_normalized(e, e), 0.0);
		let zero = Complex{ re: 0.0, im: 0.0 };
		assert_eq!(dll_nc_e_minus_l_normalized(zero, zero), 0.0);
	}

}
