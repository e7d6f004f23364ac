
use itertools::izip;
use num_complex::Complex;

/// Wipes the carrier off one block of input samples and accumulates the
/// early, prompt and late correlations in a single fused pass.  All five
/// slices must cover the same window.
pub fn wipeoff_and_epl(input:&[Complex<f64>], carrier:&[Complex<f64>],
	early_code:&[Complex<f64>], prompt_code:&[Complex<f64>], late_code:&[Complex<f64>])
	-> (Complex<f64>, Complex<f64>, Complex<f64>) {

	let mut early:Complex<f64>  = Complex{ re: 0.0, im: 0.0 };
	let mut prompt:Complex<f64> = Complex{ re: 0.0, im: 0.0 };
	let mut late:Complex<f64>   = Complex{ re: 0.0, im: 0.0 };

	for (x, c, e, p, l) in izip!(input, carrier, early_code, prompt_code, late_code) {
		let bb:Complex<f64> = x * c.conj();
		early  += bb * e;
		prompt += bb * p;
		late   += bb * l;
	}

	(early, prompt, late)
}
