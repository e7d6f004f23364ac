
/// Common interface for the scalar loop filters closing the code and carrier
/// tracking loops.
pub trait LoopFilter {

	/// Restarts the filter with the NCO delay element seeded at x0.  The
	/// caller re-applies its own operating point, so seeding with zero keeps
	/// the filter output a pure correction.
	fn initialize(&mut self, x0:f64);

	/// Advances the filter by one integration period and returns the NCO
	/// command in Hz.
	fn step(&mut self, err:f64) -> f64;

}

// Loop natural frequency from the one-sided noise bandwidth
fn natural_freq(bw_hz:f64, zeta:f64) -> f64 {
	(bw_hz * 8.0 * zeta) / (4.0 * zeta * zeta + 1.0)
}

/// Second-order carrier (PLL) loop filter.  Input is the phase error in
/// cycles, output the carrier NCO correction in Hz.
pub struct CarrierLoopFilter { pub tau1:f64, pub tau2:f64, pub pdi:f64,
							   last_err:f64, last_nco:f64 }

impl CarrierLoopFilter {

	pub fn new(bw_hz:f64) -> Self {
		let zeta:f64 = 0.7;
		let wn:f64 = natural_freq(bw_hz, zeta);
		Self { tau1: 0.25 / (wn * wn), tau2: (2.0 * zeta) / wn, pdi: 1.0e-3,
			   last_err: 0.0, last_nco: 0.0 }
	}

}

impl LoopFilter for CarrierLoopFilter {

	fn initialize(&mut self, x0:f64) {
		self.last_err = 0.0;
		self.last_nco = x0;
	}

	fn step(&mut self, err:f64) -> f64 {
		let nco:f64 = self.last_nco
			+ (self.tau2 / self.tau1) * (err - self.last_err)
			+ (err + self.last_err) * (self.pdi / (2.0 * self.tau1));
		self.last_nco = nco;
		self.last_err = err;
		nco
	}

}

/// First-order code (DLL) loop filter.  Input is the code error in chips,
/// output the code NCO correction in Hz.
pub struct CodeLoopFilter { pub tau1:f64, pub tau2:f64, pub pdi:f64,
							last_err:f64, last_nco:f64 }

impl CodeLoopFilter {

	pub fn new(bw_hz:f64) -> Self {
		let zeta:f64 = 0.7;
		let wn:f64 = natural_freq(bw_hz, zeta);
		Self { tau1: 1.0 / (wn * wn), tau2: (2.0 * zeta) / wn, pdi: 1.0e-3,
			   last_err: 0.0, last_nco: 0.0 }
	}

}

impl LoopFilter for CodeLoopFilter {

	fn initialize(&mut self, x0:f64) {
		self.last_err = 0.0;
		self.last_nco = x0;
	}

	fn step(&mut self, err:f64) -> f64 {
		let nco:f64 = self.last_nco
			+ (self.tau2 / self.tau1) * (err - self.last_err)
			+ (err + self.last_err) * (self.pdi / (2.0 * self.tau1));
		self.last_nco = nco;
		self.last_err = err;
		nco
	}

}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn zero_error_is_a_fixed_point() {
		let mut pll = CarrierLoopFilter::new(50.0);
		let mut dll = CodeLoopFilter::new(2.0);
		for _ in 0..100 {
			assert_eq!(pll.step(0.0), 0.0);
			assert_eq!(dll.step(0.0), 0.0);
		}
	}

	#[test]
	fn constant_error_ramps_the_nco() {
		let mut pll = CarrierLoopFilter::new(50.0);
		let mut last:f64 = pll.step(0.1);
		for _ in 0..50 {
			let next:f64 = pll.step(0.1);
			assert!(next > last);
			last = next;
		}
	}

	#[test]
	fn initialize_seeds_the_delay_line() {
		let mut dll = CodeLoopFilter::new(2.0);
		for _ in 0..10 { dll.step(0.25); }

		dll.initialize(0.0);
		assert_eq!(dll.step(0.0), 0.0);

		dll.initialize(5.0);
		assert_eq!(dll.step(0.0), 5.0);
	}

}
