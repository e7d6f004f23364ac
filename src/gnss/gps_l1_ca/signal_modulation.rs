
use num_complex::Complex;

use crate::ChannelErr;

pub const CA_CODE_LENGTH:usize = 1023;

// G2 phase-selector stages (one-based) for PRNs 1 through 32
const G2_PHASE_TAPS:[(usize, usize); 32] = [
	( 2,  6), ( 3,  7), ( 4,  8), ( 5,  9), ( 1,  9), ( 2, 10), ( 1,  8), ( 2,  9),
	( 3, 10), ( 2,  3), ( 3,  4), ( 5,  6), ( 6,  7), ( 7,  8), ( 8,  9), ( 9, 10),
	( 1,  4), ( 2,  5), ( 3,  6), ( 4,  7), ( 5,  8), ( 6,  9), ( 1,  3), ( 4,  6),
	( 5,  7), ( 6,  8), ( 7,  9), ( 8, 10), ( 1,  6), ( 2,  7), ( 3,  8), ( 4,  9)];

/// Generates the 1023-chip C/A sequence for one satellite as +/-1 values,
/// code bit 1 mapping to -1.  Stateless and idempotent.
pub fn ca_sequence(prn:usize) -> Result<[i8; CA_CODE_LENGTH], ChannelErr> {
	if prn < 1 || prn > 32 {
		return Err(ChannelErr::InvalidConfiguration("PRN must be between 1 and 32 for GPS L1 CA"));
	}

	let (tap_a, tap_b) = G2_PHASE_TAPS[prn - 1];

	let mut g1:[bool; 10] = [true; 10];
	let mut g2:[bool; 10] = [true; 10];
	let mut chips:[i8; CA_CODE_LENGTH] = [0i8; CA_CODE_LENGTH];

	for chip in chips.iter_mut() {
		let g2_out:bool = g2[tap_a - 1] ^ g2[tap_b - 1];
		*chip = if g1[9] ^ g2_out { -1 } else { 1 };

		let g1_fb:bool = g1[2] ^ g1[9];
		let g2_fb:bool = g2[1] ^ g2[2] ^ g2[5] ^ g2[7] ^ g2[8] ^ g2[9];
		for i in (1..10).rev() {
			g1[i] = g1[i - 1];
			g2[i] = g2[i - 1];
		}
		g1[0] = g1_fb;
		g2[0] = g2_fb;
	}

	Ok(chips)
}

/// Writes the complex chip sequence into cells 1..=1023 of a 1025-cell
/// replica table.  Cell 0 repeats chip 1023 and cell 1024 repeats chip 1, so
/// the resampling loop never needs to branch on a wrapped index.
pub fn fill_replica_table(prn:usize, table:&mut [Complex<f64>]) -> Result<(), ChannelErr> {
	assert_eq!(table.len(), CA_CODE_LENGTH + 2);

	let chips = ca_sequence(prn)?;
	for (i, chip) in chips.iter().enumerate() {
		table[i + 1] = Complex{ re: *chip as f64, im: 0.0 };
	}
	table[0] = table[CA_CODE_LENGTH];
	table[CA_CODE_LENGTH + 1] = table[1];

	Ok(())
}

/// Allocating convenience wrapper around fill_replica_table.
pub fn padded_replica_table(prn:usize) -> Result<Vec<Complex<f64>>, ChannelErr> {
	let mut table:Vec<Complex<f64>> = vec![Complex{ re: 0.0, im: 0.0 }; CA_CODE_LENGTH + 2];
	fill_replica_table(prn, &mut table)?;
	Ok(table)
}

#[cfg(test)]
mod tests {

	use super::*;

	fn first_ten_chips_octal(prn:usize) -> u16 {
		let chips = ca_sequence(prn).unwrap();
		chips[..10].iter().fold(0u16, |acc, c| (acc << 1) | if *c == -1 { 1 } else { 0 })
	}

	#[test]
	fn known_leading_chips() {
		// Reference values from the IS-GPS-200 code phase assignment table
		assert_eq!(first_ten_chips_octal(1), 0o1440);
		assert_eq!(first_ten_chips_octal(2), 0o1620);
		assert_eq!(first_ten_chips_octal(3), 0o1710);
		assert_eq!(first_ten_chips_octal(4), 0o1744);
		assert_eq!(first_ten_chips_octal(5), 0o1133);
	}

	#[test]
	fn chip_balance() {
		// Every C/A code carries 512 ones and 511 zeros
		for prn in 1..=32 {
			let sum:i32 = ca_sequence(prn).unwrap().iter().map(|c| *c as i32).sum();
			assert_eq!(sum, -1);
		}
	}

	#[test]
	fn codes_differ_between_satellites() {
		let a = ca_sequence(1).unwrap();
		let b = ca_sequence(2).unwrap();
		assert!(a.iter().zip(b.iter()).any(|(x, y)| x != y));
		assert_eq!(a, ca_sequence(1).unwrap());
	}

	#[test]
	fn replica_table_pads_mirror_the_code_ends() {
		let table = padded_replica_table(7).unwrap();
		let chips = ca_sequence(7).unwrap();
		assert_eq!(table.len(), CA_CODE_LENGTH + 2);
		assert_eq!(table[0].re, chips[CA_CODE_LENGTH - 1] as f64);
		assert_eq!(table[CA_CODE_LENGTH + 1].re, chips[0] as f64);
		for (i, chip) in chips.iter().enumerate() {
			assert_eq!(table[i + 1].re, *chip as f64);
			assert_eq!(table[i + 1].im, 0.0);
		}
	}

	#[test]
	fn rejects_out_of_range_prn() {
		assert!(ca_sequence(0).is_err());
		assert!(ca_sequence(33).is_err());
		assert!(padded_replica_table(33).is_err());
	}

}
