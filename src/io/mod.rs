
use std::fs::File;

use byteorder::{LittleEndian, ReadBytesExt};

/// Streams baseband samples stored as interleaved little-endian f32 pairs,
/// yielding each complex pair along with its sample index.
pub struct FileSourceLEf32Complex {
	f: File,
	idx: usize,
}

pub fn file_source_f32_complex(filename:&str) -> Result<FileSourceLEf32Complex, &'static str> {
	let f = File::open(filename).map_err(|_| "Unable to open source file")?;
	Ok(FileSourceLEf32Complex{ f, idx: 0 })
}

impl FileSourceLEf32Complex {

	/// Discards the next n samples.
	pub fn drop_samples(&mut self, n:usize) {
		for _ in 0..n {
			self.next();
		}
	}

}

impl Iterator for FileSourceLEf32Complex {
	type Item = ((f32, f32), usize);

	fn next(&mut self) -> Option<((f32, f32), usize)> {
		match (self.f.read_f32::<LittleEndian>(), self.f.read_f32::<LittleEndian>()) {
			(Ok(re), Ok(im)) => {
				let i = self.idx;
				self.idx += 1;
				Some(((re, im), i))
			},
			(_, _) => None,
		}
	}
}

#[cfg(test)]
mod tests {

	use std::fs::File;
	use std::io::Write;

	use byteorder::{LittleEndian, WriteBytesExt};

	use super::*;

	#[test]
	fn reads_interleaved_float_pairs_in_order() {
		let path = std::env::temp_dir().join(format!("iq_source_test_{}.dat", std::process::id()));
		{
			let mut f = File::create(&path).unwrap();
			for i in 0..5 {
				f.write_f32::<LittleEndian>(i as f32).unwrap();
				f.write_f32::<LittleEndian>(-(i as f32)).unwrap();
			}
			f.flush().unwrap();
		}

		let mut src = file_source_f32_complex(path.to_str().unwrap()).unwrap();
		src.drop_samples(2);
		let rest:Vec<((f32, f32), usize)> = src.collect();
		assert_eq!(rest, vec![((2.0, -2.0), 2), ((3.0, -3.0), 3), ((4.0, -4.0), 4)]);

		let _ = std::fs::remove_file(&path);
	}

}
