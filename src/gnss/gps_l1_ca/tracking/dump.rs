
use std::fs::File;
use std::io::{self, BufWriter, Write};

use byteorder::{LittleEndian, WriteBytesExt};

pub const RECORD_SIZE_BYTES:usize = 76;

/// One packed little-endian trace record per code period.
///
/// NOTE: prompt_i carries im(P) and prompt_q carries re(P), swapped relative
/// to the mathematical convention.  Existing analysis tooling reads the file
/// this way; keep the swap.
#[derive(Debug, Clone, Copy)]
pub struct DumpRecord {
	pub abs_early: f32,
	pub abs_prompt: f32,
	pub abs_late: f32,
	pub prompt_i: f32,
	pub prompt_q: f32,
	pub sample_counter: u64,
	pub acc_carrier_phase_rad: f32,
	pub carrier_doppler_hz: f32,
	pub code_freq_hz: f32,
	pub pll_error_cycles: f32,
	pub pll_nco_hz: f32,
	pub dll_error_chips: f32,
	pub dll_nco_hz: f32,
	pub cn0_db_hz: f32,
	pub carrier_lock_test: f32,
	pub sample_counter_seconds: f64,
}

pub struct TrackingDump {
	f: BufWriter<File>,
}

impl TrackingDump {

	pub fn create(path:&str) -> io::Result<Self> {
		Ok(Self{ f: BufWriter::new(File::create(path)?) })
	}

	pub fn write_record(&mut self, rec:&DumpRecord) -> io::Result<()> {
		self.f.write_f32::<LittleEndian>(rec.abs_early)?;
		self.f.write_f32::<LittleEndian>(rec.abs_prompt)?;
		self.f.write_f32::<LittleEndian>(rec.abs_late)?;
		self.f.write_f32::<LittleEndian>(rec.prompt_i)?;
		self.f.write_f32::<LittleEndian>(rec.prompt_q)?;
		self.f.write_u64::<LittleEndian>(rec.sample_counter)?;
		self.f.write_f32::<LittleEndian>(rec.acc_carrier_phase_rad)?;
		self.f.write_f32::<LittleEndian>(rec.carrier_doppler_hz)?;
		self.f.write_f32::<LittleEndian>(rec.code_freq_hz)?;
		self.f.write_f32::<LittleEndian>(rec.pll_error_cycles)?;
		self.f.write_f32::<LittleEndian>(rec.pll_nco_hz)?;
		self.f.write_f32::<LittleEndian>(rec.dll_error_chips)?;
		self.f.write_f32::<LittleEndian>(rec.dll_nco_hz)?;
		self.f.write_f32::<LittleEndian>(rec.cn0_db_hz)?;
		self.f.write_f32::<LittleEndian>(rec.carrier_lock_test)?;
		self.f.write_f32::<LittleEndian>(0.0)?;     // reserved
		self.f.write_f64::<LittleEndian>(rec.sample_counter_seconds)?;
		Ok(())
	}

	pub fn flush(&mut self) -> io::Result<()> {
		self.f.flush()
	}

}
