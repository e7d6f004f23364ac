
use std::collections::VecDeque;
use std::f64::consts;

use num_complex::Complex;
use serde::{Serialize, Deserialize};
use tokio::sync::mpsc;

use crate::ChannelErr;
use crate::block::{BlockResult, StreamFunctionality};
use crate::filters::{CarrierLoopFilter, CodeLoopFilter, LoopFilter};
use crate::gnss::common::{AcqHandover, ChannelMessage, Synchro};
use crate::gnss::common::{correlator, discriminators, lock_detectors};
use crate::gnss::gps_l1_ca::{self, signal_modulation};

pub mod dump;


const TWO_PI:f64 = 2.0 * consts::PI;

/// Static per-channel configuration.  Field names double as the enumerated
/// configuration keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
	/// Intermediate frequency of the input stream [Hz]
	pub if_freq: f64,
	/// Sample rate [samples/sec]
	pub fs_in: f64,
	/// Nominal samples per code period
	pub vector_length: usize,
	/// PLL loop bandwidth [Hz]
	pub pll_bw_hz: f64,
	/// DLL loop bandwidth [Hz]
	pub dll_bw_hz: f64,
	/// Early-late correlator spacing [chips]
	pub early_late_space_chips: f64,
	/// Enable the binary trace log
	pub dump: bool,
	/// Trace log base path; "<channel>.dat" is appended
	pub dump_filename: String,
	/// Accumulate the post-wrap carrier phase residual instead of the full
	/// per-window phase advance, for byte compatibility with old trace logs
	#[serde(default)]
	pub carrier_phase_compat: bool,
	/// Run the lock failure test exactly as transcribed from legacy
	/// captures, comparing the lock statistic against the C/N0 floor
	#[serde(default)]
	pub lock_test_compat: bool,
}

/// Single-channel GPS L1 C/A code and carrier tracker.
///
/// One instance holds all DLL/PLL state for one satellite and is driven by
/// an external scheduler: each work call consumes one variable-length code
/// period from the offered window and emits one synchro record.  The channel
/// owns its replica scratch and shares nothing with other channels beyond
/// the supervisor message queue.
pub struct TrackingChannel {
	conf: TrackingConfig,
	channel_id: usize,
	system: char,
	prn: usize,

	// Acquisition handover
	acq_code_phase_samples: f64,
	acq_carrier_doppler_hz: f64,
	acq_sample_stamp: u64,

	// NCO and phase bookkeeping
	code_freq_hz: f64,
	carrier_doppler_hz: f64,
	rem_code_phase_samples: f64,
	next_rem_code_phase_samples: f64,
	rem_carr_phase_rad: f64,
	acc_carrier_phase_rad: f64,
	code_phase_step_chips: f64,
	code_phase_samples: f64,
	current_prn_length_samples: usize,
	next_prn_length_samples: usize,

	// Sample synchronization
	sample_counter: u64,
	sample_counter_seconds: f64,

	carrier_loop_filter: CarrierLoopFilter,
	code_loop_filter: CodeLoopFilter,

	// Lock monitoring over the prompt history
	prompt_buffer: VecDeque<Complex<f64>>,
	cn0_snv_db_hz: f64,
	carrier_lock_test: f64,
	carrier_lock_fail_counter: usize,

	enabled: bool,
	pull_in: bool,

	// Owned replica scratch, sized for two nominal code periods
	ca_code: Vec<Complex<f64>>,
	early_code: Vec<Complex<f64>>,
	prompt_code: Vec<Complex<f64>>,
	late_code: Vec<Complex<f64>>,
	carr_wipeoff: Vec<Complex<f64>>,

	queue: mpsc::Sender<ChannelMessage>,
	dump: Option<dump::TrackingDump>,
}

impl TrackingChannel {

	pub fn new(conf:TrackingConfig, channel_id:usize, queue:mpsc::Sender<ChannelMessage>) -> Result<Self, ChannelErr> {

		if !(conf.fs_in > 0.0) || !conf.fs_in.is_finite() {
			return Err(ChannelErr::InvalidConfiguration("sample rate must be positive and finite"));
		}
		if !conf.if_freq.is_finite() {
			return Err(ChannelErr::InvalidConfiguration("intermediate frequency must be finite"));
		}
		if conf.vector_length == 0 {
			return Err(ChannelErr::InvalidConfiguration("nominal code period must be at least one sample"));
		}
		if !(conf.pll_bw_hz > 0.0) || !(conf.dll_bw_hz > 0.0) {
			return Err(ChannelErr::InvalidConfiguration("loop bandwidths must be positive"));
		}
		if !(conf.early_late_space_chips > 0.0) {
			return Err(ChannelErr::InvalidConfiguration("early-late spacing must be positive"));
		}

		let dump = if conf.dump {
			let path:String = format!("{}{}.dat", conf.dump_filename, channel_id);
			match dump::TrackingDump::create(&path) {
				Ok(d) => {
					eprintln!("Channel {}: tracking dump enabled, log file {}", channel_id, path);
					Some(d)
				},
				Err(e) => {
					eprintln!("Channel {}: unable to open tracking dump file {}, continuing without: {}", channel_id, path, e);
					None
				},
			}
		} else { None };

		let zero:Complex<f64> = Complex{ re: 0.0, im: 0.0 };
		let scratch_len:usize = 2 * conf.vector_length;

		Ok(Self {
			channel_id,
			system: 'G',
			prn: 0,
			acq_code_phase_samples: 0.0,
			acq_carrier_doppler_hz: 0.0,
			acq_sample_stamp: 0,
			code_freq_hz: gps_l1_ca::CODE_RATE_CHIPS_PER_SEC,
			carrier_doppler_hz: 0.0,
			rem_code_phase_samples: 0.0,
			next_rem_code_phase_samples: 0.0,
			rem_carr_phase_rad: 0.0,
			acc_carrier_phase_rad: 0.0,
			code_phase_step_chips: gps_l1_ca::CODE_RATE_CHIPS_PER_SEC / conf.fs_in,
			code_phase_samples: 0.0,
			current_prn_length_samples: conf.vector_length,
			next_prn_length_samples: conf.vector_length,
			sample_counter: 0,
			sample_counter_seconds: 0.0,
			carrier_loop_filter: CarrierLoopFilter::new(conf.pll_bw_hz),
			code_loop_filter: CodeLoopFilter::new(conf.dll_bw_hz),
			prompt_buffer: VecDeque::with_capacity(gps_l1_ca::CN0_ESTIMATION_SAMPLES),
			cn0_snv_db_hz: 0.0,
			carrier_lock_test: 1.0,
			carrier_lock_fail_counter: 0,
			enabled: false,
			pull_in: false,
			ca_code: vec![zero; signal_modulation::CA_CODE_LENGTH + 2],
			early_code: vec![zero; scratch_len],
			prompt_code: vec![zero; scratch_len],
			late_code: vec![zero; scratch_len],
			carr_wipeoff: vec![zero; scratch_len],
			queue,
			dump,
			conf,
		})
	}

	// Read-only getter methods
	pub fn enabled(&self) -> bool { self.enabled }
	pub fn prn(&self) -> usize { self.prn }
	pub fn carrier_doppler_hz(&self) -> f64 { self.carrier_doppler_hz }
	pub fn code_freq_hz(&self) -> f64 { self.code_freq_hz }
	pub fn code_phase_samples(&self) -> f64 { self.code_phase_samples }
	pub fn rem_code_phase_samples(&self) -> f64 { self.rem_code_phase_samples }
	pub fn rem_carr_phase_rad(&self) -> f64 { self.rem_carr_phase_rad }
	pub fn acc_carrier_phase_rad(&self) -> f64 { self.acc_carrier_phase_rad }
	pub fn cn0_snv_db_hz(&self) -> f64 { self.cn0_snv_db_hz }
	pub fn carrier_lock_test(&self) -> f64 { self.carrier_lock_test }
	pub fn sample_counter(&self) -> u64 { self.sample_counter }
	pub fn sample_counter_seconds(&self) -> f64 { self.sample_counter_seconds }

	/// Minimum number of input samples the scheduler must make available per
	/// work call, enough to cover one Doppler-stretched code period from any
	/// residual alignment.
	pub fn forecast(&self) -> usize {
		2 * self.conf.vector_length
	}

	/// Reconciles the acquisition estimate with the tracking timeline and
	/// arms the loops.  The next work call performs the pull-in alignment.
	/// Sample counters keep running across restarts.
	pub fn start_tracking(&mut self, handover:&AcqHandover) -> Result<(), ChannelErr> {

		signal_modulation::fill_replica_table(handover.prn, &mut self.ca_code)?;

		let fs:f64 = self.conf.fs_in;

		self.prn = handover.prn;
		self.acq_code_phase_samples = handover.code_phase_samples;
		self.acq_carrier_doppler_hz = handover.doppler_hz;
		self.acq_sample_stamp = handover.sample_stamp;

		// Time elapsed between the acquisition snapshot and where the
		// tracking timeline currently stands
		let acq_trk_diff_samples:u64 = self.sample_counter.saturating_sub(self.acq_sample_stamp);
		let acq_trk_diff_seconds:f64 = acq_trk_diff_samples as f64 / fs;

		// Doppler scales the code rate through the radial velocity factor
		let radial_velocity:f64 = (gps_l1_ca::CARRIER_FREQ_HZ + self.acq_carrier_doppler_hz) / gps_l1_ca::CARRIER_FREQ_HZ;
		self.code_freq_hz = radial_velocity * gps_l1_ca::CODE_RATE_CHIPS_PER_SEC;

		let t_prn_mod_seconds:f64 = gps_l1_ca::CODE_LENGTH_CHIPS / self.code_freq_hz;
		let t_prn_mod_samples:f64 = t_prn_mod_seconds * fs;
		self.next_prn_length_samples = t_prn_mod_samples.round() as usize;

		let t_prn_true_seconds:f64 = gps_l1_ca::CODE_LENGTH_CHIPS / gps_l1_ca::CODE_RATE_CHIPS_PER_SEC;
		let t_prn_true_samples:f64 = t_prn_true_seconds * fs;

		// The code phase estimate ages while acquisition hands the channel
		// over; project it forward by the accumulated period difference
		let t_prn_diff_seconds:f64 = t_prn_true_seconds - t_prn_mod_seconds;
		let n_prn_diff:f64 = acq_trk_diff_seconds / t_prn_true_seconds;
		let mut corrected_acq_phase_samples:f64 =
			(self.acq_code_phase_samples + t_prn_diff_seconds * n_prn_diff * fs) % t_prn_true_samples;
		if corrected_acq_phase_samples < 0.0 {
			corrected_acq_phase_samples += t_prn_mod_samples;
		}
		self.acq_code_phase_samples = corrected_acq_phase_samples;

		self.carrier_doppler_hz = self.acq_carrier_doppler_hz;
		self.code_phase_step_chips = self.code_freq_hz / fs;

		// Loop filter corrections stay relative to the acquisition operating
		// point, so both delay lines restart from zero
		self.carrier_loop_filter.initialize(0.0);
		self.code_loop_filter.initialize(0.0);

		self.carrier_lock_fail_counter = 0;
		self.rem_code_phase_samples = 0.0;
		self.next_rem_code_phase_samples = 0.0;
		self.rem_carr_phase_rad = 0.0;
		self.acc_carrier_phase_rad = 0.0;
		self.code_phase_samples = corrected_acq_phase_samples;
		self.prompt_buffer.clear();
		self.cn0_snv_db_hz = 0.0;
		self.carrier_lock_test = 1.0;

		self.pull_in = true;
		self.enabled = true;

		eprintln!("Channel {}: tracking start for PRN {}, doppler {:.1} [Hz], code phase {:.1} [samples]",
			self.channel_id, self.prn, self.carrier_doppler_hz, self.acq_code_phase_samples);

		Ok(())
	}

	/// Processes one scheduler invocation.  Returns how many input samples
	/// were consumed along with the synchro record for this code period.
	pub fn work(&mut self, input:&[Complex<f64>]) -> (usize, Synchro) {
		if !self.enabled {
			self.work_disabled(input)
		} else if self.pull_in {
			self.work_pull_in()
		} else {
			self.work_tracking(input)
		}
	}

	// With tracking disabled the channel stays a well-behaved pipeline
	// member: zeroed correlators, an invalid synchro, counters still moving.
	fn work_disabled(&mut self, input:&[Complex<f64>]) -> (usize, Synchro) {
		let n:usize = self.current_prn_length_samples.min(input.len());
		let zero:Complex<f64> = Complex{ re: 0.0, im: 0.0 };

		self.write_dump_record(zero, zero, zero, 0.0, 0.0, 0.0, 0.0);

		self.sample_counter_seconds += n as f64 / self.conf.fs_in;
		self.sample_counter += n as u64;
		(n, Synchro::default())
	}

	// First call after start_tracking: skip enough of the input stream that
	// every subsequent window starts on a code period boundary.
	fn work_pull_in(&mut self) -> (usize, Synchro) {
		let acq_to_trk_delay_samples:u64 = self.sample_counter.saturating_sub(self.acq_sample_stamp);
		let shift_correction_samples:f64 = self.next_prn_length_samples as f64
			- (acq_to_trk_delay_samples as f64 % self.next_prn_length_samples as f64);
		let samples_offset:usize = (self.acq_code_phase_samples + shift_correction_samples).round() as usize;

		self.sample_counter_seconds += samples_offset as f64 / self.conf.fs_in;
		self.sample_counter += samples_offset as u64;
		self.pull_in = false;

		// The consumed offset lands the stream on a code period boundary, so
		// the observed code phase restarts from zero
		self.code_phase_samples = 0.0;

		let synchro = Synchro{ prn: self.prn, system: self.system, ..Synchro::default() };
		(samples_offset, synchro)
	}

	fn work_tracking(&mut self, input:&[Complex<f64>]) -> (usize, Synchro) {
		let fs:f64 = self.conf.fs_in;

		// The window length committed by the previous update
		self.current_prn_length_samples = self.next_prn_length_samples;
		let n:usize = self.current_prn_length_samples;
		assert!(input.len() >= n, "scheduler offered fewer samples than forecast");

		self.update_local_code();
		self.update_local_carrier();

		let (early, prompt, late) = correlator::wipeoff_and_epl(&input[..n],
			&self.carr_wipeoff[..n], &self.early_code[..n], &self.prompt_code[..n], &self.late_code[..n]);

		if prompt.re.is_nan() || prompt.im.is_nan() {
			// Upstream discontinuity; skip everything the scheduler offered
			// and let the loops pick the signal back up on the next window
			let available:usize = input.len();
			eprintln!("Channel {}: NaN samples at sample number {}", self.channel_id, self.sample_counter);

			let synchro = Synchro{ prn: self.prn, system: self.system,
				tracking_timestamp_secs: self.sample_counter_seconds, ..Synchro::default() };

			self.sample_counter_seconds += available as f64 / fs;
			self.sample_counter += available as u64;
			return (available, synchro);
		}

		// Close the carrier loop
		let carr_error_cycles:f64 = discriminators::pll_two_quadrant_atan(prompt) / TWO_PI;
		let carr_nco_hz:f64 = self.carrier_loop_filter.step(carr_error_cycles);
		self.carrier_doppler_hz = self.acq_carrier_doppler_hz + carr_nco_hz;

		// Close the code loop
		let code_error_chips:f64 = discriminators::dll_nc_e_minus_l_normalized(early, late);
		let code_nco_hz:f64 = self.code_loop_filter.step(code_error_chips);
		self.code_freq_hz = gps_l1_ca::CODE_RATE_CHIPS_PER_SEC - code_nco_hz;

		// Re-derive the window geometry from the updated code frequency.  The
		// residual committed last period becomes current; the fractional part
		// left over after rounding carries into the next period.
		self.code_phase_step_chips = self.code_freq_hz / fs;
		let t_prn_seconds:f64 = gps_l1_ca::CODE_LENGTH_CHIPS / self.code_freq_hz;
		let t_prn_samples:f64 = t_prn_seconds * fs;
		self.rem_code_phase_samples = self.next_rem_code_phase_samples;
		let k_blk_samples:f64 = t_prn_samples + self.rem_code_phase_samples;

		let t_prn_true_samples:f64 = (gps_l1_ca::CODE_LENGTH_CHIPS / gps_l1_ca::CODE_RATE_CHIPS_PER_SEC) * fs;
		self.code_phase_samples = (self.code_phase_samples + t_prn_samples - t_prn_true_samples)
			.rem_euclid(t_prn_true_samples);

		self.next_prn_length_samples = k_blk_samples.round() as usize;
		self.next_rem_code_phase_samples = k_blk_samples - self.next_prn_length_samples as f64;

		// C/N0 estimation and lock monitoring over the prompt history
		if self.prompt_buffer.len() < gps_l1_ca::CN0_ESTIMATION_SAMPLES {
			self.prompt_buffer.push_back(prompt);
		} else {
			self.cn0_snv_db_hz = lock_detectors::cn0_svn_estimator(&self.prompt_buffer, n as f64 / fs);
			self.carrier_lock_test = lock_detectors::carrier_lock_detector(&self.prompt_buffer);
			self.prompt_buffer.clear();

			let lock_fail:bool = if self.conf.lock_test_compat {
				self.carrier_lock_test < gps_l1_ca::CARRIER_LOCK_THRESHOLD
					|| self.carrier_lock_test > gps_l1_ca::MINIMUM_VALID_CN0_DB_HZ
			} else {
				self.carrier_lock_test < gps_l1_ca::CARRIER_LOCK_THRESHOLD
					|| self.cn0_snv_db_hz < gps_l1_ca::MINIMUM_VALID_CN0_DB_HZ
			};
			if lock_fail {
				self.carrier_lock_fail_counter += 1;
			} else if self.carrier_lock_fail_counter > 0 {
				self.carrier_lock_fail_counter -= 1;
			}

			if self.carrier_lock_fail_counter > gps_l1_ca::MAXIMUM_LOCK_FAIL_COUNTER {
				eprintln!("Channel {}: loss of lock on PRN {}", self.channel_id, self.prn);
				if self.queue.try_send(ChannelMessage::LossOfLock).is_err() {
					eprintln!("Channel {}: supervisor queue unavailable, loss of lock not delivered", self.channel_id);
				}
				self.carrier_lock_fail_counter = 0;
				self.enabled = false;
			}
		}

		let synchro = Synchro{
			prn: self.prn,
			system: self.system,
			prompt_i: prompt.re,
			prompt_q: prompt.im,
			tracking_timestamp_secs: self.sample_counter_seconds,
			carrier_phase_rads: self.acc_carrier_phase_rad,
			code_phase_secs: self.code_phase_samples / fs,
			cn0_db_hz: self.cn0_snv_db_hz,
			valid: true,
		};

		self.write_dump_record(early, prompt, late, carr_error_cycles, carr_nco_hz, code_error_chips, code_nco_hz);

		self.sample_counter_seconds += n as f64 / fs;
		self.sample_counter += n as u64;

		(n, synchro)
	}

	// Resamples the three code replicas for the current window from the
	// padded chip table.  The non-negative modulo runs before rounding, so
	// every index lands in the table's 0..=1024 range.
	fn update_local_code(&mut self) {
		let n:usize = self.current_prn_length_samples;
		let delta:f64 = self.conf.early_late_space_chips;
		let rem_code_phase_chips:f64 = self.rem_code_phase_samples * (self.code_freq_hz / self.conf.fs_in);

		let mut tcode_chips:f64 = -rem_code_phase_chips;
		for i in 0..n {
			let early_idx:usize  = 1 + (tcode_chips - delta).rem_euclid(gps_l1_ca::CODE_LENGTH_CHIPS).round() as usize;
			let prompt_idx:usize = 1 + tcode_chips.rem_euclid(gps_l1_ca::CODE_LENGTH_CHIPS).round() as usize;
			let late_idx:usize   = 1 + (tcode_chips + delta).rem_euclid(gps_l1_ca::CODE_LENGTH_CHIPS).round() as usize;
			self.early_code[i]  = self.ca_code[early_idx];
			self.prompt_code[i] = self.ca_code[prompt_idx];
			self.late_code[i]   = self.ca_code[late_idx];
			tcode_chips += self.code_phase_step_chips;
		}
	}

	// Regenerates the carrier wipe-off vector and advances the carrier phase
	// bookkeeping across the window.
	fn update_local_carrier(&mut self) {
		let n:usize = self.current_prn_length_samples;
		let phase_step_rad:f64 = TWO_PI * (self.conf.if_freq + self.carrier_doppler_hz) / self.conf.fs_in;

		let mut phase_rad:f64 = self.rem_carr_phase_rad;
		for i in 0..n {
			self.carr_wipeoff[i] = Complex{ re: phase_rad.cos(), im: phase_rad.sin() };
			phase_rad += phase_step_rad;
		}

		if self.conf.carrier_phase_compat {
			// Byte-compatible with legacy trace logs: accumulate the
			// post-wrap residual, under-counting when the phase wraps
			// mid-window
			self.rem_carr_phase_rad = phase_rad.rem_euclid(TWO_PI);
			self.acc_carrier_phase_rad += self.rem_carr_phase_rad;
		} else {
			self.acc_carrier_phase_rad += n as f64 * phase_step_rad;
			self.rem_carr_phase_rad = phase_rad.rem_euclid(TWO_PI);
		}
	}

	fn write_dump_record(&mut self, early:Complex<f64>, prompt:Complex<f64>, late:Complex<f64>,
		carr_error_cycles:f64, carr_nco_hz:f64, code_error_chips:f64, code_nco_hz:f64) {

		if let Some(d) = self.dump.as_mut() {
			let rec = dump::DumpRecord{
				abs_early: early.norm() as f32,
				abs_prompt: prompt.norm() as f32,
				abs_late: late.norm() as f32,
				prompt_i: prompt.im as f32,
				prompt_q: prompt.re as f32,
				sample_counter: self.sample_counter,
				acc_carrier_phase_rad: self.acc_carrier_phase_rad as f32,
				carrier_doppler_hz: self.carrier_doppler_hz as f32,
				code_freq_hz: self.code_freq_hz as f32,
				pll_error_cycles: carr_error_cycles as f32,
				pll_nco_hz: carr_nco_hz as f32,
				dll_error_chips: code_error_chips as f32,
				dll_nco_hz: code_nco_hz as f32,
				cn0_db_hz: self.cn0_snv_db_hz as f32,
				carrier_lock_test: self.carrier_lock_test as f32,
				sample_counter_seconds: self.sample_counter_seconds,
			};
			if let Err(e) = d.write_record(&rec) {
				eprintln!("Channel {}: tracking dump write failed, disabling dump: {}", self.channel_id, e);
				self.dump = None;
			}
		}
	}

}

impl StreamFunctionality<AcqHandover, (), Complex<f64>, Synchro> for TrackingChannel {

	fn control(&mut self, control:&AcqHandover) -> Result<(), &'static str> {
		self.start_tracking(control).map_err(|_| "invalid acquisition handover")
	}

	fn forecast(&self) -> usize {
		TrackingChannel::forecast(self)
	}

	fn work(&mut self, input:&[Complex<f64>]) -> (usize, BlockResult<Synchro>) {
		let (consumed, synchro) = TrackingChannel::work(self, input);
		(consumed, BlockResult::Ready(synchro))
	}

}
