
use serde::{Serialize, Deserialize};

pub mod correlator;
pub mod discriminators;
pub mod lock_detectors;

/// Per-PRN record handed from tracking to the telemetry and navigation
/// stages.  Emitted once per completed code period, in strict PRN order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synchro {
	pub prn: usize,
	pub system: char,
	pub prompt_i: f64,
	pub prompt_q: f64,
	pub tracking_timestamp_secs: f64,
	pub carrier_phase_rads: f64,
	pub code_phase_secs: f64,
	pub cn0_db_hz: f64,
	pub valid: bool,
}

impl Default for Synchro {

	fn default() -> Self {
		Self { prn: 0, system: 'G', prompt_i: 0.0, prompt_q: 0.0,
			   tracking_timestamp_secs: 0.0, carrier_phase_rads: 0.0,
			   code_phase_secs: 0.0, cn0_db_hz: 0.0, valid: false }
	}

}

/// Notifications a channel pushes onto the supervisor queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessage {
	LossOfLock,
}

impl ChannelMessage {

	/// Integer code used on the supervisor wire protocol.
	pub fn code(&self) -> u32 {
		match self {
			ChannelMessage::LossOfLock => 3,
		}
	}

}

/// Acquisition results handed over when a tracking session (re)starts.
#[derive(Debug, Clone, Copy)]
pub struct AcqHandover {
	pub prn: usize,
	pub code_phase_samples: f64,
	pub doppler_hz: f64,
	pub sample_stamp: u64,
}
