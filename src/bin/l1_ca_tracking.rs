
use clap::{App, Arg};
use colored::*;
use num_complex::Complex;
use tokio::sync::mpsc;

use gnss_track::gnss::common::{AcqHandover, ChannelMessage, Synchro};
use gnss_track::gnss::gps_l1_ca;
use gnss_track::gnss::gps_l1_ca::tracking::{TrackingChannel, TrackingConfig};
use gnss_track::io;

fn main() {

	let matches = App::new("GPS L1 CA DLL+PLL Tracking")
		.version("0.1.0")
		.about("Takes baseband IQ samples as interleaved LE f32 pairs and produces one synchro record per C/A code period")
		.arg(Arg::with_name("filename")
			.short("f").long("filename")
			.help("Input filename")
			.required(true).takes_value(true))
		.arg(Arg::with_name("sample_rate_sps")
			.short("s").long("sample_rate_sps")
			.takes_value(true).required(true))
		.arg(Arg::with_name("if_freq_hz")
			.short("i").long("if_freq_hz")
			.help("Intermediate frequency of the input stream, defaults to zero")
			.takes_value(true))
		.arg(Arg::with_name("prn")
			.short("p").long("prn")
			.takes_value(true).required(true))
		.arg(Arg::with_name("acq_doppler_hz")
			.short("d").long("acq_doppler_hz")
			.help("Doppler estimate from acquisition")
			.takes_value(true).required(true))
		.arg(Arg::with_name("acq_code_phase_samples")
			.short("c").long("acq_code_phase_samples")
			.help("Code phase estimate from acquisition")
			.takes_value(true).required(true))
		.arg(Arg::with_name("pll_bw_hz")
			.long("pll_bw_hz")
			.takes_value(true))
		.arg(Arg::with_name("dll_bw_hz")
			.long("dll_bw_hz")
			.takes_value(true))
		.arg(Arg::with_name("early_late_space_chips")
			.long("early_late_space_chips")
			.takes_value(true))
		.arg(Arg::with_name("dump_filename")
			.long("dump_filename")
			.help("Enable the binary trace log with this base path")
			.takes_value(true))
		.arg(Arg::with_name("max_records")
			.short("m").long("max_records")
			.takes_value(true))
		.get_matches();

	// Parse mandatory fields
	let fname:&str = matches.value_of("filename").unwrap();
	let fs:f64 = matches.value_of("sample_rate_sps").unwrap().parse().unwrap();
	let prn:usize = matches.value_of("prn").unwrap().parse().unwrap();
	let acq_doppler_hz:f64 = matches.value_of("acq_doppler_hz").unwrap().parse().unwrap();
	let acq_code_phase_samples:f64 = matches.value_of("acq_code_phase_samples").unwrap().parse().unwrap();

	// Parse optional fields
	let if_freq:f64 = matches.value_of("if_freq_hz").map(|s| s.parse().unwrap()).unwrap_or(0.0);
	let pll_bw_hz:f64 = matches.value_of("pll_bw_hz").map(|s| s.parse().unwrap()).unwrap_or(50.0);
	let dll_bw_hz:f64 = matches.value_of("dll_bw_hz").map(|s| s.parse().unwrap()).unwrap_or(2.0);
	let early_late_space_chips:f64 = matches.value_of("early_late_space_chips").map(|s| s.parse().unwrap()).unwrap_or(0.5);
	let opt_dump:Option<&str> = matches.value_of("dump_filename");
	let opt_max_records:Option<usize> = matches.value_of("max_records").map(|s| s.parse().unwrap());

	eprintln!("Tracking PRN {} in {} at {} [samples/sec], max_records={:?}", prn, &fname, &fs, &opt_max_records);

	let conf = TrackingConfig {
		if_freq,
		fs_in: fs,
		vector_length: ((gps_l1_ca::CODE_LENGTH_CHIPS / gps_l1_ca::CODE_RATE_CHIPS_PER_SEC) * fs).round() as usize,
		pll_bw_hz,
		dll_bw_hz,
		early_late_space_chips,
		dump: opt_dump.is_some(),
		dump_filename: opt_dump.unwrap_or("").to_string(),
		carrier_phase_compat: false,
		lock_test_compat: false,
	};

	let (tx_msg, mut rx_msg) = mpsc::channel::<ChannelMessage>(10);
	let mut channel = TrackingChannel::new(conf, 0, tx_msg).unwrap_or_else(|e| {
		eprintln!("{}", format!("Invalid tracking configuration: {:?}", e).red());
		std::process::exit(1);
	});

	channel.start_tracking(&AcqHandover {
		prn,
		code_phase_samples: acq_code_phase_samples,
		doppler_hz: acq_doppler_hz,
		sample_stamp: 0,
	}).unwrap_or_else(|e| {
		eprintln!("{}", format!("Invalid acquisition handover: {:?}", e).red());
		std::process::exit(1);
	});

	let src = io::file_source_f32_complex(&fname).expect("Unable to open source file");

	let mut buffer:Vec<Complex<f64>> = vec![];
	let mut all_results:Vec<Synchro> = vec![];
	let mut last_seg:u64 = 0;

	'outer: for ((re, im), _idx) in src {
		buffer.push(Complex{ re: re as f64, im: im as f64 });

		while buffer.len() >= channel.forecast() {
			let (consumed, synchro) = channel.work(&buffer);
			buffer.drain(..consumed);
			all_results.push(synchro);

			if let Ok(msg) = rx_msg.try_recv() {
				eprintln!("{}", format!("Channel 0 sent control code {}", msg.code()).red());
			}

			// Once-per-second status line keyed off the sample counter
			let seg:u64 = channel.sample_counter() / (fs as u64);
			if seg != last_seg {
				last_seg = seg;
				let status = format!("PRN {:2}, t={:4} [s]: doppler {:8.1} [Hz], code freq {:10.1} [Hz], CN0 {:5.1} [dB-Hz]",
					prn, seg, channel.carrier_doppler_hz(), channel.code_freq_hz(), channel.cn0_snv_db_hz());
				if channel.enabled() {
					eprintln!("{}", status.green());
				} else {
					eprintln!("{}", status.red());
				}
			}

			if let Some(max_records) = opt_max_records {
				if all_results.len() >= max_records { break 'outer; }
			}
		}
	}

	// Output data in JSON format
	println!("{}", serde_json::to_string_pretty(&all_results).unwrap());

}
