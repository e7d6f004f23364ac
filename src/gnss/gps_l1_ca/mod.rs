
pub mod signal_modulation;
pub mod tracking;

pub const CODE_LENGTH_CHIPS:f64 = 1023.0;
pub const CODE_RATE_CHIPS_PER_SEC:f64 = 1.023e6;
pub const CARRIER_FREQ_HZ:f64 = 1.57542e9;

pub const CN0_ESTIMATION_SAMPLES:usize = 10;
pub const MINIMUM_VALID_CN0_DB_HZ:f64 = 25.0;
pub const CARRIER_LOCK_THRESHOLD:f64 = 5.0;
pub const MAXIMUM_LOCK_FAIL_COUNTER:usize = 200;
