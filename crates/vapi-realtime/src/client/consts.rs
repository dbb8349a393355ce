pub const VAPI_API_KEY: &str = "VAPI_API_KEY";

pub const BASE_URL: &str = "https://api.vapi.ai";
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

pub const CONTROL_CAPACITY: usize = 8;
