pub mod analysis;
pub mod constants;
pub mod trackqc_errors;
pub mod tracks;
