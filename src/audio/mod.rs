pub mod decoder;
pub mod resample;
