pub mod convolution_degradation;
pub mod degradation_factory;
pub mod dr_compression_degradation;
pub mod equalization_degradation;
pub mod gain_degradation;
pub mod mix_degradation;
pub mod mp3_degradation;
pub mod normalization_degradation;
mod phase_vocoder;
pub mod pitch_shift_degradation;
pub mod resample_degradation;
pub mod speed_degradation;
pub mod time_stretch_degradation;
mod tool_round_trip;
pub mod trim_degradation;
