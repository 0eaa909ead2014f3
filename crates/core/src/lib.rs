//! Degradation pipeline engine.
//!
//! Parses compact textual degradation specs (`gain,-6`, `mix,sounds/hum.wav,10`),
//! resolves them through a registry and applies them in order to a stereo
//! [`AudioBuffer`](audio::domain::audio_buffer::AudioBuffer).

pub mod audio;
pub mod degradation;
pub mod pipeline;
pub mod shared;
