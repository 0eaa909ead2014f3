pub mod audio_buffer;
pub mod audio_error;
pub mod audio_reader;
pub mod audio_writer;
pub mod external_tool;
pub mod resampler;
