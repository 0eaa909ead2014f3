pub mod ffmpeg_audio_reader;
pub mod ffmpeg_audio_writer;
pub mod process_tool;
pub mod rubato_resampler;
