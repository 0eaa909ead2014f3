pub mod degrade_audio_use_case;
pub mod pipeline_executor;
pub mod pipeline_logger;
