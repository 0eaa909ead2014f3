/// Separates a degradation name from its parameter list.
pub const NAME_SEP: &str = ",";
/// Separates positional parameter values.
pub const PARAMETERS_SEP: &str = ",";
/// Separates a signature from its description in generated help.
pub const DESCRIPTION_SEP: &str = ": ";

pub const APP_DIR_NAME: &str = "audio-degrader";
pub const RESOURCES_DIR_NAME: &str = "resources";

/// Env var overriding the resources directory.
pub const RESOURCES_ENV_VAR: &str = "AUDIO_DEGRADER_RESOURCES";

pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SOX_PROGRAM: &str = "sox";

pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg", "m4a", "aac", "aiff", "opus"];
