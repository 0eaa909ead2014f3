use std::path::Path;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_writer::SampleEncoding;
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

/// Input file name inside the scratch directory.
pub const INPUT_FILE: &str = "input.wav";

/// Write `audio` to a scratch float wav, run sox with the arguments built from the
/// input and output paths, and decode the result.
///
/// The scratch directory is removed on every path out of this function.
pub fn sox_round_trip<F>(
    audio: &AudioBuffer,
    env: &DegradationEnv,
    output_file: &str,
    build_args: F,
) -> Result<AudioBuffer, DegradationError>
where
    F: FnOnce(&Path, &Path) -> Vec<String>,
{
    let scratch = env.scratch_dir()?;
    let input = scratch.path().join(INPUT_FILE);
    let output = scratch.path().join(output_file);

    env.writer.save_as(&input, audio, SampleEncoding::Float32)?;
    let args = build_args(&input, &output);
    let result = env.run_sox(&args)?;
    if !result.stderr.is_empty() {
        log::debug!("{}: {}", env.sox_program, result.stderr.trim());
    }
    Ok(env.reader.load(&output)?)
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
