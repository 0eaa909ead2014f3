use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

use super::tool_round_trip::{path_arg, sox_round_trip};

pub static MP3_INFO: DegradationInfo = DegradationInfo {
    name: "mp3",
    description: "Emulate mp3 transcoding",
    parameters: &[ParameterInfo {
        name: "bitrate",
        example: "320k",
        description: "Quality [bps]",
    }],
};

const MP3_FILE: &str = "transcoded.mp3";

/// Lossy round trip through the mp3 encoder of sox.
pub struct Mp3;

impl DegradationKind for Mp3 {
    /// Bitrate in kbps.
    type Params = u32;

    fn info() -> &'static DegradationInfo {
        &MP3_INFO
    }

    fn parse(values: &ParameterValues) -> Result<u32, DegradationError> {
        let raw = values.require(&MP3_INFO, "bitrate")?;
        let digits = raw.trim().trim_end_matches(['k', 'K']);
        let invalid = |reason: &str| {
            DegradationError::invalid_parameter(MP3_INFO.name, "bitrate", raw, reason)
        };
        let kbps: u32 = digits
            .parse()
            .map_err(|_| invalid("expected a bitrate such as 64k or 320"))?;
        if kbps == 0 {
            return Err(invalid("must be greater than zero"));
        }
        Ok(kbps)
    }

    fn process(
        kbps: &u32,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        log::info!("Transcoding to mp3 at {kbps} kbps");
        let rate = audio.sample_rate();
        let decoded = sox_round_trip(audio, env, MP3_FILE, |input, output| {
            vec![
                path_arg(input),
                "-C".to_string(),
                format!("{kbps}.01"),
                path_arg(output),
            ]
        })?;

        if decoded.sample_rate() != rate {
            log::debug!(
                "Encoder changed rate to {} Hz, resampling back to {rate} Hz",
                decoded.sample_rate()
            );
            let restored = env
                .resampler
                .resample(decoded.samples(), decoded.sample_rate(), rate)?;
            audio.set_samples(restored)?;
        } else {
            audio.set_samples(decoded.samples().clone())?;
        }
        Ok(())
    }
}
