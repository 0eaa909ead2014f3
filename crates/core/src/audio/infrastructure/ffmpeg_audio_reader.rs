use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;
use ffmpeg_next::util::frame::audio::Audio;
use ffmpeg_next::ChannelLayout;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_error::AudioError;
use crate::audio::domain::audio_reader::AudioReader;

/// Decodes any container/codec ffmpeg understands into planar stereo f32 at
/// the file's native sample rate.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn load(&self, path: &Path) -> Result<AudioBuffer, AudioError> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| AudioError::NoAudioStream(path.to_path_buf()))?;
        let audio_stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        let sample_rate = decoder.rate();
        let input_layout = if decoder.channel_layout().is_empty() {
            ChannelLayout::default(decoder.channels() as i32)
        } else {
            decoder.channel_layout()
        };
        // Mono is decoded as mono and duplicated into both channels later.
        let mono = decoder.channels() == 1;
        let output_layout = if mono {
            ChannelLayout::MONO
        } else {
            ChannelLayout::STEREO
        };
        let out_channels = if mono { 1 } else { 2 };

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            input_layout,
            sample_rate,
            Sample::F32(SampleType::Planar),
            output_layout,
            sample_rate,
        )?;

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); out_channels];
        let mut decoded_frame = Audio::empty();
        let mut resampled_frame = Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if decoded_frame.channel_layout().is_empty() {
                    decoded_frame.set_channel_layout(input_layout);
                }
                resampler.run(&decoded_frame, &mut resampled_frame)?;
                extract_planes(&resampled_frame, &mut channels);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if decoded_frame.channel_layout().is_empty() {
                decoded_frame.set_channel_layout(input_layout);
            }
            resampler.run(&decoded_frame, &mut resampled_frame)?;
            extract_planes(&resampled_frame, &mut channels);
        }

        if let Ok(Some(delay)) = resampler.flush(&mut resampled_frame) {
            if delay.output > 0 {
                extract_planes(&resampled_frame, &mut channels);
            }
        }

        log::debug!(
            "Decoded {} ({} Hz, {} channel(s), {} frames)",
            path.display(),
            sample_rate,
            decoder.channels(),
            channels.first().map_or(0, Vec::len)
        );

        AudioBuffer::from_channels(channels, sample_rate)
    }
}

/// Append each f32 plane of a planar frame to its channel vector.
fn extract_planes(frame: &Audio, out: &mut [Vec<f32>]) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    for (plane, channel) in out.iter_mut().enumerate() {
        let data = frame.data(plane);
        let floats =
            unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
        channel.extend_from_slice(floats);
    }
}
