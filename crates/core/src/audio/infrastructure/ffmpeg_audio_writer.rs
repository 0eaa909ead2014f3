use std::path::{Path, PathBuf};

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;
use ffmpeg_next::util::frame::audio::Audio;
use ffmpeg_next::ChannelLayout;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_error::AudioError;
use crate::audio::domain::audio_writer::{AudioWriter, SampleEncoding};

/// Encodes a stereo buffer with the default audio codec of the container
/// implied by the output extension (wav, flac, mp3, ogg, ...), or with
/// `pcm_f32le` when float samples are requested.
///
/// The file is written to a sibling temp path first and renamed into place,
/// so a failed encode never leaves a truncated output behind.
pub struct FfmpegAudioWriter;

impl AudioWriter for FfmpegAudioWriter {
    fn save_as(
        &self,
        path: &Path,
        audio: &AudioBuffer,
        encoding: SampleEncoding,
    ) -> Result<(), AudioError> {
        ffmpeg_next::init()?;

        let temp_path = temp_sibling(path);
        let result = encode_to(&temp_path, audio, encoding);
        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        std::fs::rename(&temp_path, path)?;
        log::debug!(
            "Wrote {} ({} Hz, {} frames)",
            path.display(),
            audio.sample_rate(),
            audio.frames()
        );
        Ok(())
    }
}

/// `dir/name.ext` -> `dir/.name.partial.ext`, keeping the extension for
/// container detection.
fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    path.with_file_name(name)
}

fn encode_to(path: &Path, audio: &AudioBuffer, encoding: SampleEncoding) -> Result<(), AudioError> {
    let encode_err = |reason: &str| AudioError::Encode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut octx = ffmpeg_next::format::output(&path)?;

    let codec_id = match encoding {
        SampleEncoding::Float32 => ffmpeg_next::codec::Id::PCM_F32LE,
        SampleEncoding::CodecDefault => octx
            .format()
            .codec(&path, ffmpeg_next::media::Type::Audio),
    };
    let codec = ffmpeg_next::encoder::find(codec_id)
        .ok_or_else(|| encode_err("no audio encoder for this container"))?;
    let sample_format = pick_sample_format(&codec);
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let mut ost = octx.add_stream(Some(codec))?;
    let stream_idx = ost.index();

    let rate = audio.sample_rate();
    let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .audio()?;
    encoder.set_rate(rate as i32);
    encoder.set_channel_layout(ChannelLayout::STEREO);
    encoder.set_format(sample_format);
    encoder.set_time_base(ffmpeg_next::Rational(1, rate as i32));
    if global_header {
        encoder.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = encoder.open_as(codec)?;
    ost.set_parameters(&encoder);

    let enc_time_base = encoder.time_base();
    let frame_size = encoder.frame_size() as usize;

    octx.write_header()?;

    let ost_time_base = octx
        .stream(stream_idx)
        .ok_or_else(|| encode_err("output stream disappeared"))?
        .time_base();

    let mut converter = ffmpeg_next::software::resampling::Context::get(
        Sample::F32(SampleType::Planar),
        ChannelLayout::STEREO,
        rate,
        sample_format,
        ChannelLayout::STEREO,
        rate,
    )?;

    let effective_frame_size = if frame_size == 0 { 1024 } else { frame_size };
    let left = audio.channel(0).to_vec();
    let right = audio.channel(1).to_vec();

    let mut pts: i64 = 0;
    let mut start = 0;
    while start < left.len() {
        let end = (start + effective_frame_size).min(left.len());
        let mut frame = Audio::new(
            Sample::F32(SampleType::Planar),
            end - start,
            ChannelLayout::STEREO,
        );
        frame.set_rate(rate);
        copy_plane(&mut frame, 0, &left[start..end]);
        copy_plane(&mut frame, 1, &right[start..end]);

        let mut converted = Audio::empty();
        converter.run(&frame, &mut converted)?;
        converted.set_pts(Some(pts));

        encoder.send_frame(&converted)?;
        flush_packets(&mut encoder, &mut octx, stream_idx, enc_time_base, ost_time_base)?;

        pts += (end - start) as i64;
        start = end;
    }

    encoder.send_eof()?;
    flush_packets(&mut encoder, &mut octx, stream_idx, enc_time_base, ost_time_base)?;

    octx.write_trailer()?;
    Ok(())
}

/// Prefer planar f32 when the encoder takes it, otherwise its first format.
fn pick_sample_format(codec: &ffmpeg_next::Codec) -> Sample {
    let planar_f32 = Sample::F32(SampleType::Planar);
    let formats: Vec<Sample> = codec
        .audio()
        .ok()
        .and_then(|a| a.formats())
        .map(|f| f.collect())
        .unwrap_or_default();
    if formats.is_empty() || formats.contains(&planar_f32) {
        planar_f32
    } else {
        formats[0]
    }
}

fn copy_plane(frame: &mut Audio, plane: usize, samples: &[f32]) {
    let dst = frame.data_mut(plane);
    let src_bytes = unsafe {
        std::slice::from_raw_parts(samples.as_ptr() as *const u8, std::mem::size_of_val(samples))
    };
    dst[..src_bytes.len()].copy_from_slice(src_bytes);
}

fn flush_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), AudioError> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}
