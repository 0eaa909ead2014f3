use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// STFT analysis/synthesis window size.
const WINDOW_SIZE: usize = 2048;

/// Synthesis hop size between successive STFT frames.
const HOP_SIZE: usize = 512;

/// Phase-vocoder time-scale modification of one channel.
///
/// `rate` is a tempo multiplier: the output has `round(n / rate)` samples
/// and the same pitch. Frames are centred by padding half a window on each
/// side.
pub fn time_stretch(samples: ArrayView1<'_, f32>, rate: f64) -> Array1<f32> {
    let n = samples.len();
    let target = (n as f64 / rate).round() as usize;
    if n == 0 || target == 0 {
        return Array1::zeros(target);
    }

    let half_window = WINDOW_SIZE / 2 + 1;
    let pad = WINDOW_SIZE / 2;

    let mut padded = vec![0.0f64; pad + n + pad + WINDOW_SIZE];
    for (dst, &src) in padded[pad..pad + n].iter_mut().zip(samples.iter()) {
        *dst = src as f64;
    }

    // Precompute Hann window
    let hann: Vec<f64> = (0..WINDOW_SIZE)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / WINDOW_SIZE as f64).cos()))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft_forward = planner.plan_fft_forward(WINDOW_SIZE);
    let fft_inverse = planner.plan_fft_inverse(WINDOW_SIZE);

    // Analysis: windowed STFT of the padded input
    let num_frames = (padded.len() - WINDOW_SIZE) / HOP_SIZE + 1;
    let spectra: Vec<Vec<Complex<f64>>> = (0..num_frames)
        .map(|frame_idx| {
            let start = frame_idx * HOP_SIZE;
            let mut fft_buf: Vec<Complex<f64>> = (0..WINDOW_SIZE)
                .map(|i| Complex::new(padded[start + i] * hann[i], 0.0))
                .collect();
            fft_forward.process(&mut fft_buf);
            fft_buf.truncate(half_window);
            fft_buf
        })
        .collect();

    let expected_phase_advance: Vec<f64> = (0..half_window)
        .map(|k| 2.0 * PI * k as f64 * HOP_SIZE as f64 / WINDOW_SIZE as f64)
        .collect();

    let mut synth_phase: Vec<f64> = spectra[0].iter().map(|c| c.im.atan2(c.re)).collect();

    let out_len = target + 2 * pad + WINDOW_SIZE;
    let mut output = vec![0.0f64; out_len];
    let mut window_sum = vec![0.0f64; out_len];

    let mut step = 0usize;
    loop {
        let t = step as f64 * rate;
        if t >= num_frames as f64 {
            break;
        }
        let start = step * HOP_SIZE;
        if start + WINDOW_SIZE > out_len {
            break;
        }

        let i0 = t.floor() as usize;
        let i1 = (i0 + 1).min(num_frames - 1);
        let alpha = t - i0 as f64;
        let (c0, c1) = (&spectra[i0], &spectra[i1]);

        // Interpolated magnitude with accumulated phase
        let mut synth_buf: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); WINDOW_SIZE];
        for k in 0..half_window {
            let magnitude = (1.0 - alpha) * c0[k].norm() + alpha * c1[k].norm();
            synth_buf[k] = Complex::from_polar(magnitude, synth_phase[k]);
        }
        // Mirror for negative frequencies (conjugate symmetry for real output)
        for k in 1..half_window - 1 {
            synth_buf[WINDOW_SIZE - k] = synth_buf[k].conj();
        }

        fft_inverse.process(&mut synth_buf);

        // Normalize IFFT (rustfft does not normalize)
        let norm = 1.0 / WINDOW_SIZE as f64;

        // Overlap-add with synthesis window
        for i in 0..WINDOW_SIZE {
            output[start + i] += synth_buf[i].re * norm * hann[i];
            window_sum[start + i] += hann[i] * hann[i];
        }

        // Advance phase by the measured instantaneous frequency
        for k in 0..half_window {
            let phase_diff =
                c1[k].im.atan2(c1[k].re) - c0[k].im.atan2(c0[k].re) - expected_phase_advance[k];
            // Wrap to [-pi, pi]
            let wrapped = phase_diff - (2.0 * PI) * (phase_diff / (2.0 * PI)).round();
            synth_phase[k] += expected_phase_advance[k] + wrapped;
        }

        step += 1;
    }

    let max_window_sum = window_sum.iter().cloned().fold(0.0f64, f64::max);
    let ws_threshold = max_window_sum * 0.1;

    // Normalize by window sum to compensate overlap-add, dropping the padding
    let mut result = Array1::<f32>::zeros(target);
    for (i, dst) in result.iter_mut().enumerate() {
        let j = pad + i;
        if window_sum[j] >= ws_threshold && window_sum[j] > 0.0 {
            *dst = (output[j] / window_sum[j]) as f32;
        }
    }

    // Peak-normalize: ensure output peak does not exceed input peak
    let input_peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    let output_peak = result.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if output_peak > 1e-10 && output_peak > input_peak {
        let gain = input_peak / output_peak;
        result.mapv_inplace(|x| x * gain);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sine(freq: f64, duration: f64, sample_rate: u32) -> Array1<f32> {
        let len = (duration * sample_rate as f64) as usize;
        Array1::from_shape_fn(len, |i| {
            let t = i as f64 / sample_rate as f64;
            (0.5 * (2.0 * PI * freq * t).sin()) as f32
        })
    }

    fn zero_crossings(x: &Array1<f32>) -> usize {
        x.windows(2)
            .into_iter()
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[rstest]
    #[case::slower(0.5)]
    #[case::faster(2.0)]
    #[case::slight(0.9)]
    #[case::identity(1.0)]
    fn test_output_length(#[case] rate: f64) {
        let input = sine(440.0, 1.0, 16000);
        let output = time_stretch(input.view(), rate);
        assert_eq!(output.len(), (16000.0 / rate).round() as usize);
    }

    #[test]
    fn test_unit_rate_is_near_identity() {
        let input = sine(440.0, 1.0, 16000);
        let output = time_stretch(input.view(), 1.0);
        let mse: f64 = input
            .iter()
            .zip(output.iter())
            .skip(WINDOW_SIZE)
            .take(16000 - 2 * WINDOW_SIZE)
            .map(|(a, b)| ((a - b) as f64).powi(2))
            .sum::<f64>()
            / (16000 - 2 * WINDOW_SIZE) as f64;
        assert!(mse < 1e-3, "Unit rate should be near-identity, MSE={mse}");
    }

    #[test]
    fn test_stretch_preserves_pitch() {
        let input = sine(440.0, 1.0, 16000);
        let output = time_stretch(input.view(), 0.5);
        // 440 Hz has ~880 crossings per second; output is two seconds long
        let per_second = zero_crossings(&output) as f64 / 2.0;
        assert!((per_second - 880.0).abs() < 60.0, "crossings/s {per_second}");
    }

    #[test]
    fn test_short_input_does_not_panic() {
        let input = Array1::from_elem(10, 0.3f32);
        assert_eq!(time_stretch(input.view(), 0.5).len(), 20);
        assert_eq!(time_stretch(Array1::<f32>::zeros(0).view(), 2.0).len(), 0);
    }

    #[test]
    fn test_output_does_not_exceed_input_peak() {
        let input = sine(440.0, 1.0, 16000);
        let output = time_stretch(input.view(), 0.7);
        let peak = output.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 0.5 + 1e-6, "peak {peak}");
    }
}
