//! In-process signal-processing kernels shared by the degradations.

use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::audio::domain::audio_buffer::AudioBuffer;

use super::degradation_error::DegradationError;

/// IRs up to this length are convolved directly, longer ones through FFT.
const DIRECT_CONVOLUTION_MAX_TAPS: usize = 64;

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Scale by `10^(db/20)`, then clip to [-1, 1].
///
/// The product is taken in f64 with a finite factor, so zero stays zero
/// however large the gain.
pub fn apply_gain(audio: &mut AudioBuffer, db: f64) {
    let factor = db_to_linear(db).min(f64::MAX);
    audio
        .samples_mut()
        .mapv_inplace(|x| (x as f64 * factor).clamp(-1.0, 1.0) as f32);
}

/// Remove the DC offset and scale the peak to 1.0.
pub fn normalize(audio: &mut AudioBuffer) -> Result<(), DegradationError> {
    let mean = audio.mean();
    let centered = audio.samples().mapv(|x| (x as f64 - mean) as f32);
    let peak = centered.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
    if !mean.is_finite() || !peak.is_finite() || peak == 0.0 {
        return Err(DegradationError::DegenerateSignal(format!(
            "cannot normalize a signal with peak {peak} after removing mean {mean}"
        )));
    }
    log::debug!("Max abs(amplitude): {peak:.3}");
    let normalized = centered.mapv(|x| (x / peak).clamp(-1.0, 1.0));
    audio.set_samples(normalized)?;
    Ok(())
}

/// Drop `round(start_time * sample_rate)` leading frames. Returns the number
/// of frames actually dropped.
pub fn trim_start(audio: &mut AudioBuffer, start_time: f64) -> usize {
    let start = audio.frame_index_at_time(start_time).min(audio.frames());
    audio.drop_leading(start);
    start
}

/// Repeat `noise` by doubling until it covers `frames`, then truncate.
pub fn fit_length(noise: &Array2<f32>, frames: usize) -> Result<Array2<f32>, DegradationError> {
    if frames == 0 {
        return Ok(Array2::zeros((noise.nrows(), 0)));
    }
    if noise.ncols() == 0 {
        return Err(DegradationError::DegenerateSignal(
            "noise has no samples".to_string(),
        ));
    }
    let mut tiled = noise.clone();
    while tiled.ncols() < frames {
        tiled = ndarray::concatenate(Axis(1), &[tiled.view(), tiled.view()])
            .map_err(|e| DegradationError::DegenerateSignal(e.to_string()))?;
    }
    Ok(tiled.slice(s![.., ..frames]).to_owned())
}

fn rms(samples: &Array2<f32>) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    (samples.iter().map(|&x| (x as f64).powi(2)).sum::<f64>() / n as f64).sqrt()
}

/// Linear gain bringing noise to `snr_db` below the signal.
pub fn noise_gain_factor(snr_db: f64, rms_noise: f64, rms_signal: f64) -> f64 {
    rms_signal / rms_noise / db_to_linear(snr_db)
}

/// Add `noise` (already at the buffer's rate and length) at the given SNR
/// and rescale the mixture back to the input RMS.
pub fn mix_at_snr(
    audio: &mut AudioBuffer,
    noise: &Array2<f32>,
    snr_db: f64,
) -> Result<(), DegradationError> {
    if noise.dim() != audio.samples().dim() {
        return Err(DegradationError::DegenerateSignal(format!(
            "noise shape {:?} does not match signal shape {:?}",
            noise.dim(),
            audio.samples().dim()
        )));
    }
    if audio.is_empty() {
        return Ok(());
    }
    let rms_signal = audio.rms();
    let rms_noise = rms(noise);
    if rms_noise == 0.0 || !rms_noise.is_finite() {
        return Err(DegradationError::DegenerateSignal(
            "noise is silent".to_string(),
        ));
    }
    if rms_signal == 0.0 {
        log::debug!("Input is silent, mixing leaves it unchanged");
        return Ok(());
    }

    let gain = noise_gain_factor(snr_db, rms_noise, rms_signal);
    log::debug!("Noise gain factor {gain:.5} (rms signal {rms_signal:.5}, rms noise {rms_noise:.5})");
    let mixed = audio.samples().mapv(|x| x as f64) + noise.mapv(|n| n as f64 * gain);

    let rms_mixed = (mixed.iter().map(|y| y * y).sum::<f64>() / mixed.len() as f64).sqrt();
    if rms_mixed == 0.0 || !rms_mixed.is_finite() {
        return Err(DegradationError::DegenerateSignal(
            "signal and noise cancel out".to_string(),
        ));
    }
    let scale = rms_signal / rms_mixed;
    audio.set_samples(mixed.mapv(|y| (y * scale) as f32))?;
    Ok(())
}

/// Full linear convolution of `x` with `ir`, truncated to `x.len()`.
pub fn convolve_truncated(x: ArrayView1<'_, f32>, ir: ArrayView1<'_, f32>) -> Array1<f32> {
    let n = x.len();
    let m = ir.len();
    if n == 0 || m == 0 {
        return Array1::zeros(n);
    }
    if m <= DIRECT_CONVOLUTION_MAX_TAPS {
        convolve_direct(x, ir)
    } else {
        convolve_fft(x, ir)
    }
}

fn convolve_direct(x: ArrayView1<'_, f32>, ir: ArrayView1<'_, f32>) -> Array1<f32> {
    let n = x.len();
    let mut out = Array1::zeros(n);
    for i in 0..n {
        let mut acc = 0.0f64;
        for (k, &h) in ir.iter().enumerate().take(i + 1) {
            acc += h as f64 * x[i - k] as f64;
        }
        out[i] = acc as f32;
    }
    out
}

fn convolve_fft(x: ArrayView1<'_, f32>, ir: ArrayView1<'_, f32>) -> Array1<f32> {
    let n = x.len();
    let size = (n + ir.len() - 1).next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let mut xs = vec![Complex::new(0.0, 0.0); size];
    for (dst, &v) in xs.iter_mut().zip(x.iter()) {
        dst.re = v as f64;
    }
    let mut hs = vec![Complex::new(0.0, 0.0); size];
    for (dst, &v) in hs.iter_mut().zip(ir.iter()) {
        dst.re = v as f64;
    }

    forward.process(&mut xs);
    forward.process(&mut hs);
    for (a, b) in xs.iter_mut().zip(hs.iter()) {
        *a *= *b;
    }
    inverse.process(&mut xs);

    // rustfft does not normalize
    let norm = 1.0 / size as f64;
    xs.iter().take(n).map(|c| (c.re * norm) as f32).collect()
}

/// `wet * level + dry * (1 - level)`.
pub fn wet_dry(wet: &Array2<f32>, dry: &Array2<f32>, level: f64) -> Array2<f32> {
    let level = level as f32;
    wet * level + dry * (1.0 - level)
}

/// Second-order IIR section (direct form I).
#[derive(Clone, Debug, PartialEq)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// RBJ cookbook peaking EQ.
    pub fn peaking(sample_rate: f64, center: f64, q: f64, gain_db: f64) -> Self {
        let a = 10f64.powf(gain_db / 40.0);
        let omega = 2.0 * std::f64::consts::PI * center / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Filter one channel from a zero state.
    pub fn process(&self, input: ArrayView1<'_, f32>) -> Array1<f32> {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        input
            .iter()
            .map(|&x| {
                let x = x as f64;
                let y = self.b0 * x + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
                x2 = x1;
                x1 = x;
                y2 = y1;
                y1 = y;
                y as f32
            })
            .collect()
    }

    /// Magnitude response at `freq`.
    pub fn gain_at(&self, sample_rate: f64, freq: f64) -> f64 {
        let w = 2.0 * std::f64::consts::PI * freq / sample_rate;
        let z1 = Complex::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let num = Complex::new(self.b0, 0.0) + z1 * self.b1 + z2 * self.b2;
        let den = Complex::new(1.0, 0.0) + z1 * self.a1 + z2 * self.a2;
        (num / den).norm()
    }
}

/// Apply a per-channel transform that preserves length.
pub fn map_channels<F>(samples: &Array2<f32>, mut f: F) -> Array2<f32>
where
    F: FnMut(ArrayView1<'_, f32>) -> Array1<f32>,
{
    let mut out = Array2::zeros(samples.raw_dim());
    for (src, mut dst) in samples.outer_iter().zip(out.outer_iter_mut()) {
        dst.assign(&f(src));
    }
    out
}
