//! Synthetic recordings for running the replay without capture files.
//!
//! The generator plays the part of the motion-capture rig:
//! - The head reference markers sit still apart from sensor noise
//! - The instrument tip travels from an entry point towards a target along a
//!   gently curved insertion path, pauses, then withdraws part of the way
//! - The instrument corners ride rigidly with the tip
//!
//! Everything is derived from one seed, so the same seed and lengths always
//! give the same recordings.

use lockstep_core::{ChannelId, ReplayError, Sample, TrajectorySeries};
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Head marker positions (mm) in the capture volume.
const HEAD_MARKERS: [(&str, [f64; 3]); 5] = [
    (ChannelId::HEAD_CORNER_A, [-60.0, 120.0, 40.0]),
    (ChannelId::HEAD_CORNER_B, [60.0, 120.0, 40.0]),
    (ChannelId::HEAD_CORNER_C, [-60.0, 120.0, -40.0]),
    (ChannelId::HEAD_CORNER_D, [60.0, 120.0, -40.0]),
    (ChannelId::HEAD_BROW, [0.0, 95.0, 90.0]),
];

/// Instrument corner offsets (mm) from the tip.
const INSTRUMENT_OFFSETS: [(&str, [f64; 3]); 4] = [
    (ChannelId::INSTRUMENT_CORNER_A, [-15.0, 180.0, 15.0]),
    (ChannelId::INSTRUMENT_CORNER_B, [15.0, 180.0, 15.0]),
    (ChannelId::INSTRUMENT_CORNER_C, [-15.0, 180.0, -15.0]),
    (ChannelId::INSTRUMENT_CORNER_D, [15.0, 180.0, -15.0]),
];

/// Seeded generator of marker recordings.
pub struct SyntheticRecorder {
    /// Master seed
    seed: u64,

    /// Sensor noise standard deviation (mm)
    noise_std: f64,

    /// Entry point of the insertion path (mm)
    entry: Vector3<f64>,

    /// Deepest point of the insertion path (mm)
    target: Vector3<f64>,
}

impl SyntheticRecorder {
    /// Creates a recorder with 0.2 mm sensor noise.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            noise_std: 0.2,
            entry: Vector3::new(10.0, 140.0, 20.0),
            target: Vector3::new(25.0, 60.0, -10.0),
        }
    }

    /// Sets the sensor noise standard deviation. Zero, negative or
    /// non-finite values disable noise.
    pub fn with_noise(mut self, std_dev: f64) -> Self {
        self.noise_std = if std_dev.is_finite() && std_dev > 0.0 { std_dev } else { 0.0 };
        self
    }

    /// Records one stream of `len` samples.
    ///
    /// `stream` selects the per-stream RNG so streams are independent of each
    /// other and of how many streams are recorded.
    pub fn record(&self, key: &str, stream: u64, len: usize) -> Result<TrajectorySeries, ReplayError> {
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed
                .wrapping_mul(0x9e3779b97f4a7c15)
                .wrapping_add(stream),
        );
        let noise = Normal::new(0.0, self.noise_std).ok();
        let jitter = |rng: &mut ChaCha8Rng| match &noise {
            Some(n) => Vector3::new(n.sample(rng), n.sample(rng), n.sample(rng)),
            None => Vector3::zeros(),
        };

        let tips: Vec<Sample> = (0..len).map(|i| self.tip_at(i, len)).collect();

        let mut channels: Vec<(ChannelId, Vec<Sample>)> = Vec::new();

        channels.push((
            ChannelId::from(ChannelId::INSTRUMENT_TIP),
            tips.iter().map(|tip| tip + jitter(&mut rng)).collect(),
        ));

        for (name, offset) in INSTRUMENT_OFFSETS {
            let offset = Vector3::from(offset);
            channels.push((
                ChannelId::from(name),
                tips.iter().map(|tip| tip + offset + jitter(&mut rng)).collect(),
            ));
        }

        for (name, position) in HEAD_MARKERS {
            let position = Vector3::from(position);
            channels.push((
                ChannelId::from(name),
                (0..len).map(|_| position + jitter(&mut rng)).collect(),
            ));
        }

        TrajectorySeries::new(key, channels)
    }

    /// Records one stream per entry of `lengths`, keyed `synthetic-<n>`.
    pub fn record_session(&self, lengths: &[usize]) -> Result<Vec<TrajectorySeries>, ReplayError> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| self.record(&format!("synthetic-{}", i), i as u64, len))
            .collect()
    }

    /// Noise-free tip position at sample `i` of `len`.
    ///
    /// Insertion over the first 60%, a hold until 70%, withdrawal by half the
    /// depth over the rest.
    fn tip_at(&self, i: usize, len: usize) -> Vector3<f64> {
        let t = if len > 1 { i as f64 / (len - 1) as f64 } else { 1.0 };
        let depth = if t < 0.6 {
            t / 0.6
        } else if t < 0.7 {
            1.0
        } else {
            1.0 - 0.5 * (t - 0.7) / 0.3
        };
        let straight = self.entry.lerp(&self.target, depth);
        let bow = Vector3::new(4.0, 0.0, 0.0) * (std::f64::consts::PI * depth).sin();
        straight + bow
    }
}
