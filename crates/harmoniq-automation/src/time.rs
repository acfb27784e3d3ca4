//! Superclock time base.
//!
//! Automation positions are stored as superclock ticks: a fixed-rate integer
//! clock that does not depend on the device sample rate. The default tick
//! rate is divisible by every common sample rate, so converting a sample
//! position to ticks and back is exact.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::TimeError;

pub type Superclock = i64;

/// 2^10 * 3^2 * 5^4 * 7^2: divisible by 44.1k, 48k and their multiples.
pub const DEFAULT_SUPERCLOCK_TICKS_PER_SECOND: Superclock = 282_240_000;

/// Musical ticks per quarter note used by [`TimePos::Beats`].
pub const TICKS_PER_BEAT: i64 = 1920;

static TICKS_PER_SECOND: AtomicI64 = AtomicI64::new(DEFAULT_SUPERCLOCK_TICKS_PER_SECOND);
static SAMPLE_RATE_PROVIDER: OnceLock<fn() -> u32> = OnceLock::new();

#[inline]
pub fn superclock_ticks_per_second() -> Superclock {
    TICKS_PER_SECOND.load(Ordering::Relaxed)
}

/// Changes the global tick rate. Call once at startup, before any positions
/// are created; stored positions are not rescaled.
pub fn set_superclock_ticks_per_second(ticks: Superclock) {
    if ticks > 0 {
        TICKS_PER_SECOND.store(ticks, Ordering::Relaxed);
    }
}

/// Installs the process-wide sample-rate source. Only the first call wins.
pub fn set_sample_rate_provider(provider: fn() -> u32) -> Result<(), TimeError> {
    SAMPLE_RATE_PROVIDER
        .set(provider)
        .map_err(|_| TimeError::ProviderAlreadySet)
}

/// Running sample rate, or `0` when no provider has been installed.
#[inline]
pub fn current_sample_rate() -> u32 {
    SAMPLE_RATE_PROVIDER.get().map_or(0, |provider| provider())
}

#[inline]
pub fn superclock_to_samples(ticks: Superclock, sample_rate: i64) -> i64 {
    if sample_rate <= 0 {
        return 0;
    }
    saturate(int_div_round(
        ticks as i128 * sample_rate as i128,
        superclock_ticks_per_second() as i128,
    ))
}

#[inline]
pub fn samples_to_superclock(samples: i64, sample_rate: i64) -> Superclock {
    if sample_rate <= 0 {
        return 0;
    }
    saturate(int_div_round(
        samples as i128 * superclock_ticks_per_second() as i128,
        sample_rate as i128,
    ))
}

/// Superclock ticks spanned by one sample at `sample_rate`.
pub fn superclock_per_sample(sample_rate: i64) -> Superclock {
    samples_to_superclock(1, sample_rate)
}

/// `to - from` without overflow for any pair of positions.
#[inline]
pub(crate) fn distance(from: Superclock, to: Superclock) -> f64 {
    (i128::from(to) - i128::from(from)) as f64
}

fn int_div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if (numerator < 0) == (denominator < 0) {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// A position on the project timeline, in either time domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePos {
    Audio(Superclock),
    Beats(i64),
}

impl TimePos {
    pub fn from_samples(samples: i64, sample_rate: i64) -> Self {
        TimePos::Audio(samples_to_superclock(samples, sample_rate))
    }

    pub fn from_seconds(seconds: f64) -> Self {
        TimePos::Audio((seconds * superclock_ticks_per_second() as f64).round() as Superclock)
    }
}

impl Default for TimePos {
    fn default() -> Self {
        TimePos::Audio(0)
    }
}

impl From<Superclock> for TimePos {
    fn from(ticks: Superclock) -> Self {
        TimePos::Audio(ticks)
    }
}

/// Resolves timeline positions to superclock for a particular project.
pub trait TimeDomainProvider: Send + Sync {
    fn superclock_at(&self, pos: TimePos) -> Superclock;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo(pub f64);

impl Tempo {
    #[inline]
    pub fn beats_per_minute(&self) -> f64 {
        self.0
    }

    #[inline]
    pub fn superclock_per_beat(&self) -> f64 {
        if self.0 <= 0.0 {
            return 0.0;
        }
        superclock_ticks_per_second() as f64 * 60.0 / self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(120.0)
    }
}

/// Time-domain provider for a project with a single, fixed tempo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstantTempo {
    pub tempo: Tempo,
}

impl ConstantTempo {
    pub fn new(tempo: Tempo) -> Self {
        Self { tempo }
    }
}

impl TimeDomainProvider for ConstantTempo {
    fn superclock_at(&self, pos: TimePos) -> Superclock {
        match pos {
            TimePos::Audio(ticks) => ticks,
            TimePos::Beats(ticks) => {
                let beats = ticks as f64 / TICKS_PER_BEAT as f64;
                (beats * self.tempo.superclock_per_beat()).round() as Superclock
            }
        }
    }
}
