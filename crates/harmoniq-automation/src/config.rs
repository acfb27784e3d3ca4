use serde::{Deserialize, Serialize};

/// What a write pass that recorded nothing does to the curve it covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPassPolicy {
    /// Leave existing points alone.
    #[default]
    Preserve,
    /// Erase existing points inside the pass window.
    ClearRange,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Thinning tolerance applied when a touch ends. Zero keeps every sample.
    pub thinning_factor: f64,
    /// Capacity of the audio-to-control sample queue.
    pub sample_queue_capacity: usize,
    pub empty_pass: EmptyPassPolicy,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            thinning_factor: 0.0,
            sample_queue_capacity: 4096,
            empty_pass: EmptyPassPolicy::Preserve,
        }
    }
}
