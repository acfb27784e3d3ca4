use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Recording/playback mode of an automation lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AutoState {
    #[default]
    Off,
    Play,
    Write,
    Touch,
    Latch,
}

impl AutoState {
    pub const ALL: [AutoState; 5] = [
        AutoState::Off,
        AutoState::Play,
        AutoState::Write,
        AutoState::Touch,
        AutoState::Latch,
    ];

    #[inline]
    pub fn touch_enabled(self) -> bool {
        matches!(self, AutoState::Touch | AutoState::Latch)
    }

    /// Playback decision for this mode given the current touch state.
    #[inline]
    pub fn plays_back(self, touching: bool) -> bool {
        self == AutoState::Play || (self.touch_enabled() && !touching)
    }

    /// Recording decision for this mode given the current touch state.
    #[inline]
    pub fn writes(self, touching: bool) -> bool {
        self == AutoState::Write || (self.touch_enabled() && touching)
    }

    pub fn name(self) -> &'static str {
        match self {
            AutoState::Off => "Off",
            AutoState::Play => "Play",
            AutoState::Write => "Write",
            AutoState::Touch => "Touch",
            AutoState::Latch => "Latch",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            AutoState::Off => "OFF",
            AutoState::Play => "PLY",
            AutoState::Write => "WRT",
            AutoState::Touch => "TCH",
            AutoState::Latch => "LCH",
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            AutoState::Off => 0,
            AutoState::Play => 1,
            AutoState::Write => 2,
            AutoState::Touch => 3,
            AutoState::Latch => 4,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => AutoState::Play,
            2 => AutoState::Write,
            3 => AutoState::Touch,
            4 => AutoState::Latch,
            _ => AutoState::Off,
        }
    }
}

impl fmt::Display for AutoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AutoState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutoState::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StateError::UnknownState(s.to_owned()))
    }
}

/// Lock-free cell holding an [`AutoState`], readable from the audio thread.
#[derive(Debug, Default)]
pub struct AtomicAutoState(AtomicU8);

impl AtomicAutoState {
    pub fn new(state: AutoState) -> Self {
        Self(AtomicU8::new(state.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> AutoState {
        AutoState::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, state: AutoState) {
        self.0.store(state.to_bits(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_per_mode() {
        assert!(!AutoState::Off.plays_back(false));
        assert!(!AutoState::Off.writes(true));

        assert!(AutoState::Play.plays_back(true));
        assert!(!AutoState::Play.writes(true));

        assert!(AutoState::Write.writes(false));
        assert!(!AutoState::Write.plays_back(false));

        for mode in [AutoState::Touch, AutoState::Latch] {
            assert!(mode.plays_back(false));
            assert!(!mode.writes(false));
            assert!(mode.writes(true));
            assert!(!mode.plays_back(true));
        }
    }

    #[test]
    fn playback_and_write_are_exclusive() {
        for mode in AutoState::ALL {
            for touching in [false, true] {
                assert!(!(mode.plays_back(touching) && mode.writes(touching)));
            }
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("touch".parse::<AutoState>().unwrap(), AutoState::Touch);
        assert_eq!(AutoState::Latch.to_string(), "Latch");
        assert_eq!(AutoState::Write.abbreviation(), "WRT");
        assert!(matches!(
            "Trim".parse::<AutoState>(),
            Err(StateError::UnknownState(_))
        ));
    }

    #[test]
    fn atomic_cell_round_trips() {
        let cell = AtomicAutoState::new(AutoState::Play);
        for mode in AutoState::ALL {
            cell.store(mode);
            assert_eq!(cell.load(), mode);
        }
    }
}
