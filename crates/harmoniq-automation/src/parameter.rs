use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curve::InterpolationStyle;

/// Identity of an automatable parameter within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterId {
    pub kind: u32,
    pub channel: u8,
    pub index: u32,
}

impl ParameterId {
    pub const fn new(kind: u32, channel: u8, index: u32) -> Self {
        Self {
            kind,
            channel,
            index,
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.channel, self.index)
    }
}

/// Value range and behaviour hints for a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub lower: f64,
    pub upper: f64,
    pub normal: f64,
    #[serde(default)]
    pub toggled: bool,
    #[serde(default)]
    pub logarithmic: bool,
}

impl ParameterDescriptor {
    pub fn new(lower: f64, upper: f64, normal: f64) -> Self {
        Self {
            lower,
            upper,
            normal,
            toggled: false,
            logarithmic: false,
        }
        .normalized()
    }

    /// Orders the bounds, replaces a NaN bound with the other one and pulls
    /// `normal` into range.
    pub fn normalized(mut self) -> Self {
        let (lower, upper) = match (self.lower.is_nan(), self.upper.is_nan()) {
            (true, true) => (0.0, 1.0),
            (true, false) => (self.upper, self.upper),
            (false, true) => (self.lower, self.lower),
            (false, false) if self.lower <= self.upper => (self.lower, self.upper),
            (false, false) => (self.upper, self.lower),
        };
        self.lower = lower;
        self.upper = upper;
        self.normal = self.clamp(self.normal);
        self
    }

    pub fn toggle() -> Self {
        Self {
            toggled: true,
            ..Self::new(0.0, 1.0, 0.0)
        }
    }

    pub fn with_logarithmic(mut self, logarithmic: bool) -> Self {
        self.logarithmic = logarithmic;
        self
    }

    /// Clamps `value` into range. Never panics, even on inverted or NaN
    /// bounds; a NaN value maps to the lower bound.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        let (lower, upper) = if self.lower <= self.upper {
            (self.lower, self.upper)
        } else {
            (self.upper, self.lower)
        };
        value.max(lower).min(upper)
    }

    pub fn default_interpolation(&self) -> InterpolationStyle {
        if self.toggled {
            InterpolationStyle::Discrete
        } else if self.logarithmic {
            InterpolationStyle::Logarithmic
        } else {
            InterpolationStyle::Linear
        }
    }
}

impl Default for ParameterDescriptor {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_inverted_bounds() {
        let desc = ParameterDescriptor::new(2.0, -2.0, 5.0);
        assert_eq!(desc.lower, -2.0);
        assert_eq!(desc.upper, 2.0);
        assert_eq!(desc.normal, 2.0);
    }

    #[test]
    fn nan_bounds_do_not_panic() {
        let desc = ParameterDescriptor::new(f64::NAN, 1.0, 0.5);
        assert_eq!((desc.lower, desc.upper), (1.0, 1.0));
        assert_eq!(desc.normal, 1.0);

        let desc = ParameterDescriptor::new(f64::NAN, f64::NAN, f64::NAN);
        assert_eq!((desc.lower, desc.upper), (0.0, 1.0));
        assert_eq!(desc.normal, 0.0);
    }

    #[test]
    fn clamp_tolerates_unnormalized_bounds() {
        let desc: ParameterDescriptor =
            serde_json::from_str(r#"{ "lower": 1.0, "upper": 0.0, "normal": 0.5 }"#).unwrap();
        assert_eq!(desc.clamp(0.5), 0.5);
        assert_eq!(desc.clamp(3.0), 1.0);
        assert_eq!(desc.clamp(-3.0), 0.0);
        assert_eq!(desc.clamp(f64::NAN), 0.0);

        let normalized = desc.normalized();
        assert_eq!((normalized.lower, normalized.upper), (0.0, 1.0));
    }

    #[test]
    fn interpolation_follows_descriptor() {
        assert_eq!(
            ParameterDescriptor::toggle().default_interpolation(),
            InterpolationStyle::Discrete
        );
        assert_eq!(
            ParameterDescriptor::new(1e-5, 2.0, 1.0)
                .with_logarithmic(true)
                .default_interpolation(),
            InterpolationStyle::Logarithmic
        );
        assert_eq!(
            ParameterDescriptor::default().default_interpolation(),
            InterpolationStyle::Linear
        );
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(ParameterId::new(1, 0, 7).to_string(), "1/0/7");
    }
}
