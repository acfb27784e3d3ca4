use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::parameter::ParameterDescriptor;
use crate::time::{distance, Superclock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationStyle {
    Discrete,
    #[default]
    Linear,
    Logarithmic,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    pub when: Superclock,
    pub value: f64,
}

impl ControlEvent {
    pub fn new(when: Superclock, value: f64) -> Self {
        Self { when, value }
    }
}

/// Time-ordered list of control points with at most one point per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlList {
    events: Vec<ControlEvent>,
    interpolation: InterpolationStyle,
}

impl ControlList {
    pub fn new(interpolation: InterpolationStyle) -> Self {
        Self {
            events: Vec::new(),
            interpolation,
        }
    }

    /// Builds a list from unordered events; later duplicates win.
    pub fn from_events(
        interpolation: InterpolationStyle,
        events: impl IntoIterator<Item = ControlEvent>,
    ) -> Self {
        let mut list = Self::new(interpolation);
        for event in events {
            list.add(event.when, event.value);
        }
        list
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[ControlEvent] {
        &self.events
    }

    pub fn interpolation(&self) -> InterpolationStyle {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: InterpolationStyle) {
        self.interpolation = interpolation;
    }

    pub fn clamp_values(&mut self, desc: &ParameterDescriptor) {
        for event in &mut self.events {
            event.value = desc.clamp(event.value);
        }
    }

    pub fn add(&mut self, when: Superclock, value: f64) {
        match self.events.binary_search_by_key(&when, |event| event.when) {
            Ok(index) => self.events[index].value = value,
            Err(index) => self.events.insert(index, ControlEvent::new(when, value)),
        }
    }

    pub fn erase(&mut self, when: Superclock) -> bool {
        match self.events.binary_search_by_key(&when, |event| event.when) {
            Ok(index) => {
                self.events.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Removes every point in `[start, end]`, returning how many were removed.
    pub fn erase_range(&mut self, start: Superclock, end: Superclock) -> usize {
        let range = self.range_indices(start, end);
        let removed = range.len();
        self.events.drain(range);
        removed
    }

    /// Points in `[start, end]`.
    pub fn range(&self, start: Superclock, end: Superclock) -> &[ControlEvent] {
        &self.events[self.range_indices(start, end)]
    }

    pub fn range_indices(&self, start: Superclock, end: Superclock) -> Range<usize> {
        if start > end {
            return 0..0;
        }
        let start_index = self.events.partition_point(|event| event.when < start);
        let end_index = self.events.partition_point(|event| event.when <= end);
        start_index..end_index
    }

    /// Swaps the points in `[start, end]` for `replacement`, which must be
    /// sorted, unique, and inside the window.
    pub fn replace_range(
        &mut self,
        start: Superclock,
        end: Superclock,
        replacement: impl IntoIterator<Item = ControlEvent>,
    ) {
        let range = self.range_indices(start, end);
        self.events.splice(range, replacement);
    }

    /// Copy of the points in `[start, end]`, shifted so `start` becomes zero.
    /// Offsets beyond the superclock range saturate.
    pub fn copy_range(&self, start: Superclock, end: Superclock) -> ControlList {
        ControlList {
            events: self
                .range(start, end)
                .iter()
                .map(|event| ControlEvent::new(event.when.saturating_sub(start), event.value))
                .collect(),
            interpolation: self.interpolation,
        }
    }

    pub fn eval(&self, when: Superclock) -> Option<f64> {
        let first = self.events.first()?;
        if when <= first.when {
            return Some(first.value);
        }

        let index = self.events.partition_point(|event| event.when <= when);
        let prev = &self.events[index - 1];
        if prev.when == when || index == self.events.len() {
            return Some(prev.value);
        }

        let next = &self.events[index];
        let t = (distance(prev.when, when) / distance(prev.when, next.when)).clamp(0.0, 1.0);
        Some(match self.interpolation {
            InterpolationStyle::Discrete => prev.value,
            InterpolationStyle::Linear => lerp(prev.value, next.value, t),
            InterpolationStyle::Logarithmic if prev.value > 0.0 && next.value > 0.0 => {
                lerp(prev.value.ln(), next.value.ln(), t).exp()
            }
            InterpolationStyle::Logarithmic => lerp(prev.value, next.value, t),
            InterpolationStyle::Exponential => lerp(prev.value, next.value, t * t),
        })
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(points: &[(Superclock, f64)]) -> ControlList {
        ControlList::from_events(
            InterpolationStyle::Linear,
            points.iter().map(|&(when, value)| ControlEvent::new(when, value)),
        )
    }

    fn times(list: &ControlList) -> Vec<Superclock> {
        list.events().iter().map(|event| event.when).collect()
    }

    #[test]
    fn inserts_points_sorted() {
        let curve = list(&[(32, 0.5), (0, 0.0), (64, 1.0)]);
        assert_eq!(times(&curve), vec![0, 32, 64]);
    }

    #[test]
    fn overwrites_existing_position() {
        let curve = list(&[(0, 0.0), (0, 1.0)]);
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.eval(0), Some(1.0));
    }

    #[test]
    fn linear_interpolation() {
        let curve = list(&[(0, 0.0), (10, 1.0)]);
        assert!((curve.eval(5).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(curve.eval(10), Some(1.0));
        assert_eq!(curve.eval(-5), Some(0.0));
        assert_eq!(curve.eval(50), Some(1.0));
    }

    #[test]
    fn discrete_holds_previous_value() {
        let mut curve = list(&[(0, 0.25), (32, 0.75)]);
        curve.set_interpolation(InterpolationStyle::Discrete);
        assert_eq!(curve.eval(31), Some(0.25));
        assert_eq!(curve.eval(32), Some(0.75));
    }

    #[test]
    fn logarithmic_interpolates_geometrically() {
        let mut curve = list(&[(0, 1.0), (10, 100.0)]);
        curve.set_interpolation(InterpolationStyle::Logarithmic);
        assert!((curve.eval(5).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_positions_do_not_overflow() {
        let curve = list(&[(i64::MIN, 0.0), (i64::MAX, 1.0)]);
        assert!((curve.eval(0).unwrap() - 0.5).abs() < 1e-9);

        let copy = curve.copy_range(-1, i64::MAX);
        assert_eq!(times(&copy), vec![i64::MAX]);
        assert_eq!(copy.eval(0), Some(1.0));
    }

    #[test]
    fn empty_list_has_no_value() {
        assert_eq!(ControlList::default().eval(0), None);
    }

    #[test]
    fn range_is_inclusive() {
        let mut curve = list(&[(0, 0.0), (10, 0.1), (20, 0.2), (30, 0.3)]);
        assert_eq!(curve.range(10, 20).len(), 2);
        assert!(curve.range(20, 10).is_empty());
        assert_eq!(curve.erase_range(10, 20), 2);
        assert_eq!(times(&curve), vec![0, 30]);
        assert!(curve.erase(30));
        assert!(!curve.erase(30));
    }

    #[test]
    fn replace_range_keeps_outside_points() {
        let mut curve = list(&[(0, 0.0), (10, 0.1), (20, 0.2), (30, 0.3)]);
        curve.replace_range(
            5,
            25,
            [ControlEvent::new(5, 0.9), ControlEvent::new(25, 0.8)],
        );
        assert_eq!(times(&curve), vec![0, 5, 25, 30]);
        assert_eq!(curve.eval(30), Some(0.3));
    }

    #[test]
    fn copy_range_rebases_times() {
        let curve = list(&[(0, 0.0), (10, 0.1), (20, 0.2)]);
        let copy = curve.copy_range(10, 20);
        assert_eq!(times(&copy), vec![0, 10]);
        assert_eq!(copy.eval(0), Some(0.1));
    }
}
