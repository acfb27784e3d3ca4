//! Serialized form of an automation lane.
//!
//! The same node type is used for project persistence and for undo
//! snapshots; history snapshots leave `state` empty so undo restores the
//! curve without touching the lane's mode.

use serde::{Deserialize, Serialize};

use crate::curve::{ControlEvent, ControlList, InterpolationStyle};
use crate::error::StateError;
use crate::mode::AutoState;
use crate::parameter::{ParameterDescriptor, ParameterId};
use crate::time::Superclock;

/// Version 1 predates the `interpolation` field.
pub const CURRENT_STATE_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationNode {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub id: ParameterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<InterpolationStyle>,
    pub events: Vec<(Superclock, f64)>,
}

/// Lane contents recovered from a node.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNode {
    pub state: Option<AutoState>,
    pub curve: ControlList,
}

impl AutomationNode {
    pub fn from_curve(id: ParameterId, state: Option<AutoState>, curve: &ControlList) -> Self {
        Self {
            version: CURRENT_STATE_VERSION,
            id,
            state: state.map(|state| state.name().to_owned()),
            interpolation: Some(curve.interpolation()),
            events: curve
                .events()
                .iter()
                .map(|event| (event.when, event.value))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether two nodes describe the same curve, ignoring mode and version.
    pub fn same_curve(&self, other: &AutomationNode) -> bool {
        self.interpolation == other.interpolation && self.events == other.events
    }

    pub fn decode(&self, desc: &ParameterDescriptor) -> Result<DecodedNode, StateError> {
        if self.version > CURRENT_STATE_VERSION {
            tracing::warn!(
                version = self.version,
                parameter = %self.id,
                "reading automation written by a newer version"
            );
        }

        let state = self
            .state
            .as_deref()
            .map(str::parse::<AutoState>)
            .transpose()?;

        let interpolation = match self.interpolation {
            Some(style) => style,
            None if self.version < 2 => desc.default_interpolation(),
            None => return Err(StateError::MissingField("interpolation")),
        };

        let mut events = Vec::with_capacity(self.events.len());
        for (index, &(when, value)) in self.events.iter().enumerate() {
            if !value.is_finite() {
                return Err(StateError::InvalidEvent {
                    index,
                    reason: "value is not finite",
                });
            }
            events.push(ControlEvent::new(when, desc.clamp(value)));
        }

        Ok(DecodedNode {
            state,
            curve: ControlList::from_events(interpolation, events),
        })
    }
}
