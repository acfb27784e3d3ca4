//! Harmoniq Automation
//! ===================
//! Parameter automation for Harmoniq Studio: records, stores and plays back
//! the time-varying value of a single control parameter against the
//! transport, and mediates between the audio thread and the control/UI
//! thread.
//!
//! The audio thread only ever touches atomics, a try-lock read of the curve
//! and a lock-free sample queue. Everything that allocates or blocks (merging
//! recorded passes, undo snapshots, notifications) happens on the control
//! thread.
//!
//! ```
//! use std::sync::Arc;
//! use harmoniq_automation::{
//!     AutoState, AutomationList, ConstantTempo, ParameterDescriptor, ParameterId, TimePos,
//! };
//!
//! let list = AutomationList::new(
//!     ParameterId::new(0, 0, 1),
//!     ParameterDescriptor::new(0.0, 1.0, 0.5),
//!     Arc::new(ConstantTempo::default()),
//! );
//! let mut writer = list.take_writer().expect("writer");
//!
//! list.set_automation_state(AutoState::Touch);
//! list.start_touch(TimePos::Audio(0));
//! writer.write(0, 0.25);
//! writer.write(1_000, 0.75);
//! list.stop_touch(TimePos::Audio(1_000));
//!
//! assert_eq!(list.len(), 2);
//! assert!(list.should_play_back());
//! ```

pub mod config;
pub mod curve;
pub mod error;
pub mod history;
pub mod list;
pub mod mode;
pub mod node;
pub mod parameter;
pub mod record;
pub mod signal;
pub mod time;
pub mod touch;

pub use config::{AutomationConfig, EmptyPassPolicy};
pub use curve::{ControlEvent, ControlList, InterpolationStyle};
pub use error::{StateError, TimeError};
pub use history::{MementoCommand, UndoSink};
pub use list::{automation_list_created, AutomationList};
pub use mode::{AtomicAutoState, AutoState};
pub use node::{AutomationNode, CURRENT_STATE_VERSION};
pub use parameter::{ParameterDescriptor, ParameterId};
pub use record::{thin, PassCommit, SampleWriter, WritePass};
pub use signal::{Signal, Subscription};
pub use time::{
    current_sample_rate, samples_to_superclock, set_sample_rate_provider,
    set_superclock_ticks_per_second, superclock_per_sample, superclock_ticks_per_second,
    superclock_to_samples, ConstantTempo, Superclock, Tempo, TimeDomainProvider, TimePos,
    TICKS_PER_BEAT,
};
pub use touch::TouchTracker;
