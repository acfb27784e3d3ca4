use crossbeam_channel::Sender;

use crate::error::StateError;
use crate::list::AutomationList;
use crate::node::AutomationNode;
use crate::parameter::ParameterId;

/// Undoable change of one lane's curve, stored as before/after snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct MementoCommand {
    pub parameter: ParameterId,
    pub before: AutomationNode,
    pub after: AutomationNode,
}

impl MementoCommand {
    pub fn label(&self) -> &'static str {
        "Automation"
    }

    pub fn undo(&self, list: &AutomationList) -> Result<(), StateError> {
        list.restore_snapshot(&self.before)
    }

    pub fn redo(&self, list: &AutomationList) -> Result<(), StateError> {
        list.restore_snapshot(&self.after)
    }
}

/// Receives finished undo units. The undo stack itself lives elsewhere.
pub trait UndoSink: Send + Sync {
    fn push(&self, command: MementoCommand);
}

impl UndoSink for Sender<MementoCommand> {
    fn push(&self, command: MementoCommand) {
        if self.send(command).is_err() {
            tracing::debug!("undo receiver dropped; discarding automation history");
        }
    }
}

impl<F> UndoSink for F
where
    F: Fn(MementoCommand) + Send + Sync,
{
    fn push(&self, command: MementoCommand) {
        self(command)
    }
}

/// The single pending "before" snapshot of a lane.
#[derive(Debug, Default)]
pub(crate) struct HistorySlot {
    before: Option<AutomationNode>,
}

impl HistorySlot {
    pub fn is_pending(&self) -> bool {
        self.before.is_some()
    }

    /// Stores `before` unless a snapshot is already pending.
    pub fn store(&mut self, before: AutomationNode) -> bool {
        if self.before.is_some() {
            return false;
        }
        self.before = Some(before);
        true
    }

    pub fn take(&mut self) -> Option<AutomationNode> {
        self.before.take()
    }

    /// Pairs the pending snapshot with `after`. Yields nothing when there was
    /// no snapshot or the curve did not change.
    pub fn finish(&mut self, after: AutomationNode) -> Option<MementoCommand> {
        let before = self.before.take()?;
        if before.same_curve(&after) {
            return None;
        }
        Some(MementoCommand {
            parameter: after.id,
            before,
            after,
        })
    }
}
