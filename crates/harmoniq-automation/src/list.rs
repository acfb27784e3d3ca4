use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use ringbuf::HeapRb;

use crate::config::{AutomationConfig, EmptyPassPolicy};
use crate::curve::{ControlEvent, ControlList, InterpolationStyle};
use crate::error::StateError;
use crate::history::{HistorySlot, UndoSink};
use crate::mode::{AtomicAutoState, AutoState};
use crate::node::{AutomationNode, DecodedNode};
use crate::parameter::{ParameterDescriptor, ParameterId};
use crate::record::{PassCommit, Recorder, SampleWriter};
use crate::signal::{Signal, Subscription};
use crate::time::{Superclock, TimeDomainProvider, TimePos};
use crate::touch::TouchTracker;

/// Fired once for every automation list constructed in the process.
pub fn automation_list_created() -> &'static Signal<ParameterId> {
    static CREATED: OnceLock<Signal<ParameterId>> = OnceLock::new();
    CREATED.get_or_init(Signal::new)
}

/// State shared with the audio thread. Atomics only.
#[derive(Debug, Default)]
pub(crate) struct RtState {
    pub mode: AtomicAutoState,
    pub touch: TouchTracker,
    pub dropped: AtomicU64,
}

impl RtState {
    #[inline]
    pub fn should_play_back(&self) -> bool {
        self.mode.load().plays_back(self.touch.touching())
    }

    #[inline]
    pub fn should_write(&self) -> bool {
        self.mode.load().writes(self.touch.touching())
    }
}

#[derive(Debug, Default)]
struct FreezeState {
    depth: u32,
    changed: bool,
}

/// Automation for one parameter: its curve, mode, touch state, recorder and
/// pending undo snapshot.
///
/// Methods taking `&self` may be called from the control thread. The audio
/// thread is limited to [`should_play_back`](Self::should_play_back),
/// [`should_write`](Self::should_write), [`touching`](Self::touching),
/// [`rt_eval`](Self::rt_eval) and the lane's [`SampleWriter`].
pub struct AutomationList {
    id: ParameterId,
    desc: ParameterDescriptor,
    time_domain: Arc<dyn TimeDomainProvider>,
    config: RwLock<AutomationConfig>,
    rt: Arc<RtState>,
    dropped_reported: AtomicU64,
    curve: RwLock<ControlList>,
    recorder: Mutex<Recorder>,
    writer: Mutex<Option<SampleWriter>>,
    history: Mutex<HistorySlot>,
    undo_sink: RwLock<Option<Arc<dyn UndoSink>>>,
    freeze: Mutex<FreezeState>,
    mode_changed: Signal<AutoState>,
    state_changed: Signal<()>,
}

impl AutomationList {
    pub fn new(
        id: ParameterId,
        desc: ParameterDescriptor,
        time_domain: Arc<dyn TimeDomainProvider>,
    ) -> Self {
        Self::with_config(id, desc, time_domain, AutomationConfig::default())
    }

    /// The sample queue is sized from `config` here; later config changes
    /// do not resize it.
    pub fn with_config(
        id: ParameterId,
        desc: ParameterDescriptor,
        time_domain: Arc<dyn TimeDomainProvider>,
        config: AutomationConfig,
    ) -> Self {
        let desc = desc.normalized();
        let ring = HeapRb::new(config.sample_queue_capacity.max(1));
        let (producer, consumer) = ring.split();
        let rt = Arc::new(RtState::default());
        let writer = SampleWriter::new(Arc::clone(&rt), producer, desc.clone());
        let list = Self {
            id,
            curve: RwLock::new(ControlList::new(desc.default_interpolation())),
            desc,
            time_domain,
            config: RwLock::new(config),
            rt,
            dropped_reported: AtomicU64::new(0),
            recorder: Mutex::new(Recorder::new(consumer)),
            writer: Mutex::new(Some(writer)),
            history: Mutex::new(HistorySlot::default()),
            undo_sink: RwLock::new(None),
            freeze: Mutex::new(FreezeState::default()),
            mode_changed: Signal::new(),
            state_changed: Signal::new(),
        };
        automation_list_created().emit(id);
        list
    }

    /// Builds a list from persisted state. A malformed node yields an empty
    /// `Off` lane together with the error.
    pub fn from_node(
        node: &AutomationNode,
        desc: ParameterDescriptor,
        time_domain: Arc<dyn TimeDomainProvider>,
    ) -> (Self, Option<StateError>) {
        let list = Self::new(node.id, desc, time_domain);
        let error = list.set_state(node).err();
        (list, error)
    }

    pub fn id(&self) -> ParameterId {
        self.id
    }

    pub fn descriptor(&self) -> &ParameterDescriptor {
        &self.desc
    }

    pub fn time_domain(&self) -> &Arc<dyn TimeDomainProvider> {
        &self.time_domain
    }

    pub fn config(&self) -> AutomationConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: AutomationConfig) {
        *self.config.write() = config;
    }

    pub fn set_undo_sink(&self, sink: Arc<dyn UndoSink>) {
        *self.undo_sink.write() = Some(sink);
    }

    /// Hands out the audio-thread sample writer. Only the first call
    /// returns it.
    pub fn take_writer(&self) -> Option<SampleWriter> {
        self.writer.lock().take()
    }

    pub fn subscribe_mode_changed(&self) -> Subscription<AutoState> {
        self.mode_changed.subscribe()
    }

    pub fn subscribe_state_changed(&self) -> Subscription<()> {
        self.state_changed.subscribe()
    }

    #[inline]
    pub fn automation_state(&self) -> AutoState {
        self.rt.mode.load()
    }

    #[inline]
    pub fn should_play_back(&self) -> bool {
        self.rt.should_play_back()
    }

    #[inline]
    pub fn should_write(&self) -> bool {
        self.rt.should_write()
    }

    #[inline]
    pub fn touching(&self) -> bool {
        self.rt.touch.touching()
    }

    #[inline]
    pub fn touch_count(&self) -> u32 {
        self.rt.touch.count()
    }

    pub fn writing(&self) -> bool {
        self.automation_state() == AutoState::Write
    }

    pub fn touch_enabled(&self) -> bool {
        self.automation_state().touch_enabled()
    }

    pub fn write_pass_active(&self) -> bool {
        self.recorder.lock().is_open()
    }

    /// Samples the audio thread could not queue because the ring was full.
    pub fn dropped_samples(&self) -> u64 {
        self.rt.dropped.load(Ordering::Relaxed)
    }

    pub fn set_automation_state(&self, state: AutoState) {
        self.finish_open_pass();
        self.finalize_history();
        let previous = self.rt.mode.load();
        self.rt.mode.store(state);
        if previous != state {
            tracing::debug!(parameter = %self.id, from = %previous, to = %state, "automation state changed");
        }
        self.mode_changed.emit(state);
    }

    pub fn start_touch(&self, when: TimePos) {
        if self.rt.touch.start() && self.touch_enabled() {
            self.start_write_pass(when);
        }
    }

    /// Releases one touch. When the last touch ends in Touch or Latch mode,
    /// the pass recorded during the touch is finished with the configured
    /// thinning factor.
    pub fn stop_touch(&self, when: TimePos) {
        if self.rt.touch.stop() && self.touch_enabled() {
            let thinning_factor = self.config.read().thinning_factor;
            self.write_pass_finished(when, thinning_factor);
        }
    }

    /// Opens a pass at `when`, finishing any open one there first. Samples
    /// the audio thread queued before the pass opened belong to it.
    pub fn start_write_pass(&self, when: TimePos) {
        let start = self.resolve(when);
        let mut recorder = self.recorder.lock();
        if recorder.is_open() {
            self.drain_locked(&mut recorder);
            let thinning_factor = self.config.read().thinning_factor;
            self.finish_locked(&mut recorder, start, thinning_factor);
        }
        if self.should_write() {
            self.snapshot_history(true);
        }
        recorder.open(start);
        self.drain_locked(&mut recorder);
    }

    pub fn write_pass_finished(&self, when: TimePos, thinning_factor: f64) {
        let end = self.resolve(when);
        let mut recorder = self.recorder.lock();
        self.drain_locked(&mut recorder);
        self.finish_locked(&mut recorder, end, thinning_factor);
    }

    /// Moves samples queued by the audio thread into the open pass. Call
    /// periodically from the control thread during long passes. Without an
    /// open pass the samples stay queued for the next one.
    pub fn collect_samples(&self) {
        let mut recorder = self.recorder.lock();
        if recorder.is_open() {
            self.drain_locked(&mut recorder);
        }
    }

    /// Stores a "before" snapshot unless one is already pending.
    ///
    /// Pass `need_lock = false` only while holding a read guard on this
    /// list's curve (e.g. inside [`with_curve`](Self::with_curve)).
    ///
    /// The history and curve locks are never held together except for the
    /// recursive read taken here when `need_lock` is false.
    pub fn snapshot_history(&self, need_lock: bool) {
        if need_lock {
            if self.history.lock().is_pending() {
                return;
            }
            let node = self.history_node(&self.curve.read());
            self.history.lock().store(node);
        } else {
            let mut history = self.history.lock();
            if !history.is_pending() {
                history.store(self.history_node(&self.curve.read_recursive()));
            }
        }
    }

    /// Drops the pending snapshot without recording an undo unit.
    pub fn clear_history(&self) {
        self.history.lock().take();
    }

    /// Takes the pending snapshot, if any.
    pub fn before(&self) -> Option<AutomationNode> {
        self.history.lock().take()
    }

    pub fn interpolation(&self) -> InterpolationStyle {
        self.curve.read().interpolation()
    }

    pub fn default_interpolation(&self) -> InterpolationStyle {
        self.desc.default_interpolation()
    }

    pub fn set_interpolation(&self, style: InterpolationStyle) {
        let changed = {
            let mut curve = self.curve.write();
            let changed = curve.interpolation() != style;
            curve.set_interpolation(style);
            changed
        };
        if changed {
            self.signal_changed();
        }
    }

    pub fn len(&self) -> usize {
        self.curve.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.curve.read().is_empty()
    }

    pub fn events(&self) -> Vec<ControlEvent> {
        self.curve.read().events().to_vec()
    }

    pub fn with_curve<R>(&self, f: impl FnOnce(&ControlList) -> R) -> R {
        f(&self.curve.read())
    }

    /// Edits the curve from the control thread as one undo unit. Values are
    /// clamped to the descriptor range afterwards.
    pub fn edit_curve<R>(&self, f: impl FnOnce(&mut ControlList) -> R) -> R {
        let pass_open = self.recorder.lock().is_open();
        self.snapshot_history(true);
        let result = {
            let mut curve = self.curve.write();
            let result = f(&mut curve);
            curve.clamp_values(&self.desc);
            result
        };
        self.signal_changed();
        if !pass_open {
            self.finalize_history();
        }
        result
    }

    pub fn eval(&self, when: TimePos) -> Option<f64> {
        let when = self.resolve(when);
        self.curve.read().eval(when)
    }

    /// Audio-thread evaluation. Returns `None` instead of waiting when the
    /// curve is being modified.
    #[inline]
    pub fn rt_eval(&self, when: Superclock) -> Option<f64> {
        self.curve.try_read()?.eval(when)
    }

    /// New list holding this list's points in `[start, end]`, rebased to 0.
    pub fn copy_range(&self, start: TimePos, end: TimePos) -> AutomationList {
        let (start, end) = (self.resolve(start), self.resolve(end));
        let copy = AutomationList::with_config(
            self.id,
            self.desc.clone(),
            Arc::clone(&self.time_domain),
            self.config(),
        );
        *copy.curve.write() = self.curve.read().copy_range(start, end);
        copy.rt.mode.store(self.automation_state());
        copy
    }

    pub fn curve_eq(&self, other: &AutomationList) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.curve.read();
        let theirs = other.curve.read();
        *mine == *theirs
    }

    /// Suspends `state_changed` notifications until the matching
    /// [`thaw`](Self::thaw).
    pub fn freeze(&self) {
        self.freeze.lock().depth += 1;
    }

    pub fn thaw(&self) {
        let emit = {
            let mut freeze = self.freeze.lock();
            if freeze.depth == 0 {
                return;
            }
            freeze.depth -= 1;
            freeze.depth == 0 && std::mem::take(&mut freeze.changed)
        };
        if emit {
            self.state_changed.emit(());
        }
    }

    /// Full persisted state, including the automation mode.
    pub fn get_state(&self) -> AutomationNode {
        AutomationNode::from_curve(self.id, Some(self.automation_state()), &self.curve.read())
    }

    /// Restores persisted state. On failure the lane is reset to an empty
    /// `Off` curve and the error is returned for the caller to report.
    pub fn set_state(&self, node: &AutomationNode) -> Result<(), StateError> {
        match node.decode(&self.desc) {
            Ok(decoded) => {
                self.apply_decoded(decoded);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(parameter = %self.id, %err, "discarding malformed automation state");
                self.reset();
                Err(err)
            }
        }
    }

    /// [`set_state`](Self::set_state) from the JSON form of a node.
    pub fn set_state_json(&self, text: &str) -> Result<(), StateError> {
        match AutomationNode::from_json(text) {
            Ok(node) => self.set_state(&node),
            Err(err) => {
                tracing::warn!(parameter = %self.id, %err, "discarding unreadable automation state");
                self.reset();
                Err(err)
            }
        }
    }

    /// Applies an undo/redo snapshot. Leaves the lane untouched on error.
    pub fn restore_snapshot(&self, node: &AutomationNode) -> Result<(), StateError> {
        let decoded = node.decode(&self.desc)?;
        self.apply_decoded(decoded);
        Ok(())
    }

    fn apply_decoded(&self, decoded: DecodedNode) {
        *self.curve.write() = decoded.curve;
        if let Some(state) = decoded.state {
            let previous = self.rt.mode.load();
            self.rt.mode.store(state);
            if previous != state {
                self.mode_changed.emit(state);
            }
        }
        self.signal_changed();
    }

    fn reset(&self) {
        self.clear_history();
        *self.curve.write() = ControlList::new(self.desc.default_interpolation());
        self.rt.mode.store(AutoState::Off);
        self.mode_changed.emit(AutoState::Off);
        self.signal_changed();
    }

    fn resolve(&self, when: TimePos) -> Superclock {
        self.time_domain.superclock_at(when)
    }

    fn history_node(&self, curve: &ControlList) -> AutomationNode {
        AutomationNode::from_curve(self.id, None, curve)
    }

    fn finish_open_pass(&self) {
        let mut recorder = self.recorder.lock();
        self.drain_locked(&mut recorder);
        if let Some(end) = recorder.open_end() {
            let thinning_factor = self.config.read().thinning_factor;
            self.finish_locked(&mut recorder, end, thinning_factor);
        }
    }

    fn drain_locked(&self, recorder: &mut Recorder) {
        let discarded = recorder.drain();
        if discarded > 0 {
            tracing::debug!(parameter = %self.id, discarded, "dropped samples recorded outside a write pass");
        }
        let dropped = self.rt.dropped.load(Ordering::Relaxed);
        let reported = self.dropped_reported.swap(dropped, Ordering::Relaxed);
        if dropped > reported {
            tracing::warn!(
                parameter = %self.id,
                dropped = dropped - reported,
                "automation sample queue overflowed"
            );
        }
    }

    fn finish_locked(&self, recorder: &mut Recorder, end: Superclock, thinning_factor: f64) {
        let commits = recorder.finish(end, thinning_factor);
        if commits.is_empty() {
            return;
        }
        self.merge(commits);
        self.finalize_history();
    }

    fn merge(&self, commits: Vec<PassCommit>) {
        let policy = self.config.read().empty_pass;
        let mut changed = false;
        {
            let mut curve = self.curve.write();
            for commit in commits {
                if commit.events.is_empty() {
                    if policy == EmptyPassPolicy::ClearRange {
                        changed |= curve.erase_range(commit.start, commit.end) > 0;
                    }
                    continue;
                }
                tracing::debug!(
                    parameter = %self.id,
                    start = commit.start,
                    end = commit.end,
                    points = commit.events.len(),
                    "merging write pass"
                );
                curve.replace_range(commit.start, commit.end, commit.events);
                changed = true;
            }
        }
        if changed {
            self.signal_changed();
        }
    }

    fn finalize_history(&self) {
        if !self.history.lock().is_pending() {
            return;
        }
        let after = self.history_node(&self.curve.read());
        let Some(command) = self.history.lock().finish(after) else {
            return;
        };
        match self.undo_sink.read().as_ref() {
            Some(sink) => sink.push(command),
            None => tracing::debug!(parameter = %self.id, "no undo sink; automation change not recorded"),
        }
    }

    fn signal_changed(&self) {
        {
            let mut freeze = self.freeze.lock();
            if freeze.depth > 0 {
                freeze.changed = true;
                return;
            }
        }
        self.state_changed.emit(());
    }
}

impl Drop for AutomationList {
    fn drop(&mut self) {
        if self.history.get_mut().take().is_some() {
            tracing::debug!(parameter = %self.id, "discarding pending automation snapshot");
        }
    }
}

impl fmt::Debug for AutomationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationList")
            .field("id", &self.id)
            .field("state", &self.automation_state())
            .field("touching", &self.touch_count())
            .field("points", &self.len())
            .finish()
    }
}
