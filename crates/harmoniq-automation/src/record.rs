//! Write-pass recording.
//!
//! The audio thread pushes samples through a [`SampleWriter`] into a
//! pre-allocated ring. The control thread drains the ring into the open
//! [`WritePass`] and, when the pass finishes, thins the samples and hands
//! them to the lane as [`PassCommit`]s to merge into the curve.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ringbuf::{HeapConsumer, HeapProducer};

use crate::curve::ControlEvent;
use crate::list::RtState;
use crate::parameter::ParameterDescriptor;
use crate::time::{distance, Superclock};

/// Audio-thread handle for recording samples into a lane.
///
/// Never blocks and never allocates. There is one writer per lane; obtain it
/// with [`AutomationList::take_writer`](crate::AutomationList::take_writer).
pub struct SampleWriter {
    rt: Arc<RtState>,
    producer: HeapProducer<ControlEvent>,
    desc: ParameterDescriptor,
}

impl SampleWriter {
    pub(crate) fn new(
        rt: Arc<RtState>,
        producer: HeapProducer<ControlEvent>,
        desc: ParameterDescriptor,
    ) -> Self {
        Self { rt, producer, desc }
    }

    #[inline]
    pub fn should_write(&self) -> bool {
        self.rt.should_write()
    }

    #[inline]
    pub fn should_play_back(&self) -> bool {
        self.rt.should_play_back()
    }

    /// Queues `value` at `when` if the lane is currently recording.
    /// Returns whether the sample was queued.
    #[inline]
    pub fn write(&mut self, when: Superclock, value: f64) -> bool {
        if !value.is_finite() || !self.rt.should_write() {
            return false;
        }
        let event = ControlEvent::new(when, self.desc.clamp(value));
        if self.producer.push(event).is_err() {
            self.rt.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }
}

/// Samples collected during one contiguous recording interval.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePass {
    start: Superclock,
    samples: Vec<ControlEvent>,
}

impl WritePass {
    pub fn new(start: Superclock) -> Self {
        Self {
            start,
            samples: Vec::new(),
        }
    }

    pub fn start(&self) -> Superclock {
        self.start
    }

    pub fn samples(&self) -> &[ControlEvent] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends a sample, handing it back if it lies before the previous one.
    pub fn push(&mut self, event: ControlEvent) -> Result<(), ControlEvent> {
        if let Some(last) = self.samples.last() {
            if event.when < last.when {
                return Err(event);
            }
        }
        self.samples.push(event);
        Ok(())
    }

    pub fn into_commit(self, end: Superclock, thinning_factor: f64) -> PassCommit {
        let start = self
            .samples
            .first()
            .map_or(self.start, |first| first.when.min(self.start));
        let end = self
            .samples
            .last()
            .map_or(end, |last| last.when.max(end))
            .max(start);

        let mut events: Vec<ControlEvent> = Vec::with_capacity(self.samples.len());
        for sample in self.samples {
            match events.last_mut() {
                Some(last) if last.when == sample.when => *last = sample,
                _ => events.push(sample),
            }
        }

        PassCommit {
            start,
            end,
            events: thin(&events, thinning_factor),
        }
    }
}

/// A finished pass ready to be merged over `[start, end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PassCommit {
    pub start: Superclock,
    pub end: Superclock,
    pub events: Vec<ControlEvent>,
}

/// Drops interior samples that lie within `tolerance` of the straight line
/// between the previously kept sample and the following one. The first and
/// last samples are always kept; a tolerance of zero keeps everything.
pub fn thin(events: &[ControlEvent], tolerance: f64) -> Vec<ControlEvent> {
    if tolerance <= 0.0 || events.len() < 3 {
        return events.to_vec();
    }

    let mut kept = Vec::with_capacity(events.len());
    let mut prev = events[0];
    kept.push(prev);
    for window in events[1..].windows(2) {
        let (current, next) = (window[0], window[1]);
        let span = distance(prev.when, next.when);
        let expected = if span <= 0.0 {
            prev.value
        } else {
            let t = distance(prev.when, current.when) / span;
            prev.value + (next.value - prev.value) * t
        };
        if (current.value - expected).abs() >= tolerance {
            kept.push(current);
            prev = current;
        }
    }
    kept.extend(events.last().copied());
    kept
}

/// Control-thread side of the sample queue plus the open pass.
pub(crate) struct Recorder {
    consumer: HeapConsumer<ControlEvent>,
    pass: Option<WritePass>,
    closed: Vec<WritePass>,
}

impl Recorder {
    pub fn new(consumer: HeapConsumer<ControlEvent>) -> Self {
        Self {
            consumer,
            pass: None,
            closed: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.pass.is_some()
    }

    /// Latest position reached by the unfinished passes, if there are any.
    pub fn open_end(&self) -> Option<Superclock> {
        let pass = self.pass.as_ref().or_else(|| self.closed.last())?;
        Some(pass.samples.last().map_or(pass.start, |event| event.when))
    }

    pub fn open(&mut self, start: Superclock) {
        self.pass = Some(WritePass::new(start));
    }

    /// Moves queued samples into the open pass. A time regression closes the
    /// pass and opens a new one at the regressed sample. Returns the number
    /// of samples discarded because no pass was open.
    pub fn drain(&mut self) -> usize {
        let mut discarded = 0;
        while let Some(event) = self.consumer.pop() {
            let Some(pass) = self.pass.as_mut() else {
                discarded += 1;
                continue;
            };
            if let Err(event) = pass.push(event) {
                tracing::debug!(at = event.when, "transport moved backwards; splitting write pass");
                let mut reopened = WritePass::new(event.when);
                reopened.samples.push(event);
                if let Some(previous) = self.pass.replace(reopened) {
                    self.closed.push(previous);
                }
            }
        }
        discarded
    }

    /// Closes the open pass (if any) at `end` and returns every pass closed
    /// since the last call, oldest first.
    pub fn finish(&mut self, end: Superclock, thinning_factor: f64) -> Vec<PassCommit> {
        let mut commits = Vec::with_capacity(self.closed.len() + 1);
        for pass in self.closed.drain(..) {
            let last = pass.samples.last().map_or(pass.start, |event| event.when);
            commits.push(pass.into_commit(last, thinning_factor));
        }
        if let Some(pass) = self.pass.take() {
            commits.push(pass.into_commit(end, thinning_factor));
        }
        commits
    }
}
