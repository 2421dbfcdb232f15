use crate::types::Phase;

/// Advisory progress notification from a long-running pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub current: usize,
    pub total: usize,
}

impl ProgressEvent {
    pub fn new(phase: Phase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
        }
    }
}

/// Receiver for [`ProgressEvent`]s.
///
/// Sinks must not fail; a pass never changes behavior based on whether
/// anyone listens.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

pub(crate) fn emit(sink: Option<&dyn ProgressSink>, phase: Phase, current: usize, total: usize) {
    if let Some(sink) = sink {
        sink.report(ProgressEvent::new(phase, current, total));
    }
}
