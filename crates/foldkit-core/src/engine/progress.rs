use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Arc<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional observer.
///
/// Cloning shares the observer, so concurrent prediction tasks can each hold
/// a reporter.
#[derive(Default, Clone)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: impl Fn(Progress) + Send + Sync + 'a) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        if self.callback.is_some() {
            self.report(Progress::Message(text.into()));
        }
    }
}
