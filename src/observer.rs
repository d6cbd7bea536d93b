//! Progress, message and error hooks surfaced to the caller

use std::sync::{Arc, RwLock};

use tracing::{error, info};

use crate::error::EepError;

/// Receives feedback while the adapter works. Every method has a default,
/// so implementors only override what they display.
pub trait Observer: Send + Sync {
    /// Fraction of the current transfer, `0.0..=1.0`
    fn on_progress(&self, _progress: f64) {}

    fn on_message(&self, message: &str) {
        info!("{}", message);
    }

    fn on_error(&self, err: &EepError) {
        error!("{}", err);
    }
}

/// Logs messages and errors through `tracing`, ignores progress
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {}

pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;
pub type MessageFn = Arc<dyn Fn(&str) + Send + Sync>;
pub type ErrorFn = Arc<dyn Fn(&EepError) + Send + Sync>;

/// Three independently replaceable callbacks. Shared with the write listener,
/// so a setter may run while a transfer is in progress; the latest one wins.
pub(crate) struct Hooks {
    progress: RwLock<ProgressFn>,
    message: RwLock<MessageFn>,
    error: RwLock<ErrorFn>,
}

impl Default for Hooks {
    fn default() -> Self {
        Hooks {
            progress: RwLock::new(Arc::new(|progress| LogObserver.on_progress(progress))),
            message: RwLock::new(Arc::new(|message: &str| LogObserver.on_message(message))),
            error: RwLock::new(Arc::new(|err: &EepError| LogObserver.on_error(err))),
        }
    }
}

impl Hooks {
    pub(crate) fn set_progress(&self, f: ProgressFn) {
        if let Ok(mut slot) = self.progress.write() {
            *slot = f;
        }
    }

    pub(crate) fn set_message(&self, f: MessageFn) {
        if let Ok(mut slot) = self.message.write() {
            *slot = f;
        }
    }

    pub(crate) fn set_error(&self, f: ErrorFn) {
        if let Ok(mut slot) = self.error.write() {
            *slot = f;
        }
    }

    pub(crate) fn set_observer(&self, observer: Arc<dyn Observer>) {
        let o = Arc::clone(&observer);
        self.set_progress(Arc::new(move |progress| o.on_progress(progress)));
        let o = Arc::clone(&observer);
        self.set_message(Arc::new(move |message: &str| o.on_message(message)));
        self.set_error(Arc::new(move |err: &EepError| observer.on_error(err)));
    }
}

// Callbacks are cloned out of the lock before running so a callback may
// install a new one without deadlocking.
impl Observer for Hooks {
    fn on_progress(&self, progress: f64) {
        let f = self.progress.read().map(|f| Arc::clone(&*f));
        if let Ok(f) = f {
            f(progress);
        }
    }

    fn on_message(&self, message: &str) {
        let f = self.message.read().map(|f| Arc::clone(&*f));
        if let Ok(f) = f {
            f(message);
        }
    }

    fn on_error(&self, err: &EepError) {
        let f = self.error.read().map(|f| Arc::clone(&*f));
        if let Ok(f) = f {
            f(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<String>>,
    }

    impl Observer for Recorder {
        fn on_message(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn latest_setter_wins() {
        let hooks = Hooks::default();
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));

        let f = Arc::clone(&first);
        hooks.set_progress(Arc::new(move |_: f64| *f.lock().unwrap() += 1));
        hooks.on_progress(0.5);

        let s = Arc::clone(&second);
        hooks.set_progress(Arc::new(move |_: f64| *s.lock().unwrap() += 1));
        hooks.on_progress(1.0);

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn observer_replaces_all_hooks() {
        let hooks = Hooks::default();
        let recorder = Arc::new(Recorder::default());
        hooks.set_observer(recorder.clone());

        hooks.on_message("hello");
        hooks.on_error(&EepError::NegativeAck);
        hooks.on_progress(0.25);

        assert_eq!(*recorder.messages.lock().unwrap(), vec!["hello".to_string()]);
    }
}
