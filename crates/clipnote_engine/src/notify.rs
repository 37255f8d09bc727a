use std::sync::Mutex;

use clip_logging::clip_info;

/// System notification sink: fire-and-forget display of title + message.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Default sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        clip_info!("notification: {title}: {message}");
    }
}

/// Test sink that records every notification shown.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().expect("lock notifications").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.shown
            .lock()
            .expect("lock notifications")
            .push((title.to_string(), message.to_string()));
    }
}
