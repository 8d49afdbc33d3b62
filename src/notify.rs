//! Transient user-facing notifications.

use std::sync::Mutex;

/// Fire-and-forget message surface.
pub trait Notifier {
    fn show_transient(&self, text: &str);
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn show_transient(&self, text: &str) {
        (**self).show_transient(text)
    }
}

/// Prints each message as a single line on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn show_transient(&self, text: &str) {
        eprintln!("  \u{1F514} {}", text);
    }
}

impl Notifier for () {
    fn show_transient(&self, _text: &str) {}
}

/// Keeps every message it is shown, optionally forwarding to another notifier.
pub struct RecordingNotifier<N = ()> {
    inner: N,
    messages: Mutex<Vec<String>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::forwarding(())
    }
}

impl<N: Notifier> RecordingNotifier<N> {
    pub fn forwarding(inner: N) -> Self {
        Self { inner, messages: Mutex::new(Vec::new()) }
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl<N: Notifier> Notifier for RecordingNotifier<N> {
    fn show_transient(&self, text: &str) {
        match self.messages.lock() {
            Ok(mut m) => m.push(text.to_string()),
            Err(poisoned) => poisoned.into_inner().push(text.to_string()),
        }
        self.inner.show_transient(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let n = RecordingNotifier::default();
        n.show_transient("a");
        n.show_transient("b");
        assert_eq!(n.messages(), vec!["a", "b"]);
    }

    #[test]
    fn test_forwarding() {
        let inner = RecordingNotifier::default();
        let outer = RecordingNotifier::forwarding(&inner);
        outer.show_transient("Location not available");
        assert_eq!(inner.messages(), vec!["Location not available"]);
        assert_eq!(outer.messages().len(), 1);
    }
}
