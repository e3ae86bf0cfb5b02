//! Non-fatal diagnostics.
//!
//! Several conditions in real-world archives are tolerable but worth
//! reporting: entries owned by a different user than the first one
//! seen, typeflags this crate does not classify, a terminator block
//! followed by more data, a multi-volume continuation offset. Those are
//! delivered to a caller-supplied sink so the codec itself never writes
//! to the console and tests can capture diagnostics directly.

/// Receives human-readable warnings emitted while reading an archive.
pub trait WarningSink {
    /// Called once per diagnostic.
    fn warn(&mut self, message: &str);
}

/// The default sink; forwards every warning to [`log::warn!`].
#[derive(Default)]
pub struct LogSink;

impl WarningSink for LogSink {
    fn warn(&mut self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Collects warnings in memory, mainly useful in tests.
impl WarningSink for Vec<String> {
    fn warn(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

impl<S: WarningSink + ?Sized> WarningSink for &mut S {
    fn warn(&mut self, message: &str) {
        (**self).warn(message)
    }
}
