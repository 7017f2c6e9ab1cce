//! Best-effort notification delivery.

/// Notification sink. Fire-and-forget: a failed or dropped
/// notification never interrupts the timer, so `notify` is infallible
/// from the caller's view.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

/// Prints notifications to stdout with a terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        println!("\x07[{title}] {body}");
    }
}

/// Discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}
