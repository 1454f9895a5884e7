/// Outbound operator notifications. Delivery failures are the adapter's
/// concern; callers never fail because a notification could not be sent.
pub trait Notifier: Send + Sync {
    fn notify(&self, subject: &str, body: &str);
}
