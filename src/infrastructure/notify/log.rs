use tracing::error;

use crate::domain::ports::notifier::Notifier;

/// Emits notifications as error-level events for whatever collects the logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, subject: &str, body: &str) {
        error!(target: "tradefunnel::notify", subject, body, "operator notification");
    }
}
