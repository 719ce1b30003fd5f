use std::sync::Arc;

use tracing::{debug, warn};

use crate::platform::{MessageRef, Transport};

/// The "working on it" message shown while a backend call is outstanding.
///
/// Owned by exactly one interaction. [`retire`](Self::retire) deletes it;
/// if the indicator is dropped without being retired (early return, panic
/// while rendering) the delete is spawned onto the runtime instead. Deletion
/// is best-effort either way.
pub struct PendingIndicator {
    transport: Arc<dyn Transport>,
    message: Option<MessageRef>,
}

impl PendingIndicator {
    pub fn new(transport: Arc<dyn Transport>, message: Option<MessageRef>) -> Self {
        Self { transport, message }
    }

    pub fn message(&self) -> Option<MessageRef> {
        self.message
    }

    pub async fn retire(mut self) {
        if let Some(message) = self.message.take() {
            delete_quietly(self.transport.as_ref(), message).await;
        }
    }
}

impl Drop for PendingIndicator {
    fn drop(&mut self) {
        let Some(message) = self.message.take() else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    delete_quietly(transport.as_ref(), message).await;
                });
            }
            Err(_) => warn!(
                "Pending message {} left behind: no runtime to delete it",
                message.message_id
            ),
        }
    }
}

async fn delete_quietly(transport: &dyn Transport, message: MessageRef) {
    match transport.delete(message).await {
        Ok(()) => debug!("Deleted pending message {}", message.message_id),
        Err(e) => debug!(
            "Could not delete pending message {}: {:#}",
            message.message_id, e
        ),
    }
}
