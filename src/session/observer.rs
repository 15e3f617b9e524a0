//! Observer seam between the session and whatever renders it

use crate::state_machine::{Conversation, SessionStatus};

/// Receives state changes synchronously, in transition order
pub trait SessionObserver {
    fn on_messages_changed(&mut self, conversation: &Conversation);

    fn on_status_changed(&mut self, status: &SessionStatus);

    /// An event was applied and the latest message should be brought into view
    fn on_scroll_to_latest(&mut self) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_messages_changed(&mut self, _conversation: &Conversation) {}

    fn on_status_changed(&mut self, _status: &SessionStatus) {}
}

impl<T: SessionObserver + ?Sized> SessionObserver for &mut T {
    fn on_messages_changed(&mut self, conversation: &Conversation) {
        (**self).on_messages_changed(conversation);
    }

    fn on_status_changed(&mut self, status: &SessionStatus) {
        (**self).on_status_changed(status);
    }

    fn on_scroll_to_latest(&mut self) {
        (**self).on_scroll_to_latest();
    }
}
