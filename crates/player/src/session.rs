// Handle to the one session allowed to own the output

use boombap_core::{CancellationToken, SessionId};

/// The controller keeps at most one of these. Dropping the handle does not
/// stop anything; `cancel` does.
#[derive(Debug)]
pub(crate) struct SessionHandle {
    pub id: SessionId,
    pub token: CancellationToken,
}

impl SessionHandle {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
        }
    }

    /// Cancel the session's pipeline and connection
    pub fn cancel(&self) {
        if self.token.cancel() {
            log::debug!("[session {}] cancelled", self.id);
        }
    }
}

/// Whether `slot` still holds the session `id`
pub(crate) fn is_current(slot: &Option<SessionHandle>, id: SessionId) -> bool {
    slot.as_ref().map(|session| session.id) == Some(id)
}
