//! Session observation.
//!
//! The session is owned entirely by the external auth provider; this
//! subsystem only reads it. The host application bridges the provider's
//! auth-state notifications into a watch channel, and the sync orchestrator
//! consumes the receiving side.
//!
//! The provider may re-announce an unchanged session (token refresh, tab
//! focus); consumers must tolerate duplicate notifications. The one-shot
//! guards live in the orchestrator, not here.

use tokio::sync::watch;

use fernwood_core::UserId;

/// The current authentication fact: either a guest or a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    /// No authenticated user.
    #[default]
    Guest,
    /// A signed-in user.
    User(UserId),
}

impl Session {
    /// The signed-in user id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::User(id) => Some(*id),
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// Read side of the session fact: point-in-time reads plus change
/// notifications.
#[derive(Debug, Clone)]
pub struct SessionFeed {
    rx: watch::Receiver<Session>,
}

impl SessionFeed {
    /// The session as of right now.
    #[must_use]
    pub fn current(&self) -> Session {
        *self.rx.borrow()
    }

    /// Wait for the next session notification and return its value.
    ///
    /// # Errors
    ///
    /// Returns an error when the sending side has been dropped (the host
    /// application is shutting down).
    pub async fn changed(&mut self) -> Result<Session, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(*self.rx.borrow_and_update())
    }
}

/// Create a session feed, returning the sender for the host's auth bridge
/// and the feed for the orchestrator.
#[must_use]
pub fn session_feed(initial: Session) -> (watch::Sender<Session>, SessionFeed) {
    let (tx, rx) = watch::channel(initial);
    (tx, SessionFeed { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_current_reflects_initial_value() {
        let user = UserId::new(Uuid::new_v4());
        let (_tx, feed) = session_feed(Session::User(user));

        assert_eq!(feed.current(), Session::User(user));
        assert_eq!(feed.current().user_id(), Some(user));
    }

    #[tokio::test]
    async fn test_changed_sees_transitions_and_duplicates() {
        let user = UserId::new(Uuid::new_v4());
        let (tx, mut feed) = session_feed(Session::Guest);

        tx.send(Session::User(user)).expect("receiver alive");
        assert_eq!(feed.changed().await.expect("open"), Session::User(user));

        // Re-announcing the same session still notifies.
        tx.send(Session::User(user)).expect("receiver alive");
        assert_eq!(feed.changed().await.expect("open"), Session::User(user));

        tx.send(Session::Guest).expect("receiver alive");
        assert_eq!(feed.changed().await.expect("open"), Session::Guest);
    }

    #[tokio::test]
    async fn test_changed_errors_when_sender_dropped() {
        let (tx, mut feed) = session_feed(Session::Guest);
        drop(tx);

        assert!(feed.changed().await.is_err());
    }
}
