//! Identity: who is signed in, if anyone.
//!
//! Session presence is the only authorization check in the app; there are no
//! roles or scopes. `DemoIdentity` fabricates sessions locally so the rest of
//! the pipeline can be driven without a real identity backend.

use chrono::{DateTime, Duration, Utc};

use crate::error::MillError;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_email: String,
    /// `"password"` or the OAuth provider name.
    pub provider: String,
    /// `None` means the session never expires on its own.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Auth state changes pushed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    Expired,
}

pub type SubscriptionId = usize;

type Listener = Box<dyn FnMut(&SessionEvent)>;

/// Source of sessions and auth-state notifications.
pub trait IdentityProvider {
    /// The live session, if any. Implementations may invalidate an expired
    /// session here, so the answer is authoritative at the time of the call.
    fn current_session(&mut self) -> Option<Session>;

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, MillError>;

    fn sign_in_with_provider(&mut self, name: &str) -> Result<Session, MillError>;

    fn sign_out(&mut self);

    fn subscribe(&mut self, listener: Listener) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// OAuth providers the demo identity recognizes.
const KNOWN_PROVIDERS: &[&str] = &["google"];

/// Client-side identity with fabricated sessions and a fixed lifetime.
///
/// Sessions expire lazily: the countdown is only checked when somebody asks
/// for the session, at which point an expired one is dropped and `Expired`
/// goes out to subscribers.
pub struct DemoIdentity {
    session: Option<Session>,
    ttl: Duration,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
}

impl DemoIdentity {
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(30))
    }

    /// A demo identity whose sessions last `ttl` from sign-in.
    pub fn with_ttl(ttl: Duration) -> Self {
        DemoIdentity {
            session: None,
            ttl,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    fn start_session(&mut self, user_email: String, provider: String) -> Session {
        let session = Session {
            user_email,
            provider,
            expires_at: Some(Utc::now() + self.ttl),
        };
        self.session = Some(session.clone());
        self.notify(&SessionEvent::SignedIn);
        session
    }

    fn notify(&mut self, event: &SessionEvent) {
        // Detach the listener list while calling out so a listener can never
        // observe it mid-iteration.
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
        self.listeners = listeners;
    }
}

impl Default for DemoIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for DemoIdentity {
    fn current_session(&mut self) -> Option<Session> {
        if let Some(expires_at) = self.session.as_ref().and_then(|s| s.expires_at) {
            if Utc::now() >= expires_at {
                log::info!("Session expired");
                self.session = None;
                self.notify(&SessionEvent::Expired);
            }
        }
        self.session.clone()
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, MillError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(MillError::Auth(
                "email and password are required".to_string(),
            ));
        }
        Ok(self.start_session(email.to_string(), "password".to_string()))
    }

    fn sign_in_with_provider(&mut self, name: &str) -> Result<Session, MillError> {
        let name = name.trim().to_lowercase();
        if !KNOWN_PROVIDERS.contains(&name.as_str()) {
            return Err(MillError::Auth(format!("unknown provider '{name}'")));
        }
        let email = format!("demo@{name}.example");
        Ok(self.start_session(email, name))
    }

    fn sign_out(&mut self) {
        if self.session.take().is_some() {
            self.notify(&SessionEvent::SignedOut);
        }
    }

    fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }
}
