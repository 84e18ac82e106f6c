use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use super::{AuthStateListener, Subscription};
use crate::types::ProviderUser;

type SharedListener = Arc<dyn Fn(Option<&ProviderUser>) + Send + Sync>;

struct Inner {
    next_id: u64,
    listeners: Vec<(u64, SharedListener)>,
    /// `None` until the provider has resolved its initial state.
    current: Option<Option<ProviderUser>>,
}

/// Session-change stream for [`AuthProvider`](super::AuthProvider) implementations.
///
/// Late subscribers receive the current state on registration, once resolved.
///
/// Deliveries are serialized: listeners observe states in the order they were
/// recorded, even when publishes race across threads. The delivery lock is
/// reentrant, so a listener may subscribe or publish again on its own thread.
/// A listener must not block on another thread that publishes.
#[derive(Clone)]
pub struct AuthStateNotifier {
    inner: Arc<Mutex<Inner>>,
    delivery: Arc<ReentrantMutex<()>>,
}

impl Default for AuthStateNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateNotifier {
    /// Notifier that has not resolved its initial state yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                listeners: Vec::new(),
                current: None,
            })),
            delivery: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Notifier whose initial state is already known.
    #[must_use]
    pub fn resolved(user: Option<ProviderUser>) -> Self {
        let notifier = Self::new();
        notifier.inner.lock().current = Some(user);
        notifier
    }

    pub fn subscribe(&self, listener: AuthStateListener) -> Subscription {
        let listener: SharedListener = Arc::from(listener);
        let _delivery = self.delivery.lock();

        let (id, current) = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Arc::clone(&listener)));
            (id, inner.current.clone())
        };

        if let Some(user) = current {
            listener(user.as_ref());
        }

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Record a new state and notify every registered listener.
    pub fn publish(&self, user: Option<ProviderUser>) {
        let _delivery = self.delivery.lock();
        let listeners: Vec<SharedListener> = {
            let mut inner = self.inner.lock();
            inner.current = Some(user.clone());
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in &listeners {
            listener(user.as_ref());
        }
    }

    /// Currently signed-in user, if resolved and present.
    #[must_use]
    pub fn current(&self) -> Option<ProviderUser> {
        self.inner.lock().current.clone().flatten()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.lock().current.is_some()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}
