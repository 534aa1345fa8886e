//! Notification lifecycle management.
//!
//! [`Toaster`] owns the active collection, feeds every change through the
//! reducer, and broadcasts the resulting [`Snapshot`] to subscribers. Dismissed
//! notifications stay in the collection (hidden) until their removal timer
//! fires.
//!
//! All mutations, timer expiries included, run under one mutex, and
//! subscribers are called inside it. Snapshots therefore arrive in strictly
//! increasing `version` order. A listener must not call back into the same
//! `Toaster`; use [`Toaster::subscribe_channel`] to hand snapshots off.
//!
//! Handles and listeners should hold a [`WeakToaster`] rather than a
//! `Toaster` clone, otherwise the queue keeps itself alive and only an
//! explicit [`Toaster::shutdown`] cancels its timers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

use super::reducer::{Action, QueueState, reduce};
use super::types::{Notification, NotificationId, Snapshot, ToastPatch, ToastPayload};
use crate::config::ToastConfig;
use crate::error::ToastError;

/// How many notifications can be active at once.
pub const TOAST_LIMIT: usize = 1;

/// How long a dismissed notification lingers before it is physically removed.
pub const TOAST_REMOVE_DELAY: Duration = Duration::from_millis(1_000_000);

/// Queue limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToasterConfig {
    pub max_visible: usize,
    pub remove_delay: Duration,
}

impl Default for ToasterConfig {
    fn default() -> Self {
        Self {
            max_visible: TOAST_LIMIT,
            remove_delay: TOAST_REMOVE_DELAY,
        }
    }
}

impl ToasterConfig {
    #[must_use]
    pub fn max_visible(mut self, max_visible: usize) -> Self {
        self.max_visible = max_visible;
        self
    }

    #[must_use]
    pub fn remove_delay(mut self, remove_delay: Duration) -> Self {
        self.remove_delay = remove_delay;
        self
    }
}

impl From<&ToastConfig> for ToasterConfig {
    fn from(config: &ToastConfig) -> Self {
        Self {
            max_visible: config.limit,
            remove_delay: config.remove_delay(),
        }
    }
}

/// Returns `false` once it no longer wants snapshots.
type Listener = Box<dyn FnMut(&Snapshot) -> bool + Send>;

struct Inner {
    state: QueueState,
    version: u64,
    /// At most one pending removal per id.
    timers: HashMap<NotificationId, CancellationToken>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

impl Inner {
    fn broadcast(&mut self) {
        self.version += 1;
        let snapshot = Snapshot::capture(self.version, &self.state.toasts);
        self.listeners.retain_mut(|(_, listener)| listener(&snapshot));
    }

    // Timers whose notification left the collection (evicted or cleared) are cancelled.
    fn prune_timers(&mut self) {
        let state = &self.state;
        self.timers.retain(|id, token| {
            let keep = state.contains(*id);
            if !keep {
                token.cancel();
            }
            keep
        });
    }
}

struct Shared {
    inner: Mutex<Inner>,
    config: ToasterConfig,
    runtime: Handle,
    shutdown: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, inner: &mut Inner, action: Action) {
        let state = std::mem::take(&mut inner.state);
        inner.state = reduce(state, action, self.config.max_visible);
        inner.prune_timers();
        inner.broadcast();
    }

    fn schedule_removal(self: &Arc<Self>, inner: &mut Inner, id: NotificationId) {
        if inner.timers.contains_key(&id) {
            return;
        }
        if self.shutdown.is_cancelled() {
            log::debug!("Toaster shut down, not scheduling removal of toast {}", id);
            return;
        }

        let token = self.shutdown.child_token();
        inner.timers.insert(id, token.clone());

        let shared: Weak<Self> = Arc::downgrade(self);
        let delay = self.config.remove_delay;
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(shared) = shared.upgrade() {
                        shared.expire(id);
                    }
                }
            }
        });
        log::debug!("Scheduled removal of toast {} in {:?}", id, delay);
    }

    fn expire(&self, id: NotificationId) {
        let mut inner = self.lock();
        // Cancelled by clear/shutdown/eviction while this task waited for the lock
        if inner.timers.remove(&id).is_none() {
            return;
        }
        self.apply(&mut inner, Action::Remove(Some(id)));
        log::debug!("Removed toast {}", id);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Handle to a notification queue. Cloning shares the same queue.
///
/// Dropping the last clone cancels every pending removal timer.
#[derive(Clone)]
pub struct Toaster {
    shared: Arc<Shared>,
}

impl fmt::Debug for Toaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Toaster");
        out.field("config", &self.shared.config);

        // Formatting from inside a listener must not wait on our own lock
        let inner = match self.shared.inner.try_lock() {
            Ok(inner) => inner,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return out.field("state", &"<locked>").finish();
            }
        };
        out.field("active", &inner.state.len())
            .field("pending_removals", &inner.timers.len())
            .field("subscribers", &inner.listeners.len())
            .finish()
    }
}

impl Toaster {
    /// Creates a queue whose removal timers run on the current tokio runtime.
    pub fn new(config: ToasterConfig) -> Result<Self, ToastError> {
        let runtime = Handle::try_current().map_err(|_| ToastError::NoRuntime)?;
        Ok(Self::with_handle(config, runtime))
    }

    /// Creates a queue whose removal timers run on `runtime`.
    ///
    /// A `max_visible` of zero is raised to one.
    pub fn with_handle(config: ToasterConfig, runtime: Handle) -> Self {
        let config = ToasterConfig {
            max_visible: config.max_visible.max(1),
            ..config
        };
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: QueueState::default(),
                    version: 0,
                    timers: HashMap::new(),
                    listeners: Vec::new(),
                    next_listener_id: 0,
                }),
                config,
                runtime,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> ToasterConfig {
        self.shared.config
    }

    /// Shows a new notification and returns a handle scoped to it.
    ///
    /// Subscribers see the new snapshot before this returns. If the queue is
    /// full the oldest entries are dropped outright.
    pub fn notify(&self, payload: ToastPayload) -> ToastHandle {
        let id = NotificationId::next();
        let mut inner = self.shared.lock();
        let before = inner.state.len();
        self.shared
            .apply(&mut inner, Action::Add(Notification::new(id, payload)));

        let evicted = (before + 1).saturating_sub(inner.state.len());
        if evicted > 0 {
            log::debug!("Toast {} evicted {} older toast(s)", id, evicted);
        }

        ToastHandle {
            id,
            toaster: self.downgrade(),
        }
    }

    /// Merges `patch` onto the notification with `id`.
    ///
    /// Unknown ids are ignored, but subscribers are still notified.
    pub fn update(&self, id: NotificationId, patch: ToastPatch) {
        let mut inner = self.shared.lock();
        self.shared.apply(&mut inner, Action::Update(id, patch));
    }

    /// Hides one notification, or every active one when `id` is `None`, and
    /// schedules physical removal after the configured delay.
    ///
    /// Dismissing an already hidden notification keeps its original timer.
    pub fn dismiss(&self, id: Option<NotificationId>) {
        let mut inner = self.shared.lock();
        let targets: Vec<NotificationId> = match id {
            Some(id) => inner.state.ids().filter(|t| *t == id).collect(),
            None => inner.state.ids().collect(),
        };

        self.shared.apply(&mut inner, Action::Dismiss(id));
        for target in targets {
            self.shared.schedule_removal(&mut inner, target);
        }
    }

    /// Called by a renderer when the user closed a notification directly.
    pub fn on_external_close(&self, id: NotificationId) {
        self.dismiss(Some(id));
    }

    /// Open-state callback for renderers that report visibility changes.
    ///
    /// Reopening is ignored; notifications are never resurrected.
    pub fn set_open(&self, id: NotificationId, open: bool) {
        if !open {
            self.on_external_close(id);
        }
    }

    /// Removes every notification immediately and cancels all pending timers.
    pub fn clear(&self) {
        let mut inner = self.shared.lock();
        let cancelled = inner.timers.len();
        self.shared.apply(&mut inner, Action::Remove(None));
        log::debug!("Cleared toasts, cancelled {} pending removal(s)", cancelled);
    }

    /// Cancels every pending removal. Later dismissals hide but never remove.
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
        let mut inner = self.shared.lock();
        let cancelled = inner.timers.len();
        inner.timers.clear();
        log::debug!("Toaster shut down, cancelled {} pending removal(s)", cancelled);
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Registers `listener` to receive every snapshot from now on.
    ///
    /// The listener runs while the queue is locked, so it must not call back
    /// into this `Toaster`.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let mut listener = listener;
        self.register(Box::new(move |snapshot| {
            listener(snapshot);
            true
        }))
    }

    fn register(&self, listener: Listener) -> Subscription {
        let mut inner = self.shared.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, listener));

        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    /// Subscribes through an unbounded channel, for async consumers.
    ///
    /// The receiver ends once the subscription is removed. Dropping the
    /// receiver removes the subscription at the next broadcast.
    pub fn subscribe_channel(&self) -> (Subscription, UnboundedReceiver<Snapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.register(Box::new(move |snapshot| {
            tx.send(snapshot.clone()).is_ok()
        }));
        (subscription, rx)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.shared.lock();
        Snapshot::capture(inner.version, &inner.state.toasts)
    }

    #[must_use]
    pub fn pending_removals(&self) -> usize {
        self.shared.lock().timers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().listeners.len()
    }

    /// A handle that does not keep the queue alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakToaster {
        WeakToaster {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Whether both handles point at the same queue.
    #[must_use]
    pub fn same_queue(&self, other: &Toaster) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// Non-owning reference to a queue, for listeners and long-lived handles.
#[derive(Debug, Clone)]
pub struct WeakToaster {
    shared: Weak<Shared>,
}

impl WeakToaster {
    /// `None` once every `Toaster` clone has been dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<Toaster> {
        self.shared.upgrade().map(|shared| Toaster { shared })
    }
}

/// Scoped control over one notification, returned by [`Toaster::notify`].
///
/// Stale handles are harmless: once the notification or its queue is gone
/// both methods are no-ops. A handle does not keep the queue alive.
#[derive(Debug, Clone)]
pub struct ToastHandle {
    id: NotificationId,
    toaster: WeakToaster,
}

impl ToastHandle {
    #[must_use]
    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn dismiss(&self) {
        if let Some(toaster) = self.toaster.upgrade() {
            toaster.dismiss(Some(self.id));
        }
    }

    pub fn update(&self, patch: ToastPatch) {
        if let Some(toaster) = self.toaster.upgrade() {
            toaster.update(self.id, patch);
        }
    }
}

/// Registration returned by [`Toaster::subscribe`].
///
/// Dropping it leaves a [`Toaster::subscribe`] listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to stop deliveries. Channel subscriptions
/// also end once their receiver is dropped.
#[derive(Debug)]
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            let mut inner = shared.lock();
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod manager_tests;
