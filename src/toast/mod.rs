//! Toast notification queue
//!
//! Keeps a short, newest-first list of notifications, hides them on dismissal
//! and removes them after a delay. Renderers subscribe to snapshots; callers
//! drive it through [`Toaster`] or the [`ToastHandle`] returned by `notify`.

mod manager;
mod provider;
pub mod reducer;
pub mod render;
mod types;

pub use manager::{
    Subscription, TOAST_LIMIT, TOAST_REMOVE_DELAY, ToastHandle, Toaster, ToasterConfig,
    WeakToaster,
};
pub use provider::{ProviderGuard, ToastProvider, use_toast};
pub use types::{
    Notification, NotificationId, Snapshot, ToastAction, ToastPatch, ToastPayload, Variant,
};
