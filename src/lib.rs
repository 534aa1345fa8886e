//! `toastq` is a toast notification queue.
//!
//! A [`Toaster`] keeps a capped, newest-first list of notifications. Dismissed
//! notifications are hidden at once and physically removed after a delay;
//! every change is broadcast to subscribers as a versioned [`Snapshot`].
//!
//! ```ignore
//! use toastq::{ToastPayload, Toaster, ToasterConfig};
//!
//! let toaster = Toaster::new(ToasterConfig::default())?;
//! let sub = toaster.subscribe(|snapshot| println!("{} active", snapshot.len()));
//!
//! let handle = toaster.notify(ToastPayload::new().title("Saved"));
//! handle.dismiss();
//! ```

pub mod config;
pub mod error;
pub mod script;
pub mod toast;


pub use error::ToastError;
pub use toast::{
    Notification, NotificationId, Snapshot, Subscription, ToastAction, ToastHandle, ToastPatch,
    ToastPayload, ToastProvider, Toaster, ToasterConfig, Variant, WeakToaster, use_toast,
};
