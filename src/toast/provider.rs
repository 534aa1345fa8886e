//! Explicit binding of a [`Toaster`] to the code running on this thread.
//!
//! An application builds its `Toaster` at startup and enters a provider
//! scope around the code that should reach it through [`use_toast`]. Scopes
//! nest; the innermost live one wins, whatever order guards are dropped in.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use super::manager::Toaster;
use crate::error::ToastError;

thread_local! {
    static PROVIDERS: RefCell<Vec<(u64, Toaster)>> = const { RefCell::new(Vec::new()) };
    static NEXT_SCOPE: Cell<u64> = const { Cell::new(0) };
}

pub struct ToastProvider;

impl ToastProvider {
    /// Binds `toaster` until the returned guard is dropped.
    pub fn enter(toaster: &Toaster) -> ProviderGuard {
        let scope = NEXT_SCOPE.with(|next| {
            let scope = next.get();
            next.set(scope + 1);
            scope
        });
        PROVIDERS.with(|stack| stack.borrow_mut().push((scope, toaster.clone())));
        ProviderGuard {
            scope,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with `toaster` bound.
    pub fn scope<R>(toaster: &Toaster, f: impl FnOnce() -> R) -> R {
        let _guard = Self::enter(toaster);
        f()
    }
}

/// Keeps a provider scope open. Must be dropped on the thread that created it.
#[must_use = "the provider scope ends when the guard is dropped"]
pub struct ProviderGuard {
    scope: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        PROVIDERS.with(|stack| {
            stack.borrow_mut().retain(|(scope, _)| *scope != self.scope);
        });
    }
}

/// Returns the innermost bound `Toaster`.
///
/// Fails with [`ToastError::NoProvider`] outside any provider scope, which
/// always indicates a wiring mistake.
pub fn use_toast() -> Result<Toaster, ToastError> {
    PROVIDERS
        .with(|stack| stack.borrow().last().map(|(_, toaster)| toaster.clone()))
        .ok_or(ToastError::NoProvider)
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
