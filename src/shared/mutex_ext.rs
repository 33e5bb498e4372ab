//! Usage: Poison-tolerant locking for the registry and credential maps.
//!
//! A poisoned lock hands back its data, clears the poison flag and logs the
//! call site that recovered it.

use std::sync::{Mutex, MutexGuard};

pub(crate) trait MutexExt<T> {
    fn lock_or_recover(&self) -> MutexGuard<'_, T>;

    /// Run `f` with the lock held and release it before returning.
    fn with_recovered<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> MutexExt<T> for Mutex<T> {
    #[track_caller]
    fn lock_or_recover(&self) -> MutexGuard<'_, T> {
        let caller = std::panic::Location::caller();
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!(
                    guarded = std::any::type_name::<T>(),
                    at = %caller,
                    "lock poisoned by a panicking holder; continuing with its last state"
                );
                self.clear_poison();
                poisoned.into_inner()
            }
        }
    }

    #[track_caller]
    fn with_recovered<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock_or_recover();
        f(&mut guard)
    }
}
