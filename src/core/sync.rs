//! Lock-poisoning helpers
//!
//! The object factory and the event emitter guard their tables with std locks
//! that are never held across an await. A poisoned lock means a constructor or
//! listener registration panicked mid-update.

use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned RwLock read into an application error
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<'_, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<'_, T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock read poisoned). A panic occurred while holding the write lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Convert a poisoned RwLock write into an application error
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<'_, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<'_, T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock write poisoned). A panic occurred while holding the lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Take the guard of a poisoned mutex anyway
///
/// For tables whose every mutation is a single push or retain, so a panic
/// cannot leave them half-updated.
pub fn recover_mutex<T>(result: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    result.unwrap_or_else(|poison_err| {
        log::warn!("Recovering poisoned lock");
        poison_err.into_inner()
    })
}
