use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::errors::{QueryError, QueryResult};
use crate::store::{ensure_not_cancelled, CollectionHandle};

enum ResolveState {
    Unresolved,
    Resolving,
    Resolved(CollectionHandle),
}

/// Computes a collection handle once and hands the cached handle to every
/// later caller.
///
/// The state moves `Unresolved -> Resolving -> Resolved`. The first caller to
/// find it `Unresolved` becomes the leader and runs the resolution; callers
/// arriving while it is `Resolving` wait (blocking callers on a condition
/// variable, async callers on a [Notify]) and then read the cached handle. A
/// failed resolution puts the state back to `Unresolved` so the next caller
/// tries again; failures are never cached.
pub struct CollectionResolver {
    state: Mutex<ResolveState>,
    resolved: Condvar,
    notify: Notify,
    resolutions: AtomicUsize,
}

impl CollectionResolver {
    pub fn new() -> Self {
        CollectionResolver {
            state: Mutex::new(ResolveState::Unresolved),
            resolved: Condvar::new(),
            notify: Notify::new(),
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.lock(), ResolveState::Resolved(_))
    }

    /// The cached handle, without triggering resolution.
    pub fn get(&self) -> Option<CollectionHandle> {
        match &*self.state.lock() {
            ResolveState::Resolved(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Number of resolutions that completed successfully: 0 before first use, 1 after.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::Acquire)
    }

    /// Returns the cached handle, running `resolve` first if nothing is cached.
    /// Blocks while another caller is resolving.
    pub fn resolve<F>(&self, resolve: F) -> QueryResult<CollectionHandle>
    where
        F: FnOnce() -> QueryResult<CollectionHandle>,
    {
        let mut state = self.state.lock();
        loop {
            if let ResolveState::Resolved(handle) = &*state {
                return Ok(handle.clone());
            }
            if matches!(*state, ResolveState::Resolving) {
                self.resolved.wait(&mut state);
                continue;
            }
            *state = ResolveState::Resolving;
            drop(state);
            return self.lead(resolve);
        }
    }

    /// Async form of [CollectionResolver::resolve]. Waiting for another
    /// caller's resolution stops with `Cancelled` as soon as `token` fires.
    pub async fn resolve_async<F>(
        &self,
        token: &CancellationToken,
        resolve: F,
    ) -> QueryResult<CollectionHandle>
    where
        F: FnOnce() -> QueryResult<CollectionHandle>,
    {
        loop {
            ensure_not_cancelled(token, "collection resolution")?;

            // register interest before looking at the state so a wake-up
            // between the check and the await is not lost
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let lead = {
                let mut state = self.state.lock();
                if let ResolveState::Resolved(handle) = &*state {
                    return Ok(handle.clone());
                }
                let unresolved = matches!(*state, ResolveState::Unresolved);
                if unresolved {
                    *state = ResolveState::Resolving;
                }
                unresolved
            };
            if lead {
                return self.lead(resolve);
            }

            tokio::select! {
                _ = token.cancelled() => {
                    return Err(QueryError::cancelled(
                        "Cancelled while waiting for collection resolution",
                    ));
                }
                _ = &mut notified => {}
            }
        }
    }

    fn lead<F>(&self, resolve: F) -> QueryResult<CollectionHandle>
    where
        F: FnOnce() -> QueryResult<CollectionHandle>,
    {
        log::debug!("Resolving collection");
        let guard = ResetGuard {
            resolver: self,
            armed: true,
        };
        let result = resolve();
        guard.finish(&result);
        result
    }

    fn publish(&self, next: ResolveState) {
        *self.state.lock() = next;
        self.resolved.notify_all();
        self.notify.notify_waiters();
    }
}

impl Default for CollectionResolver {
    fn default() -> Self {
        CollectionResolver::new()
    }
}

// puts the state back to Unresolved if the leader unwinds before publishing
struct ResetGuard<'a> {
    resolver: &'a CollectionResolver,
    armed: bool,
}

impl ResetGuard<'_> {
    fn finish(mut self, result: &QueryResult<CollectionHandle>) {
        self.armed = false;
        match result {
            Ok(handle) => {
                self.resolver.resolutions.fetch_add(1, Ordering::AcqRel);
                log::debug!("Collection {} resolved and cached", handle.name());
                self.resolver.publish(ResolveState::Resolved(handle.clone()));
            }
            Err(err) => {
                log::warn!("Collection resolution failed, next access retries: {}", err);
                self.resolver.publish(ResolveState::Unresolved);
            }
        }
    }
}

impl Drop for ResetGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("Collection resolution aborted, next access retries");
            self.resolver.publish(ResolveState::Unresolved);
        }
    }
}
