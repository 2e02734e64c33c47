//! This module provides host-owned frame scheduling.
//!
//! Every animated layer is driven by a callback which re-requests itself each time it runs, the
//! same way a browser `requestAnimationFrame` loop works. The host owns a single
//! [`FrameScheduler`] and calls [`FrameScheduler::begin_frame`] once per display refresh. Each
//! layer holds a [`FrameLoop`], which fires at most once per refresh.
//!
//! Cancelling is explicit: a cancelled [`FrameHandle`] can never fire, so a torn down layer can
//! never paint again.

use std::time::Duration;
use tracing::trace;

/// A pending request for a callback on the next display refresh.
///
/// This is deliberately not `Clone`. Firing or cancelling a handle consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameHandle {
    /// The unique ID of this request.
    id: u64,
}

/// A request that is waiting to fire.
#[derive(Clone, Copy, Debug)]
struct PendingRequest {
    /// The ID of the [`FrameHandle`] for this request.
    id: u64,

    /// The first refresh on which this request may fire.
    due: u64,
}

/// The scheduler for all the frame callbacks of a host.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    /// The ID for the next [`FrameHandle`].
    next_id: u64,

    /// All the requests that haven't been fired or cancelled yet.
    pending: Vec<PendingRequest>,

    /// The number of refreshes that have begun.
    refresh: u64,

    /// The total time that has passed across all refreshes.
    elapsed: Duration,

    /// The number of callbacks which have fired.
    invocations: u64,
}

impl FrameScheduler {
    /// Create a new scheduler with no pending callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a callback on the next display refresh.
    pub fn request_frame(&mut self) -> FrameHandle {
        let id = self.next_id;
        self.next_id += 1;

        self.pending.push(PendingRequest {
            id,
            due: self.refresh + 1,
        });
        trace!(id, due = self.refresh + 1, "Requested frame");

        FrameHandle { id }
    }

    /// Cancel a pending callback. It will never fire.
    pub fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|request| request.id != handle.id);
        trace!(id = handle.id, "Cancelled frame");
    }

    /// Begin a new display refresh, `dt` after the last one.
    pub fn begin_frame(&mut self, dt: Duration) {
        self.refresh += 1;
        self.elapsed += dt;
    }

    /// Fire the callback for this handle if it's due in the current refresh.
    ///
    /// If it isn't due yet, the handle is given back so it can be polled again later.
    pub fn fire(&mut self, handle: FrameHandle) -> Result<(), FrameHandle> {
        let position = self
            .pending
            .iter()
            .position(|request| request.id == handle.id && request.due <= self.refresh);

        match position {
            Some(idx) => {
                self.pending.swap_remove(idx);
                self.invocations += 1;
                Ok(())
            }
            None => Err(handle),
        }
    }

    /// The number of callbacks that are waiting to fire.
    pub fn pending_callbacks(&self) -> usize {
        self.pending.len()
    }

    /// The total number of callbacks that have fired.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// The total time passed across all refreshes.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// A self-rescheduling callback loop, owned by a single layer.
#[derive(Debug, Default)]
pub struct FrameLoop {
    /// The pending callback, if the loop is running.
    pending: Option<FrameHandle>,
}

impl FrameLoop {
    /// Create a loop that isn't running.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Start the loop. This does nothing if the loop is already running.
    pub fn start(&mut self, scheduler: &mut FrameScheduler) {
        if self.pending.is_none() {
            self.pending = Some(scheduler.request_frame());
        }
    }

    /// Stop the loop, cancelling the pending callback.
    pub fn stop(&mut self, scheduler: &mut FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Check whether the loop's callback fires in this refresh. If it does, the next frame is
    /// requested straight away and this returns true, so the caller should do its frame work.
    pub fn poll(&mut self, scheduler: &mut FrameScheduler) -> bool {
        let Some(handle) = self.pending.take() else {
            return false;
        };

        match scheduler.fire(handle) {
            Ok(()) => {
                self.pending = Some(scheduler.request_frame());
                true
            }
            Err(handle) => {
                self.pending = Some(handle);
                false
            }
        }
    }

    /// Is the loop running?
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }
}
