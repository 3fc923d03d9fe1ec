//! In-flight request slots.
//!
//! Every request the controller issues is registered here for the duration
//! of the call and carries a cancel token, so overlapping triggers of the same
//! action can be cancelled or refused.

use crate::config::DuplicatePolicy;
use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Upload,
    PositionCount,
    Assignment,
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the request is cancelled. Never resolves otherwise.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Default)]
struct Slots {
    next_id: u64,
    active: HashMap<ActionKind, Vec<(u64, watch::Sender<bool>)>>,
}

#[derive(Clone, Default)]
pub struct InFlight {
    slots: Arc<Mutex<Slots>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request of `kind`. Returns `None` when the policy refuses it.
    pub fn begin(&self, kind: ActionKind, policy: DuplicatePolicy) -> Option<Ticket> {
        let mut slots = self.lock();
        let busy = slots.active.get(&kind).is_some_and(|list| !list.is_empty());

        match policy {
            DuplicatePolicy::IgnoreNew if busy => return None,
            DuplicatePolicy::CancelPrevious if busy => {
                if let Some(list) = slots.active.get_mut(&kind) {
                    for (_, tx) in list.drain(..) {
                        let _ = tx.send(true);
                    }
                }
            }
            _ => {}
        }

        let id = slots.next_id;
        slots.next_id = slots.next_id.wrapping_add(1);
        let (tx, rx) = watch::channel(false);
        slots.active.entry(kind).or_default().push((id, tx));

        Some(Ticket {
            slots: Arc::clone(&self.slots),
            kind,
            id,
            token: CancelToken { rx },
        })
    }

    /// Cancels every in-flight request of `kind`, returning how many were cancelled.
    pub fn cancel(&self, kind: ActionKind) -> usize {
        let mut slots = self.lock();
        let Some(list) = slots.active.get_mut(&kind) else {
            return 0;
        };
        let count = list.len();
        for (_, tx) in list.drain(..) {
            let _ = tx.send(true);
        }
        count
    }

    pub fn in_flight(&self, kind: ActionKind) -> usize {
        self.lock().active.get(&kind).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One registered request. Dropping it frees the slot.
pub struct Ticket {
    slots: Arc<Mutex<Slots>>,
    kind: ActionKind,
    id: u64,
    token: CancelToken,
}

impl Ticket {
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Runs `fut` unless the ticket is cancelled first.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut token = self.token.clone();
        if token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            output = fut => Some(output),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = slots.active.get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn allow_policy_tracks_every_request() {
        let inflight = InFlight::new();
        let first = inflight.begin(ActionKind::Upload, DuplicatePolicy::Allow).unwrap();
        let second = inflight.begin(ActionKind::Upload, DuplicatePolicy::Allow).unwrap();
        assert_eq!(inflight.in_flight(ActionKind::Upload), 2);
        assert_eq!(inflight.in_flight(ActionKind::Assignment), 0);

        drop(first);
        assert_eq!(inflight.in_flight(ActionKind::Upload), 1);
        drop(second);
        assert_eq!(inflight.in_flight(ActionKind::Upload), 0);
    }

    #[test]
    fn ignore_new_refuses_while_busy() {
        let inflight = InFlight::new();
        let held = inflight.begin(ActionKind::PositionCount, DuplicatePolicy::IgnoreNew);
        assert!(held.is_some());
        assert!(inflight
            .begin(ActionKind::PositionCount, DuplicatePolicy::IgnoreNew)
            .is_none());

        drop(held);
        assert!(inflight
            .begin(ActionKind::PositionCount, DuplicatePolicy::IgnoreNew)
            .is_some());
    }

    #[test]
    fn cancel_previous_flags_the_older_ticket() {
        let inflight = InFlight::new();
        let old = inflight.begin(ActionKind::Upload, DuplicatePolicy::CancelPrevious).unwrap();
        let new = inflight.begin(ActionKind::Upload, DuplicatePolicy::CancelPrevious).unwrap();

        assert!(old.token().is_cancelled());
        assert!(!new.token().is_cancelled());
        assert_eq!(inflight.in_flight(ActionKind::Upload), 1);
    }

    #[tokio::test]
    async fn cancel_interrupts_guarded_future() {
        let inflight = InFlight::new();
        let ticket = inflight.begin(ActionKind::Assignment, DuplicatePolicy::Allow).unwrap();

        let canceller = inflight.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel(ActionKind::Assignment);
        });

        let result = ticket.guard(std::future::pending::<()>()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn guard_passes_output_through() {
        let inflight = InFlight::new();
        let ticket = inflight.begin(ActionKind::Upload, DuplicatePolicy::Allow).unwrap();
        assert_eq!(ticket.guard(async { 7 }).await, Some(7));
        assert_eq!(inflight.cancel(ActionKind::Upload), 1);
    }
}
