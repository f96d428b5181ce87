use crate::collections::domain::ResourceId;
use crate::shared::error::{ConfirmError, GateError, MutationError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Phase of the delete confirmation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationPhase {
    Idle,
    AwaitingConfirmation,
    InFlight,
}

/// Snapshot handed to the rendering side (dialog open, button spinner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationState {
    pub phase: ConfirmationPhase,
    /// Empty exactly when `phase` is `Idle`
    pub target_ids: BTreeSet<ResourceId>,
}

impl ConfirmationState {
    fn idle() -> Self {
        Self {
            phase: ConfirmationPhase::Idle,
            target_ids: BTreeSet::new(),
        }
    }

    pub fn is_dialog_open(&self) -> bool {
        self.phase != ConfirmationPhase::Idle
    }

    pub fn is_confirm_loading(&self) -> bool {
        self.phase == ConfirmationPhase::InFlight
    }
}

impl Default for ConfirmationState {
    fn default() -> Self {
        Self::idle()
    }
}

/// ConfirmationGate state machine guarding irreversible deletes
///
/// `idle -> awaiting-confirmation -> in-flight -> idle`. A mutation only runs
/// from `confirm`, and `confirm` only proceeds from `awaiting-confirmation`,
/// so nothing is deleted without an explicit confirmation. The gate always
/// returns to `idle` once the mutation settles, including when the mutation
/// future is dropped before completing.
///
/// The lock is never held across an await point.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    state: Mutex<ConfirmationState>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConfirmationState {
        self.lock().clone()
    }

    pub fn phase(&self) -> ConfirmationPhase {
        self.lock().phase
    }

    /// `idle --requestDelete(ids)--> awaiting-confirmation`
    pub fn request_delete<I>(&self, ids: I) -> Result<(), GateError>
    where
        I: IntoIterator<Item = ResourceId>,
    {
        let ids: BTreeSet<ResourceId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(GateError::EmptyTarget);
        }

        let mut state = self.lock();
        if state.phase != ConfirmationPhase::Idle {
            return Err(GateError::NotIdle(state.phase));
        }
        debug!(targets = ids.len(), "delete requested, awaiting confirmation");
        state.phase = ConfirmationPhase::AwaitingConfirmation;
        state.target_ids = ids;
        Ok(())
    }

    /// `awaiting-confirmation --cancel--> idle`
    pub fn cancel(&self) -> Result<(), GateError> {
        let mut state = self.lock();
        match state.phase {
            ConfirmationPhase::AwaitingConfirmation => {
                debug!("delete cancelled");
                *state = ConfirmationState::idle();
                Ok(())
            }
            ConfirmationPhase::InFlight => Err(GateError::AlreadyInFlight),
            ConfirmationPhase::Idle => Err(GateError::NotAwaitingConfirmation),
        }
    }

    /// `awaiting-confirmation --confirm--> in-flight --settled--> idle`
    ///
    /// Runs `mutate` with the target ids. A second `confirm` while the first is
    /// in flight is rejected with `AlreadyInFlight` and does not run `mutate`.
    pub async fn confirm<F, Fut>(&self, mutate: F) -> Result<(), ConfirmError>
    where
        F: FnOnce(BTreeSet<ResourceId>) -> Fut,
        Fut: Future<Output = Result<(), MutationError>>,
    {
        let targets = {
            let mut state = self.lock();
            match state.phase {
                ConfirmationPhase::AwaitingConfirmation => {}
                ConfirmationPhase::InFlight => return Err(GateError::AlreadyInFlight.into()),
                ConfirmationPhase::Idle => return Err(GateError::NotAwaitingConfirmation.into()),
            }
            state.phase = ConfirmationPhase::InFlight;
            state.target_ids.clone()
        };

        let _settle = SettleGuard { gate: self };
        debug!(targets = targets.len(), "delete confirmed, in flight");
        mutate(targets).await.map_err(ConfirmError::from)
    }

    fn lock(&self) -> MutexGuard<'_, ConfirmationState> {
        // The state is a plain value; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the gate to idle when the in-flight mutation settles or is dropped
struct SettleGuard<'a> {
    gate: &'a ConfirmationGate,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        *self.gate.lock() = ConfirmationState::idle();
        debug!("delete settled, gate idle");
    }
}
