//! Order State Machine Service
//!
//! Encodes the legal lifecycle transitions for every order type. The
//! aggregate asks the state machine for the outcome of an event and only
//! mutates if the transition is legal.

use super::super::errors::OrderError;
use super::super::events::OrderEventKind;
use super::super::value_objects::OrderStatus;

/// Outcome of a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Move to the given status.
    To(OrderStatus),
    /// Restore the status remembered before entering a pending state.
    Rollback,
    /// Move to `PARTIALLY_FILLED` or `FILLED` depending on the fill.
    Fill,
}

/// Order state machine for validating lifecycle transitions.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Resolve the outcome of applying an event kind in a given status.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is not in the lifecycle table.
    pub fn transition(
        from: OrderStatus,
        kind: OrderEventKind,
    ) -> Result<TransitionOutcome, OrderError> {
        use OrderEventKind as E;
        use OrderStatus as S;
        use TransitionOutcome as T;

        let outcome = match (from, kind) {
            (S::Initialized, E::Denied) => T::To(S::Denied),
            (S::Initialized, E::Submitted) => T::To(S::Submitted),

            (S::Submitted, E::Rejected) => T::To(S::Rejected),
            (S::Submitted, E::Accepted) => T::To(S::Accepted),
            (S::Submitted, E::PendingCancel) => T::To(S::PendingCancel),
            (S::Submitted, E::Canceled) => T::To(S::Canceled),
            (S::Submitted, E::Filled) => T::Fill,

            (S::Accepted, E::PendingUpdate) => T::To(S::PendingUpdate),
            (S::Accepted, E::Updated) => T::To(S::Accepted),
            (S::Accepted, E::PendingCancel) => T::To(S::PendingCancel),
            (S::Accepted, E::Canceled) => T::To(S::Canceled),
            (S::Accepted, E::Triggered) => T::To(S::Triggered),
            (S::Accepted, E::Expired) => T::To(S::Expired),
            (S::Accepted, E::Filled) => T::Fill,

            // A venue ack after a pending request restores the remembered
            // pre-pending status.
            (S::PendingUpdate, E::Accepted) => T::Rollback,
            (S::PendingUpdate, E::Updated) => T::To(S::Accepted),
            (S::PendingUpdate, E::PendingCancel) => T::To(S::PendingCancel),
            (S::PendingUpdate, E::Canceled) => T::To(S::Canceled),
            (S::PendingUpdate, E::Triggered) => T::To(S::Triggered),
            (S::PendingUpdate, E::Expired) => T::To(S::Expired),
            (S::PendingUpdate, E::Filled) => T::Fill,

            (S::PendingCancel, E::Accepted) => T::Rollback,
            (S::PendingCancel, E::Canceled) => T::To(S::Canceled),
            (S::PendingCancel, E::Expired) => T::To(S::Expired),
            (S::PendingCancel, E::Filled) => T::Fill,

            (S::Triggered, E::PendingUpdate) => T::To(S::PendingUpdate),
            (S::Triggered, E::Updated) => T::To(S::Triggered),
            (S::Triggered, E::PendingCancel) => T::To(S::PendingCancel),
            (S::Triggered, E::Canceled) => T::To(S::Canceled),
            (S::Triggered, E::Expired) => T::To(S::Expired),
            (S::Triggered, E::Filled) => T::Fill,

            (S::PartiallyFilled, E::PendingUpdate) => T::To(S::PendingUpdate),
            (S::PartiallyFilled, E::Updated) => T::To(S::PartiallyFilled),
            (S::PartiallyFilled, E::PendingCancel) => T::To(S::PendingCancel),
            (S::PartiallyFilled, E::Canceled) => T::To(S::Canceled),
            (S::PartiallyFilled, E::Expired) => T::To(S::Expired),
            (S::PartiallyFilled, E::Filled) => T::Fill,

            _ => {
                return Err(OrderError::InvalidStateTransition {
                    from,
                    event: format!("{kind:?}"),
                })
            }
        };
        Ok(outcome)
    }

    /// All event kinds legal from a given status.
    #[must_use]
    pub fn valid_events(from: OrderStatus) -> Vec<OrderEventKind> {
        use OrderEventKind as E;
        let all = [
            E::Denied,
            E::Submitted,
            E::Accepted,
            E::Rejected,
            E::PendingUpdate,
            E::PendingCancel,
            E::Updated,
            E::Triggered,
            E::Canceled,
            E::Expired,
            E::Filled,
        ];
        all.into_iter()
            .filter(|kind| Self::transition(from, *kind).is_ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderEventKind as E;
    use OrderStatus as S;

    #[test]
    fn initialized_can_be_denied_or_submitted() {
        assert_eq!(
            OrderStateMachine::transition(S::Initialized, E::Denied).unwrap(),
            TransitionOutcome::To(S::Denied)
        );
        assert_eq!(
            OrderStateMachine::transition(S::Initialized, E::Submitted).unwrap(),
            TransitionOutcome::To(S::Submitted)
        );
        assert!(OrderStateMachine::transition(S::Initialized, E::Filled).is_err());
        assert!(OrderStateMachine::transition(S::Initialized, E::Accepted).is_err());
    }

    #[test]
    fn submitted_outcomes() {
        assert_eq!(
            OrderStateMachine::transition(S::Submitted, E::Accepted).unwrap(),
            TransitionOutcome::To(S::Accepted)
        );
        assert_eq!(
            OrderStateMachine::transition(S::Submitted, E::Filled).unwrap(),
            TransitionOutcome::Fill
        );
        assert!(OrderStateMachine::transition(S::Submitted, E::PendingUpdate).is_err());
        assert!(OrderStateMachine::transition(S::Submitted, E::Triggered).is_err());
    }

    #[test]
    fn accepted_cannot_be_rejected() {
        assert!(OrderStateMachine::transition(S::Accepted, E::Rejected).is_err());
    }

    #[test]
    fn accepted_update_keeps_status() {
        assert_eq!(
            OrderStateMachine::transition(S::Accepted, E::Updated).unwrap(),
            TransitionOutcome::To(S::Accepted)
        );
    }

    #[test]
    fn pending_states_roll_back_on_accepted() {
        assert_eq!(
            OrderStateMachine::transition(S::PendingUpdate, E::Accepted).unwrap(),
            TransitionOutcome::Rollback
        );
        assert_eq!(
            OrderStateMachine::transition(S::PendingCancel, E::Accepted).unwrap(),
            TransitionOutcome::Rollback
        );
    }

    #[test]
    fn pending_cancel_can_still_fill_or_expire() {
        assert_eq!(
            OrderStateMachine::transition(S::PendingCancel, E::Filled).unwrap(),
            TransitionOutcome::Fill
        );
        assert_eq!(
            OrderStateMachine::transition(S::PendingCancel, E::Expired).unwrap(),
            TransitionOutcome::To(S::Expired)
        );
        assert!(OrderStateMachine::transition(S::PendingCancel, E::Updated).is_err());
        assert!(OrderStateMachine::transition(S::PendingCancel, E::Triggered).is_err());
    }

    #[test]
    fn triggered_update_keeps_triggered() {
        assert_eq!(
            OrderStateMachine::transition(S::Triggered, E::Updated).unwrap(),
            TransitionOutcome::To(S::Triggered)
        );
        assert!(OrderStateMachine::transition(S::Triggered, E::Triggered).is_err());
    }

    #[test]
    fn no_transitions_from_terminal_states() {
        for terminal in [S::Denied, S::Rejected, S::Canceled, S::Expired, S::Filled] {
            assert!(OrderStateMachine::valid_events(terminal).is_empty());
        }
    }

    #[test]
    fn partially_filled_can_keep_filling() {
        assert_eq!(
            OrderStateMachine::transition(S::PartiallyFilled, E::Filled).unwrap(),
            TransitionOutcome::Fill
        );
    }

    #[test]
    fn valid_events_from_accepted() {
        let events = OrderStateMachine::valid_events(S::Accepted);
        assert!(events.contains(&E::PendingUpdate));
        assert!(events.contains(&E::Triggered));
        assert!(events.contains(&E::Filled));
        assert!(!events.contains(&E::Rejected));
        assert!(!events.contains(&E::Submitted));
    }
}
