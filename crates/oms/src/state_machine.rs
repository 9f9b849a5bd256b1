//! Order state machine (§4.6): the exact transition table, enforced for
//! every status change an `Order` goes through. No other module is allowed
//! to assign `Order::status` directly.

use domain::{Error, OrderStatus};

/// Validates `from -> to`. Returns `InvalidTransition` without mutating
/// anything on failure — the caller owns the `Order` and only writes the
/// new status after this returns `Ok`.
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), Error> {
    use OrderStatus::*;
    let allowed: &[OrderStatus] = match from {
        New => &[Submitted, Rejected],
        Submitted => &[Resting, Partial, Filled, Rejected, Canceled],
        Resting => &[Partial, Filled, Canceled],
        Partial => &[Filled, Canceled],
        Filled => &[Closed],
        Canceled | Rejected | Closed => &[],
    };
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition(format!("{from:?} -> {to:?} is not a valid transition")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn new_to_submitted_is_valid() {
        assert!(validate_transition(New, Submitted).is_ok());
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for terminal in [Canceled, Rejected, Closed] {
            for to in [New, Submitted, Resting, Partial, Filled, Canceled, Rejected, Closed] {
                assert!(validate_transition(terminal, to).is_err());
            }
        }
    }

    #[test]
    fn resting_cannot_skip_to_closed() {
        assert!(validate_transition(Resting, Closed).is_err());
    }

    #[test]
    fn filled_can_only_close() {
        assert!(validate_transition(Filled, Closed).is_ok());
        assert!(validate_transition(Filled, Canceled).is_err());
    }

    #[test]
    fn full_happy_path_chain() {
        assert!(validate_transition(New, Submitted).is_ok());
        assert!(validate_transition(Submitted, Resting).is_ok());
        assert!(validate_transition(Resting, Partial).is_ok());
        assert!(validate_transition(Partial, Filled).is_ok());
        assert!(validate_transition(Filled, Closed).is_ok());
    }
}
