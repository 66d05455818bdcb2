//! # Payment Commands
//!
//! The payment panel of the active tab.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Method      [cash] upi  card  split  due     │  set_payment_method
//! │  Tendered    [ 600.00 ]                       │  set_tendered
//! │  Change      [  50.00 ]  (owed 100.00)        │  set_change_returned
//! │  Use credit  [   0.00 ]  (available 200.00)   │  set_credit
//! │                                               │
//! │  Split: cash 200.00 + upi 300.00 = 500.00 ✓   │  apply_split
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Amounts arrive as typed text and are parsed here. Negative tendered and
//! credit amounts are refused at entry; change returned is only range
//! checked at checkout, where over-returning change is a `Reject`.

use tracing::{debug, info};

use shopfront_core::validation::{parse_amount, validate_non_negative};
use shopfront_core::{Money, PaymentMethod, SplitComposer, TenderField};

use super::cart::{edit_active, CartResponse};
use crate::error::ApiError;
use crate::state::RegisterState;

/// Picks a method. Choosing `split` here only marks the intent; use
/// [`apply_split`] to record the tenders.
pub fn set_payment_method(register: &RegisterState, method: &str) -> Result<CartResponse, ApiError> {
    let method: PaymentMethod = method.parse()?;
    debug!(method = %method, "set_payment_method command");
    edit_active(register, |s| {
        s.set_payment_method(method);
        Ok(())
    })
}

pub fn set_tendered(register: &RegisterState, amount: &str) -> Result<CartResponse, ApiError> {
    let amount = validate_non_negative("tendered", parse_amount("tendered", amount)?)?;
    debug!(amount = %amount, "set_tendered command");
    edit_active(register, |s| {
        s.set_amount_tendered(amount);
        Ok(())
    })
}

pub fn set_change_returned(register: &RegisterState, amount: &str) -> Result<CartResponse, ApiError> {
    let amount = parse_amount("change", amount)?;
    debug!(amount = %amount, "set_change_returned command");
    edit_active(register, |s| {
        s.set_change_returned(amount);
        Ok(())
    })
}

/// Requests store credit; the applied amount is clamped to what the
/// customer has and what the sale costs.
pub fn set_credit(register: &RegisterState, amount: &str) -> Result<CartResponse, ApiError> {
    let amount = validate_non_negative("credit", parse_amount("credit", amount)?)?;
    debug!(amount = %amount, "set_credit command");
    edit_active(register, |s| {
        let applied = s.set_credit_requested(amount);
        if applied != amount {
            debug!(requested = %amount, applied = %applied, "Credit request clamped");
        }
        Ok(())
    })
}

/// Records a split payment. The tenders must add up to the amount due
/// exactly; otherwise the tab is left as it was.
pub fn apply_split(
    register: &RegisterState,
    tenders: &[(PaymentMethod, Money)],
) -> Result<CartResponse, ApiError> {
    debug!(tenders = tenders.len(), "apply_split command");

    let mut composer = SplitComposer::new();
    for (method, amount) in tenders {
        let index = composer.add_tender();
        composer.set_tender(index, TenderField::Method(*method))?;
        composer.set_tender(index, TenderField::Amount(*amount))?;
    }

    edit_active(register, |s| {
        let total = composer.apply(s)?;
        info!(session_id = %s.id, total = %total, legs = tenders.len(), "Split payment applied");
        Ok(())
    })
}

/// Parses `cash=200 upi=300` into tender pairs.
pub fn parse_tenders(input: &str) -> Result<Vec<(PaymentMethod, Money)>, ApiError> {
    input
        .split_whitespace()
        .map(|part| {
            let (method, amount) = part.split_once('=').ok_or_else(|| {
                ApiError::validation(format!("expected method=amount, got '{}'", part))
            })?;
            let method: PaymentMethod = method.parse()?;
            Ok::<_, ApiError>((method, parse_amount("tender", amount)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::item;
    use crate::error::ErrorCode;
    use shopfront_core::{Customer, ReconciliationOutcome, RejectReason};

    /// Register whose active tab owes 500.00.
    fn register() -> RegisterState {
        let register = RegisterState::in_memory();
        register
            .with_manager_mut(|m| m.with_active_mut(|s| s.add_line(&item("RICE", 50000, 5))))
            .unwrap();
        register
    }

    #[test]
    fn test_tendered_and_change() {
        let register = register();

        let err = set_tendered(&register, "-5").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let err = set_tendered(&register, "abc").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let cart = set_tendered(&register, "600").unwrap();
        assert_eq!(cart.settlement.change_required, Money::from_cents(10000));

        let cart = set_change_returned(&register, "150").unwrap();
        assert_eq!(
            cart.preview,
            ReconciliationOutcome::Reject(RejectReason::ExcessChangeReturned)
        );

        let cart = set_change_returned(&register, "100").unwrap();
        assert_eq!(cart.preview, ReconciliationOutcome::Proceed);
    }

    #[test]
    fn test_split_exact_amount() {
        let register = register();

        let err = apply_split(&register, &parse_tenders("cash=200 upi=250").unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(
            register.with_manager(|m| m.active().payment_method),
            PaymentMethod::Cash
        );

        let cart = apply_split(&register, &parse_tenders("cash=200 upi=300").unwrap()).unwrap();
        assert_eq!(cart.session.payment_method, PaymentMethod::Split);
        assert_eq!(cart.session.amount_tendered, Money::from_cents(50000));
        assert_eq!(cart.session.tenders.len(), 2);
        assert_eq!(cart.preview, ReconciliationOutcome::Proceed);

        // Switching away drops the breakdown
        let cart = set_payment_method(&register, "upi").unwrap();
        assert!(cart.session.tenders.is_empty());
    }

    #[test]
    fn test_split_rejects_bad_legs() {
        let register = register();

        let err = apply_split(&register, &[(PaymentMethod::CreditDue, Money::from_cents(50000))])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let err = apply_split(&register, &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        assert!(parse_tenders("cash200").is_err());
        assert!(parse_tenders("cheque=10").is_err());
    }

    #[test]
    fn test_credit_is_clamped() {
        let register = register();
        register.with_manager_mut(|m| {
            m.with_active_mut(|s| {
                s.set_customer(Some(Customer {
                    id: "c-1".to_string(),
                    name: "Meera Shah".to_string(),
                    phone: None,
                    dues: Money::from_cents(-20000),
                }))
            })
        });

        let cart = set_credit(&register, "300").unwrap();
        assert_eq!(cart.session.credit_requested, Money::from_cents(20000));
        assert_eq!(cart.settlement.amount_due, Money::from_cents(30000));
    }
}
