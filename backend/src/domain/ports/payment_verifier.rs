//! Port for confirming payments with the payment provider.

use async_trait::async_trait;

use crate::domain::PaymentConfirmation;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment verification adapters.
    pub enum PaymentVerifierError {
        /// Payment provider could not be reached.
        Unavailable { message: String } => "payment provider unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Whether the provider confirms the payment as captured.
    async fn verify(&self, payment: &PaymentConfirmation) -> Result<bool, PaymentVerifierError>;
}

/// Stand-in verifier accepting any confirmation with non-blank identifiers.
///
/// Order creation and signature checks belong to the payment provider
/// integration, which is not wired in this service.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentVerifier;

#[async_trait]
impl PaymentVerifier for FixturePaymentVerifier {
    async fn verify(&self, payment: &PaymentConfirmation) -> Result<bool, PaymentVerifierError> {
        Ok(!payment.payment_id.trim().is_empty() && !payment.order_id.trim().is_empty())
    }
}
