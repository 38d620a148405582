//! # Payment Split Calculation
//!
//! Pure fee/earnings arithmetic plus the narrow trait through which the
//! booking engine talks to the payment processor. The calculator never moves
//! money itself and carries no retry logic; retries belong to the processor
//! collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

/// A named fee policy. Two distinct policies exist in production (standard
/// vs instant booking) and are configured separately; they are deliberately
/// not unified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeePolicy {
    /// Platform share of the total, e.g. 0.10.
    pub rate: f64,
    pub min_amount_cents: i64,
    pub max_amount_cents: i64,
}

/// The platform/expert division of one booking's total.
///
/// Invariant: `platform_fee + expert_earnings == total_amount`, for every
/// valid total. Earnings absorb the rounding remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub total_amount: i64,
    pub platform_fee: i64,
    pub expert_earnings: i64,
}

impl FeePolicy {
    pub fn compute_split(&self, total_amount: i64) -> PaymentSplit {
        let platform_fee = (total_amount as f64 * self.rate).round() as i64;
        PaymentSplit {
            total_amount,
            platform_fee,
            expert_earnings: total_amount - platform_fee,
        }
    }

    /// Rejects totals outside the configured booking range.
    pub fn validate_amount(&self, total_amount: i64) -> BookingResult<()> {
        if total_amount < self.min_amount_cents || total_amount > self.max_amount_cents {
            return Err(BookingError::Validation(format!(
                "total_amount {} outside allowed range [{}, {}]",
                total_amount, self.min_amount_cents, self.max_amount_cents
            )));
        }
        Ok(())
    }
}

/// Reference returned by a successful hold request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHold {
    pub reference: String,
    /// Token the booking client uses to finish the payment flow.
    pub client_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub reference: String,
    pub amount: i64,
}

/// Charge/payout capability of an expert's payout destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DestinationStatus {
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
}

impl DestinationStatus {
    pub fn is_usable(&self) -> bool {
        self.charges_enabled && self.payouts_enabled
    }
}

/// The three-operation interface to the payment processor. Everything the
/// booking engine ever asks of the processor goes through these calls.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Authorizes (but does not capture) `amount` against the client,
    /// earmarking `fee_amount` for the platform and the remainder for
    /// `destination_account`.
    async fn create_hold(
        &self,
        amount: i64,
        destination_account: &str,
        fee_amount: i64,
    ) -> BookingResult<PaymentHold>;

    /// Reverses a captured hold, including the platform fee and the expert
    /// transfer. `amount: None` means a full refund.
    async fn refund(
        &self,
        reference: &str,
        amount: Option<i64>,
        reason: Option<&str>,
    ) -> BookingResult<RefundRecord>;

    async fn get_destination_status(
        &self,
        destination_account: &str,
    ) -> BookingResult<DestinationStatus>;
}
