use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::history::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub amount: i64,
    pub paid_at: DateTime<Utc>,
    pub covered_range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Append-only payment log. `total_paid` always equals the sum of amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Payment>", into = "Vec<Payment>")]
pub struct PaymentHistory {
    records: Vec<Payment>,
    total_paid: i64,
}

impl From<Vec<Payment>> for PaymentHistory {
    fn from(mut records: Vec<Payment>) -> Self {
        records.sort_by_key(|p| p.paid_at);
        let total_paid = records
            .iter()
            .map(|p| p.amount)
            .fold(0, i64::saturating_add);
        Self { records, total_paid }
    }
}

impl From<PaymentHistory> for Vec<Payment> {
    fn from(history: PaymentHistory) -> Self {
        history.records
    }
}

impl PaymentHistory {
    pub fn records(&self) -> &[Payment] {
        &self.records
    }

    pub fn total_paid(&self) -> i64 {
        self.total_paid
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a payment stamped now. Amounts above what is owed are
    /// accepted; they never turn into credit.
    pub fn record_payment(
        &mut self,
        amount: i64,
        covered_range: DateRange,
        method: Option<String>,
    ) -> TrackerResult<Payment> {
        self.record_payment_at(amount, covered_range, method, Utc::now())
    }

    pub fn record_payment_at(
        &mut self,
        amount: i64,
        covered_range: DateRange,
        method: Option<String>,
        paid_at: DateTime<Utc>,
    ) -> TrackerResult<Payment> {
        if amount <= 0 {
            return Err(TrackerError::InvalidAmount(amount));
        }
        let total_paid = self
            .total_paid
            .checked_add(amount)
            .ok_or(TrackerError::AmountOverflow(amount))?;
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            amount,
            paid_at,
            covered_range,
            method: method.filter(|m| !m.trim().is_empty()),
        };
        self.records.push(payment.clone());
        self.total_paid = total_paid;
        Ok(payment)
    }

}
