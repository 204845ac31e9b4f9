use anyhow::Result;

use crate::models::{History, PaymentHistory};

/// Persistence boundary for the tracker. The most recent save must be
/// what the next load returns; nothing stronger is assumed.
pub trait RecordStore {
    fn load_history(&self) -> Result<History>;
    fn save_history(&mut self, history: &History) -> Result<()>;
    fn load_payments(&self) -> Result<PaymentHistory>;
    fn save_payments(&mut self, payments: &PaymentHistory) -> Result<()>;
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: History,
    payments: PaymentHistory,
}

#[cfg(test)]
impl RecordStore for MemoryStore {
    fn load_history(&self) -> Result<History> {
        Ok(self.history.clone())
    }

    fn save_history(&mut self, history: &History) -> Result<()> {
        self.history = history.clone();
        Ok(())
    }

    fn load_payments(&self) -> Result<PaymentHistory> {
        Ok(self.payments.clone())
    }

    fn save_payments(&mut self, payments: &PaymentHistory) -> Result<()> {
        self.payments = payments.clone();
        Ok(())
    }
}
