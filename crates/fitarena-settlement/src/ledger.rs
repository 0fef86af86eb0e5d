//! Minting ledger interface
//!
//! The reward-token contract is an external collaborator: a mint either
//! succeeds with a receipt or fails. The ledger may be called at least
//! once; the claim engine's own guard keeps it to at most one call per
//! successful claim.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use fitarena_types::{AccountId, ArenaError, ReceiptId, Result};

/// Proof of a completed mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub id: ReceiptId,
    pub amount: Decimal,
    pub recipient: AccountId,
    pub minted_at: DateTime<Utc>,
}

/// Adapter onto the reward-token contract.
#[async_trait::async_trait]
pub trait MintingLedger: Send + Sync {
    async fn mint(&self, amount: Decimal, recipient: &AccountId) -> Result<MintReceipt>;
}

/// In-memory ledger for tests and local runs, with failure injection.
pub struct InMemoryMintLedger {
    receipts: Arc<RwLock<Vec<MintReceipt>>>,
    failing: Arc<RwLock<bool>>,
}

impl InMemoryMintLedger {
    pub fn new() -> Self {
        Self {
            receipts: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every subsequent mint fail until cleared.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn receipts(&self) -> Vec<MintReceipt> {
        self.receipts.read().await.clone()
    }

    pub async fn mint_count(&self) -> usize {
        self.receipts.read().await.len()
    }
}

impl Default for InMemoryMintLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MintingLedger for InMemoryMintLedger {
    async fn mint(&self, amount: Decimal, recipient: &AccountId) -> Result<MintReceipt> {
        if *self.failing.read().await {
            return Err(ArenaError::mint("token contract rejected the transaction"));
        }
        let receipt = MintReceipt {
            id: ReceiptId::new(),
            amount,
            recipient: recipient.clone(),
            minted_at: Utc::now(),
        };
        self.receipts.write().await.push(receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(n: u8) -> AccountId {
        AccountId::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[tokio::test]
    async fn mint_records_a_receipt() {
        let ledger = InMemoryMintLedger::new();
        let receipt = ledger.mint(dec!(200), &account(1)).await.unwrap();
        assert_eq!(receipt.amount, dec!(200));
        assert_eq!(receipt.recipient, account(1));
        assert_eq!(ledger.mint_count().await, 1);
    }

    #[tokio::test]
    async fn failure_injection() {
        let ledger = InMemoryMintLedger::new();
        ledger.set_failing(true).await;
        assert!(matches!(
            ledger.mint(dec!(200), &account(1)).await,
            Err(ArenaError::MintFailure { .. })
        ));
        assert_eq!(ledger.mint_count().await, 0);
    }
}
