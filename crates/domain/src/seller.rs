//! Seller consistency accumulator.

use common::UserId;
use thiserror::Error;

/// Raised when a line item resolves to a different seller than the one
/// established by the first item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all items must belong to seller {expected}, but found seller {found}")]
pub struct SellerMismatch {
    /// The seller established by the first item.
    pub expected: UserId,
    /// The conflicting seller.
    pub found: UserId,
}

/// Tracks the single seller an order is allowed to span.
///
/// The first observed seller establishes the order's seller; every
/// subsequent observation must match. This is the explicit accumulator
/// threaded through the coordinator's validation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SellerConsistency {
    seller: Option<UserId>,
}

impl SellerConsistency {
    /// Creates an accumulator with no seller established yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes the resolved seller of the next line item.
    pub fn observe(&mut self, seller_id: UserId) -> Result<(), SellerMismatch> {
        match self.seller {
            None => {
                self.seller = Some(seller_id);
                Ok(())
            }
            Some(expected) if expected == seller_id => Ok(()),
            Some(expected) => Err(SellerMismatch {
                expected,
                found: seller_id,
            }),
        }
    }

    /// Returns the established seller, if any item has been observed.
    pub fn seller(&self) -> Option<UserId> {
        self.seller
    }
}
