//! # Stock Evaluation
//!
//! Pure classification of a product's stock against a requested quantity.
//! Nothing here touches persistence; callers hand in the product they already
//! resolved. Warnings are ephemeral and regenerated on every read.

use crate::product::{Product, ProductStatus};
use serde::{Deserialize, Serialize};

/// Classification of one cart line against current product state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Fully satisfiable
    Available,
    /// Quantity on hand is zero
    OutOfStock,
    /// Some stock, but less than requested
    LimitedStock,
    /// Withdrawn from sale; takes precedence over remaining stock
    Discontinued,
}

impl StockStatus {
    /// True when this classification blocks checkout for the line
    pub fn blocks_checkout(&self) -> bool {
        !matches!(self, StockStatus::Available)
    }
}

/// Kind of stock warning surfaced to the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockWarningKind {
    OutOfStock,
    LimitedStock,
    Discontinued,
}

/// A warning for one unsatisfiable (or partially satisfiable) cart line.
///
/// Never persisted; produced fresh on every read/sync so it always reflects
/// current product state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWarning {
    pub product_id: String,
    pub product_name: String,
    pub kind: StockWarningKind,
    /// Quantity currently on hand (useful for LIMITED_STOCK messaging)
    pub available: u32,
}

/// Classify a product's stock against a requested quantity.
///
/// First match wins, in this order:
/// 1. Discontinued status
/// 2. Zero quantity
/// 3. Quantity below the request
/// 4. Available
pub fn evaluate(product: &Product, requested: u32) -> StockStatus {
    if product.status == ProductStatus::Discontinued {
        StockStatus::Discontinued
    } else if product.quantity == 0 {
        StockStatus::OutOfStock
    } else if product.quantity < requested {
        StockStatus::LimitedStock
    } else {
        StockStatus::Available
    }
}

/// Evaluate a line and wrap any non-Available classification into a warning.
/// `None` means the line is fully satisfiable.
pub fn check_stock_and_warn(product: &Product, requested: u32) -> Option<StockWarning> {
    let kind = match evaluate(product, requested) {
        StockStatus::Available => return None,
        StockStatus::OutOfStock => StockWarningKind::OutOfStock,
        StockStatus::LimitedStock => StockWarningKind::LimitedStock,
        StockStatus::Discontinued => StockWarningKind::Discontinued,
    };
    Some(StockWarning {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        kind,
        available: product.quantity,
    })
}

/// Evaluate every line for checkout. Returns the complete list of failing
/// lines; an empty vec means the whole cart is purchasable. Partial checkout
/// is not supported, so any entry here fails the entire operation.
pub fn check_stock_availability<'a, I>(lines: I) -> Vec<StockWarning>
where
    I: IntoIterator<Item = (&'a Product, u32)>,
{
    lines
        .into_iter()
        .filter_map(|(product, requested)| check_stock_and_warn(product, requested))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Currency, Price};

    fn product(quantity: u32, status: ProductStatus) -> Product {
        Product::new("p1", "Widget", Price::new(10.0, Currency::USD), quantity)
            .with_status(status)
    }

    #[test]
    fn test_zero_quantity_is_out_of_stock_regardless_of_request() {
        let p = product(0, ProductStatus::Available);
        assert_eq!(evaluate(&p, 1), StockStatus::OutOfStock);
        assert_eq!(evaluate(&p, 50), StockStatus::OutOfStock);
    }

    #[test]
    fn test_discontinued_beats_sufficient_stock() {
        let p = product(100, ProductStatus::Discontinued);
        assert_eq!(evaluate(&p, 1), StockStatus::Discontinued);
    }

    #[test]
    fn test_discontinued_beats_zero_quantity() {
        let p = product(0, ProductStatus::Discontinued);
        assert_eq!(evaluate(&p, 1), StockStatus::Discontinued);
    }

    #[test]
    fn test_insufficient_quantity_is_limited() {
        let p = product(2, ProductStatus::Available);
        assert_eq!(evaluate(&p, 3), StockStatus::LimitedStock);
    }

    #[test]
    fn test_satisfiable_request_has_no_warning() {
        let p = product(5, ProductStatus::Available);
        assert_eq!(evaluate(&p, 5), StockStatus::Available);
        assert!(check_stock_and_warn(&p, 5).is_none());
    }

    #[test]
    fn test_warning_carries_product_identity_and_availability() {
        let p = product(1, ProductStatus::Available);
        let warning = check_stock_and_warn(&p, 4).unwrap();
        assert_eq!(warning.product_id, "p1");
        assert_eq!(warning.product_name, "Widget");
        assert_eq!(warning.kind, StockWarningKind::LimitedStock);
        assert_eq!(warning.available, 1);
    }

    #[test]
    fn test_availability_check_collects_all_failures() {
        let ok = product(5, ProductStatus::Available);
        let mut limited = product(1, ProductStatus::Available);
        limited.id = "p2".into();
        let mut gone = product(3, ProductStatus::Discontinued);
        gone.id = "p3".into();

        let warnings = check_stock_availability([(&ok, 3), (&limited, 2), (&gone, 1)]);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].product_id, "p2");
        assert_eq!(warnings[1].product_id, "p3");
    }
}
