//! Pricing calculator.
//!
//! Pure functions over the price snapshots captured at validation time.
//! Totals are computed exactly once, when the order is created, and are
//! never recomputed from later catalog prices.

use crate::money::Money;
use crate::order::OrderItem;

/// Returns the subtotal for one line (quantity * unit price).
pub fn item_subtotal(quantity: u32, unit_price: Money) -> Money {
    unit_price.multiply(quantity)
}

/// Returns the order total as the sum of all line subtotals.
pub fn order_total<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Money {
    items
        .into_iter()
        .fold(Money::zero(), |total, item| total + item.subtotal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    #[test]
    fn subtotal_multiplies() {
        assert_eq!(item_subtotal(3, Money::from_cents(1000)).cents(), 3000);
        assert_eq!(item_subtotal(1, Money::from_cents(999)).cents(), 999);
    }

    #[test]
    fn subtotal_of_zero_quantity_is_zero() {
        assert!(item_subtotal(0, Money::from_cents(1000)).is_zero());
    }

    #[test]
    fn total_sums_all_lines() {
        let items = vec![
            OrderItem::new(ProductId::new(1), 2, Money::from_cents(1000)),
            OrderItem::new(ProductId::new(2), 3, Money::from_cents(500)),
        ];

        assert_eq!(order_total(&items).cents(), 3500);
    }

    #[test]
    fn total_of_no_lines_is_zero() {
        assert!(order_total(&[]).is_zero());
    }

    #[test]
    fn total_matches_sum_of_subtotals() {
        let items = vec![
            OrderItem::new(ProductId::new(1), 7, Money::from_cents(125)),
            OrderItem::new(ProductId::new(2), 1, Money::from_cents(20000)),
            OrderItem::new(ProductId::new(3), 4, Money::from_cents(333)),
        ];

        let expected: i64 = items.iter().map(|i| i.subtotal().cents()).sum();
        assert_eq!(order_total(&items).cents(), expected);
    }

    #[test]
    fn three_units_at_ten_dollars_total_thirty() {
        let items = vec![OrderItem::new(
            ProductId::new(1),
            3,
            Money::from_dollars(10),
        )];

        assert_eq!(order_total(&items), Money::from_dollars(30));
    }
}
