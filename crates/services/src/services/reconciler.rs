//! Order totals. All arithmetic is decimal; no value passes through a float.

use db::models::{
    amount::Amount,
    order::{NewOrderItem, OrderItem},
};

use super::validation::ValidationError;

/// `None` when quantity × unit_price does not fit in a decimal.
pub fn line_subtotal(quantity: i64, unit_price: Amount) -> Option<Amount> {
    unit_price.checked_times(quantity)
}

/// Σ quantity × unit_price over the lines about to be written.
pub fn order_total(items: &[NewOrderItem]) -> Result<Amount, ValidationError> {
    total(items.iter().map(|item| (item.quantity, item.unit_price)))
}

/// Same sum over lines already stored.
pub fn stored_total(items: &[OrderItem]) -> Result<Amount, ValidationError> {
    total(items.iter().map(|item| (item.quantity, item.unit_price)))
}

fn total(lines: impl Iterator<Item = (i64, Amount)>) -> Result<Amount, ValidationError> {
    lines
        .enumerate()
        .try_fold(Amount::ZERO, |total, (i, (quantity, unit_price))| {
            line_subtotal(quantity, unit_price)
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| {
                    ValidationError::new(
                        format!("items[{i}].unit_price"),
                        "puts the order total out of range",
                    )
                })
        })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn line(quantity: i64, price: &str) -> NewOrderItem {
        NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: price.parse().unwrap(),
        }
    }

    #[test]
    fn crc_total_is_exact() {
        let items = vec![line(3, "1500"), line(2, "99999999"), line(7, "1")];
        assert_eq!(
            order_total(&items).unwrap(),
            Amount::from(4_500 + 199_999_998 + 7)
        );
    }

    #[test]
    fn usd_total_has_no_float_drift() {
        let items: Vec<_> = (0..10).map(|_| line(1, "0.10")).collect();
        assert_eq!(order_total(&items).unwrap(), Amount::from(1));

        let items = vec![line(3, "19.99"), line(1, "0.03")];
        assert_eq!(order_total(&items).unwrap().to_string(), "60");
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order_total(&[]).unwrap(), Amount::ZERO);
    }

    #[test]
    fn stored_and_new_lines_agree() {
        let order_id = Uuid::new_v4();
        let new = vec![line(2, "12.5"), line(4, "0.25")];
        let stored: Vec<OrderItem> = new
            .iter()
            .enumerate()
            .map(|(i, item)| OrderItem {
                order_id,
                position: i as i64,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();
        assert_eq!(order_total(&new).unwrap(), stored_total(&stored).unwrap());
        assert_eq!(line_subtotal(4, "0.25".parse().unwrap()), Some(Amount::from(1)));
    }

    #[test]
    fn overflow_names_the_line() {
        let line_overflow = vec![line(1, "5"), line(i64::MAX, "10000000000")];
        let err = order_total(&line_overflow).unwrap_err();
        assert_eq!(err.field, "items[1].unit_price");

        let sum_overflow = vec![
            line(1, "50000000000000000000000000000"),
            line(1, "50000000000000000000000000000"),
        ];
        let err = order_total(&sum_overflow).unwrap_err();
        assert_eq!(err.field, "items[1].unit_price");
    }
}
