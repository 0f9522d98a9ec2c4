use serde::{Deserialize, Serialize};
use shop_common::Money;

use crate::db_types::{CartItem, Product};

/// One cart line joined with the current product catalogue entry. Prices here are *live*; the frozen snapshot is
/// only taken at order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub selected: bool,
    pub line_total: Money,
}

impl CartLine {
    pub fn new(item: &CartItem, product: &Product) -> Self {
        Self {
            product_id: item.product_id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: item.quantity,
            selected: item.selected,
            line_total: product.price * item.quantity,
        }
    }
}

/// A customer-facing rendering of the cart.
///
/// `checkout_total` sums the lines that would be checked out right now: the selected lines, or every line when
/// nothing is selected (the same auto-select fallback order creation applies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: i64,
    pub customer_id: i64,
    pub lines: Vec<CartLine>,
    pub checkout_total: Money,
}

impl CartView {
    pub fn new(cart_id: i64, customer_id: i64, lines: Vec<CartLine>) -> Self {
        let any_selected = lines.iter().any(|l| l.selected);
        let checkout_total =
            lines.iter().filter(|l| l.selected || !any_selected).map(|l| l.line_total).sum();
        Self { cart_id, customer_id, lines, checkout_total }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(product_id: i64, price: i64, qty: i64, selected: bool) -> CartLine {
        CartLine {
            product_id,
            product_name: format!("product-{product_id}"),
            unit_price: Money::from(price),
            quantity: qty,
            selected,
            line_total: Money::from(price) * qty,
        }
    }

    #[test]
    fn total_covers_selected_lines_only() {
        let view = CartView::new(1, 10, vec![line(1, 100, 2, true), line(2, 50, 1, false)]);
        assert_eq!(view.checkout_total, Money::from(200));
    }

    #[test]
    fn total_falls_back_to_all_lines_when_none_selected() {
        let view = CartView::new(1, 10, vec![line(1, 100, 2, false), line(2, 50, 1, false)]);
        assert_eq!(view.checkout_total, Money::from(250));
    }
}
