//! Totals engine: subtotal, discounts, tax, and balance due.
//!
//! All arithmetic is plain f64 in document order. Discounts come in two
//! layers (per-row percent and an overall percent on the subtotal) and both
//! collapse to zero when the discount field group is hidden; tax likewise
//! only applies when its group is shown.

use crate::model::{InvoiceState, LineItem};

/// Derived money figures for one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// Σ quantity × price, before any discount.
    pub subtotal: f64,
    /// Σ of each row's gross × its discount percent.
    pub per_line_discount: f64,
    /// Amount from the overall percent, taken on the raw subtotal.
    pub overall_discount: f64,
    /// Both discount layers, 0 when discounts are hidden.
    pub total_discount: f64,
    /// Subtotal less discounts.
    pub after_discount: f64,
    /// Tax on the post-discount amount, 0 when tax is hidden.
    pub tax: f64,
    /// after_discount + tax.
    pub grand_total: f64,
}

impl Totals {
    /// Totals for a state, honouring its tax and discount toggles.
    pub fn of(state: &InvoiceState) -> Totals {
        compute(
            &state.items,
            state.discount,
            state.tax_rate,
            state.active_fields.discount,
            state.active_fields.tax,
        )
    }
}

/// Core computation, parameterised so callers can evaluate hypothetical
/// toggle combinations.
pub fn compute(
    items: &[LineItem],
    overall_discount_percent: f64,
    tax_rate: f64,
    discount_enabled: bool,
    tax_enabled: bool,
) -> Totals {
    let subtotal: f64 = items.iter().map(LineItem::gross).sum();

    let (per_line_discount, overall_discount) = if discount_enabled {
        let per_line: f64 = items
            .iter()
            .map(|item| item.gross() * item.discount / 100.0)
            .sum();
        (per_line, subtotal * overall_discount_percent / 100.0)
    } else {
        (0.0, 0.0)
    };

    let total_discount = per_line_discount + overall_discount;
    let after_discount = subtotal - total_discount;
    let tax = if tax_enabled {
        after_discount * tax_rate / 100.0
    } else {
        0.0
    };

    Totals {
        subtotal,
        per_line_discount,
        overall_discount,
        total_discount,
        after_discount,
        tax,
        grand_total: after_discount + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{sample_invoice, LineItem};
    use pretty_assertions::assert_eq;

    fn item(quantity: f64, price: f64, discount: f64) -> LineItem {
        LineItem {
            description: String::new(),
            quantity,
            price,
            discount,
        }
    }

    #[test]
    fn tax_only() {
        let totals = compute(&[item(2.0, 50.0, 0.0)], 0.0, 10.0, false, true);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.total_discount, 0.0);
        assert_eq!(totals.tax, 10.0);
        assert_eq!(totals.grand_total, 110.0);
    }

    #[test]
    fn layered_discounts_without_tax() {
        // Overall percent is taken on the raw subtotal, not on the
        // post-row-discount amount.
        let totals = compute(&[item(1.0, 200.0, 10.0)], 5.0, 10.0, true, false);
        assert_eq!(totals.subtotal, 200.0);
        assert_eq!(totals.per_line_discount, 20.0);
        assert_eq!(totals.overall_discount, 10.0);
        assert_eq!(totals.total_discount, 30.0);
        assert_eq!(totals.after_discount, 170.0);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.grand_total, 170.0);
    }

    #[test]
    fn hidden_discount_zeroes_both_layers() {
        let totals = compute(&[item(1.0, 200.0, 10.0)], 5.0, 0.0, false, false);
        assert_eq!(totals.total_discount, 0.0);
        assert_eq!(totals.grand_total, 200.0);
    }

    #[test]
    fn tax_applies_after_discount() {
        let totals = compute(&[item(1.0, 100.0, 0.0)], 20.0, 10.0, true, true);
        assert_eq!(totals.after_discount, 80.0);
        assert_eq!(totals.tax, 8.0);
        assert_eq!(totals.grand_total, 88.0);
    }

    #[test]
    fn empty_items_are_all_zero() {
        let totals = compute(&[], 5.0, 10.0, true, true);
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn of_reads_the_state_toggles() {
        let mut state = sample_invoice();
        let with_tax = Totals::of(&state);
        assert!(with_tax.tax > 0.0);

        state.active_fields.tax = false;
        let without = Totals::of(&state);
        assert_eq!(without.tax, 0.0);
        assert!(without.grand_total < with_tax.grand_total);
    }
}
