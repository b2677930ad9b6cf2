//! Submittability checks over a draft snapshot
use super::draft::Draft;

/// Why a draft cannot be submitted. Variants are listed in reporting priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reason {
    NoCustomer,
    NoLineItems,
    ZeroQuantityItem,
    ZeroTotal,
    /// A line total or the order total does not fit the order amount type.
    AmountOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub submittable: bool,
    pub reason: Option<Reason>,
}

impl Verdict {
    pub fn ok() -> Self {
        Self {
            submittable: true,
            reason: None,
        }
    }
    pub fn blocked(reason: Reason) -> Self {
        Self {
            submittable: false,
            reason: Some(reason),
        }
    }
}

/// Evaluates a draft. When several checks fail, the first one in the order
/// NoCustomer, NoLineItems, ZeroQuantityItem, ZeroTotal, AmountOutOfRange
/// is reported.
pub fn evaluate(draft: &Draft) -> Verdict {
    if draft.customer().is_none() {
        return Verdict::blocked(Reason::NoCustomer);
    }
    if draft.line_items().is_empty() {
        return Verdict::blocked(Reason::NoLineItems);
    }
    if draft.line_items().iter().any(|item| item.quantity <= 0) {
        return Verdict::blocked(Reason::ZeroQuantityItem);
    }
    if draft.total() == 0 {
        return Verdict::blocked(Reason::ZeroTotal);
    }
    if !fits_order_amount(draft.total())
        || !draft
            .line_items()
            .iter()
            .all(|item| fits_order_amount(item.line_total()))
    {
        return Verdict::blocked(Reason::AmountOutOfRange);
    }

    Verdict::ok()
}

fn fits_order_amount(amount: i128) -> bool {
    u64::try_from(amount).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CustomerRef, Product};

    fn product(id: &str, price: u64) -> Product {
        Product {
            id: id.into(),
            name: format!("product {id}"),
            stock: 10,
            price,
        }
    }

    #[test]
    fn empty_draft_reports_no_customer_first() {
        let draft = Draft::default();
        assert_eq!(evaluate(&draft), Verdict::blocked(Reason::NoCustomer));
    }

    #[test]
    fn zero_quantity_outranks_zero_total() {
        let mut draft = Draft::default();
        draft.set_customer(CustomerRef::new("c1", "Ana"));
        draft.set_line_items(&[product("p1", 0)], 1);
        assert_eq!(evaluate(&draft), Verdict::blocked(Reason::ZeroTotal));

        draft.update_quantity("p1", 0);
        assert_eq!(evaluate(&draft), Verdict::blocked(Reason::ZeroQuantityItem));
    }

    #[test]
    fn negative_quantity_blocks_even_with_positive_total() {
        let mut draft = Draft::default();
        draft.set_customer(CustomerRef::new("c1", "Ana"));
        draft.set_line_items(&[product("p1", 10), product("p2", 50)], 1);
        draft.update_quantity("p1", -1);

        assert!(draft.total() > 0);
        assert_eq!(evaluate(&draft), Verdict::blocked(Reason::ZeroQuantityItem));
    }

    #[test]
    fn price_beyond_i64_keeps_an_exact_total() {
        let mut draft = Draft::default();
        draft.set_customer(CustomerRef::new("c1", "Ana"));
        draft.set_line_items(&[product("p1", u64::MAX)], 1);

        assert_eq!(draft.total(), i128::from(u64::MAX));
        assert_eq!(evaluate(&draft), Verdict::ok());
    }

    #[test]
    fn amounts_past_the_order_type_are_blocked() {
        let mut draft = Draft::default();
        draft.set_customer(CustomerRef::new("c1", "Ana"));
        draft.set_line_items(&[product("p1", 1 << 63)], 1);
        draft.update_quantity("p1", 2);

        assert_eq!(draft.total(), 1i128 << 64);
        assert_eq!(evaluate(&draft), Verdict::blocked(Reason::AmountOutOfRange));

        // each line fits but the sum does not
        draft.set_line_items(&[product("p1", 1 << 63), product("p2", 1 << 63)], 1);
        draft.update_quantity("p1", 1);
        assert_eq!(evaluate(&draft), Verdict::blocked(Reason::AmountOutOfRange));
    }

    #[test]
    fn complete_draft_is_submittable() {
        let mut draft = Draft::default();
        draft.set_customer(CustomerRef::new("c1", "Ana"));
        draft.set_line_items(&[product("p1", 10)], 1);
        assert_eq!(evaluate(&draft), Verdict::ok());
    }
}
