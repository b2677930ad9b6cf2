//! The in-progress order and the store that owns it
use super::catalog::{CustomerRef, Product};
use super::error::DraftError;
use super::notify::{Subscribers, SubscriptionId};
use super::validation::{self, Verdict};
use std::cell::RefCell;
use tracing::debug;

/// Quantity given to a product when it first enters the draft.
pub const DEFAULT_QUANTITY: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    // snapshot of the catalog entry at selection time
    pub product_id: String,
    pub name: String,
    pub unit_price: u64,
    // may be <= 0 while the user is still typing
    pub quantity: i64,
}

/// Customer, line items and a total that is always derived from the items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    customer: Option<CustomerRef>,
    line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl LineItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }
    /// Exact for every quantity and price: `|i64| x u64` fits in `i128`.
    pub fn line_total(&self) -> i128 {
        i128::from(self.quantity) * i128::from(self.unit_price)
    }
}

impl Draft {
    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }
    pub fn line_item(&self, product_id: &str) -> Option<&LineItem> {
        self.line_items
            .iter()
            .find(|item| item.product_id == product_id)
    }
    /// Sum of quantity x unit price over every line item. Only a draft with
    /// several lines near `i64::MAX x u64::MAX` can reach the `i128` bounds,
    /// where the sum saturates; such a draft is never submittable.
    pub fn total(&self) -> i128 {
        self.line_items
            .iter()
            .fold(0i128, |acc, item| acc.saturating_add(item.line_total()))
    }
    pub fn is_empty(&self) -> bool {
        self.customer.is_none() && self.line_items.is_empty()
    }
    /// An empty reference clears the selection.
    pub fn set_customer(&mut self, customer: CustomerRef) {
        self.customer = if customer.is_empty() {
            None
        } else {
            Some(customer)
        };
    }
    /// Replaces the line items with `selection`, in selection order. Products
    /// already in the draft keep their snapshot and quantity; new ones start at
    /// `default_quantity`. Repeated products in the selection are ignored.
    pub fn set_line_items(&mut self, selection: &[Product], default_quantity: i64) {
        let mut next: Vec<LineItem> = Vec::with_capacity(selection.len());

        for product in selection {
            if next.iter().any(|item| item.product_id == product.id) {
                continue;
            }
            let item = match self.line_item(&product.id) {
                Some(existing) => existing.clone(),
                None => LineItem::from_product(product, default_quantity),
            };
            next.push(item);
        }

        self.line_items = next;
    }
    /// Returns false when the product is not in the draft.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> bool {
        match self
            .line_items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }
    pub fn clear(&mut self) {
        self.customer = None;
        self.line_items.clear();
    }
}

/// Owns one draft for one order-creation view. Every mutation notifies the
/// subscribers synchronously, after the draft has been fully updated.
///
/// Subscribers receive the store itself, so they can read the total, the
/// verdict and the phase without borrowing it again.
pub struct DraftStore {
    draft: Draft,
    phase: SubmissionPhase,
    last_error: Option<String>,
    default_quantity: i64,
    subscribers: Subscribers<dyn FnMut(&DraftStore)>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::with_default_quantity(DEFAULT_QUANTITY)
    }
    pub fn with_default_quantity(default_quantity: i64) -> Self {
        Self {
            draft: Draft::default(),
            phase: SubmissionPhase::Idle,
            last_error: None,
            default_quantity,
            subscribers: Subscribers::new(),
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }
    pub fn total(&self) -> i128 {
        self.draft.total()
    }
    pub fn verdict(&self) -> Verdict {
        validation::evaluate(&self.draft)
    }
    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }
    /// Message of the last failed submission, cleared by the next edit.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
    /// True from the start of validation until the server has answered.
    pub fn is_frozen(&self) -> bool {
        matches!(
            self.phase,
            SubmissionPhase::Validating | SubmissionPhase::Submitting
        )
    }

    /// Callbacks receive the store. During an edit made through
    /// `borrow_mut()` on a shared cell they must use that argument rather than
    /// borrow the cell again; submission phase changes only hold a shared
    /// borrow.
    pub fn subscribe(&mut self, callback: impl FnMut(&DraftStore) + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn set_customer(&mut self, customer: CustomerRef) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.draft.set_customer(customer);
        self.edited();
        Ok(())
    }
    pub fn set_line_items(&mut self, selection: &[Product]) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.draft.set_line_items(selection, self.default_quantity);
        self.edited();
        Ok(())
    }
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), DraftError> {
        self.ensure_editable()?;
        if !self.draft.update_quantity(product_id, quantity) {
            return Err(DraftError::UnknownLineItem(product_id.to_string()));
        }
        self.edited();
        Ok(())
    }
    /// Clears the draft and returns it to `Idle`. Rejected while a submission
    /// is in flight.
    pub fn reset(&mut self) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.draft.clear();
        self.phase = SubmissionPhase::Idle;
        self.last_error = None;
        self.notify();
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), DraftError> {
        if self.is_frozen() {
            return Err(DraftError::Frozen);
        }
        Ok(())
    }
    fn edited(&mut self) {
        self.last_error = None;
        self.notify();
    }
    fn notify(&self) {
        self.subscribers.snapshot().each(|callback| callback(self));
    }
}

/// Moves a shared draft to `phase`, then notifies with only a shared borrow of
/// the cell held, so views may read the draft through their own handle.
pub(crate) fn transition(store: &RefCell<DraftStore>, phase: SubmissionPhase) {
    {
        let mut store = store.borrow_mut();
        debug!(from = ?store.phase, to = ?phase, "draft phase transition");
        store.phase = phase;
    }
    notify_shared(store);
}

/// Failed, then back to Idle with the draft untouched.
pub(crate) fn fail(store: &RefCell<DraftStore>, message: String) {
    store.borrow_mut().last_error = Some(message);
    transition(store, SubmissionPhase::Failed);
    transition(store, SubmissionPhase::Idle);
}

/// Called once the order exists on the server.
pub(crate) fn succeed(store: &RefCell<DraftStore>) {
    transition(store, SubmissionPhase::Succeeded);
    {
        let mut store = store.borrow_mut();
        store.draft.clear();
        store.last_error = None;
    }
    transition(store, SubmissionPhase::Idle);
}

fn notify_shared(store: &RefCell<DraftStore>) {
    let subscribers = store.borrow().subscribers.snapshot();
    subscribers.each(|callback| {
        let current = store.borrow();
        callback(&*current)
    });
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}
