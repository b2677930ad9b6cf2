//! Order submission: validating, freezing the draft, and resolving the
//! transport result into cache and draft updates
use super::cache::CacheStore;
use super::catalog::{CustomerRef, Order, OrderLine, OrderStatus, Record, TimeStamp};
use super::draft::{self, DraftStore, SubmissionPhase};
use super::error::{SessionError, TransportError};
use super::sync::MutationSynchronizer;
use super::transport::{OrderCreated, OrderInput};
use super::validation::Reason;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{info, warn};

/// A validated order on its way to the server. The originating draft stays
/// frozen until [`PendingSubmission::resolve`] runs.
///
/// Only weak handles to the draft and cache are held: if the view or session
/// that owned them is gone by the time the server answers, the local updates
/// are skipped.
pub struct PendingSubmission {
    input: OrderInput,
    customer: CustomerRef,
    draft: Weak<RefCell<DraftStore>>,
    cache: Weak<RefCell<CacheStore>>,
    sync: MutationSynchronizer,
    error_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded(Order),
    Failed {
        error: TransportError,
        message: String, // what the view shows
    },
}

impl PendingSubmission {
    /// Idle -> Validating -> Submitting. On a failed check the draft goes back
    /// to Idle and the reason is returned.
    pub fn begin(
        draft: &Rc<RefCell<DraftStore>>,
        cache: &Rc<RefCell<CacheStore>>,
        sync: &MutationSynchronizer,
        status: OrderStatus,
        error_prefix: &str,
    ) -> Result<Self, SessionError> {
        if draft.borrow().is_frozen() {
            return Err(SessionError::SubmissionInFlight);
        }

        draft::transition(draft, SubmissionPhase::Validating);
        let checked = {
            let store = draft.borrow();
            match store.verdict().reason {
                Some(reason) => Err(reason),
                None => build_input(&store, status).ok_or(Reason::AmountOutOfRange),
            }
        };
        let (customer, input) = match checked {
            Ok(built) => built,
            Err(reason) => {
                draft::transition(draft, SubmissionPhase::Idle);
                return Err(SessionError::Validation(reason));
            }
        };
        draft::transition(draft, SubmissionPhase::Submitting);

        info!(
            customer = %input.customer_id,
            lines = input.lines.len(),
            total = input.total,
            "submitting order"
        );

        Ok(Self {
            input,
            customer,
            draft: Rc::downgrade(draft),
            cache: Rc::downgrade(cache),
            sync: sync.clone(),
            error_prefix: error_prefix.to_string(),
        })
    }

    /// The payload to send with the create-order call.
    pub fn input(&self) -> &OrderInput {
        &self.input
    }

    /// Applies the server's answer. On success the new order is appended to
    /// the cached order lists and the draft is cleared; on failure the draft is
    /// left as it was and unfrozen so the user can retry.
    pub fn resolve(self, result: Result<OrderCreated, TransportError>) -> SubmissionOutcome {
        match result {
            Ok(created) => {
                let order = Order {
                    id: created.id,
                    customer: self.customer,
                    lines: self.input.lines,
                    total: self.input.total,
                    status: self.input.status,
                    created_at: TimeStamp::new(),
                };
                info!(id = %order.id, "order created");

                match self.cache.upgrade() {
                    Some(cache) => {
                        let record = Record::Order(order.clone());
                        self.sync.apply_created(&mut cache.borrow_mut(), &record);
                        CacheStore::publish(&cache);
                    }
                    None => warn!(id = %order.id, "session closed before order was created"),
                }
                if let Some(draft) = self.draft.upgrade() {
                    draft::succeed(&draft);
                }

                SubmissionOutcome::Succeeded(order)
            }
            Err(error) => {
                let message = error.display_message(&self.error_prefix);
                warn!(%error, "order submission failed");

                if let Some(draft) = self.draft.upgrade() {
                    draft::fail(&draft, message.clone());
                }

                SubmissionOutcome::Failed { error, message }
            }
        }
    }
}

// None when a quantity or amount does not fit the order types
fn build_input(store: &DraftStore, status: OrderStatus) -> Option<(CustomerRef, OrderInput)> {
    let draft = store.draft();
    let customer = draft.customer()?.clone();

    let mut lines = Vec::with_capacity(draft.line_items().len());
    for item in draft.line_items() {
        let quantity = u64::try_from(item.quantity).ok()?;
        lines.push(OrderLine {
            product_id: item.product_id.clone(),
            quantity,
            name: item.name.clone(),
            line_total: u64::try_from(item.line_total()).ok()?,
        });
    }
    let total = u64::try_from(draft.total()).ok()?;

    let input = OrderInput {
        customer_id: customer.id.clone(),
        lines,
        total,
        status,
    };
    Some((customer, input))
}
