//! Service layer API for a salesperson's session
use super::cache::{CacheStore, QueryKey};
use super::catalog::{Customer, Order, OrderStatus, Product, Record, RecordKind};
use super::config::SessionConfig;
use super::draft::DraftStore;
use super::error::{SessionError, TransportError};
use super::submission::{PendingSubmission, SubmissionOutcome};
use super::sync::MutationSynchronizer;
use super::transport::{CustomerInput, ProductInput, Transport};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

/// One logged-in session: the transport, the list cache every view reads,
/// and the synchronizer that keeps that cache in step with mutations.
///
/// Views get the cache and their drafts from here by reference; nothing is
/// global.
pub struct SalesSession<T: Transport> {
    transport: T,
    config: SessionConfig,
    cache: Rc<RefCell<CacheStore>>,
    sync: MutationSynchronizer,
}

impl<T: Transport> SalesSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let sync = MutationSynchronizer::new()
            .track(RecordKind::Customer, config.customers_key.clone())
            .track(RecordKind::Product, config.catalog_key.clone())
            .track(RecordKind::Order, config.orders_key.clone());

        Ok(Self {
            transport,
            config,
            cache: Rc::new(RefCell::new(CacheStore::new())),
            sync,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    pub fn cache(&self) -> Rc<RefCell<CacheStore>> {
        self.cache.clone()
    }

    /// Text to show the user for a failed call.
    pub fn error_message(&self, error: &SessionError) -> String {
        match error {
            SessionError::Transport(e) => e.display_message(&self.config.error_prefix),
            other => other.to_string(),
        }
    }

    /// A fresh, empty draft for a "new order" view.
    pub fn new_draft(&self) -> Rc<RefCell<DraftStore>> {
        Rc::new(RefCell::new(DraftStore::with_default_quantity(
            self.config.default_quantity,
        )))
    }

    // LIST QUERIES

    pub fn load_customers(&self) -> Result<usize, SessionError> {
        let customers = self.transport.fetch_customers()?;
        Ok(self.store_list(&self.config.customers_key, customers))
    }
    pub fn load_catalog(&self) -> Result<usize, SessionError> {
        let products = self.transport.fetch_catalog()?;
        Ok(self.store_list(&self.config.catalog_key, products))
    }
    pub fn load_orders(&self) -> Result<usize, SessionError> {
        let orders = self.transport.fetch_orders()?;
        Ok(self.store_list(&self.config.orders_key, orders))
    }

    pub fn cached_customers(&self) -> Option<Vec<Customer>> {
        self.cached(&self.config.customers_key, Record::as_customer)
    }
    pub fn cached_catalog(&self) -> Option<Vec<Product>> {
        self.cached(&self.config.catalog_key, Record::as_product)
    }
    pub fn cached_orders(&self) -> Option<Vec<Order>> {
        self.cached(&self.config.orders_key, Record::as_order)
    }

    // ORDERS

    /// Validates the draft and freezes it. The caller sends
    /// [`PendingSubmission::input`] and hands the answer to
    /// [`PendingSubmission::resolve`].
    pub fn begin_order(
        &self,
        draft: &Rc<RefCell<DraftStore>>,
    ) -> Result<PendingSubmission, SessionError> {
        PendingSubmission::begin(
            draft,
            &self.cache,
            &self.sync,
            self.config.initial_order_status,
            &self.config.error_prefix,
        )
    }

    /// Validate, create the order and project it into the cache in one call.
    pub fn submit_order(&self, draft: &Rc<RefCell<DraftStore>>) -> Result<Order, SessionError> {
        let pending = self.begin_order(draft)?;
        let result = self.transport.create_order(pending.input());

        match pending.resolve(result) {
            SubmissionOutcome::Succeeded(order) => Ok(order),
            SubmissionOutcome::Failed { error, .. } => Err(error.into()),
        }
    }

    pub fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order, SessionError> {
        let order = self
            .transport
            .update_order_status(id, status)
            .inspect_err(|e| warn!(id, error = %e, "order status update failed"))?;
        self.sync
            .apply_updated(&mut self.cache.borrow_mut(), &Record::Order(order.clone()));
        CacheStore::publish(&self.cache);
        Ok(order)
    }

    pub fn delete_order(&self, id: &str) -> Result<(), SessionError> {
        self.delete(RecordKind::Order, id, |id| self.transport.delete_order(id))
    }

    // CUSTOMERS

    pub fn create_customer(&self, input: &CustomerInput) -> Result<Customer, SessionError> {
        self.create(self.transport.create_customer(input))
    }
    pub fn update_customer(
        &self,
        id: &str,
        input: &CustomerInput,
    ) -> Result<Customer, SessionError> {
        self.update(self.transport.update_customer(id, input))
    }
    pub fn delete_customer(&self, id: &str) -> Result<(), SessionError> {
        self.delete(RecordKind::Customer, id, |id| {
            self.transport.delete_customer(id)
        })
    }

    // PRODUCTS

    pub fn create_product(&self, input: &ProductInput) -> Result<Product, SessionError> {
        self.create(self.transport.create_product(input))
    }
    pub fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product, SessionError> {
        self.update(self.transport.update_product(id, input))
    }
    pub fn delete_product(&self, id: &str) -> Result<(), SessionError> {
        self.delete(RecordKind::Product, id, |id| self.transport.delete_product(id))
    }

    fn store_list<R: Into<Record>>(&self, key: &QueryKey, items: Vec<R>) -> usize {
        let records: Vec<Record> = items.into_iter().map(Into::into).collect();
        let count = records.len();
        self.cache.borrow_mut().write(key, records);
        CacheStore::publish(&self.cache);
        info!(key = %key, count, "list loaded");
        count
    }

    fn cached<R: Clone>(&self, key: &QueryKey, pick: fn(&Record) -> Option<&R>) -> Option<Vec<R>> {
        let cache = self.cache.borrow();
        let entry = cache.read(key)?;
        Some(entry.items().iter().filter_map(pick).cloned().collect())
    }

    fn create<R>(&self, result: Result<R, TransportError>) -> Result<R, SessionError>
    where
        R: Clone + Into<Record>,
    {
        let created = result.inspect_err(|e| warn!(error = %e, "create failed"))?;
        let record: Record = created.clone().into();
        self.sync.apply_created(&mut self.cache.borrow_mut(), &record);
        CacheStore::publish(&self.cache);
        Ok(created)
    }

    fn update<R>(&self, result: Result<R, TransportError>) -> Result<R, SessionError>
    where
        R: Clone + Into<Record>,
    {
        let updated = result.inspect_err(|e| warn!(error = %e, "update failed"))?;
        let record: Record = updated.clone().into();
        self.sync.apply_updated(&mut self.cache.borrow_mut(), &record);
        CacheStore::publish(&self.cache);
        Ok(updated)
    }

    fn delete<F>(&self, kind: RecordKind, id: &str, call: F) -> Result<(), SessionError>
    where
        F: FnOnce(&str) -> Result<(), TransportError>,
    {
        call(id).inspect_err(|e| warn!(?kind, id, error = %e, "delete failed"))?;
        self.sync
            .apply_deleted(&mut self.cache.borrow_mut(), kind, id);
        CacheStore::publish(&self.cache);
        Ok(())
    }
}
