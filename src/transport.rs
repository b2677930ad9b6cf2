//! Request/response contract of the remote service
use super::catalog::{Customer, Order, OrderLine, OrderStatus, Product};
use super::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    pub total: u64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: String,
    pub surname: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub stock: u64,
    pub price: u64,
}

/// Identifier handed back for a newly created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCreated {
    pub id: String,
}

/// Calls the session can make against the remote service. Implementations own
/// authentication and the wire format.
pub trait Transport {
    fn fetch_customers(&self) -> Result<Vec<Customer>, TransportError>;
    fn fetch_catalog(&self) -> Result<Vec<Product>, TransportError>;
    fn fetch_orders(&self) -> Result<Vec<Order>, TransportError>;

    fn create_order(&self, input: &OrderInput) -> Result<OrderCreated, TransportError>;
    fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order, TransportError>;
    fn delete_order(&self, id: &str) -> Result<(), TransportError>;

    fn create_customer(&self, input: &CustomerInput) -> Result<Customer, TransportError>;
    fn update_customer(&self, id: &str, input: &CustomerInput) -> Result<Customer, TransportError>;
    fn delete_customer(&self, id: &str) -> Result<(), TransportError>;

    fn create_product(&self, input: &ProductInput) -> Result<Product, TransportError>;
    fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product, TransportError>;
    fn delete_product(&self, id: &str) -> Result<(), TransportError>;
}
