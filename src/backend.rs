//! Embedded implementation of the remote service on sled, for local
//! development and integration tests
use super::catalog::{Customer, Order, OrderStatus, Product, TimeStamp};
use super::error::TransportError;
use super::transport::{CustomerInput, OrderCreated, OrderInput, ProductInput, Transport};
use super::utils;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{IVec, Tree};
use std::sync::Arc;
use tracing::debug;

const CUSTOMERS: &str = "customers";
const PRODUCTS: &str = "products";
const ORDERS: &str = "orders";

/// Each entity kind lives in its own tree, keyed by a monotonic sequence
/// number so iteration yields creation order. Values are CBOR.
pub struct SledBackend {
    instance: Arc<sled::Db>,
}

trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Customer {
    fn key(&self) -> &str {
        &self.id
    }
}
impl Keyed for Product {
    fn key(&self) -> &str {
        &self.id
    }
}
impl Keyed for Order {
    fn key(&self) -> &str {
        &self.id
    }
}

impl SledBackend {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }
    pub fn open(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        Ok(Self::new(Arc::new(db)))
    }

    fn tree(&self, name: &str) -> Result<Tree, TransportError> {
        Ok(self.instance.open_tree(name)?)
    }

    fn list<T>(&self, name: &str) -> Result<Vec<T>, TransportError>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        let mut out = vec![];
        for entry in self.tree(name)?.iter() {
            let (_, value) = entry?;
            out.push(minicbor::decode(&value)?);
        }
        Ok(out)
    }

    fn find<T>(&self, name: &str, id: &str) -> Result<Option<(IVec, T)>, TransportError>
    where
        T: Keyed + for<'b> minicbor::Decode<'b, ()>,
    {
        for entry in self.tree(name)?.iter() {
            let (key, value) = entry?;
            let record: T = minicbor::decode(&value)?;
            if record.key() == id {
                return Ok(Some((key, record)));
            }
        }
        Ok(None)
    }

    fn get<T>(&self, name: &str, id: &str) -> Result<(IVec, T), TransportError>
    where
        T: Keyed + for<'b> minicbor::Decode<'b, ()>,
    {
        self.find(name, id)?
            .ok_or_else(|| TransportError::NotFound(format!("{} {id}", singular(name))))
    }

    fn append<T: minicbor::Encode<()>>(&self, name: &str, record: &T) -> Result<(), TransportError> {
        let seq = self.instance.generate_id()?;
        self.tree(name)?
            .insert(seq.to_be_bytes(), minicbor::to_vec(record)?)?;
        Ok(())
    }

    fn replace<T: minicbor::Encode<()>>(
        &self,
        name: &str,
        key: IVec,
        record: &T,
    ) -> Result<(), TransportError> {
        self.tree(name)?.insert(key, minicbor::to_vec(record)?)?;
        Ok(())
    }

    fn remove<T>(&self, name: &str, id: &str) -> Result<(), TransportError>
    where
        T: Keyed + for<'b> minicbor::Decode<'b, ()>,
    {
        let (key, _) = self.get::<T>(name, id)?;
        self.tree(name)?.remove(key)?;
        debug!(tree = name, id, "record removed");
        Ok(())
    }
}

fn new_id(hrp: &str) -> Result<String, TransportError> {
    utils::new_uuid_to_bech32(hrp).map_err(|e| TransportError::Storage(e.to_string()))
}

fn abort(error: impl Into<TransportError>) -> ConflictableTransactionError<TransportError> {
    ConflictableTransactionError::Abort(error.into())
}

fn singular(tree: &str) -> &str {
    tree.strip_suffix('s').unwrap_or(tree)
}

fn customer_from(id: String, input: &CustomerInput, created_at: TimeStamp) -> Customer {
    Customer {
        id,
        name: input.name.clone(),
        surname: input.surname.clone(),
        company: input.company.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
        created_at,
    }
}

impl Transport for SledBackend {
    fn fetch_customers(&self) -> Result<Vec<Customer>, TransportError> {
        self.list(CUSTOMERS)
    }
    fn fetch_catalog(&self) -> Result<Vec<Product>, TransportError> {
        self.list(PRODUCTS)
    }
    fn fetch_orders(&self) -> Result<Vec<Order>, TransportError> {
        self.list(ORDERS)
    }

    /// Rejects unknown customers and lines that exceed stock. The stock
    /// decrements and the new order are written in one transaction, so a
    /// failure leaves neither behind.
    fn create_order(&self, input: &OrderInput) -> Result<OrderCreated, TransportError> {
        let (_, customer) = self.get::<Customer>(CUSTOMERS, &input.customer_id)?;

        if input.lines.is_empty() {
            return Err(TransportError::Rejected(
                "Error: an order needs at least one product".into(),
            ));
        }

        // lines for the same product draw on one stock figure
        let mut wanted: Vec<(IVec, u64)> = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let (key, _) = self.get::<Product>(PRODUCTS, &line.product_id)?;
            match wanted.iter_mut().find(|(seen, _)| *seen == key) {
                Some((_, quantity)) => {
                    *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
                        TransportError::Rejected("Error: the order quantity is too large".into())
                    })?
                }
                None => wanted.push((key, line.quantity)),
            }
        }

        let order = Order {
            id: new_id("order_")?,
            customer: customer.to_ref(),
            lines: input.lines.clone(),
            total: input.total,
            status: input.status,
            created_at: TimeStamp::new(),
        };
        let order_key = self.instance.generate_id()?.to_be_bytes().to_vec();
        let order_value = minicbor::to_vec(&order)?;

        let products = self.tree(PRODUCTS)?;
        let orders = self.tree(ORDERS)?;
        (&products, &orders)
            .transaction(|(products, orders)| {
                for (key, quantity) in &wanted {
                    let Some(value) = products.get(key)? else {
                        return Err(abort(TransportError::NotFound("product".into())));
                    };
                    let mut product: Product = minicbor::decode(&value).map_err(abort)?;
                    if *quantity > product.stock {
                        return Err(abort(TransportError::Rejected(format!(
                            "Error: the product {} exceeds the available stock",
                            product.name
                        ))));
                    }
                    product.stock -= quantity;
                    products.insert(key.clone(), minicbor::to_vec(&product).map_err(abort)?)?;
                }
                orders.insert(order_key.clone(), order_value.clone())?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => e.into(),
            })?;
        debug!(id = %order.id, "order stored");

        Ok(OrderCreated { id: order.id })
    }

    fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order, TransportError> {
        let (key, mut order) = self.get::<Order>(ORDERS, id)?;
        order.status = status;
        self.replace(ORDERS, key, &order)?;
        Ok(order)
    }

    fn delete_order(&self, id: &str) -> Result<(), TransportError> {
        self.remove::<Order>(ORDERS, id)
    }

    fn create_customer(&self, input: &CustomerInput) -> Result<Customer, TransportError> {
        let existing: Vec<Customer> = self.list(CUSTOMERS)?;
        if existing.iter().any(|c| c.email == input.email) {
            return Err(TransportError::Rejected(
                "Error: that customer is already registered".into(),
            ));
        }

        let customer = customer_from(new_id("customer_")?, input, TimeStamp::new());
        self.append(CUSTOMERS, &customer)?;
        Ok(customer)
    }

    fn update_customer(&self, id: &str, input: &CustomerInput) -> Result<Customer, TransportError> {
        let (key, current) = self.get::<Customer>(CUSTOMERS, id)?;
        let customer = customer_from(current.id, input, current.created_at);
        self.replace(CUSTOMERS, key, &customer)?;
        Ok(customer)
    }

    fn delete_customer(&self, id: &str) -> Result<(), TransportError> {
        self.remove::<Customer>(CUSTOMERS, id)
    }

    fn create_product(&self, input: &ProductInput) -> Result<Product, TransportError> {
        let product = Product {
            id: new_id("product_")?,
            name: input.name.clone(),
            stock: input.stock,
            price: input.price,
        };
        self.append(PRODUCTS, &product)?;
        Ok(product)
    }

    fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product, TransportError> {
        let (key, current) = self.get::<Product>(PRODUCTS, id)?;
        let product = Product {
            id: current.id,
            name: input.name.clone(),
            stock: input.stock,
            price: input.price,
        };
        self.replace(PRODUCTS, key, &product)?;
        Ok(product)
    }

    fn delete_product(&self, id: &str) -> Result<(), TransportError> {
        self.remove::<Product>(PRODUCTS, id)
    }
}
