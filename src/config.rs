//! Session settings
use super::cache::QueryKey;
use super::catalog::OrderStatus;
use super::draft::DEFAULT_QUANTITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub error_prefix: String, // stripped from server messages before display
    pub default_quantity: i64,
    pub initial_order_status: OrderStatus,
    pub customers_key: QueryKey,
    pub catalog_key: QueryKey,
    pub orders_key: QueryKey,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_prefix: "Error: ".to_string(),
            default_quantity: DEFAULT_QUANTITY,
            initial_order_status: OrderStatus::Pending,
            customers_key: QueryKey::new("customersForSeller"),
            catalog_key: QueryKey::new("productCatalog"),
            orders_key: QueryKey::new("ordersForSeller"),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_error_prefix(mut self, prefix: &str) -> Self {
        self.error_prefix = prefix.to_string();
        self
    }
    pub fn set_default_quantity(mut self, quantity: i64) -> Self {
        self.default_quantity = quantity;
        self
    }
    pub fn set_initial_order_status(mut self, status: OrderStatus) -> Self {
        self.initial_order_status = status;
        self
    }
    /// Scopes every list key to one seller.
    pub fn set_seller(mut self, seller_id: &str) -> Self {
        self.customers_key = self.customers_key.with_arg("seller", seller_id);
        self.catalog_key = self.catalog_key.with_arg("seller", seller_id);
        self.orders_key = self.orders_key.with_arg("seller", seller_id);
        self
    }
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_quantity <= 0 {
            anyhow::bail!(
                "default quantity must be positive, got {}",
                self.default_quantity
            );
        }
        let keys = [&self.customers_key, &self.catalog_key, &self.orders_key];
        for (i, key) in keys.iter().enumerate() {
            if keys[i + 1..].contains(key) {
                anyhow::bail!("list key {key} is used for more than one entity kind");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::new().validate().is_ok());
    }

    #[test]
    fn non_positive_default_quantity_is_rejected() {
        assert!(SessionConfig::new().set_default_quantity(0).validate().is_err());
    }

    #[test]
    fn seller_scoping_adds_an_argument() {
        let config = SessionConfig::new().set_seller("u1");
        assert_eq!(config.orders_key.to_string(), "ordersForSeller(seller=u1)");
        assert!(config.validate().is_ok());
    }
}
