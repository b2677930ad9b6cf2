//! Entity snapshots returned by the remote service
use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    /// Returns `None` for out-of-range components instead of panicking.
    pub fn new_with(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
}

impl Default for TimeStamp {
    fn default() -> Self {
        Self::new()
    }
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// Lightweight handle to the customer an order is for.
#[derive(Debug, Clone, PartialEq, Eq, Default, minicbor::Encode, minicbor::Decode)]
pub struct CustomerRef {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Customer {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub surname: String,
    #[n(3)]
    pub company: String,
    #[n(4)]
    pub email: String,
    #[n(5)]
    pub phone: Option<String>,
    #[n(6)]
    pub created_at: TimeStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Product {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub stock: u64,
    #[n(3)]
    pub price: u64, // minor currency units
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Completed,
    #[n(2)]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OrderLine {
    #[n(0)]
    pub product_id: String,
    #[n(1)]
    pub quantity: u64,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub line_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Order {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub customer: CustomerRef,
    #[n(2)]
    pub lines: Vec<OrderLine>,
    #[n(3)]
    pub total: u64,
    #[n(4)]
    pub status: OrderStatus,
    #[n(5)]
    pub created_at: TimeStamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Customer,
    Product,
    Order,
}

/// Any entity snapshot that can sit in a cached list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Customer(Customer),
    Product(Product),
    Order(Order),
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl Customer {
    pub fn to_ref(&self) -> CustomerRef {
        CustomerRef {
            id: self.id.clone(),
            display_name: format!("{} {}", self.name, self.surname),
        }
    }
}

impl CustomerRef {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
    /// An empty reference means "no customer selected".
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Customer(c) => &c.id,
            Record::Product(p) => &p.id,
            Record::Order(o) => &o.id,
        }
    }
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Customer(_) => RecordKind::Customer,
            Record::Product(_) => RecordKind::Product,
            Record::Order(_) => RecordKind::Order,
        }
    }
    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            Record::Customer(c) => Some(c),
            _ => None,
        }
    }
    pub fn as_product(&self) -> Option<&Product> {
        match self {
            Record::Product(p) => Some(p),
            _ => None,
        }
    }
    pub fn as_order(&self) -> Option<&Order> {
        match self {
            Record::Order(o) => Some(o),
            _ => None,
        }
    }
}

impl From<Customer> for Record {
    fn from(value: Customer) -> Self {
        Record::Customer(value)
    }
}

impl From<Product> for Record {
    fn from(value: Product) -> Self {
        Record::Product(value)
    }
}

impl From<Order> for Record {
    fn from(value: Order) -> Self {
        Record::Order(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original).unwrap();
        let decode: TimeStamp = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn record_exposes_id_and_kind() {
        let record = Record::from(Product {
            id: "p1".into(),
            name: "Laptop".into(),
            stock: 3,
            price: 1_000,
        });

        assert_eq!(record.id(), "p1");
        assert_eq!(record.kind(), RecordKind::Product);
        assert!(record.as_order().is_none());
    }

    #[test]
    fn empty_customer_ref_means_unselected() {
        assert!(CustomerRef::default().is_empty());
        assert!(!CustomerRef::new("c1", "Ana Diaz").is_empty());
    }
}
