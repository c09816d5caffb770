#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: u32,
}

impl Customer {
    pub fn new(id: i64, name: &str, email: &str) -> Self {
        Self { id, name: name.to_owned(), email: email.to_owned() }
    }
}

impl Product {
    pub fn new(id: i64, name: &str, price_cents: i64) -> Self {
        Self { id, name: name.to_owned(), price_cents }
    }
}

impl Order {
    pub fn new(id: i64, customer_id: i64, status: OrderStatus) -> Self {
        Self { id, customer_id, status }
    }
}

impl OrderLineItem {
    pub fn new(id: i64, order_id: i64, product_id: i64, quantity: u32) -> Self {
        Self { id, order_id, product_id, quantity }
    }

    pub fn total_cents(&self, product: &Product) -> i64 {
        product.price_cents * i64::from(self.quantity)
    }
}
