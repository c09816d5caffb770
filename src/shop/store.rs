use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use tokio::sync::Mutex;

use super::model::{Customer, Order, OrderLineItem, OrderStatus, Product};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Customers,
    Products,
    Orders,
    OrderLineItems,
}

/// One bulk query served by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    pub table: Table,
    pub column: &'static str,
    pub keys: Vec<i64>,
}

/// In-memory entity store answering `WHERE column IN (keys)` queries.
///
/// Every query is recorded so callers can check how many round trips a resolution took. Tables
/// can be taken offline to simulate an unavailable database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: Vec<Customer>,
    products: Vec<Product>,
    orders: Vec<Order>,
    line_items: Vec<OrderLineItem>,
    latency: Option<Duration>,
    fetches: Mutex<Vec<FetchRecord>>,
    offline: Mutex<HashSet<Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small catalogue: customer 5 has three orders, customer 6 one, customer 7 none. Line
    /// item 6 refers to product 9, which has since been removed from the catalogue.
    pub fn seeded() -> Self {
        Self::new()
            .with_customers(vec![
                Customer::new(5, "Ada Lovelace", "ada@example.com"),
                Customer::new(6, "Grace Hopper", "grace@example.com"),
                Customer::new(7, "Alan Turing", "alan@example.com"),
            ])
            .with_products(vec![
                Product::new(1, "Keyboard", 4_999),
                Product::new(2, "Mouse", 1_999),
                Product::new(3, "Monitor", 18_999),
                Product::new(4, "Cable", 599),
            ])
            .with_orders(vec![
                Order::new(100, 5, OrderStatus::Delivered),
                Order::new(101, 5, OrderStatus::Shipped),
                Order::new(102, 5, OrderStatus::Pending),
                Order::new(103, 6, OrderStatus::Pending),
            ])
            .with_line_items(vec![
                OrderLineItem::new(1, 100, 1, 1),
                OrderLineItem::new(2, 100, 2, 2),
                OrderLineItem::new(3, 101, 2, 1),
                OrderLineItem::new(4, 101, 3, 2),
                OrderLineItem::new(5, 102, 4, 3),
                OrderLineItem::new(6, 102, 9, 1),
                OrderLineItem::new(7, 103, 1, 1),
            ])
    }

    pub fn with_customers(mut self, customers: Vec<Customer>) -> Self {
        self.customers = customers;
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_orders(mut self, orders: Vec<Order>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_line_items(mut self, line_items: Vec<OrderLineItem>) -> Self {
        self.line_items = line_items;
        self
    }

    /// Delays every query, handy to keep batches in flight.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn take_offline(&self, table: Table) {
        self.offline.lock().await.insert(table);
    }

    pub async fn bring_online(&self, table: Table) {
        self.offline.lock().await.remove(&table);
    }

    /// All queries served so far, oldest first.
    pub async fn fetches(&self) -> Vec<FetchRecord> {
        self.fetches.lock().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.lock().await.len()
    }

    pub async fn customers_by_id(&self, ids: &[i64]) -> Result<Vec<Customer>, StoreError> {
        self.select(Table::Customers, "id", ids, &self.customers, |c| c.id).await
    }

    pub async fn products_by_id(&self, ids: &[i64]) -> Result<Vec<Product>, StoreError> {
        self.select(Table::Products, "id", ids, &self.products, |p| p.id).await
    }

    pub async fn orders_by_id(&self, ids: &[i64]) -> Result<Vec<Order>, StoreError> {
        self.select(Table::Orders, "id", ids, &self.orders, |o| o.id).await
    }

    pub async fn orders_by_customer(&self, customer_ids: &[i64]) -> Result<Vec<Order>, StoreError> {
        self.select(Table::Orders, "customer_id", customer_ids, &self.orders, |o| o.customer_id)
            .await
    }

    pub async fn line_items_by_order(
        &self,
        order_ids: &[i64],
    ) -> Result<Vec<OrderLineItem>, StoreError> {
        self.select(Table::OrderLineItems, "order_id", order_ids, &self.line_items, |li| {
            li.order_id
        })
        .await
    }

    async fn select<T: Clone>(
        &self,
        table: Table,
        column: &'static str,
        keys: &[i64],
        rows: &[T],
        column_of: fn(&T) -> i64,
    ) -> Result<Vec<T>, StoreError> {
        self.fetches.lock().await.push(FetchRecord { table, column, keys: keys.to_vec() });
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.lock().await.contains(&table) {
            return Err(StoreError::Unavailable(format!("{:?} is offline", table)));
        }
        let wanted = keys.iter().copied().collect::<BTreeSet<_>>();
        Ok(rows.iter().filter(|row| wanted.contains(&column_of(row))).cloned().collect())
    }
}
