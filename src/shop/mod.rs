mod model;
mod store;

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;

pub use model::{Customer, Order, OrderLineItem, OrderStatus, Product};
pub use store::{FetchRecord, MemoryStore, Table};

use crate::{
    by_key,
    error::{LoadError, RegistryError, StoreError},
    group_by, BelongsTo, HasMany, LoaderConfig, LoaderId, LoaderRegistry, UnitOfWork,
};

pub const CUSTOMER: LoaderId<i64, Customer> = LoaderId::new("customer");
pub const PRODUCT: LoaderId<i64, Product> = LoaderId::new("product");
pub const ORDER: LoaderId<i64, Order> = LoaderId::new("order");
pub const ORDERS_BY_CUSTOMER: LoaderId<i64, Vec<Order>> = LoaderId::new("orders_by_customer");
pub const LINE_ITEMS_BY_ORDER: LoaderId<i64, Vec<OrderLineItem>> =
    LoaderId::new("line_items_by_order");

pub const ORDER_CUSTOMER: BelongsTo<Order, i64, Customer> =
    BelongsTo::new(CUSTOMER, order_customer_id);
pub const CUSTOMER_ORDERS: HasMany<Customer, i64, Order> =
    HasMany::new(ORDERS_BY_CUSTOMER, customer_id);
pub const ORDER_LINE_ITEMS: HasMany<Order, i64, OrderLineItem> =
    HasMany::new(LINE_ITEMS_BY_ORDER, order_id);
pub const LINE_ITEM_ORDER: BelongsTo<OrderLineItem, i64, Order> =
    BelongsTo::new(ORDER, line_item_order_id);
pub const LINE_ITEM_PRODUCT: BelongsTo<OrderLineItem, i64, Product> =
    BelongsTo::new(PRODUCT, line_item_product_id);

fn customer_id(customer: &Customer) -> i64 {
    customer.id
}

fn product_id(product: &Product) -> i64 {
    product.id
}

fn order_id(order: &Order) -> i64 {
    order.id
}

fn order_customer_id(order: &Order) -> i64 {
    order.customer_id
}

fn line_item_order_id(item: &OrderLineItem) -> i64 {
    item.order_id
}

fn line_item_product_id(item: &OrderLineItem) -> i64 {
    item.product_id
}

/// Adapts a `MemoryStore` query into a bulk fetch closure that owns its handle to the store.
fn query<R, Q, Fut>(
    store: &Arc<MemoryStore>,
    select: Q,
) -> impl Fn(Vec<i64>) -> Fut + Send + Sync + 'static
where
    Q: Fn(Arc<MemoryStore>, Vec<i64>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<R>, StoreError>> + Send + 'static,
{
    let store = Arc::clone(store);
    move |keys: Vec<i64>| select(Arc::clone(&store), keys)
}

/// Registers every shop loader against `store`.
pub fn registry(
    store: Arc<MemoryStore>,
    config: LoaderConfig,
) -> Result<LoaderRegistry, RegistryError> {
    let mut registry = LoaderRegistry::new(config);
    registry
        .register(
            CUSTOMER,
            by_key(
                query(&store, |s, ids| async move { s.customers_by_id(&ids).await }),
                customer_id,
            ),
        )?
        .register(
            PRODUCT,
            by_key(
                query(&store, |s, ids| async move { s.products_by_id(&ids).await }),
                product_id,
            ),
        )?
        .register(
            ORDER,
            by_key(query(&store, |s, ids| async move { s.orders_by_id(&ids).await }), order_id),
        )?
        .register(
            ORDERS_BY_CUSTOMER,
            group_by(
                query(&store, |s, ids| async move { s.orders_by_customer(&ids).await }),
                order_customer_id,
            ),
        )?
        .register(
            LINE_ITEMS_BY_ORDER,
            group_by(
                query(&store, |s, ids| async move { s.line_items_by_order(&ids).await }),
                line_item_order_id,
            ),
        )?;
    Ok(registry)
}

/// A customer with every order, line item and product resolved.
#[derive(Debug, Clone)]
pub struct CustomerTree {
    pub customer: Arc<Customer>,
    pub orders: Vec<OrderTree>,
}

#[derive(Debug, Clone)]
pub struct OrderTree {
    pub order: Order,
    pub line_items: Vec<LineItemTree>,
}

#[derive(Debug, Clone)]
pub struct LineItemTree {
    pub item: OrderLineItem,
    /// `None` when the product no longer exists.
    pub product: Option<Arc<Product>>,
}

impl CustomerTree {
    pub fn total_cents(&self) -> i64 {
        self.orders
            .iter()
            .flat_map(|order| &order.line_items)
            .filter_map(|line| line.product.as_ref().map(|product| line.item.total_cents(product)))
            .sum()
    }
}

/// Resolves `customer { orders { lineItems { product } } }` for one customer.
///
/// Siblings at each level are resolved concurrently, so the whole tree costs one bulk fetch per
/// level no matter how many orders and line items the customer has.
pub async fn customer_tree(
    uow: &UnitOfWork,
    id: i64,
) -> Result<Option<CustomerTree>, LoadError> {
    let customer = match uow.load(&CUSTOMER, id).await? {
        Some(customer) => customer,
        None => return Ok(None),
    };
    let orders = CUSTOMER_ORDERS.resolve(uow, &customer).await?;
    let orders = try_join_all(orders.iter().map(|order| order_tree(uow, order))).await?;
    Ok(Some(CustomerTree { customer, orders }))
}

async fn order_tree(uow: &UnitOfWork, order: &Order) -> Result<OrderTree, LoadError> {
    let items = ORDER_LINE_ITEMS.resolve(uow, order).await?;
    let line_items = try_join_all(items.iter().map(|item| async move {
        let product = LINE_ITEM_PRODUCT.resolve(uow, item).await?;
        Ok::<_, LoadError>(LineItemTree { item: item.clone(), product })
    }))
    .await?;
    Ok(OrderTree { order: order.clone(), line_items })
}
