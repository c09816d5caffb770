use std::sync::Arc;

use shopload::shop::{self, MemoryStore};
use shopload::{LoaderConfig, UnitOfWork};
use tracing_subscriber::EnvFilter;

// Resolves one customer's order history the way a GraphQL query
// `customer(id: 5) { orders { lineItems { product } } }` would, then shows how many round trips
// the store served.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let store = Arc::new(MemoryStore::seeded());
    let registry = shop::registry(store.clone(), LoaderConfig::default())?;

    let uow = UnitOfWork::begin(&registry);
    let tree = shop::customer_tree(&uow, 5).await?;
    uow.finish();

    let tree = match tree {
        Some(tree) => tree,
        None => {
            println!("customer 5 not found");
            return Ok(());
        }
    };

    println!("{} <{}>", tree.customer.name, tree.customer.email);
    for order in &tree.orders {
        println!("  order #{} ({:?})", order.order.id, order.order.status);
        for line in &order.line_items {
            match &line.product {
                Some(product) => println!("    {} x {}", line.item.quantity, product.name),
                None => println!("    {} x <discontinued>", line.item.quantity),
            }
        }
    }
    println!("total: {:.2}", tree.total_cents() as f64 / 100.0);

    for fetch in store.fetches().await {
        println!("fetch {:?}.{} IN {:?}", fetch.table, fetch.column, fetch.keys);
    }
    Ok(())
}
