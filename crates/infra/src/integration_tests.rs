//! End-to-end tests across services sharing one store.
//!
//! Tests: ProductCatalog → ShoppingCarts → pricing, AddressBook
//!
//! The Postgres variants run only when `DATABASE_URL` is set; they use fresh
//! user ids per run so they can share a database with other runs.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use shopfront_catalog::{ListingScope, NewProduct, ProductDraft, Visibility};
    use shopfront_core::{DomainError, ProductId, UserId};

    use crate::services::{
        AddressBook, ErrorKind, ProductCatalog, ServiceError, ServiceSettings, ShoppingCarts,
    };
    use crate::store::{InMemoryStore, PostgresStore, ProductStore};

    struct Shop {
        catalog: ProductCatalog,
        carts: ShoppingCarts,
        addresses: AddressBook,
    }

    fn shop_over<S>(store: Arc<S>) -> Shop
    where
        S: ProductStore + crate::store::CartStore + crate::store::AddressStore + 'static,
    {
        let settings = ServiceSettings::default();
        Shop {
            catalog: ProductCatalog::new(store.clone(), settings),
            carts: ShoppingCarts::new(store.clone(), store.clone(), settings),
            addresses: AddressBook::new(store, settings),
        }
    }

    fn draft(name: &str, price: i64, category: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price: Decimal::new(price, 0),
            category: category.to_string(),
            ..ProductDraft::default()
        }
    }

    fn fresh_user(prefix: &str) -> UserId {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        UserId::parse(format!("{prefix}-{nanos}")).unwrap()
    }

    async fn checkout_flow(shop: &Shop) {
        let kurta = shop.catalog.create_product(draft("Kurta", 500, "Men's Wear")).await.unwrap();
        let saree = shop.catalog.create_product(draft("Saree", 1200, "Sarees")).await.unwrap();
        let kurta_id = kurta.product_id.clone().unwrap();
        let saree_id = saree.product_id.clone().unwrap();

        let user = fresh_user("checkout");
        shop.carts.add_item(&user, &kurta_id, 1).await.unwrap();
        shop.carts.add_item(&user, &kurta_id, 1).await.unwrap();
        shop.carts.add_item(&user, &saree_id, 1).await.unwrap();

        let cart = shop.carts.update_quantity(&user, &saree_id, 3).await.unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.unit_count(), 5);

        let summary = shop.carts.summary(&user).await.unwrap();
        assert_eq!(summary.total, Decimal::new(500 * 2 + 1200 * 3, 0));

        shop.catalog.set_visibility(&saree_id, Visibility::Off).await.unwrap();
        let summary = shop.carts.summary(&user).await.unwrap();
        assert_eq!(summary.total, Decimal::new(1000, 0));
        assert_eq!(summary.skipped, vec![saree_id.clone()]);

        let cart = shop.carts.remove_item(&user, &saree_id).await.unwrap();
        assert_eq!(cart.lines().len(), 1);

        let address = shop.addresses.upsert_address(&user, "7 Temple Rd").await.unwrap();
        assert_eq!(address.user_id, user);
        let address = shop.addresses.upsert_address(&user, "9 Beach Rd").await.unwrap();
        assert_eq!(shop.addresses.get_address(&user).await.unwrap(), address);
    }

    async fn merge_past_the_quantity_ceiling(shop: &Shop) {
        let user = fresh_user("ceiling");
        let product = ProductId::parse("p-ceiling").unwrap();
        shop.carts.add_item(&user, &product, i64::from(i32::MAX)).await.unwrap();

        let err = shop.carts.add_item(&user, &product, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidQuantity(_))), "{err:?}");

        let cart = shop.carts.get_cart(&user).await.unwrap();
        assert_eq!(cart.line(&product).map(|l| l.quantity.get()), Some(i32::MAX as u32));
    }

    #[tokio::test]
    async fn merge_past_the_quantity_ceiling_in_memory() {
        merge_past_the_quantity_ceiling(&shop_over(Arc::new(InMemoryStore::new()))).await;
    }

    #[tokio::test]
    async fn checkout_flow_in_memory() {
        checkout_flow(&shop_over(Arc::new(InMemoryStore::new()))).await;
    }

    #[tokio::test]
    async fn hidden_product_stays_reachable_by_id() {
        let shop = shop_over(Arc::new(InMemoryStore::new()));
        let created = shop.catalog.create_product(draft("Frock", 300, "Girls' Wear")).await.unwrap();
        let id = created.product_id.unwrap();

        shop.catalog.set_visibility(&id, Visibility::Off).await.unwrap();
        assert!(shop.catalog.list_products(ListingScope::Storefront).await.unwrap().is_empty());
        assert_eq!(shop.catalog.get_product(&id).await.unwrap().name, "Frock");
    }

    #[tokio::test]
    async fn legacy_records_join_the_catalog_after_backfill() {
        let store = Arc::new(InMemoryStore::new());
        let shop = shop_over(store.clone());
        let legacy = NewProduct::validate(draft("Old Shirt", 250, "Boys' Wear")).unwrap();
        store.insert_unassigned(legacy).await.unwrap();

        let assigned = shop.catalog.backfill_identifiers().await.unwrap();
        let id = assigned[0].product_id.clone().unwrap();

        let user = fresh_user("legacy");
        shop.carts.add_item(&user, &id, 2).await.unwrap();
        let summary = shop.carts.summary(&user).await.unwrap();
        assert_eq!(summary.total, Decimal::new(500, 0));
    }

    async fn postgres_shop() -> Option<Shop> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let store = PostgresStore::connect(&url, 5, Duration::from_secs(5)).await.unwrap();
        store.migrate().await.unwrap();
        Some(shop_over(Arc::new(store)))
    }

    #[tokio::test]
    async fn checkout_flow_postgres() {
        let Some(shop) = postgres_shop().await else {
            eprintln!("DATABASE_URL not set; skipping");
            return;
        };
        checkout_flow(&shop).await;
    }

    #[tokio::test]
    async fn merge_past_the_quantity_ceiling_postgres() {
        let Some(shop) = postgres_shop().await else {
            eprintln!("DATABASE_URL not set; skipping");
            return;
        };
        merge_past_the_quantity_ceiling(&shop).await;
    }

    #[tokio::test]
    async fn concurrent_adds_postgres() {
        let Some(shop) = postgres_shop().await else {
            eprintln!("DATABASE_URL not set; skipping");
            return;
        };
        let carts = shop.carts.clone();
        let user = fresh_user("concurrent");
        let product = ProductId::parse("p1").unwrap();

        let handles = (0..10)
            .map(|_| {
                let (carts, user, product) = (carts.clone(), user.clone(), product.clone());
                tokio::spawn(async move { carts.add_item(&user, &product, 2).await.unwrap() })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.await.unwrap();
        }

        let cart = carts.get_cart(&user).await.unwrap();
        assert_eq!(cart.line(&product).map(|l| l.quantity.get()), Some(20));

        let err = carts.update_quantity(&user, &product, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
