//! Application state owned by the dashboard shell.
//!
//! One [`AppContext`] is created at startup and handed to whatever needs the
//! collections or the image loader. Logging out resets it in place instead
//! of leaving stale globals behind.

use crate::dashboard::{day_metrics, DateFilter, DayMetrics};
use crate::inventory::{apply_restock, compute_low_stock, InventoryError};
use crate::lazy_image::{ImageFetcher, LazyImageLoader};
use crate::models::{AuthUser, Order, Product, Supplier};
use crate::storage::{KeyValueStore, OfflineMirror, StorageError};
use chrono::NaiveDate;
use log::{info, warn};

pub struct AppContext<S, F: ImageFetcher> {
    mirror: OfflineMirror<S>,
    loader: LazyImageLoader<F>,
    products: Vec<Product>,
    orders: Vec<Order>,
    suppliers: Vec<Supplier>,
    date_filter: DateFilter,
}

impl<S: KeyValueStore, F: ImageFetcher + 'static> AppContext<S, F> {
    /// Start from whatever the offline mirror holds.
    pub fn bootstrap(store: S, loader: LazyImageLoader<F>) -> Self {
        let mirror = OfflineMirror::new(store);
        let products = mirror.load_products();
        let orders = mirror.load_orders();
        let suppliers = mirror.load_suppliers();
        info!(
            "Restored {} products, {} orders, {} suppliers from offline mirror",
            products.len(),
            orders.len(),
            suppliers.len()
        );
        Self {
            mirror,
            loader,
            products,
            orders,
            suppliers,
            date_filter: DateFilter::default(),
        }
    }

    pub fn mirror(&self) -> &OfflineMirror<S> {
        &self.mirror
    }

    pub fn loader(&self) -> &LazyImageLoader<F> {
        &self.loader
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn date_filter(&self) -> DateFilter {
        self.date_filter
    }

    pub fn set_date_filter(&mut self, filter: DateFilter) {
        self.date_filter = filter;
    }

    pub fn is_authenticated(&self) -> bool {
        self.mirror.auth_token().is_some()
    }

    pub fn user(&self) -> AuthUser {
        self.mirror.auth_user()
    }

    pub fn login(&mut self, token: &str, user: &AuthUser) -> Result<(), StorageError> {
        self.mirror.save_session(token, user)
    }

    /// Replace the products in memory and in the mirror.
    pub fn replace_products(&mut self, products: Vec<Product>) -> Result<(), StorageError> {
        self.products = products;
        self.mirror.save_products(&self.products)
    }

    pub fn replace_orders(&mut self, orders: Vec<Order>) -> Result<(), StorageError> {
        self.orders = orders;
        self.mirror.save_orders(&self.orders)
    }

    pub fn replace_suppliers(&mut self, suppliers: Vec<Supplier>) -> Result<(), StorageError> {
        self.suppliers = suppliers;
        self.mirror.save_suppliers(&self.suppliers)
    }

    pub fn low_stock(&self) -> Vec<&Product> {
        compute_low_stock(&self.products)
    }

    pub fn metrics(&self, today: NaiveDate) -> DayMetrics {
        day_metrics(&self.orders, self.date_filter, today)
    }

    /// Apply a restock locally. The mirror is best-effort: a failed write is
    /// logged and the in-memory state still changes.
    pub fn restock(
        &mut self,
        product_id: i64,
        supplier_id: i64,
        quantity: i64,
        date: NaiveDate,
    ) -> Result<(), InventoryError> {
        apply_restock(
            &mut self.products,
            &mut self.suppliers,
            product_id,
            supplier_id,
            quantity,
            date,
        )?;
        if let Err(e) = self.mirror.save_products(&self.products) {
            warn!("Restock not mirrored: {}", e);
        }
        if let Err(e) = self.mirror.save_suppliers(&self.suppliers) {
            warn!("Restock not mirrored: {}", e);
        }
        Ok(())
    }

    /// End the session: drop credentials, cached images and in-memory data.
    /// The mirrored collections stay for the next offline start.
    pub fn logout(&mut self) {
        self.mirror.clear_session();
        self.loader.cache().borrow_mut().clear();
        self.products.clear();
        self.orders.clear();
        self.suppliers.clear();
        self.date_filter = DateFilter::default();
        info!("Session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy_image::ImageLoadError;
    use crate::storage::MemoryStore;
    use futures::future::{self, FutureExt, LocalBoxFuture};

    struct NoopFetcher;

    impl ImageFetcher for NoopFetcher {
        type Handle = ();

        fn fetch(&self, _src: &str) -> LocalBoxFuture<'static, Result<(), ImageLoadError>> {
            future::ready(Ok(())).boxed_local()
        }
    }

    fn context() -> AppContext<MemoryStore, NoopFetcher> {
        AppContext::bootstrap(MemoryStore::default(), LazyImageLoader::new(NoopFetcher))
    }

    fn product(id: i64, name: &str, stock: i64) -> Product {
        Product {
            id,
            name: name.into(),
            stock,
            low_stock_threshold: 5.0,
            ..Product::default()
        }
    }

    #[test]
    fn bootstrap_restores_mirror() {
        let store = MemoryStore::default();
        OfflineMirror::new(&store)
            .save_products(&[product(1, "Rice", 2)])
            .unwrap();

        let ctx = AppContext::bootstrap(&store, LazyImageLoader::new(NoopFetcher));
        assert_eq!(ctx.products().len(), 1);
        assert_eq!(ctx.low_stock().len(), 1);
    }

    #[test]
    fn replace_writes_through_to_mirror() {
        let mut ctx = context();
        ctx.replace_products(vec![product(1, "Rice", 9)]).unwrap();
        assert_eq!(ctx.mirror().load_products().len(), 1);
        assert!(ctx.low_stock().is_empty());
    }

    #[test]
    fn restock_persists_both_collections() {
        let mut ctx = context();
        ctx.replace_products(vec![product(1, "Rice", 1)]).unwrap();
        ctx.replace_suppliers(vec![Supplier {
            id: 2,
            name: "Acme".into(),
            ..Supplier::default()
        }])
        .unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        ctx.restock(1, 2, 10, day).unwrap();

        assert_eq!(ctx.mirror().load_products()[0].stock, 11);
        assert_eq!(ctx.mirror().load_suppliers()[0].last_delivery, Some(day));
    }

    #[test]
    fn logout_resets_state_and_cache() {
        let mut ctx = context();
        ctx.login("tok", &AuthUser::default()).unwrap();
        ctx.replace_orders(vec![Order::default()]).unwrap();
        ctx.set_date_filter(DateFilter::Day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        ctx.loader().cache().borrow_mut().insert("/img/a.jpg", ());
        assert!(ctx.is_authenticated());

        ctx.logout();

        assert!(!ctx.is_authenticated());
        assert!(ctx.orders().is_empty());
        assert!(ctx.loader().cache().borrow().is_empty());
        assert_eq!(ctx.date_filter(), DateFilter::Today);
        // offline copy survives for the next start
        assert_eq!(ctx.mirror().load_orders().len(), 1);
    }
}
