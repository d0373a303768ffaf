//! Offline mirror of server state in a key-value store.
//!
//! In the browser this is `window.localStorage`; tests use [`MemoryStore`].
//! Collections are stored as JSON under fixed keys. A missing or corrupt
//! entry loads as an empty collection so the dashboard can always render.

use crate::config::{AUTH_TOKEN_KEY, AUTH_USER_KEY, ORDERS_KEY, PRODUCTS_KEY, SUPPLIERS_KEY};
use crate::models::{AuthUser, Order, Product, Supplier};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage rejected write to '{0}'")]
    WriteRejected(String),
    #[error("could not encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) {
        (**self).remove_item(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) {
        (**self).remove_item(key)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// `window.localStorage`.
#[derive(Debug, Clone)]
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn open() -> Result<Self, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .map(|storage| Self { storage })
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for BrowserStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|_| StorageError::WriteRejected(key.to_string()))
    }

    fn remove_item(&self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}

/// Typed view over a [`KeyValueStore`].
#[derive(Debug)]
pub struct OfflineMirror<S> {
    store: S,
}

impl<S: KeyValueStore> OfflineMirror<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.store.get_item(key) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding unreadable '{}' mirror: {}", key, e);
            T::default()
        })
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set_item(key, &json)
    }

    pub fn load_products(&self) -> Vec<Product> {
        self.load(PRODUCTS_KEY)
    }

    pub fn save_products(&self, products: &[Product]) -> Result<(), StorageError> {
        self.save(PRODUCTS_KEY, products)
    }

    pub fn load_orders(&self) -> Vec<Order> {
        self.load(ORDERS_KEY)
    }

    pub fn save_orders(&self, orders: &[Order]) -> Result<(), StorageError> {
        self.save(ORDERS_KEY, orders)
    }

    pub fn load_suppliers(&self) -> Vec<Supplier> {
        self.load(SUPPLIERS_KEY)
    }

    pub fn save_suppliers(&self, suppliers: &[Supplier]) -> Result<(), StorageError> {
        self.save(SUPPLIERS_KEY, suppliers)
    }

    pub fn auth_token(&self) -> Option<String> {
        self.store
            .get_item(AUTH_TOKEN_KEY)
            .filter(|t| !t.trim().is_empty())
    }

    pub fn auth_user(&self) -> AuthUser {
        self.load(AUTH_USER_KEY)
    }

    pub fn save_session(&self, token: &str, user: &AuthUser) -> Result<(), StorageError> {
        self.store.set_item(AUTH_TOKEN_KEY, token)?;
        self.save(AUTH_USER_KEY, user)
    }

    pub fn clear_session(&self) {
        self.store.remove_item(AUTH_TOKEN_KEY);
        self.store.remove_item(AUTH_USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_corrupt_entries_load_empty() {
        let mirror = OfflineMirror::new(MemoryStore::default());
        assert!(mirror.load_products().is_empty());

        mirror.store().set_item(ORDERS_KEY, "{not json").unwrap();
        assert!(mirror.load_orders().is_empty());
    }

    #[test]
    fn collections_round_trip() {
        let mirror = OfflineMirror::new(MemoryStore::default());
        let products = vec![Product {
            id: 1,
            name: "Rice".into(),
            stock: 3,
            low_stock_threshold: 8.0,
            ..Product::default()
        }];
        let suppliers = vec![Supplier {
            id: 4,
            name: "Acme".into(),
            items: vec!["Rice".into()],
            ..Supplier::default()
        }];

        mirror.save_products(&products).unwrap();
        mirror.save_suppliers(&suppliers).unwrap();

        assert_eq!(mirror.load_products(), products);
        assert_eq!(mirror.load_suppliers(), suppliers);
    }

    #[test]
    fn reads_legacy_camel_case_mirror() {
        let mirror = OfflineMirror::new(MemoryStore::default());
        mirror
            .store()
            .set_item(
                PRODUCTS_KEY,
                r#"[{"id":5,"name":"Oil","price":"99","lowStockThreshold":3,"stock":"2"}]"#,
            )
            .unwrap();
        let products = mirror.load_products();
        assert_eq!(products[0].price, 99.0);
        assert_eq!(products[0].stock, 2);
        assert_eq!(products[0].low_stock_threshold, 3.0);
    }

    #[test]
    fn session_lifecycle() {
        let mirror = OfflineMirror::new(MemoryStore::default());
        assert_eq!(mirror.auth_token(), None);

        let user = AuthUser {
            name: Some("Owner".into()),
            email: None,
        };
        mirror.save_session("tok-123", &user).unwrap();
        assert_eq!(mirror.auth_token().as_deref(), Some("tok-123"));
        assert_eq!(mirror.auth_user(), user);

        mirror.clear_session();
        assert_eq!(mirror.auth_token(), None);
        assert_eq!(mirror.auth_user(), AuthUser::default());
    }
}
