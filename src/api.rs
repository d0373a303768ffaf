//! REST client for the back-office API.
//!
//! Authenticated calls carry the bearer token from the offline mirror. Read
//! endpoints that have a public twin fall back to it when the authenticated
//! call fails.

use crate::config::{API_BASE_URL, DEFAULT_LOW_STOCK_THRESHOLD, ORDERS_PAGE_SIZE};
use crate::models::{
    DashboardMetrics, LoginResponse, LowStockResponse, OrdersResponse, ProductsResponse,
    SalesOverview, SuppliersResponse,
};
use gloo_net::http::{Request, RequestBuilder};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] gloo_net::Error),
    #[error("{path} answered HTTP {status}")]
    Status { path: String, status: u16 },
}

/// Client bound to one base URL and, optionally, a session token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(API_BASE_URL, None)
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_headers(&self, builder: RequestBuilder, authenticated: bool) -> RequestBuilder {
        let builder = builder.header("Content-Type", "application/json");
        match (&self.token, authenticated) {
            (Some(token), true) => builder.header("Authorization", &format!("Bearer {}", token)),
            _ => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, authenticated: bool) -> Result<T, ApiError> {
        debug!("GET {}", path);
        let response = self
            .with_headers(Request::get(&self.url(path)), authenticated)
            .send()
            .await?;
        if !response.ok() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }
        Ok(response.json().await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        debug!("POST {}", path);
        let response = self
            .with_headers(Request::post(&self.url(path)), true)
            .json(body)?
            .send()
            .await?;
        if !response.ok() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }
        Ok(response.json().await?)
    }

    /// Authenticated GET, retried against `public_path` on any failure.
    async fn get_with_public_fallback<T: DeserializeOwned>(
        &self,
        path: &str,
        public_path: &str,
    ) -> Result<T, ApiError> {
        match self.get(path, true).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("{} failed ({}); trying {}", path, e, public_path);
                self.get(public_path, false).await
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }
        self.post("/auth/login", &Credentials { email, password }).await
    }

    pub async fn fetch_sales_overview(&self) -> Result<SalesOverview, ApiError> {
        self.get_with_public_fallback("/dashboard/sales-overview", "/dashboard/sales-overview-public")
            .await
    }

    pub async fn fetch_metrics(&self) -> Result<DashboardMetrics, ApiError> {
        self.get_with_public_fallback("/dashboard/metrics", "/dashboard/metrics")
            .await
    }

    pub async fn fetch_orders(&self) -> Result<OrdersResponse, ApiError> {
        let query = format!("?page=1&pageSize={}", ORDERS_PAGE_SIZE);
        self.get_with_public_fallback(
            &format!("/orders{}", query),
            &format!("/orders/public{}", query),
        )
        .await
    }

    pub async fn fetch_suppliers(&self) -> Result<SuppliersResponse, ApiError> {
        self.get("/suppliers", true).await
    }

    pub async fn fetch_products(&self) -> Result<ProductsResponse, ApiError> {
        self.get_with_public_fallback("/products/lazy", "/products/lazy/public")
            .await
    }

    pub async fn fetch_low_stock(&self) -> Result<LowStockResponse, ApiError> {
        let query = format!("?threshold={}", DEFAULT_LOW_STOCK_THRESHOLD);
        self.get_with_public_fallback(
            &format!("/products/low-stock{}", query),
            &format!("/products/low-stock/public{}", query),
        )
        .await
    }
}
