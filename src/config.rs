//! Application-level configuration constants.

// Image cache
pub const IMAGE_CACHE_CAPACITY: usize = 50;
pub const SWEEP_HIGH_WATER_PCT: usize = 80;
pub const SWEEP_LOW_WATER_PCT: usize = 70;
pub const CACHE_SWEEP_INTERVAL_MS: u32 = 60_000;

// Lazy loading
pub const PRELOAD_COUNT: usize = 6;
pub const ROOT_MARGIN_PX: u32 = 100;
pub const VISIBILITY_THRESHOLD: f64 = 0.1;
pub const FALLBACK_IMAGE: &str = "../assets/images/Midwest.jpg";
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='48' height='48'%3E%3Crect width='48' height='48' fill='%23e5e7eb'/%3E%3C/svg%3E";
pub const LAZY_IMAGE_SELECTOR: &str = "img.lazy-image[data-src]";

// Forecast
pub const FORECAST_HORIZON: usize = 2;
pub const SEASON_LENGTH: usize = 7;
pub const TREND_CAP_RATIO: f64 = 0.1;
pub const CEILING_MULTIPLIER: f64 = 3.0;

// Inventory
pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 5.0;
pub const DASHBOARD_LOW_STOCK_LIMIT: usize = 20;

// Backend
pub const API_BASE_URL: &str = "http://localhost:3000/api";
pub const ORDERS_PAGE_SIZE: usize = 100;
pub const ORDERS_REFRESH_INTERVAL_MS: u32 = 30_000;

// Offline mirror keys
pub const PRODUCTS_KEY: &str = "products";
pub const ORDERS_KEY: &str = "orders";
pub const SUPPLIERS_KEY: &str = "suppliers";
pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const AUTH_USER_KEY: &str = "authUser";
