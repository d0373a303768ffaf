//! Main module for the back-office dashboard using Yew.
//! Wires the application context, backend refreshes, timers and the sales chart.

use backoffice_dashboard::api::ApiClient;
use backoffice_dashboard::config::{
    API_BASE_URL, CACHE_SWEEP_INTERVAL_MS, DASHBOARD_LOW_STOCK_LIMIT, ORDERS_REFRESH_INTERVAL_MS,
};
use backoffice_dashboard::dashboard::{DateFilter, SalesChartSeries};
use backoffice_dashboard::inventory::{export_file_name, inventory_csv};
use backoffice_dashboard::lazy_image::LazyImageLoader;
use backoffice_dashboard::models::{DashboardMetrics, LowStockResponse};
use backoffice_dashboard::storage::{BrowserStore, KeyValueStore, MemoryStore};
use backoffice_dashboard::utils::{format_peso, parse_day_filter, DateParseError};
use backoffice_dashboard::viewport::BrowserImageFetcher;
use backoffice_dashboard::AppContext;
use chrono::NaiveDate;
use gloo_timers::callback::Interval;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlInputElement, Url};
use yew::prelude::*;

mod chart;
mod components;
mod hooks;

use chart::{init_sales_chart, render_sales_series};
use components::{
    render_metric_cards, Credentials, InventoryTable, LoginForm, LowStockPanel, OrdersTable,
    RestockForm, RestockRequest,
};
use hooks::use_lazy_images;

const SALES_CHART_ID: &str = "sales-chart";

// ──────────────────────────────────────────────────────────────────────────────
// Type aliases for better readability
type Store = Box<dyn KeyValueStore>;
type Context = AppContext<Store, BrowserImageFetcher>;
type SharedContext = Rc<RefCell<Context>>;

/// Bumped whenever the shared context changes so the view re-renders and
/// the lazy image scan runs again.
#[derive(Default, PartialEq)]
struct DataVersion(usize);

impl Reducible for DataVersion {
    type Action = ();

    fn reduce(self: Rc<Self>, _: ()) -> Rc<Self> {
        Rc::new(Self(self.0.wrapping_add(1)))
    }
}

type Bump = UseReducerDispatcher<DataVersion>;

/// Figures only the server knows about; absent while offline.
#[derive(Clone, Default, PartialEq)]
struct ServerSummary {
    metrics: Option<DashboardMetrics>,
    low_stock: Option<LowStockResponse>,
}

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

fn open_store() -> Store {
    match BrowserStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("{}; offline data will not survive a reload", e);
            Box::new(MemoryStore::default())
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn client_for(ctx: &SharedContext) -> ApiClient {
    ApiClient::new(API_BASE_URL, ctx.borrow().mirror().auth_token())
}

/// Hand a generated CSV to the browser as a download.
fn download_csv(file_name: &str, contents: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(contents));
    let options = BlobPropertyBag::new();
    options.set_type("text/csv;charset=utf-8;");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    let anchor: HtmlAnchorElement = gloo_utils::document()
        .create_element("a")?
        .dyn_into()
        .map_err(JsValue::from)?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url)
}

async fn refresh_orders(ctx: SharedContext, bump: Bump) {
    let api = client_for(&ctx);
    match api.fetch_orders().await {
        Ok(resp) => {
            debug!("Fetched {} orders", resp.orders.len());
            if let Err(e) = ctx.borrow_mut().replace_orders(resp.orders) {
                warn!("Orders not mirrored: {}", e);
            }
            bump.dispatch(());
        }
        Err(e) => warn!("Keeping offline orders: {}", e),
    }
}

/// Pull everything the dashboard shows. Each piece falls back on its own:
/// collections keep the offline copy, the chart shows the sample week.
async fn load_dashboard(ctx: SharedContext, bump: Bump, summary: UseStateHandle<ServerSummary>) {
    let api = client_for(&ctx);

    match api.fetch_products().await {
        Ok(resp) => {
            if let Err(e) = ctx.borrow_mut().replace_products(resp.products) {
                warn!("Products not mirrored: {}", e);
            }
        }
        Err(e) => warn!("Keeping offline products: {}", e),
    }
    match api.fetch_suppliers().await {
        Ok(resp) => {
            if let Err(e) = ctx.borrow_mut().replace_suppliers(resp.suppliers) {
                warn!("Suppliers not mirrored: {}", e);
            }
        }
        Err(e) => warn!("Keeping offline suppliers: {}", e),
    }
    refresh_orders(ctx.clone(), bump.clone()).await;

    let series = match api.fetch_sales_overview().await {
        Ok(overview) => SalesChartSeries::build(&overview, today()),
        Err(e) => {
            warn!("Sales overview unavailable, showing sample week: {}", e);
            SalesChartSeries::placeholder()
        }
    };
    render_sales_series(&series);

    let metrics = api
        .fetch_metrics()
        .await
        .map_err(|e| warn!("Server metrics unavailable: {}", e))
        .ok();
    let low_stock = api
        .fetch_low_stock()
        .await
        .map_err(|e| warn!("Server low-stock list unavailable: {}", e))
        .ok();
    summary.set(ServerSummary { metrics, low_stock });
    bump.dispatch(());
}

// ──────────────────────────────────────────────────────────────────────────────

/// Primary application component wiring state, effects, and UI elements.
#[function_component]
pub fn App() -> Html {
    let ctx: SharedContext = use_mut_ref(|| {
        AppContext::bootstrap(open_store(), LazyImageLoader::new(BrowserImageFetcher))
    });
    let version = use_reducer(DataVersion::default);
    let summary = use_state(ServerSummary::default);
    let filter_error = use_state(|| None::<String>);
    let restock_error = use_state(|| None::<String>);
    let login_error = use_state(|| None::<String>);
    let inventory_ref = use_node_ref();

    // Initial load plus the two background timers. Dropping the intervals
    // on unmount cancels them.
    {
        let ctx = ctx.clone();
        let bump = version.dispatcher();
        let summary = summary.clone();
        use_effect_with((), move |_| {
            init_sales_chart(SALES_CHART_ID);
            render_sales_series(&SalesChartSeries::placeholder());
            wasm_bindgen_futures::spawn_local(load_dashboard(ctx.clone(), bump.clone(), summary));

            let sweep = {
                let ctx = ctx.clone();
                Interval::new(CACHE_SWEEP_INTERVAL_MS, move || {
                    let removed = ctx.borrow().loader().sweep_cache();
                    if removed > 0 {
                        debug!("Image cache sweep dropped {} entries", removed);
                    }
                })
            };
            let orders = Interval::new(ORDERS_REFRESH_INTERVAL_MS, move || {
                wasm_bindgen_futures::spawn_local(refresh_orders(ctx.clone(), bump.clone()));
            });
            move || {
                drop(sweep);
                drop(orders);
            }
        });
    }

    let loader = ctx.borrow().loader().clone();
    use_lazy_images(inventory_ref.clone(), loader, version.0);

    let on_filter_change = {
        let ctx = ctx.clone();
        let bump = version.dispatcher();
        let filter_error = filter_error.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let filter = match parse_day_filter(&input.value()) {
                Ok(day) => DateFilter::Day(day),
                Err(DateParseError::EmptyInput) => DateFilter::Today,
                Err(err) => {
                    filter_error.set(Some(err.to_string()));
                    return;
                }
            };
            filter_error.set(None);
            ctx.borrow_mut().set_date_filter(filter);
            bump.dispatch(());
        })
    };

    let on_restock = {
        let ctx = ctx.clone();
        let bump = version.dispatcher();
        let summary = summary.clone();
        let restock_error = restock_error.clone();
        Callback::from(move |req: RestockRequest| {
            let result = ctx.borrow_mut().restock(
                req.product_id,
                req.supplier_id,
                req.quantity,
                today(),
            );
            match result {
                Ok(()) => {
                    restock_error.set(None);
                    // the server list no longer reflects local stock
                    summary.set(ServerSummary {
                        low_stock: None,
                        ..(*summary).clone()
                    });
                    bump.dispatch(());
                }
                Err(e) => restock_error.set(Some(e.to_string())),
            }
        })
    };

    let on_export = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let csv = match inventory_csv(ctx.borrow().products()) {
                Ok(csv) => csv,
                Err(e) => {
                    warn!("Inventory export failed: {}", e);
                    return;
                }
            };
            if let Err(e) = download_csv(&export_file_name(today()), &csv) {
                warn!("Could not start CSV download: {:?}", e);
            }
        })
    };

    let on_login = {
        let ctx = ctx.clone();
        let bump = version.dispatcher();
        let summary = summary.clone();
        let login_error = login_error.clone();
        Callback::from(move |creds: Credentials| {
            let ctx = ctx.clone();
            let bump = bump.clone();
            let summary = summary.clone();
            let login_error = login_error.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let api = ApiClient::new(API_BASE_URL, None);
                let resp = match api.login(&creds.email, &creds.password).await {
                    Ok(resp) if !resp.token.is_empty() => resp,
                    Ok(_) => {
                        login_error.set(Some("Login failed".to_string()));
                        return;
                    }
                    Err(e) => {
                        login_error.set(Some(e.to_string()));
                        return;
                    }
                };
                if let Err(e) = ctx.borrow_mut().login(&resp.token, &resp.user) {
                    warn!("Session not persisted: {}", e);
                }
                info!("Signed in as {}", resp.user.display_name());
                login_error.set(None);
                load_dashboard(ctx, bump, summary).await;
            });
        })
    };

    let on_logout = {
        let ctx = ctx.clone();
        let bump = version.dispatcher();
        let summary = summary.clone();
        Callback::from(move |_: MouseEvent| {
            ctx.borrow_mut().logout();
            summary.set(ServerSummary::default());
            render_sales_series(&SalesChartSeries::placeholder());
            bump.dispatch(());
        })
    };

    // Snapshot the context for this render.
    let (metrics, header, authenticated, user_name, products, orders, suppliers, local_low_stock) = {
        let c = ctx.borrow();
        let now = today();
        (
            c.metrics(now),
            c.date_filter().header_label(now),
            c.is_authenticated(),
            c.user().display_name().to_string(),
            Rc::new(c.products().to_vec()),
            Rc::new(c.orders().to_vec()),
            Rc::new(c.suppliers().to_vec()),
            c.low_stock().into_iter().cloned().collect::<Vec<_>>(),
        )
    };
    let low_stock = Rc::new(match &summary.low_stock {
        Some(server) => server.products.clone(),
        None => local_low_stock,
    });

    html! {
        <div class="dashboard">
            <header class="dashboard-header">
                <h1>{ "Dashboard" }</h1>
                if authenticated {
                    <span class="user-name">{ user_name }</span>
                    <button class="btn-secondary small" onclick={on_logout}>{ "Logout" }</button>
                } else {
                    <LoginForm on_login={on_login} error={(*login_error).clone()} />
                }
            </header>

            <div class="form-group">
                <label for="date-filter">{ "Show day:" }</label>
                <input type="date" id="date-filter" onchange={on_filter_change} />
                if let Some(ref err) = *filter_error {
                    <div class="input-error">{ err }</div>
                }
            </div>

            { render_metric_cards(&metrics, &header) }
            if let Some(ref overall) = summary.metrics {
                <div class="metrics-overall compact">
                    { format!(
                        "All time: {} across {} orders, {} customers",
                        format_peso(overall.total_sales),
                        overall.total_orders,
                        overall.customers
                    ) }
                </div>
            }

            <section class="sales-overview">
                <canvas id={SALES_CHART_ID}></canvas>
            </section>

            <LowStockPanel items={low_stock} limit={DASHBOARD_LOW_STOCK_LIMIT} />

            <section class="inventory-section">
                <div class="section-header">
                    <h3>{ "Inventory" }</h3>
                    <button class="btn-secondary small" onclick={on_export}>{ "Export CSV" }</button>
                </div>
                <RestockForm
                    products={products.clone()}
                    suppliers={suppliers}
                    on_submit={on_restock}
                />
                if let Some(ref err) = *restock_error {
                    <div class="current-error compact">{ err }</div>
                }
                <InventoryTable products={products} root={inventory_ref} />
            </section>

            <section class="orders-section">
                <h3>{ "Recent Orders" }</h3>
                <OrdersTable orders={orders} />
            </section>
        </div>
    }
}

/// Entry point: installs the panic hook and logger, then mounts the App.
fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    yew::Renderer::<App>::new().render();
}
