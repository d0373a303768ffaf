//! Yew view components for the back-office dashboard.
//!
//! Most of these render straight from props. The restock form is the only
//! one holding its own input state.

use crate::hooks::use_validated_input;
use backoffice_dashboard::config::PLACEHOLDER_IMAGE;
use backoffice_dashboard::dashboard::{notification_badge, DayMetrics};
use backoffice_dashboard::inventory::{stock_label, LowStockView};
use backoffice_dashboard::lazy_image::ImageState;
use backoffice_dashboard::models::{Order, Product, Supplier};
use backoffice_dashboard::utils::{format_order_date, format_peso, validate_restock_quantity};
use std::rc::Rc;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Renders the three metric cards for the filtered day.
pub fn render_metric_cards(metrics: &DayMetrics, header: &str) -> Html {
    html! {
        <section class="metrics">
            <h2 class="metrics-date">{ header }</h2>
            <div class="metric-card">
                <span class="metric-label">{ "Total Sales" }</span>
                <span class="metric-value">{ format_peso(metrics.total_sales) }</span>
            </div>
            <div class="metric-card">
                <span class="metric-label">{ "Orders" }</span>
                <span class="metric-value">{ metrics.order_count }</span>
            </div>
            <div class="metric-card">
                <span class="metric-label">{ "Customers" }</span>
                <span class="metric-value">{ metrics.customers }</span>
            </div>
        </section>
    }
}

/// Product thumbnail that the lazy loader fills in later.
///
/// Starts on a placeholder with the real URL parked in `data-src`. A product
/// without an image gets a plain placeholder the loader never touches.
fn render_lazy_thumbnail(product: &Product) -> Html {
    let placeholder = product
        .placeholder_url
        .clone()
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
    match &product.image_url {
        Some(url) => html! {
            <img
                class={ImageState::Pending.css_class()}
                src={placeholder}
                data-src={url.clone()}
                alt={product.name.clone()}
                width="48"
                height="48"
            />
        },
        None => html! {
            <img class="thumbnail" src={placeholder} alt={product.name.clone()} width="48" height="48" />
        },
    }
}

#[derive(Properties, PartialEq)]
pub struct InventoryTableProps {
    pub products: Rc<Vec<Product>>,
    /// Container the lazy loader scans for deferred images.
    pub root: NodeRef,
}

#[function_component(InventoryTable)]
pub fn inventory_table(props: &InventoryTableProps) -> Html {
    if props.products.is_empty() {
        return html! {
            <div class="inventory" ref={props.root.clone()}>
                <p class="no-results-message">{ "No products to display" }</p>
            </div>
        };
    }

    html! {
        <div class="inventory" ref={props.root.clone()}>
            <table class="inventory-table">
                <thead>
                    <tr>
                        <th></th>
                        <th>{ "Product" }</th>
                        <th>{ "Category" }</th>
                        <th>{ "Price" }</th>
                        <th>{ "Stock" }</th>
                    </tr>
                </thead>
                <tbody>
                    { props.products.iter().map(|p| html! {
                        <tr key={p.id.to_string()}>
                            <td>{ render_lazy_thumbnail(p) }</td>
                            <td>{ &p.name }</td>
                            <td>{ &p.category }</td>
                            <td>{ format_peso(p.price) }</td>
                            <td>{ stock_label(p.stock) }</td>
                        </tr>
                    }).collect::<Html>() }
                </tbody>
            </table>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LowStockPanelProps {
    pub items: Rc<Vec<Product>>,
    pub limit: usize,
}

/// Badge plus the first few low-stock items.
#[function_component(LowStockPanel)]
pub fn low_stock_panel(props: &LowStockPanelProps) -> Html {
    let view = LowStockView::limited(props.items.iter().collect(), props.limit);

    html! {
        <section class="low-stock">
            <h3>
                { "Low Stock" }
                if !props.items.is_empty() {
                    <span class="notification-badge">{ notification_badge(props.items.len()) }</span>
                }
            </h3>
            if view.visible.is_empty() {
                <p class="no-results-message">{ "All products are sufficiently stocked" }</p>
            } else {
                <ul class="low-stock-list">
                    { view.visible.iter().map(|p| html! {
                        <li key={p.id.to_string()} class={classes!((p.stock <= 0).then_some("out-of-stock"))}>
                            <span class="low-stock-name">{ &p.name }</span>
                            <span class="low-stock-count">{ stock_label(p.stock) }</span>
                        </li>
                    }).collect::<Html>() }
                </ul>
                <div class="low-stock-summary">
                    { format!("{} out of stock", view.out_of_stock()) }
                    if view.hidden > 0 {
                        { format!(", {} more not shown", view.hidden) }
                    }
                </div>
            }
        </section>
    }
}

#[derive(Properties, PartialEq)]
pub struct OrdersTableProps {
    pub orders: Rc<Vec<Order>>,
}

#[function_component(OrdersTable)]
pub fn orders_table(props: &OrdersTableProps) -> Html {
    html! {
        <table class="orders-table">
            <thead>
                <tr>
                    <th>{ "Order" }</th>
                    <th>{ "Customer" }</th>
                    <th>{ "Date" }</th>
                    <th>{ "Total" }</th>
                    <th>{ "Status" }</th>
                </tr>
            </thead>
            <tbody>
                { props.orders.iter().map(|o| html! {
                    <tr key={o.id.to_string()}>
                        <td>{ o.display_id() }</td>
                        <td>{ &o.customer }</td>
                        <td>{ format_order_date(o.created_at) }</td>
                        <td>{ format_peso(o.net_total) }</td>
                        <td class={format!("status {}", o.status.label().to_lowercase())}>
                            { o.status.label() }
                        </td>
                    </tr>
                }).collect::<Html>() }
            </tbody>
        </table>
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestockRequest {
    pub product_id: i64,
    pub supplier_id: i64,
    pub quantity: i64,
}

#[derive(Properties, PartialEq)]
pub struct RestockFormProps {
    pub products: Rc<Vec<Product>>,
    pub suppliers: Rc<Vec<Supplier>>,
    pub on_submit: Callback<RestockRequest>,
}

fn selected_id(e: &Event) -> Option<i64> {
    let select: HtmlSelectElement = e.target_unchecked_into();
    select.value().parse().ok()
}

#[function_component(RestockForm)]
pub fn restock_form(props: &RestockFormProps) -> Html {
    let quantity = use_validated_input::<i64>(validate_restock_quantity);
    let product_id = use_state(|| None::<i64>);
    let supplier_id = use_state(|| None::<i64>);

    let on_product = {
        let product_id = product_id.clone();
        Callback::from(move |e: Event| product_id.set(selected_id(&e)))
    };
    let on_supplier = {
        let supplier_id = supplier_id.clone();
        Callback::from(move |e: Event| supplier_id.set(selected_id(&e)))
    };

    let onsubmit = {
        let quantity = quantity.clone();
        let product_id = product_id.clone();
        let supplier_id = supplier_id.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            quantity.on_commit.emit(());
            let (Some(product_id), Some(supplier_id)) = (*product_id, *supplier_id) else {
                return;
            };
            if let Ok(qty) = validate_restock_quantity(&quantity.text) {
                on_submit.emit(RestockRequest {
                    product_id,
                    supplier_id,
                    quantity: qty,
                });
                quantity.reset.emit(());
            }
        })
    };

    html! {
        <form class="restock-form" {onsubmit}>
            <select onchange={on_product}>
                <option value="" selected={product_id.is_none()}>{ "Product" }</option>
                { props.products.iter().map(|p| html! {
                    <option value={p.id.to_string()} selected={*product_id == Some(p.id)}>{ &p.name }</option>
                }).collect::<Html>() }
            </select>
            <select onchange={on_supplier}>
                <option value="" selected={supplier_id.is_none()}>{ "Supplier" }</option>
                { props.suppliers.iter().map(|s| html! {
                    <option value={s.id.to_string()} selected={*supplier_id == Some(s.id)}>{ &s.name }</option>
                }).collect::<Html>() }
            </select>
            <input
                type="text"
                inputmode="numeric"
                placeholder="Quantity"
                value={quantity.text.clone()}
                class={if quantity.error.is_some() { "invalid" } else { "" }}
                oninput={quantity.on_text_input.clone()}
                onchange={quantity.on_commit.reform(|_| ())}
            />
            <button type="submit" class="btn-primary">{ "Restock" }</button>
            if let Some(ref err) = quantity.error {
                <div class="input-error">{ err }</div>
            }
        </form>
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Properties, PartialEq)]
pub struct LoginFormProps {
    pub on_login: Callback<Credentials>,
    #[prop_or_default]
    pub error: Option<String>,
}

#[function_component(LoginForm)]
pub fn login_form(props: &LoginFormProps) -> Html {
    let email = use_state(String::new);
    let password = use_state(String::new);

    let bind = |handle: &UseStateHandle<String>| {
        let handle = handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            handle.set(input.value());
        })
    };

    let onsubmit = {
        let email = email.clone();
        let password = password.clone();
        let on_login = props.on_login.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if email.trim().is_empty() || password.is_empty() {
                return;
            }
            on_login.emit(Credentials {
                email: email.trim().to_string(),
                password: (*password).clone(),
            });
        })
    };

    html! {
        <form class="login-form" {onsubmit}>
            <input type="email" placeholder="Email" value={(*email).clone()} oninput={bind(&email)} />
            <input type="password" placeholder="Password" value={(*password).clone()} oninput={bind(&password)} />
            <button type="submit" class="btn-secondary small">{ "Sign in" }</button>
            if let Some(ref err) = props.error {
                <div class="input-error">{ err }</div>
            }
        </form>
    }
}
