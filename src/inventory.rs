//! Stock-level rules: low-stock detection, restocking and CSV export.

use crate::config::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::models::{Product, Supplier};
use chrono::NaiveDate;
use log::info;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("restock quantity must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("no product with id {0}")]
    UnknownProduct(i64),
    #[error("no supplier with id {0}")]
    UnknownSupplier(i64),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV export failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV export produced invalid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A product's own threshold when it is usable, else the shop default.
pub fn low_stock_threshold(product: &Product) -> f64 {
    let t = product.low_stock_threshold;
    if t.is_finite() && t > 0.0 {
        t
    } else {
        DEFAULT_LOW_STOCK_THRESHOLD
    }
}

pub fn is_low_stock(product: &Product) -> bool {
    (product.stock as f64) < low_stock_threshold(product)
}

pub fn compute_low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| is_low_stock(p)).collect()
}

/// Stock as shown to operators; negative counts display as zero.
pub fn stock_label(stock: i64) -> String {
    match stock.max(0) {
        0 => "Out of Stock".to_string(),
        n => format!("{} left", n),
    }
}

/// A capped slice of low-stock items plus how many were left out.
#[derive(Debug, Clone, PartialEq)]
pub struct LowStockView<'a> {
    pub visible: Vec<&'a Product>,
    pub hidden: usize,
}

impl<'a> LowStockView<'a> {
    pub fn limited(items: Vec<&'a Product>, limit: usize) -> Self {
        let hidden = items.len().saturating_sub(limit);
        let visible = items.into_iter().take(limit).collect();
        Self { visible, hidden }
    }

    pub fn out_of_stock(&self) -> usize {
        self.visible.iter().filter(|p| p.stock <= 0).count()
    }
}

/// Receive `quantity` units of a product from a supplier.
///
/// Increases the product's stock, stamps the supplier's last delivery and
/// records the product among the supplier's items.
pub fn apply_restock(
    products: &mut [Product],
    suppliers: &mut [Supplier],
    product_id: i64,
    supplier_id: i64,
    quantity: i64,
    date: NaiveDate,
) -> Result<(), InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidQuantity(quantity));
    }
    let product = products
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or(InventoryError::UnknownProduct(product_id))?;
    let supplier = suppliers
        .iter_mut()
        .find(|s| s.id == supplier_id)
        .ok_or(InventoryError::UnknownSupplier(supplier_id))?;

    product.stock = product.stock.max(0) + quantity;
    supplier.last_delivery = Some(date);
    if !supplier.items.iter().any(|item| item == &product.name) {
        supplier.items.push(product.name.clone());
    }
    info!(
        "Restocked {} x {} from {} (stock now {})",
        quantity, product.name, supplier.name, product.stock
    );
    Ok(())
}

/// Spreadsheet-friendly export of the product list.
pub fn inventory_csv(products: &[Product]) -> Result<String, InventoryError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(["ID", "Product", "Category", "Description", "Price", "Stock"])?;
    for p in products {
        writer.write_record([
            p.id.to_string(),
            p.name.clone(),
            p.category.clone(),
            p.description.clone().unwrap_or_default(),
            p.price.to_string(),
            p.stock.to_string(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Default download name, e.g. `inventory-2024-05-03.csv`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("inventory-{}.csv", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, stock: i64, threshold: f64) -> Product {
        Product {
            id,
            name: name.to_string(),
            stock,
            low_stock_threshold: threshold,
            ..Product::default()
        }
    }

    #[test]
    fn threshold_falls_back_to_default() {
        assert_eq!(low_stock_threshold(&product(1, "a", 0, 0.0)), 5.0);
        assert_eq!(low_stock_threshold(&product(1, "a", 0, f64::NAN)), 5.0);
        assert_eq!(low_stock_threshold(&product(1, "a", 0, 12.0)), 12.0);
    }

    #[test]
    fn low_stock_uses_each_products_threshold() {
        let products = vec![
            product(1, "Rice", 4, 5.0),
            product(2, "Oil", 5, 5.0),
            product(3, "Salt", 9, 10.0),
            product(4, "Sugar", 0, -1.0),
        ];
        let low: Vec<i64> = compute_low_stock(&products).iter().map(|p| p.id).collect();
        assert_eq!(low, vec![1, 3, 4]);
    }

    #[test]
    fn stock_labels() {
        assert_eq!(stock_label(0), "Out of Stock");
        assert_eq!(stock_label(-3), "Out of Stock");
        assert_eq!(stock_label(2), "2 left");
    }

    #[test]
    fn limited_view_counts_hidden_items() {
        let products: Vec<Product> = (0..25).map(|i| product(i, "x", 0, 5.0)).collect();
        let view = LowStockView::limited(products.iter().collect(), 20);
        assert_eq!(view.visible.len(), 20);
        assert_eq!(view.hidden, 5);
        assert_eq!(view.out_of_stock(), 20);

        let small = LowStockView::limited(products.iter().take(3).collect(), 20);
        assert_eq!(small.hidden, 0);
    }

    #[test]
    fn restock_updates_product_and_supplier() {
        let mut products = vec![product(1, "Rice", -2, 5.0)];
        let mut suppliers = vec![Supplier {
            id: 9,
            name: "Acme".into(),
            ..Supplier::default()
        }];
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        apply_restock(&mut products, &mut suppliers, 1, 9, 10, day).unwrap();
        apply_restock(&mut products, &mut suppliers, 1, 9, 5, day).unwrap();

        assert_eq!(products[0].stock, 15);
        assert_eq!(suppliers[0].last_delivery, Some(day));
        assert_eq!(suppliers[0].items, vec!["Rice".to_string()]);
    }

    #[test]
    fn restock_rejects_bad_input() {
        let mut products = vec![product(1, "Rice", 1, 5.0)];
        let mut suppliers = vec![Supplier {
            id: 9,
            ..Supplier::default()
        }];
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(matches!(
            apply_restock(&mut products, &mut suppliers, 1, 9, 0, day),
            Err(InventoryError::InvalidQuantity(0))
        ));
        assert!(matches!(
            apply_restock(&mut products, &mut suppliers, 2, 9, 1, day),
            Err(InventoryError::UnknownProduct(2))
        ));
        assert!(matches!(
            apply_restock(&mut products, &mut suppliers, 1, 8, 1, day),
            Err(InventoryError::UnknownSupplier(8))
        ));
        assert_eq!(products[0].stock, 1);
    }

    #[test]
    fn csv_export_quotes_every_field() {
        let mut p = product(7, "Coffee \"3-in-1\"", 12, 5.0);
        p.category = "Drinks".into();
        p.price = 8.5;
        let csv = inventory_csv(&[p]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some(r#""ID","Product","Category","Description","Price","Stock""#)
        );
        assert_eq!(
            lines.next(),
            Some(r#""7","Coffee ""3-in-1""","Drinks","","8.5","12""#)
        );
    }

    #[test]
    fn export_name_carries_date() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(export_file_name(day), "inventory-2024-05-03.csv");
    }
}
