//! Backend catalog and settings commands
//!
//! One-shot commands that print the product catalog or the backend's
//! application settings, as a table or as JSON.

use crate::api::types::{AppConfig, Product};
use crate::api::{HttpBackend, ReviewBackend};
use crate::config::Config;
use crate::error::{Result, ReviewLensError};
use prettytable::{row, Table};

/// List products available for analysis
///
/// # Examples
///
/// ```no_run
/// use reviewlens::config::Config;
/// use reviewlens::commands::catalog::list_products;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load("config/config.yaml", &Default::default())?;
/// list_products(&config, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_products(config: &Config, json: bool) -> Result<()> {
    tracing::info!("Listing products from {}", config.api.base_url);

    let backend = HttpBackend::new(&config.api)?;
    let products = backend.list_products().await?;

    if products.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No products available from {}", backend.base_url());
        }
        return Ok(());
    }

    if json {
        println!("{}", serialize_pretty(&products)?);
    } else {
        println!("\nProducts available for analysis:\n");
        products_table(&products).printstd();
        println!();
    }
    Ok(())
}

/// Show the backend's application settings
pub async fn show_status(config: &Config, json: bool) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let app_config = backend.app_config().await?;

    if json {
        println!("{}", serialize_pretty(&app_config)?);
        return Ok(());
    }

    println!("\nReviewLens Backend Status\n");
    println!("Base URL:          {}", backend.base_url());
    println!(
        "Product Selection: {}",
        if app_config.use_product_selection {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "Mode:              {}",
        app_config.mode.as_deref().unwrap_or("unknown")
    );
    if !app_config.strategy_names.is_empty() {
        println!();
        strategies_table(&app_config, config).printstd();
    }
    println!();
    Ok(())
}

fn serialize_pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value).map_err(ReviewLensError::Serialization)?)
}

/// Product table with 1-based numbers, as used by `/select <n>`
pub fn products_table(products: &[Product]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["#", "Product", "Category", "Reviews"]);
    for (i, product) in products.iter().enumerate() {
        table.add_row(row![
            i + 1,
            product.product_name,
            product.category.as_deref().unwrap_or("-"),
            product
                .review_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string())
        ]);
    }
    table
}

fn strategies_table(app_config: &AppConfig, config: &Config) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Strategy", "Label"]);
    let mut names: Vec<(&String, &String)> = app_config.strategy_names.iter().collect();
    names.sort();
    for (name, backend_label) in names {
        // Configured labels win over the backend's
        let label = config
            .chat
            .strategy_names
            .get(name)
            .unwrap_or(backend_label);
        table.add_row(row![name, label]);
    }
    table
}
