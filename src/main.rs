use dotenvy::dotenv;
use order_desk::{
    config::{database, settings},
    core::{order, product, search::SearchSequencer, shipping::ShippingZones},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables can also be set externally
    dotenv().ok();

    // 3. Load settings and the shipping-zone table
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    let zones = ShippingZones::from_config(&settings.shipping_zones)
        .inspect_err(|e| error!("Invalid shipping zone configuration: {}", e))?;
    let search = SearchSequencer::from_settings(&settings);
    info!(
        currency = %settings.currency,
        zones = zones.len(),
        debounce = ?search.window(),
        "Settings loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog from settings
    product::seed_catalog(&db, &settings.products)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 6. Summary
    let products = product::get_all_active_products(&db).await?;
    let orders = order::list_orders(&db, 0, 1).await?;
    info!(
        products = products.len(),
        orders = orders.total_items,
        "Order desk ready"
    );

    Ok(())
}
