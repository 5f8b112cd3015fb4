//! Application settings loaded from `settings.toml`.
//!
//! The file holds the currency used for display, the product search debounce
//! window, the shipping-zone delivery charges and an optional product list used to
//! seed an empty catalog.

use crate::{
    config::optional_env,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{path::Path, time::Duration};

const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Environment variable that overrides the settings file location
pub const CONFIG_PATH_ENV: &str = "ORDER_DESK_CONFIG";

/// Configuration structure representing the entire settings.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Currency code shown next to amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Input inactivity before a product search fires
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Delivery charge per shipping zone
    #[serde(default)]
    pub shipping_zones: Vec<ShippingZoneConfig>,
    /// Products inserted when the catalog does not contain them yet
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            shipping_zones: Vec::new(),
            products: Vec::new(),
        }
    }
}

impl Settings {
    /// Inactivity window before a product search is sent.
    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn default_currency() -> String {
    "BDT".to_string()
}

const fn default_search_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE_MS
}

/// A named shipping zone and its default delivery charge
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingZoneConfig {
    pub name: String,
    pub delivery_charge: Decimal,
}

/// Catalog entry used for seeding
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub stock_quantity: u32,
    #[serde(default)]
    pub same_price_for_all_variants: bool,
    #[serde(default)]
    pub variants: Vec<VariantSeed>,
}

/// Variant entry of a seeded product
#[derive(Debug, Clone, Deserialize)]
pub struct VariantSeed {
    pub color: String,
    pub size: String,
    pub stock_quantity: u32,
    /// Falls back to the product price when absent
    pub unit_price: Option<Decimal>,
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns `Error::Config` if the TOML is invalid or required fields are missing.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `ORDER_DESK_CONFIG`, or `./settings.toml` when unset.
///
/// A missing default file is not an error; built-in defaults are used instead.
///
/// # Errors
/// Returns an error if an existing settings file cannot be read or parsed, or if
/// `ORDER_DESK_CONFIG` is not valid unicode.
pub fn load_default_settings() -> Result<Settings> {
    if let Some(path) = optional_env(CONFIG_PATH_ENV)? {
        return load_settings(path);
    }

    let default_path = Path::new("settings.toml");
    if default_path.exists() {
        load_settings(default_path)
    } else {
        tracing::warn!("No settings.toml found, using defaults");
        Ok(Settings::default())
    }
}
