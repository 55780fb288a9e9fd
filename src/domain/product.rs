use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub size: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: Vec<StockEntry>,
    pub featured: bool,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_for(&self, size: &str) -> Option<i32> {
        self.stock
            .iter()
            .find(|entry| entry.size.eq_ignore_ascii_case(size))
            .map(|entry| entry.quantity)
    }

    /// Overwrites the count of every listed size, appending sizes not yet stocked.
    pub fn apply_stock(&mut self, updates: &[StockEntry]) {
        for update in updates {
            match self
                .stock
                .iter_mut()
                .find(|entry| entry.size.eq_ignore_ascii_case(&update.size))
            {
                Some(entry) => entry.quantity = update.quantity,
                None => self.stock.push(update.clone()),
            }
        }
    }
}

/// Sizes and their counts travel as two parallel arrays on the wire.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StockLevels {
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub numbersizes: Vec<i32>,
}

impl StockLevels {
    pub fn from_entries(entries: &[StockEntry]) -> Self {
        Self {
            sizes: entries.iter().map(|e| e.size.clone()).collect(),
            numbersizes: entries.iter().map(|e| e.quantity).collect(),
        }
    }

    pub fn into_entries(self) -> Result<Vec<StockEntry>, String> {
        if self.sizes.len() != self.numbersizes.len() {
            return Err(format!(
                "sizes ({}) and numbersizes ({}) must have the same length",
                self.sizes.len(),
                self.numbersizes.len()
            ));
        }

        let mut entries: Vec<StockEntry> = Vec::with_capacity(self.sizes.len());
        for (size, quantity) in self.sizes.into_iter().zip(self.numbersizes) {
            let size = size.trim().to_string();
            if size.is_empty() {
                return Err("sizes must not be blank".to_string());
            }
            if quantity < 0 {
                return Err(format!("stock for size '{size}' must be >= 0"));
            }
            if entries.iter().any(|e| e.size.eq_ignore_ascii_case(&size)) {
                return Err(format!("size '{size}' is listed more than once"));
            }
            entries.push(StockEntry { size, quantity });
        }

        Ok(entries)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub numbersizes: Vec<i32>,
    #[serde(default)]
    pub featured: bool,
}

impl NewProduct {
    pub fn stock_levels(&self) -> StockLevels {
        StockLevels {
            sizes: self.sizes.clone(),
            numbersizes: self.numbersizes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

/// `/filtrado` query string. Field names follow the public API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand_name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub order_price: Option<String>,
    pub size: Option<String>,
    pub number_size: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSearchQuery {
    pub name: Option<String>,
}
