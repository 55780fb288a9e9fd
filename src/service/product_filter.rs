use crate::domain::product::{Product, ProductFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    Asc,
    Desc,
}

impl PriceOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(PriceOrder::Asc),
            "desc" => Some(PriceOrder::Desc),
            _ => None,
        }
    }
}

pub fn validate(filter: &ProductFilter) -> Result<(), String> {
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
        if min > max {
            return Err("minPrice must not exceed maxPrice".to_string());
        }
    }
    if let Some(n) = filter.number_size {
        if n < 0 {
            return Err("numberSize must be >= 0".to_string());
        }
    }
    Ok(())
}

pub fn matches(filter: &ProductFilter, product: &Product) -> bool {
    if product.disabled {
        return false;
    }

    if let Some(category) = non_blank(&filter.category) {
        if !category.eq_ignore_ascii_case(&product.category) {
            return false;
        }
    }

    if let Some(brand) = non_blank(&filter.brand_name) {
        if !brand.eq_ignore_ascii_case(&product.brand) {
            return false;
        }
    }

    if let Some(min) = filter.min_price {
        if product.price < min {
            return false;
        }
    }

    if let Some(max) = filter.max_price {
        if product.price > max {
            return false;
        }
    }

    match (non_blank(&filter.size), filter.number_size) {
        (Some(size), Some(n)) => product.stock_for(size).is_some_and(|q| q >= n),
        (Some(size), None) => product.stock_for(size).is_some_and(|q| q > 0),
        (None, Some(n)) => product.stock.iter().any(|e| e.quantity >= n),
        (None, None) => true,
    }
}

/// Keeps matching products; sorts by price only when `orderPrice` is asc/desc.
pub fn apply(filter: &ProductFilter, products: Vec<Product>) -> Vec<Product> {
    let mut out: Vec<Product> = products
        .into_iter()
        .filter(|p| matches(filter, p))
        .collect();

    match filter.order_price.as_deref().and_then(PriceOrder::parse) {
        Some(PriceOrder::Asc) => out.sort_by(|a, b| a.price.cmp(&b.price)),
        Some(PriceOrder::Desc) => out.sort_by(|a, b| b.price.cmp(&a.price)),
        None => {}
    }

    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
