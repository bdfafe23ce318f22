use crate::models::{OrderRequest, OrderSide, OrderType, TradingPair};
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Problems with the orders file. Each one stops the run before any order is placed.
#[derive(Debug, Error)]
pub enum OrderFileError {
    #[error("Couldn't find an order file {0}. Make sure this file exists or point --orders at it")]
    Missing(PathBuf),

    #[error("There was an error while reading the orders file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("There was an error while decoding your orders file. Please make sure you wrote valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The orders file must contain a JSON list of orders")]
    NotAList,

    #[error("Your order\n{record}\ndid not contain a valid value for '{field}'. Make sure the JSON in your orders file is correct")]
    InvalidField { field: &'static str, record: String },
}

/// Read and validate the orders file
pub fn read_orders_from_file(path: &Path) -> Result<Vec<OrderRequest>, OrderFileError> {
    if !path.exists() {
        return Err(OrderFileError::Missing(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| OrderFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let orders = parse_orders(&content)?;

    if !orders.is_empty() {
        tracing::info!("Read the following orders from {}:", path.display());
        for order in &orders {
            tracing::info!("\t- {}", order);
        }
    } else {
        tracing::warn!("No orders found in {}", path.display());
    }

    Ok(orders)
}

/// Parse orders from JSON text, checking every record's fields and types
pub fn parse_orders(content: &str) -> Result<Vec<OrderRequest>, OrderFileError> {
    let json: Value = serde_json::from_str(content)?;
    let records = json.as_array().ok_or(OrderFileError::NotAList)?;

    records.iter().map(parse_record).collect()
}

fn parse_record(record: &Value) -> Result<OrderRequest, OrderFileError> {
    let invalid = |field: &'static str| OrderFileError::InvalidField {
        field,
        record: record.to_string(),
    };

    let pair = record
        .get("pair")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("pair"))?;

    let amount_in_fiat = match record.get("amount_in_fiat") {
        Some(Value::Number(n)) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .map_err(|_| invalid("amount_in_fiat"))?
        }
        _ => return Err(invalid("amount_in_fiat")),
    };

    let debug = record
        .get("debug")
        .and_then(Value::as_bool)
        .ok_or_else(|| invalid("debug"))?;

    let mut order = OrderRequest::new(TradingPair::new(pair), amount_in_fiat, debug);

    if let Some(side) = record.get("side") {
        order.side = serde_json::from_value::<OrderSide>(side.clone())
            .map_err(|_| invalid("side"))?;
    }
    if let Some(order_type) = record.get("order_type") {
        order.order_type = serde_json::from_value::<OrderType>(order_type.clone())
            .map_err(|_| invalid("order_type"))?;
    }

    Ok(order)
}
