//! Request validation and normalization.
//!
//! Request bodies arrive as loosely typed records (every field optional, enums
//! as free text) so that a missing or unrecognized value is reported as a
//! [`ValidationError`] naming the offending field. Each validator is a pure
//! function returning the normalized record the storage layer writes.

use std::{collections::HashSet, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use db::models::{
    amount::Amount,
    association_rule::NewAssociationRule,
    client::{ClientPatch, Gender, NewClient, SalesChannel},
    order::{Currency, NewOrder, NewOrderItem, OrderUpdate, OrderWithItems},
    product::{NewProduct, ProductPatch},
    product_equivalence::NewEquivalence,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::reconciler;

pub const DEFAULT_COUNTRY: &str = "CR";
pub const DEFAULT_EQUIVALENCE_REASON: &str = "Manual equivalence";
pub const API_VALIDATOR: &str = "API";
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn required(field: &str) -> Self {
        Self::new(field, "is required")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct CreateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub channels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub channels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct CreateCategory {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct CreateProduct {
    pub name: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub alt_code: Option<String>,
    pub legacy_code: Option<String>,
}

/// Product patch. An empty string clears a code; an absent code is kept.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub alt_code: Option<String>,
    pub legacy_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct CreateEquivalence {
    pub product_a: Option<Uuid>,
    pub product_b: Option<Uuid>,
    pub reason: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i64>,
    #[ts(type = "string | number | null")]
    pub unit_price: Option<Amount>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct CreateOrder {
    pub client_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
    pub channel: Option<String>,
    pub currency: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
    pub metadata: Option<serde_json::Value>,
}

/// Order patch. `placed_at` is accepted by the parser only so it can be refused.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct UpdateOrder {
    pub client_id: Option<Uuid>,
    #[ts(type = "string | null")]
    pub placed_at: Option<serde_json::Value>,
    pub channel: Option<String>,
    pub currency: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
    pub metadata: Option<serde_json::Value>,
}

fn required_text(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::required(field)),
    }
}

/// Trimmed text; blank counts as absent.
fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn present_text(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(_) => required_text(field, value).map(Some),
    }
}

pub fn parse_email(value: &str) -> Result<String, ValidationError> {
    let email = value.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::new("email", format!("'{email}' is not a valid email")));
    }
    Ok(email)
}

pub fn parse_gender(value: &str) -> Result<Gender, ValidationError> {
    Gender::from_str(value.trim()).map_err(|_| {
        ValidationError::new(
            "gender",
            format!("'{}' is not one of Male, Female, Other", value.trim()),
        )
    })
}

pub fn parse_country(value: &str) -> Result<String, ValidationError> {
    let country = value.trim().to_uppercase();
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new(
            "country",
            format!("'{}' is not a 2-letter country code", value.trim()),
        ));
    }
    Ok(country)
}

pub fn parse_channel(value: &str) -> Result<SalesChannel, ValidationError> {
    SalesChannel::from_str(value.trim()).map_err(|_| {
        ValidationError::new(
            "channel",
            format!("'{}' is not one of WEB, STORE, PARTNER", value.trim()),
        )
    })
}

pub fn parse_currency(value: &str) -> Result<Currency, ValidationError> {
    Currency::from_str(value.trim()).map_err(|_| {
        ValidationError::new(
            "currency",
            format!("'{}' is not one of CRC, USD", value.trim()),
        )
    })
}

/// Client channel preferences: WEB and STORE only, duplicates collapsed, sorted.
fn parse_client_channels(values: &[String]) -> Result<Vec<SalesChannel>, ValidationError> {
    let mut channels = Vec::with_capacity(values.len());
    for value in values {
        let channel =
            parse_channel(value).map_err(|e| ValidationError::new("channels", e.message))?;
        if channel == SalesChannel::Partner {
            return Err(ValidationError::new(
                "channels",
                "client preferences only accept WEB and STORE",
            ));
        }
        channels.push(channel);
    }
    channels.sort();
    channels.dedup();
    Ok(channels)
}

pub fn validate_new_client(input: &CreateClient) -> Result<NewClient, ValidationError> {
    let name = required_text("name", input.name.as_deref())?;
    let email = parse_email(input.email.as_deref().unwrap_or_default())?;
    let gender = match input.gender.as_deref() {
        Some(g) if !g.trim().is_empty() => parse_gender(g)?,
        _ => return Err(ValidationError::required("gender")),
    };
    let country = match optional_text(input.country.as_deref()) {
        Some(c) => parse_country(&c)?,
        None => DEFAULT_COUNTRY.to_string(),
    };
    let channels = match &input.channels {
        Some(values) => parse_client_channels(values)?,
        None => Vec::new(),
    };

    Ok(NewClient {
        name,
        email,
        gender,
        country,
        channels,
    })
}

pub fn validate_client_patch(input: &UpdateClient) -> Result<ClientPatch, ValidationError> {
    let patch = ClientPatch {
        name: present_text("name", input.name.as_deref())?,
        email: input.email.as_deref().map(parse_email).transpose()?,
        gender: input.gender.as_deref().map(parse_gender).transpose()?,
        country: input.country.as_deref().map(parse_country).transpose()?,
        channels: input
            .channels
            .as_deref()
            .map(parse_client_channels)
            .transpose()?,
    };
    if patch == ClientPatch::default() {
        return Err(ValidationError::new("body", "no fields to update"));
    }
    Ok(patch)
}

pub fn validate_category(input: &CreateCategory) -> Result<String, ValidationError> {
    required_text("name", input.name.as_deref())
}

pub fn validate_new_product(input: &CreateProduct) -> Result<NewProduct, ValidationError> {
    Ok(NewProduct {
        name: required_text("name", input.name.as_deref())?,
        category: required_text("category", input.category.as_deref())?,
        sku: optional_text(input.sku.as_deref()),
        alt_code: optional_text(input.alt_code.as_deref()),
        legacy_code: optional_text(input.legacy_code.as_deref()),
    })
}

pub fn validate_product_patch(input: &UpdateProduct) -> Result<ProductPatch, ValidationError> {
    let code = |value: &Option<String>| value.as_deref().map(|v| optional_text(Some(v)));
    let patch = ProductPatch {
        name: present_text("name", input.name.as_deref())?,
        category: present_text("category", input.category.as_deref())?,
        sku: code(&input.sku),
        alt_code: code(&input.alt_code),
        legacy_code: code(&input.legacy_code),
    };
    if patch == ProductPatch::default() {
        return Err(ValidationError::new("body", "no fields to update"));
    }
    Ok(patch)
}

pub fn validate_equivalence(input: &CreateEquivalence) -> Result<NewEquivalence, ValidationError> {
    let product_a = input
        .product_a
        .ok_or_else(|| ValidationError::required("product_a"))?;
    let product_b = input
        .product_b
        .ok_or_else(|| ValidationError::required("product_b"))?;
    if product_a == product_b {
        return Err(ValidationError::new(
            "product_b",
            "a product cannot be equivalent to itself",
        ));
    }
    let confidence = input.confidence.unwrap_or(1.0);
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ValidationError::new("confidence", "must be between 0 and 1"));
    }

    Ok(NewEquivalence {
        product_a,
        product_b,
        reason: optional_text(input.reason.as_deref())
            .unwrap_or_else(|| DEFAULT_EQUIVALENCE_REASON.to_string()),
        confidence,
        validated_by: API_VALIDATOR.to_string(),
    })
}

fn validate_items(
    items: &[OrderItemInput],
    currency: Currency,
) -> Result<Vec<NewOrderItem>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::new("items", "an order needs at least one item"));
    }

    let mut seen = HashSet::with_capacity(items.len());
    let mut validated = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let field = |name: &str| format!("items[{i}].{name}");

        let product_id = item
            .product_id
            .ok_or_else(|| ValidationError::required(&field("product_id")))?;
        if !seen.insert(product_id) {
            return Err(ValidationError::new(
                field("product_id"),
                format!("product {product_id} appears more than once"),
            ));
        }

        let quantity = item
            .quantity
            .ok_or_else(|| ValidationError::required(&field("quantity")))?;
        if quantity < 1 {
            return Err(ValidationError::new(field("quantity"), "must be at least 1"));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::new(
                field("quantity"),
                format!("must be at most {MAX_LINE_QUANTITY}"),
            ));
        }

        let unit_price = item
            .unit_price
            .ok_or_else(|| ValidationError::required(&field("unit_price")))?;
        check_price(&unit_price, currency)
            .map_err(|msg| ValidationError::new(field("unit_price"), msg))?;

        validated.push(NewOrderItem {
            product_id,
            quantity,
            unit_price,
        });
    }
    Ok(validated)
}

fn check_price(price: &Amount, currency: Currency) -> Result<(), String> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("must not be negative".to_string());
    }
    let allowed = currency.max_decimal_places();
    if price.decimal_places() > allowed {
        return Err(match allowed {
            0 => format!("{currency} amounts must be whole numbers"),
            n => format!("{currency} amounts allow at most {n} decimal places"),
        });
    }
    Ok(())
}

fn validate_metadata(
    value: Option<&serde_json::Value>,
) -> Result<serde_json::Value, ValidationError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(serde_json::json!({})),
        Some(v @ serde_json::Value::Object(_)) => Ok(v.clone()),
        Some(_) => Err(ValidationError::new("metadata", "must be a JSON object")),
    }
}

/// Validate a new order and reconcile its total. `now` stamps orders without `placed_at`.
pub fn validate_new_order(
    input: &CreateOrder,
    now: DateTime<Utc>,
) -> Result<NewOrder, ValidationError> {
    let client_id = input
        .client_id
        .ok_or_else(|| ValidationError::required("client_id"))?;
    let channel = match input.channel.as_deref() {
        Some(c) if !c.trim().is_empty() => parse_channel(c)?,
        _ => return Err(ValidationError::required("channel")),
    };
    let currency = match optional_text(input.currency.as_deref()) {
        Some(c) => parse_currency(&c)?,
        None => Currency::default(),
    };
    let items = validate_items(input.items.as_deref().unwrap_or_default(), currency)?;
    let metadata = validate_metadata(input.metadata.as_ref())?;

    Ok(NewOrder {
        client_id,
        placed_at: input.placed_at.unwrap_or(now),
        channel,
        currency,
        total: reconciler::order_total(&items)?,
        items,
        metadata,
    })
}

/// Merge a patch onto the stored order and re-validate the whole record.
///
/// Stored lines are re-checked against the merged currency, so switching an
/// order with fractional prices to CRC is refused.
pub fn validate_order_update(
    existing: &OrderWithItems,
    input: &UpdateOrder,
) -> Result<OrderUpdate, ValidationError> {
    if input.placed_at.is_some() {
        return Err(ValidationError::new(
            "placed_at",
            "is set when the order is created and cannot be changed",
        ));
    }
    if input.client_id.is_none()
        && input.channel.is_none()
        && input.currency.is_none()
        && input.items.is_none()
        && input.metadata.is_none()
    {
        return Err(ValidationError::new("body", "no fields to update"));
    }

    let channel = match input.channel.as_deref() {
        Some(c) => parse_channel(c)?,
        None => existing.channel,
    };
    let currency = match input.currency.as_deref() {
        Some(c) => parse_currency(c)?,
        None => existing.currency,
    };
    let metadata = match &input.metadata {
        Some(m) => validate_metadata(Some(m))?,
        None => existing.metadata.clone(),
    };

    let (items, total) = match &input.items {
        Some(items) => {
            let items = validate_items(items, currency)?;
            let total = reconciler::order_total(&items)?;
            (Some(items), total)
        }
        None => {
            for (i, item) in existing.items.iter().enumerate() {
                check_price(&item.unit_price, currency)
                    .map_err(|msg| ValidationError::new(format!("items[{i}].unit_price"), msg))?;
            }
            (None, reconciler::stored_total(&existing.items)?)
        }
    };

    Ok(OrderUpdate {
        client_id: input.client_id.unwrap_or(existing.client_id),
        channel,
        currency,
        metadata,
        items,
        total,
    })
}

/// Checks applied to association rules loaded by the seeder.
pub fn validate_rule(rule: &NewAssociationRule) -> Result<(), ValidationError> {
    if rule.antecedents.is_empty() {
        return Err(ValidationError::new("antecedents", "must not be empty"));
    }
    if rule.consequents.is_empty() {
        return Err(ValidationError::new("consequents", "must not be empty"));
    }
    for (field, value) in [("support", rule.support), ("confidence", rule.confidence)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::new(field, "must be between 0 and 1"));
        }
    }
    if !rule.lift.is_finite() || rule.lift < 0.0 {
        return Err(ValidationError::new("lift", "must be a non-negative number"));
    }
    Ok(())
}
