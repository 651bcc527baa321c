use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shared::ProductFields;

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Mutable columns of a product. Used both as the insert row and as the
/// update changeset, where a `None` description overwrites with NULL.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::products, treat_none_as_null = true)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl From<ProductFields> for NewProduct {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            quantity: fields.quantity,
            price: fields.price,
        }
    }
}
