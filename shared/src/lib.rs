use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

/// Raw body of a create/update request.
///
/// Every field keeps the distinction between a key that was never sent
/// (`None`) and one sent as `null` (`Some(Value::Null)`); the required-field
/// rule depends on it. Only a JSON object carries fields: any other body
/// (array, string, number) reads as a payload with every field absent, and a
/// repeated key keeps its last value.
#[derive(Debug, Clone)]
pub struct ProductPayload {
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub quantity: Option<Value>,
    pub price: Option<Value>,
}

impl<'de> Deserialize<'de> for ProductPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = match Value::deserialize(deserializer)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Ok(Self {
            name: fields.remove("name"),
            description: fields.remove("description"),
            quantity: fields.remove("quantity"),
            price: fields.remove("price"),
        })
    }
}

/// Validated product fields, ready to be bound to an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name, quantity, and price are required fields.")]
    MissingRequired,
    #[error("Invalid value for field '{field}': expected {expected}.")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl ProductPayload {
    /// `name` must be present and truthy; `quantity` and `price` only need to
    /// be present, so an explicit `0` passes.
    pub fn validate(self) -> Result<ProductFields, ValidationError> {
        let (name, quantity, price) = match (self.name, self.quantity, self.price) {
            (Some(name), Some(quantity), Some(price)) if is_truthy(&name) => {
                (name, quantity, price)
            }
            _ => return Err(ValidationError::MissingRequired),
        };

        let description = match self.description {
            None | Some(Value::Null) => None,
            Some(value) => Some(text("description", value)?),
        };

        Ok(ProductFields {
            name: text("name", name)?,
            description,
            quantity: integer("quantity", quantity)?,
            price: decimal("price", price)?,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text(field: &'static str, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ValidationError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn integer(field: &'static str, value: Value) -> Result<i32, ValidationError> {
    let invalid = ValidationError::InvalidField {
        field,
        expected: "an integer",
    };
    match &value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map_err(|_| invalid),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 => {
                    Ok(f as i32)
                }
                _ => Err(invalid),
            },
        },
        Value::String(s) => s.trim().parse::<i32>().map_err(|_| invalid),
        _ => Err(invalid),
    }
}

fn decimal(field: &'static str, value: Value) -> Result<BigDecimal, ValidationError> {
    let invalid = ValidationError::InvalidField {
        field,
        expected: "a number",
    };
    match &value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).map_err(|_| invalid),
        Value::String(s) => BigDecimal::from_str(s.trim()).map_err(|_| invalid),
        _ => Err(invalid),
    }
}
