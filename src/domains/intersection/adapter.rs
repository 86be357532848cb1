//! Input normalization and reply adaptation for the PSI server.
//!
//! Inputs arrive in several shapes (raw `"x y"` strings, `{x, y}` objects,
//! `{unit}` / `{position}` objects). Everything is coerced into
//! [`NormalizedUnit`] before a request exists, so a malformed coordinate
//! fails the round before any network call.

use super::types::{
    AliceValue, BobValue, IntersectedUnit, RoundResult, Timing, TransformedValue,
};
use super::wire::{NormalizedUnit, WireResponse};
use crate::common::{DomainError, DomainResult, RoundError};
use crate::domains::grid::{Cell, Position};
use serde_json::Value;

/// Label reported for replies from the C++ `psi_server`.
pub const BACKEND_LABEL: &str = "psi_server_cpp";

/// One input position before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitInput {
    /// `"x y"` or `"x,y"`.
    Text(String),
    Point { id: Option<String>, x: f64, y: f64 },
    /// Object carrying its coordinates as text in `unit` or `position`.
    Labelled { id: Option<String>, label: String },
}

impl From<&Position> for UnitInput {
    fn from(p: &Position) -> Self {
        UnitInput::Point {
            id: Some(p.id.clone()),
            x: p.x,
            y: p.y,
        }
    }
}

impl From<Cell> for UnitInput {
    fn from(cell: Cell) -> Self {
        UnitInput::Point {
            id: None,
            x: cell.x as f64,
            y: cell.y as f64,
        }
    }
}

impl UnitInput {
    /// Classify a JSON value. Shape errors are reported here; numeric
    /// coercion happens in [`normalize_units`].
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        match value {
            Value::String(s) => Ok(UnitInput::Text(s.clone())),
            Value::Object(map) => {
                let id = map.get("id").and_then(json_id);
                if let (Some(x), Some(y)) = (map.get("x"), map.get("y")) {
                    return Ok(UnitInput::Point {
                        id,
                        x: json_number(x)?,
                        y: json_number(y)?,
                    });
                }
                let label = map.get("unit").or_else(|| map.get("position"));
                match label {
                    Some(Value::String(label)) => Ok(UnitInput::Labelled {
                        id,
                        label: label.clone(),
                    }),
                    Some(other) => Err(DomainError::invalid_coordinate(other)),
                    None => Err(DomainError::invalid_coordinate(format!(
                        "unit object missing x/y fields: {value}"
                    ))),
                }
            }
            Value::Null => Err(DomainError::invalid_coordinate("unit entry is null")),
            other => Err(DomainError::invalid_coordinate(format!(
                "unsupported unit: {other}"
            ))),
        }
    }
}

fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_number(value: &Value) -> DomainResult<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DomainError::invalid_coordinate(n)),
        Value::String(s) => parse_number(s),
        other => Err(DomainError::invalid_coordinate(other)),
    }
}

fn parse_number(text: &str) -> DomainResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DomainError::invalid_coordinate(text))
}

/// Parse `"x y"` / `"x,y"` into a coordinate pair. Extra tokens are ignored.
pub fn parse_unit_text(text: &str) -> DomainResult<(f64, f64)> {
    let mut parts = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty());
    match (parts.next(), parts.next()) {
        (Some(x), Some(y)) => Ok((parse_number(x)?, parse_number(y)?)),
        _ => Err(DomainError::invalid_coordinate(text)),
    }
}

/// Coerce inputs into wire units. IDs come from the input or are
/// synthesized as `{prefix}-{index}`.
pub fn normalize_units(inputs: &[UnitInput], prefix: &str) -> DomainResult<Vec<NormalizedUnit>> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let (id, x, y) = match input {
                UnitInput::Text(text) => {
                    let (x, y) = parse_unit_text(text)?;
                    (None, x, y)
                }
                UnitInput::Point { id, x, y } => {
                    for v in [x, y] {
                        if !v.is_finite() {
                            return Err(DomainError::invalid_coordinate(v));
                        }
                    }
                    (id.clone(), *x, *y)
                }
                UnitInput::Labelled { id, label } => {
                    let (x, y) = parse_unit_text(label)?;
                    (id.clone(), x, y)
                }
            };
            let id = id.unwrap_or_else(|| format!("{prefix}-{index}"));
            Ok(NormalizedUnit::new(id, x, y))
        })
        .collect()
}

/// [`normalize_units`] over raw JSON values.
pub fn normalize_json_units(values: &[Value], prefix: &str) -> DomainResult<Vec<NormalizedUnit>> {
    let inputs = values
        .iter()
        .map(UnitInput::from_json)
        .collect::<DomainResult<Vec<_>>>()?;
    normalize_units(&inputs, prefix)
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Turn a server reply into a [`RoundResult`]. An `error` payload becomes
/// [`RoundError::Backend`]; missing sections and timings default to empty/zero.
pub fn adapt_response(payload: WireResponse) -> Result<RoundResult, RoundError> {
    if let Some(message) = payload.error.filter(|m| !m.is_empty()) {
        return Err(RoundError::Backend(message));
    }

    let bob_values = payload
        .bob_message
        .map(|m| m.items)
        .unwrap_or_default()
        .into_iter()
        .map(|item| BobValue {
            unit: item.position,
            ciphertext: item.ciphertext,
            nonce: item.nonce,
        })
        .collect();

    let alice_values = payload
        .alice_message
        .map(|m| m.items)
        .unwrap_or_default()
        .into_iter()
        .map(|item| AliceValue {
            unit: item.position,
            blinded_point: item.blinded_point,
        })
        .collect();

    let bob_transformed_values = payload
        .bob_response
        .map(|m| m.items)
        .unwrap_or_default()
        .into_iter()
        .map(|item| TransformedValue {
            unit: item.position,
            transformed_point: item.transformed_point,
        })
        .collect();

    let intersected: Vec<IntersectedUnit> = payload
        .decrypted
        .unwrap_or_default()
        .into_iter()
        .map(IntersectedUnit::new)
        .collect();

    let timings = payload.timings_ms.unwrap_or_default();
    let bob_setup = non_negative(timings.bob_setup);
    let alice_setup = non_negative(timings.alice_setup);
    let bob_response = non_negative(timings.bob_response);
    let alice_finalize = non_negative(timings.alice_finalize);

    let performance = Timing {
        total_time: bob_setup + alice_setup + bob_response + alice_finalize,
        bob_setup_time: bob_setup,
        key_exchange_time: alice_setup + bob_response,
        intersection_time: alice_finalize,
        inverse_operations: 0,
        decrypt_operations: 0,
        successful_decryptions: intersected.len() as u64,
    };

    Ok(RoundResult {
        intersected,
        bob_values,
        alice_values,
        bob_transformed_values,
        performance,
        backend_label: BACKEND_LABEL.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_text_separators() {
        assert_eq!(parse_unit_text("12 7").unwrap(), (12.0, 7.0));
        assert_eq!(parse_unit_text("12,7").unwrap(), (12.0, 7.0));
        assert_eq!(parse_unit_text(" 1.5 ,  -2 ").unwrap(), (1.5, -2.0));
        assert!(parse_unit_text("12").is_err());
        assert!(parse_unit_text("x y").is_err());
    }

    #[test]
    fn test_non_negative_timing() {
        assert_eq!(non_negative(None), 0.0);
        assert_eq!(non_negative(Some(-3.0)), 0.0);
        assert_eq!(non_negative(Some(f64::NAN)), 0.0);
        assert_eq!(non_negative(Some(2.5)), 2.5);
    }
}
