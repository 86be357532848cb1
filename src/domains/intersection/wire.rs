//! JSON shapes exchanged with `psi_server`.

use crate::domains::grid::{Cell, CellSet};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Canonical unit on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUnit {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl NormalizedUnit {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
        }
    }

    /// Cells are integral, so they need no coercion.
    pub fn from_cell(cell: Cell, prefix: &str, index: usize) -> Self {
        Self::new(format!("{prefix}-{index}"), cell.x as f64, cell.y as f64)
    }
}

/// One round's input. Built fresh per round and never mutated after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRequest {
    #[serde(rename = "bob_units")]
    pub prover_set: Vec<NormalizedUnit>,
    #[serde(rename = "alice_units")]
    pub verifier_set: Vec<NormalizedUnit>,
}

impl RoundRequest {
    pub fn new(prover_set: Vec<NormalizedUnit>, verifier_set: Vec<NormalizedUnit>) -> Self {
        Self {
            prover_set,
            verifier_set,
        }
    }

    pub fn from_cells(movers: &CellSet, watchers: &CellSet) -> Self {
        let units = |cells: &CellSet, prefix: &str| -> Vec<NormalizedUnit> {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| NormalizedUnit::from_cell(*c, prefix, i))
                .collect()
        };
        Self::new(units(movers, "bob"), units(watchers, "alice"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub items: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numbers pass through, numeric strings are parsed, anything else is absent.
fn lenient_ms<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BobItem {
    pub position: String,
    pub ciphertext: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliceItem {
    pub position: String,
    #[serde(rename = "blindedPoint")]
    pub blinded_point: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformedItem {
    pub position: String,
    #[serde(rename = "transformedPoint")]
    pub transformed_point: String,
}

/// Phase timings in milliseconds; absent or unparseable fields mean zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireTimings {
    #[serde(deserialize_with = "lenient_ms")]
    pub bob_setup: Option<f64>,
    #[serde(deserialize_with = "lenient_ms")]
    pub alice_setup: Option<f64>,
    #[serde(deserialize_with = "lenient_ms")]
    pub bob_response: Option<f64>,
    #[serde(deserialize_with = "lenient_ms")]
    pub alice_finalize: Option<f64>,
}

/// Raw server reply. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireResponse {
    pub bob_message: Option<ItemList<BobItem>>,
    pub alice_message: Option<ItemList<AliceItem>>,
    pub bob_response: Option<ItemList<TransformedItem>>,
    pub decrypted: Option<Vec<String>>,
    pub timings_ms: Option<WireTimings>,
    pub error: Option<String>,
}

impl WireResponse {
    /// Reply carrying only an intersection list.
    pub fn with_decrypted<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            decrypted: Some(units.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_wire_field_names() {
        let movers: CellSet = [Cell::new(1, 1)].into_iter().collect();
        let watchers: CellSet = [Cell::new(1, 1), Cell::new(0, 1)].into_iter().collect();
        let request = RoundRequest::from_cells(&movers, &watchers);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["bob_units"][0]["id"], "bob-0");
        assert_eq!(json["bob_units"][0]["x"], 1.0);
        assert_eq!(json["alice_units"].as_array().unwrap().len(), 2);
        assert_eq!(json["alice_units"][1]["id"], "alice-1");
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: WireResponse = serde_json::from_str(r#"{"decrypted":["2 2"]}"#).unwrap();
        assert_eq!(response.decrypted, Some(vec!["2 2".to_string()]));
        assert!(response.timings_ms.is_none());
        assert!(response.bob_message.is_none());

        let response: WireResponse =
            serde_json::from_str(r#"{"alice_message":{"items":[{"position":"1 1","blindedPoint":"ab"}]}}"#)
                .unwrap();
        let items = response.alice_message.unwrap().items;
        assert_eq!(items[0].blinded_point, "ab");
    }

    #[test]
    fn test_response_coerces_string_timings_and_null_items() {
        let response: WireResponse = serde_json::from_str(
            r#"{
                "bob_message": {"items": null},
                "decrypted": ["1 1"],
                "timings_ms": {"bob_setup": "1.5", "alice_setup": 2, "bob_response": "n/a", "alice_finalize": null}
            }"#,
        )
        .unwrap();
        assert!(response.bob_message.unwrap().items.is_empty());
        let timings = response.timings_ms.unwrap();
        assert_eq!(timings.bob_setup, Some(1.5));
        assert_eq!(timings.alice_setup, Some(2.0));
        assert_eq!(timings.bob_response, None);
        assert_eq!(timings.alice_finalize, None);
    }
}
