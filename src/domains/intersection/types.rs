use crate::common::DomainResult;
use crate::domains::grid::{Cell, CellSet, Position, ResolutionLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of one orchestrator. The only gate for starting rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundState {
    #[default]
    Idle,
    ProcessingCoarse,
    ProcessingFine,
    Error,
}

impl RoundState {
    pub fn is_processing(self) -> bool {
        matches!(self, RoundState::ProcessingCoarse | RoundState::ProcessingFine)
    }

    /// `idle` and `error` both accept a new run; `error` is recoverable.
    pub fn accepts_run(self) -> bool {
        !self.is_processing()
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RoundState::Idle => "idle",
            RoundState::ProcessingCoarse => "processing-coarse",
            RoundState::ProcessingFine => "processing-fine",
            RoundState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Positions captured by value when a round starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub movers: Vec<Position>,
    pub watchers: Vec<Position>,
}

impl PositionSnapshot {
    pub fn new(movers: Vec<Position>, watchers: Vec<Position>) -> Self {
        Self { movers, watchers }
    }

    pub fn ensure_finite(&self) -> DomainResult<()> {
        self.movers
            .iter()
            .chain(self.watchers.iter())
            .try_for_each(Position::ensure_finite)
    }
}

/// One intersected identifier as returned by the server, e.g. `"2 2"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectedUnit {
    pub unit: String,
}

impl IntersectedUnit {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    pub fn cell(&self) -> DomainResult<Cell> {
        self.unit.parse()
    }
}

/// Parse every identifier back into a cell; one bad identifier fails the lot.
pub fn intersected_cells(units: &[IntersectedUnit]) -> DomainResult<CellSet> {
    units.iter().map(IntersectedUnit::cell).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BobValue {
    pub unit: String,
    pub ciphertext: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliceValue {
    pub unit: String,
    pub blinded_point: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedValue {
    pub unit: String,
    pub transformed_point: String,
}

/// Phase timings in milliseconds plus operation counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timing {
    pub total_time: f64,
    pub bob_setup_time: f64,
    pub key_exchange_time: f64,
    pub intersection_time: f64,
    pub inverse_operations: u64,
    pub decrypt_operations: u64,
    pub successful_decryptions: u64,
}

/// Canonical form of one server reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub intersected: Vec<IntersectedUnit>,
    pub bob_values: Vec<BobValue>,
    pub alice_values: Vec<AliceValue>,
    pub bob_transformed_values: Vec<TransformedValue>,
    pub performance: Timing,
    pub backend_label: String,
}

/// Timing of a settled round, tagged with the level it ran at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTiming {
    pub level: ResolutionLevel,
    pub grid_size: f64,
    pub timing: Timing,
    pub backend_label: String,
}

/// What the presentation layer renders. Read-only snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPublication {
    pub orchestrator_id: Uuid,
    pub status: RoundState,
    pub results: Vec<IntersectedUnit>,
    pub performance: Option<LevelTiming>,
    pub published_at: DateTime<Utc>,
}

impl RoundPublication {
    /// Result identifiers parsed back into cells, skipping anything unparseable.
    pub fn result_cells(&self) -> CellSet {
        self.results.iter().filter_map(|u| u.cell().ok()).collect()
    }
}
