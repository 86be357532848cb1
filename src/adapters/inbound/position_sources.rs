use crate::domains::grid::Position;
use crate::domains::intersection::{PositionSnapshot, PositionSource};
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fixed positions, for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct StaticPositions {
    snapshot: PositionSnapshot,
}

impl StaticPositions {
    pub fn new(movers: Vec<Position>, watchers: Vec<Position>) -> Self {
        Self {
            snapshot: PositionSnapshot::new(movers, watchers),
        }
    }
}

impl PositionSource for StaticPositions {
    fn snapshot(&self) -> PositionSnapshot {
        self.snapshot.clone()
    }
}

/// Default field edge length for [`BouncingField`].
pub const FIELD_SIZE: f64 = 600.0;

/// Distance a mover travels per axis per motion step.
const STEP: f64 = 2.0;

#[derive(Debug, Clone)]
struct Mover {
    position: Position,
    vx: f64,
    vy: f64,
}

/// Movers drifting diagonally and bouncing off the field edges, with static
/// watchers. Velocities start at a random ±1 on each axis.
pub struct BouncingField {
    movers: Mutex<Vec<Mover>>,
    watchers: Vec<Position>,
    width: f64,
    height: f64,
}

impl BouncingField {
    pub fn new(movers: Vec<Position>, watchers: Vec<Position>) -> Self {
        Self::with_bounds(movers, watchers, FIELD_SIZE, FIELD_SIZE)
    }

    pub fn with_bounds(movers: Vec<Position>, watchers: Vec<Position>, width: f64, height: f64) -> Self {
        let mut rng = rand::thread_rng();
        let movers = movers
            .into_iter()
            .map(|position| Mover {
                position,
                vx: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
                vy: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            })
            .collect();
        Self {
            movers: Mutex::new(movers),
            watchers,
            width,
            height,
        }
    }

    /// Advance every mover one step. A mover that leaves the field has its
    /// velocity on that axis reversed and comes back on the next step.
    pub fn step(&self) {
        let mut movers = self.movers.lock().unwrap_or_else(PoisonError::into_inner);
        for m in movers.iter_mut() {
            m.position.x += m.vx * STEP;
            m.position.y += m.vy * STEP;
            if m.position.x > self.width || m.position.x < 0.0 {
                m.vx = -m.vx;
            }
            if m.position.y > self.height || m.position.y < 0.0 {
                m.vy = -m.vy;
            }
        }
    }

    pub fn movers(&self) -> Vec<Position> {
        self.movers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|m| m.position.clone())
            .collect()
    }

    pub fn watchers(&self) -> &[Position] {
        &self.watchers
    }

    /// Step every `period` until `shutdown` is cancelled.
    pub fn spawn_motion(self: &Arc<Self>, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let field = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => field.step(),
                }
            }
        })
    }
}

impl PositionSource for BouncingField {
    fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot::new(self.movers(), self.watchers.clone())
    }
}
