//! The contract between the lattice and the biological cells it hosts.

use crate::grid::Voxel;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Which population an agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Healthy,
    Cancer,
    OrganAtRisk,
}

/// What a cell asks of the lattice at the end of its hourly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRequest {
    /// Divide, placing the daughter in the least crowded neighbour outside the OAR zone.
    Healthy,
    /// Divide, placing the daughter in any neighbour.
    Cancer,
    /// Divide, refilling a neighbouring OAR voxel that lost its organ cell.
    OrganAtRisk,
    /// The cell died of nutrient deprivation; nearby organ cells are woken.
    Starved,
}

impl SpawnRequest {
    /// The kind of daughter requested, if this is a division.
    pub fn daughter_kind(self) -> Option<AgentKind> {
        match self {
            SpawnRequest::Healthy => Some(AgentKind::Healthy),
            SpawnRequest::Cancer => Some(AgentKind::Cancer),
            SpawnRequest::OrganAtRisk => Some(AgentKind::OrganAtRisk),
            SpawnRequest::Starved => None,
        }
    }
}

/// Result of one hourly cycle of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleOutcome {
    /// Glucose taken from the host voxel.
    pub glucose: f64,
    /// Oxygen taken from the host voxel.
    pub oxygen: f64,
    pub request: Option<SpawnRequest>,
}

impl CycleOutcome {
    pub fn consumed(glucose: f64, oxygen: f64) -> Self {
        Self { glucose, oxygen, request: None }
    }

    pub fn starved() -> Self {
        Self { glucose: 0.0, oxygen: 0.0, request: Some(SpawnRequest::Starved) }
    }

    pub fn with_request(mut self, request: SpawnRequest) -> Self {
        self.request = Some(request);
        self
    }
}

/// Capabilities the lattice needs from a biological cell. The kind is fixed for the
/// lifetime of a cell and decides where the lattice files it.
pub trait CellBehavior: Clone {
    fn kind(&self) -> AgentKind;

    fn is_alive(&self) -> bool;

    /// Advances the cell by one hour given its voxel's nutrients and crowding
    /// (neighbour density plus co-located agents).
    fn cycle(&mut self, glucose: f64, oxygen: f64, density: i32) -> CycleOutcome;

    /// Delivers an effective dose in Gy. The cell decides whether it survives.
    fn radiate(&mut self, dose: f64, rng: &mut StdRng);

    /// Enter quiescence, e.g. because division found no room.
    fn sleep(&mut self);

    /// Leave quiescence.
    fn wake(&mut self);

    /// A newborn daughter of the given kind.
    fn offspring(kind: AgentKind) -> Self;
}

/// A cell together with the voxel that hosts it.
#[derive(Debug, Clone)]
pub struct AgentRecord<C> {
    pub voxel: Voxel,
    pub kind: AgentKind,
    pub cell: C,
}

impl<C: CellBehavior> AgentRecord<C> {
    pub fn new(voxel: Voxel, cell: C) -> Self {
        Self { voxel, kind: cell.kind(), cell }
    }
}
