//! Voxel lattice engine for tumour growth and radiotherapy simulation.
//!
//! The core (`lattice` and the modules it builds on) is generic over any cell model
//! implementing [`CellBehavior`]. `cell`, `controller` and `output` provide a concrete
//! biology, an hourly driver and result writers.

pub mod agent;
pub mod cell;
pub mod container;
pub mod controller;
pub mod diffusion;
pub mod dosimetry;
pub mod error;
pub mod grid;
pub mod lattice;
pub mod output;

pub use agent::{AgentKind, AgentRecord, CellBehavior, CycleOutcome, SpawnRequest};
pub use cell::{Phase, TissueCell};
pub use container::{AgentContainer, PopulationCounts, SourceContainer};
pub use controller::Controller;
pub use dosimetry::IrradiationReport;
pub use error::LatticeError;
pub use grid::{Dims, ExclusionZone, Voxel};
pub use lattice::{Lattice, VoxelClass};
