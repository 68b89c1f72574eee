//! Dose deposition: an error-function falloff around the treatment centre corrected by
//! the oxygen modification factor of Powathil et al.

use crate::container::PopulationCounts;
use radiosim_common::Vec3;

/// Width of the falloff profile, 2.7 * sqrt(2).
pub const DOSE_SPREAD: f64 = 3.8;
/// Profile half-width used for normalisation; distances are rescaled so that the
/// requested radius maps onto 10 profile units.
pub const PROFILE_RADIUS: f64 = 14.0;
/// Voxels beyond this many radii from the centre are skipped.
pub const CUTOFF_RADII: f64 = 3.0;

// Oxygen enhancement
const OER_MAX: f64 = 3.0;
const K_M: f64 = 3.0;

/// Falloff profile `erf((r - d) / 3.8) - erf((-r - d) / 3.8)`.
pub fn dose_profile(r: f64, d: f64) -> f64 {
    libm::erf((r - d) / DOSE_SPREAD) - libm::erf((-r - d) / DOSE_SPREAD)
}

/// Oxygen modification factor for local oxygen `oxygen` (1e-6 ml per voxel).
/// Equals 1 at full oxygenation and falls to 1/3 under anoxia.
pub fn oxygen_modification(oxygen: f64) -> f64 {
    let o = oxygen / 100.0;
    (o * OER_MAX + K_M) / (o + K_M) / OER_MAX
}

/// A single irradiation: prescribed dose, field radius and centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosePlan {
    pub dose: f64,
    pub radius: f64,
    pub center: Vec3,
    multiplier: f64,
}

impl DosePlan {
    pub fn new(dose: f64, radius: f64, center: Vec3) -> Self {
        Self { dose, radius, center, multiplier: dose / dose_profile(PROFILE_RADIUS, 0.0) }
    }

    /// Normalising multiplier: the dose at the centre equals the prescription.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Whether a voxel at `distance` from the centre receives any dose.
    pub fn reaches(&self, distance: f64) -> bool {
        distance < CUTOFF_RADII * self.radius
    }

    /// Physical dose at `distance` voxels from the centre, before oxygen correction.
    pub fn dose_at(&self, distance: f64) -> f64 {
        self.multiplier * dose_profile(PROFILE_RADIUS, distance * 10.0 / self.radius)
    }

    /// Effective dose for a cell at `distance` sitting in `oxygen`.
    pub fn effective_dose(&self, distance: f64, oxygen: f64) -> f64 {
        self.dose_at(distance) * oxygen_modification(oxygen)
    }
}

/// What one irradiation did to the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IrradiationReport {
    pub voxels_hit: usize,
    pub agents_hit: usize,
    pub killed: PopulationCounts,
    pub radius: f64,
    pub center: Vec3,
}
