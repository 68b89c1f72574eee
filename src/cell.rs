//! Reference cell biology: a shared G1/S/G2/M cycle with quiescence, specialised per
//! population, and linear-quadratic radiation survival.

use crate::agent::{AgentKind, CellBehavior, CycleOutcome, SpawnRequest};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

// Uptake per hour
const HEALTHY_GLUCOSE_UPTAKE: f64 = 0.36;
const CANCER_GLUCOSE_UPTAKE: f64 = 0.54;
const HEALTHY_OXYGEN_UPTAKE: f64 = 20.0;
const CANCER_OXYGEN_UPTAKE: f64 = 20.0;
const QUIESCENT_UPTAKE_RATIO: f64 = 0.75;

// Below these a cell dies of starvation
const CRITICAL_GLUCOSE: f64 = HEALTHY_GLUCOSE_UPTAKE * 0.75;
const CRITICAL_OXYGEN: f64 = HEALTHY_OXYGEN_UPTAKE * 0.75;
// Below these (or above the crowding limit) healthy cells stop cycling
const QUIESCENT_GLUCOSE: f64 = HEALTHY_GLUCOSE_UPTAKE * 2.0 * 24.0;
const QUIESCENT_OXYGEN: f64 = HEALTHY_OXYGEN_UPTAKE * 2.0 * 24.0;
const CRITICAL_NEIGHBORS: i32 = 9;

// Phase durations in hours
const G1_HOURS: u32 = 11;
const S_HOURS: u32 = 8;
const G2_HOURS: u32 = 4;
const M_HOURS: u32 = 1;

// Linear-quadratic parameters (Gy^-1, Gy^-2)
const ALPHA_TUMOR: f64 = 0.3;
const BETA_TUMOR: f64 = 0.03;
const ALPHA_NORMAL: f64 = 0.15;
const BETA_NORMAL: f64 = 0.05;

// Sub-lethal damage repair, hours per Gy received
const REPAIR_HOURS_PER_GY: f64 = 3.0;
const REPAIR_SPREAD_HOURS: f64 = 1.0;

/// Cell-cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    G1,
    S,
    G2,
    M,
    Quiescent,
}

impl Phase {
    /// Phases a seeded healthy cell may start in.
    pub const HEALTHY_START: [Phase; 5] = [Phase::G1, Phase::S, Phase::G2, Phase::M, Phase::Quiescent];
    /// Phases a seeded cancer cell may start in.
    pub const CANCER_START: [Phase; 4] = [Phase::G1, Phase::S, Phase::G2, Phase::M];
}

/// Cycle clock shared by every population.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleState {
    pub phase: Phase,
    /// Hours spent in the current phase.
    pub age: u32,
    /// Hours of repair left; the clock is frozen while repairing.
    pub repair: u32,
    pub alive: bool,
}

impl CycleState {
    pub fn new(phase: Phase) -> Self {
        Self { phase, age: 0, repair: 0, alive: true }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.age = 0;
    }

    fn tick_clock(&mut self) {
        if self.repair == 0 {
            self.age += 1;
        } else {
            self.repair -= 1;
        }
    }

    /// Advances through S, G2 and M. Returns true when mitosis completes.
    fn advance_proliferating(&mut self) -> bool {
        match self.phase {
            Phase::G1 if self.age >= G1_HOURS => self.enter(Phase::S),
            Phase::S if self.age >= S_HOURS => self.enter(Phase::G2),
            Phase::G2 if self.age >= G2_HOURS => self.enter(Phase::M),
            Phase::M if self.age >= M_HOURS => {
                self.enter(Phase::G1);
                return true;
            }
            _ => {}
        }
        false
    }

    fn irradiate(&mut self, dose: f64, alpha: f64, beta: f64, rng: &mut StdRng) {
        if dose <= 0.0 || !self.alive {
            return;
        }
        let survival = (-alpha * dose - beta * dose * dose).exp();
        if rng.random::<f64>() > survival {
            self.alive = false;
            return;
        }
        // Normal::new only fails for a negative or non-finite spread
        if let Ok(delay) = Normal::new(REPAIR_HOURS_PER_GY * dose, REPAIR_SPREAD_HOURS) {
            self.repair += delay.sample(rng).max(0.0).round() as u32;
        }
    }
}

/// A biological cell of one of the three populations.
#[derive(Debug, Clone, PartialEq)]
pub enum TissueCell {
    Healthy(CycleState),
    Cancer(CycleState),
    OrganAtRisk(CycleState),
}

impl TissueCell {
    pub fn healthy(phase: Phase) -> Self {
        TissueCell::Healthy(CycleState::new(phase))
    }

    pub fn cancer(phase: Phase) -> Self {
        TissueCell::Cancer(CycleState::new(phase))
    }

    pub fn organ_at_risk(phase: Phase) -> Self {
        TissueCell::OrganAtRisk(CycleState::new(phase))
    }

    pub fn state(&self) -> &CycleState {
        match self {
            TissueCell::Healthy(s) | TissueCell::Cancer(s) | TissueCell::OrganAtRisk(s) => s,
        }
    }

    fn state_mut(&mut self) -> &mut CycleState {
        match self {
            TissueCell::Healthy(s) | TissueCell::Cancer(s) | TissueCell::OrganAtRisk(s) => s,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    fn uptake(&self) -> (f64, f64) {
        match self {
            TissueCell::Cancer(_) => (CANCER_GLUCOSE_UPTAKE, CANCER_OXYGEN_UPTAKE),
            _ => (HEALTHY_GLUCOSE_UPTAKE, HEALTHY_OXYGEN_UPTAKE),
        }
    }

    fn radiosensitivity(&self) -> (f64, f64) {
        match self {
            TissueCell::Cancer(_) => (ALPHA_TUMOR, BETA_TUMOR),
            _ => (ALPHA_NORMAL, BETA_NORMAL),
        }
    }
}

fn favourable(glucose: f64, oxygen: f64, density: i32) -> bool {
    glucose > QUIESCENT_GLUCOSE && oxygen > QUIESCENT_OXYGEN && density < CRITICAL_NEIGHBORS
}

impl CellBehavior for TissueCell {
    fn kind(&self) -> AgentKind {
        match self {
            TissueCell::Healthy(_) => AgentKind::Healthy,
            TissueCell::Cancer(_) => AgentKind::Cancer,
            TissueCell::OrganAtRisk(_) => AgentKind::OrganAtRisk,
        }
    }

    fn is_alive(&self) -> bool {
        self.state().alive
    }

    fn cycle(&mut self, glucose: f64, oxygen: f64, density: i32) -> CycleOutcome {
        if glucose < CRITICAL_GLUCOSE || oxygen < CRITICAL_OXYGEN {
            self.state_mut().alive = false;
            return CycleOutcome::starved();
        }

        let (glu, oxy) = self.uptake();
        let full = CycleOutcome::consumed(glu, oxy);
        let reduced = CycleOutcome::consumed(glu * QUIESCENT_UPTAKE_RATIO, oxy * QUIESCENT_UPTAKE_RATIO);

        match self {
            TissueCell::Healthy(s) => {
                s.tick_clock();
                let phase = s.phase;
                match phase {
                    Phase::Quiescent if favourable(glucose, oxygen, density) => {
                        s.enter(Phase::G1);
                        full
                    }
                    Phase::Quiescent => reduced,
                    Phase::G1 if !favourable(glucose, oxygen, density) => {
                        s.enter(Phase::Quiescent);
                        reduced
                    }
                    _ if s.advance_proliferating() => full.with_request(SpawnRequest::Healthy),
                    _ => full,
                }
            }
            TissueCell::Cancer(s) => {
                s.tick_clock();
                if s.phase == Phase::Quiescent {
                    // Cancer leaves quiescence as soon as it is asked to cycle again
                    s.enter(Phase::G1);
                }
                if s.advance_proliferating() {
                    full.with_request(SpawnRequest::Cancer)
                } else {
                    full
                }
            }
            TissueCell::OrganAtRisk(s) => {
                if s.phase == Phase::Quiescent {
                    return reduced;
                }
                s.tick_clock();
                if s.advance_proliferating() {
                    full.with_request(SpawnRequest::OrganAtRisk)
                } else {
                    full
                }
            }
        }
    }

    fn radiate(&mut self, dose: f64, rng: &mut StdRng) {
        let (alpha, beta) = self.radiosensitivity();
        self.state_mut().irradiate(dose, alpha, beta, rng);
    }

    fn sleep(&mut self) {
        self.state_mut().enter(Phase::Quiescent);
    }

    fn wake(&mut self) {
        let s = self.state_mut();
        if s.phase == Phase::Quiescent {
            s.enter(Phase::G1);
        }
    }

    fn offspring(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Healthy => TissueCell::healthy(Phase::Quiescent),
            AgentKind::Cancer => TissueCell::cancer(Phase::G1),
            AgentKind::OrganAtRisk => TissueCell::organ_at_risk(Phase::G1),
        }
    }
}
