//! Per-voxel agent storage and the nutrient source list.

use crate::agent::{AgentKind, AgentRecord, CellBehavior};
use crate::grid::Voxel;
use std::collections::VecDeque;
use std::ops::{AddAssign, SubAssign};

/// Agent counts broken down by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationCounts {
    pub healthy: usize,
    pub cancer: usize,
    pub oar: usize,
}

impl PopulationCounts {
    pub fn total(&self) -> usize {
        self.healthy + self.cancer + self.oar
    }

    pub fn record(&mut self, kind: AgentKind) {
        match kind {
            AgentKind::Healthy => self.healthy += 1,
            AgentKind::Cancer => self.cancer += 1,
            AgentKind::OrganAtRisk => self.oar += 1,
        }
    }
}

impl AddAssign for PopulationCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.healthy += rhs.healthy;
        self.cancer += rhs.cancer;
        self.oar += rhs.oar;
    }
}

impl SubAssign for PopulationCounts {
    fn sub_assign(&mut self, rhs: Self) {
        self.healthy -= rhs.healthy;
        self.cancer -= rhs.cancer;
        self.oar -= rhs.oar;
    }
}

/// The agents hosted by one voxel. Cancer agents always come before every other
/// agent in traversal order, so the first entry tells whether the voxel holds cancer.
#[derive(Debug, Clone)]
pub struct AgentContainer<C> {
    agents: VecDeque<AgentRecord<C>>,
    oar_count: usize,
    cancer_count: usize,
}

impl<C> Default for AgentContainer<C> {
    fn default() -> Self {
        Self { agents: VecDeque::new(), oar_count: 0, cancer_count: 0 }
    }
}

impl<C: CellBehavior> AgentContainer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts at the head for cancer, at the tail otherwise.
    pub fn add(&mut self, record: AgentRecord<C>) {
        match record.kind {
            AgentKind::Cancer => {
                self.cancer_count += 1;
                self.agents.push_front(record);
            }
            AgentKind::OrganAtRisk => {
                self.oar_count += 1;
                self.agents.push_back(record);
            }
            AgentKind::Healthy => self.agents.push_back(record),
        }
    }

    /// Files a cell hosted at `voxel`.
    pub fn add_cell(&mut self, voxel: Voxel, cell: C) {
        self.add(AgentRecord::new(voxel, cell));
    }

    /// Drops every agent whose cell is no longer alive, keeping survivors in their
    /// relative order, and returns what was removed.
    pub fn remove_dead_and_compact(&mut self) -> PopulationCounts {
        let mut removed = PopulationCounts::default();
        self.agents.retain(|record| {
            let alive = record.cell.is_alive();
            if !alive {
                removed.record(record.kind);
            }
            alive
        });
        self.cancer_count -= removed.cancer;
        self.oar_count -= removed.oar;

        assert!(
            !self.agents.is_empty() || (self.cancer_count == 0 && self.oar_count == 0),
            "empty container still reports agents"
        );
        debug_assert!(self.is_consistent(), "agent container counts out of sync");
        removed
    }

    /// Signed occupancy: 0 when empty, minus the cancer count when any cancer is
    /// present, otherwise the number of agents.
    pub fn weighted_density(&self) -> i32 {
        if self.agents.is_empty() {
            0
        } else if self.cancer_count > 0 {
            -(self.cancer_count as i32)
        } else {
            self.agents.len() as i32
        }
    }

    /// Takes every organ-at-risk agent here out of quiescence.
    pub fn wake_organ_at_risk(&mut self) {
        if self.oar_count == 0 {
            return;
        }
        self.agents
            .iter_mut()
            .filter(|record| record.kind == AgentKind::OrganAtRisk)
            .for_each(|record| record.cell.wake());
    }

    /// Recounts kinds and checks the cancer-first ordering.
    pub fn is_consistent(&self) -> bool {
        let mut counts = PopulationCounts::default();
        for record in &self.agents {
            counts.record(record.kind);
        }
        let leading_cancer = self.agents.iter().take_while(|r| r.kind == AgentKind::Cancer).count();
        counts.cancer == self.cancer_count
            && counts.oar == self.oar_count
            && counts.total() == self.agents.len()
            && leading_cancer == self.cancer_count
    }
}

impl<C> AgentContainer<C> {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn cancer_count(&self) -> usize {
        self.cancer_count
    }

    pub fn oar_count(&self) -> usize {
        self.oar_count
    }

    pub fn healthy_count(&self) -> usize {
        self.agents.len() - self.cancer_count - self.oar_count
    }

    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts { healthy: self.healthy_count(), cancer: self.cancer_count, oar: self.oar_count }
    }

    /// Kind of the first agent in traversal order.
    pub fn first_kind(&self) -> Option<AgentKind> {
        self.agents.front().map(|record| record.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentRecord<C>> {
        self.agents.iter()
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut AgentRecord<C>> {
        self.agents.get_mut(position)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut AgentRecord<C>> {
        self.agents.iter_mut()
    }
}

/// Nutrient sources. Sources are never removed; migration rewrites them in place.
#[derive(Debug, Clone, Default)]
pub struct SourceContainer {
    sources: Vec<Voxel>,
}

impl SourceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: usize, y: usize, z: usize) {
        self.sources.push(Voxel::new(x, y, z));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Voxel> {
        self.sources.get(i).copied()
    }

    pub(crate) fn set(&mut self, i: usize, v: Voxel) {
        self.sources[i] = v;
    }

    pub fn iter(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.sources.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::CycleOutcome;
    use rand::rngs::StdRng;

    #[derive(Debug, Clone)]
    struct Dummy {
        kind: AgentKind,
        alive: bool,
        awake: bool,
    }

    impl Dummy {
        fn of(kind: AgentKind) -> Self {
            Self { kind, alive: true, awake: false }
        }
    }

    impl CellBehavior for Dummy {
        fn kind(&self) -> AgentKind { self.kind }
        fn is_alive(&self) -> bool { self.alive }
        fn cycle(&mut self, _: f64, _: f64, _: i32) -> CycleOutcome { CycleOutcome::default() }
        fn radiate(&mut self, _: f64, _: &mut StdRng) {}
        fn sleep(&mut self) { self.awake = false; }
        fn wake(&mut self) { self.awake = true; }
        fn offspring(kind: AgentKind) -> Self { Self::of(kind) }
    }

    fn filled(kinds: &[AgentKind]) -> AgentContainer<Dummy> {
        let mut c = AgentContainer::new();
        for &k in kinds {
            c.add_cell(Voxel::default(), Dummy::of(k));
        }
        c
    }

    fn kinds(c: &AgentContainer<Dummy>) -> Vec<AgentKind> {
        c.iter().map(|r| r.kind).collect()
    }

    use AgentKind::{Cancer, Healthy, OrganAtRisk};

    #[test]
    fn cancer_goes_first() {
        let c = filled(&[Healthy, OrganAtRisk, Cancer, Healthy, Cancer]);
        assert_eq!(kinds(&c), vec![Cancer, Cancer, Healthy, OrganAtRisk, Healthy]);
        assert_eq!(c.len(), 5);
        assert_eq!(c.cancer_count(), 2);
        assert_eq!(c.oar_count(), 1);
        assert_eq!(c.healthy_count(), 2);
        assert_eq!(c.first_kind(), Some(Cancer));
        assert!(c.is_consistent());
    }

    #[test]
    fn compaction_keeps_order_and_counts() {
        let mut c = filled(&[Healthy, OrganAtRisk, Cancer, Healthy, Cancer]);
        // kill the first cancer and the OAR cell
        for (i, r) in c.iter_mut().enumerate() {
            if i == 0 || r.kind == OrganAtRisk {
                r.cell.alive = false;
            }
        }
        let removed = c.remove_dead_and_compact();
        assert_eq!(removed, PopulationCounts { healthy: 0, cancer: 1, oar: 1 });
        assert_eq!(kinds(&c), vec![Cancer, Healthy, Healthy]);
        assert_eq!(c.cancer_count(), 1);
        assert_eq!(c.oar_count(), 0);
        assert!(c.is_consistent());
    }

    #[test]
    fn compaction_to_empty() {
        let mut c = filled(&[Cancer, Healthy]);
        c.iter_mut().for_each(|r| r.cell.alive = false);
        let removed = c.remove_dead_and_compact();
        assert_eq!(removed.total(), 2);
        assert!(c.is_empty());
        assert_eq!(c.first_kind(), None);
        assert_eq!(c.weighted_density(), 0);
    }

    #[test]
    fn weighted_density_signs() {
        assert_eq!(filled(&[]).weighted_density(), 0);
        assert_eq!(filled(&[Healthy, OrganAtRisk, Healthy]).weighted_density(), 3);
        assert_eq!(filled(&[Healthy, Cancer, Cancer, OrganAtRisk]).weighted_density(), -2);
    }

    #[test]
    fn wake_touches_only_organ_cells() {
        let mut c = filled(&[Healthy, OrganAtRisk, Cancer]);
        c.wake_organ_at_risk();
        for r in c.iter() {
            assert_eq!(r.cell.awake, r.kind == OrganAtRisk);
        }
    }

    #[test]
    fn clone_is_deep() {
        let mut original = filled(&[Healthy]);
        let copy = original.clone();
        original.iter_mut().for_each(|r| r.cell.alive = false);
        original.remove_dead_and_compact();
        assert!(original.is_empty());
        assert_eq!(copy.len(), 1);
    }

    #[test]
    fn sources_append_in_order() {
        let mut s = SourceContainer::new();
        assert!(s.is_empty());
        s.add(1, 2, 3);
        s.add(0, 0, 0);
        assert_eq!(s.len(), 2);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![Voxel::new(1, 2, 3), Voxel::new(0, 0, 0)]);
        s.set(0, Voxel::new(2, 2, 2));
        assert_eq!(s.get(0), Some(Voxel::new(2, 2, 2)));
    }
}
