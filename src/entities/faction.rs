//! Per-player faction state: economy, power, research.

use std::collections::BTreeSet;

use super::{EntityId, PlayerId, TeamId};
use crate::catalog::{Catalog, ResearchModifier, ResearchType};

/// One in-flight research project, hosted at a research lab.
#[derive(Debug, Clone)]
pub struct ResearchSlot {
    pub research: ResearchType,
    pub building: EntityId,
    pub progress: f32,
}

/// A player's faction: credits, power balance, upkeep and research. Created
/// on join; persists for the whole game (even through defeat).
#[derive(Debug, Clone)]
pub struct PlayerFaction {
    pub player: PlayerId,
    pub team: TeamId,
    pub name: String,
    pub faction_tag: String,
    pub credits: f32,
    pub active_research: Vec<ResearchSlot>,
    pub completed_research: BTreeSet<ResearchType>,
    pub power_generated: f32,
    pub power_consumed: f32,
    pub has_low_power: bool,
    pub current_upkeep: f32,
    pub max_upkeep: f32,
    pub tech_tier: u8,
    pub connected: bool,
    pub defeated: bool,
}

impl PlayerFaction {
    pub fn join(
        player: PlayerId,
        team: TeamId,
        name: String,
        faction_tag: String,
        catalog: &Catalog,
    ) -> Self {
        let def = catalog.faction(&faction_tag);
        Self {
            player,
            team,
            name,
            faction_tag,
            credits: def.starting_credits,
            active_research: Vec::new(),
            completed_research: BTreeSet::new(),
            power_generated: 0.0,
            power_consumed: 0.0,
            has_low_power: false,
            current_upkeep: 0.0,
            max_upkeep: def.base_upkeep_cap,
            tech_tier: 0,
            connected: true,
            defeated: false,
        }
    }

    /// Cumulative research modifier for units spawned now.
    pub fn unit_modifier(&self, catalog: &Catalog) -> ResearchModifier {
        self.completed_research
            .iter()
            .fold(ResearchModifier::IDENTITY, |acc, r| {
                acc.combine(&catalog.research(*r).modifier)
            })
    }

    /// Simultaneous research slots currently allowed.
    pub fn research_cap(&self, catalog: &Catalog) -> usize {
        1 + self
            .completed_research
            .iter()
            .map(|r| catalog.research(*r).parallel_bonus as usize)
            .sum::<usize>()
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.credits >= cost
    }

    /// Deduct credits; caller must have validated affordability.
    pub fn spend(&mut self, cost: f32) {
        self.credits = (self.credits - cost).max(0.0);
    }

    pub fn deposit(&mut self, amount: f32) {
        self.credits += amount;
    }
}
