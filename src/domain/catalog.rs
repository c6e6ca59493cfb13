use std::{collections::HashSet, fmt, ops::RangeInclusive};

use serde::Deserialize;

use super::{draw, Error, RandomSource};

/// Maximum distance between the summed draw probabilities and 1.0
pub const PROBABILITY_TOLERANCE: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum RarityTier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl RarityTier {
    /// Range of point values a reward of this tier may carry
    pub fn point_range(&self) -> RangeInclusive<i64> {
        match self {
            RarityTier::Common => 1..=50,
            RarityTier::Rare => 10..=200,
            RarityTier::Epic => 100..=1000,
            RarityTier::Legendary => 500..=5000,
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RarityTier::Common => "Common",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Legendary => "Legendary",
        };
        f.write_str(name)
    }
}

/// A reward that can come out of a draw
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RewardDefinition {
    pub id: u32,
    pub name: String,
    pub rarity_tier: RarityTier,
    /// Points credited to the user when this reward is drawn
    pub point_value: i64,
    pub draw_probability: f64,
}

impl RewardDefinition {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        rarity_tier: RarityTier,
        point_value: i64,
        draw_probability: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rarity_tier,
            point_value,
            draw_probability,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: String| Error::InvalidReward {
            id: self.id,
            reason: reason.into(),
        };

        if self.id == 0 {
            return Err(invalid("id must be positive".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty".to_string()));
        }

        let range = self.rarity_tier.point_range();
        if !range.contains(&self.point_value) {
            return Err(invalid(format!(
                "{} points outside of the {} range {}..={}",
                self.point_value,
                self.rarity_tier,
                range.start(),
                range.end()
            )));
        }

        // Also rejects NaN
        if !(0.0..=1.0).contains(&self.draw_probability) {
            return Err(invalid(format!(
                "probability {} must be between 0 and 1",
                self.draw_probability
            )));
        }

        Ok(())
    }
}

/// Stock rewards used when the configuration does not provide any
pub fn default_rewards() -> Vec<RewardDefinition> {
    vec![
        RewardDefinition::new(1, "Bronze Coin", RarityTier::Common, 10, 0.60),
        RewardDefinition::new(2, "Silver Coin", RarityTier::Rare, 50, 0.30),
        RewardDefinition::new(3, "Gold Coin", RarityTier::Epic, 200, 0.08),
        RewardDefinition::new(4, "Diamond", RarityTier::Legendary, 1000, 0.02),
    ]
}

/// Validated, read-only set of rewards
///
/// The order of the items is the order in which the draw walks them, so it must stay stable for
/// the lifetime of the catalog.
#[derive(Clone, Debug)]
pub struct Catalog {
    items: Vec<RewardDefinition>,
}

impl Catalog {
    /// Validate the definitions and build a catalog out of them
    pub fn load(items: Vec<RewardDefinition>) -> Result<Self, Error> {
        let mut ids = HashSet::with_capacity(items.len());
        for item in &items {
            item.validate()?;
            if !ids.insert(item.id) {
                return Err(Error::InvalidCatalog(
                    format!("duplicate reward id {}", item.id).into(),
                ));
            }
        }

        let total: f64 = items.iter().map(|item| item.draw_probability).sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(Error::InvalidCatalog(
                format!("probabilities sum to {total}, expected 1.0").into(),
            ));
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[RewardDefinition] {
        &self.items
    }

    pub fn get(&self, id: u32) -> Option<&RewardDefinition> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items_by_tier(&self, tier: RarityTier) -> Vec<&RewardDefinition> {
        self.items
            .iter()
            .filter(|item| item.rarity_tier == tier)
            .collect()
    }

    /// Pick one reward according to the catalog's probabilities
    pub fn draw<R>(&self, random: &R) -> Result<&RewardDefinition, Error>
    where
        R: RandomSource + ?Sized,
    {
        draw::draw(&self.items, random)
    }
}
