//! Known entity category universe
//!
//! Configuration names are matched case-insensitively against the
//! upper snake-case form (`DROPPED_ITEM`, `EXPERIENCE_ORB`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityCategory {
    // Transient drops and projectiles
    DroppedItem,
    ExperienceOrb,
    Arrow,
    Snowball,
    Egg,
    FallingBlock,
    PrimedTnt,
    // Hostile mobs
    Zombie,
    Skeleton,
    Creeper,
    Spider,
    Slime,
    // Passive mobs
    Cow,
    Pig,
    Sheep,
    Chicken,
    Bat,
    Villager,
    // Placed or persistent objects
    ArmorStand,
    ItemFrame,
    Boat,
    Minecart,
    Player,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 23] = [
        EntityCategory::DroppedItem,
        EntityCategory::ExperienceOrb,
        EntityCategory::Arrow,
        EntityCategory::Snowball,
        EntityCategory::Egg,
        EntityCategory::FallingBlock,
        EntityCategory::PrimedTnt,
        EntityCategory::Zombie,
        EntityCategory::Skeleton,
        EntityCategory::Creeper,
        EntityCategory::Spider,
        EntityCategory::Slime,
        EntityCategory::Cow,
        EntityCategory::Pig,
        EntityCategory::Sheep,
        EntityCategory::Chicken,
        EntityCategory::Bat,
        EntityCategory::Villager,
        EntityCategory::ArmorStand,
        EntityCategory::ItemFrame,
        EntityCategory::Boat,
        EntityCategory::Minecart,
        EntityCategory::Player,
    ];

    /// Configuration name of this category
    pub fn name(&self) -> &'static str {
        match self {
            EntityCategory::DroppedItem => "DROPPED_ITEM",
            EntityCategory::ExperienceOrb => "EXPERIENCE_ORB",
            EntityCategory::Arrow => "ARROW",
            EntityCategory::Snowball => "SNOWBALL",
            EntityCategory::Egg => "EGG",
            EntityCategory::FallingBlock => "FALLING_BLOCK",
            EntityCategory::PrimedTnt => "PRIMED_TNT",
            EntityCategory::Zombie => "ZOMBIE",
            EntityCategory::Skeleton => "SKELETON",
            EntityCategory::Creeper => "CREEPER",
            EntityCategory::Spider => "SPIDER",
            EntityCategory::Slime => "SLIME",
            EntityCategory::Cow => "COW",
            EntityCategory::Pig => "PIG",
            EntityCategory::Sheep => "SHEEP",
            EntityCategory::Chicken => "CHICKEN",
            EntityCategory::Bat => "BAT",
            EntityCategory::Villager => "VILLAGER",
            EntityCategory::ArmorStand => "ARMOR_STAND",
            EntityCategory::ItemFrame => "ITEM_FRAME",
            EntityCategory::Boat => "BOAT",
            EntityCategory::Minecart => "MINECART",
            EntityCategory::Player => "PLAYER",
        }
    }

    /// Categories that are cheap to regenerate and safe to clear by default
    pub fn transient() -> &'static [EntityCategory] {
        &[
            EntityCategory::DroppedItem,
            EntityCategory::ExperienceOrb,
            EntityCategory::Arrow,
            EntityCategory::Snowball,
            EntityCategory::Egg,
            EntityCategory::FallingBlock,
        ]
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name that does not belong to the category universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for EntityCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        EntityCategory::ALL
            .iter()
            .copied()
            .find(|category| category.name() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("dropped_item".parse(), Ok(EntityCategory::DroppedItem));
        assert_eq!("Experience-Orb".parse(), Ok(EntityCategory::ExperienceOrb));
        assert_eq!(" ZOMBIE ".parse(), Ok(EntityCategory::Zombie));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "DRAGON_EGG_THING".parse::<EntityCategory>().unwrap_err();
        assert_eq!(err, UnknownCategory("DRAGON_EGG_THING".into()));
    }

    #[test]
    fn test_every_name_round_trips() {
        for category in EntityCategory::ALL {
            assert_eq!(category.name().parse::<EntityCategory>(), Ok(category));
        }
    }
}
