//! Data structures for match content.
//!
//! This module contains pure data structures that define team rosters,
//! fighter stats and the weapon/item/skill catalog. All structs are designed
//! to be deserialized from RON files and validated before a match starts.
//!
//! **Note:** This module contains no file IO - it only defines data types
//! and parses RON strings. File loading is handled by `royale_headless`.

mod catalog;
mod roster_data;

pub use catalog::{Catalog, ItemData, ItemKind, SkillData, SkillEffect, SkillSlot, WeaponData};
pub use roster_data::{
    FighterData, FighterId, PowerRange, Role, Roster, StatBlock, TeamData, DEFAULT_BASE_POWER,
    MAX_ARMOR, TEAM_SIZE,
};
