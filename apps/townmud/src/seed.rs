//! World seed data.
//!
//! The world is described in YAML: an item catalog, monster templates and a room graph.
//! The default town is compiled in, so deploys stay binary-only; `--world PATH` swaps it.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::items::{Category, EquipSlot, ItemDef};
use crate::monsters::MonsterTemplate;
use crate::rooms::Room;

const EMBEDDED_WORLD: &str = include_str!("../world/town.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct WorldSeed {
    pub start_room: String,
    /// Where defeated players wake up. Defaults to the start room.
    #[serde(default)]
    pub respawn_room: Option<String>,
    #[serde(default)]
    pub items: BTreeMap<String, ItemSeed>,
    #[serde(default)]
    pub monsters: BTreeMap<String, MonsterTemplate>,
    pub rooms: Vec<RoomSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub stats: BTreeMap<String, i32>,
    #[serde(default)]
    pub slot: Option<EquipSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub exits: BTreeMap<String, String>,
    #[serde(default)]
    pub items: Vec<String>,
    /// Template keys placed at startup.
    #[serde(default)]
    pub monsters: Vec<String>,
    #[serde(default)]
    pub spawn: Option<String>,
}

impl WorldSeed {
    pub fn embedded() -> anyhow::Result<Self> {
        Self::parse(EMBEDDED_WORLD).context("parse embedded world")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read world file {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("parse world file {}", path.display()))
    }

    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        let seed: WorldSeed = serde_yaml::from_str(yaml)?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn respawn_room(&self) -> &str {
        self.respawn_room.as_deref().unwrap_or(&self.start_room)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        for r in &self.rooms {
            if r.id.trim().is_empty() {
                anyhow::bail!("room with empty id");
            }
            if !ids.insert(r.id.as_str()) {
                anyhow::bail!("duplicate room id {}", r.id);
            }
        }
        if !ids.contains(self.start_room.as_str()) {
            anyhow::bail!("start_room {} is not a room", self.start_room);
        }
        if !ids.contains(self.respawn_room()) {
            anyhow::bail!("respawn_room {} is not a room", self.respawn_room());
        }

        for (key, t) in &self.monsters {
            t.validate(key)?;
        }
        for r in &self.rooms {
            for key in r.monsters.iter().chain(r.spawn.iter()) {
                if !self.monsters.contains_key(key) {
                    anyhow::bail!("room {} references unknown monster template {key}", r.id);
                }
            }
        }
        // Exits may point at rooms that do not exist; those read as blocked passages.
        Ok(())
    }

    pub fn item_defs(&self) -> Vec<ItemDef> {
        self.items
            .iter()
            .map(|(key, i)| ItemDef {
                key: key.clone(),
                name: i.name.clone(),
                description: i.description.trim().to_string(),
                category: i.category,
                value: i.value,
                stats: i.stats.clone(),
                slot: i.slot,
            })
            .collect()
    }

    pub fn build_rooms(&self) -> Vec<Room> {
        self.rooms
            .iter()
            .map(|r| Room {
                id: r.id.clone(),
                name: r.name.clone(),
                description: r.desc.trim().to_string(),
                exits: r
                    .exits
                    .iter()
                    .map(|(dir, to)| (dir.trim().to_lowercase(), to.trim().to_string()))
                    .collect(),
                items: r.items.clone(),
                monsters: r
                    .monsters
                    .iter()
                    .filter_map(|key| self.monsters.get(key))
                    .map(MonsterTemplate::spawn)
                    .collect(),
                occupants: BTreeSet::new(),
                spawn: r.spawn.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"
start_room: square
monsters:
  rat: { name: Rat, health: 8, attack_power: 6, experience: 3, gold: 1, loot: [rat_tail] }
rooms:
  - id: square
    name: Square
    desc: A small square.
    exits: { North: alley, west: nowhere }
    monsters: [rat]
    spawn: rat
  - id: alley
    name: Alley
"#;

    #[test]
    fn embedded_world_is_valid() {
        let seed = WorldSeed::embedded().unwrap();
        assert_eq!(seed.start_room, "town_square");
        assert_eq!(seed.respawn_room(), "town_square");
        let rooms = seed.build_rooms();
        let forest = rooms.iter().find(|r| r.id == "forest").unwrap();
        assert_eq!(forest.spawn.as_deref(), Some("wolf"));
        assert_eq!(forest.monsters.len(), 1);
        assert_eq!(forest.monsters[0].name, "Wolf");
        assert!(seed.item_defs().iter().any(|d| d.key == "potion"));
    }

    #[test]
    fn exits_are_lowercased_and_may_dangle() {
        let seed = WorldSeed::parse(TINY).unwrap();
        assert_eq!(seed.respawn_room(), "square");
        let rooms = seed.build_rooms();
        assert_eq!(rooms[0].exit("north"), Some("alley"));
        assert_eq!(rooms[0].exit("west"), Some("nowhere"));
        assert_eq!(rooms[0].monsters[0].loot, vec!["rat_tail".to_string()]);
    }

    #[test]
    fn rejects_weak_monsters() {
        let bad = TINY.replace("attack_power: 6", "attack_power: 3");
        let err = format!("{:#}", WorldSeed::parse(&bad).unwrap_err());
        assert!(err.contains("attack_power"), "{err}");
    }

    #[test]
    fn rejects_missing_start_room_and_unknown_templates() {
        let bad = TINY.replace("start_room: square", "start_room: castle");
        assert!(WorldSeed::parse(&bad).is_err());

        let bad = TINY.replace("spawn: rat", "spawn: dragon");
        let err = format!("{:#}", WorldSeed::parse(&bad).unwrap_err());
        assert!(err.contains("dragon"), "{err}");
    }

    #[test]
    fn rejects_duplicate_room_ids() {
        let bad = TINY.replace("id: alley", "id: square");
        assert!(WorldSeed::parse(&bad).is_err());
    }
}
