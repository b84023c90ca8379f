use std::collections::{BTreeMap, BTreeSet};

use crate::items;
use crate::monsters::Monster;
use crate::players::PlayerRegistry;

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Direction -> target room id. The target may not exist (a blocked passage).
    pub exits: BTreeMap<String, String>,
    pub items: Vec<String>,
    pub monsters: Vec<Monster>,
    /// Names only; a name may no longer be online.
    pub occupants: BTreeSet<String>,
    /// Template key the game loop respawns here when the room is empty of monsters.
    pub spawn: Option<String>,
}

impl Room {
    pub fn join(&mut self, name: &str) -> bool {
        self.occupants.insert(name.to_string())
    }

    pub fn leave(&mut self, name: &str) -> bool {
        self.occupants.remove(name)
    }

    /// Send `msg` to every occupant except `exclude`. Returns how many were reached.
    pub fn broadcast(&self, players: &PlayerRegistry, msg: &str, exclude: Option<&str>) -> usize {
        players.send_to(
            self.occupants
                .iter()
                .map(String::as_str)
                .filter(|n| Some(*n) != exclude),
            msg,
        )
    }

    pub fn exit(&self, dir: &str) -> Option<&str> {
        self.exits.get(dir).map(String::as_str)
    }

    /// First living monster whose name contains `token`.
    pub fn find_monster(&self, token: &str) -> Option<usize> {
        self.monsters
            .iter()
            .position(|m| m.is_alive() && m.matches(token))
    }

    pub fn has_living_monsters(&self) -> bool {
        self.monsters.iter().any(Monster::is_alive)
    }

    /// Remove and return the first ground item whose name contains `token`.
    pub fn take_item(&mut self, token: &str) -> Option<String> {
        let i = items::find_containing(&self.items, token)?;
        Some(self.items.remove(i))
    }

    pub fn render_for(&self, viewer: &str) -> String {
        let mut s = String::new();
        s.push_str(&format!("=== {} ===\n", self.name));
        s.push_str(&self.description);
        s.push('\n');

        if !self.items.is_empty() {
            s.push_str("\nItems here:\n");
            for item in &self.items {
                s.push_str(&format!("  - {item}\n"));
            }
        }

        if self.has_living_monsters() {
            s.push_str("\nCreatures here:\n");
            for m in self.monsters.iter().filter(|m| m.is_alive()) {
                s.push_str(&format!(
                    "  - {} ({}/{})\n",
                    m.name, m.health, m.max_health
                ));
            }
        }

        let others = self
            .occupants
            .iter()
            .filter(|n| n.as_str() != viewer)
            .collect::<Vec<_>>();
        if !others.is_empty() {
            s.push_str("\nOther players here:\n");
            for n in others {
                s.push_str(&format!("  - {n}\n"));
            }
        }

        if !self.exits.is_empty() {
            s.push_str("\nExits:\n");
            for (dir, to) in &self.exits {
                s.push_str(&format!("  {dir} - {to}\n"));
            }
        }
        s
    }
}
