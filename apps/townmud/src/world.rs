use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use parking_lot::Mutex;
use tracing::info;

use crate::dice::{Rng64, SharedDice};
use crate::items::Catalog;
use crate::monsters::MonsterTemplate;
use crate::players::{Outbox, Player, PlayerHandle, PlayerRegistry};
use crate::rooms::Room;
use crate::seed::WorldSeed;

#[derive(Debug, Clone, Copy)]
pub struct WorldOptions {
    pub rng_seed: u64,
    /// Per-tick chance (percent) that an empty spawn site gets its monster back.
    pub respawn_pct: u32,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            rng_seed: 1,
            respawn_pct: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    EmptyName,
    NameTaken(String),
}

impl RegisterError {
    /// Line sent to the rejected client before the connection is closed.
    pub fn reply(&self) -> &'static str {
        match self {
            RegisterError::EmptyName => "Invalid name. Disconnecting.",
            RegisterError::NameTaken(_) => "That name is already taken. Disconnecting.",
        }
    }
}

impl std::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterError::EmptyName => write!(f, "empty player name"),
            RegisterError::NameTaken(n) => write!(f, "name already online: {n}"),
        }
    }
}

impl std::error::Error for RegisterError {}

/// The shared world: rooms, catalogs and who is online.
///
/// Lock order: a player, then one room at a time, then the registry's short read lock.
/// The RNG lock is only ever held for a single roll.
pub struct World {
    rooms: BTreeMap<String, Mutex<Room>>,
    catalog: Catalog,
    templates: HashMap<String, MonsterTemplate>,
    pub players: PlayerRegistry,
    start_room: String,
    respawn_room: String,
    respawn_pct: u32,
    rng: Mutex<Rng64>,
}

impl World {
    pub fn new(seed: WorldSeed, opts: WorldOptions) -> Self {
        let rooms = seed
            .build_rooms()
            .into_iter()
            .map(|r| (r.id.clone(), Mutex::new(r)))
            .collect();
        Self {
            rooms,
            catalog: Catalog::new(seed.item_defs()),
            templates: seed.monsters.clone().into_iter().collect(),
            players: PlayerRegistry::new(),
            start_room: seed.start_room.clone(),
            respawn_room: seed.respawn_room().to_string(),
            respawn_pct: opts.respawn_pct.min(100),
            rng: Mutex::new(Rng64::from_seed(opts.rng_seed)),
        }
    }

    pub fn room(&self, id: &str) -> Option<&Mutex<Room>> {
        self.rooms.get(id)
    }

    pub fn has_room(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Mutex<Room>> {
        self.rooms.values()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn template(&self, key: &str) -> Option<&MonsterTemplate> {
        self.templates.get(key)
    }

    pub fn start_room(&self) -> &str {
        &self.start_room
    }

    pub fn respawn_room(&self) -> &str {
        &self.respawn_room
    }

    pub fn respawn_pct(&self) -> u32 {
        self.respawn_pct
    }

    pub fn dice(&self) -> SharedDice<'_> {
        SharedDice(&self.rng)
    }

    /// Bring a new player online in the start room and announce them there.
    pub fn register(&self, name: &str, outbox: Outbox) -> Result<PlayerHandle, RegisterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }

        let _membership = self.players.membership();
        let player = Player::new(name, self.start_room.clone(), outbox);
        let handle = self
            .players
            .insert(player)
            .map_err(|p| RegisterError::NameTaken(p.name))?;

        if let Some(room) = self.room(&self.start_room) {
            let mut room = room.lock();
            room.join(name);
            room.broadcast(
                &self.players,
                &format!("{name} has entered the world!"),
                Some(name),
            );
        }
        info!(player = %name, online = self.players.len(), "player entered the world");
        Ok(handle)
    }

    /// Take a player offline. Returns false if they were already gone, so repeated calls
    /// announce the departure only once.
    pub fn disconnect(&self, name: &str) -> bool {
        let _membership = self.players.membership();
        let Some(handle) = self.players.remove(name) else {
            return false;
        };
        let room_id = handle.lock().room_id.clone();
        if let Some(room) = self.room(&room_id) {
            let mut room = room.lock();
            room.leave(name);
            room.broadcast(&self.players, &format!("{name} has left the world."), None);
        }
        info!(player = %name, online = self.players.len(), "player left the world");
        true
    }

    /// Move `player` into room `to`: leave the current room (announcing `departure` there, if
    /// any), then join `to` and announce `arrival` to everyone else in it.
    pub fn transfer(
        &self,
        player: &mut Player,
        to: &str,
        departure: Option<&str>,
        arrival: &str,
    ) -> anyhow::Result<()> {
        let dest = self
            .room(to)
            .with_context(|| format!("room {to} does not exist"))?;

        if let Some(src) = self.room(&player.room_id) {
            let mut src = src.lock();
            src.leave(&player.name);
            if let Some(msg) = departure {
                src.broadcast(&self.players, msg, None);
            }
        }

        player.room_id = to.to_string();
        let mut dest = dest.lock();
        dest.join(&player.name);
        dest.broadcast(&self.players, arrival, Some(player.name.as_str()));
        Ok(())
    }

    pub fn render_room_for(&self, player: &Player) -> anyhow::Result<String> {
        let room = self
            .room(&player.room_id)
            .with_context(|| format!("room {} does not exist", player.room_id))?;
        Ok(room.lock().render_for(&player.name))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use bytes::Bytes;
    use tokio::sync::mpsc::Receiver;

    use super::*;

    pub(crate) fn town() -> World {
        World::new(WorldSeed::embedded().unwrap(), WorldOptions::default())
    }

    pub(crate) fn join(world: &World, name: &str) -> (PlayerHandle, Receiver<Bytes>) {
        let (outbox, rx) = Outbox::channel();
        let h = world.register(name, outbox).unwrap();
        (h, rx)
    }

    /// Everything queued for a client so far, split into lines.
    pub(crate) fn drain(rx: &mut Receiver<Bytes>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(b) = rx.try_recv() {
            for l in String::from_utf8_lossy(&b).lines() {
                out.push(l.to_string());
            }
        }
        out
    }
}
