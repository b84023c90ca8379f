use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use crate::items::{EquipSlot, Equipment};

pub const START_HEALTH: i32 = 100;
pub const START_MANA: i32 = 50;
pub const START_GOLD: u32 = 100;

/// Messages a connection may have queued before it counts as stalled.
pub const OUTBOX_CAPACITY: usize = 128;

/// Write side of one connection. Messages are queued to the connection's writer task.
///
/// The queue is bounded. A send that finds it full marks the connection as stalled, and the
/// session then ends it like any other transport failure.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Bytes>,
    stalled: Arc<watch::Sender<bool>>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::Receiver<Bytes>) {
        Self::with_capacity(OUTBOX_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(cap.max(1));
        let (stalled, _) = watch::channel(false);
        (
            Self {
                tx,
                stalled: Arc::new(stalled),
            },
            rx,
        )
    }

    /// Queue one message. Returns false once the connection's writer is gone or stalled.
    pub fn send(&self, msg: &str) -> bool {
        self.send_raw(mudline::encode_line(msg))
    }

    pub fn send_raw(&self, b: Bytes) -> bool {
        match self.tx.try_send(b) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.stalled.send_replace(true);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Flips to true once a send found the queue full.
    pub fn stalled(&self) -> watch::Receiver<bool> {
        self.stalled.subscribe()
    }
}

#[derive(Debug)]
pub struct Player {
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub level: u32,
    pub experience: u32,
    pub gold: u32,
    pub room_id: String,
    pub inventory: Vec<String>,
    pub equipment: Equipment,
    outbox: Outbox,
}

impl Player {
    pub fn new(name: impl Into<String>, room_id: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            name: name.into(),
            health: START_HEALTH,
            max_health: START_HEALTH,
            mana: START_MANA,
            max_mana: START_MANA,
            level: 1,
            experience: 0,
            gold: START_GOLD,
            room_id: room_id.into(),
            inventory: Vec::new(),
            equipment: Equipment::new(),
            outbox,
        }
    }

    pub fn send(&self, msg: &str) {
        let _ = self.outbox.send(msg);
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn take_damage(&mut self, dmg: i32) {
        self.health = (self.health - dmg.max(0)).max(0);
    }

    /// Returns how much health was actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health);
        self.health - before
    }

    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        let before = self.mana;
        self.mana = (self.mana + amount.max(0)).min(self.max_mana);
        self.mana - before
    }

    pub fn experience_for_next_level(&self) -> u32 {
        self.level.saturating_mul(100)
    }

    /// Add experience and run one level check. Returns the new level on promotion.
    pub fn gain_experience(&mut self, xp: u32) -> Option<u32> {
        self.experience = self.experience.saturating_add(xp);
        if self.experience < self.experience_for_next_level() {
            return None;
        }
        self.level += 1;
        self.max_health += 10;
        self.max_mana += 5;
        self.health = self.max_health;
        self.mana = self.max_mana;
        self.send(&format!(
            "Congratulations! You've reached level {}!",
            self.level
        ));
        Some(self.level)
    }

    pub fn render_inventory(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Inventory ===\n");
        s.push_str(&format!("Gold: {}\n", self.gold));
        s.push_str(&format!("Health: {}/{}\n", self.health, self.max_health));
        s.push_str(&format!("Mana: {}/{}\n", self.mana, self.max_mana));
        s.push_str(&format!(
            "Level: {} (XP: {})\n",
            self.level, self.experience
        ));

        if self.inventory.is_empty() {
            s.push_str("\nYour inventory is empty.\n");
        } else {
            s.push_str("\nItems:\n");
            for item in &self.inventory {
                s.push_str(&format!("  - {item}\n"));
            }
        }

        s.push_str("\nEquipment:");
        for slot in EquipSlot::all() {
            let equipped = self.equipment.get(*slot).map(String::as_str).unwrap_or("none");
            s.push_str(&format!("\n  {}: {equipped}", slot.as_str()));
        }
        s
    }
}

pub type PlayerHandle = Arc<Mutex<Player>>;

#[derive(Debug, Clone)]
struct Online {
    player: PlayerHandle,
    outbox: Outbox,
}

/// Who is online. Lookups take a short read lock; compound membership changes additionally
/// hold [`PlayerRegistry::membership`] so "check then insert" and "remove then announce" are
/// atomic with respect to each other.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    online: RwLock<HashMap<String, Online>>,
    membership: Mutex<()>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn membership(&self) -> MutexGuard<'_, ()> {
        self.membership.lock()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.online.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<PlayerHandle> {
        self.online.read().get(name).map(|o| o.player.clone())
    }

    /// Insert a new player. Fails (returning the player) if the name is already online.
    pub fn insert(&self, player: Player) -> Result<PlayerHandle, Player> {
        let mut online = self.online.write();
        if online.contains_key(&player.name) {
            return Err(player);
        }
        let name = player.name.clone();
        let outbox = player.outbox.clone();
        let handle = Arc::new(Mutex::new(player));
        online.insert(
            name,
            Online {
                player: handle.clone(),
                outbox,
            },
        );
        Ok(handle)
    }

    pub fn remove(&self, name: &str) -> Option<PlayerHandle> {
        self.online.write().remove(name).map(|o| o.player)
    }

    /// Deliver `msg` to every listed name that is still online; stale names are skipped.
    pub fn send_to<'a>(&self, names: impl IntoIterator<Item = &'a str>, msg: &str) -> usize {
        let online = self.online.read();
        names
            .into_iter()
            .filter_map(|n| online.get(n))
            .filter(|o| o.outbox.send(msg))
            .count()
    }

    pub fn names(&self) -> Vec<String> {
        let mut v = self.online.read().keys().cloned().collect::<Vec<_>>();
        v.sort_unstable();
        v
    }

    pub fn handles(&self) -> Vec<PlayerHandle> {
        self.online
            .read()
            .values()
            .map(|o| o.player.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.online.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.read().is_empty()
    }
}
