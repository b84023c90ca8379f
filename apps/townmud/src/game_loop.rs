use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::commands::panic_message;
use crate::dice::Dice;
use crate::monsters::Monster;
use crate::world::World;

pub const HEALTH_REGEN: i32 = 1;
pub const MANA_REGEN: i32 = 1;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub regenerated: usize,
    /// Room ids that got their monster back this tick.
    pub respawned: Vec<String>,
}

/// One world tick: regenerate every online player, then roll respawns at empty spawn sites.
pub fn tick(world: &World, dice: &mut impl Dice) -> TickReport {
    let mut report = TickReport::default();

    for handle in world.players.handles() {
        let mut p = handle.lock();
        let healed = p.heal(HEALTH_REGEN);
        let restored = p.restore_mana(MANA_REGEN);
        if healed > 0 || restored > 0 {
            report.regenerated += 1;
        }
    }

    for room in world.rooms() {
        let mut room = room.lock();
        let Some(key) = room.spawn.clone() else {
            continue;
        };
        if room.has_living_monsters() || !dice.chance(world.respawn_pct()) {
            continue;
        }
        let Some(template) = world.template(&key) else {
            continue;
        };
        let monster = template.spawn();
        let msg = format!("A {} emerges from the shadows!", monster.name);
        room.monsters.retain(Monster::is_alive);
        room.monsters.push(monster);
        room.broadcast(&world.players, &msg, None);
        info!(room = %room.id, monster = %key, "monster respawned");
        report.respawned.push(room.id.clone());
    }

    report
}

/// Tick the world every `every` until `shutdown` flips to true or its sender is dropped.
/// A tick that panics is logged and the loop carries on.
pub async fn run(world: Arc<World>, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match catch_unwind(AssertUnwindSafe(|| tick(&world, &mut world.dice()))) {
            Ok(report) => {
                debug!(
                    regenerated = report.regenerated,
                    respawned = report.respawned.len(),
                    "world tick"
                );
            }
            Err(panic) => {
                warn!(err = %panic_message(panic.as_ref()), "world tick failed");
            }
        }
    }
    info!("game loop stopped");
}
