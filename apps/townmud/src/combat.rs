use anyhow::Context;
use tracing::info;

use crate::dice::Dice;
use crate::monsters::MIN_MONSTER_DAMAGE;
use crate::players::Player;
use crate::world::World;

pub const PLAYER_MIN_DAMAGE: i32 = 10;
pub const PLAYER_MAX_DAMAGE: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    NoTarget,
    Slain {
        monster: String,
        dealt: i32,
    },
    Exchanged {
        monster: String,
        dealt: i32,
        taken: i32,
    },
    PlayerDefeated {
        monster: String,
        dealt: i32,
        taken: i32,
    },
}

/// One round of combat: the player strikes the first living monster matching `target`,
/// and a survivor strikes back.
///
/// Rewards go to the player, loot to the ground. A defeated player wakes at half health in the
/// world's respawn room; the fight room's lock is released before they move.
pub fn resolve_attack(
    world: &World,
    player: &mut Player,
    target: &str,
    dice: &mut impl Dice,
) -> anyhow::Result<AttackOutcome> {
    let room = world
        .room(&player.room_id)
        .with_context(|| format!("room {} does not exist", player.room_id))?;
    let mut room = room.lock();

    let Some(idx) = room.find_monster(target) else {
        player.send("That's not here to attack.");
        return Ok(AttackOutcome::NoTarget);
    };

    let dealt = dice.roll_range(PLAYER_MIN_DAMAGE, PLAYER_MAX_DAMAGE);
    room.monsters[idx].take_damage(dealt);
    let monster = room.monsters[idx].name.clone();
    room.broadcast(
        &world.players,
        &format!("{} attacks {monster} for {dealt} damage!", player.name),
        None,
    );

    if !room.monsters[idx].is_alive() {
        let dead = room.monsters.remove(idx);
        room.broadcast(&world.players, &format!("{monster} has been defeated!"), None);
        player.gain_experience(dead.experience);
        player.gold = player.gold.saturating_add(dead.gold);
        room.items.extend(dead.loot);
        info!(player = %player.name, monster = %monster, room = %room.id, "monster slain");
        return Ok(AttackOutcome::Slain { monster, dealt });
    }

    let power = room.monsters[idx].attack_power.max(MIN_MONSTER_DAMAGE);
    let taken = dice.roll_range(MIN_MONSTER_DAMAGE, power);
    player.take_damage(taken);
    room.broadcast(
        &world.players,
        &format!("{monster} attacks {} for {taken} damage!", player.name),
        None,
    );

    if player.is_alive() {
        return Ok(AttackOutcome::Exchanged {
            monster,
            dealt,
            taken,
        });
    }

    room.broadcast(
        &world.players,
        &format!("{} has been defeated!", player.name),
        None,
    );
    drop(room);

    player.health = player.max_health / 2;
    if player.room_id != world.respawn_room() {
        let arrival = format!("{} arrives.", player.name);
        world.transfer(player, world.respawn_room(), None, &arrival)?;
    }
    player.send("You have been defeated and respawned in town!");
    info!(player = %player.name, monster = %monster, "player defeated");
    Ok(AttackOutcome::PlayerDefeated {
        monster,
        dealt,
        taken,
    })
}
