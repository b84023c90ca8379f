use super::{Ctx, Flow, rest};
use crate::items::{self, EquipSlot};

pub(super) fn get(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(token) = rest(args) else {
        ctx.send("Get what?");
        return Ok(Flow::Continue);
    };

    let mut room = ctx.room()?.lock();
    let Some(item) = room.take_item(&token) else {
        ctx.send("That's not here to take.");
        return Ok(Flow::Continue);
    };
    room.broadcast(
        &ctx.world.players,
        &format!("{} picks up {item}.", ctx.player.name),
        None,
    );

    ctx.send(&format!("You pick up {item}."));
    ctx.player.inventory.push(item);
    Ok(Flow::Continue)
}

pub(super) fn drop(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(token) = rest(args) else {
        ctx.send("Drop what?");
        return Ok(Flow::Continue);
    };
    let Some(i) = items::find_containing(&ctx.player.inventory, &token) else {
        ctx.send("You don't have that.");
        return Ok(Flow::Continue);
    };

    let room = ctx.room()?;
    let item = ctx.player.inventory.remove(i);
    {
        let mut room = room.lock();
        room.items.push(item.clone());
        room.broadcast(
            &ctx.world.players,
            &format!("{} drops {item}.", ctx.player.name),
            Some(ctx.player.name.as_str()),
        );
    }

    ctx.send(&format!("You drop {item}."));
    Ok(Flow::Continue)
}

pub(super) fn equip(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(token) = rest(args) else {
        ctx.send("Equip what?");
        return Ok(Flow::Continue);
    };
    let Some(i) = items::find_containing(&ctx.player.inventory, &token) else {
        ctx.send("You don't have that.");
        return Ok(Flow::Continue);
    };

    let item = ctx.player.inventory[i].clone();
    let Some(slot) = ctx.world.catalog().lookup(&item).and_then(|d| d.equip_slot()) else {
        ctx.send(&format!("You can't equip {item}."));
        return Ok(Flow::Continue);
    };

    ctx.player.inventory.remove(i);
    if let Some(prev) = ctx.player.equipment.set(slot, item.clone()) {
        ctx.player.inventory.push(prev);
    }
    ctx.send(&format!("You equip {item}."));
    Ok(Flow::Continue)
}

pub(super) fn unequip(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(slot) = rest(args).as_deref().and_then(EquipSlot::parse) else {
        ctx.send("Unequip what? (weapon, armor, helmet, boots)");
        return Ok(Flow::Continue);
    };
    let Some(item) = ctx.player.equipment.clear(slot) else {
        ctx.send("Nothing is equipped there.");
        return Ok(Flow::Continue);
    };
    ctx.send(&format!("You remove {item}."));
    ctx.player.inventory.push(item);
    Ok(Flow::Continue)
}

pub(super) fn use_item(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(token) = rest(args) else {
        ctx.send("Use what?");
        return Ok(Flow::Continue);
    };
    let Some(i) = items::find_containing(&ctx.player.inventory, &token) else {
        ctx.send("You don't have that.");
        return Ok(Flow::Continue);
    };

    let item = ctx.player.inventory[i].clone();
    let Some(heal) = ctx.world.catalog().lookup(&item).and_then(|d| d.heal_amount()) else {
        ctx.send(&format!("You can't use {item}."));
        return Ok(Flow::Continue);
    };

    ctx.player.inventory.remove(i);
    let restored = ctx.player.heal(heal);
    ctx.send(&format!("You use {item} and recover {restored} health."));
    Ok(Flow::Continue)
}
