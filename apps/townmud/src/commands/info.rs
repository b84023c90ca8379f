use super::{COMMANDS, Ctx, Flow, rest};
use crate::items::{self, EquipSlot};

pub(super) fn look(ctx: &mut Ctx<'_>, _args: &[String]) -> anyhow::Result<Flow> {
    ctx.send(&ctx.world.render_room_for(ctx.player)?);
    Ok(Flow::Continue)
}

pub(super) fn inventory(ctx: &mut Ctx<'_>, _args: &[String]) -> anyhow::Result<Flow> {
    ctx.send(&ctx.player.render_inventory());
    Ok(Flow::Continue)
}

pub(super) fn help(ctx: &mut Ctx<'_>, _args: &[String]) -> anyhow::Result<Flow> {
    ctx.send(&help_text());
    Ok(Flow::Continue)
}

fn help_text() -> String {
    let mut s = String::from("=== Available Commands ===\n");
    for cmd in COMMANDS {
        s.push_str(&format!("{:<12} - {}\n", cmd.name, cmd.description));
    }
    s.push_str("\nShortcuts:\n");
    s.push_str("l            - look\n");
    s.push_str("i            - inventory\n");
    s.push_str("n/s/e/w      - go north/south/east/west");
    s
}

pub(super) fn who(ctx: &mut Ctx<'_>, _args: &[String]) -> anyhow::Result<Flow> {
    let names = ctx.world.players.names();
    let mut s = format!("=== Players Online ({}) ===", names.len());
    for n in &names {
        s.push_str(&format!("\n  - {n}"));
    }
    ctx.send(&s);
    Ok(Flow::Continue)
}

pub(super) fn examine(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(token) = rest(args) else {
        ctx.send("Examine what?");
        return Ok(Flow::Continue);
    };

    let carried = items::find_containing(&ctx.player.inventory, &token)
        .map(|i| ctx.player.inventory[i].clone())
        .or_else(|| {
            EquipSlot::all()
                .iter()
                .filter_map(|slot| ctx.player.equipment.get(*slot))
                .find(|item| items::find_containing(&[item.as_str()], &token).is_some())
                .cloned()
        });
    let found = match carried {
        Some(item) => Some(item),
        None => {
            let room = ctx.room()?.lock();
            items::find_containing(&room.items, &token).map(|i| room.items[i].clone())
        }
    };

    let Some(item) = found else {
        ctx.send("You don't see that here.");
        return Ok(Flow::Continue);
    };
    match ctx.world.catalog().lookup(&item) {
        Some(def) => ctx.send(&def.render()),
        None => ctx.send(&format!("You see nothing special about {item}.")),
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::run;
    use crate::world::testing::{join, town};

    #[test]
    fn look_lists_room_contents() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_b, _rb) = join(&w, "Bob");
        let (_, out) = run(&w, &a, &mut ra, "l");
        assert_eq!(out[0], "=== Town Square ===");
        assert!(out.contains(&"Items here:".to_string()));
        assert!(out.contains(&"  - potion".to_string()));
        assert!(out.contains(&"  - Bob".to_string()));
        assert!(!out.contains(&"  - Alice".to_string()));
        assert!(out.contains(&"  north - forest".to_string()));
    }

    #[test]
    fn inventory_shows_stats_and_slots() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "i");
        assert!(out.contains(&"Gold: 100".to_string()));
        assert!(out.contains(&"Health: 100/100".to_string()));
        assert!(out.contains(&"Mana: 50/50".to_string()));
        assert!(out.contains(&"Level: 1 (XP: 0)".to_string()));
        assert!(out.contains(&"Your inventory is empty.".to_string()));
        assert!(out.contains(&"  weapon: none".to_string()));
    }

    #[test]
    fn who_lists_sorted_names() {
        let w = town();
        let (_c, _rc) = join(&w, "Cara");
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "who");
        assert_eq!(
            out,
            vec![
                "=== Players Online (2) ===".to_string(),
                "  - Alice".to_string(),
                "  - Cara".to_string(),
            ]
        );
    }

    #[test]
    fn examine_uses_the_catalog() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "examine potion");
        assert_eq!(out[0], "Health Potion (consumable)");
        assert!(out.contains(&"  heal: +30".to_string()));

        a.lock().inventory.push("strange_rock".to_string());
        let (_, out) = run(&w, &a, &mut ra, "examine rock");
        assert_eq!(out, vec!["You see nothing special about strange_rock.".to_string()]);

        let (_, out) = run(&w, &a, &mut ra, "examine dragon");
        assert_eq!(out, vec!["You don't see that here.".to_string()]);
    }
}
