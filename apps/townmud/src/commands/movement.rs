use super::{Ctx, Flow};

pub(super) fn go(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(dir) = args.first() else {
        ctx.send("Go where? Use: go <direction>");
        return Ok(Flow::Continue);
    };
    let dir = dir.to_lowercase();

    let target = ctx.room()?.lock().exit(&dir).map(str::to_string);
    let Some(target) = target else {
        ctx.send(&format!("You can't go {dir} from here."));
        return Ok(Flow::Continue);
    };
    if !ctx.world.has_room(&target) {
        ctx.send("That way seems to be blocked.");
        return Ok(Flow::Continue);
    }

    let departure = format!("{} leaves to the {dir}.", ctx.player.name);
    let arrival = format!("{} arrives.", ctx.player.name);
    ctx.world
        .transfer(ctx.player, &target, Some(departure.as_str()), &arrival)?;
    ctx.send(&ctx.world.render_room_for(ctx.player)?);
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::run;
    use crate::world::testing::{drain, join, town};

    #[test]
    fn moving_announces_both_ends_and_shows_the_new_room() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_b, mut rb) = join(&w, "Bob");
        let (c, mut rc) = join(&w, "Cara");
        w.transfer(&mut c.lock(), "forest", None, "").unwrap();
        drain(&mut rb);
        drain(&mut rc);

        let (_, out) = run(&w, &a, &mut ra, "go North");
        assert_eq!(out[0], "=== Dark Forest ===");
        assert!(out.contains(&"  - Cara".to_string()));
        assert_eq!(drain(&mut rb), vec!["Alice leaves to the north.".to_string()]);
        assert_eq!(drain(&mut rc), vec!["Alice arrives.".to_string()]);
        assert_eq!(a.lock().room_id, "forest");
    }

    #[test]
    fn shortcut_moves_too() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "e");
        assert_eq!(out[0], "=== Weapon Shop ===");
        assert_eq!(a.lock().room_id, "shop");
    }

    #[test]
    fn missing_exit_changes_nothing() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "go south");
        assert_eq!(out, vec!["You can't go south from here.".to_string()]);
        assert_eq!(a.lock().room_id, "town_square");
        assert!(w.room("town_square").unwrap().lock().occupants.contains("Alice"));
    }

    #[test]
    fn dangling_exit_is_blocked() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        w.transfer(&mut a.lock(), "cave", None, "").unwrap();
        let (_, out) = run(&w, &a, &mut ra, "go down");
        assert_eq!(out, vec!["That way seems to be blocked.".to_string()]);
        assert_eq!(a.lock().room_id, "cave");
    }

    #[test]
    fn go_without_direction_prompts() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "go");
        assert_eq!(out, vec!["Go where? Use: go <direction>".to_string()]);
    }
}
