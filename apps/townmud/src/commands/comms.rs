use super::{Ctx, Flow, rest};

pub(super) fn say(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(text) = rest(args) else {
        ctx.send("Say what?");
        return Ok(Flow::Continue);
    };
    let name = ctx.player.name.as_str();
    ctx.room()?.lock().broadcast(
        &ctx.world.players,
        &format!("{name} says: {text}"),
        Some(name),
    );
    ctx.send(&format!("You say: {text}"));
    Ok(Flow::Continue)
}

pub(super) fn quit(ctx: &mut Ctx<'_>, _args: &[String]) -> anyhow::Result<Flow> {
    ctx.send("Goodbye!");
    Ok(Flow::Quit)
}

#[cfg(test)]
mod tests {
    use crate::commands::Flow;
    use crate::commands::testing::run;
    use crate::world::testing::{drain, join, town};

    #[test]
    fn say_reaches_room_but_not_speaker() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_b, mut rb) = join(&w, "Bob");
        let (c, mut rc) = join(&w, "Cara");
        w.transfer(&mut c.lock(), "tavern", None, "").unwrap();
        drain(&mut rb);
        drain(&mut rc);

        let (_, out) = run(&w, &a, &mut ra, "say hello   there");
        assert_eq!(out, vec!["You say: hello there".to_string()]);
        assert_eq!(drain(&mut rb), vec!["Alice says: hello there".to_string()]);
        assert!(drain(&mut rc).is_empty());
    }

    #[test]
    fn say_without_text_prompts() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "say");
        assert_eq!(out, vec!["Say what?".to_string()]);
    }

    #[test]
    fn quit_says_goodbye() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (flow, out) = run(&w, &a, &mut ra, "QUIT");
        assert_eq!(flow, Flow::Quit);
        assert_eq!(out, vec!["Goodbye!".to_string()]);
        // Leaving the registry is the session's job.
        assert!(w.players.contains("Alice"));
    }
}
