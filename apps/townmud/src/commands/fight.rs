use super::{Ctx, Flow, rest};
use crate::combat;

pub(super) fn attack(ctx: &mut Ctx<'_>, args: &[String]) -> anyhow::Result<Flow> {
    let Some(target) = rest(args) else {
        ctx.send("Attack what?");
        return Ok(Flow::Continue);
    };
    combat::resolve_attack(ctx.world, ctx.player, &target, &mut ctx.world.dice())?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::run;
    use crate::world::testing::{join, town};

    #[test]
    fn attack_needs_a_target() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "attack");
        assert_eq!(out, vec!["Attack what?".to_string()]);

        let (_, out) = run(&w, &a, &mut ra, "attack wolf");
        assert_eq!(out, vec!["That's not here to attack.".to_string()]);
    }

    #[test]
    fn five_health_wolf_falls_to_any_roll() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        w.transfer(&mut a.lock(), "forest", None, "").unwrap();
        w.room("forest").unwrap().lock().monsters[0].health = 5;

        let (_, out) = run(&w, &a, &mut ra, "attack wolf");
        assert!(out[0].starts_with("Alice attacks Wolf for "), "{out:?}");
        assert_eq!(out[1], "Wolf has been defeated!");
        {
            let p = a.lock();
            assert_eq!(p.experience, 15);
            assert_eq!(p.gold, 105);
        }

        let (_, look) = run(&w, &a, &mut ra, "look");
        assert!(!look.iter().any(|l| l.contains("Wolf")));
        assert!(look.contains(&"  - wolf_pelt".to_string()));
    }
}
