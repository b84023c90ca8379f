//! Player commands.
//!
//! A command is a plain function in a static table. `dispatch` parses one input line, resolves
//! shortcuts and runs the handler; handler errors and panics are reported to the issuer only.

mod comms;
mod fight;
mod info;
mod inventory;
mod movement;

use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::Context;
use parking_lot::Mutex;
use tracing::warn;

use crate::players::Player;
use crate::rooms::Room;
use crate::world::World;

pub const UNKNOWN_COMMAND: &str = "Unknown command. Type 'help' for available commands.";

/// What the session should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Ctx<'a> {
    pub world: &'a World,
    pub player: &'a mut Player,
}

impl<'a> Ctx<'a> {
    /// The room the player is standing in.
    fn room(&self) -> anyhow::Result<&'a Mutex<Room>> {
        self.world
            .room(&self.player.room_id)
            .with_context(|| format!("room {} does not exist", self.player.room_id))
    }

    fn send(&self, msg: &str) {
        self.player.send(msg);
    }
}

pub type Handler = fn(&mut Ctx<'_>, &[String]) -> anyhow::Result<Flow>;

pub struct Command {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: Handler,
}

pub static COMMANDS: &[Command] = &[
    Command {
        name: "say",
        description: "Say something to everyone in the room",
        handler: comms::say,
    },
    Command {
        name: "look",
        description: "Look around the current room",
        handler: info::look,
    },
    Command {
        name: "go",
        description: "Move in a direction (north, south, east, west)",
        handler: movement::go,
    },
    Command {
        name: "attack",
        description: "Attack a monster",
        handler: fight::attack,
    },
    Command {
        name: "inventory",
        description: "Show your inventory and stats",
        handler: info::inventory,
    },
    Command {
        name: "get",
        description: "Pick up an item",
        handler: inventory::get,
    },
    Command {
        name: "drop",
        description: "Drop an item",
        handler: inventory::drop,
    },
    Command {
        name: "equip",
        description: "Equip a weapon or piece of armor",
        handler: inventory::equip,
    },
    Command {
        name: "unequip",
        description: "Remove equipment from a slot",
        handler: inventory::unequip,
    },
    Command {
        name: "use",
        description: "Use a consumable item",
        handler: inventory::use_item,
    },
    Command {
        name: "examine",
        description: "Examine an item",
        handler: info::examine,
    },
    Command {
        name: "who",
        description: "List players online",
        handler: info::who,
    },
    Command {
        name: "help",
        description: "Show available commands",
        handler: info::help,
    },
    Command {
        name: "quit",
        description: "Leave the game",
        handler: comms::quit,
    },
];

pub fn find(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Split a line into a lower-cased verb and its arguments, expanding shortcuts.
/// Returns `None` for blank input.
pub fn resolve(line: &str) -> Option<(String, Vec<String>)> {
    let mut words = line.split_whitespace();
    let first = words.next()?.to_lowercase();
    let args = words.map(str::to_string).collect::<Vec<_>>();

    let dir = match first.as_str() {
        "n" => Some("north"),
        "s" => Some("south"),
        "e" => Some("east"),
        "w" => Some("west"),
        _ => None,
    };
    if let Some(dir) = dir {
        return Some(("go".to_string(), vec![dir.to_string()]));
    }

    let verb = match first.as_str() {
        "l" => "look".to_string(),
        "i" => "inventory".to_string(),
        _ => first,
    };
    Some((verb, args))
}

/// Run one input line for `player`.
pub fn dispatch(world: &World, player: &mut Player, line: &str) -> Flow {
    let Some((verb, args)) = resolve(line) else {
        return Flow::Continue;
    };
    let Some(cmd) = find(&verb) else {
        player.send(UNKNOWN_COMMAND);
        return Flow::Continue;
    };

    let res = catch_unwind(AssertUnwindSafe(|| {
        let mut ctx = Ctx {
            world,
            player: &mut *player,
        };
        (cmd.handler)(&mut ctx, &args)
    }));

    let reason = match res {
        Ok(Ok(flow)) => return flow,
        Ok(Err(e)) => format!("{e:#}"),
        Err(panic) => panic_message(panic.as_ref()),
    };
    warn!(player = %player.name, command = cmd.name, err = %reason, "command failed");
    player.send(&format!("Error executing command: {reason}"));
    Flow::Continue
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}

/// Joined argument text, or `None` when there is none.
fn rest(args: &[String]) -> Option<String> {
    if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::run;
    use super::*;
    use crate::world::testing::{join, town};

    #[test]
    fn shortcuts_expand() {
        assert_eq!(
            resolve("N"),
            Some(("go".to_string(), vec!["north".to_string()]))
        );
        assert_eq!(
            resolve("w into the tavern"),
            Some(("go".to_string(), vec!["west".to_string()]))
        );
        assert_eq!(resolve("  l  "), Some(("look".to_string(), vec![])));
        assert_eq!(
            resolve("I extra"),
            Some(("inventory".to_string(), vec!["extra".to_string()]))
        );
        assert_eq!(
            resolve("SAY Hello   there"),
            Some((
                "say".to_string(),
                vec!["Hello".to_string(), "there".to_string()]
            ))
        );
        assert_eq!(resolve("   \t "), None);
    }

    #[test]
    fn blank_input_is_silent() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (flow, out) = run(&w, &a, &mut ra, "   ");
        assert_eq!(flow, Flow::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_verb_gets_one_line() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (flow, out) = run(&w, &a, &mut ra, "dance wildly");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, vec![UNKNOWN_COMMAND.to_string()]);
    }

    #[test]
    fn handler_error_is_reported_not_fatal() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        a.lock().room_id = "the_void".to_string();
        let (flow, out) = run(&w, &a, &mut ra, "look");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            out,
            vec!["Error executing command: room the_void does not exist".to_string()]
        );
    }

    #[test]
    fn handler_panic_is_caught_and_room_stays_usable() {
        fn boom(ctx: &mut Ctx<'_>, _args: &[String]) -> anyhow::Result<Flow> {
            let _room = ctx.room()?.lock();
            panic!("kaboom");
        }

        let w = town();
        let (a, _ra) = join(&w, "Alice");
        let mut p = a.lock();
        let res = catch_unwind(AssertUnwindSafe(|| {
            boom(&mut Ctx { world: &w, player: &mut p }, &[])
        }));
        let msg = panic_message(res.unwrap_err().as_ref());
        assert_eq!(msg, "kaboom");
        assert!(w.room("town_square").unwrap().try_lock().is_some());
    }

    #[test]
    fn help_lists_every_command_in_order() {
        let w = town();
        let (a, mut ra) = join(&w, "Alice");
        let (_, out) = run(&w, &a, &mut ra, "help");
        assert_eq!(out[0], "=== Available Commands ===");
        for (line, cmd) in out[1..].iter().zip(COMMANDS) {
            assert_eq!(line, &format!("{:<12} - {}", cmd.name, cmd.description));
        }
        assert!(out.contains(&"n/s/e/w      - go north/south/east/west".to_string()));
    }
}
