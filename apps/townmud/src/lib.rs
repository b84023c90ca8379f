//! A small multi-user dungeon served over line-oriented TCP.
//!
//! Each connection gets its own task; all of them share one [`world::World`], which a
//! background [`game_loop`] ticks on a timer.

pub mod combat;
pub mod commands;
pub mod config;
pub mod dice;
pub mod game_loop;
pub mod items;
pub mod monsters;
pub mod players;
pub mod rooms;
pub mod seed;
pub mod session;
pub mod world;
