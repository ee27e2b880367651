//! Text map compiler for Mudforge.
//!
//! Worlds are drawn as ASCII grids and compiled into a validated
//! [`RoomGraph`](mudforge_world::RoomGraph):
//!
//! ```text
//! T-M
//! |
//! G
//! ```
//!
//! A [`Legend`] gives symbols real names and descriptions, adds links the
//! grid cannot draw (up and down) and picks the start room.

mod compile;
mod error;
mod grid;
mod legend;

pub use compile::compile;
pub use error::MapError;
pub use grid::{Cell, TextMap};
pub use legend::{GENERIC_ROOM_DESCRIPTION, Legend, LinkSpec, RoomSpec};
