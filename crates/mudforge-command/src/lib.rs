//! Command grammar for Mudforge.
//!
//! Player input is one line of text. The first word selects a command from
//! a [`CommandTable`]; the rest of the line is that command's argument.
//! The table is assembled once at startup from the built-in commands, any
//! [`AliasConfig`] entries and application-defined custom actions, then
//! shared read-only by every connection.
//!
//! ```text
//! "say hello there"  ->  Action::Say("hello there")
//! "N"                ->  Action::Move { exit: "north" }
//! "portal"           ->  Action::Move { exit: "portal" }   (an exit of the current room)
//! "dance"            ->  Action::Unrecognized("dance")
//! ```

mod config;
mod error;
mod table;

pub use config::AliasConfig;
pub use error::CommandError;
pub use table::{Binding, CommandTable};
