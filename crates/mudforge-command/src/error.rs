//! Error types for the command layer.
//!
//! These only come up while the alias table is being assembled. Parsing
//! player input never fails; unknown input becomes
//! [`Action::Unrecognized`](mudforge_world::Action::Unrecognized).

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// An alias was empty or contained whitespace.
    #[error("invalid alias {0:?}: aliases are single non-empty words")]
    InvalidAlias(String),

    /// An alias was pointed at a command the table does not know.
    #[error("alias {alias:?} refers to unknown command {target:?}")]
    UnknownTarget { alias: String, target: String },
}
