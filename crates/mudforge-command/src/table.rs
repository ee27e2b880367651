//! The alias table and the line parser built on it.

use std::collections::HashMap;
use std::sync::Arc;

use mudforge_world::{Action, ActionContext, ActionFn, CustomAction, Direction, Room};

use crate::config::AliasConfig;
use crate::error::CommandError;

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// What a command word stands for.
#[derive(Clone)]
pub enum Binding {
    Look,
    Exits,
    Say,
    Who,
    Quit,
    Move(Direction),
    Custom { name: Arc<str>, run: Arc<ActionFn> },
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Look => write!(f, "Look"),
            Self::Exits => write!(f, "Exits"),
            Self::Say => write!(f, "Say"),
            Self::Who => write!(f, "Who"),
            Self::Quit => write!(f, "Quit"),
            Self::Move(direction) => write!(f, "Move({direction})"),
            Self::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

impl Binding {
    /// Turn the binding into an action carrying the rest of the input line.
    fn to_action(&self, args: &str) -> Action {
        match self {
            Self::Look => Action::Look,
            Self::Exits => Action::Exits,
            Self::Say => Action::Say(args.to_string()),
            Self::Who => Action::Who,
            Self::Quit => Action::Quit,
            Self::Move(direction) => Action::Move {
                exit: direction.name().to_string(),
            },
            Self::Custom { name, run } => {
                Action::Custom(CustomAction::from_shared(Arc::clone(name), args, Arc::clone(run)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CommandTable
// ---------------------------------------------------------------------------

/// Maps normalized (lowercase) command words to [`Binding`]s.
///
/// Built once at startup and shared read-only between connections.
#[derive(Debug, Clone)]
pub struct CommandTable {
    bindings: HashMap<String, Binding>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandTable {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The built-in commands plus every direction and its abbreviation.
    pub fn standard() -> Self {
        let mut bindings = HashMap::new();
        let builtins = [
            (["look", "l", ""], Binding::Look),
            (["exits", "doors", "dirs"], Binding::Exits),
            (["say", "", ""], Binding::Say),
            (["who", "", ""], Binding::Who),
            (["quit", "q", ""], Binding::Quit),
        ];
        for (words, binding) in builtins {
            for word in words.into_iter().filter(|w| !w.is_empty()) {
                bindings.insert(word.to_string(), binding.clone());
            }
        }
        for direction in Direction::ALL {
            for word in direction.aliases() {
                bindings.insert(word.to_string(), Binding::Move(direction));
            }
        }
        Self { bindings }
    }

    /// Bind `alias` to `binding`, replacing any previous binding.
    pub fn bind(&mut self, alias: &str, binding: Binding) -> Result<(), CommandError> {
        let key = normalize(alias)?;
        self.bindings.insert(key, binding);
        Ok(())
    }

    /// Bind `alias` to an application-defined action.
    pub fn bind_custom(
        &mut self,
        alias: &str,
        run: impl Fn(&ActionContext<'_>, &str) -> bool + Send + Sync + 'static,
    ) -> Result<(), CommandError> {
        let key = normalize(alias)?;
        let binding = Binding::Custom {
            name: Arc::from(key.as_str()),
            run: Arc::new(run),
        };
        self.bindings.insert(key, binding);
        Ok(())
    }

    /// Make `alias` do whatever `target` currently does.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), CommandError> {
        let binding = self
            .resolve(target)
            .cloned()
            .ok_or_else(|| CommandError::UnknownTarget {
                alias: alias.to_string(),
                target: target.to_string(),
            })?;
        self.bind(alias, binding)
    }

    /// Apply every alias from `config`. Stops at the first bad entry.
    pub fn apply(&mut self, config: &AliasConfig) -> Result<(), CommandError> {
        for (alias, target) in &config.aliases {
            self.alias(alias, target)?;
        }
        if !config.is_empty() {
            tracing::debug!(added = config.aliases.len(), total = self.len(), "command aliases applied");
        }
        Ok(())
    }

    /// Case-insensitive lookup of a single command word.
    pub fn resolve(&self, word: &str) -> Option<&Binding> {
        self.bindings.get(&word.to_lowercase())
    }

    /// All known command words, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        words.sort_unstable();
        words
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Turn one line of player input into an action.
    ///
    /// The first word is looked up in the table, then among the exits of
    /// `room`. A leading `'` is shorthand for `say`. Anything else becomes
    /// [`Action::Unrecognized`]. Blank lines produce nothing.
    pub fn parse(&self, line: &str, room: Option<&Room>) -> Option<Action> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Some(speech) = line.strip_prefix('\'') {
            return Some(Action::Say(speech.trim().to_string()));
        }

        let (word, args) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        if let Some(binding) = self.resolve(word) {
            return Some(binding.to_action(args));
        }
        if let Some(exit) = room.and_then(|r| r.find_exit(word)) {
            return Some(Action::Move {
                exit: exit.primary_name().to_string(),
            });
        }
        Some(Action::Unrecognized(line.to_string()))
    }
}

fn normalize(alias: &str) -> Result<String, CommandError> {
    let trimmed = alias.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(CommandError::InvalidAlias(alias.to_string()));
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_has_builtins_and_directions() {
        let table = CommandTable::standard();
        for word in ["look", "l", "exits", "doors", "dirs", "say", "who", "quit", "q"] {
            assert!(table.resolve(word).is_some(), "missing {word}");
        }
        assert!(matches!(table.resolve("N"), Some(Binding::Move(Direction::North))));
        assert!(matches!(table.resolve("down"), Some(Binding::Move(Direction::Down))));
        assert!(table.resolve("").is_none());
    }

    #[test]
    fn test_bind_rejects_blank_and_multiword_aliases() {
        let mut table = CommandTable::empty();
        assert_eq!(
            table.bind("  ", Binding::Look),
            Err(CommandError::InvalidAlias("  ".into()))
        );
        assert!(table.bind("two words", Binding::Look).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_alias_copies_target_binding() {
        let mut table = CommandTable::standard();
        table.alias("Peer", "LOOK").unwrap();
        assert!(matches!(table.resolve("peer"), Some(Binding::Look)));

        let err = table.alias("fly", "soar").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnknownTarget {
                alias: "fly".into(),
                target: "soar".into()
            }
        );
    }

    #[test]
    fn test_aliases_sorted() {
        let mut table = CommandTable::empty();
        table.bind("zap", Binding::Quit).unwrap();
        table.bind("Ask", Binding::Say).unwrap();
        assert_eq!(table.aliases(), vec!["ask", "zap"]);
        assert_eq!(table.len(), 2);
    }
}
