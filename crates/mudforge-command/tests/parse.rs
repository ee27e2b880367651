//! Parsing player input against the alias table and the current room.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mudforge_command::{AliasConfig, CommandTable};
use mudforge_world::{
    Action, Direction, Mob, OutputSink, Room, RoomGraph, RoomGraphBuilder, World, WorldConfig,
};

// =========================================================================
// Helpers
// =========================================================================

/// Hall --north--> Yard, plus Hall --portal--> Tower.
fn graph() -> RoomGraph {
    let mut builder = RoomGraphBuilder::new();
    let hall = builder.add_room("Hall", "A hall.");
    let yard = builder.add_room("Yard", "A yard.");
    let tower = builder.add_room("Tower", "A tower.");
    builder.connect_direction(hall, Direction::North, yard).unwrap();
    builder
        .connect(hall, ["portal", "shimmer"], tower, ["portal"])
        .unwrap();
    builder.build().unwrap()
}

fn describe(action: Option<Action>) -> String {
    match action {
        None => "none".into(),
        Some(Action::Move { exit }) => format!("move {exit}"),
        Some(Action::Say(text)) => format!("say {text}"),
        Some(Action::Unrecognized(text)) => format!("unrecognized {text}"),
        Some(Action::Custom(custom)) => format!("custom {} [{}]", custom.name(), custom.args()),
        Some(other) => other.name().to_string(),
    }
}

// =========================================================================
// Built-in grammar
// =========================================================================

#[test]
fn test_parse_builtins_case_insensitive() {
    let table = CommandTable::standard();
    assert_eq!(describe(table.parse("LOOK", None)), "look");
    assert_eq!(describe(table.parse("  l  ", None)), "look");
    assert_eq!(describe(table.parse("Doors", None)), "exits");
    assert_eq!(describe(table.parse("Q", None)), "quit");
    assert_eq!(describe(table.parse("who", None)), "who");
}

#[test]
fn test_parse_blank_line_is_nothing() {
    let table = CommandTable::standard();
    assert_eq!(describe(table.parse("", None)), "none");
    assert_eq!(describe(table.parse(" \t ", None)), "none");
}

#[test]
fn test_parse_say_keeps_rest_of_line() {
    let table = CommandTable::standard();
    assert_eq!(describe(table.parse("say  hello there ", None)), "say hello there");
    assert_eq!(describe(table.parse("'hi all", None)), "say hi all");
    assert_eq!(describe(table.parse("SAY", None)), "say ");
}

#[test]
fn test_parse_direction_words() {
    let table = CommandTable::standard();
    assert_eq!(describe(table.parse("n", None)), "move north");
    assert_eq!(describe(table.parse("WEST", None)), "move west");
    assert_eq!(describe(table.parse("u", None)), "move up");
}

#[test]
fn test_parse_unknown_word_is_unrecognized() {
    let table = CommandTable::standard();
    assert_eq!(
        describe(table.parse("dance wildly", None)),
        "unrecognized dance wildly"
    );
}

// =========================================================================
// Room exits
// =========================================================================

#[test]
fn test_parse_room_exit_alias() {
    let graph = graph();
    let hall: &Room = graph.find("hall").unwrap();
    let table = CommandTable::standard();

    assert_eq!(describe(table.parse("Shimmer", Some(hall))), "move portal");
    assert_eq!(describe(table.parse("portal", Some(hall))), "move portal");

    let yard: &Room = graph.find("yard").unwrap();
    assert_eq!(
        describe(table.parse("portal", Some(yard))),
        "unrecognized portal"
    );
}

// =========================================================================
// Configuration and custom actions
// =========================================================================

#[test]
fn test_apply_alias_config() {
    let config: AliasConfig =
        serde_json::from_str(r#"{ "aliases": { "peer": "look", "bye": "q" } }"#).unwrap();
    let mut table = CommandTable::standard();
    table.apply(&config).unwrap();

    assert_eq!(describe(table.parse("peer", None)), "look");
    assert_eq!(describe(table.parse("BYE", None)), "quit");
}

#[test]
fn test_apply_alias_config_unknown_target_fails() {
    let config: AliasConfig =
        serde_json::from_str(r#"{ "aliases": { "fly": "soar" } }"#).unwrap();
    let mut table = CommandTable::standard();
    assert!(table.apply(&config).is_err());
    assert_eq!(describe(table.parse("fly", None)), "unrecognized fly");
}

#[tokio::test]
async fn test_custom_action_runs_with_arguments() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut table = CommandTable::standard();
    {
        let calls = Arc::clone(&calls);
        table
            .bind_custom("Wave", move |ctx, args| {
                calls.fetch_add(1, Ordering::SeqCst);
                ctx.mob.tell(format!("You wave {args}."))
            })
            .unwrap();
    }

    let action = table.parse("wave at everyone", None);
    assert_eq!(describe(action.clone()), "custom wave [at everyone]");

    let world = World::new(graph(), WorldConfig::manual());
    world.start();
    let (sink, mut rx) = OutputSink::channel();
    let mob = Mob::new(sink);
    mob.spawn("Al", &world).unwrap();
    mob.enqueue(action.unwrap());

    let tick = world.pulse().unwrap().tick;
    assert!(mob.wait_for_pulse(tick).await);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(rx.try_recv().unwrap(), "You wave at everyone.");
}
