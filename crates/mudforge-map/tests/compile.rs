//! Compiling text maps with legends into room graphs.

use mudforge_map::{GENERIC_ROOM_DESCRIPTION, Legend, MapError, TextMap, compile};
use mudforge_world::{Direction, TopologyError};

// =========================================================================
// Helpers
// =========================================================================

const TOWN: &str = "\
T-M
|
G   S";

fn town_legend() -> Legend {
    serde_json::from_str(
        r#"{
            "rooms": {
                "T": { "name": "Town Square", "description": "Busy and loud." },
                "M": { "name": "Market" },
                "S": { "name": "Sewer", "description": "Damp." }
            },
            "links": [ { "from": "T", "direction": "down", "to": "S" } ],
            "start": "M"
        }"#,
    )
    .unwrap()
}

// =========================================================================
// Legend
// =========================================================================

#[test]
fn test_legend_names_and_defaults() {
    let graph = compile(&TextMap::parse(TOWN), &town_legend()).unwrap();
    assert_eq!(graph.len(), 4);

    let square = graph.find("town square").unwrap();
    assert_eq!(square.description(), "Busy and loud.");
    assert_eq!(graph.find("Market").unwrap().description(), GENERIC_ROOM_DESCRIPTION);
    // No legend entry: named after its symbol.
    assert!(graph.find("G").is_some());
    assert_eq!(graph.start().name(), "Market");
}

#[test]
fn test_legend_links_add_up_and_down() {
    let graph = compile(&TextMap::parse(TOWN), &town_legend()).unwrap();
    let square = graph.find("Town Square").unwrap();
    let sewer = graph.find("Sewer").unwrap();

    assert_eq!(square.find_exit("d").map(|e| e.destination()), Some(sewer.id()));
    assert_eq!(sewer.find_exit("up").map(|e| e.destination()), Some(square.id()));
    assert_eq!(sewer.list_exits(), "Visible Exits: up");

    let mut names: Vec<_> = square.exits().iter().map(|e| e.primary_name()).collect();
    names.sort_unstable();
    assert_eq!(names, vec![Direction::Down.name(), "east", "south"]);
}

#[test]
fn test_legend_unknown_symbol_fails() {
    let legend = Legend {
        start: Some('Z'),
        ..Default::default()
    };
    let err = compile(&TextMap::parse(TOWN), &legend).unwrap_err();
    assert!(matches!(err, MapError::UnknownSymbol('Z')));
}

#[test]
fn test_legend_ambiguous_symbol_fails() {
    let legend = Legend {
        start: Some('x'),
        ..Default::default()
    };
    let err = compile(&TextMap::parse("x-x"), &legend).unwrap_err();
    assert!(matches!(err, MapError::AmbiguousSymbol('x')));
}

#[test]
fn test_duplicate_symbols_are_separate_rooms() {
    let graph = compile(&TextMap::parse("x-x"), &Legend::default()).unwrap();
    assert_eq!(graph.len(), 2);
    let first = &graph.rooms()[0];
    assert_eq!(first.find_exit("e").map(|e| e.destination()), Some(graph.rooms()[1].id()));
}

// =========================================================================
// Errors and I/O
// =========================================================================

#[test]
fn test_link_in_taken_direction_still_builds() {
    // Two exits named "east" on T: the graph stays symmetric, the first
    // alias match wins at lookup time.
    let legend: Legend = serde_json::from_str(
        r#"{ "links": [ { "from": "T", "direction": "east", "to": "G" } ] }"#,
    )
    .unwrap();
    let graph = compile(&TextMap::parse(TOWN), &legend).unwrap();
    let square = graph.find("T").unwrap();
    assert_eq!(square.exits().len(), 3);
    assert_eq!(
        square.find_exit("east").map(|e| e.destination()),
        graph.find("M").map(|r| r.id())
    );
}

#[test]
fn test_topology_error_is_transparent() {
    let err = MapError::from(TopologyError::NoRooms);
    assert_eq!(err.to_string(), "the room graph has no rooms");
}

#[test]
fn test_load_reads_file_and_reports_missing() {
    let path = std::env::temp_dir().join(format!("mudforge-map-{}.txt", std::process::id()));
    std::fs::write(&path, TOWN).unwrap();
    let map = TextMap::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(map.rooms().count(), 4);

    let err = TextMap::load(&path).unwrap_err();
    assert!(matches!(err, MapError::Io(_)));
}
