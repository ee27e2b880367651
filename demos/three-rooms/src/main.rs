//! A tiny world of three rooms.
//!
//! ```text
//! cargo run -p three-rooms [config.json]
//! telnet 127.0.0.1 4000
//! ```

use mudforge::prelude::*;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

const MAP: &str = "\
  E
  |
S-R";

const LEGEND: &str = r#"{
    "rooms": {
        "R": { "name": "Start Room", "description": "This room sucks. Really bad. Wow!" },
        "E": { "name": "End Room", "description": "This room is marginally better. Maybe." },
        "S": { "name": "Side Room", "description": "This room is unimportant. Go away." }
    },
    "start": "R",
    "strict": true
}"#;

fn build_world() -> Result<RoomGraph, Box<dyn std::error::Error>> {
    let legend: Legend = serde_json::from_str(LEGEND)?;
    Ok(compile(&TextMap::parse(MAP), &legend)?)
}

/// The standard commands plus a couple of emotes.
fn commands() -> Result<CommandTable, MudError> {
    let mut table = CommandTable::standard();
    table.bind_custom("wave", |ctx: &ActionContext<'_>, _args: &str| {
        let Some(room) = ctx.mob.location() else {
            return false;
        };
        ctx.mob.tell("You wave.");
        ctx.world
            .broadcast_except(&format!("{} waves.", ctx.mob.name()), room.id(), ctx.mob.id());
        true
    })?;
    table.alias("hi", "wave")?;
    Ok(table)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let transport = config.transport;
    let builder = MudServer::builder()
        .config(config)
        .graph(build_world()?)
        .commands(commands()?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    match transport {
        TransportKind::Telnet => builder.build().await?.run_until(shutdown).await?,
        TransportKind::WebSocket => builder.build_websocket().await?.run_until(shutdown).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_world_compiles() {
        let graph = build_world().unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.start().name(), "Start Room");
        assert_eq!(graph.start().list_exits(), "Visible Exits: north, west");
    }

    #[test]
    fn test_commands_include_wave() {
        let table = commands().unwrap();
        assert!(table.resolve("wave").is_some());
        assert!(table.resolve("HI").is_some());
        assert!(table.resolve("look").is_some());
    }
}
