//! Headless driver: runs the room directory at the configured tick rate with
//! synthetic clients and writes every frame as a JSON line to stdout.

mod config;

use std::io::{self, Write};
use std::sync::PoisonError;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use kpn_core::config::GameMode;
use kpn_core::directory::{EventSink, RoomDirectory, TickFrame, PUBLIC_ROOM};
use kpn_core::entity::{ConnectionId, InputFrame};
use kpn_core::event::GameEvent;
use kpn_core::kind::Kind;
use kpn_core::room::RoomId;
use kpn_core::snapshot::Snapshot;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// =============================================================================
// Sink
// =============================================================================

#[derive(Serialize)]
struct FrameLine<'a> {
    room: &'a RoomId,
    tick: u64,
    events: &'a [GameEvent],
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<&'a Snapshot>,
}

/// Writes frames as JSON lines. Frames with nothing to say are skipped.
struct JsonLinesSink {
    snapshots: bool,
}

impl EventSink for JsonLinesSink {
    fn publish(&self, room: &RoomId, frame: TickFrame) {
        if frame.events.is_empty() && !self.snapshots {
            return;
        }
        let line = FrameLine {
            room,
            tick: frame.tick,
            events: &frame.events,
            snapshot: self.snapshots.then_some(&frame.snapshot),
        };
        let mut out = io::stdout().lock();
        let written = serde_json::to_writer(&mut out, &line)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(out));
        if let Err(e) = written {
            tracing::warn!(room = %room, error = %e, "failed to write frame");
        }
    }
}

// =============================================================================
// Synthetic clients
// =============================================================================

struct Client {
    connection: ConnectionId,
    room: RoomId,
    heading: f32,
}

fn connect_clients(directory: &RoomDirectory, count: usize) -> Result<Vec<Client>> {
    let hill = directory
        .create_room("Hill", GameMode::KingOfTheHill, None)
        .context("creating the king-of-the-hill room")?;
    let public = RoomId::new(PUBLIC_ROOM);
    let mut rng = rand::thread_rng();
    let mut clients = Vec::with_capacity(count);

    for i in 0..count {
        let connection = directory.connect();
        let room = if i % 2 == 0 { public.clone() } else { hill.clone() };
        let ack = directory
            .join(connection, &room, &format!("bot{i}"), None)
            .with_context(|| format!("joining {room}"))?;
        if let Some(&kind) = Kind::CYCLIC.choose(&mut rng) {
            directory.set_kind(connection, kind)?;
        }
        if ack.host {
            tracing::debug!(%connection, room = %room, "synthetic host");
        }
        clients.push(Client {
            connection,
            room,
            heading: rng.gen::<f32>() * std::f32::consts::TAU,
        });
    }
    Ok(clients)
}

/// What a client sees of its own room between ticks.
struct Outlook {
    host_idle: bool,
    pending_perk: bool,
}

fn outlook(directory: &RoomDirectory, client: &Client) -> Option<Outlook> {
    let handle = directory.room(&client.room)?;
    let room = handle.lock().unwrap_or_else(PoisonError::into_inner);
    let pending_perk = room
        .player(client.connection)
        .and_then(|p| p.as_player())
        .is_some_and(|p| p.pending_perk);
    Some(Outlook {
        host_idle: room.host() == Some(client.connection) && !room.is_running(),
        pending_perk,
    })
}

fn drive_clients(directory: &RoomDirectory, clients: &mut [Client], tick: u64) {
    let mut rng = rand::thread_rng();
    for client in clients.iter_mut() {
        client.heading += rng.gen_range(-0.3..0.3);
        let input = InputFrame::new(
            client.heading.cos(),
            client.heading.sin(),
            rng.gen_bool(0.02),
            rng.gen_bool(0.01),
        );
        let _ = directory.input(client.connection, input);

        if rng.gen_bool(0.001) {
            let _ = directory.emote(client.connection, "wave");
        }

        if tick % 30 != 0 {
            continue;
        }
        let Some(outlook) = outlook(directory, client) else {
            continue;
        };
        if outlook.host_idle {
            let _ = directory.start(client.connection);
        }
        if outlook.pending_perk {
            if let Some(perk) = directory.config().perks.choose(&mut rng) {
                let _ = directory.select_perk(client.connection, perk.id.as_str());
            }
        }
    }
}

// =============================================================================
// Main loop
// =============================================================================

fn main() -> Result<()> {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let arena_config = config::load_arena_config()?;
    let tick_rate = arena_config.tick_rate;
    let ticks = config::ticks();
    let bots = config::bots();
    let realtime = config::realtime();

    let directory = RoomDirectory::new(arena_config).context("invalid arena config")?;
    let mut clients = connect_clients(&directory, bots)?;
    tracing::info!(bots, ticks, tick_rate, realtime, "headless driver starting");

    let sink = JsonLinesSink {
        snapshots: config::snapshots(),
    };
    let interval = Duration::from_secs(1) / tick_rate;
    let mut deadline = Instant::now();
    let mut tick = 0_u64;

    loop {
        tick += 1;
        drive_clients(&directory, &mut clients, tick);
        directory.tick_all(&sink);

        if tick % u64::from(tick_rate.max(1) * 10) == 0 {
            for room in directory.list() {
                tracing::info!(room = %room.id, players = room.players, mode = %room.mode, "room status");
            }
        }
        if ticks > 0 && tick >= ticks {
            break;
        }
        if realtime {
            deadline += interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
    }

    for client in &clients {
        directory.leave(client.connection);
    }
    tracing::info!(tick, rooms = directory.room_count(), "headless driver finished");
    Ok(())
}
