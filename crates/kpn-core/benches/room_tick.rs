use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use kpn_core::config::{ArenaConfig, GameMode};
use kpn_core::entity::{ConnectionId, InputFrame};
use kpn_core::room::{Room, RoomId, RoomSettings};

/// A running room with `players` moving in a circle and a full bot roster.
fn busy_room(players: u64, mode: GameMode) -> Room {
    let mut config = ArenaConfig::default();
    // Keep the match running for the whole measurement
    config.match_rules.win_score = u32::MAX;
    let config = Arc::new(config);
    let settings = RoomSettings {
        mode,
        capacity: 30,
        ..RoomSettings::default()
    };
    let mut room = Room::with_seed(RoomId::new("bench"), "Bench", settings, config, 1)
        .expect("default config is valid");
    for i in 0..players {
        let connection = ConnectionId::new(i + 1);
        room.join(connection, &format!("bot{i}"), None).expect("room has space");
    }
    room.start(ConnectionId::new(1)).expect("host starts");
    // Let the bot roster fill up
    for _ in 0..2000 {
        room.tick();
        room.drain_events();
    }
    room
}

fn steer(room: &mut Room, players: u64, tick: u64) {
    for i in 0..players {
        #[allow(clippy::cast_precision_loss)]
        let angle = (tick + i * 7) as f32 * 0.05;
        let input = InputFrame::new(angle.cos(), angle.sin(), tick % 90 == i, tick % 300 == i);
        let _ = room.set_input(ConnectionId::new(i + 1), input);
    }
}

fn bench_tick(c: &mut Criterion) {
    for (label, mode) in [
        ("room_tick_territorial_20p", GameMode::Territorial),
        ("room_tick_koth_20p", GameMode::KingOfTheHill),
    ] {
        let mut room = busy_room(20, mode);
        let mut tick = 0;
        c.bench_function(label, |b| {
            b.iter(|| {
                tick += 1;
                steer(&mut room, 20, tick);
                room.tick();
                black_box(room.drain_events().len())
            })
        });
    }
}

fn bench_snapshot(c: &mut Criterion) {
    let room = busy_room(20, GameMode::Territorial);
    c.bench_function("room_snapshot_json_20p", |b| {
        b.iter(|| black_box(room.snapshot().to_json().map(|s| s.len())))
    });
}

fn bench_reset(c: &mut Criterion) {
    let room = busy_room(20, GameMode::Territorial);
    c.bench_function("room_reset_20p", |b| {
        b.iter_batched(
            || {
                let mut r = Room::with_seed(
                    RoomId::new("reset"),
                    "Reset",
                    room.settings().clone(),
                    Arc::new(room.config().clone()),
                    2,
                )
                .expect("default config is valid");
                for i in 0..20 {
                    let _ = r.join(ConnectionId::new(i + 1), "p", None);
                }
                r
            },
            |mut r| {
                r.reset();
                black_box(r.arena().orbs().len())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_tick, bench_snapshot, bench_reset);
criterion_main!(benches);
