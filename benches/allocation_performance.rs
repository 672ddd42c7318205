//! Performance benchmarks for the allocation path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matchmaker::config::MatchmakingSettings;
use matchmaker::engine::{select_candidate, Matchmaker};
use matchmaker::types::{EnqueuePlayer, GameServer, Player, RegisterServer};
use matchmaker::utils::current_timestamp;

fn registration(index: usize, max_players: u32) -> RegisterServer {
    RegisterServer {
        game_mode: "GM".to_string(),
        region: if index % 2 == 0 { "EU" } else { "US" }.to_string(),
        version: "1.0".to_string(),
        address: format!("10.0.{}.{}", index / 250, index % 250),
        port: 7777,
        max_players,
    }
}

fn enqueue_request(player_id: &str) -> EnqueuePlayer {
    EnqueuePlayer {
        player_id: player_id.to_string(),
        game_mode: "GM".to_string(),
        region: "EU".to_string(),
        version: "1.0".to_string(),
        ticket: None,
    }
}

/// Engine with `servers` registered servers, half of them eligible
async fn create_bench_system(servers: usize) -> Matchmaker {
    let matchmaker = Matchmaker::in_memory(MatchmakingSettings::default());
    for i in 0..servers {
        let _ = matchmaker.register(registration(i, 64)).await;
    }
    matchmaker
}

fn bench_select_candidate(c: &mut Criterion) {
    let now = current_timestamp();
    let servers: Vec<GameServer> = (0..1000)
        .map(|i| {
            let mut server = GameServer::from_registration(format!("s{}", i), &registration(i, 8), now);
            for p in 0..(i % 8) {
                server.players.insert(format!("p{}-{}", i, p));
            }
            server
        })
        .collect();

    let mut player = Player::new("bench_player".to_string());
    player.apply_enqueue(&enqueue_request("bench_player"));

    c.bench_function("select_candidate_1000_servers", |b| {
        b.iter(|| black_box(select_candidate(&servers, &player)))
    });
}

fn bench_enqueue_and_poll(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("enqueue_and_poll");

    for servers in [10usize, 100, 500] {
        let matchmaker = rt.block_on(create_bench_system(servers));
        let mut n = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(servers), &servers, |b, _| {
            b.iter(|| {
                n += 1;
                let player_id = format!("player_{}", n);
                rt.block_on(async {
                    let _ = matchmaker.enqueue(enqueue_request(&player_id)).await;
                    let outcome = matchmaker.poll_matchmaking(&player_id).await;
                    // Free the seat so the pool never fills up
                    let _ = matchmaker.dequeue(&player_id).await;
                    black_box(outcome)
                })
            })
        });
    }

    group.finish();
}

fn bench_fast_path_poll(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let matchmaker = rt.block_on(async {
        let matchmaker = create_bench_system(100).await;
        let _ = matchmaker.enqueue(enqueue_request("seated")).await;
        let _ = matchmaker.poll_matchmaking("seated").await;
        matchmaker
    });

    c.bench_function("poll_already_matched", |b| {
        b.iter(|| rt.block_on(async { black_box(matchmaker.poll_matchmaking("seated").await) }))
    });
}

criterion_group!(
    benches,
    bench_select_candidate,
    bench_enqueue_and_poll,
    bench_fast_path_poll
);
criterion_main!(benches);
