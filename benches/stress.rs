use std::time::{Duration, Instant};

use tokio_postgres::{Config, NoTls};
use ulid::Ulid;

const DAY_MS: i64 = 86_400_000;

async fn connect(host: &str, port: u16, db: &str, user: &str) -> tokio_postgres::Client {
    let mut config = Config::new();
    config
        .host(host)
        .port(port)
        .dbname(db)
        .user(user)
        .password("stayd");

    let (client, conn) = config.connect(NoTls).await.expect("connect failed");
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            eprintln!("connection error: {e}");
        }
    });
    client
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn admin_user() -> String {
    format!("admin_{}", Ulid::new())
}

fn bench_db(phase: &str) -> String {
    format!("bench_{phase}_{}", Ulid::new())
}

async fn setup_rooms(client: &tokio_postgres::Client, count: usize, total_rooms: u32) -> Vec<Ulid> {
    let hotel = Ulid::new();
    let room_type = Ulid::new();
    let mut rooms = Vec::with_capacity(count);

    for _ in 0..count {
        let rid = Ulid::new();
        client
            .batch_execute(&format!(
                "INSERT INTO rooms (id, hotel_id, room_type_id, name, price_per_night, total_rooms, max_per_booking) VALUES ('{rid}', '{hotel}', '{room_type}', NULL, 15000, {total_rooms}, 1)"
            ))
            .await
            .unwrap();
        rooms.push(rid);
    }

    println!("  created {count} rooms (capacity {total_rooms})");
    rooms
}

/// Phase 1: sequential booking inserts on one connection, disjoint ranges.
async fn phase1_sequential(host: &str, port: u16) {
    let db = bench_db("seq");
    let client = connect(host, port, &db, &admin_user()).await;
    let rooms = setup_rooms(&client, 1, 10_000).await;
    let rid = rooms[0];

    let base = now_ms() + 10 * DAY_MS;
    let mut latencies = Vec::with_capacity(500);

    for i in 0..500i64 {
        let gid = Ulid::new();
        let check_in = base + i * 3 * DAY_MS;
        let check_out = check_in + 2 * DAY_MS;
        let start = Instant::now();
        client
            .batch_execute(&format!(
                "INSERT INTO bookings (id, guest_id, check_in, check_out, room_id) VALUES ('{}', '{gid}', {check_in}, {check_out}, '{rid}')",
                Ulid::new()
            ))
            .await
            .unwrap();
        latencies.push(start.elapsed());
    }

    print_latency("sequential inserts", &mut latencies);
}

/// Phase 2: concurrent writers hammering the same room with the same
/// ranges — exactly one booking per range wins, the rest conflict.
async fn phase2_contention(host: &str, port: u16) {
    let db = bench_db("contend");
    let admin = connect(host, port, &db, &admin_user()).await;
    // Plenty of units: every loss below is a range conflict, not the counter.
    let rooms = setup_rooms(&admin, 1, 10_000).await;
    let rid = rooms[0];
    let base = now_ms() + 10 * DAY_MS;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let host = host.to_string();
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let client = connect(&host, port, &db, &admin_user()).await;
            let mut wins = 0u32;
            let mut conflicts = 0u32;
            for round in 0..50i64 {
                let gid = Ulid::new();
                let check_in = base + round * 3 * DAY_MS;
                let check_out = check_in + 2 * DAY_MS;
                let result = client
                    .batch_execute(&format!(
                        "INSERT INTO bookings (id, guest_id, check_in, check_out, room_id) VALUES ('{}', '{gid}', {check_in}, {check_out}, '{rid}')",
                        Ulid::new()
                    ))
                    .await;
                match result {
                    Ok(_) => wins += 1,
                    Err(_) => conflicts += 1,
                }
            }
            (wins, conflicts)
        }));
    }

    let mut total_wins = 0;
    let mut total_conflicts = 0;
    for handle in handles {
        let (w, c) = handle.await.unwrap();
        total_wins += w;
        total_conflicts += c;
    }
    println!("  contention: {total_wins} wins, {total_conflicts} conflicts (16 writers, one winner per range)");
}

/// Phase 3: availability probes against a room loaded with stays.
async fn phase3_probes(host: &str, port: u16) {
    let db = bench_db("probe");
    let client = connect(host, port, &db, &admin_user()).await;
    let rooms = setup_rooms(&client, 1, 10_000).await;
    let rid = rooms[0];

    let base = now_ms() + 10 * DAY_MS;
    for i in 0..200i64 {
        let gid = Ulid::new();
        let check_in = base + i * 3 * DAY_MS;
        client
            .batch_execute(&format!(
                "INSERT INTO bookings (id, guest_id, check_in, check_out, room_id) VALUES ('{}', '{gid}', {check_in}, {}, '{rid}')",
                Ulid::new(),
                check_in + 2 * DAY_MS
            ))
            .await
            .unwrap();
    }

    let mut latencies = Vec::with_capacity(1000);
    for i in 0..1000i64 {
        let check_in = base + (i % 300) * 3 * DAY_MS;
        let start = Instant::now();
        client
            .simple_query(&format!(
                "SELECT * FROM availability WHERE room_id = '{rid}' AND check_in >= {check_in} AND check_out <= {}",
                check_in + 2 * DAY_MS
            ))
            .await
            .unwrap();
        latencies.push(start.elapsed());
    }

    print_latency("availability probes (200 stays on room)", &mut latencies);
}

#[tokio::main]
async fn main() {
    let host = std::env::var("STAYD_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("STAYD_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5433);

    println!("stayd stress against {host}:{port}");

    println!("phase 1: sequential booking inserts");
    phase1_sequential(&host, port).await;

    println!("phase 2: write contention on one room");
    phase2_contention(&host, port).await;

    println!("phase 3: availability probes");
    phase3_probes(&host, port).await;
}
