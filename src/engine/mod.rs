mod conflict;
mod error;
mod guard;
mod inventory;
mod mutations;
mod queries;

pub use error::EngineError;
pub use guard::Principal;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::wal::Wal;

use inventory::{link_room, unlink_room};

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                // Drain all immediately available appends
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush current batch first, then handle the non-append command
                            metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
                                .record(batch.len() as f64);
                            let flush_start = std::time::Instant::now();
                            let result = flush_batch(&mut wal, &mut batch);
                            metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
                                .record(flush_start.elapsed().as_secs_f64());
                            respond_batch(&mut batch, &result);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty — flush batch
                    }
                }

                if !batch.is_empty() {
                    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
                        .record(batch.len() as f64);
                    let flush_start = std::time::Instant::now();
                    let result = flush_batch(&mut wal, &mut batch);
                    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
                        .record(flush_start.elapsed().as_secs_f64());
                    respond_batch(&mut batch, &result);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_batch(wal: &mut Wal, batch: &mut [(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// One tenant's reservation engine: per-room state behind async RwLocks,
/// a booking registry, and a WAL for durability. The per-room write locks
/// are the mutual-exclusion mechanism that makes check-then-write atomic.
pub struct Engine {
    pub rooms: DashMap<Ulid, SharedRoomState>,
    pub(super) bookings: DashMap<Ulid, BookingRecord>,
    /// Hotel → rooms index for O(1) hotel-scoped queries.
    pub(super) rooms_by_hotel: DashMap<Ulid, Vec<Ulid>>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    pub fn new(wal_path: PathBuf, notify: Arc<NotifyHub>) -> std::io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            rooms: DashMap::new(),
            bookings: DashMap::new(),
            rooms_by_hotel: DashMap::new(),
            wal_tx,
            notify,
        };

        // Replay events — we're the sole owner of these Arcs, so try_write
        // always succeeds instantly (no contention). Never use blocking_write
        // here because this may run inside an async context (e.g. lazy tenant
        // creation).
        for event in &events {
            match event {
                Event::RoomCreated {
                    id,
                    hotel_id,
                    room_type_id,
                    name,
                    price_per_night,
                    total_rooms,
                    max_per_booking,
                } => {
                    let rs = RoomState::new(
                        *id,
                        *hotel_id,
                        *room_type_id,
                        name.clone(),
                        *price_per_night,
                        *total_rooms,
                        *max_per_booking,
                    );
                    engine.rooms.insert(*id, Arc::new(RwLock::new(rs)));
                    engine.rooms_by_hotel.entry(*hotel_id).or_default().push(*id);
                }
                Event::RoomUpdated {
                    id,
                    name,
                    price_per_night,
                    total_rooms,
                    max_per_booking,
                } => {
                    if let Some(entry) = engine.rooms.get(id) {
                        let rs_arc = entry.value().clone();
                        let mut rs = rs_arc.try_write().expect("replay: uncontended write");
                        rs.name = name.clone();
                        rs.price_per_night = *price_per_night;
                        rs.total_rooms = *total_rooms;
                        rs.max_per_booking = *max_per_booking;
                        rs.resync_counters();
                    }
                }
                Event::RoomDeleted { id } => {
                    if let Some(entry) = engine.rooms.get(id) {
                        let rs = entry.try_read().expect("replay: uncontended read");
                        if let Some(mut rooms) = engine.rooms_by_hotel.get_mut(&rs.hotel_id) {
                            rooms.retain(|r| r != id);
                        }
                    }
                    engine.rooms.remove(id);
                }
                Event::BookingCreated {
                    id,
                    guest_id,
                    span,
                    room_ids,
                } => {
                    engine.bookings.insert(
                        *id,
                        BookingRecord {
                            id: *id,
                            guest_id: *guest_id,
                            span: *span,
                            status: BookingStatus::Pending,
                            room_ids: room_ids.clone(),
                        },
                    );
                    for rid in room_ids {
                        if let Some(entry) = engine.rooms.get(rid) {
                            let rs_arc = entry.value().clone();
                            let mut rs = rs_arc.try_write().expect("replay: uncontended write");
                            link_room(&mut rs, *id, *span);
                        }
                    }
                }
                Event::BookingRescheduled { id, span } => {
                    if let Some(mut record) = engine.bookings.get_mut(id) {
                        record.span = *span;
                        for rid in record.room_ids.clone() {
                            if let Some(entry) = engine.rooms.get(&rid) {
                                let rs_arc = entry.value().clone();
                                let mut rs =
                                    rs_arc.try_write().expect("replay: uncontended write");
                                if rs.remove_stay(*id).is_some() {
                                    rs.insert_stay(StayLink {
                                        booking_id: *id,
                                        span: *span,
                                    });
                                }
                            }
                        }
                    }
                }
                Event::BookingStatusSet { id, status } => {
                    if let Some(mut record) = engine.bookings.get_mut(id) {
                        record.status = *status;
                    }
                }
                Event::BookingCancelled { id } => {
                    if let Some((_, record)) = engine.bookings.remove(id) {
                        for rid in &record.room_ids {
                            if let Some(entry) = engine.rooms.get(rid) {
                                let rs_arc = entry.value().clone();
                                let mut rs =
                                    rs_arc.try_write().expect("replay: uncontended write");
                                unlink_room(&mut rs, *id);
                            }
                        }
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn get_booking_record(&self, id: &Ulid) -> Option<BookingRecord> {
        self.bookings.get(id).map(|e| e.value().clone())
    }

    /// Acquire write locks on the given rooms in ascending id order so two
    /// overlapping multi-room bookings can never deadlock. `room_ids` must
    /// be sorted and deduplicated. Fails fast on the first unknown room.
    pub(super) async fn lock_rooms_sorted(
        &self,
        room_ids: &[Ulid],
    ) -> Result<Vec<OwnedRwLockWriteGuard<RoomState>>, EngineError> {
        debug_assert!(room_ids.windows(2).all(|w| w[0] < w[1]));
        let mut guards = Vec::with_capacity(room_ids.len());
        for rid in room_ids {
            let rs = self.get_room(rid).ok_or(EngineError::NotFound(*rid))?;
            guards.push(rs.write_owned().await);
        }
        Ok(guards)
    }

    /// Compact the WAL by rewriting it with only the events needed to
    /// recreate the current state: one RoomCreated per room, then one
    /// BookingCreated (+ BookingStatusSet where non-Pending) per booking.
    /// Counters are not snapshotted — replaying the links re-derives them.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let mut events = Vec::new();

        // Clone the Arcs out first — never await while holding a shard lock.
        let room_arcs: Vec<SharedRoomState> =
            self.rooms.iter().map(|e| e.value().clone()).collect();
        for rs_arc in room_arcs {
            let rs = rs_arc.read().await;
            events.push(Event::RoomCreated {
                id: rs.id,
                hotel_id: rs.hotel_id,
                room_type_id: rs.room_type_id,
                name: rs.name.clone(),
                price_per_night: rs.price_per_night,
                total_rooms: rs.total_rooms,
                max_per_booking: rs.max_per_booking,
            });
        }

        for entry in self.bookings.iter() {
            let record = entry.value();
            events.push(Event::BookingCreated {
                id: record.id,
                guest_id: record.guest_id,
                span: record.span,
                room_ids: record.room_ids.clone(),
            });
            if record.status != BookingStatus::Pending {
                events.push(Event::BookingStatusSet {
                    id: record.id,
                    status: record.status,
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
