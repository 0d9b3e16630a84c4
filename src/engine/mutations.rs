use std::sync::Arc;

use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::{check_room_free, now_ms, validate_range};
use super::guard::{ensure_lead_time, ensure_outside_lock_window, resolve_for_caller, Principal};
use super::inventory::{link_room, unlink_room, validate_inventory};
use super::{Engine, EngineError};

impl Engine {
    // ── Room inventory ───────────────────────────────────────

    pub async fn create_room(
        &self,
        id: Ulid,
        hotel_id: Ulid,
        room_type_id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    ) -> Result<(), EngineError> {
        if self.rooms.len() >= MAX_ROOMS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN {
                return Err(EngineError::LimitExceeded("room name too long"));
            }
        if price_per_night < 0 {
            return Err(EngineError::Validation("price_per_night must not be negative"));
        }
        validate_inventory(total_rooms, max_per_booking)?;
        if self.rooms.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let event = Event::RoomCreated {
            id,
            hotel_id,
            room_type_id,
            name: name.clone(),
            price_per_night,
            total_rooms,
            max_per_booking,
        };
        self.wal_append(&event).await?;
        let rs = RoomState::new(
            id,
            hotel_id,
            room_type_id,
            name,
            price_per_night,
            total_rooms,
            max_per_booking,
        );
        self.rooms.insert(id, Arc::new(RwLock::new(rs)));
        self.rooms_by_hotel.entry(hotel_id).or_default().push(id);
        self.notify.send(id, &event);
        Ok(())
    }

    pub async fn update_room(
        &self,
        id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    ) -> Result<(), EngineError> {
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN {
                return Err(EngineError::LimitExceeded("room name too long"));
            }
        if price_per_night < 0 {
            return Err(EngineError::Validation("price_per_night must not be negative"));
        }
        validate_inventory(total_rooms, max_per_booking)?;
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let mut guard = rs.write().await;

        let event = Event::RoomUpdated {
            id,
            name: name.clone(),
            price_per_night,
            total_rooms,
            max_per_booking,
        };
        self.wal_append(&event).await?;
        guard.name = name;
        guard.price_per_night = price_per_night;
        guard.total_rooms = total_rooms;
        guard.max_per_booking = max_per_booking;
        guard.resync_counters();
        self.notify.send(id, &event);
        Ok(())
    }

    pub async fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.write().await;
        if !guard.stays.is_empty() {
            return Err(EngineError::RoomOccupied(id));
        }
        let hotel_id = guard.hotel_id;
        drop(guard);

        let event = Event::RoomDeleted { id };
        self.wal_append(&event).await?;
        if let Some(mut rooms) = self.rooms_by_hotel.get_mut(&hotel_id) {
            rooms.retain(|r| r != &id);
        }
        self.rooms.remove(&id);
        self.notify.send(id, &event);
        Ok(())
    }

    // ── Booking aggregate ────────────────────────────────────

    /// Create a booking spanning one or more rooms. All-or-nothing: every
    /// room is conflict-checked and must have a vacant unit while all the
    /// room locks are held; only then is the event committed and every
    /// link + counter applied.
    pub async fn create_booking(
        &self,
        caller: Principal,
        id: Ulid,
        guest_id: Ulid,
        room_ids: Vec<Ulid>,
        check_in: Ms,
        check_out: Ms,
    ) -> Result<BookingRecord, EngineError> {
        if let Principal::Guest(g) = caller
            && g != guest_id {
                return Err(EngineError::Validation("guests may only book for themselves"));
            }
        let span = validate_range(check_in, check_out)?;
        let now = now_ms();
        ensure_lead_time(span.start, now)?;

        if room_ids.is_empty() {
            return Err(EngineError::Validation("a booking needs at least one room"));
        }
        if room_ids.len() > MAX_ROOMS_PER_BOOKING {
            return Err(EngineError::LimitExceeded("too many rooms in one booking"));
        }
        let mut sorted = room_ids;
        sorted.sort();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(EngineError::Validation("a room may appear only once per booking"));
        }
        if self.bookings.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        // Locks in sorted id order, held across check and commit.
        let mut guards = self.lock_rooms_sorted(&sorted).await?;

        for guard in &guards {
            if guard.stays.len() >= MAX_STAYS_PER_ROOM {
                return Err(EngineError::LimitExceeded("too many stays on room"));
            }
            // Range-aware check first: overlap is a conflict naming the room.
            check_room_free(guard, &span, &self.bookings, None)?;
            // Then the range-unaware unit counter.
            if !guard.has_vacant_unit() {
                return Err(EngineError::NoVacancy(guard.id));
            }
        }

        let event = Event::BookingCreated {
            id,
            guest_id,
            span,
            room_ids: sorted.clone(),
        };
        self.wal_append(&event).await?;

        let record = BookingRecord {
            id,
            guest_id,
            span,
            status: BookingStatus::Pending,
            room_ids: sorted,
        };
        self.bookings.insert(id, record.clone());
        for guard in &mut guards {
            link_room(guard, id, span);
            self.notify.send(guard.id, &event);
        }
        Ok(record)
    }

    /// Move a booking to a new date range. Owning guest only — admins
    /// approve and deny, they do not rewrite guest-owned ranges.
    pub async fn reschedule_booking(
        &self,
        caller: Principal,
        id: Ulid,
        check_in: Ms,
        check_out: Ms,
    ) -> Result<BookingRecord, EngineError> {
        if caller.is_admin() {
            return Err(EngineError::Validation(
                "date changes are reserved to the owning guest",
            ));
        }
        let record = resolve_for_caller(self.get_booking_record(&id), id, &caller)?;

        let now = now_ms();
        ensure_outside_lock_window(record.span.start, now)?;
        let span = validate_range(check_in, check_out)?;
        ensure_lead_time(span.start, now)?;

        let mut guards = self.lock_rooms_sorted(&record.room_ids).await?;

        // Re-check under the locks: the booking may have been cancelled
        // between the ownership lookup and lock acquisition.
        if !self.bookings.contains_key(&id) {
            return Err(EngineError::NotFound(id));
        }

        for guard in &guards {
            // The booking's own links are excluded from the scan.
            check_room_free(guard, &span, &self.bookings, Some(id))?;
        }

        let event = Event::BookingRescheduled { id, span };
        self.wal_append(&event).await?;

        for guard in &mut guards {
            if guard.remove_stay(id).is_some() {
                guard.insert_stay(StayLink {
                    booking_id: id,
                    span,
                });
            }
            self.notify.send(guard.id, &event);
        }
        let mut updated = record;
        updated.span = span;
        if let Some(mut entry) = self.bookings.get_mut(&id) {
            entry.span = span;
        }
        Ok(updated)
    }

    /// Admin-only status transition. `Pending` is the only state with
    /// outgoing edges; `Confirmed` and `Denied` are terminal.
    pub async fn set_booking_status(
        &self,
        caller: Principal,
        id: Ulid,
        status: BookingStatus,
    ) -> Result<BookingRecord, EngineError> {
        if !caller.is_admin() {
            return Err(EngineError::Validation("status transitions require admin"));
        }
        let record = self
            .get_booking_record(&id)
            .ok_or(EngineError::NotFound(id))?;
        if record.status != BookingStatus::Pending || status == BookingStatus::Pending {
            return Err(EngineError::Validation(
                "only pending bookings can be confirmed or denied",
            ));
        }

        let event = Event::BookingStatusSet { id, status };
        self.wal_append(&event).await?;

        let mut updated = record;
        updated.status = status;
        if let Some(mut entry) = self.bookings.get_mut(&id) {
            entry.status = status;
        }
        for rid in &updated.room_ids {
            self.notify.send(*rid, &event);
        }
        Ok(updated)
    }

    /// Cancel (delete) a booking, cascading its room links and returning
    /// every consumed unit. Guests are bound to the edit window and to
    /// their own bookings; admins to neither.
    pub async fn cancel_booking(&self, caller: Principal, id: Ulid) -> Result<(), EngineError> {
        let record = resolve_for_caller(self.get_booking_record(&id), id, &caller)?;
        if !caller.is_admin() {
            ensure_outside_lock_window(record.span.start, now_ms())?;
        }

        let mut guards = self.lock_rooms_sorted(&record.room_ids).await?;

        // Re-check under the locks — a concurrent cancel may have won.
        if self.bookings.get(&id).is_none() {
            return Err(EngineError::NotFound(id));
        }

        let event = Event::BookingCancelled { id };
        self.wal_append(&event).await?;

        self.bookings.remove(&id);
        for guard in &mut guards {
            unlink_room(guard, id);
            self.notify.send(guard.id, &event);
        }
        Ok(())
    }
}
