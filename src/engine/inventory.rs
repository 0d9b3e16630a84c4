use ulid::Ulid;

use crate::model::*;

use super::EngineError;

/// Definition-time inventory invariants. The counter ops below clamp
/// instead, so these are checked only when a room is created or updated.
pub(crate) fn validate_inventory(
    total_rooms: u32,
    max_per_booking: u32,
) -> Result<(), EngineError> {
    if total_rooms == 0 {
        return Err(EngineError::Validation("total_rooms must be at least 1"));
    }
    if max_per_booking == 0 {
        return Err(EngineError::Validation("max_per_booking must be at least 1"));
    }
    if max_per_booking > total_rooms {
        return Err(EngineError::Validation(
            "max_per_booking must not exceed total_rooms",
        ));
    }
    Ok(())
}

impl RoomState {
    pub fn has_vacant_unit(&self) -> bool {
        self.available_rooms > 0
    }

    /// Consume one unit: decrement `available_rooms` (never below 0) and
    /// drop `is_available` when the counter reaches 0.
    pub(crate) fn occupy_unit(&mut self) {
        self.available_rooms = self.available_rooms.saturating_sub(1);
        if self.available_rooms == 0 {
            self.is_available = false;
        }
    }

    /// Return one unit: increment `available_rooms` (never above
    /// `total_rooms`) and raise `is_available` when the counter is positive.
    pub(crate) fn release_unit(&mut self) {
        if self.available_rooms < self.total_rooms {
            self.available_rooms += 1;
        }
        if self.available_rooms > 0 {
            self.is_available = true;
        }
    }

    /// Re-derive counters after `total_rooms` changes under live links.
    pub(crate) fn resync_counters(&mut self) {
        let occupied = self.stays.len() as u32;
        self.available_rooms = self.total_rooms.saturating_sub(occupied);
        self.is_available = self.available_rooms > 0;
    }
}

/// Attach a stay link and consume a unit, as one step. The junction write
/// and the counter update always travel together.
pub(crate) fn link_room(rs: &mut RoomState, booking_id: Ulid, span: Span) {
    rs.insert_stay(StayLink { booking_id, span });
    rs.occupy_unit();
}

/// Detach a stay link and return its unit. No-op if the link is absent.
pub(crate) fn unlink_room(rs: &mut RoomState, booking_id: Ulid) {
    if rs.remove_stay(booking_id).is_some() {
        rs.release_unit();
    }
}
