use std::collections::HashSet;

use ulid::Ulid;

use crate::model::*;

use super::conflict::{find_conflict, validate_range};
use super::{Engine, EngineError, SharedRoomState};

impl Engine {
    /// Pure read: true iff no active booking on the room overlaps the
    /// requested half-open range. The coarse unit counter is deliberately
    /// not consulted here — this is the range-aware signal only.
    pub async fn is_room_available(
        &self,
        room_id: Ulid,
        check_in: Ms,
        check_out: Ms,
    ) -> Result<bool, EngineError> {
        let span = validate_range(check_in, check_out)?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        Ok(find_conflict(&guard, &span, &self.bookings, None).is_none())
    }

    pub async fn list_rooms(&self, hotel_id: Option<Ulid>) -> Vec<RoomInfo> {
        let arcs: Vec<SharedRoomState> = match hotel_id {
            Some(hid) => {
                let ids = self
                    .rooms_by_hotel
                    .get(&hid)
                    .map(|e| e.value().clone())
                    .unwrap_or_default();
                ids.iter().filter_map(|id| self.get_room(id)).collect()
            }
            None => self.rooms.iter().map(|e| e.value().clone()).collect(),
        };

        let mut out = Vec::with_capacity(arcs.len());
        for rs_arc in arcs {
            let guard = rs_arc.read().await;
            out.push(RoomInfo::from_state(&guard));
        }
        out.sort_by_key(|r| r.id);
        out
    }

    pub fn bookings_for_guest(&self, guest_id: Ulid) -> Vec<BookingRecord> {
        let mut out: Vec<BookingRecord> = self
            .bookings
            .iter()
            .filter(|e| e.value().guest_id == guest_id)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|b| (b.span.start, b.id));
        out
    }

    /// Join through the stay links: every booking touching any room of the
    /// hotel, each reported once even when it spans several of them.
    pub async fn bookings_for_hotel(&self, hotel_id: Ulid) -> Vec<BookingRecord> {
        let room_ids = self
            .rooms_by_hotel
            .get(&hotel_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for rid in room_ids {
            let Some(rs_arc) = self.get_room(&rid) else {
                continue;
            };
            let guard = rs_arc.read().await;
            for stay in &guard.stays {
                if seen.insert(stay.booking_id)
                    && let Some(record) = self.get_booking_record(&stay.booking_id) {
                        out.push(record);
                    }
            }
        }
        out.sort_by_key(|b| (b.span.start, b.id));
        out
    }
}
