use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open stay interval `[check_in, check_out)`. Back-to-back stays
/// (checkout day == next check-in day) do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[allow(dead_code)]
    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Booking lifecycle. Created as `Pending`; an admin moves it to
/// `Confirmed` or `Denied`, both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Denied,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Denied => "Denied",
        }
    }

    /// Only the three canonical values are accepted; anything else
    /// (including the legacy `Reserved`/`No Reservation` strings) fails.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "denied" => Some(BookingStatus::Denied),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One junction link: this room is reserved by `booking_id` for `span`.
/// A room appears at most once per booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayLink {
    pub booking_id: Ulid,
    pub span: Span,
}

/// Per-room state: reference attributes, whole-unit inventory counters,
/// and the stay links currently attached to the room.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_type_id: Ulid,
    pub name: Option<String>,
    /// Nightly price in minor currency units.
    pub price_per_night: i64,
    /// How many physical units of this room class exist.
    pub total_rooms: u32,
    /// Units not currently consumed by a stay link. Always `<= total_rooms`.
    pub available_rooms: u32,
    /// Cap on units of this class per booking; validated at definition time.
    pub max_per_booking: u32,
    /// Mirrors `available_rooms > 0`.
    pub is_available: bool,
    /// All stay links, sorted by `span.start`.
    pub stays: Vec<StayLink>,
}

impl RoomState {
    pub fn new(
        id: Ulid,
        hotel_id: Ulid,
        room_type_id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    ) -> Self {
        Self {
            id,
            hotel_id,
            room_type_id,
            name,
            price_per_night,
            total_rooms,
            available_rooms: total_rooms,
            max_per_booking,
            is_available: total_rooms > 0,
            stays: Vec::new(),
        }
    }

    /// Insert a stay link maintaining sort order by span.start.
    pub fn insert_stay(&mut self, stay: StayLink) {
        let pos = self
            .stays
            .binary_search_by_key(&stay.span.start, |s| s.span.start)
            .unwrap_or_else(|e| e);
        self.stays.insert(pos, stay);
    }

    /// Remove the link for `booking_id`, if present.
    pub fn remove_stay(&mut self, booking_id: Ulid) -> Option<StayLink> {
        if let Some(pos) = self.stays.iter().position(|s| s.booking_id == booking_id) {
            Some(self.stays.remove(pos))
        } else {
            None
        }
    }

    pub fn has_stay(&self, booking_id: Ulid) -> bool {
        self.stays.iter().any(|s| s.booking_id == booking_id)
    }

    /// Return only stay links whose span overlaps the query window.
    /// Uses binary search to skip links starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &StayLink> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self.stays.partition_point(|s| s.span.start < query.end);
        self.stays[..right_bound]
            .iter()
            .filter(move |s| s.span.end > query.start)
    }
}

/// One reservation: a guest, one date range, one or more rooms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    pub id: Ulid,
    pub guest_id: Ulid,
    pub span: Span,
    pub status: BookingStatus,
    /// Sorted, deduplicated room ids.
    pub room_ids: Vec<Ulid>,
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: Ulid,
        hotel_id: Ulid,
        room_type_id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    },
    RoomUpdated {
        id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    },
    RoomDeleted {
        id: Ulid,
    },
    BookingCreated {
        id: Ulid,
        guest_id: Ulid,
        span: Span,
        room_ids: Vec<Ulid>,
    },
    BookingRescheduled {
        id: Ulid,
        span: Span,
    },
    BookingStatusSet {
        id: Ulid,
        status: BookingStatus,
    },
    BookingCancelled {
        id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_type_id: Ulid,
    pub name: Option<String>,
    pub price_per_night: i64,
    pub total_rooms: u32,
    pub available_rooms: u32,
    pub max_per_booking: u32,
    pub is_available: bool,
}

impl RoomInfo {
    pub fn from_state(rs: &RoomState) -> Self {
        Self {
            id: rs.id,
            hotel_id: rs.hotel_id,
            room_type_id: rs.room_type_id,
            name: rs.name.clone(),
            price_per_night: rs.price_per_night,
            total_rooms: rs.total_rooms,
            available_rooms: rs.available_rooms,
            max_per_booking: rs.max_per_booking,
            is_available: rs.is_available,
        }
    }
}
