use ulid::Ulid;

use crate::model::Ms;

#[derive(Debug)]
pub enum EngineError {
    /// Unknown id, or a booking the caller is not allowed to see. Kept
    /// uniform so existence of other guests' bookings does not leak.
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// The requested range overlaps an active booking on `room_id`.
    Conflict { room_id: Ulid, booking_id: Ulid },
    /// The room's unit counter is exhausted, regardless of dates.
    NoVacancy(Ulid),
    /// Check-in is inside the edit-lock window.
    Locked { check_in: Ms },
    Validation(&'static str),
    /// Room still has stay links attached.
    RoomOccupied(Ulid),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::Conflict { room_id, booking_id } => {
                write!(f, "room {room_id} already booked for an overlapping range by {booking_id}")
            }
            EngineError::NoVacancy(id) => write!(f, "no vacant units in room {id}"),
            EngineError::Locked { check_in } => {
                write!(f, "booking locked: check-in {check_in} is inside the edit window")
            }
            EngineError::Validation(msg) => write!(f, "validation error: {msg}"),
            EngineError::RoomOccupied(id) => {
                write!(f, "cannot delete room {id}: bookings attached")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
