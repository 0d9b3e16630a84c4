use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Validate a requested stay range: check-out after check-in, timestamps in
/// range, width capped. Returns the range as a `Span`.
pub(crate) fn validate_range(check_in: Ms, check_out: Ms) -> Result<Span, EngineError> {
    use crate::limits::*;
    if check_out <= check_in {
        return Err(EngineError::Validation("check-out must be after check-in"));
    }
    if check_in < MIN_VALID_TIMESTAMP_MS || check_out > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    let span = Span::new(check_in, check_out);
    if span.duration_ms() > MAX_STAY_DURATION_MS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(span)
}

/// The overlap scan: a room is taken for `span` if any stay link on it
/// belongs to an active (non-Denied) booking whose range overlaps.
/// Half-open intervals, so back-to-back stays never conflict.
///
/// `exclude` skips the booking being rescheduled so it does not collide
/// with its own existing links. Pure read.
pub(crate) fn find_conflict(
    rs: &RoomState,
    span: &Span,
    bookings: &DashMap<Ulid, BookingRecord>,
    exclude: Option<Ulid>,
) -> Option<Ulid> {
    for stay in rs.overlapping(span) {
        if exclude == Some(stay.booking_id) {
            continue;
        }
        // A link whose booking is gone mid-scan was cancelled; skip it.
        let Some(record) = bookings.get(&stay.booking_id) else {
            continue;
        };
        if record.status == BookingStatus::Denied {
            continue;
        }
        return Some(stay.booking_id);
    }
    None
}

pub(crate) fn check_room_free(
    rs: &RoomState,
    span: &Span,
    bookings: &DashMap<Ulid, BookingRecord>,
    exclude: Option<Ulid>,
) -> Result<(), EngineError> {
    if let Some(booking_id) = find_conflict(rs, span, bookings, exclude) {
        return Err(EngineError::Conflict {
            room_id: rs.id,
            booking_id,
        });
    }
    Ok(())
}
