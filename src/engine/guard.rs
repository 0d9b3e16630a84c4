use ulid::Ulid;

use crate::limits::UPDATE_LIMIT_MS;
use crate::model::*;

use super::EngineError;

/// Caller identity, supplied by the wire layer. The engine checks
/// ownership and role; it never sees credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Guest(Ulid),
    Admin(Ulid),
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Admin(_))
    }
}

/// Resolve a booking for a mutating caller. Admins see everything; a guest
/// only their own bookings. The failure is the same `NotFound` either way,
/// so a guest probing someone else's booking id learns nothing.
pub(crate) fn resolve_for_caller(
    record: Option<BookingRecord>,
    booking_id: Ulid,
    caller: &Principal,
) -> Result<BookingRecord, EngineError> {
    let record = record.ok_or(EngineError::NotFound(booking_id))?;
    match caller {
        Principal::Admin(_) => Ok(record),
        Principal::Guest(g) if *g == record.guest_id => Ok(record),
        Principal::Guest(_) => Err(EngineError::NotFound(booking_id)),
    }
}

/// The edit window: a guest may touch a booking only while its check-in is
/// at least `UPDATE_LIMIT_MS` away. Admins are gated elsewhere (status
/// transitions bypass this; date rewrites are not theirs to make).
pub(crate) fn ensure_outside_lock_window(check_in: Ms, now: Ms) -> Result<(), EngineError> {
    if check_in - now < UPDATE_LIMIT_MS {
        return Err(EngineError::Locked { check_in });
    }
    Ok(())
}

/// Same window applied forward: new bookings (and reschedule targets) must
/// be placed at least `UPDATE_LIMIT_MS` before check-in.
pub(crate) fn ensure_lead_time(check_in: Ms, now: Ms) -> Result<(), EngineError> {
    if check_in - now < UPDATE_LIMIT_MS {
        return Err(EngineError::Validation(
            "check-in must be at least 3 days away",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::DAY_MS;

    fn record(guest_id: Ulid) -> BookingRecord {
        BookingRecord {
            id: Ulid::new(),
            guest_id,
            span: Span::new(0, 1),
            status: BookingStatus::Pending,
            room_ids: vec![],
        }
    }

    #[test]
    fn window_boundary() {
        let now = 100 * DAY_MS;
        // Exactly 3 days out: still editable (>= limit).
        assert!(ensure_outside_lock_window(now + 3 * DAY_MS, now).is_ok());
        // 2 days out: locked.
        assert!(matches!(
            ensure_outside_lock_window(now + 2 * DAY_MS, now),
            Err(EngineError::Locked { .. })
        ));
        // 4 days out: fine.
        assert!(ensure_outside_lock_window(now + 4 * DAY_MS, now).is_ok());
    }

    #[test]
    fn lead_time_mirrors_window() {
        let now = 100 * DAY_MS;
        assert!(ensure_lead_time(now + 3 * DAY_MS, now).is_ok());
        assert!(matches!(
            ensure_lead_time(now + 2 * DAY_MS, now),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn owner_resolution() {
        let guest = Ulid::new();
        let other = Ulid::new();
        let rec = record(guest);
        let bid = rec.id;

        assert!(resolve_for_caller(Some(rec.clone()), bid, &Principal::Guest(guest)).is_ok());
        assert!(resolve_for_caller(Some(rec.clone()), bid, &Principal::Admin(Ulid::new())).is_ok());
        // Someone else's booking: uniform NotFound, not a permission error.
        assert!(matches!(
            resolve_for_caller(Some(rec), bid, &Principal::Guest(other)),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            resolve_for_caller(None, bid, &Principal::Guest(guest)),
            Err(EngineError::NotFound(_))
        ));
    }
}
