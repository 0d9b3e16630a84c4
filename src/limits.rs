use crate::model::Ms;

pub const MAX_ROOMS_PER_TENANT: usize = 100_000;
pub const MAX_STAYS_PER_ROOM: usize = 10_000;
pub const MAX_ROOMS_PER_BOOKING: usize = 16;
pub const MAX_NAME_LEN: usize = 256;

pub const MAX_TENANTS: usize = 1024;
pub const MAX_TENANT_NAME_LEN: usize = 256;

/// 1970-01-01 — bookings before the epoch are rejected outright.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// A single stay may cover at most one year.
pub const MAX_STAY_DURATION_MS: Ms = 366 * DAY_MS;

pub const DAY_MS: Ms = 86_400_000;

/// Guests may create, reschedule, or cancel a booking only while its
/// check-in is at least this far away.
pub const UPDATE_LIMIT_DAYS: i64 = 3;
pub const UPDATE_LIMIT_MS: Ms = UPDATE_LIMIT_DAYS * DAY_MS;
