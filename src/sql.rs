use sqlparser::ast::{self, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::model::*;

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertRoom {
        id: Ulid,
        hotel_id: Ulid,
        room_type_id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    },
    UpdateRoom {
        id: Ulid,
        name: Option<String>,
        price_per_night: i64,
        total_rooms: u32,
        max_per_booking: u32,
    },
    DeleteRoom {
        id: Ulid,
    },
    /// One booking, one or more rooms. Multi-row INSERTs repeat the booking
    /// columns and name one room per row.
    InsertBooking {
        id: Ulid,
        guest_id: Ulid,
        check_in: Ms,
        check_out: Ms,
        room_ids: Vec<Ulid>,
    },
    UpdateBookingDates {
        id: Ulid,
        check_in: Ms,
        check_out: Ms,
    },
    UpdateBookingStatus {
        id: Ulid,
        status: BookingStatus,
    },
    DeleteBooking {
        id: Ulid,
    },
    SelectRooms {
        hotel_id: Option<Ulid>,
    },
    SelectBookings {
        guest_id: Option<Ulid>,
        hotel_id: Option<Ulid>,
    },
    SelectAvailability {
        room_id: Ulid,
        check_in: Ms,
        check_out: Ms,
    },
    Listen {
        channel: String,
    },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let trimmed = sql.trim();
    if trimmed.to_uppercase().starts_with("LISTEN ") {
        let channel = trimmed[7..].trim().trim_matches(';').to_string();
        return Ok(Command::Listen { channel });
    }

    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;

    match table.as_str() {
        "rooms" => {
            let values = extract_insert_values(insert)?;
            if values.len() < 3 {
                return Err(SqlError::WrongArity("rooms", 3, values.len()));
            }
            let id = parse_ulid(&values[0])?;
            let hotel_id = parse_ulid(&values[1])?;
            let room_type_id = parse_ulid(&values[2])?;
            let name = if values.len() >= 4 {
                parse_string_or_null(&values[3])?
            } else {
                None
            };
            let price_per_night = if values.len() >= 5 {
                parse_i64(&values[4])?
            } else {
                0
            };
            let total_rooms = if values.len() >= 6 {
                parse_u32(&values[5])?
            } else {
                1
            };
            let max_per_booking = if values.len() >= 7 {
                parse_u32(&values[6])?
            } else {
                1
            };
            Ok(Command::InsertRoom {
                id,
                hotel_id,
                room_type_id,
                name,
                price_per_night,
                total_rooms,
                max_per_booking,
            })
        }
        "bookings" => {
            let all_rows = extract_all_insert_rows(insert)?;
            let first = &all_rows[0];
            if first.len() < 5 {
                return Err(SqlError::WrongArity("bookings", 5, first.len()));
            }
            let id = parse_ulid(&first[0])?;
            let guest_id = parse_ulid(&first[1])?;
            let check_in = parse_i64(&first[2])?;
            let check_out = parse_i64(&first[3])?;
            let mut room_ids = Vec::with_capacity(all_rows.len());
            for (i, row) in all_rows.iter().enumerate() {
                if row.len() < 5 {
                    return Err(SqlError::WrongArity("bookings row", 5, row.len()));
                }
                let err = |e: SqlError| SqlError::Parse(format!("row {i}: {e}"));
                if parse_ulid(&row[0]).map_err(err)? != id
                    || parse_ulid(&row[1]).map_err(err)? != guest_id
                    || parse_i64(&row[2]).map_err(err)? != check_in
                    || parse_i64(&row[3]).map_err(err)? != check_out
                {
                    return Err(SqlError::Parse(format!(
                        "row {i}: booking columns must match across rows"
                    )));
                }
                room_ids.push(parse_ulid(&row[4]).map_err(err)?);
            }
            Ok(Command::InsertBooking {
                id,
                guest_id,
                check_in,
                check_out,
                room_ids,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(&table.relation)?;
    let id = extract_where_id(selection)?;

    match table.as_str() {
        "bookings" => {
            let (mut check_in, mut check_out, mut status) = (None, None, None);
            for assignment in assignments {
                match assignment_column(assignment)?.as_str() {
                    "check_in" => check_in = Some(parse_i64(&assignment.value)?),
                    "check_out" => check_out = Some(parse_i64(&assignment.value)?),
                    "status" => status = Some(parse_status(&assignment.value)?),
                    col => {
                        return Err(SqlError::Parse(format!("cannot assign bookings.{col}")));
                    }
                }
            }
            match (check_in, check_out, status) {
                (Some(check_in), Some(check_out), None) => Ok(Command::UpdateBookingDates {
                    id,
                    check_in,
                    check_out,
                }),
                (None, None, Some(status)) => Ok(Command::UpdateBookingStatus { id, status }),
                (None, None, None) => Err(SqlError::Parse("empty assignment list".into())),
                _ => Err(SqlError::Parse(
                    "set either check_in and check_out, or status — not a mix".into(),
                )),
            }
        }
        "rooms" => {
            let (mut name, mut price, mut total, mut max) = (None, None, None, None);
            for assignment in assignments {
                match assignment_column(assignment)?.as_str() {
                    "name" => name = parse_string_or_null(&assignment.value)?,
                    "price_per_night" => price = Some(parse_i64(&assignment.value)?),
                    "total_rooms" => total = Some(parse_u32(&assignment.value)?),
                    "max_per_booking" => max = Some(parse_u32(&assignment.value)?),
                    col => {
                        return Err(SqlError::Parse(format!("cannot assign rooms.{col}")));
                    }
                }
            }
            Ok(Command::UpdateRoom {
                id,
                name,
                price_per_night: price.ok_or(SqlError::MissingFilter("price_per_night"))?,
                total_rooms: total.ok_or(SqlError::MissingFilter("total_rooms"))?,
                max_per_booking: max.ok_or(SqlError::MissingFilter("max_per_booking"))?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    let id = extract_where_id(&delete.selection)?;

    match table.as_str() {
        "rooms" => Ok(Command::DeleteRoom { id }),
        "bookings" => Ok(Command::DeleteBooking { id }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    match table.as_str() {
        "rooms" => {
            let mut hotel_id = None;
            if let Some(selection) = &select.selection {
                extract_eq_filters(selection, &mut |col, expr| {
                    if col == "hotel_id" {
                        hotel_id = Some(parse_ulid_expr(expr)?);
                    }
                    Ok(())
                })?;
            }
            Ok(Command::SelectRooms { hotel_id })
        }
        "bookings" => {
            let (mut guest_id, mut hotel_id) = (None, None);
            if let Some(selection) = &select.selection {
                extract_eq_filters(selection, &mut |col, expr| {
                    match col {
                        "guest_id" => guest_id = Some(parse_ulid_expr(expr)?),
                        "hotel_id" => hotel_id = Some(parse_ulid_expr(expr)?),
                        _ => {}
                    }
                    Ok(())
                })?;
            }
            if guest_id.is_none() && hotel_id.is_none() {
                return Err(SqlError::MissingFilter("guest_id or hotel_id"));
            }
            Ok(Command::SelectBookings { guest_id, hotel_id })
        }
        "availability" => {
            let (mut room_id, mut check_in, mut check_out) = (None, None, None);
            if let Some(selection) = &select.selection {
                extract_availability_filters(selection, &mut room_id, &mut check_in, &mut check_out)?;
            }
            Ok(Command::SelectAvailability {
                room_id: room_id.ok_or(SqlError::MissingFilter("room_id"))?,
                check_in: check_in.ok_or(SqlError::MissingFilter("check_in"))?,
                check_out: check_out.ok_or(SqlError::MissingFilter("check_out"))?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

/// Walk an AND-chain of `col = value` filters.
fn extract_eq_filters(
    expr: &Expr,
    on_eq: &mut impl FnMut(&str, &Expr) -> Result<(), SqlError>,
) -> Result<(), SqlError> {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                extract_eq_filters(left, on_eq)?;
                extract_eq_filters(right, on_eq)?;
            }
            ast::BinaryOperator::Eq => {
                if let Some(col) = expr_column_name(left) {
                    on_eq(&col, right)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn extract_availability_filters(
    expr: &Expr,
    room_id: &mut Option<Ulid>,
    check_in: &mut Option<Ms>,
    check_out: &mut Option<Ms>,
) -> Result<(), SqlError> {
    match expr {
        Expr::BinaryOp { left, op, right } => match op {
            ast::BinaryOperator::And => {
                extract_availability_filters(left, room_id, check_in, check_out)?;
                extract_availability_filters(right, room_id, check_in, check_out)?;
            }
            ast::BinaryOperator::Eq => {
                let col = expr_column_name(left);
                match col.as_deref() {
                    Some("room_id") => *room_id = Some(parse_ulid_expr(right)?),
                    Some("check_in") => *check_in = Some(parse_i64_expr(right)?),
                    Some("check_out") => *check_out = Some(parse_i64_expr(right)?),
                    _ => {}
                }
            }
            ast::BinaryOperator::GtEq => {
                if expr_column_name(left).as_deref() == Some("check_in") {
                    *check_in = Some(parse_i64_expr(right)?);
                }
            }
            ast::BinaryOperator::LtEq => {
                if expr_column_name(left).as_deref() == Some("check_out") {
                    *check_out = Some(parse_i64_expr(right)?);
                }
            }
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn assignment_column(assignment: &ast::Assignment) -> Result<String, SqlError> {
    match &assignment.target {
        ast::AssignmentTarget::ColumnName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))
        }
        _ => Err(SqlError::Parse("unsupported assignment target".into())),
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => {
            if values.rows.is_empty() {
                return Err(SqlError::Parse("empty VALUES".into()));
            }
            Ok(values.rows[0].clone())
        }
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn extract_all_insert_rows(insert: &ast::Insert) -> Result<Vec<Vec<Expr>>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => {
            if values.rows.is_empty() {
                return Err(SqlError::Parse("empty VALUES".into()));
            }
            Ok(values.rows.clone())
        }
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn extract_where_id(selection: &Option<Expr>) -> Result<Ulid, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter("id"))?;
    match sel {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } => {
            if expr_column_name(left).as_deref() == Some("id") {
                parse_ulid_expr(right)
            } else {
                Err(SqlError::MissingFilter("id"))
            }
        }
        _ => Err(SqlError::MissingFilter("id")),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_ulid_expr(expr: &Expr) -> Result<Ulid, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::SingleQuotedString(s) | Value::Number(s, _) => {
                Ulid::from_string(s).map_err(|e| SqlError::Parse(format!("bad ULID: {e}")))
            }
            _ => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_i64_expr(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64_expr(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    parse_ulid_expr(expr)
}

fn parse_string_or_null(expr: &Expr) -> Result<Option<String>, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Null => Ok(None),
            Value::SingleQuotedString(s) => Ok(Some(s.clone())),
            _ => Err(SqlError::Parse(format!(
                "expected string or NULL, got {value:?}"
            ))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_status(expr: &Expr) -> Result<BookingStatus, SqlError> {
    if let Some(Value::SingleQuotedString(s)) = extract_value(expr) {
        BookingStatus::parse(s).ok_or_else(|| SqlError::Parse(format!("invalid status: {s}")))
    } else {
        Err(SqlError::Parse(format!("expected status string, got {expr:?}")))
    }
}

fn parse_u32(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64_expr(expr)?;
    u32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of u32 range")))
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    parse_i64_expr(expr)
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;

    const U1: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    const U2: &str = "01BX5ZZKBKACTAV9WEVGEMMVRY";

    #[test]
    fn parse_insert_room_minimal() {
        let sql = format!("INSERT INTO rooms (id, hotel_id, room_type_id) VALUES ('{U1}', '{U1}', '{U1}')");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::InsertRoom {
                id,
                name,
                price_per_night,
                total_rooms,
                max_per_booking,
                ..
            } => {
                assert_eq!(id.to_string(), U1);
                assert_eq!(name, None);
                assert_eq!(price_per_night, 0);
                assert_eq!(total_rooms, 1);
                assert_eq!(max_per_booking, 1);
            }
            _ => panic!("expected InsertRoom, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_room_full() {
        let sql = format!(
            "INSERT INTO rooms (id, hotel_id, room_type_id, name, price_per_night, total_rooms, max_per_booking) VALUES ('{U1}', '{U1}', '{U1}', 'Room-101', 12500, 4, 2)"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::InsertRoom {
                name,
                price_per_night,
                total_rooms,
                max_per_booking,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("Room-101"));
                assert_eq!(price_per_night, 12500);
                assert_eq!(total_rooms, 4);
                assert_eq!(max_per_booking, 2);
            }
            _ => panic!("expected InsertRoom, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_room_null_name() {
        let sql = format!(
            "INSERT INTO rooms (id, hotel_id, room_type_id, name) VALUES ('{U1}', '{U1}', '{U1}', NULL)"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::InsertRoom { name, .. } => assert_eq!(name, None),
            _ => panic!("expected InsertRoom, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_room_too_few_values() {
        let sql = format!("INSERT INTO rooms (id) VALUES ('{U1}')");
        assert!(matches!(
            parse_sql(&sql),
            Err(SqlError::WrongArity("rooms", 3, 1))
        ));
    }

    #[test]
    fn parse_insert_booking_single_room() {
        let sql = format!(
            "INSERT INTO bookings (id, guest_id, check_in, check_out, room_id) VALUES ('{U1}', '{U2}', 1000, 2000, '{U2}')"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::InsertBooking {
                id,
                guest_id,
                check_in,
                check_out,
                room_ids,
            } => {
                assert_eq!(id.to_string(), U1);
                assert_eq!(guest_id.to_string(), U2);
                assert_eq!(check_in, 1000);
                assert_eq!(check_out, 2000);
                assert_eq!(room_ids.len(), 1);
            }
            _ => panic!("expected InsertBooking, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_booking_multi_room() {
        let sql = format!(
            "INSERT INTO bookings (id, guest_id, check_in, check_out, room_id) VALUES ('{U1}', '{U2}', 1000, 2000, '{U1}'), ('{U1}', '{U2}', 1000, 2000, '{U2}')"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::InsertBooking { room_ids, .. } => {
                assert_eq!(room_ids.len(), 2);
                assert_eq!(room_ids[0].to_string(), U1);
                assert_eq!(room_ids[1].to_string(), U2);
            }
            _ => panic!("expected InsertBooking, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_insert_booking_mismatched_rows() {
        let sql = format!(
            "INSERT INTO bookings (id, guest_id, check_in, check_out, room_id) VALUES ('{U1}', '{U2}', 1000, 2000, '{U1}'), ('{U1}', '{U2}', 1000, 3000, '{U2}')"
        );
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn parse_update_booking_dates() {
        let sql = format!("UPDATE bookings SET check_in = 5000, check_out = 9000 WHERE id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::UpdateBookingDates {
                id,
                check_in,
                check_out,
            } => {
                assert_eq!(id.to_string(), U1);
                assert_eq!(check_in, 5000);
                assert_eq!(check_out, 9000);
            }
            _ => panic!("expected UpdateBookingDates, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_update_booking_status() {
        let sql = format!("UPDATE bookings SET status = 'Confirmed' WHERE id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::UpdateBookingStatus { status, .. } => {
                assert_eq!(status, BookingStatus::Confirmed);
            }
            _ => panic!("expected UpdateBookingStatus, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_update_booking_bad_status() {
        let sql = format!("UPDATE bookings SET status = 'Reserved' WHERE id = '{U1}'");
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn parse_update_booking_mixed_assignments() {
        let sql =
            format!("UPDATE bookings SET check_in = 5000, status = 'Denied' WHERE id = '{U1}'");
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn parse_update_room() {
        let sql = format!(
            "UPDATE rooms SET name = 'Suite', price_per_night = 30000, total_rooms = 2, max_per_booking = 1 WHERE id = '{U1}'"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::UpdateRoom {
                name,
                price_per_night,
                total_rooms,
                max_per_booking,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("Suite"));
                assert_eq!(price_per_night, 30000);
                assert_eq!(total_rooms, 2);
                assert_eq!(max_per_booking, 1);
            }
            _ => panic!("expected UpdateRoom, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_delete_booking() {
        let sql = format!("DELETE FROM bookings WHERE id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        assert!(matches!(cmd, Command::DeleteBooking { .. }));
    }

    #[test]
    fn parse_delete_room() {
        let sql = format!("DELETE FROM rooms WHERE id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        assert!(matches!(cmd, Command::DeleteRoom { .. }));
    }

    #[test]
    fn parse_delete_requires_id() {
        let sql = "DELETE FROM bookings";
        assert!(matches!(parse_sql(sql), Err(SqlError::MissingFilter("id"))));
    }

    #[test]
    fn parse_select_rooms() {
        let cmd = parse_sql("SELECT * FROM rooms").unwrap();
        assert_eq!(cmd, Command::SelectRooms { hotel_id: None });

        let sql = format!("SELECT * FROM rooms WHERE hotel_id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::SelectRooms { hotel_id } => {
                assert_eq!(hotel_id.unwrap().to_string(), U1);
            }
            _ => panic!("expected SelectRooms, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_select_bookings_by_guest() {
        let sql = format!("SELECT * FROM bookings WHERE guest_id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::SelectBookings { guest_id, hotel_id } => {
                assert_eq!(guest_id.unwrap().to_string(), U1);
                assert_eq!(hotel_id, None);
            }
            _ => panic!("expected SelectBookings, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_select_bookings_by_hotel() {
        let sql = format!("SELECT * FROM bookings WHERE hotel_id = '{U1}'");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::SelectBookings { guest_id, hotel_id } => {
                assert_eq!(guest_id, None);
                assert_eq!(hotel_id.unwrap().to_string(), U1);
            }
            _ => panic!("expected SelectBookings, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_select_bookings_requires_filter() {
        assert!(matches!(
            parse_sql("SELECT * FROM bookings"),
            Err(SqlError::MissingFilter(_))
        ));
    }

    #[test]
    fn parse_select_availability() {
        let sql = format!(
            "SELECT * FROM availability WHERE room_id = '{U1}' AND check_in >= 1000 AND check_out <= 2000"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::SelectAvailability {
                room_id,
                check_in,
                check_out,
            } => {
                assert_eq!(room_id.to_string(), U1);
                assert_eq!(check_in, 1000);
                assert_eq!(check_out, 2000);
            }
            _ => panic!("expected SelectAvailability, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_select_availability_eq_filters() {
        let sql = format!(
            "SELECT * FROM availability WHERE room_id = '{U1}' AND check_in = 1000 AND check_out = 2000"
        );
        assert!(parse_sql(&sql).is_ok());
    }

    #[test]
    fn parse_listen() {
        let sql = format!("LISTEN room_{U1}");
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::Listen { channel } => {
                assert_eq!(channel, format!("room_{U1}"));
            }
            _ => panic!("expected Listen, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_unknown_table_errors() {
        let sql = format!("INSERT INTO foobar (id) VALUES ('{U1}')");
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn parse_empty_errors() {
        assert!(matches!(parse_sql(""), Err(SqlError::Empty)));
    }
}
