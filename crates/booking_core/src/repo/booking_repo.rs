//! Booking repository contract and generic SQLite implementation.
//!
//! # Responsibility
//! - Implement the seven booking operations once, for all three variants.
//! - Keep SQL details inside the persistence boundary.
//! - Be the only producer of domain errors (`NotFound`, `AlreadyDeleted`, ...).
//!
//! # Invariants
//! - Every value is bound as a parameter; the only interpolated identifier is
//!   the table name, taken from `BookingVariant::table_name`.
//! - Active queries filter `deleted_at IS NULL`, deleted queries filter
//!   `deleted_at IS NOT NULL`, and each count reuses its page predicate.
//! - Update and delete run guard read and conditional write inside one
//!   `IMMEDIATE` transaction.
//! - Dates leave storage as `YYYY-MM-DD` text and are parsed back into
//!   calendar dates here, nowhere else.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{ConnectionPool, DbError, PooledConnection};
use crate::model::booking::{
    now_utc, Booking, BookingId, BookingValidationError, BookingVariant, UserReference,
};
use crate::model::page::{Page, PageRequest};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, Value};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Statement, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id,
    user_id,
    hra_id,
    strftime('%Y-%m-%d', will_arrive) AS will_arrive,
    strftime('%Y-%m-%d', will_leave) AS will_leave,
    number_of_people,
    is_canceled,
    reason,
    created_at,
    updated_at,
    deleted_at";

const USER_REFERENCE_COLUMNS: &str = "user_id";

const REQUIRED_COLUMNS: [&str; 11] = [
    "id",
    "user_id",
    "hra_id",
    "will_arrive",
    "will_leave",
    "number_of_people",
    "is_canceled",
    "reason",
    "created_at",
    "updated_at",
    "deleted_at",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors produced by booking persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller input is syntactically malformed; no storage call was made.
    InvalidArgument(String),
    Validation(BookingValidationError),
    NotFound {
        variant: BookingVariant,
        id: BookingId,
    },
    /// The record exists but has already been soft-deleted.
    AlreadyDeleted {
        variant: BookingVariant,
        id: BookingId,
    },
    /// A guarded write matched zero rows. Indicates a race or schema drift.
    NoRowsAffected {
        operation: &'static str,
        variant: BookingVariant,
    },
    QueryBuild {
        operation: &'static str,
        source: rusqlite::Error,
    },
    Execution {
        operation: &'static str,
        source: DbError,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { variant, id } => write!(f, "{variant} booking not found: {id}"),
            Self::AlreadyDeleted { variant, id } => {
                write!(f, "{variant} booking is already soft-deleted: {id}")
            }
            Self::NoRowsAffected { operation, variant } => {
                write!(f, "no rows affected while running {operation} on {variant} booking")
            }
            Self::QueryBuild { operation, source } => {
                write!(f, "failed to build SQL query for {operation}: {source}")
            }
            Self::Execution { operation, source } => {
                write!(f, "failed to execute SQL query for {operation}: {source}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted booking data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_pool"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::QueryBuild { source, .. } => Some(source),
            Self::Execution { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<BookingValidationError> for RepoError {
    fn from(value: BookingValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Attaches the failing operation name to storage-engine errors.
trait OperationContext<T> {
    fn during(self, operation: &'static str) -> RepoResult<T>;
}

impl<T, E: Into<DbError>> OperationContext<T> for Result<T, E> {
    fn during(self, operation: &'static str) -> RepoResult<T> {
        self.map_err(|err| RepoError::Execution {
            operation,
            source: err.into(),
        })
    }
}

/// Repository interface for booking operations, parameterized by variant.
pub trait BookingRepository {
    /// Inserts a new active booking and returns the stored record.
    fn create_booking(&self, variant: BookingVariant, booking: &Booking) -> RepoResult<Booking>;
    /// Reads one booking; soft-deleted rows only when `include_deleted`.
    fn get_booking(
        &self,
        variant: BookingVariant,
        id: BookingId,
        include_deleted: bool,
    ) -> RepoResult<Option<Booking>>;
    /// Active bookings requested by one user.
    fn list_by_user(
        &self,
        variant: BookingVariant,
        user_id: &str,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>>;
    /// Users holding active bookings for one provider.
    fn list_by_provider(
        &self,
        variant: BookingVariant,
        hra_id: &str,
        page: PageRequest,
    ) -> RepoResult<Page<UserReference>>;
    /// Every active booking.
    fn list_active(&self, variant: BookingVariant, page: PageRequest)
        -> RepoResult<Page<Booking>>;
    /// Every soft-deleted booking.
    fn list_deleted(
        &self,
        variant: BookingVariant,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>>;
    /// Replaces mutable fields of an active booking and returns the stored row.
    fn update_booking(&self, variant: BookingVariant, booking: &Booking) -> RepoResult<Booking>;
    /// Marks an active booking as soft-deleted.
    fn soft_delete_booking(&self, variant: BookingVariant, id: BookingId) -> RepoResult<()>;
}

/// SQLite-backed booking repository over an injected connection pool.
#[derive(Clone)]
pub struct SqliteBookingRepository {
    pool: ConnectionPool,
}

impl SqliteBookingRepository {
    /// Constructs a repository from a migrated pool.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(pool: ConnectionPool) -> RepoResult<Self> {
        {
            let conn = pool.get().during("init")?;
            ensure_connection_ready(&conn)?;
        }
        Ok(Self { pool })
    }

    fn connection(&self, operation: &'static str) -> RepoResult<PooledConnection> {
        self.pool.get().during(operation)
    }

    fn fetch_page<T>(
        &self,
        variant: BookingVariant,
        columns: &str,
        filter: Filter<'_>,
        page: PageRequest,
        operation: &'static str,
        map_row: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Page<T>> {
        let conn = self.connection(operation)?;
        let table = variant.table_name();
        let (predicate, filter_values) = filter.predicate();

        let mut sql = format!(
            "SELECT {columns} FROM {table} WHERE {predicate} ORDER BY created_at ASC, id ASC"
        );
        let mut bind_values = filter_values.clone();
        if page.is_paginated() {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(Value::Integer(to_sql_integer(page.limit)));
            bind_values.push(Value::Integer(to_sql_integer(page.offset)));
        }

        let mut stmt = prepare(&conn, &sql, operation)?;
        let mut rows = stmt.query(params_from_iter(bind_values)).during(operation)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().during(operation)? {
            items.push(map_row(row)?);
        }

        let count_sql = format!("SELECT COUNT(*) FROM {table} WHERE {predicate}");
        let total: i64 = prepare(&conn, &count_sql, operation)?
            .query_row(params_from_iter(filter_values), |row| row.get(0))
            .during(operation)?;

        Ok(Page { items, total })
    }
}

impl BookingRepository for SqliteBookingRepository {
    fn create_booking(&self, variant: BookingVariant, booking: &Booking) -> RepoResult<Booking> {
        const OPERATION: &str = "create";
        booking.validate(variant)?;

        let mut stored = booking.clone();
        let created_at = *stored.created_at.get_or_insert_with(now_utc);
        stored.deleted_at = None;

        let conn = self.connection(OPERATION)?;
        let sql = format!(
            "INSERT INTO {} (
                id,
                user_id,
                hra_id,
                will_arrive,
                will_leave,
                number_of_people,
                is_canceled,
                reason,
                created_at,
                updated_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL);",
            variant.table_name()
        );
        prepare(&conn, &sql, OPERATION)?
            .execute(params![
                stored.id.to_string(),
                stored.user_id.as_str(),
                stored.hra_id.as_str(),
                date_to_db(stored.will_arrive),
                stored.will_leave.map(date_to_db),
                stored.number_of_people,
                stored.is_canceled,
                stored.reason.as_str(),
                created_at.timestamp_millis(),
                stored.updated_at.map(|value| value.timestamp_millis()),
            ])
            .during(OPERATION)?;

        Ok(stored)
    }

    fn get_booking(
        &self,
        variant: BookingVariant,
        id: BookingId,
        include_deleted: bool,
    ) -> RepoResult<Option<Booking>> {
        const OPERATION: &str = "get";
        let conn = self.connection(OPERATION)?;
        let booking = load_booking(&conn, variant, id, OPERATION)?;
        Ok(booking.filter(|booking| include_deleted || booking.is_active()))
    }

    fn list_by_user(
        &self,
        variant: BookingVariant,
        user_id: &str,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>> {
        self.fetch_page(
            variant,
            BOOKING_COLUMNS,
            Filter::ActiveByUser(user_id),
            page,
            "get_all_by_user_id",
            parse_booking_row,
        )
    }

    fn list_by_provider(
        &self,
        variant: BookingVariant,
        hra_id: &str,
        page: PageRequest,
    ) -> RepoResult<Page<UserReference>> {
        self.fetch_page(
            variant,
            USER_REFERENCE_COLUMNS,
            Filter::ActiveByProvider(hra_id),
            page,
            "get_all_by_provider_id",
            |row| {
                Ok(UserReference {
                    user_id: column(row, "user_id")?,
                })
            },
        )
    }

    fn list_active(
        &self,
        variant: BookingVariant,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>> {
        self.fetch_page(
            variant,
            BOOKING_COLUMNS,
            Filter::Active,
            page,
            "list",
            parse_booking_row,
        )
    }

    fn list_deleted(
        &self,
        variant: BookingVariant,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>> {
        self.fetch_page(
            variant,
            BOOKING_COLUMNS,
            Filter::Deleted,
            page,
            "list_deleted",
            parse_booking_row,
        )
    }

    fn update_booking(&self, variant: BookingVariant, booking: &Booking) -> RepoResult<Booking> {
        const OPERATION: &str = "update";
        booking.validate(variant)?;
        let updated_at = booking.updated_at.unwrap_or_else(now_utc);

        let mut conn = self.connection(OPERATION)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .during(OPERATION)?;
        ensure_active(&tx, variant, booking.id, OPERATION)?;

        let sql = format!(
            "UPDATE {}
             SET
                user_id = ?1,
                hra_id = ?2,
                will_arrive = ?3,
                will_leave = ?4,
                number_of_people = ?5,
                is_canceled = ?6,
                reason = ?7,
                updated_at = ?8
             WHERE id = ?9
               AND deleted_at IS NULL;",
            variant.table_name()
        );
        let changed = prepare(&tx, &sql, OPERATION)?
            .execute(params![
                booking.user_id.as_str(),
                booking.hra_id.as_str(),
                date_to_db(booking.will_arrive),
                booking.will_leave.map(date_to_db),
                booking.number_of_people,
                booking.is_canceled,
                booking.reason.as_str(),
                updated_at.timestamp_millis(),
                booking.id.to_string(),
            ])
            .during(OPERATION)?;
        if changed == 0 {
            return Err(RepoError::NoRowsAffected {
                operation: OPERATION,
                variant,
            });
        }

        let stored = load_booking(&tx, variant, booking.id, OPERATION)?.ok_or(
            RepoError::NotFound {
                variant,
                id: booking.id,
            },
        )?;
        tx.commit().during(OPERATION)?;
        Ok(stored)
    }

    fn soft_delete_booking(&self, variant: BookingVariant, id: BookingId) -> RepoResult<()> {
        const OPERATION: &str = "delete";
        let mut conn = self.connection(OPERATION)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .during(OPERATION)?;
        ensure_active(&tx, variant, id, OPERATION)?;

        let sql = format!(
            "UPDATE {}
             SET deleted_at = ?1
             WHERE id = ?2
               AND deleted_at IS NULL;",
            variant.table_name()
        );
        let changed = prepare(&tx, &sql, OPERATION)?
            .execute(params![now_utc().timestamp_millis(), id.to_string()])
            .during(OPERATION)?;
        if changed == 0 {
            return Err(RepoError::NoRowsAffected {
                operation: OPERATION,
                variant,
            });
        }

        tx.commit().during(OPERATION)?;
        Ok(())
    }
}

/// Row filter shared by a page query and its count query.
#[derive(Debug, Clone, Copy)]
enum Filter<'a> {
    Active,
    Deleted,
    ActiveByUser(&'a str),
    ActiveByProvider(&'a str),
}

impl Filter<'_> {
    fn predicate(self) -> (&'static str, Vec<Value>) {
        match self {
            Self::Active => ("deleted_at IS NULL", Vec::new()),
            Self::Deleted => ("deleted_at IS NOT NULL", Vec::new()),
            Self::ActiveByUser(user_id) => (
                "deleted_at IS NULL AND user_id = ?",
                vec![Value::Text(user_id.to_string())],
            ),
            Self::ActiveByProvider(hra_id) => (
                "deleted_at IS NULL AND hra_id = ?",
                vec![Value::Text(hra_id.to_string())],
            ),
        }
    }
}

/// Parses a caller-supplied booking id.
///
/// # Errors
/// - `InvalidArgument` when `value` is not a UUID. Surrounding whitespace is
///   not accepted.
pub fn parse_booking_id(value: &str) -> RepoResult<BookingId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidArgument(format!("invalid booking id `{value}`")))
}

/// Parses a caller-supplied `YYYY-MM-DD` calendar date.
///
/// Only the canonical zero-padded form is accepted, so a parsed date always
/// renders back to the exact input.
///
/// # Errors
/// - `InvalidArgument` naming `field` when `value` is not a valid date.
pub fn parse_calendar_date(value: &str, field: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == value)
        .ok_or_else(|| {
            RepoError::InvalidArgument(format!("invalid {field} `{value}`; expected YYYY-MM-DD"))
        })
}

fn prepare<'conn>(
    conn: &'conn Connection,
    sql: &str,
    operation: &'static str,
) -> RepoResult<Statement<'conn>> {
    conn.prepare(sql)
        .map_err(|source| RepoError::QueryBuild { operation, source })
}

fn load_booking(
    conn: &Connection,
    variant: BookingVariant,
    id: BookingId,
    operation: &'static str,
) -> RepoResult<Option<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM {} WHERE id = ?1;",
        variant.table_name()
    );
    let mut stmt = prepare(conn, &sql, operation)?;
    let mut rows = stmt.query([id.to_string()]).during(operation)?;
    match rows.next().during(operation)? {
        Some(row) => Ok(Some(parse_booking_row(row)?)),
        None => Ok(None),
    }
}

fn ensure_active(
    conn: &Connection,
    variant: BookingVariant,
    id: BookingId,
    operation: &'static str,
) -> RepoResult<()> {
    let sql = format!(
        "SELECT deleted_at FROM {} WHERE id = ?1;",
        variant.table_name()
    );
    let deleted_at: Option<Option<i64>> = prepare(conn, &sql, operation)?
        .query_row([id.to_string()], |row| row.get(0))
        .optional()
        .during(operation)?;

    match deleted_at {
        None => Err(RepoError::NotFound { variant, id }),
        Some(Some(_)) => Err(RepoError::AlreadyDeleted { variant, id }),
        Some(None) => Ok(()),
    }
}

fn parse_booking_row(row: &Row<'_>) -> RepoResult<Booking> {
    let id_text: String = column(row, "id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in id")))?;

    let arrive_text: Option<String> = column(row, "will_arrive")?;
    let will_arrive = match arrive_text {
        Some(value) => date_from_db(&value, "will_arrive")?,
        None => {
            return Err(RepoError::InvalidData(format!(
                "missing will_arrive for booking {id}"
            )))
        }
    };
    let will_leave = column::<Option<String>>(row, "will_leave")?
        .map(|value| date_from_db(&value, "will_leave"))
        .transpose()?;

    Ok(Booking {
        id,
        user_id: column(row, "user_id")?,
        hra_id: column(row, "hra_id")?,
        will_arrive,
        will_leave,
        number_of_people: column(row, "number_of_people")?,
        is_canceled: column(row, "is_canceled")?,
        reason: column(row, "reason")?,
        created_at: Some(timestamp_from_db(column(row, "created_at")?, "created_at")?),
        updated_at: column::<Option<i64>>(row, "updated_at")?
            .map(|value| timestamp_from_db(value, "updated_at"))
            .transpose()?,
        deleted_at: column::<Option<i64>>(row, "deleted_at")?
            .map(|value| timestamp_from_db(value, "deleted_at"))
            .transpose()?,
    })
}

fn column<T: FromSql>(row: &Row<'_>, name: &str) -> RepoResult<T> {
    row.get(name)
        .map_err(|err| RepoError::InvalidData(format!("unreadable column `{name}`: {err}")))
}

fn date_to_db(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn date_from_db(value: &str, field: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {field}")))
}

fn timestamp_from_db(value: i64, field: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("out of range timestamp {value} in {field}")))
}

fn to_sql_integer(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn).during("init")?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for variant in BookingVariant::ALL {
        let table = variant.table_name();
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in REQUIRED_COLUMNS {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )
        .during("init")?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = prepare(conn, &format!("PRAGMA table_info({table});"), "init")?;
    let mut rows = stmt.query([]).during("init")?;
    while let Some(row) = rows.next().during("init")? {
        let current: String = row.get(1).during("init")?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
