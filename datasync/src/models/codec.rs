//! Table codecs: CSV cell coercion, typed row construction and bulk I/O
//!
//! [`ModelCodec`] erases a [`TableModel`] behind the object-safe
//! [`TableCodec`] trait so the registry can resolve codecs by table name.

use super::{ColumnKind, ColumnSpec, CoercedRow, TableModel};
use crate::db::{qualified_name, quote_ident};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use nutrition_sync_shared::IDENTITY_COLUMN;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::marker::PhantomData;
use std::str::FromStr;

/// PostgreSQL accepts at most this many bind parameters per statement
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Rows per INSERT that keep the statement under the bind limit
pub fn effective_batch_size(batch_size: usize, columns: usize) -> usize {
    if columns == 0 {
        return batch_size.max(1);
    }
    batch_size.min(MAX_BIND_PARAMS / columns).max(1)
}

/// Coerce one CSV cell according to its column kind.
///
/// An empty cell is NULL in a nullable column and `""` in a required text
/// column; other required columns reject it. An `id` that does not parse as
/// an integer is passed through as text so typed construction reports it
/// against the row.
pub fn coerce_cell(table: &str, spec: &ColumnSpec, raw: &str, line: u64) -> SyncResult<Value> {
    let invalid = |message: String| SyncError::InvalidValue {
        table: table.to_string(),
        column: spec.name.to_string(),
        line,
        message,
    };

    if raw.is_empty() {
        return match spec.kind {
            _ if spec.nullable => Ok(Value::Null),
            ColumnKind::Text => Ok(Value::String(String::new())),
            _ => Err(invalid("empty cell in a NOT NULL column".to_string())),
        };
    }

    let trimmed = raw.trim();

    match spec.kind {
        ColumnKind::Integer => match trimmed.parse::<i64>() {
            Ok(n) => Ok(Value::from(n)),
            Err(_) if spec.name == IDENTITY_COLUMN => Ok(Value::String(raw.to_string())),
            Err(e) => Err(invalid(format!("expected an integer, got '{raw}': {e}"))),
        },
        ColumnKind::Numeric => Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(|d| Value::String(d.to_string()))
            .map_err(|e| invalid(format!("expected a decimal, got '{raw}': {e}"))),
        ColumnKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid(format!("expected a finite number, got '{raw}'"))),
        ColumnKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Ok(Value::Bool(true)),
            "false" | "f" | "0" | "no" | "n" => Ok(Value::Bool(false)),
            _ => Err(invalid(format!("expected a boolean, got '{raw}'"))),
        },
        ColumnKind::Text => Ok(Value::String(raw.to_string())),
        ColumnKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|d| Value::String(d.to_string()))
            .map_err(|e| invalid(format!("expected a YYYY-MM-DD date, got '{raw}': {e}"))),
        ColumnKind::Timestamp => parse_timestamp(trimmed)
            .map(|ts| Value::String(ts.to_rfc3339()))
            .ok_or_else(|| invalid(format!("expected a timestamp, got '{raw}'"))),
        ColumnKind::Json => serde_json::from_str(raw).map_err(|source| SyncError::JsonDecode {
            table: table.to_string(),
            column: spec.name.to_string(),
            line,
            source,
        }),
    }
}

/// Accepts RFC 3339 with `T` or space separators; zone-less values are UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::<FixedOffset>::from_str(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Header columns of one CSV file resolved against a table's mapping
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    table: &'static str,
    columns: Vec<ColumnSpec>,
}

impl HeaderLayout {
    /// Fails on the first header the mapping does not know
    pub fn resolve(
        table: &'static str,
        specs: &'static [ColumnSpec],
        headers: &csv::StringRecord,
    ) -> SyncResult<Self> {
        let columns = headers
            .iter()
            .map(|header| {
                let name = header.trim();
                specs
                    .iter()
                    .find(|spec| spec.name == name)
                    .copied()
                    .ok_or_else(|| SyncError::UnknownColumn {
                        table: table.to_string(),
                        column: name.to_string(),
                    })
            })
            .collect::<SyncResult<Vec<_>>>()?;

        Ok(Self { table, columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Coerce every cell of `record`
    pub fn coerce(&self, record: &csv::StringRecord, line: u64) -> SyncResult<CoercedRow> {
        let mut values = Map::with_capacity(self.columns.len());
        for (spec, raw) in self.columns.iter().zip(record.iter()) {
            values.insert(
                spec.name.to_string(),
                coerce_cell(self.table, spec, raw, line)?,
            );
        }
        Ok(CoercedRow { line, values })
    }
}

/// CSV text of one dumped table
#[derive(Debug, Clone)]
pub struct TableDump {
    pub rows: u64,
    pub csv: Vec<u8>,
}

/// Object-safe view of one mapped table
#[async_trait]
pub trait TableCodec: Send + Sync {
    fn table(&self) -> &'static str;

    fn columns(&self) -> &'static [ColumnSpec];

    fn json_columns(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter(|c| c.kind == ColumnKind::Json)
            .map(|c| c.name)
            .collect()
    }

    fn has_identity(&self) -> bool {
        self.columns().iter().any(|c| c.name == IDENTITY_COLUMN)
    }

    fn layout(&self, headers: &csv::StringRecord) -> SyncResult<HeaderLayout> {
        HeaderLayout::resolve(self.table(), self.columns(), headers)
    }

    /// Build typed rows and insert them in bind-limited chunks on `conn`.
    /// The caller owns the transaction.
    async fn insert(
        &self,
        conn: &mut PgConnection,
        schema: &str,
        rows: Vec<CoercedRow>,
        batch_size: usize,
    ) -> SyncResult<u64>;

    /// Read every row and render the table as CSV, header included
    async fn dump(&self, pool: &PgPool, schema: &str) -> SyncResult<TableDump>;
}

/// [`TableCodec`] backed by a typed row model
pub struct ModelCodec<M>(PhantomData<fn() -> M>);

impl<M: TableModel> ModelCodec<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    fn column_list() -> String {
        M::COLUMNS
            .iter()
            .map(|c| quote_ident(c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Identity first; otherwise every orderable column, for stable output
    fn order_clause() -> String {
        if M::COLUMNS.iter().any(|c| c.name == IDENTITY_COLUMN) {
            return format!(" ORDER BY {}", quote_ident(IDENTITY_COLUMN));
        }
        let keys: Vec<String> = M::COLUMNS
            .iter()
            .filter(|c| c.kind != ColumnKind::Json)
            .map(|c| quote_ident(c.name))
            .collect();
        if keys.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", keys.join(", "))
        }
    }

    pub fn select_statement(schema: &str) -> String {
        format!(
            "SELECT {} FROM {}{}",
            Self::column_list(),
            qualified_name(schema, M::TABLE),
            Self::order_clause()
        )
    }

    pub fn insert_prefix(schema: &str) -> String {
        format!(
            "INSERT INTO {} ({}) ",
            qualified_name(schema, M::TABLE),
            Self::column_list()
        )
    }

    /// Deserialize coerced cells into the row model
    pub fn construct(row: CoercedRow) -> SyncResult<M> {
        serde_json::from_value(Value::Object(row.values)).map_err(|source| {
            SyncError::RowConstruction {
                table: M::TABLE.to_string(),
                line: row.line,
                source,
            }
        })
    }

    /// Render rows as CSV with an explicit header, so empty tables still get one
    pub fn to_csv(rows: &[M]) -> SyncResult<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        wtr.write_record(M::COLUMNS.iter().map(|c| c.name))
            .map_err(|e| SyncError::csv(M::TABLE, e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| SyncError::csv(M::TABLE, e))?;
        }
        wtr.into_inner()
            .map_err(|e| SyncError::csv(M::TABLE, e.into_error().into()))
    }
}

impl<M: TableModel> Default for ModelCodec<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: TableModel> TableCodec for ModelCodec<M> {
    fn table(&self) -> &'static str {
        M::TABLE
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        M::COLUMNS
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        schema: &str,
        rows: Vec<CoercedRow>,
        batch_size: usize,
    ) -> SyncResult<u64> {
        let typed = rows
            .into_iter()
            .map(Self::construct)
            .collect::<SyncResult<Vec<M>>>()?;

        let chunk_size = effective_batch_size(batch_size, M::COLUMNS.len());
        let prefix = Self::insert_prefix(schema);
        let mut pending = typed.into_iter();
        let mut inserted = 0;

        loop {
            let chunk: Vec<M> = pending.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let mut builder = QueryBuilder::<Postgres>::new(prefix.as_str());
            builder.push_values(chunk, |mut b, row| row.bind_values(&mut b));
            let result = builder
                .build()
                .execute(&mut *conn)
                .await
                .map_err(|source| SyncError::Insert {
                    table: M::TABLE.to_string(),
                    source,
                })?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    async fn dump(&self, pool: &PgPool, schema: &str) -> SyncResult<TableDump> {
        let rows = sqlx::query_as::<_, M>(&Self::select_statement(schema))
            .fetch_all(pool)
            .await?;

        Ok(TableDump {
            rows: rows.len() as u64,
            csv: Self::to_csv(&rows)?,
        })
    }
}
