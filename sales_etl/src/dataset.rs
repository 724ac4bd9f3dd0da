use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::BoxError;

/// Remote object storage (S3 in production).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn object_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("no columns to parse from file")]
    Empty,

    #[error("column {0} has an empty name")]
    EmptyColumnName(usize),

    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Boolean,
    Float,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Text(String),
}

/// Parsed CSV contents: the header columns in order plus one row per data line.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parses CSV text. Every row must have as many fields as the header.
    pub fn from_csv(data: &[u8]) -> Result<Dataset, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(data);

        let header = reader.headers()?.clone();
        if header.is_empty() {
            return Err(DatasetError::Empty);
        }
        let mut seen = HashSet::new();
        for (index, name) in header.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(DatasetError::EmptyColumnName(index));
            }
            if !seen.insert(name) {
                return Err(DatasetError::DuplicateColumn(name.to_string()));
            }
        }

        let records = reader
            .records()
            .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()?;

        let columns: Vec<Column> = header
            .iter()
            .enumerate()
            .map(|(index, name)| Column {
                name: name.to_string(),
                kind: infer_type(records.iter().filter_map(|r| r.get(index))),
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                record
                    .iter()
                    .zip(&columns)
                    .map(|(field, column)| to_cell(field, column.kind))
                    .collect()
            })
            .collect();

        Ok(Dataset { columns, rows })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_type<'a>(values: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut present = values.filter(|v| !v.is_empty()).peekable();
    if present.peek().is_none() {
        return ColumnType::Text;
    }
    if present.clone().all(|v| v.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.clone().all(|v| parse_bool(v).is_some()) {
        ColumnType::Boolean
    } else if present.all(|v| v.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else {
        ColumnType::Text
    }
}

fn to_cell(field: &str, kind: ColumnType) -> Cell {
    if field.is_empty() {
        return Cell::Null;
    }
    // infer_type already checked every value of the column parses
    match kind {
        ColumnType::Integer => field.parse().map(Cell::Integer).unwrap_or(Cell::Null),
        ColumnType::Boolean => parse_bool(field).map(Cell::Boolean).unwrap_or(Cell::Null),
        // NaN and infinities have no DOUBLE representation in MySQL
        ColumnType::Float => match field.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Float(v),
            _ => Cell::Null,
        },
        ColumnType::Text => Cell::Text(field.to_string()),
    }
}

/// Reads and parses a CSV file from local disk.
pub async fn load_local(path: &Path) -> Result<Dataset, BoxError> {
    debug!("reading CSV file {}", path.display());
    let data = tokio::fs::read(path).await?;
    Ok(Dataset::from_csv(&data)?)
}

/// Downloads an object and parses it as UTF-8 CSV.
pub async fn load_object(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<Dataset, BoxError> {
    debug!("reading s3://{}/{}", bucket, key);
    let data = store.object_bytes(bucket, key).await?;
    let text = String::from_utf8(data)?;
    Ok(Dataset::from_csv(text.as_bytes())?)
}
