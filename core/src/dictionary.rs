//! Dictionary store.
//!
//! Composers read word lists through the `DictionaryStore` trait: ordered,
//! limited row queries by exact or prefix code match against named tables.
//! A table that does not exist simply yields no rows.
//!
//! - `MemoryDictionary`: tables held in memory, loadable from JSON or bincode
//! - `RedbDictionary`: persistent tables in a `redb` file
//! - `Dictionary`: backend switch over the two, picked by file extension
//!
//! Phonetic tables are sharded by the first two characters of their code; see
//! `shard_table`.

use anyhow::Context;
use redb::{ReadableTable, TableDefinition, TableError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// One dictionary row.
///
/// `code` is the column queries match against. `aux` carries a table-specific
/// extra column (Pinyin keymap candidates, auto-correct display codes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub code: String,
    pub value: String,
    #[serde(default)]
    pub aux: Option<String>,
    #[serde(default)]
    pub frequency: u64,
}

impl Row {
    pub fn new<C: Into<String>, V: Into<String>>(code: C, value: V, frequency: u64) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
            aux: None,
            frequency,
        }
    }

    pub fn with_aux<A: Into<String>>(mut self, aux: A) -> Self {
        self.aux = Some(aux.into());
        self
    }
}

/// How a query matches the `code` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeMatch {
    /// `code = key`
    Exact(String),
    /// `code LIKE 'key%'`
    Prefix(String),
    /// `code LIKE 'key%' AND code != key`
    PrefixExcludingExact(String),
    /// `LOWER(code) LIKE 'key%'`, with `key` already lower-cased
    PrefixIgnoreCase(String),
}

impl CodeMatch {
    /// The literal key every matching code starts with.
    pub fn key(&self) -> &str {
        match self {
            CodeMatch::Exact(k)
            | CodeMatch::Prefix(k)
            | CodeMatch::PrefixExcludingExact(k)
            | CodeMatch::PrefixIgnoreCase(k) => k,
        }
    }

    /// Whether every matching code starts with `key()` byte for byte, so a
    /// sorted scan can start at the key and stop at the first mismatch.
    pub fn is_literal_prefix(&self) -> bool {
        !matches!(self, CodeMatch::PrefixIgnoreCase(_))
    }

    pub fn matches(&self, code: &str) -> bool {
        match self {
            CodeMatch::Exact(k) => code == k,
            CodeMatch::Prefix(k) => code.starts_with(k.as_str()),
            CodeMatch::PrefixExcludingExact(k) => code.starts_with(k.as_str()) && code != k,
            CodeMatch::PrefixIgnoreCase(k) => code.to_lowercase().starts_with(k.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// Table order.
    #[default]
    Insertion,
    /// Highest frequency first; ties keep table order.
    FrequencyDesc,
}

/// A row query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub code: CodeMatch,
    pub order: RowOrder,
    pub limit: Option<usize>,
    /// Keep only the first row for each distinct value (after ordering).
    pub distinct_values: bool,
}

impl Query {
    pub fn new<T: Into<String>>(table: T, code: CodeMatch) -> Self {
        Self {
            table: table.into(),
            code,
            order: RowOrder::Insertion,
            limit: None,
            distinct_values: false,
        }
    }

    pub fn exact<T: Into<String>, K: Into<String>>(table: T, key: K) -> Self {
        Self::new(table, CodeMatch::Exact(key.into()))
    }

    pub fn prefix<T: Into<String>, K: Into<String>>(table: T, key: K) -> Self {
        Self::new(table, CodeMatch::Prefix(key.into()))
    }

    /// Prefix query that ignores the case of stored codes.
    pub fn prefix_ignore_case<T: Into<String>>(table: T, key: &str) -> Self {
        Self::new(table, CodeMatch::PrefixIgnoreCase(key.to_lowercase()))
    }

    pub fn by_frequency(mut self) -> Self {
        self.order = RowOrder::FrequencyDesc;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct_values = true;
        self
    }
}

/// Read-only row source.
pub trait DictionaryStore {
    /// Rows matching `query`. A missing table is not an error.
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>>;
}

impl<T: DictionaryStore + ?Sized> DictionaryStore for &T {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        (**self).query(query)
    }
}

impl<T: DictionaryStore + ?Sized> DictionaryStore for Box<T> {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        (**self).query(query)
    }
}

impl<T: DictionaryStore + ?Sized> DictionaryStore for Arc<T> {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        (**self).query(query)
    }
}

/// Shared handle composers keep to a store.
pub type SharedStore = Arc<dyn DictionaryStore + Send + Sync>;

/// `"{base}_{first two chars of code}"`, e.g. `words_1A` for code `1A26`.
pub fn shard_table(base: &str, code: &str) -> String {
    let shard: String = code.chars().take(2).collect();
    format!("{base}_{shard}")
}

/// Run `query`, degrading a missing store or a failed query to no rows.
pub fn query_or_empty(store: Option<&SharedStore>, query: &Query) -> Vec<Row> {
    let Some(store) = store else {
        tracing::debug!("no dictionary for table {}", query.table);
        return Vec::new();
    };
    match store.query(query) {
        Ok(rows) => {
            tracing::debug!(
                "{} {:?}: {} rows",
                query.table,
                query.code,
                rows.len()
            );
            rows
        }
        Err(err) => {
            tracing::warn!("dictionary query on {} failed: {err:#}", query.table);
            Vec::new()
        }
    }
}

/// Apply ordering, distinct and limit to rows already filtered by code.
fn finish(mut rows: Vec<Row>, query: &Query) -> Vec<Row> {
    if query.order == RowOrder::FrequencyDesc {
        rows.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    }
    if query.distinct_values {
        let mut seen = ahash::AHashSet::new();
        rows.retain(|row| seen.insert(row.value.clone()));
    }
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    rows
}

/// Tables kept in memory, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDictionary {
    tables: BTreeMap<String, Vec<Row>>,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &str, row: Row) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn extend<I: IntoIterator<Item = Row>>(&mut self, table: &str, rows: I) {
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid dictionary JSON")
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize dictionary")
    }

    pub fn from_bincode_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        bincode::deserialize(bytes).context("invalid bincode dictionary")
    }

    pub fn to_bincode_bytes(&self) -> anyhow::Result<Vec<u8>> {
        bincode::serialize(self).context("failed to serialize dictionary")
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn load_bincode<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_bincode_bytes(&bytes)
    }

    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bincode_bytes()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

impl DictionaryStore for MemoryDictionary {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        let rows = self
            .rows(&query.table)
            .iter()
            .filter(|row| query.code.matches(&row.code))
            .cloned()
            .collect();
        Ok(finish(rows, query))
    }
}

/// Row payload stored under a `(code, seq)` key.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    value: String,
    aux: Option<String>,
    frequency: u64,
}

type RowTable<'a> = TableDefinition<'a, (&'static str, u64), &'static [u8]>;

/// Next free `seq` of every row table, by table name.
const NEXT_SEQ: TableDefinition<&str, u64> = TableDefinition::new("softkey_next_seq");

/// Persistent dictionary backed by `redb`.
///
/// Every table maps `(code, seq)` to a bincode-encoded row, where `seq`
/// numbers the rows of the whole table in insertion order. Prefix queries are
/// range scans starting at `(key, 0)`; matches are put back in `seq` order so
/// results agree with `MemoryDictionary`.
pub struct RedbDictionary {
    db: redb::Database,
}

impl std::fmt::Debug for RedbDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDictionary").finish_non_exhaustive()
    }
}

impl RedbDictionary {
    /// Create or open a database at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let db = redb::Database::create(path)
            .with_context(|| format!("failed to create redb at {}", path.display()))?;
        Ok(Self { db })
    }

    /// Open an existing database.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let db = redb::Database::open(path)
            .with_context(|| format!("failed to open redb at {}", path.display()))?;
        Ok(Self { db })
    }

    /// Append rows to `table`. Returns the number of rows written.
    pub fn insert_rows(&self, table: &str, rows: &[Row]) -> anyhow::Result<usize> {
        let def: RowTable = TableDefinition::new(table);
        let write_txn = self.db.begin_write()?;
        {
            let mut seqs = write_txn.open_table(NEXT_SEQ)?;
            let mut seq = seqs.get(table)?.map_or(0, |v| v.value());
            let mut t = write_txn.open_table(def)?;
            for row in rows {
                let payload = bincode::serialize(&StoredRow {
                    value: row.value.clone(),
                    aux: row.aux.clone(),
                    frequency: row.frequency,
                })?;
                t.insert((row.code.as_str(), seq), payload.as_slice())?;
                seq += 1;
            }
            seqs.insert(table, seq)?;
        }
        write_txn.commit()?;
        Ok(rows.len())
    }

    /// Copy every table of an in-memory dictionary into this database.
    pub fn import(&self, source: &MemoryDictionary) -> anyhow::Result<usize> {
        let mut written = 0;
        for name in source.table_names() {
            written += self.insert_rows(name, source.rows(name))?;
        }
        Ok(written)
    }
}

impl DictionaryStore for RedbDictionary {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        let def: RowTable = TableDefinition::new(&query.table);
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(def) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let literal = query.code.is_literal_prefix();
        let key = if literal { query.code.key() } else { "" };
        let mut hits = Vec::new();
        for item in table.range((key, 0u64)..)? {
            let (k, v) = item?;
            let (code, seq) = k.value();
            if literal && !code.starts_with(key) {
                break;
            }
            if !query.code.matches(code) {
                continue;
            }
            let stored: StoredRow = bincode::deserialize(v.value())?;
            hits.push((
                seq,
                Row {
                    code: code.to_string(),
                    value: stored.value,
                    aux: stored.aux,
                    frequency: stored.frequency,
                },
            ));
        }
        hits.sort_by_key(|(seq, _)| *seq);
        Ok(finish(hits.into_iter().map(|(_, row)| row).collect(), query))
    }
}

/// Dictionary backend switch.
#[derive(Debug)]
pub enum Dictionary {
    Memory(MemoryDictionary),
    Redb(RedbDictionary),
}

impl Dictionary {
    /// Open a dictionary file: `.redb` as a database, `.json` as JSON, anything
    /// else as a bincode snapshot.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("redb") => Ok(Dictionary::Redb(RedbDictionary::open(path)?)),
            Some("json") => Ok(Dictionary::Memory(MemoryDictionary::load_json(path)?)),
            _ => Ok(Dictionary::Memory(MemoryDictionary::load_bincode(path)?)),
        }
    }
}

impl DictionaryStore for Dictionary {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        match self {
            Dictionary::Memory(d) => d.query(query),
            Dictionary::Redb(d) => d.query(query),
        }
    }
}
