use anyhow::{bail, Context, Result};
use softkey_core::{DictRow, MemoryDictionary, RedbDictionary};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Parse tab-separated rows into `dict`.
///
/// Each line is `table<TAB>code<TAB>value[<TAB>frequency[<TAB>aux]]`, or the
/// same without the leading table column when `table` is given. Blank lines
/// and lines starting with `#` are skipped.
pub fn read_rows<R: BufRead>(
    reader: R,
    table: Option<&str>,
    dict: &mut MemoryDictionary,
) -> Result<usize> {
    let mut count = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split('\t');
        let table = match table {
            Some(t) => t.to_string(),
            None => parts.next().unwrap_or_default().to_string(),
        };
        let (Some(code), Some(value)) = (parts.next(), parts.next()) else {
            bail!("line {}: expected at least code and value columns", n + 1);
        };
        let frequency = match parts.next() {
            Some(f) if !f.trim().is_empty() => f
                .trim()
                .parse::<u64>()
                .with_context(|| format!("line {}: bad frequency {f:?}", n + 1))?,
            _ => 0,
        };
        let mut row = DictRow::new(code, value, frequency);
        if let Some(aux) = parts.next().filter(|a| !a.is_empty()) {
            row = row.with_aux(aux);
        }
        if table.is_empty() || row.code.is_empty() {
            tracing::warn!("line {}: empty table or code, skipped", n + 1);
            continue;
        }
        dict.insert(&table, row);
        count += 1;
    }
    Ok(count)
}

/// Read every input file into one in-memory dictionary.
pub fn read_inputs(inputs: &[PathBuf], table: Option<&str>) -> Result<MemoryDictionary> {
    let mut dict = MemoryDictionary::new();
    for input in inputs {
        let file =
            File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
        let rows = read_rows(BufReader::new(file), table, &mut dict)
            .with_context(|| format!("in {}", input.display()))?;
        tracing::info!("{}: {rows} rows", input.display());
    }
    Ok(dict)
}

/// Write `dict` to `out`, choosing the format from the extension: `.redb`
/// appends to a redb database, `.json` writes JSON, anything else bincode.
pub fn write_dictionary(dict: &MemoryDictionary, out: &Path) -> Result<usize> {
    match out.extension().and_then(|e| e.to_str()) {
        Some("redb") => RedbDictionary::create(out)?.import(dict),
        Some("json") => {
            std::fs::write(out, dict.to_json_string()?)
                .with_context(|| format!("failed to write {}", out.display()))?;
            Ok(dict.len())
        }
        _ => {
            dict.save_bincode(out)?;
            Ok(dict.len())
        }
    }
}
