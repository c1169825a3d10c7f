//! CSV persistence of record tables and the merge step.
//!
//! A table file starts with an unnamed row-index column followed by the
//! named columns below:
//!
//! ```text
//! ,Organisation Name,Urls,Afkorting Uitgebreid,Text[,Fetch Status]
//! 0,VMM,https://…/vmm.pdf,Vlaamse Milieumaatschappij,"…"
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use jaarverslag_shared::{FetchStatus, JaarverslagError, Record, Result};

pub const NAME_COLUMN: &str = "Organisation Name";
pub const URL_COLUMN: &str = "Urls";
pub const EXTENDED_COLUMN: &str = "Afkorting Uitgebreid";
pub const TEXT_COLUMN: &str = "Text";
pub const STATUS_COLUMN: &str = "Fetch Status";

/// File name of the combined table written by `merge`.
pub const DEFAULT_MERGED_FILE: &str = "govsr+vlaanderen.csv";

/// Outcome of [`merge_tables`].
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub path: PathBuf,
    /// Data rows written.
    pub rows: usize,
    /// Rows contributed by each input, in input order.
    pub per_input: Vec<(PathBuf, usize)>,
}

/// Per-source table file name: `<source>_data.csv`.
pub fn table_file_name(source: &str) -> String {
    format!("{source}_data.csv")
}

// ---------------------------------------------------------------------------
// Write / read
// ---------------------------------------------------------------------------

/// Write `records` to `path`, replacing any existing file.
#[instrument(skip_all, fields(path = %path.display(), rows = records.len(), include_status))]
pub fn write_table(path: &Path, records: &[Record], include_status: bool) -> Result<()> {
    let mut header = vec!["", NAME_COLUMN, URL_COLUMN, EXTENDED_COLUMN, TEXT_COLUMN];
    if include_status {
        header.push(STATUS_COLUMN);
    }

    write_atomically(path, |writer| {
        writer.write_record(&header)?;
        for (index, record) in records.iter().enumerate() {
            let index = index.to_string();
            let mut row = vec![
                index.as_str(),
                record.organisation_name.as_str(),
                record.url.as_str(),
                record.extended_name.as_deref().unwrap_or(""),
                record.text.as_deref().unwrap_or(""),
            ];
            if include_status {
                row.push(record.status.as_str());
            }
            writer.write_record(&row)?;
        }
        Ok(())
    })?;

    info!("table written");
    Ok(())
}

/// Read a table written by [`write_table`].
///
/// Without a status column an empty `Text` cell reads back as absent text
/// with status [`FetchStatus::Pending`], since "empty" and "failed" cannot
/// be told apart.
pub fn read_table(path: &Path) -> Result<Vec<Record>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(|e| table_error(path, e))?.clone();

    let column = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            JaarverslagError::Table(format!("{}: missing column '{name}'", path.display()))
        })
    };
    let name_col = column(NAME_COLUMN)?;
    let url_col = column(URL_COLUMN)?;
    let extended_col = column(EXTENDED_COLUMN)?;
    let text_col = column(TEXT_COLUMN)?;
    let status_col = headers.iter().position(|h| h == STATUS_COLUMN);

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let fields = result.map_err(|e| table_error(path, e))?;
        let cell = |i: usize| fields.get(i).unwrap_or("");

        let text = cell(text_col);
        let (text, status) = match status_col {
            Some(i) => {
                let status: FetchStatus = cell(i).parse().map_err(|e| {
                    JaarverslagError::Table(format!("{}: row {row}: {e}", path.display()))
                })?;
                let text = (!status.is_failure() && status != FetchStatus::Pending)
                    .then(|| text.to_string());
                (text, status)
            }
            None if text.is_empty() => (None, FetchStatus::Pending),
            None => (Some(text.to_string()), FetchStatus::Text),
        };

        let extended = cell(extended_col);
        records.push(Record {
            organisation_name: cell(name_col).to_string(),
            url: cell(url_col).to_string(),
            extended_name: (!extended.is_empty()).then(|| extended.to_string()),
            text,
            status,
        });
    }

    debug!(path = %path.display(), rows = records.len(), "table read");
    Ok(records)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Concatenate tables row-wise into `output` with a fresh row index.
///
/// The first column of every input is its old index and is dropped. The
/// output columns are the union of the inputs' columns in first-seen order;
/// cells missing from an input are left empty.
#[instrument(skip_all, fields(inputs = inputs.len(), output = %output.display()))]
pub fn merge_tables(inputs: &[PathBuf], output: &Path) -> Result<MergeResult> {
    if inputs.is_empty() {
        return Err(JaarverslagError::validation("merge needs at least one input table"));
    }

    let mut columns: Vec<String> = Vec::new();
    let mut tables: Vec<(Vec<usize>, Vec<csv::StringRecord>)> = Vec::with_capacity(inputs.len());

    for input in inputs {
        let mut reader = open_reader(input)?;
        let headers = reader.headers().map_err(|e| table_error(input, e))?.clone();
        if headers.is_empty() {
            return Err(JaarverslagError::Table(format!(
                "{}: no header row",
                input.display()
            )));
        }

        // Map each data column of this input onto its merged position.
        let positions = headers
            .iter()
            .skip(1)
            .map(|name| match columns.iter().position(|c| c == name) {
                Some(pos) => pos,
                None => {
                    columns.push(name.to_string());
                    columns.len() - 1
                }
            })
            .collect();

        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| table_error(input, e))?;
        debug!(input = %input.display(), rows = rows.len(), "input table read");
        tables.push((positions, rows));
    }

    let mut total = 0usize;
    write_atomically(output, |writer| {
        let mut header = vec![String::new()];
        header.extend(columns.iter().cloned());
        writer.write_record(&header)?;

        for (positions, rows) in &tables {
            for fields in rows {
                let mut row = vec![String::new(); columns.len() + 1];
                row[0] = total.to_string();
                for (field, &pos) in fields.iter().skip(1).zip(positions) {
                    row[pos + 1] = field.to_string();
                }
                writer.write_record(&row)?;
                total += 1;
            }
        }
        Ok(())
    })?;

    let per_input = inputs
        .iter()
        .cloned()
        .zip(tables.iter().map(|(_, rows)| rows.len()))
        .collect();

    info!(rows = total, columns = columns.len(), "tables merged");
    Ok(MergeResult {
        path: output.to_path_buf(),
        rows: total,
        per_input,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| JaarverslagError::io(path, e))?;
    Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
}

fn table_error(path: &Path, err: csv::Error) -> JaarverslagError {
    JaarverslagError::Table(format!("{}: {err}", path.display()))
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut csv::Writer<File>) -> csv::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| JaarverslagError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| JaarverslagError::validation(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let temp = dir.join(format!(".{file_name}.tmp"));

    let file = File::create(&temp).map_err(|e| JaarverslagError::io(&temp, e))?;
    let mut writer = csv::Writer::from_writer(file);
    let written = write(&mut writer).and_then(|()| writer.flush().map_err(csv::Error::from));
    drop(writer);

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp);
        return Err(table_error(path, e));
    }

    std::fs::rename(&temp, path).map_err(|e| JaarverslagError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, url: &str, extended: Option<&str>, text: Option<&str>, status: FetchStatus) -> Record {
        Record {
            organisation_name: name.into(),
            url: url.into(),
            extended_name: extended.map(str::to_string),
            text: text.map(str::to_string),
            status,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(
                "VMM",
                "https://example.org/vmm.pdf",
                Some("Vlaamse Milieumaatschappij"),
                Some("Inleiding\nHoofdstuk 1, \"missie\""),
                FetchStatus::Text,
            ),
            record("De Lijn", "https://example.org/lijn.pdf", None, Some(""), FetchStatus::Empty),
            record("ANB", "https://example.org/anb.pdf", None, None, FetchStatus::Transport),
        ]
    }

    #[test]
    fn write_then_read_keeps_rows_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(table_file_name("vlaanderen"));

        write_table(&path, &sample(), true).unwrap();
        let back = read_table(&path).unwrap();

        assert_eq!(back, sample());
    }

    #[test]
    fn header_has_unnamed_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");

        write_table(&path, &sample(), false).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            ",Organisation Name,Urls,Afkorting Uitgebreid,Text"
        );
        assert!(lines.next().unwrap().starts_with("0,VMM,"));
    }

    #[test]
    fn without_status_column_empty_text_reads_as_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");

        write_table(&path, &sample(), false).unwrap();
        let back = read_table(&path).unwrap();

        assert_eq!(back[0].status, FetchStatus::Text);
        assert_eq!(back[1].text, None);
        assert_eq!(back[1].status, FetchStatus::Pending);
        assert_eq!(back[2].text, None);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_table(&dir.path().join("t.csv"), &sample(), true).unwrap();

        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, ",Organisation Name,Urls\n0,VMM,https://x\n").unwrap();

        let err = read_table(&path).unwrap_err();
        assert!(err.to_string().contains("Afkorting Uitgebreid"));
    }

    #[test]
    fn merge_recomputes_index() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join(table_file_name("vlaanderen"));
        let b = dir.path().join(table_file_name("govsr"));
        write_table(&a, &sample(), false).unwrap();
        write_table(&b, &sample()[..2], false).unwrap();

        let out = dir.path().join(DEFAULT_MERGED_FILE);
        let result = merge_tables(&[a.clone(), b.clone()], &out).unwrap();

        assert_eq!(result.rows, 5);
        assert_eq!(result.per_input, vec![(a, 3), (b, 2)]);

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let indexes: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(indexes, ["0", "1", "2", "3", "4"]);

        let merged = read_table(&out).unwrap();
        assert_eq!(merged[3].organisation_name, "VMM");
    }

    #[test]
    fn merge_takes_union_of_columns() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        write_table(&a, &sample()[..1], true).unwrap();
        write_table(&b, &sample()[..1], false).unwrap();

        let out = dir.path().join("merged.csv");
        merge_tables(&[b, a], &out).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with(",Organisation Name,Urls,Afkorting Uitgebreid,Text,Fetch Status\n"));

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].get(5), Some(""));
        assert_eq!(rows[1].get(5), Some("text"));
    }

    #[test]
    fn merge_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge_tables(&[dir.path().join("absent.csv")], &dir.path().join("m.csv"))
            .unwrap_err();
        assert!(matches!(err, JaarverslagError::Io { .. }));

        assert!(merge_tables(&[], &dir.path().join("m.csv")).is_err());
    }
}
