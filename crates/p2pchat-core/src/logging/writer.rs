//! Append-only JSONL file, one per instance per day

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;

use super::entry::LogRecord;

/// Appends [`LogRecord`]s to `<dir>/raw/<date>_<instance>.jsonl`.
///
/// The date is taken per record, so a long-running instance moves on to a
/// new file at UTC midnight.
pub struct LogFile {
    instance: String,
    raw: PathBuf,
    current: Mutex<DayFile>,
}

struct DayFile {
    date: NaiveDate,
    path: PathBuf,
    out: BufWriter<File>,
}

impl std::fmt::Debug for LogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFile")
            .field("instance", &self.instance)
            .field("raw", &self.raw)
            .finish()
    }
}

impl LogFile {
    /// Open (or create) today's file for `instance` under `dir/raw/`.
    pub fn open(dir: impl AsRef<Path>, instance: impl Into<String>) -> io::Result<Self> {
        let instance = instance.into();
        let raw = dir.as_ref().join("raw");
        fs::create_dir_all(&raw)?;

        let current = DayFile::open(&raw, &instance, chrono::Utc::now().date_naive())?;
        Ok(Self {
            instance,
            raw,
            current: Mutex::new(current),
        })
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Path of the file currently being appended to.
    pub fn path(&self) -> PathBuf {
        self.current.lock().path.clone()
    }

    /// Append one record to today's file and flush it.
    pub fn append(&self, record: &LogRecord) -> io::Result<()> {
        self.append_on(chrono::Utc::now().date_naive(), record)
    }

    fn append_on(&self, date: NaiveDate, record: &LogRecord) -> io::Result<()> {
        let line = serde_json::to_string(record).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut current = self.current.lock();
        if current.date != date {
            *current = DayFile::open(&self.raw, &self.instance, date)?;
        }
        writeln!(current.out, "{}", line)?;
        current.out.flush()
    }
}

impl DayFile {
    fn open(raw: &Path, instance: &str, date: NaiveDate) -> io::Result<Self> {
        let path = raw.join(format!("{}_{}.jsonl", date.format("%Y-%m-%d"), file_stem(instance)));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            date,
            path,
            out: BufWriter::new(file),
        })
    }
}

/// `instance` reduced to characters that cannot leave the `raw/` directory.
fn file_stem(instance: &str) -> String {
    let stem: String = instance
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "instance".to_string()
    } else {
        stem
    }
}

/// Every record in `dir/raw/*.jsonl`, ordered by timestamp.
///
/// Lines that do not parse are skipped.
pub fn read_records(dir: impl AsRef<Path>) -> io::Result<Vec<LogRecord>> {
    let raw = dir.as_ref().join("raw");
    if !raw.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(&raw)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "jsonl") {
            let text = fs::read_to_string(&path)?;
            records.extend(
                text.lines()
                    .filter(|l| !l.trim().is_empty())
                    .filter_map(|l| serde_json::from_str::<LogRecord>(l).ok()),
            );
        }
    }
    records.sort_by(|a, b| a.ts.cmp(&b.ts));
    Ok(records)
}
