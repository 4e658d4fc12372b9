use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{
    entities::{Timer, TIMER_COLUMNS},
    error::TimerError,
    report::Reporter,
    store::TimerStore,
};

/// Timers file on the disk. Every save rewrites the whole file, there is no locking.
pub struct TimerFile {
    path: PathBuf,
}

impl TimerFile {
    /// Creates a header-only file (and parent directories) if nothing exists at `path` yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TimerError> {
        let path = path.into();
        let io_error = |source| TimerError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        match File::options().write(true).create_new(true).open(&path) {
            Ok(file) => {
                debug!("Creating timers file {path:?}");
                write_timers(&TimerStore::new(), file)?;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(io_error(e)),
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, reporter: &impl Reporter) -> Result<TimerStore, TimerError> {
        debug!("Loading timers from {:?}", self.path);
        let file = File::open(&self.path).map_err(|source| TimerError::Io {
            path: self.path.clone(),
            source,
        })?;
        read_timers(BufReader::new(file), reporter)
    }

    pub fn save(&self, store: &TimerStore) -> Result<(), TimerError> {
        debug!("Saving {} timers into {:?}", store.len(), self.path);
        let file = File::create(&self.path).map_err(|source| TimerError::Io {
            path: self.path.clone(),
            source,
        })?;
        write_timers(store, file)
    }
}

/// Reads all timers from a csv source with a header row. Empty source means there are no timers.
pub fn read_timers(source: impl Read, reporter: &impl Reporter) -> Result<TimerStore, TimerError> {
    let mut reader = csv::Reader::from_reader(source);
    // Columns are matched by name, so errors have to be described using the file's own header.
    let headers = reader.headers()?.clone();
    let mut store = TimerStore::new();

    for (index, result) in reader.deserialize::<Timer>().enumerate() {
        // Header takes the first line.
        let line = index as u64 + 2;
        let timer = match result {
            Ok(v) => v,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                return Err(TimerError::MalformedRecord {
                    line: e.position().map_or(line, |p| p.line()),
                    reason: malformed_reason(&e, &headers),
                })
            }
        };

        if timer.end.is_some() && timer.start.is_none() {
            return Err(TimerError::MalformedRecord {
                line,
                reason: format!("timer {} (id {}) ends without starting", timer.label, timer.id),
            });
        }

        if let (Some(start), Some(end)) = (timer.start, timer.end) {
            if end < start {
                reporter.warn(&format!(
                    "Timer {} (id {}) on line {line} ends before it starts",
                    timer.label, timer.id
                ));
            }
        }

        store.push(timer);
    }

    debug!("Read {} timers", store.len());
    Ok(store)
}

fn malformed_reason(error: &csv::Error, headers: &csv::StringRecord) -> String {
    match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(field) => {
                let column = headers.get(field as usize).unwrap_or("unknown");
                format!("column {column}: {}", err.kind())
            }
            None => err.to_string(),
        },
        _ => error.to_string(),
    }
}

/// Writes a header and then every timer. Header is written even if there are no timers.
pub fn write_timers(store: &TimerStore, destination: impl Write) -> Result<(), TimerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(destination);

    writer.write_record(TIMER_COLUMNS)?;
    for timer in store.iter() {
        writer.serialize(timer)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
