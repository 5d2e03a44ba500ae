//! Decision Record Recorder
//!
//! Append-only JSONL writer for decision records.
//! Thread-safe via the single persistence worker that owns it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use chrono::{Datelike, Timelike, Utc};

use crate::logic::decision::DecisionRecord;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (20 MB)
const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Default log directory name
const LOG_DIR: &str = "decision_logs";

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// RECORDER
// ============================================================================

/// Append-only JSONL recorder, owned by the persistence worker
pub struct Recorder {
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_size: u64,
    base_dir: PathBuf,
    records_written: u64,
}

impl Recorder {
    /// Create a new recorder in the given directory
    pub fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let (file_path, file) = Self::open_new_file(&base_dir)?;

        Ok(Self {
            writer: BufWriter::new(file),
            current_file: file_path,
            current_size: 0,
            base_dir,
            records_written: 0,
        })
    }

    /// Recorder in the default app-data location
    pub fn in_default_dir() -> std::io::Result<Self> {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leafguard")
            .join(LOG_DIR);
        Self::new(dir)
    }

    /// Open a new log file with timestamp
    fn open_new_file(base_dir: &PathBuf) -> std::io::Result<(PathBuf, File)> {
        let now = Utc::now();
        let filename = format!(
            "decisions_{}_{:02}_{:02}_{:02}{:02}{:02}{}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            LOG_EXT
        );
        let file_path = base_dir.join(&filename);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        log::info!("Opened decision log: {:?}", file_path);
        Ok((file_path, file))
    }

    /// Record one decision
    pub fn record(&mut self, record: &DecisionRecord) -> std::io::Result<()> {
        let line = record.to_jsonl();
        let bytes = line.as_bytes();

        // Check if rotation needed
        if self.current_size + bytes.len() as u64 > MAX_FILE_SIZE {
            self.rotate()?;
        }

        self.writer.write_all(bytes)?;
        self.writer.write_all(b"\n")?;
        self.current_size += bytes.len() as u64 + 1;

        // Flush for durability
        self.writer.flush()?;

        self.records_written += 1;
        Ok(())
    }

    /// Rotate to a new file
    fn rotate(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;

        let (new_path, new_file) = Self::open_new_file(&self.base_dir)?;
        self.writer = BufWriter::new(new_file);

        log::info!("Rotated from {:?} to {:?}", self.current_file, new_path);
        self.current_file = new_path;
        self.current_size = 0;

        Ok(())
    }

    /// Get current log file path
    pub fn current_file(&self) -> &PathBuf {
        &self.current_file
    }

    pub fn stats(&self) -> RecorderStats {
        RecorderStats {
            records_written: self.records_written,
            current_file: Some(self.current_file.to_string_lossy().to_string()),
            session_id: super::session_id(),
        }
    }

    /// Flush any buffered lines
    pub fn shutdown(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::error!("Failed to flush decision log on shutdown: {}", e);
        }
        log::info!(
            "Decision recorder shutdown. Total records: {}",
            self.records_written
        );
    }
}

/// Statistics about logged records
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecorderStats {
    pub records_written: u64,
    pub current_file: Option<String>,
    pub session_id: String,
}

// ============================================================================
// QUERY API (for reading logs)
// ============================================================================

/// Read all records from a log file, skipping unparseable lines
pub fn read_records(file_path: &PathBuf) -> std::io::Result<Vec<DecisionRecord>> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if !line.is_empty() {
            if let Ok(record) = serde_json::from_str::<DecisionRecord>(&line) {
                records.push(record);
            }
        }
    }

    Ok(records)
}

/// Get list of all log files in directory, sorted by name (timestamped)
pub fn list_log_files(dir: &PathBuf) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |e| e == "jsonl") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::decision::WateringVerdict;
    use crate::logic::sensors::Reading;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn record(timestamp: f64) -> DecisionRecord {
        DecisionRecord {
            id: Uuid::new_v4(),
            timestamp,
            reading: Reading::new(550.0, 25.0, 60.0, 550.0, timestamp).unwrap(),
            health_score: 100.0,
            watering_verdict: WateringVerdict::degraded(),
            anomaly_flag: false,
            actuation_authorized: false,
        }
    }

    #[test]
    fn test_recorder_creation() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(recorder.current_file().exists());
    }

    #[test]
    fn test_record_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();

        recorder.record(&record(1.0)).unwrap();
        recorder.record(&record(2.0)).unwrap();

        let records = read_records(recorder.current_file()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].timestamp, 2.0);
    }

    #[test]
    fn test_jsonl_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();

        for i in 0..3 {
            recorder.record(&record(i as f64)).unwrap();
        }

        // One JSON object per line
        let content = std::fs::read_to_string(recorder.current_file()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(serde_json::from_str::<DecisionRecord>(line).is_ok());
        }
    }

    #[test]
    fn test_list_log_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();
        recorder.record(&record(1.0)).unwrap();

        let files = list_log_files(&temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(files.len(), 1);
    }
}
