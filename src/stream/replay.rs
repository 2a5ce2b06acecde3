//! # Capture Replay Source
//!
//! Plays recorded sample bursts from a file as if they came off the radio.
//!
//! ## File format
//!
//! A sequence of records, all fields little-endian:
//!
//! ```text
//! | word count (u32) | sample word (u32) x word count |
//! ```
//!
//! Each record is delivered by one `recv` call. Once the file is exhausted
//! every read waits out its timeout and returns nothing.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::source_trait::SampleSource;

/// File-backed sample source
#[derive(Debug)]
pub struct ReplaySource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    exhausted: bool,
    records: u64,
}

impl ReplaySource {
    /// Create a source for `path`; the file is opened lazily
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reader: None,
            exhausted: false,
            records: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records delivered so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Write bursts in the capture format
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails or a burst has more than
    /// `u32::MAX` words.
    pub fn write_capture<W: io::Write>(writer: &mut W, bursts: &[Vec<u32>]) -> io::Result<()> {
        for burst in bursts {
            let count = u32::try_from(burst.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "burst too long"))?;
            writer.write_all(&count.to_le_bytes())?;
            for word in burst {
                writer.write_all(&word.to_le_bytes())?;
            }
        }
        writer.flush()
    }
}

/// Read one little-endian word, `None` at end of file
fn read_word<R: Read>(reader: &mut R) -> io::Result<Option<u32>> {
    let mut bytes = [0u8; 4];
    match reader.read_exact(&mut bytes) {
        Ok(()) => Ok(Some(u32::from_le_bytes(bytes))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

impl SampleSource for ReplaySource {
    fn is_ready(&mut self) -> bool {
        if self.reader.is_some() {
            return true;
        }

        match File::open(&self.path) {
            Ok(file) => {
                info!("Opened capture {}", self.path.display());
                self.reader = Some(BufReader::new(file));
                true
            }
            Err(e) => {
                debug!("Capture {} not available: {}", self.path.display(), e);
                false
            }
        }
    }

    fn recv(&mut self, buf: &mut [u32], timeout: Duration) -> io::Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "capture not open"));
        };

        if self.exhausted {
            thread::sleep(timeout);
            return Ok(0);
        }

        let Some(count) = read_word(reader)? else {
            info!("Capture exhausted after {} records", self.records);
            self.exhausted = true;
            return Ok(0);
        };

        let mut n = 0;
        for i in 0..count as usize {
            let Some(word) = read_word(reader)? else {
                warn!("Capture truncated inside a record, dropping {} words", i);
                self.exhausted = true;
                return Ok(0);
            };
            if let Some(slot) = buf.get_mut(i) {
                *slot = word;
                n += 1;
            }
        }

        if n < count as usize {
            warn!("Record of {} words exceeds buffer, kept {}", count, n);
        }

        self.records += 1;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TIMEOUT: Duration = Duration::from_millis(1);

    fn capture_file(bursts: &[Vec<u32>]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        ReplaySource::write_capture(&mut file, bursts).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_not_ready() {
        let mut source = ReplaySource::new("/nonexistent/capture_12345.bin");
        assert!(!source.is_ready());
        assert!(!source.is_ready(), "Stays not ready while the file is missing");
    }

    #[test]
    fn test_recv_before_ready_is_error() {
        let mut source = ReplaySource::new("/nonexistent/capture_12345.bin");
        let mut buf = [0u32; 4];
        let err = source.recv(&mut buf, TIMEOUT).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_replays_records_in_order() {
        let file = capture_file(&[vec![0x0003_0000, 0x0008_0000], vec![0x00AA_0000]]);
        let mut source = ReplaySource::new(file.path());
        let mut buf = [0u32; 8];

        assert!(source.is_ready());
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x0003_0000, 0x0008_0000]);
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 1);
        assert_eq!(buf[0], 0x00AA_0000);
        assert_eq!(source.records(), 2);

        // Exhausted: behaves like a timeout from here on
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 0);
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 0);
    }

    #[test]
    fn test_oversized_record_truncated_to_buffer() {
        let file = capture_file(&[vec![7; 10], vec![9]]);
        let mut source = ReplaySource::new(file.path());
        let mut buf = [0u32; 4];

        assert!(source.is_ready());
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 4);
        // The rest of the oversized record is skipped, not delivered later
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 1);
        assert_eq!(buf[0], 9);
    }

    #[test]
    fn test_truncated_record_ends_replay() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&3u32.to_le_bytes()).unwrap();
        file.write_all(&1u32.to_le_bytes()).unwrap();
        file.flush().unwrap();

        let mut source = ReplaySource::new(file.path());
        let mut buf = [0u32; 4];

        assert!(source.is_ready());
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 0);
        assert_eq!(source.records(), 0);
    }

    #[test]
    fn test_empty_record() {
        let file = capture_file(&[vec![]]);
        let mut source = ReplaySource::new(file.path());
        let mut buf = [0u32; 4];

        assert!(source.is_ready());
        assert_eq!(source.recv(&mut buf, TIMEOUT).unwrap(), 0);
        assert_eq!(source.records(), 1);
    }
}
