//! # Sample Stream Module
//!
//! Turns hardware sample words into byte frames.
//!
//! This module handles:
//! - Extracting one payload byte from every 32-bit sample word
//! - Running the blocking stream reader on a dedicated thread
//! - Backing off while the stream is not yet available
//! - Cooperative shutdown and end-of-burst flush

pub mod replay;
pub mod source_trait;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::bus::{Pdu, PduSink, PORT_DATA};
use crate::config::DeframerConfig;
use crate::error::{Result, ZigbeeLinkError};
pub use source_trait::SampleSource;

/// Byte of each sample word (in memory order) carrying the payload
pub const SAMPLE_BYTE_OFFSET: usize = 2;

/// Extract the payload byte from every sample word
///
/// # Arguments
///
/// * `words` - Sample words as read from the stream
///
/// # Returns
///
/// * `Vec<u8>` - One byte per word, same length as `words`
///
/// # Examples
///
/// ```
/// use zigbee_link::stream::extract;
///
/// assert_eq!(extract(&[0x00AB_0000, 0x1234_5678]), vec![0xAB, 0x34]);
/// assert!(extract(&[]).is_empty());
/// ```
pub fn extract(words: &[u32]) -> Vec<u8> {
    words
        .iter()
        .map(|word| word.to_le_bytes()[SAMPLE_BYTE_OFFSET])
        .collect()
}

/// Runtime settings for the deframer loop
#[derive(Debug, Clone)]
pub struct DeframerSettings {
    /// Words per read
    pub buffer_size: usize,

    /// Bounded wait per read
    pub recv_timeout: Duration,

    /// Back-off while the stream is unavailable
    pub retry_interval: Duration,

    /// End the stream once the loop exits
    pub flush_on_stop: bool,
}

impl Default for DeframerSettings {
    fn default() -> Self {
        Self {
            buffer_size: 2048,
            recv_timeout: Duration::from_millis(100),
            retry_interval: Duration::from_secs(1),
            flush_on_stop: true,
        }
    }
}

impl From<&DeframerConfig> for DeframerSettings {
    fn from(config: &DeframerConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            recv_timeout: Duration::from_millis(config.recv_timeout_ms),
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            flush_on_stop: config.flush_on_stop,
        }
    }
}

/// Handle to a running deframer thread
///
/// Dropping the handle stops and joins the thread.
#[derive(Debug)]
pub struct DeframerHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<()>>>,
}

/// Start the deframer on its own thread
///
/// Reads from `source` until stopped, publishing one frame per non-empty
/// read on `sink`.
///
/// # Errors
///
/// Returns an I/O error if the thread cannot be spawned.
pub fn spawn_deframer<S, K>(mut source: S, sink: K, settings: DeframerSettings) -> Result<DeframerHandle>
where
    S: SampleSource + 'static,
    K: PduSink + 'static,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    let thread = thread::Builder::new()
        .name("deframer".to_string())
        .spawn(move || {
            let result = run_deframer(&mut source, &sink, &settings, &flag);

            if settings.flush_on_stop {
                match source.end_stream() {
                    Ok(()) => debug!("Sample stream flushed"),
                    Err(e) => warn!("Failed to flush sample stream: {}", e),
                }
            }

            result
        })?;

    Ok(DeframerHandle {
        shutdown,
        thread: Some(thread),
    })
}

impl DeframerHandle {
    /// Whether the reader thread has exited (stopped or failed)
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Request shutdown and wait for the thread to exit
    ///
    /// A read already in flight completes and is published first.
    ///
    /// # Errors
    ///
    /// Returns the loop's fatal error, if it ended on one.
    pub fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        self.join()
    }

    /// Wait for the thread to exit without requesting shutdown
    pub fn join(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ZigbeeLinkError::StreamRead("deframer thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for DeframerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Deframer ended with error: {}", e);
        }
    }
}

/// The reader loop
///
/// Checks `shutdown` between reads. Timeouts are retried, an unavailable
/// stream is waited on, and a read error ends the loop.
pub fn run_deframer<S, K>(source: &mut S, sink: &K, settings: &DeframerSettings, shutdown: &AtomicBool) -> Result<()>
where
    S: SampleSource + ?Sized,
    K: PduSink + ?Sized,
{
    let mut buf = vec![0u32; settings.buffer_size];
    let mut waiting = false;

    info!("Deframer started ({} word buffer)", buf.len());

    while !shutdown.load(Ordering::Acquire) {
        if !source.is_ready() {
            if !waiting {
                info!("Waiting for sample stream to become available");
                waiting = true;
            }
            sleep_unless_shutdown(settings.retry_interval, settings.recv_timeout, shutdown);
            continue;
        }
        waiting = false;

        let n = source.recv(&mut buf, settings.recv_timeout).map_err(|e| {
            error!("Bad read from sample stream: {}", e);
            ZigbeeLinkError::StreamRead(e.to_string())
        })?;

        if n == 0 {
            continue;
        }

        let frame = extract(&buf[..n.min(buf.len())]);
        debug!("Deframed {} bytes onto '{}'", frame.len(), PORT_DATA);
        sink.publish(Pdu::new(frame))?;
    }

    info!("Deframer stopped");
    Ok(())
}

/// Sleep for `total`, waking every `step` to check the shutdown flag
fn sleep_unless_shutdown(total: Duration, step: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + total;
    let step = step.max(Duration::from_millis(1));

    while !shutdown.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(step.min(deadline - now));
    }
}
