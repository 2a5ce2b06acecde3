//! Trait abstraction for the hardware sample stream to enable testing

use std::io;
use std::time::Duration;

/// Source of 32-bit sample words
///
/// Reads block for at most `timeout`. `Ok(0)` means the wait expired with
/// nothing to deliver; any `Err` is a hard failure.
pub trait SampleSource: Send {
    /// Whether the stream is set up and can be read
    fn is_ready(&mut self) -> bool;

    /// Read up to `buf.len()` words, returning how many were written
    fn recv(&mut self, buf: &mut [u32], timeout: Duration) -> io::Result<usize>;

    /// Flush pending transfers (end of burst) before shutdown
    fn end_stream(&mut self) -> io::Result<()> {
        Ok(())
    }
}
