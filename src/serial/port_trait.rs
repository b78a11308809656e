//! Trait abstraction for line-oriented input to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Trait for line-oriented input sources
#[async_trait]
pub trait LineSource: Send {
    /// Block until the next line is available
    ///
    /// Returns `Ok(None)` once the source has closed. The trailing line
    /// terminator is stripped.
    async fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Release the underlying endpoint
    fn close(&mut self);
}

/// Newline-delimited reader over any async byte stream
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected: serial
/// links often deliver a garbled partial line right after opening.
pub struct BufLineSource<R> {
    reader: Option<BufReader<R>>,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> BufLineSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Some(BufReader::new(inner)),
            buffer: Vec::with_capacity(128),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LineSource for BufLineSource<R> {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "line source closed"))?;

        self.buffer.clear();
        if reader.read_until(b'\n', &mut self.buffer).await? == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buffer);
        Ok(Some(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string()))
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::shutdown::CancellationSignal;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One scripted read result
    #[derive(Debug, Clone)]
    pub enum Step {
        Line(String),
        /// Ctrl+C arrives while blocked; the read still returns this line
        InterruptedLine(String),
        Fail(io::ErrorKind),
    }

    /// Shared counters for assertions after the source is moved
    #[derive(Debug, Default)]
    pub struct SourceStats {
        pub reads: usize,
        pub closes: usize,
    }

    /// Mock line source replaying a script, then reporting end of stream
    pub struct ScriptedSource {
        steps: VecDeque<Step>,
        signal: Option<CancellationSignal>,
        pub stats: Arc<Mutex<SourceStats>>,
    }

    impl ScriptedSource {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                signal: None,
                stats: Arc::new(Mutex::new(SourceStats::default())),
            }
        }

        pub fn lines(lines: &[&str]) -> Self {
            Self::new(lines.iter().map(|l| Step::Line(l.to_string())).collect())
        }

        pub fn with_signal(mut self, signal: CancellationSignal) -> Self {
            self.signal = Some(signal);
            self
        }

        pub fn stats(&self) -> Arc<Mutex<SourceStats>> {
            Arc::clone(&self.stats)
        }
    }

    #[async_trait]
    impl LineSource for ScriptedSource {
        async fn read_line(&mut self) -> io::Result<Option<String>> {
            self.stats.lock().unwrap().reads += 1;
            match self.steps.pop_front() {
                Some(Step::Line(line)) => Ok(Some(line)),
                Some(Step::InterruptedLine(line)) => {
                    if let Some(signal) = &self.signal {
                        signal.cancel();
                    }
                    Ok(Some(line))
                }
                Some(Step::Fail(kind)) => Err(io::Error::new(kind, "Mock read error")),
                None => Ok(None),
            }
        }

        fn close(&mut self) {
            self.stats.lock().unwrap().closes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let input: &[u8] = b"Temperature: 21.5\r\nCO2: 412.3\n";
        let mut source = BufLineSource::new(input);

        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("Temperature: 21.5"));
        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("CO2: 412.3"));
        assert_eq!(source.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let input: &[u8] = b"CO2: 400";
        let mut source = BufLineSource::new(input);
        assert_eq!(source.read_line().await.unwrap().as_deref(), Some("CO2: 400"));
        assert_eq!(source.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let input: &[u8] = b"\xff\xfeCO2: 401\n";
        let mut source = BufLineSource::new(input);
        let line = source.read_line().await.unwrap().unwrap();
        assert!(line.ends_with("CO2: 401"));
    }

    #[tokio::test]
    async fn test_read_after_close_fails() {
        let input: &[u8] = b"CO2: 400\n";
        let mut source = BufLineSource::new(input);
        source.close();
        assert!(source.is_closed());

        let err = source.read_line().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
