// src/core/source.rs — Event sources feeding the kernel

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::mpsc;

use crate::core::types::Event;
use crate::infra::errors::FlowError;

/// Yields observed events. `Ok(None)` means the source is exhausted.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Result<Option<Event>, FlowError>;
}

/// Events pushed from elsewhere in the process.
pub struct ChannelSource {
    rx: mpsc::Receiver<Event>,
}

/// A bounded channel whose receiving half is an [`EventSource`].
pub fn channel(buffer: usize) -> (mpsc::Sender<Event>, ChannelSource) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (tx, ChannelSource { rx })
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Result<Option<Event>, FlowError> {
        Ok(self.rx.recv().await)
    }
}

/// One JSON [`Event`] per line. Blank lines are skipped; lines that do not
/// parse are logged and skipped.
pub struct JsonlSource<R> {
    lines: Lines<BufReader<R>>,
    line_no: usize,
}

impl<R: AsyncRead + Unpin + Send> JsonlSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            line_no: 0,
        }
    }
}

impl JsonlSource<File> {
    pub async fn open(path: &Path) -> Result<Self, FlowError> {
        Ok(Self::new(File::open(path).await?))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> EventSource for JsonlSource<R> {
    async fn next_event(&mut self) -> Result<Option<Event>, FlowError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => tracing::warn!("Skipping line {}: {}", self.line_no, e),
            }
        }
        Ok(None)
    }
}
