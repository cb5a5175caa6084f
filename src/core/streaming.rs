//! The output side of a walk
//!
//! Records arrive on a channel in completion order. The stream ends either
//! cleanly, after which the walk statistics are available, or with exactly
//! one error.

use crate::core::events::WalkObserver;
use crate::error::{DepsError, Result};
use crate::models::{DependencyRecord, Manifest, WalkStats};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};

/// What the walk thread sends to the stream
#[derive(Debug)]
pub(crate) enum StreamItem {
    Record(DependencyRecord),
    Failed(DepsError),
    Finished(WalkStats),
}

/// A side-channel notification as a value
#[derive(Debug, Clone, PartialEq)]
pub enum WalkEvent {
    Transform { transform: String, file: PathBuf },
    File { file: PathBuf, id: String },
    Package { dir: PathBuf, name: Option<String> },
    Missing { reference: String, parent: PathBuf },
}

/// Observer that turns notifications into [`WalkEvent`] values
pub(crate) struct ChannelObserver {
    tx: Sender<WalkEvent>,
}

impl ChannelObserver {
    pub(crate) fn new(tx: Sender<WalkEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: WalkEvent) {
        // Nobody listening is fine
        let _ = self.tx.send(event);
    }
}

impl WalkObserver for ChannelObserver {
    fn on_transform(&self, transform: &str, file: &Path) {
        self.send(WalkEvent::Transform {
            transform: transform.to_string(),
            file: file.to_path_buf(),
        });
    }

    fn on_file(&self, file: &Path, id: &str) {
        self.send(WalkEvent::File {
            file: file.to_path_buf(),
            id: id.to_string(),
        });
    }

    fn on_package(&self, manifest: &Manifest) {
        self.send(WalkEvent::Package {
            dir: manifest.dir.clone(),
            name: manifest.name.clone(),
        });
    }

    fn on_missing(&self, reference: &str, parent: &Path) {
        self.send(WalkEvent::Missing {
            reference: reference.to_string(),
            parent: parent.to_path_buf(),
        });
    }
}

/// Iterator over the records of a running walk
pub struct DepsStream {
    records: Receiver<StreamItem>,
    events: Option<Receiver<WalkEvent>>,
    stats: Option<WalkStats>,
    done: bool,
}

impl DepsStream {
    pub(crate) fn new(records: Receiver<StreamItem>, events: Option<Receiver<WalkEvent>>) -> Self {
        Self {
            records,
            events,
            stats: None,
            done: false,
        }
    }

    /// Notifications of the walk, when it was started with events enabled.
    ///
    /// The receiver disconnects once the walk is over.
    pub fn events(&self) -> Option<&Receiver<WalkEvent>> {
        self.events.as_ref()
    }

    /// Statistics, available once the stream ended cleanly
    pub fn stats(&self) -> Option<&WalkStats> {
        self.stats.as_ref()
    }

    /// Drain the stream, returning every record or the terminating error
    pub fn collect_records(mut self) -> Result<(Vec<DependencyRecord>, WalkStats)> {
        let mut records = Vec::new();
        for item in self.by_ref() {
            records.push(item?);
        }
        Ok((records, self.stats.unwrap_or_default()))
    }
}

impl Iterator for DepsStream {
    type Item = Result<DependencyRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.records.recv() {
            Ok(StreamItem::Record(record)) => Some(Ok(record)),
            Ok(StreamItem::Failed(err)) => {
                self.done = true;
                Some(Err(err))
            }
            Ok(StreamItem::Finished(stats)) => {
                self.done = true;
                self.stats = Some(stats);
                None
            }
            Err(_) => {
                self.done = true;
                Some(Err(DepsError::ParallelExecution {
                    message: "walk ended without a result".to_string(),
                }))
            }
        }
    }
}
