//! Cross-process startup coordination over a shared marker file.
//!
//! The acquisition rigs run one controller process per instrument. Each
//! process appends a line to a shared marker file once its hardware is
//! initialized, then waits until the lines of all its peers are present
//! before starting to poll. On shutdown the file is truncated so the next
//! session starts clean. The protocol client itself never touches this
//! file.

use log::info;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Handle on the shared readiness marker for one controller process.
pub struct ReadyFile {
    path: PathBuf,
    name: String,
}

impl ReadyFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Append this controller's ready line, creating the file if needed.
    pub fn announce(&self) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} is ready", self.name)?;
        info!("announced '{}' in {}", self.name, self.path.display());
        Ok(())
    }

    /// Block until every peer's ready line is present, polling the file
    /// every `poll`. Returns `false` if `timeout` elapses first; `None`
    /// waits indefinitely.
    pub fn wait_for_peers(
        &self,
        peers: &[String],
        poll: Duration,
        timeout: Option<Duration>,
    ) -> io::Result<bool> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut announced_wait = false;
        loop {
            if self.peers_ready(peers)? {
                info!("all controllers ready");
                return Ok(true);
            }
            if !announced_wait {
                info!(
                    "waiting for {} controllers in {}",
                    peers.len(),
                    self.path.display()
                );
                announced_wait = true;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(false);
                }
            }
            thread::sleep(poll);
        }
    }

    /// Truncate the marker so the next session starts clean.
    pub fn clear(&self) -> io::Result<()> {
        File::create(&self.path).map(|_| ())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn peers_ready(&self, peers: &[String]) -> io::Result<bool> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(peers.iter().all(|peer| {
            let expected = format!("{} is ready", peer);
            contents.lines().any(|line| line == expected)
        }))
    }
}
