//! Where generated artifacts go.

use std::fs;
use std::io;
use std::path::Path;

use polybind_codegen::Artifact;
use tracing::debug;

/// Persists artifacts as the generator produces them.
pub trait OutputSink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()> {
        (**self).write(artifact)
    }
}

/// Writes artifacts to disk, creating parent directories as needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl FsSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for FsSink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()> {
        if let Some(parent) = artifact.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %artifact.path.display(), bytes = artifact.contents.len(), "writing artifact");
        fs::write(&artifact.path, &artifact.contents)
    }
}

/// Keeps artifacts in memory, in write order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last artifact written to `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Artifact> {
        let path = path.as_ref();
        self.artifacts.iter().rev().find(|a| a.path == path)
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}
