use std::{
    fs::File,
    io::{self, Write},
};

use edt_core::store::{NodeId, NodeStore, write_trace};

// DUMP WRITER
// ================================================================================================

/// Writes a completed store and its root to a byte sink for offline inspection.
///
/// The sink is opened when the session starts (so an unopenable path refuses the session rather
/// than losing a finished tree) and written once, at completion. The format is produced by
/// `edt_core::store::write_trace` and is opaque to everything but external tooling.
#[derive(Debug)]
pub struct DumpWriter<W: Write> {
    sink: W,
}

impl DumpWriter<File> {
    /// Creates the dump file at `path`, truncating any previous dump.
    pub fn create(path: &str) -> io::Result<Self> {
        Ok(Self { sink: File::create(path)? })
    }
}

impl<W: Write> DumpWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Serializes the store and root into the sink and flushes it.
    pub fn finish(mut self, store: &NodeStore, root: NodeId) -> io::Result<()> {
        let mut bytes = Vec::new();
        write_trace(&mut bytes, store, root);
        self.sink.write_all(&bytes)?;
        self.sink.flush()
    }
}
