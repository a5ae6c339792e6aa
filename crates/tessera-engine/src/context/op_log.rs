use std::collections::VecDeque;
use std::io;

use parking_lot::Mutex;

/// Bounded ring of recently traversed operations.
///
/// Written once per recorded op during traversal; read on demand when a
/// diagnostic dump is requested.
#[derive(Debug)]
pub struct OpLogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<(u32, &'static str)>>,
}

impl OpLogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn write_command(&self, level: u32, name: &'static str) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back((level, name));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Writes one line per entry, indented two spaces per level.
    pub fn output_commands(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let entries = self.entries.lock();
        for &(level, name) in entries.iter() {
            writeln!(out, "{:indent$}{name}", "", indent = level as usize * 2)?;
        }
        Ok(())
    }
}
