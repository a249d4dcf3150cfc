//! Last-issued-request-wins bookkeeping
//!
//! Each request gets a ticket carrying a generation number and the logical
//! key it was issued for. Only the most recently issued ticket is current;
//! anything older resolves into the void. Requests are never aborted, their
//! results are just ignored.

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    generation: u64,
    key: K,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaleGuard {
    generation: u64,
}

impl StaleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `key`, superseding every earlier ticket
    pub fn issue<K>(&mut self, key: K) -> Ticket<K> {
        self.generation += 1;
        Ticket {
            generation: self.generation,
            key,
        }
    }

    /// Supersede outstanding tickets without issuing a new one
    pub fn supersede(&mut self) {
        self.generation += 1;
    }

    pub fn is_current<K>(&self, ticket: &Ticket<K>) -> bool {
        ticket.generation == self.generation
    }

    /// `Some(value)` if the ticket is still current, logging the discard otherwise
    pub fn accept<K: std::fmt::Debug, T>(&self, ticket: &Ticket<K>, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            warn!(
                key = ?ticket.key,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            BufferWriter(Arc::clone(&self.0))
        }
    }

    impl io::Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut guard = self
                .0
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
            guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_latest_ticket_is_current() {
        let mut guard = StaleGuard::new();
        let a = guard.issue("foo");
        let b = guard.issue("bar");

        assert!(!guard.is_current(&a));
        assert!(guard.is_current(&b));
        assert_eq!(b.key(), &"bar");
    }

    #[test]
    fn test_late_resolution_is_rejected() {
        let mut guard = StaleGuard::new();
        let a = guard.issue("foo");
        let b = guard.issue("bar");

        assert_eq!(guard.accept(&b, 2), Some(2));
        assert_eq!(guard.accept(&a, 1), None);
    }

    #[test]
    fn test_supersede_invalidates_outstanding() {
        let mut guard = StaleGuard::new();
        let a = guard.issue(1u32);
        guard.supersede();
        assert!(!guard.is_current(&a));
    }

    #[test]
    fn test_discard_is_logged() {
        let sink = SharedBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut guard = StaleGuard::new();
            let old = guard.issue("dpgf_structure/1");
            let _new = guard.issue("dpgf_structure/2");
            assert_eq!(guard.accept(&old, ()), None);
        });

        let text = String::from_utf8(sink.0.lock().expect("lock output").clone())
            .expect("utf8 log output");
        let line = text
            .lines()
            .find(|l| l.contains("discarding stale response"))
            .expect("warn line");
        assert!(line.contains("WARN"));
        assert!(line.contains("generation=1"));
        assert!(line.contains("current=2"));
    }
}
