use super::Store;
use rusqlite::{Connection, OpenFlags};
use std::{path::Path, time::Duration};

/// Builder for [`Store`].
///
/// There is no default database location: the path is always passed to [`Builder::open`].
pub struct Builder {
    read_only: bool,
    busy_timeout: Duration,
    create_schema: bool,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            read_only: false,
            busy_timeout: Duration::from_secs(5),
            create_schema: false,
        }
    }

    /// Opens the database read-only.
    ///
    /// Default = false
    #[must_use]
    pub fn read_only(mut self, enabled: bool) -> Self {
        self.read_only = enabled;
        self
    }

    /// How long to wait on a locked database (e.g. while the simulation is still writing).
    ///
    /// Default = 5 seconds
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// If `true`, creates missing tables when opening.
    ///
    /// Ignored for read-only stores.
    ///
    /// Default = false
    #[must_use]
    pub fn create_schema(mut self, enabled: bool) -> Self {
        self.create_schema = enabled;
        self
    }

    /// Opens the simulation database at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the database could not be opened.
    pub fn open<P: AsRef<Path>>(self, path: P) -> crate::Result<Store> {
        let path = path.as_ref();

        let flags = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };

        log::debug!("Opening store at {} (read_only={})", path.display(), self.read_only);

        let conn = Connection::open_with_flags(path, flags)?;
        self.finish(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns error if SQLite could not allocate the database.
    pub fn open_in_memory(self) -> crate::Result<Store> {
        let conn = Connection::open_in_memory()?;
        self.finish(conn)
    }

    fn finish(self, conn: Connection) -> crate::Result<Store> {
        conn.busy_timeout(self.busy_timeout)?;

        let store = Store { conn };

        if self.create_schema && !self.read_only {
            store.create_schema()?;
        }

        Ok(store)
    }
}
