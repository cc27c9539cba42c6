//! Connection options handed to the driver on every attach.
//!
//! The client issues one physical attach per logical unit of work, so these
//! options are the only state shared between concurrent calls. They are
//! read-only after construction.

use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 3050;
const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Options for attaching to a Firebird database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name.
    pub user: String,
    /// Password, if the server requires one.
    pub password: Option<String>,
    /// Database path or alias on the server.
    pub database: String,
    /// Return BLOB SUB_TYPE TEXT columns as text values.
    pub blob_as_text: bool,
    /// Report result column names lower-cased.
    pub lowercase_keys: bool,
    /// Page size used when the attach creates the database.
    pub page_size: u32,
}

impl ConnectOptions {
    /// Create options for `host`/`user`/`database` with Firebird defaults.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: None,
            database: database.into(),
            blob_as_text: true,
            lowercase_keys: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Disable text materialization of blob columns.
    pub fn keep_blobs_binary(mut self) -> Self {
        self.blob_as_text = false;
        self
    }

    /// Report column names exactly as the server declares them.
    pub fn preserve_key_case(mut self) -> Self {
        self.lowercase_keys = false;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_driver_contract() {
        let opts = ConnectOptions::new("localhost", "SYSDBA", "/data/app.fdb");
        assert_eq!(opts.port, 3050);
        assert!(opts.blob_as_text);
        assert!(opts.lowercase_keys);
        assert_eq!(opts.page_size, 4096);
        assert_eq!(opts.password, None);
    }

    #[test]
    fn builder_overrides() {
        let opts = ConnectOptions::new("db", "app", "app.fdb")
            .port(3051)
            .password("secret")
            .preserve_key_case()
            .page_size(8192);
        assert_eq!(opts.port, 3051);
        assert_eq!(opts.password.as_deref(), Some("secret"));
        assert!(!opts.lowercase_keys);
        assert_eq!(opts.page_size, 8192);
    }
}
