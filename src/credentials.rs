//! Proxy user list and Basic authentication
//!
//! The user list is a line-oriented file of `username:password` or
//! `username password` entries. Passwords are stored and compared in
//! plaintext; the file format has no room for hashes.

use base64::Engine;
use std::collections::HashMap;
use std::path::Path;

use crate::cache::{CachedFile, Reloading};
use crate::error::Result;
use crate::lines::content_lines;

/// Parse a user list into a username to password map.
///
/// Each line is split at the first `:` or space. Lines without a separator
/// are skipped with a warning; a repeated username keeps its last password.
pub fn parse_userlist(data: &[u8]) -> Result<HashMap<String, String>> {
    let text = String::from_utf8_lossy(data);
    let mut users = HashMap::new();

    for (line, content) in content_lines(&text) {
        let Some((username, password)) = content.split_once([':', ' ']) else {
            tracing::warn!(line, "Skipped invalid user list line");
            continue;
        };
        let username = username.trim();
        let password = password.trim();
        tracing::debug!(
            user = %username,
            password = %mask_password(password),
            "Loaded user"
        );
        users.insert(username.to_string(), password.to_string());
    }

    Ok(users)
}

/// One `*` per character, for logging
fn mask_password(password: &str) -> String {
    "*".repeat(password.chars().count())
}

/// Hot-reloaded user list for proxy authentication
pub struct CredentialStore {
    users: Reloading<HashMap<String, String>>,
}

impl CredentialStore {
    /// Load a user list with the default reload interval
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(CachedFile::open(path)?)
    }

    /// Build a store on an already opened file
    pub fn new(file: CachedFile) -> Result<Self> {
        let users = Reloading::new(file, parse_userlist)?;
        tracing::info!(
            path = %users.file().path().display(),
            users = users.get()?.len(),
            "Loaded user list"
        );
        Ok(Self { users })
    }

    pub fn path(&self) -> &Path {
        self.users.file().path()
    }

    /// Check a username and plaintext password.
    ///
    /// Exact, case-sensitive comparison against the current user list.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let users = self.users.get()?;
        Ok(users
            .get(username)
            .is_some_and(|expected| expected == password))
    }

    /// Check a Base64 `username:password` token, as carried by HTTP Basic auth.
    ///
    /// A token that does not decode, is not UTF-8 or has no `:` is rejected.
    pub fn authenticate_basic(&self, token: &str) -> Result<bool> {
        let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(token.trim()) else {
            return Ok(false);
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return Ok(false);
        };
        let Some((username, password)) = decoded.split_once(':') else {
            return Ok(false);
        };
        self.authenticate(username.trim(), password.trim())
    }

    /// Check a full `Proxy-Authorization` header value (`Basic <token>`)
    pub fn authenticate_header(&self, value: &str) -> Result<bool> {
        let mut parts = value.trim().splitn(2, ' ');
        match (parts.next(), parts.next()) {
            (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("basic") => {
                self.authenticate_basic(token)
            }
            _ => Ok(false),
        }
    }

    /// Decide whether a request may use the proxy.
    ///
    /// An empty user list disables authentication. Otherwise the request must
    /// carry a `Proxy-Authorization` header that authenticates.
    pub fn authorize(&self, header: Option<&str>) -> Result<bool> {
        if self.user_count()? == 0 {
            tracing::info!(path = %self.path().display(), "Ignored authentication, no users configured");
            return Ok(true);
        }
        let authorized = match header {
            Some(value) => self.authenticate_header(value)?,
            None => false,
        };
        if !authorized {
            tracing::warn!("Denied proxy request: invalid username or password");
        }
        Ok(authorized)
    }

    /// Number of distinct usernames in the current user list
    pub fn user_count(&self) -> Result<usize> {
        Ok(self.users.get()?.len())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path())
            .finish()
    }
}
