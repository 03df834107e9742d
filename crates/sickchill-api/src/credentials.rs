//! Login credentials for API key retrieval.

use std::fmt;

/// Username and password exchanged for an API key.
///
/// The server expects both values as lowercase hex MD5 digests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from plain-text values.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Username digest sent as the `u` query parameter.
    #[must_use]
    pub fn username_digest(&self) -> String {
        hex_md5(&self.username)
    }

    /// Password digest sent as the `p` query parameter.
    #[must_use]
    pub fn password_digest(&self) -> String {
        hex_md5(&self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Lowercase hex MD5 of `input`.
fn hex_md5(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}
