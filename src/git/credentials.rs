//! Token lookup for HTTPS remotes

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::path::Path;

/// Username sent alongside a token; hosts only require it to be non-empty
pub const TOKEN_USERNAME: &str = "git";

/// Host substrings recognized in repository paths and the variable holding their token
pub const KNOWN_HOSTS: &[(&str, &str)] = &[
    ("github.com", "GITHUB_TOKEN"),
    ("gitlab.com", "GITLAB_TOKEN"),
];

/// Basic-auth credential for a repository's remotes
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Looks up a token from the process environment
    pub fn for_repository(path: &Path) -> Option<Self> {
        Self::lookup(path, |key| std::env::var(key).ok())
    }

    /// Looks up a token using `env` as the variable source
    ///
    /// Only the first recognized host found in the path is consulted.
    pub fn lookup(path: &Path, env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let path = path.to_string_lossy();
        let (_, variable) = KNOWN_HOSTS.iter().find(|(host, _)| path.contains(host))?;
        let token = env(variable).filter(|token| !token.trim().is_empty())?;
        Some(Self {
            username: TOKEN_USERNAME.to_string(),
            token,
        })
    }

    /// Value for an `Authorization` HTTP header
    pub fn basic_auth_header(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.token));
        format!("Authorization: Basic {encoded}")
    }

    /// Environment overrides that make the git CLI send this credential
    ///
    /// The header travels through `GIT_CONFIG_*` variables so the token never
    /// appears in the process arguments.
    pub fn git_env(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_CONFIG_COUNT".to_string(), "1".to_string()),
            ("GIT_CONFIG_KEY_0".to_string(), "http.extraHeader".to_string()),
            ("GIT_CONFIG_VALUE_0".to_string(), self.basic_auth_header()),
        ]
    }
}
