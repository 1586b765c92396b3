// Configuration helpers: where the registry lives and where local session
// state is written. Everything here is derived once per invocation.

use std::path::PathBuf;

/// Registry used when neither a `-h` flag nor `INTOOL_HOST` is given.
pub const DEFAULT_HOST: &str = "https://api.instant.bot";

/// Environment variable that overrides the default registry host.
pub const HOST_ENV: &str = "INTOOL_HOST";

/// Environment variable that overrides the credentials file location.
pub const CREDENTIALS_ENV: &str = "INTOOL_CREDENTIALS";

/// Resolve the registry base URL from an optional `-h` flag value.
///
/// The flag wins over `INTOOL_HOST`, which wins over [`DEFAULT_HOST`].
/// Empty values count as missing.
pub fn resolve_host(flag: Option<&str>) -> String {
    let env = std::env::var(HOST_ENV).ok();
    host_from(flag, env.as_deref())
}

fn host_from(flag: Option<&str>, env: Option<&str>) -> String {
    let host = flag
        .filter(|h| !h.is_empty())
        .or(env.filter(|h| !h.is_empty()))
        .unwrap_or(DEFAULT_HOST);
    with_scheme(host)
}

/// Prefix `http://` for `localhost` hosts and `https://` for anything else,
/// leaving hosts that already carry a scheme alone.
pub fn with_scheme(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else if host.starts_with("localhost") {
        format!("http://{}", host)
    } else {
        format!("https://{}", host)
    }
}

/// Location of the saved login session.
pub fn credentials_path() -> PathBuf {
    if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(".intool").join("credentials.json")
}
