/// Client configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST API origin (e.g. `https://invite-backend.example.com`).
    pub api_url: String,
    /// Host (and optional port) of the real-time gateway. Defaults to the
    /// host portion of `api_url`.
    pub gateway_host: String,
    /// Unauthenticated entry point; terminal destination when the session
    /// cannot be recovered.
    pub entry_path: String,
    /// Default landing path after login when no navigation is pending.
    pub landing_path: String,
    /// Path of the JSON file backing the persistent session store.
    pub store_path: String,
    /// Fixed delay before falling back to the next channel transport (ms).
    pub fallback_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        let api_url = required_var("INVITA_API_URL");
        let gateway_host = std::env::var("INVITA_GATEWAY_HOST")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| host_of(&api_url));

        Self {
            api_url,
            gateway_host,
            entry_path: var_or("INVITA_ENTRY_PATH", "/"),
            landing_path: var_or("INVITA_LANDING_PATH", "/home"),
            store_path: var_or("INVITA_STORE_PATH", "invita-session.json"),
            fallback_delay_ms: std::env::var("INVITA_FALLBACK_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Strip the scheme and any path from an origin, leaving `host[:port]`.
fn host_of(origin: &str) -> String {
    let no_scheme = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .unwrap_or(origin);
    no_scheme
        .split('/')
        .next()
        .unwrap_or(no_scheme)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_strips_scheme_and_path() {
        assert_eq!(host_of("https://api.example.com/v1"), "api.example.com");
        assert_eq!(host_of("http://localhost:5000"), "localhost:5000");
        assert_eq!(host_of("api.example.com"), "api.example.com");
    }
}
