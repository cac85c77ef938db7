use std::fmt;

/// Classified error returned by the client core.
///
/// Authorization failures never reach callers as `Api { status: 401 }` —
/// the gateway resolves them internally and surfaces `SessionExpired` only
/// when the refresh path is exhausted.
#[derive(Debug)]
pub enum ClientError {
    /// The request never completed (connect/timeout/TLS).
    Transport(reqwest::Error),
    /// The server answered with a non-success status the gateway does not
    /// handle itself.
    Api { status: u16, message: String },
    /// A response or frame body failed to parse.
    Decode(String),
    /// The refresh cycle failed or the retry budget was spent. The session
    /// has already been cleared and the navigator pointed at the entry path.
    SessionExpired,
    /// The operation needs a signed-in identity and the store has none.
    SignInRequired,
    /// A single channel connection attempt failed (feeds transport
    /// fallback; not surfaced until every transport is exhausted).
    Channel(String),
    /// The channel could not connect on any configured transport.
    ChannelExhausted { attempts: u32 },
    /// The channel task is gone (closed or already torn down).
    ChannelClosed,
}

impl ClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "transport error: {e}"),
            ClientError::Api { status, message } => {
                write!(f, "api error ({status}): {message}")
            }
            ClientError::Decode(message) => write!(f, "decode error: {message}"),
            ClientError::SessionExpired => write!(f, "session expired"),
            ClientError::SignInRequired => write!(f, "sign-in required"),
            ClientError::Channel(message) => write!(f, "channel error: {message}"),
            ClientError::ChannelExhausted { attempts } => {
                write!(f, "channel exhausted after {attempts} attempts")
            }
            ClientError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        ClientError::Transport(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
