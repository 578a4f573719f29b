use crate::config::SESSION_ENV_VAR;

#[derive(Debug)]
pub enum PortalError {
    /// Session cookie missing, expired, or rejected (HTTP 401/403).
    Unauthorized {
        login_url: String,
    },
    /// Non-success status other than auth failures and 404 on optional reads.
    Status {
        status: u16,
        endpoint: String,
        message: String,
    },
    RateLimit {
        retry_after_seconds: Option<u64>,
    },
    Timeout {
        operation: String,
        duration_ms: u64,
    },
    NetworkError(String),
    Decode {
        endpoint: String,
        message: String,
    },
    IoError(std::io::Error),
}

impl PortalError {
    /// Server-side rejection of the request itself, as opposed to transport trouble.
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, PortalError::Status { status, .. } if (400..500).contains(status))
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PortalError::Timeout {
                operation: err
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_else(|| "request".to_string()),
                duration_ms: 0,
            }
        } else if err.is_decode() {
            PortalError::Decode {
                endpoint: err
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_default(),
                message: err.to_string(),
            }
        } else {
            PortalError::NetworkError(err.to_string())
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::IoError(err)
    }
}

impl std::fmt::Display for PortalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortalError::Unauthorized { login_url } => {
                writeln!(f, "Portal Authentication Error")?;
                writeln!(f, "───────────────────────────")?;
                write!(f, "🔑 Your session is missing or has expired\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(f, "   → Sign in again at: {login_url}")?;
                write!(f, "   → Then export {SESSION_ENV_VAR}=<token cookie value>")
            }
            PortalError::Status {
                status,
                endpoint,
                message,
            } => {
                writeln!(f, "Portal API Error")?;
                writeln!(f, "────────────────")?;
                writeln!(f, "🌐 HTTP {status} from {endpoint}: {message}")?;
                writeln!(f)?;

                match status {
                    400 | 422 => {
                        writeln!(f, "🔧 REQUEST REJECTED:")?;
                        writeln!(f, "   → The service refused the submitted data")?;
                        write!(f, "   → Check the file type, size, and required note")
                    }
                    404 => {
                        writeln!(f, "🔧 RESOURCE NOT FOUND:")?;
                        write!(f, "   → Check api.base_url in ledger-portal.toml")
                    }
                    413 => {
                        writeln!(f, "🔧 FILE TOO LARGE:")?;
                        write!(f, "   → Split or compress the document and retry")
                    }
                    _ => {
                        writeln!(f, "🔧 TROUBLESHOOTING:")?;
                        writeln!(f, "   → Retry the operation; staged files are kept")?;
                        write!(f, "   → Contact your accountant if the problem persists")
                    }
                }
            }
            PortalError::RateLimit {
                retry_after_seconds,
            } => {
                writeln!(f, "Portal Rate Limit Exceeded")?;
                writeln!(f, "──────────────────────────")?;
                match retry_after_seconds {
                    Some(secs) => write!(f, "⏳ Retry in {secs} seconds"),
                    None => write!(f, "⏳ Wait a moment before retrying"),
                }
            }
            PortalError::Timeout {
                operation,
                duration_ms,
            } => {
                writeln!(f, "Portal Operation Timeout")?;
                writeln!(f, "────────────────────────")?;
                if *duration_ms > 0 {
                    write!(f, "⏰ Operation '{operation}' timed out after {duration_ms}ms\n\n")?;
                } else {
                    write!(f, "⏰ Operation '{operation}' timed out\n\n")?;
                }
                writeln!(f, "🔧 RECOMMENDED ACTIONS:")?;
                writeln!(f, "   → Check network connectivity")?;
                write!(f, "   → Retry the operation, or raise api.timeout_seconds")
            }
            PortalError::NetworkError(msg) => {
                writeln!(f, "Portal Network Error")?;
                writeln!(f, "────────────────────")?;
                write!(f, "🌐 {msg}\n\n")?;

                let has_proxy =
                    std::env::var("HTTP_PROXY").is_ok() || std::env::var("HTTPS_PROXY").is_ok();
                if has_proxy {
                    writeln!(f, "🔧 PROXY ENVIRONMENT DETECTED:")?;
                    writeln!(f, "   → Verify proxy settings are correct")?;
                    write!(f, "   → Check proxy authentication")
                } else {
                    writeln!(f, "🔧 LOCAL TROUBLESHOOTING:")?;
                    writeln!(f, "   → Check internet connectivity")?;
                    write!(f, "   → Verify api.base_url points at the portal API")
                }
            }
            PortalError::Decode { endpoint, message } => {
                writeln!(f, "Unexpected Portal Response")?;
                writeln!(f, "──────────────────────────")?;
                write!(f, "📦 Could not read response from {endpoint}: {message}")
            }
            PortalError::IoError(io_err) => {
                writeln!(f, "File System Error")?;
                writeln!(f, "─────────────────")?;
                write!(f, "📁 {io_err}\n\n")?;
                writeln!(f, "🔧 POSSIBLE CAUSES:")?;
                writeln!(f, "   → File permissions issue")?;
                write!(f, "   → File doesn't exist")
            }
        }
    }
}

impl std::error::Error for PortalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PortalError::IoError(e) => Some(e),
            _ => None,
        }
    }
}
