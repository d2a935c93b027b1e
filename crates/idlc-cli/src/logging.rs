//! Log configuration for the `idlc` binary.
//!
//! Command-line flags win over `IDLC_LOG_FORMAT` / `IDLC_LOG_LEVEL`, which
//! win over the defaults (`auto`, `warn`). `RUST_LOG`, when set, replaces the
//! level filter entirely.

use std::env;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Auto,
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Auto => "auto",
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

/// Effective log configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogOptions {
    pub const DEFAULT: Self = Self {
        format: LogFormat::Auto,
        level: LogLevel::Warn,
    };

    /// `Auto` becomes `Text`.
    #[must_use]
    pub fn resolved(self) -> Self {
        let format = match self.format {
            LogFormat::Auto => LogFormat::Text,
            other => other,
        };
        Self { format, ..self }
    }
}

/// Overrides taken from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSettings {
    pub format: Option<LogFormat>,
    pub level: Option<LogLevel>,
}

impl LogSettings {
    #[must_use]
    pub fn merged_with_env(self) -> LogOptions {
        let format = env::var("IDLC_LOG_FORMAT").ok();
        let level = env::var("IDLC_LOG_LEVEL").ok();
        self.merged_with(format.as_deref(), level.as_deref())
    }

    fn merged_with(self, env_format: Option<&str>, env_level: Option<&str>) -> LogOptions {
        let base = LogOptions::DEFAULT;
        LogOptions {
            format: self
                .format
                .or_else(|| env_format.and_then(LogFormat::parse))
                .unwrap_or(base.format),
            level: self
                .level
                .or_else(|| env_level.and_then(LogLevel::parse))
                .unwrap_or(base.level),
        }
        .resolved()
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(options: LogOptions) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{fmt, EnvFilter};

    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.level.to_string()));
        let builder = fmt::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true);

        let installed = match options.format {
            LogFormat::Json => {
                tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
            }
            _ => {
                let ansi = env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
                tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
            }
        };
        // Another subscriber already installed (tests) is fine.
        let _ = installed;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_names() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("plain"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("yaml"), None);
        assert_eq!(LogLevel::parse("Warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn flags_override_environment() {
        let settings = LogSettings {
            format: Some(LogFormat::Json),
            level: None,
        };
        let options = settings.merged_with(Some("text"), Some("debug"));
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.level, LogLevel::Debug);
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let options = LogSettings::default().merged_with(None, None);
        assert_eq!(options.format, LogFormat::Text);
        assert_eq!(options.level, LogLevel::Warn);
    }

    #[test]
    fn unparseable_environment_values_are_ignored() {
        let options = LogSettings::default().merged_with(Some("xml"), Some("chatty"));
        assert_eq!(options, LogOptions::DEFAULT.resolved());
    }
}
