//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::{LogFormat, LogLevel, LogSettings};

#[derive(Debug, Parser)]
#[command(name = "idlc")]
#[command(about = "Compile one interface description into V8 bindings", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory receiving V8<Interface>.h and V8<Interface>.cpp
    #[arg(long, value_name = "DIR")]
    pub output_directory: PathBuf,

    /// JSON side-table of cross-interface metadata
    #[arg(long, value_name = "FILE")]
    pub interfaces_info_file: Option<PathBuf>,

    /// Leave output files untouched when their contents would not change
    #[arg(long)]
    pub write_file_only_if_changed: bool,

    /// Description file whose enums, callbacks, typedefs and interfaces are
    /// registered but not compiled
    #[arg(long = "dependency", value_name = "IDL")]
    pub dependencies: Vec<PathBuf>,

    /// error, warn, info, debug or trace
    #[arg(long, value_parser = parse_level)]
    pub log_level: Option<LogLevel>,

    /// auto, text or json
    #[arg(long, value_parser = parse_format)]
    pub log_format: Option<LogFormat>,

    /// The description file to compile
    pub input: PathBuf,
}

impl Cli {
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            format: self.log_format,
            level: self.log_level,
        }
    }
}

fn parse_level(spec: &str) -> Result<LogLevel, String> {
    LogLevel::parse(spec).ok_or_else(|| format!("unknown log level '{spec}'"))
}

fn parse_format(spec: &str) -> Result<LogFormat, String> {
    LogFormat::parse(spec).ok_or_else(|| format!("unknown log format '{spec}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_invocation() {
        let cli = Cli::try_parse_from([
            "idlc",
            "--output-directory",
            "out",
            "--interfaces-info-file",
            "info.json",
            "--write-file-only-if-changed",
            "--dependency",
            "Node.idl",
            "--dependency",
            "Event.idl",
            "--log-level",
            "debug",
            "Widget.idl",
        ])
        .unwrap();
        assert_eq!(cli.output_directory, PathBuf::from("out"));
        assert_eq!(cli.interfaces_info_file, Some(PathBuf::from("info.json")));
        assert!(cli.write_file_only_if_changed);
        assert_eq!(cli.dependencies.len(), 2);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, None);
        assert_eq!(cli.input, PathBuf::from("Widget.idl"));
    }

    #[test]
    fn output_directory_is_required() {
        assert!(Cli::try_parse_from(["idlc", "Widget.idl"]).is_err());
    }

    #[test]
    fn exactly_one_input() {
        assert!(Cli::try_parse_from(["idlc", "--output-directory", "out"]).is_err());
        assert!(
            Cli::try_parse_from(["idlc", "--output-directory", "out", "A.idl", "B.idl"]).is_err()
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        let parsed = Cli::try_parse_from([
            "idlc",
            "--output-directory",
            "out",
            "--log-format",
            "xml",
            "Widget.idl",
        ]);
        assert!(parsed.is_err());
    }
}
