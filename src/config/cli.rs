use crate::config::toml_config::ConsoleConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cutter-console")]
#[command(about = "Interactive console for the materials cutter backend")]
pub struct CliArgs {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Use an already running backend instead of starting one")]
    pub attach: bool,
}

impl CliArgs {
    /// 沒有指定設定檔時使用預設值
    pub fn load_config(&self) -> Result<ConsoleConfig> {
        match &self.config {
            Some(path) => ConsoleConfig::from_file(path),
            None => Ok(ConsoleConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_uses_defaults() {
        let args = CliArgs::parse_from(["cutter-console"]);
        assert!(!args.attach);
        assert!(args.config.is_none());

        let config = args.load_config().unwrap();
        assert_eq!(config.backend.host, "127.0.0.1:8000");
    }

    #[test]
    fn test_flags() {
        let args = CliArgs::parse_from([
            "cutter-console",
            "--attach",
            "--verbose",
            "--config",
            "console.toml",
        ]);
        assert!(args.attach);
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("console.toml")));
    }
}
