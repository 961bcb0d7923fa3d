//! Configuration and CLI argument handling

use clap::Parser;

use crate::state::RetryMode;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "reconnect-coordinator")]
#[command(about = "Countdown-driven reconnect coordination with an HTTP control surface")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Seconds to wait before retrying when a failure report does not say
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
    pub countdown: u32,

    /// Report a connection failure with this message at startup
    #[arg(long, value_name = "MESSAGE")]
    pub simulate_failure: Option<String>,

    /// Retry mode for the simulated failure
    #[arg(long, value_enum, default_value = "quick")]
    pub mode: RetryMode,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["reconnect-coordinator"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.countdown, 5);
        assert_eq!(config.mode, RetryMode::Quick);
        assert_eq!(config.simulate_failure, None);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn simulated_full_failure() {
        let config = Config::try_parse_from([
            "reconnect-coordinator",
            "--simulate-failure",
            "gateway unreachable",
            "--mode",
            "full",
            "-c",
            "3",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.simulate_failure.as_deref(), Some("gateway unreachable"));
        assert_eq!(config.mode, RetryMode::Full);
        assert_eq!(config.countdown, 3);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn zero_countdown_is_rejected_at_parse_time() {
        let result = Config::try_parse_from(["reconnect-coordinator", "-c", "0"]);
        assert!(result.is_err());

        let config = Config::try_parse_from(["reconnect-coordinator", "-c", "1"]).unwrap();
        assert_eq!(config.countdown, 1);
    }
}
