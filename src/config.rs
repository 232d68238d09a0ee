//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::countdown::CountdownOptions;

/// What happens when the countdown screen is dismissed mid-countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissPolicy {
    /// Drop the countdown; no call is placed
    Abandon,
    /// Hand the remaining time to the background unit, which places the call
    Continue,
}

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "emergency-gesture")]
#[command(about = "Emergency gesture daemon: countdown, warning sound and emergency call")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Total countdown length in milliseconds
    #[arg(long, default_value = "5000", value_parser = clap::value_parser!(u64).range(1..))]
    pub countdown_millis: u64,

    /// Countdown tick interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_millis: u64,

    /// Place the emergency call when the countdown finishes
    #[arg(long)]
    pub call_on_finish: bool,

    /// Default for the warning sound setting when it was never stored
    #[arg(long)]
    pub warning_sound: bool,

    /// Accept the slide-to-cancel gesture
    #[arg(long)]
    pub slide_to_cancel: bool,

    /// Behaviour when the screen is dismissed before the countdown ends
    #[arg(long, value_enum, default_value = "abandon")]
    pub on_dismiss: DismissPolicy,

    /// Directory holding persisted preferences
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Command used to place calls; the number is appended as last argument
    #[arg(long)]
    pub call_command: Option<String>,

    /// Command that plays the alarm sound
    #[arg(long)]
    pub alarm_command: Option<String>,

    /// Treat the device as having no telephony
    #[arg(long)]
    pub no_telephony: bool,

    /// Platform police emergency numbers, in preference order
    #[arg(long = "emergency-number")]
    pub emergency_numbers: Vec<String>,

    /// Alarm stream volume at startup
    #[arg(long, default_value = "4")]
    pub alarm_volume: i32,

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

    pub fn countdown_options(&self) -> CountdownOptions {
        CountdownOptions {
            enable_call: self.call_on_finish,
            enable_sound: true,
            enable_cancel_gesture: self.slide_to_cancel,
        }
    }

    pub fn countdown_duration(&self) -> Duration {
        Duration::from_millis(self.countdown_millis)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Telephony is only usable with a call command
    pub fn has_telephony(&self) -> bool {
        !self.no_telephony && self.call_command.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let config = Config::try_parse_from(["emergency-gesture"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.countdown_duration(), Duration::from_secs(5));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.on_dismiss, DismissPolicy::Abandon);
        assert!(!config.has_telephony());
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn flags_map_to_countdown_options() {
        let config = Config::try_parse_from([
            "emergency-gesture",
            "--call-on-finish",
            "--slide-to-cancel",
            "--call-command",
            "dialer --emergency",
            "--emergency-number",
            "911",
            "--emergency-number",
            "112",
            "--on-dismiss",
            "continue",
        ])
        .unwrap();

        let options = config.countdown_options();
        assert!(options.enable_call);
        assert!(options.enable_cancel_gesture);
        assert!(config.has_telephony());
        assert_eq!(config.emergency_numbers, vec!["911", "112"]);
        assert_eq!(config.on_dismiss, DismissPolicy::Continue);
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        assert!(Config::try_parse_from(["emergency-gesture", "--tick-millis", "0"]).is_err());
    }

    #[test]
    fn zero_countdown_is_rejected() {
        assert!(Config::try_parse_from(["emergency-gesture", "--countdown-millis", "0"]).is_err());
        let config = Config::try_parse_from(["emergency-gesture", "--countdown-millis", "1"]).unwrap();
        assert_eq!(config.countdown_duration(), Duration::from_millis(1));
    }
}
