use crate::report::RateColumns;
use anyhow::{Result, bail};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dns-query-counter")]
#[command(about = "Count DNS A queries seen on the wire and report them periodically", long_about = None)]
pub struct Args {
    /// Interface to capture on (auto-selected when omitted)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Count sources querying this hostname instead of counting hostnames.
    /// Matched exactly, written without a trailing dot (example.com, not example.com.)
    #[arg(short = 'H', long)]
    pub hostname: Option<String>,

    /// Seconds between reports
    #[arg(short = 'n', long, default_value_t = 60)]
    pub interval: u64,

    /// Pad report lines to this many columns instead of printing a table
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Rate columns shown on interval reports
    #[arg(long, value_enum, default_value_t = RateColumns::Both)]
    pub rates: RateColumns,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub list_interfaces: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            bail!("Reporting interval must be at least 1 second");
        }
        if self.width == Some(0) {
            bail!("Output width must be at least 1 column");
        }
        Ok(())
    }

    pub fn report_period(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn log_filter(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["dns-query-counter"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.report_period(), Duration::from_secs(60));
        assert_eq!(args.hostname, None);
        assert_eq!(args.width, None);
        assert_eq!(args.rates, RateColumns::Both);
        assert_eq!(args.log_filter(), "info");
    }

    #[test]
    fn test_short_flags() {
        let args = Args::parse_from([
            "dns-query-counter",
            "-i",
            "eth1",
            "-H",
            "x.com",
            "-n",
            "5",
            "-w",
            "100",
            "-v",
            "--rates",
            "lifetime",
        ]);
        assert_eq!(args.interface.as_deref(), Some("eth1"));
        assert_eq!(args.hostname.as_deref(), Some("x.com"));
        assert_eq!(args.report_period(), Duration::from_secs(5));
        assert_eq!(args.width, Some(100));
        assert_eq!(args.rates, RateColumns::Lifetime);
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_hostname_help_mentions_trailing_dot() {
        let command = Args::command();
        let help = command
            .get_arguments()
            .find(|arg| arg.get_id() == "hostname")
            .and_then(|arg| arg.get_long_help().or(arg.get_help()))
            .map(|help| help.to_string())
            .unwrap_or_default();
        assert!(help.contains("without a trailing dot"));
    }

    #[test]
    fn test_rejects_zero_interval_and_width() {
        let args = Args::parse_from(["dns-query-counter", "--interval", "0"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["dns-query-counter", "--width", "0"]);
        assert!(args.validate().is_err());
    }
}
