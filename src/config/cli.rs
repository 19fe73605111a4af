use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "weekend-fares")]
#[command(about = "Search cheap weekend flights and write a summary of the matches")]
pub struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "weekend-fares.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Show configuration and generated date ranges without searching
    #[arg(long)]
    pub dry_run: bool,

    /// Override search.first_friday (YYYY-MM-DD); snapped forward to a Friday
    #[arg(long)]
    pub first_friday: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "weekend-fares",
            "--config",
            "fares.toml",
            "--dry-run",
            "--first-friday",
            "2026-03-27",
        ]);
        assert_eq!(args.config, "fares.toml");
        assert!(args.dry_run);
        assert!(!args.verbose);
        assert_eq!(args.first_friday.as_deref(), Some("2026-03-27"));
    }

    #[test]
    fn test_default_config_path() {
        let args = Args::parse_from(["weekend-fares"]);
        assert_eq!(args.config, "weekend-fares.toml");
    }
}
