use clap::Parser;
use std::path::PathBuf;

/// Dispatches one request against the sample pet store API.
#[derive(Debug, Clone, Parser)]
#[command(name = "api-assembly")]
#[command(about = "Assemble the pet store API and dispatch a single request")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "GET")]
    pub method: String,

    #[arg(long, default_value = "/pets", help = "Request target, may include a query string")]
    pub path: String,

    #[arg(long)]
    pub content_type: Option<String>,

    #[arg(long)]
    pub accept: Option<String>,

    #[arg(long, help = "Request body")]
    pub body: Option<String>,

    #[arg(long, requires = "password")]
    pub user: Option<String>,

    #[arg(long, requires = "user")]
    pub password: Option<String>,

    #[arg(long, help = "Value for the X-API-KEY header")]
    pub api_key: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = CliConfig::try_parse_from(["api-assembly"]).unwrap();
        assert_eq!(cli.method, "GET");
        assert_eq!(cli.path, "/pets");
        assert!(cli.config.is_none());
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_cli_basic_auth_needs_both_parts() {
        let cli = CliConfig::try_parse_from([
            "api-assembly",
            "--method",
            "DELETE",
            "--path",
            "/pets/1",
            "--user",
            "admin",
            "--password",
            "admin",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("admin"));

        assert!(CliConfig::try_parse_from(["api-assembly", "--user", "admin"]).is_err());
    }
}
