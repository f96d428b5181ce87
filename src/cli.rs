use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// A `KEY=VALUE` filter given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(FilterArg {
                key: key.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(format!(
                "Invalid filter: {}. Please use KEY=VALUE (e.g. filters[role]=2)",
                s
            )),
        }
    }
}

/// Browse and manage admin resource collections behind their permission checks
#[derive(Parser, Debug)]
#[command(name = "admin-collections")]
#[command(version)]
#[command(about = "Browse and manage admin resource collections behind their permission checks", long_about = None)]
pub struct Args {
    /// Path to a config file (.yml, .yaml or .toml). Defaults to
    /// ./admin-collections.config.yml when present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the admin API (overrides the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// API token (overrides ADMIN_API_TOKEN and the config file)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the known resource classes (no network access)
    Resources,

    /// Show one page of a collection
    List {
        /// Resource class, e.g. roles or users
        class: String,

        /// Free-text search over the class's searchable fields
        #[arg(short, long)]
        search: Option<String>,

        /// Page number (1-based)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        page: Option<u32>,

        /// Rows per page
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: Option<u32>,

        /// Backend filter; can be specified multiple times: -f role=2 -f isActive=true
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filter: Vec<FilterArg>,
    },

    /// Delete one or more records after confirmation
    Delete {
        /// Resource class, e.g. roles or users
        class: String,

        /// Ids of the records to delete
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_filter_arg_from_str() {
        let filter = FilterArg::from_str("filters[role]=2").unwrap();
        assert_eq!(filter.key, "filters[role]");
        assert_eq!(filter.value, "2");

        let empty_value = FilterArg::from_str("isActive=").unwrap();
        assert_eq!(empty_value.value, "");
    }

    #[test]
    fn test_filter_arg_invalid() {
        let error = FilterArg::from_str("no-separator").unwrap_err();
        assert!(error.contains("Invalid filter"));
        assert!(FilterArg::from_str("=value").is_err());
    }

    #[test]
    fn test_parse_list_command() {
        let args = Args::try_parse_from([
            "admin-collections",
            "list",
            "users",
            "--search",
            "ann",
            "--page",
            "2",
            "-f",
            "isActive=true",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::List {
                class,
                search,
                page,
                filter,
                ..
            } => {
                assert_eq!(class, "users");
                assert_eq!(search.as_deref(), Some("ann"));
                assert_eq!(page, Some(2));
                assert_eq!(filter.len(), 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete_requires_ids() {
        assert!(Args::try_parse_from(["admin-collections", "delete", "roles"]).is_err());

        let args =
            Args::try_parse_from(["admin-collections", "delete", "roles", "3", "4", "--yes"])
                .unwrap();
        match args.command {
            Command::Delete { ids, yes, .. } => {
                assert_eq!(ids, vec!["3".to_string(), "4".to_string()]);
                assert!(yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_page_zero_is_rejected() {
        assert!(
            Args::try_parse_from(["admin-collections", "list", "users", "--page", "0"]).is_err()
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "admin-collections",
            "resources",
            "--base-url",
            "http://localhost:1337",
        ])
        .unwrap();
        assert_eq!(args.base_url.as_deref(), Some("http://localhost:1337"));
    }
}
