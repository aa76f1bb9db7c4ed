//! Command-line surface for `postgrid-cli`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "postgrid-cli", version, about = "postgrid cache administration", long_about = None)]
pub struct Cli {
    /// Cache database path (defaults to the configured db_path)
    #[arg(long, env = "POSTGRID_DB_PATH", value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove every cached grid payload
    Flush,
    /// Delete expired cache entries and rate windows
    Purge,
    /// Print cache entry counts as JSON
    Stats,
    /// Print the cache key for a set of grid attributes
    Key(KeyArgs),
}

#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Grid attributes as a JSON object
    #[arg(long, default_value = "{}")]
    pub attributes: String,

    /// Read path the key belongs to
    #[arg(long, value_enum, default_value_t = KeySourceArg::Rest)]
    pub source: KeySourceArg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeySourceArg {
    Rest,
    Render,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_command() {
        let cli = Cli::parse_from(["postgrid-cli", "--db", "/tmp/c.sqlite", "key", "--attributes", r#"{"columns":2}"#, "--source", "render"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/c.sqlite")));
        match cli.command {
            Commands::Key(args) => {
                assert_eq!(args.source, KeySourceArg::Render);
                assert_eq!(args.attributes, r#"{"columns":2}"#);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_key_defaults() {
        let cli = Cli::parse_from(["postgrid-cli", "key"]);
        match cli.command {
            Commands::Key(args) => {
                assert_eq!(args.source, KeySourceArg::Rest);
                assert_eq!(args.attributes, "{}");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
