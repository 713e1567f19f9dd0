use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

/// CLI arguments for relay-server
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub allow_signup: Option<bool>,
    pub jwt_secret: Option<String>,
    pub jwt_expiration_secs: Option<u64>,
    pub bcrypt_cost: Option<u32>,
    pub config_file: Option<PathBuf>,
    pub max_request_size: Option<usize>,
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Parse command line arguments
    pub fn parse() -> Self {
        let matches = Command::new("relay-server")
            .version(relay::VERSION)
            .author("Relay Contributors")
            .about("HTTP API server for the Relay social graph")
            .long_about(
                r#"Relay Server exposes accounts, friend requests and channels over a
JSON REST API backed by embedded SurrealDB.

The server can be configured through command line arguments or environment
variables. Command line arguments take precedence over environment variables.
Storage and logging settings come from the Relay configuration file given
with --config, layered with RELAY_* variables.

Examples:
  relay-server --port 8080
  relay-server --config relay.toml --allow-signup=false
  relay-server --jwt-expiration 900 --log-level debug"#,
            )
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .help("Port to listen on")
                    .long_help(
                        "Port number for the HTTP server to listen on.
Environment variable: RELAY_PORT",
                    )
                    .value_hint(ValueHint::Other)
                    .value_parser(clap::value_parser!(u16)),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Relay configuration file path")
                    .long_help(
                        "Path to a TOML, YAML or JSON Relay configuration file. It is
merged with RELAY_* environment variables.
Environment variable: RELAY_CONFIG_FILE",
                    )
                    .value_hint(ValueHint::FilePath)
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("allow_signup")
                    .long("allow-signup")
                    .value_name("BOOL")
                    .help("Allow user registration")
                    .long_help(
                        "Allow new users to register accounts via the register API.
Environment variable: RELAY_ALLOW_SIGNUP",
                    )
                    .value_parser(clap::value_parser!(bool)),
            )
            .arg(
                Arg::new("jwt_secret")
                    .long("jwt-secret")
                    .value_name("SECRET")
                    .help("JWT signing secret")
                    .long_help(
                        "Secret key used for signing access tokens. If not provided,
one is generated at startup and tokens do not survive a restart.
Environment variable: RELAY_JWT_SECRET",
                    )
                    .value_hint(ValueHint::Other),
            )
            .arg(
                Arg::new("jwt_expiration")
                    .long("jwt-expiration")
                    .value_name("SECONDS")
                    .help("Access token lifetime in seconds")
                    .long_help(
                        "How long access tokens remain valid. Default is 3600 seconds.
Environment variable: RELAY_JWT_EXPIRATION_SECS",
                    )
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                Arg::new("bcrypt_cost")
                    .long("bcrypt-cost")
                    .value_name("COST")
                    .help("bcrypt work factor for password hashes")
                    .long_help(
                        "bcrypt cost used when hashing new passwords (4-31).
Environment variable: RELAY_BCRYPT_COST",
                    )
                    .value_parser(clap::value_parser!(u32).range(4..=31)),
            )
            .arg(
                Arg::new("max_request_size")
                    .long("max-request-size")
                    .value_name("BYTES")
                    .help("Maximum request body size in bytes")
                    .long_help(
                        "Maximum size allowed for HTTP request bodies.
Larger requests will be rejected.
Environment variable: RELAY_MAX_REQUEST_SIZE",
                    )
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                Arg::new("log_level")
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Logging level")
                    .long_help(
                        "Set the logging level. Valid values: error, warn, info, debug, trace
Environment variable: RUST_LOG",
                    )
                    .value_parser(["error", "warn", "info", "debug", "trace"]),
            )
            .arg(
                Arg::new("help_env")
                    .long("help-env")
                    .help("Show all environment variables")
                    .action(ArgAction::SetTrue),
            )
            .get_matches();

        if matches.get_flag("help_env") {
            Self::print_env_help();
            std::process::exit(0);
        }

        Self {
            port: matches.get_one::<u16>("port").copied(),
            allow_signup: matches.get_one::<bool>("allow_signup").copied(),
            jwt_secret: matches.get_one::<String>("jwt_secret").cloned(),
            jwt_expiration_secs: matches.get_one::<u64>("jwt_expiration").copied(),
            bcrypt_cost: matches.get_one::<u32>("bcrypt_cost").copied(),
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            max_request_size: matches.get_one::<usize>("max_request_size").copied(),
            log_level: matches.get_one::<String>("log_level").cloned(),
        }
    }

    fn print_env_help() {
        println!("Relay Server Environment Variables");
        println!("==================================");
        println!();
        println!("Server:");
        println!("  RELAY_PORT                     - Server port (default: 8080)");
        println!("  RELAY_MAX_REQUEST_SIZE         - Max request body size in bytes (default: 1MB)");
        println!("  RELAY_CONFIG_FILE              - Relay configuration file");
        println!();
        println!("Authentication:");
        println!("  RELAY_JWT_SECRET               - Token signing secret (generated if not set)");
        println!("  RELAY_JWT_EXPIRATION_SECS      - Token lifetime in seconds (default: 3600)");
        println!("  RELAY_BCRYPT_COST              - bcrypt cost (default: 12)");
        println!("  RELAY_ALLOW_SIGNUP             - Allow user registration (default: true)");
        println!();
        println!("Storage and logging (nested keys use a double underscore):");
        println!("  RELAY_STORAGE__DATA_DIR        - Data directory for RocksDB");
        println!("  RELAY_STORAGE__QUERY_TIMEOUT   - Per-query timeout, e.g. 5s");
        println!("  RELAY_STORAGE__SURREALDB__ENGINE    - Memory or RocksDB");
        println!("  RELAY_STORAGE__SURREALDB__NAMESPACE - SurrealDB namespace (default: relay)");
        println!("  RELAY_STORAGE__SURREALDB__DATABASE  - SurrealDB database (default: main)");
        println!("  RELAY_LOGGING__FORMAT          - default, json, compact or pretty");
        println!();
        println!("Logging:");
        println!("  RUST_LOG                       - Log filter (error, warn, info, debug, trace)");
        println!();
        println!("Note: Command line arguments take precedence over environment variables.");
    }
}
