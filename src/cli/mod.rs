//! CLI argument parsing module
//!
//! Handles command-line interface using clap, including:
//! - Application exposure options (default app, restricted mode, allow-list)
//! - Network options (port, bind address)
//! - Mode selection (supervised, single process, kill)
//! - Tool overrides and verbosity

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// Raw command-line flags, merged with the project file by `SpawnConfig::resolve`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub default_app: Option<String>,
    pub only: bool,
    pub allow: Vec<String>,
    pub nophp: Option<Vec<String>>,
    pub path: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub all: bool,
    pub tail: bool,
    pub kill: bool,
    pub single_process: bool,
    pub config: Option<PathBuf>,
    pub lighttpd_cmd: Option<PathBuf>,
    pub php_cgi_cmd: Option<String>,
    pub verbose: u8,
}

pub fn command() -> Command {
    Command::new("lightspawn")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serve a PHP project with lighttpd, without configuring it")
        .long_about(
            "Generates a lighttpd configuration from the project's web directory, runs the server \
             in the foreground and restarts it when files appear or disappear in the web root.",
        )
        .arg(
            Arg::new("default")
                .long("default")
                .value_name("APP")
                .help("Default application, served for unmatched URLs [default: index]"),
        )
        .arg(
            Arg::new("only")
                .long("only")
                .help("Only the default application and the allowed ones are executable")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("allow")
                .long("allow")
                .value_name("APPS")
                .value_delimiter(',')
                .help("Comma-separated applications allowed in restricted mode (glob patterns accepted)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("nophp")
                .long("nophp")
                .value_name("DIRS")
                .value_delimiter(',')
                .help("Comma-separated directories where PHP execution is denied [default: uploads]")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("path")
                .long("path")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Web directory to serve [default: ./web]"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16).range(1..))
                .help("Port to listen on [default: 4042]"),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDR")
                .conflicts_with("all")
                .help("Address to bind [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("all")
                .short('a')
                .long("all")
                .help("Bind every interface")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tail")
                .short('t')
                .long("tail")
                .help("Print the server access and error logs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("kill")
                .short('K')
                .long("kill")
                .help("Stop the server started earlier for this project")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("single-process")
                .short('s')
                .long("single-process")
                .help("Run the server once, without watching the web directory")
                .conflicts_with("kill")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Project configuration file [default: ./lightspawn.toml when present]"),
        )
        .arg(
            Arg::new("lighttpd-cmd")
                .long("lighttpd-cmd")
                .value_name("CMD")
                .value_parser(clap::value_parser!(PathBuf))
                .help("lighttpd executable, skips the PATH lookup"),
        )
        .arg(
            Arg::new("php-cgi-cmd")
                .long("php-cgi-cmd")
                .value_name("CMD")
                .help("php-cgi executable used by the FastCGI backend"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    Ok(from_matches(&command().get_matches()))
}

/// Parse an explicit argument list, reporting errors instead of exiting
pub fn parse_args_from<I, T>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Ok(from_matches(&matches))
}

fn from_matches(matches: &ArgMatches) -> CliArgs {
    let list = |id: &str| -> Option<Vec<String>> {
        matches.get_many::<String>(id).map(|values| {
            values
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect()
        })
    };

    CliArgs {
        default_app: matches.get_one::<String>("default").cloned(),
        only: matches.get_flag("only"),
        allow: list("allow").unwrap_or_default(),
        nophp: list("nophp"),
        path: matches.get_one::<PathBuf>("path").cloned(),
        port: matches.get_one::<u16>("port").copied(),
        bind: matches.get_one::<String>("bind").cloned(),
        all: matches.get_flag("all"),
        tail: matches.get_flag("tail"),
        kill: matches.get_flag("kill"),
        single_process: matches.get_flag("single-process"),
        config: matches.get_one::<PathBuf>("config").cloned(),
        lighttpd_cmd: matches.get_one::<PathBuf>("lighttpd-cmd").cloned(),
        php_cgi_cmd: matches.get_one::<String>("php-cgi-cmd").cloned(),
        verbose: matches.get_count("verbose"),
    }
}
