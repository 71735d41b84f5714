//! Command-line interface for reply-probe.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Bot API token (overrides config file and environment).
    pub token: Option<String>,
    /// Display name used in message text.
    pub bot_name: Option<String>,
    /// Pipe-delimited prompt script.
    pub script: Option<String>,
    /// Minimum inter-prompt delay in seconds.
    pub min_delay: Option<f64>,
    /// Maximum inter-prompt delay in seconds.
    pub max_delay: Option<f64>,
    /// Bot role: "responder" or "starter".
    pub role: Option<String>,
    /// Comma-separated peer bot handles for the starter message.
    pub peer_bots: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("token") => {
                result.token = Some(parser.value()?.parse()?);
            }
            Short('n') | Long("bot-name") => {
                result.bot_name = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("script") => {
                result.script = Some(parser.value()?.parse()?);
            }
            Long("min-delay") => {
                let value: String = parser.value()?.parse()?;
                result.min_delay = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("min-delay", value))?,
                );
            }
            Long("max-delay") => {
                let value: String = parser.value()?.parse()?;
                result.max_delay = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("max-delay", value))?,
                );
            }
            Short('r') | Long("role") => {
                result.role = Some(parser.value()?.parse()?);
            }
            Long("peer-bots") => {
                result.peer_bots = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"reply-probe {version}
Scripted reply-latency probe bot for Telegram

USAGE:
    reply-probe [OPTIONS]

OPTIONS:
    -c, --config <FILE>     Path to configuration file (JSON)
    -t, --token <TOKEN>     Bot API token
    -n, --bot-name <NAME>   Display name used in messages [default: TestBot]
    -s, --script <SCRIPT>   Pipe-delimited prompt script
        --min-delay <SECS>  Minimum inter-prompt delay [default: 5]
        --max-delay <SECS>  Maximum inter-prompt delay [default: 10]
    -r, --role <ROLE>       Bot role: responder or starter [default: responder]
        --peer-bots <LIST>  Comma-separated peer bot handles (starter role)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    BOT_TOKEN               Bot API token (required)
    BOTNAME                 Display name used in messages
    SCRIPT                  Pipe-delimited prompt script
    MIN_DELAY               Minimum inter-prompt delay in seconds
    MAX_DELAY               Maximum inter-prompt delay in seconds
    BOT_ROLE                Bot role: responder or starter
    PEER_BOTS               Comma-separated peer bot handles
    REPLY_PROBE_LOG_LEVEL   Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Run the probe bot with a custom script
    BOT_TOKEN=123:ABC reply-probe -s "Hey|What's up?|And now?"

    # Run the test-creator bot
    BOT_TOKEN=456:DEF reply-probe -r starter --peer-bots "@AliceBot,@BobBot"
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("reply-probe {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
