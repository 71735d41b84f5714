//! Reply-probe binary entry point.

use tracing::info;

use reply_probe::{app, cli, logging, Config};

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("try 'reply-probe --help'");
            std::process::exit(2);
        }
    };

    if args.help {
        cli::print_help();
        return;
    }
    if args.version {
        cli::print_version();
        return;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    logging::init_with(config.log_filter());

    info!("reply-probe v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = app::run(config).await {
        tracing::error!("fatal: {e}");
        std::process::exit(1);
    }
}
