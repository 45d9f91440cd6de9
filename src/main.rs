//! ctxlog CLI entry point.

use clap::Parser;

use ctxlog::cli::{commands, handle_error, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Serve(args) => commands::serve::execute(args, config).await,
            Commands::Emit(args) => commands::emit::execute(args, &config),
            Commands::Sweep(args) => commands::sweep::execute(args, &config, cli.json),
            Commands::Config(args) => commands::config::execute(args, config, cli.json),
        },
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        handle_error(&err, cli.json);
    }
}
