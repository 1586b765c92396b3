// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse argv, run one command.
// - Any error is printed once here and turns into exit status 1.

use crossterm::style::Stylize;
use intool_cli::api::RemoteError;
use intool_cli::commands::{CommandRegistry, Context};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr and stay quiet unless RUST_LOG asks for more.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let registry = CommandRegistry::builtin();
    let invocation = registry
        .parse(std::env::args_os())
        .unwrap_or_else(|e| e.exit());

    let result = Context::from_env().and_then(|mut ctx| registry.dispatch(&mut ctx, invocation));
    if let Err(e) = result {
        match e.downcast_ref::<RemoteError>() {
            Some(remote) => eprintln!("{} {}", "Error:".red().bold(), remote.styled()),
            None => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}
