// `intool serve`: check the project is runnable locally, then start the
// development server.

use anyhow::Result;
use crossterm::style::Stylize;
use tracing::debug;

use super::{Command, CommandHelp, Context, Params};
use crate::environment::{self, Strictness};
use crate::local_server::{ServerOptions, SERVE_PORT};

pub struct ServeCommand;

impl Command for ServeCommand {
    fn name(&self) -> &'static str {
        "serve"
    }

    fn help(&self) -> CommandHelp {
        CommandHelp {
            description: "Starts a development server using package.json[\"scripts\"][\"start\"]",
            args: &[],
            flags: &[],
            vflags: &[("port", "specify a port to run on")],
        }
    }

    // `--port` is accepted for compatibility; the server always binds SERVE_PORT.
    fn run(&self, ctx: &mut Context, params: Params) -> Result<()> {
        if let Some(port) = params.vflag("port") {
            debug!(requested = port, using = SERVE_PORT, "ignoring --port");
        }

        let project = environment::load(&ctx.cwd, Strictness::Strict)?;
        if let Some(project) = &project {
            let name = project.manifest.name().unwrap_or("package");
            let version = project.manifest.version().unwrap_or("0.0.0");
            println!(
                "{} {}@{} on {}",
                "Serving".blue().bold(),
                name,
                version,
                format!("http://localhost:{}", SERVE_PORT).green()
            );
        }

        ctx.launcher.run(&ServerOptions {
            root: ctx.cwd.clone(),
            port: SERVE_PORT,
        })
    }
}
