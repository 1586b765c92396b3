// Local development server. The project's own `start` script does the
// actual serving; we run it with the port exported and wait for it.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

/// Port `intool serve` binds to.
pub const SERVE_PORT: u16 = 8100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub root: PathBuf,
    pub port: u16,
}

/// Starts the development server for a validated project.
pub trait ServerLauncher {
    fn run(&mut self, options: &ServerOptions) -> Result<()>;
}

/// Runs `npm run start` in the project root with `PORT` set.
#[derive(Debug, Default)]
pub struct NpmStartServer;

impl ServerLauncher for NpmStartServer {
    fn run(&mut self, options: &ServerOptions) -> Result<()> {
        let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
        info!(port = options.port, root = %options.root.display(), "starting development server");
        let status = Command::new(npm)
            .args(["run", "start"])
            .current_dir(&options.root)
            .env("PORT", options.port.to_string())
            .status()
            .with_context(|| format!("Failed to launch `{} run start`", npm))?;
        if !status.success() {
            bail!("Development server exited with {}", status);
        }
        Ok(())
    }
}
