// Command registry and dispatch.
//
// Every command is registered here by name at startup. Each one describes
// its own help (description, positional args, single-letter flags and long
// value-flags); the registry turns those descriptions into a clap parser
// and hands the parsed values to the command as plain `Params`.

use anyhow::{anyhow, Context as _, Result};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

use crate::config;
use crate::local_server::{NpmStartServer, ServerLauncher};
use crate::ui::{Prompter, TerminalPrompter};

pub mod login;
pub mod register;
pub mod serve;

pub use login::LoginCommand;
pub use register::RegisterCommand;
pub use serve::ServeCommand;

const ABOUT: &str = "Instant Tool Package CLI";
const ARGS_ID: &str = "args";

/// Help metadata a command declares about itself. Used to build the
/// parser and the help text; positional args are not checked against it.
#[derive(Debug, Clone, Copy)]
pub struct CommandHelp {
    pub description: &'static str,
    pub args: &'static [&'static str],
    /// `(letter, description)` pairs for `-x [value]` flags.
    pub flags: &'static [(&'static str, &'static str)],
    /// `(name, description)` pairs for `--name value` flags.
    pub vflags: &'static [(&'static str, &'static str)],
}

/// Values parsed for a single command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pub args: Vec<String>,
    pub flags: BTreeMap<String, Vec<String>>,
    pub vflags: BTreeMap<String, Vec<String>>,
}

impl Params {
    /// First non-empty value given for flag `-name`.
    pub fn flag(&self, name: &str) -> Option<&str> {
        first_value(&self.flags, name)
    }

    /// First non-empty value given for value-flag `--name`.
    pub fn vflag(&self, name: &str) -> Option<&str> {
        first_value(&self.vflags, name)
    }
}

fn first_value<'a>(values: &'a BTreeMap<String, Vec<String>>, name: &str) -> Option<&'a str> {
    values
        .get(name)
        .and_then(|v| v.first())
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// A command name together with its parsed params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub params: Params,
}

/// Process-level collaborators shared by all commands.
pub struct Context {
    pub cwd: PathBuf,
    pub credentials_path: PathBuf,
    pub prompter: Box<dyn Prompter>,
    pub launcher: Box<dyn ServerLauncher>,
}

impl Context {
    /// Terminal prompts, `npm run start` and the current directory.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Context {
            cwd,
            credentials_path: config::credentials_path(),
            prompter: Box::new(TerminalPrompter),
            launcher: Box::new(NpmStartServer),
        })
    }
}

pub trait Command {
    fn name(&self) -> &'static str;
    fn help(&self) -> CommandHelp;
    fn run(&self, ctx: &mut Context, params: Params) -> Result<()>;
}

/// Static name -> command table.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every command this CLI ships.
    pub fn builtin() -> Self {
        let mut registry = CommandRegistry::new();
        registry.insert(Box::new(RegisterCommand));
        registry.insert(Box::new(LoginCommand));
        registry.insert(Box::new(ServeCommand));
        registry
    }

    pub fn insert(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Build the clap parser from the registered help metadata.
    pub fn cli(&self) -> clap::Command {
        let mut root = clap::Command::new("intool")
            .about(ABOUT)
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true);
        for command in self.commands.values() {
            root = root.subcommand(subcommand(command.name(), &command.help()));
        }
        root
    }

    /// Parse process arguments (program name first). Help, version and
    /// unknown commands come back as clap errors for the caller to print.
    pub fn parse<I, T>(&self, argv: I) -> Result<Invocation, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cli = self.cli();
        let matches = cli.try_get_matches_from_mut(argv)?;
        let (name, sub) = matches
            .subcommand()
            .ok_or_else(|| cli.error(ErrorKind::MissingSubcommand, "no command given"))?;
        let command = self
            .get(name)
            .ok_or_else(|| cli.error(ErrorKind::InvalidSubcommand, format!("unknown command {name}")))?;

        let help = command.help();
        let mut params = Params {
            args: values(sub, ARGS_ID).unwrap_or_default(),
            ..Params::default()
        };
        for (flag, _) in help.flags {
            if let Some(v) = values(sub, flag) {
                params.flags.insert(flag.to_string(), v);
            }
        }
        for (vflag, _) in help.vflags {
            if let Some(v) = values(sub, vflag) {
                params.vflags.insert(vflag.to_string(), v);
            }
        }
        Ok(Invocation {
            name: name.to_string(),
            params,
        })
    }

    /// Run the named command.
    pub fn dispatch(&self, ctx: &mut Context, invocation: Invocation) -> Result<()> {
        let command = self
            .get(&invocation.name)
            .ok_or_else(|| anyhow!("Command \"{}\" not found", invocation.name))?;
        debug!(command = %invocation.name, params = ?invocation.params.args, "dispatching");
        command.run(ctx, invocation.params)
    }
}

fn subcommand(name: &'static str, help: &CommandHelp) -> clap::Command {
    // `-h` is a host flag here, so clap's own help flag is switched off;
    // `intool help <command>` still works.
    let mut sub = clap::Command::new(name)
        .about(help.description)
        .disable_help_flag(true);
    for (flag, about) in help.flags {
        let Some(short) = flag.chars().next() else {
            continue;
        };
        sub = sub.arg(
            Arg::new(*flag)
                .short(short)
                .help(*about)
                .value_name("VALUE")
                .num_args(0..=1)
                .action(ArgAction::Append),
        );
    }
    for (vflag, about) in help.vflags {
        sub = sub.arg(
            Arg::new(*vflag)
                .long(*vflag)
                .help(*about)
                .value_name("VALUE")
                .num_args(0..=1)
                .action(ArgAction::Append),
        );
    }
    sub.arg(
        Arg::new(ARGS_ID)
            .value_name("ARGS")
            .help(help.args.join(" "))
            .hide(help.args.is_empty())
            .num_args(0..)
            .action(ArgAction::Append),
    )
}

fn values(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    matches.value_source(id)?;
    Some(
        matches
            .get_many::<String>(id)
            .map(|v| v.cloned().collect())
            .unwrap_or_default(),
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_knows_every_command() {
        let registry = CommandRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["login", "register", "serve"]);
    }

    #[test]
    fn host_flag_is_collected_as_a_list() {
        let registry = CommandRegistry::builtin();
        let invocation = registry
            .parse(["intool", "register", "-h", "localhost:3000"])
            .unwrap();
        assert_eq!(invocation.name, "register");
        assert_eq!(invocation.params.flag("h"), Some("localhost:3000"));
        assert_eq!(invocation.params.flags["h"], vec!["localhost:3000"]);
        assert!(invocation.params.vflags.is_empty());
    }

    #[test]
    fn value_flags_and_positional_args() {
        let registry = CommandRegistry::builtin();
        let invocation = registry
            .parse(["intool", "serve", "--port", "9000", "extra"])
            .unwrap();
        assert_eq!(invocation.params.vflag("port"), Some("9000"));
        assert_eq!(invocation.params.args, vec!["extra"]);
    }

    #[test]
    fn flags_after_positional_args_are_still_flags() {
        let registry = CommandRegistry::builtin();
        let invocation = registry
            .parse(["intool", "register", "extra", "-h", "localhost:3000"])
            .unwrap();
        assert_eq!(invocation.params.args, vec!["extra"]);
        assert_eq!(invocation.params.flag("h"), Some("localhost:3000"));
    }

    #[test]
    fn new_registry_is_empty() {
        assert_eq!(CommandRegistry::new().names().count(), 0);
        assert_eq!(CommandRegistry::default().names().count(), 0);
    }

    #[test]
    fn absent_flags_are_not_recorded() {
        let registry = CommandRegistry::builtin();
        let invocation = registry.parse(["intool", "login"]).unwrap();
        assert_eq!(invocation.params, Params::default());
    }

    #[test]
    fn unknown_command_is_rejected() {
        let registry = CommandRegistry::builtin();
        let err = registry.parse(["intool", "publish"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn help_lists_descriptions() {
        let mut cli = CommandRegistry::builtin().cli();
        let help = cli.render_long_help().to_string();
        assert!(help.contains("register"));
        assert!(help.contains("Registers a new user account"));
        assert!(help.contains("serve"));
    }

    #[test]
    fn dispatch_of_unregistered_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = testing::context(dir.path(), &[], Default::default());
        let err = CommandRegistry::new()
            .dispatch(
                &mut ctx,
                Invocation {
                    name: "serve".into(),
                    params: Params::default(),
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Command \"serve\" not found");
    }
}
