// `intool login`: trade an e-mail and password for an access token and
// save it for later commands.

use anyhow::Result;
use crossterm::style::Stylize;
use tracing::info;

use super::{Command, CommandHelp, Context, Params};
use crate::api::{ApiClient, LoginRequest};
use crate::config;
use crate::credentials::Credentials;
use crate::ui;

pub struct LoginCommand;

impl Command for LoginCommand {
    fn name(&self) -> &'static str {
        "login"
    }

    fn help(&self) -> CommandHelp {
        CommandHelp {
            description: "Logs in to the Instant.bot Package Registry",
            args: &[],
            flags: &[("h", "registry host to use instead of the default")],
            vflags: &[
                ("email", "e-mail address to log in with"),
                ("password", "password to log in with"),
            ],
        }
    }

    fn run(&self, ctx: &mut Context, params: Params) -> Result<()> {
        let host = config::resolve_host(params.flag("h"));
        let api = ApiClient::new(host.clone())?;

        let email = match params.vflag("email") {
            Some(email) => email.to_string(),
            None => ctx.prompter.input("E-mail", Some(ui::validate_email))?,
        };
        let password = match params.vflag("password") {
            Some(password) => password.to_string(),
            None => ctx.prompter.password("Password")?,
        };

        let spinner = ui::spinner("Logging in...")?;
        let result = api.login(&LoginRequest {
            email: email.clone(),
            password,
        });
        spinner.finish_and_clear();
        let token = result?;

        let credentials = Credentials {
            host,
            email,
            access_token: token.access_token,
            expires_at: token.expires_at,
        };
        credentials.save(&ctx.credentials_path)?;
        info!(
            email = %credentials.email,
            path = %ctx.credentials_path.display(),
            "saved credentials"
        );

        println!();
        println!(
            "{}",
            format!(
                "{} to {} as {}",
                "Logged in".blue(),
                "Instant.bot".green(),
                credentials.email
            )
            .bold()
        );
        Ok(())
    }
}
