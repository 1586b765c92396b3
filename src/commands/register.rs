// `intool register`: create an account and its organization, then log in
// with the same credentials.

use anyhow::Result;
use crossterm::style::Stylize;
use tracing::info;

use super::{Command, CommandHelp, Context, LoginCommand, Params};
use crate::api::{ApiClient, RegistrationRequest};
use crate::config;
use crate::ui::{self, Prompter};

pub struct RegisterCommand;

impl Command for RegisterCommand {
    fn name(&self) -> &'static str {
        "register"
    }

    fn help(&self) -> CommandHelp {
        CommandHelp {
            description: "Registers a new user account with the Instant.bot Package Registry",
            args: &[],
            flags: &[("h", "registry host to use instead of the default")],
            vflags: &[],
        }
    }

    fn run(&self, ctx: &mut Context, params: Params) -> Result<()> {
        let host = config::resolve_host(params.flag("h"));
        let api = ApiClient::new(host)?;

        let request = prompt_registration(ctx.prompter.as_mut())?;

        let spinner = ui::spinner("Registering...")?;
        let result = api.register(&request);
        spinner.finish_and_clear();
        let user = result?;
        info!(email = %user.email, host = api.base_url(), "registered");

        println!();
        println!(
            "{}",
            format!("{} for {} successfully!", "Registered".blue(), "Instant.bot".green()).bold()
        );
        println!("{}:      {}", "email".bold(), user.email);
        println!("{}:   {}", "username".bold(), user.username().unwrap_or_default());
        println!("{}: {}", "created at".bold(), user.created_at);

        let mut login = Params::default();
        if let Some(hosts) = params.flags.get("h") {
            login.flags.insert("h".into(), hosts.clone());
        }
        login.vflags.insert("email".into(), vec![user.email]);
        login.vflags.insert("password".into(), vec![request.password]);
        LoginCommand.run(ctx, login)
    }
}

/// Ask for the four registration fields in order. The two passwords are
/// not compared here.
pub fn prompt_registration(prompter: &mut dyn Prompter) -> Result<RegistrationRequest> {
    let email = prompter.input("E-mail", Some(ui::validate_email))?;
    let organization_name = prompter.input("Username", Some(ui::validate_organization_name))?;
    let password = prompter.password("Password")?;
    let repeat_password = prompter.password("Repeat password")?;
    Ok(RegistrationRequest {
        email,
        organization_name,
        password,
        repeat_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{context, host_params, RecordingLauncher};
    use crate::credentials::Credentials;
    use crate::ui::ScriptedPrompter;
    use httpmock::MockServer;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn prompts_in_order_and_re_asks_invalid_answers() {
        let mut prompter = ScriptedPrompter::new([
            "foo@bar",
            "ada@example.com",
            "ab--cd",
            "ada-labs",
            "secret1",
            "secret2",
        ]);
        let request = prompt_registration(&mut prompter).unwrap();
        assert_eq!(
            request,
            RegistrationRequest {
                email: "ada@example.com".into(),
                organization_name: "ada-labs".into(),
                password: "secret1".into(),
                repeat_password: "secret2".into(),
            }
        );
        assert_eq!(
            prompter.asked,
            vec!["E-mail", "E-mail", "Username", "Username", "Password", "Repeat password"]
        );
    }

    #[test]
    fn successful_registration_logs_in_once_with_same_credentials() {
        let server = MockServer::start();
        let users = server.mock(|when, then| {
            when.method("POST").path("/users").json_body(json!({
                "email": "ada@example.com",
                "organization_name": "ada-labs",
                "password": "secret1",
                "repeat_password": "secret1"
            }));
            then.status(200).json_body(json!({
                "email": "ada@example.com",
                "memberships": [{"organization": {"name": "ada-labs"}}],
                "created_at": "2024-05-01T12:00:00Z"
            }));
        });
        let auth = server.mock(|when, then| {
            when.method("POST").path("/auth").json_body(json!({
                "email": "ada@example.com",
                "password": "secret1"
            }));
            then.status(200).json_body(json!({"access_token": "tok_abc"}));
        });

        let dir = tempdir().unwrap();
        let mut ctx = context(
            dir.path(),
            &["ada@example.com", "ada-labs", "secret1", "secret1"],
            RecordingLauncher::default(),
        );
        RegisterCommand
            .run(&mut ctx, host_params(&server.base_url()))
            .unwrap();

        users.assert();
        auth.assert();
        let saved = Credentials::load(&ctx.credentials_path).unwrap();
        assert_eq!(saved.host, server.base_url());
        assert_eq!(saved.email, "ada@example.com");
        assert_eq!(saved.access_token, "tok_abc");
    }

    #[test]
    fn failed_registration_reports_details_and_skips_login() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/users");
            then.status(400).json_body(json!({
                "error": {
                    "message": "Could not register",
                    "details": {"password": {"message": "too short"}}
                }
            }));
        });

        let dir = tempdir().unwrap();
        let mut ctx = context(
            dir.path(),
            &["ada@example.com", "ada-labs", "pw", "pw"],
            RecordingLauncher::default(),
        );
        let err = RegisterCommand
            .run(&mut ctx, host_params(&server.base_url()))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Could not register"));
        assert!(message.contains("\n\n- password: too short"));
        assert!(!ctx.credentials_path.exists());
    }
}
