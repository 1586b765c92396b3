// Library root
// -----------
// The `intool` binary is a thin shell around this crate: it builds the
// command registry, parses argv and dispatches.
//
// Module responsibilities:
// - `commands`: the command registry plus `register`, `login` and `serve`.
// - `api`: HTTP calls to the package registry and its error format.
// - `environment`: checks that a project can be served locally.
// - `local_server`: starts the project's development server.
// - `ui`: prompts, input validation and spinners.
// - `config` / `credentials`: host resolution and the saved session.
pub mod api;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod environment;
pub mod local_server;
pub mod ui;
