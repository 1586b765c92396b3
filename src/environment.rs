// Local environment checks: before a package can be served we need its
// `intool.json` manifest plus the two node modules the runtime loads.
// Each prerequisite is probed independently and reported as present or
// absent; strict mode turns the first absence into an error.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the package manifest in the project root.
pub const MANIFEST_FILE: &str = "intool.json";
/// Loader for `.env` files used by the local runtime.
pub const DOTENV_MODULE: &str = "dotenv";
/// Platform SDK.
pub const SDK_MODULE: &str = "@instant.dev/api";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error(
        "No \"intool.json\" in this directory. Are you sure you meant to do this?\n\
         Run `$ intool init` to initialize a project here if you are."
    )]
    MissingManifest,

    #[error(
        "{name} should be installed in this directory to use Instant Tool Package locally.\n\
         Run `$ npm i {name} --save-dev` to install the latest version"
    )]
    MissingModule { name: &'static str },

    #[error("Failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Whether missing prerequisites are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Lenient,
}

/// Result of probing for a single prerequisite.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Present(T),
    Absent,
}

/// Parsed `intool.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectManifest {
    pub path: PathBuf,
    pub raw: Value,
}

impl ProjectManifest {
    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.raw.get("version").and_then(Value::as_str)
    }
}

/// An installed node module found under `node_modules/`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeModule {
    pub name: &'static str,
    pub path: PathBuf,
    /// Taken from the module's own `package.json` when it can be read.
    pub version: Option<String>,
}

/// Everything the local runtime needs, only ever returned complete.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEnvironment {
    pub manifest: ProjectManifest,
    pub dotenv: NodeModule,
    pub sdk: NodeModule,
}

/// Check the project in `dir`.
///
/// Checks run in order (manifest, dotenv, SDK) and in strict mode the first
/// missing one is reported. Returns `Ok(None)` when anything is missing in
/// lenient mode.
pub fn load(dir: &Path, strictness: Strictness) -> Result<Option<LocalEnvironment>, EnvironmentError> {
    let strict = strictness == Strictness::Strict;

    let manifest = probe_manifest(dir)?;
    if strict && manifest == Probe::Absent {
        return Err(EnvironmentError::MissingManifest);
    }

    let dotenv = probe_module(dir, DOTENV_MODULE);
    if strict && dotenv == Probe::Absent {
        return Err(EnvironmentError::MissingModule { name: DOTENV_MODULE });
    }

    let sdk = probe_module(dir, SDK_MODULE);
    if strict && sdk == Probe::Absent {
        return Err(EnvironmentError::MissingModule { name: SDK_MODULE });
    }

    match (manifest, dotenv, sdk) {
        (Probe::Present(manifest), Probe::Present(dotenv), Probe::Present(sdk)) => {
            Ok(Some(LocalEnvironment { manifest, dotenv, sdk }))
        }
        _ => {
            debug!(dir = %dir.display(), "local environment incomplete");
            Ok(None)
        }
    }
}

/// Read and parse `intool.json` if it exists.
pub fn probe_manifest(dir: &Path) -> Result<Probe<ProjectManifest>, EnvironmentError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(Probe::Absent);
    }
    let data = fs::read_to_string(&path).map_err(|source| EnvironmentError::Read {
        path: path.clone(),
        source,
    })?;
    let raw = serde_json::from_str(&data).map_err(|source| EnvironmentError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok(Probe::Present(ProjectManifest { path, raw }))
}

/// Look for `node_modules/<name>` under `dir`.
pub fn probe_module(dir: &Path, name: &'static str) -> Probe<NodeModule> {
    let path = dir.join("node_modules").join(name);
    if !path.exists() {
        return Probe::Absent;
    }
    let version = fs::read_to_string(path.join("package.json"))
        .ok()
        .and_then(|data| serde_json::from_str::<Value>(&data).ok())
        .and_then(|pkg| pkg.get("version").and_then(Value::as_str).map(str::to_string));
    debug!(module = name, ?version, "found node module");
    Probe::Present(NodeModule { name, path, version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_manifest(dir: &Path, body: &str) {
        fs::write(dir.join(MANIFEST_FILE), body).unwrap();
    }

    fn install(dir: &Path, name: &str, version: Option<&str>) {
        let module = dir.join("node_modules").join(name);
        fs::create_dir_all(&module).unwrap();
        if let Some(v) = version {
            fs::write(module.join("package.json"), format!(r#"{{"version":"{v}"}}"#)).unwrap();
        }
    }

    #[test]
    fn complete_project_loads() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), r#"{"name":"hello","version":"1.0.0"}"#);
        install(dir.path(), DOTENV_MODULE, Some("16.4.5"));
        install(dir.path(), SDK_MODULE, None);

        let env = load(dir.path(), Strictness::Strict).unwrap().unwrap();
        assert_eq!(env.manifest.name(), Some("hello"));
        assert_eq!(env.manifest.version(), Some("1.0.0"));
        assert_eq!(env.dotenv.version.as_deref(), Some("16.4.5"));
        assert_eq!(env.sdk.version, None);
        assert!(env.sdk.path.ends_with("node_modules/@instant.dev/api"));
    }

    #[test]
    fn strict_reports_missing_manifest_first() {
        let dir = tempdir().unwrap();
        let err = load(dir.path(), Strictness::Strict).unwrap_err();
        assert!(matches!(err, EnvironmentError::MissingManifest));
        assert!(err.to_string().contains("No \"intool.json\" in this directory"));
        assert!(err.to_string().contains("$ intool init"));
    }

    #[test]
    fn strict_reports_each_module_separately() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "{}");

        let err = load(dir.path(), Strictness::Strict).unwrap_err();
        assert!(matches!(err, EnvironmentError::MissingModule { name: DOTENV_MODULE }));
        assert!(err.to_string().contains("$ npm i dotenv --save-dev"));

        install(dir.path(), DOTENV_MODULE, None);
        let err = load(dir.path(), Strictness::Strict).unwrap_err();
        assert!(matches!(err, EnvironmentError::MissingModule { name: SDK_MODULE }));
        assert!(err
            .to_string()
            .starts_with("@instant.dev/api should be installed in this directory"));
    }

    #[test]
    fn lenient_returns_nothing_instead_of_partial_bundle() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "{}");
        install(dir.path(), SDK_MODULE, None);
        assert_eq!(load(dir.path(), Strictness::Lenient).unwrap(), None);

        let empty = tempdir().unwrap();
        assert_eq!(load(empty.path(), Strictness::Lenient).unwrap(), None);
    }

    #[test]
    fn malformed_manifest_fails_even_when_lenient() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "{ not json");
        let err = load(dir.path(), Strictness::Lenient).unwrap_err();
        assert!(matches!(err, EnvironmentError::Parse { .. }));
    }
}
