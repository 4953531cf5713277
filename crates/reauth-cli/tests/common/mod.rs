use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Environment variables read by the CLI.
const REAUTH_ENV: &[&str] = &[
    "REAUTH_API_URL",
    "REAUTH_TOKEN_URL",
    "REAUTH_CLIENT_ID",
    "REAUTH_CLIENT_SECRET",
    "REAUTH_CREDENTIALS_FILE",
    "REAUTH_PASSWORD",
];

/// Isolated environment for one CLI test.
pub struct CliEnv {
    pub home: tempfile::TempDir,
    vars: Vec<(String, String)>,
}

impl CliEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::TempDir::new().expect("Failed to create temp dir"),
            vars: Vec::new(),
        }
    }

    /// Point the CLI at a token endpoint and API served from `base`.
    pub fn with_server(mut self, base: &str) -> Self {
        self.vars
            .push(("REAUTH_API_URL".into(), format!("{}/api", base)));
        self.vars
            .push(("REAUTH_TOKEN_URL".into(), format!("{}/oauth/token", base)));
        self.vars.push(("REAUTH_CLIENT_ID".into(), "client".into()));
        self.vars
            .push(("REAUTH_CLIENT_SECRET".into(), "secret".into()));
        self
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.home.path().join("credentials.json")
    }

    /// Run the CLI binary with arguments.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_reauth"));
        cmd.args(args);
        for var in REAUTH_ENV {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_DATA_HOME", self.home.path().join("data"));
        cmd.env("REAUTH_CREDENTIALS_FILE", self.credentials_path());
        cmd.env("NO_COLOR", "1");
        for (name, value) in &self.vars {
            cmd.env(name, value);
        }
        cmd.output().expect("Failed to execute CLI")
    }

    /// Run the CLI and expect success.
    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure, returning stderr.
    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

/// Write a credential file the way the CLI stores it.
pub fn write_credentials(path: &Path, access: &str, refresh: &str) {
    let json = serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
    });
    std::fs::write(path, json.to_string()).expect("Failed to write credentials");
}

/// Read back the stored credential as raw JSON.
pub fn read_credentials(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("Failed to read credentials");
    serde_json::from_str(&content).expect("Credential file is not JSON")
}
