//! Process executor configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable carrying the selected runtime id.
pub const RUNTIME_ENV: &str = "PLAYTEST_RUNTIME";
/// Environment variable carrying the selected function name.
pub const FUNCTION_ENV: &str = "PLAYTEST_FUNCTION";

/// How to launch the program that executes a single test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessExecutorOptions {
    /// Program to run
    pub program: String,
    /// Arguments placed before the test name
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Working directory for the child process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl ProcessExecutorOptions {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Format the command line for a given test, for logging.
    pub fn display_command(&self, test_name: &str) -> String {
        let mut cmd = self.program.clone();
        for arg in self.args.iter().map(String::as_str).chain(std::iter::once(test_name)) {
            if arg.contains(' ') || arg.contains('=') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ProcessExecutorOptions::new("python")
            .arg("-m")
            .arg("harness")
            .env("PYTHONUNBUFFERED", "1")
            .working_dir("/work");

        assert_eq!(options.args, vec!["-m".to_string(), "harness".to_string()]);
        assert_eq!(options.env.get("PYTHONUNBUFFERED"), Some(&"1".to_string()));
        assert_eq!(options.working_dir, Some(PathBuf::from("/work")));
    }

    #[test]
    fn test_display_command_quotes_spaces() {
        let options = ProcessExecutorOptions::new("node").arg("run.js");
        assert_eq!(
            options.display_command("my test"),
            "node run.js 'my test'"
        );
    }
}
