use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

pub fn run_scribe(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
    env: Vec<(String, String)>,
}

const API_KEY_VARS: [&str; 7] = [
    "SCRIBE_OPENAI_API_KEY",
    "SCRIBE_DEEPGRAM_API_KEY",
    "SCRIBE_ASSEMBLYAI_API_KEY",
    "SCRIBE_GLADIA_API_KEY",
    "SCRIBE_SPEECHMATICS_API_KEY",
    "SCRIBE_AZURE_SPEECH_KEY",
    "SCRIBE_AZURE_SPEECH_REGION",
];

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
            env: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.push((key.to_string(), value.to_string()));
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_scribe"));
        command
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path());

        command.env_remove("RUST_LOG");
        for var in API_KEY_VARS {
            command.env_remove(var);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        command.output().expect("failed to execute scribe binary")
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.data.path().join(name);
        std::fs::write(&path, contents).expect("write test file");
        path
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }
}
