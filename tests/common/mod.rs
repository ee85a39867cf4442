//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use evtrust::config::{DigestMode, PipelineSettings};
use evtrust::engine::command_executor::{ToolCommand, ToolOutput, ToolRunner};
use evtrust::engine::Pipeline;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const LOGIN_KEYCHAIN: &str = "/Users/builder/Library/Keychains/login.keychain-db";
pub const SYSTEM_KEYCHAIN: &str = "/Library/Keychains/System.keychain";

pub fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn exit(code: i32, stderr: &str) -> ToolOutput {
    ToolOutput {
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Stand-in DER bytes for a named certificate
pub fn cert_bytes(name: &str) -> Vec<u8> {
    let mut bytes = vec![0x30, 0x82, 0x01, 0x0a];
    bytes.extend_from_slice(name.as_bytes());
    bytes
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(bytes))
}

/// openssl-style `SHA1 Fingerprint=AA:BB:…` line
pub fn openssl_fingerprint_line(bytes: &[u8]) -> String {
    let pairs: Vec<String> = Sha1::digest(bytes)
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect();
    format!("SHA1 Fingerprint={}\n", pairs.join(":"))
}

/// Tool runner double
///
/// Records every command. By default every tool succeeds; `openssl x509`
/// fingerprints the `-in` file, `create-keychain` creates the keychain file
/// and `list-keychains` (without `-s`) prints a two-entry search list.
/// `respond` installs a canned output for a subcommand whose arguments contain
/// a given substring.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<ToolCommand>>,
    overrides: Mutex<Vec<(String, String, ToolOutput)>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, subcommand: &str, arg_contains: &str, output: ToolOutput) {
        self.overrides.lock().unwrap().push((
            subcommand.to_string(),
            arg_contains.to_string(),
            output,
        ));
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, subcommand: &str) -> Vec<ToolCommand> {
        self.calls()
            .into_iter()
            .filter(|c| c.subcommand() == Some(subcommand))
            .collect()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.subcommand().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, command: &ToolCommand) -> evtrust::Result<ToolOutput> {
        self.calls.lock().unwrap().push(command.clone());
        let subcommand = command.subcommand().unwrap_or_default();

        for (sub, needle, output) in self.overrides.lock().unwrap().iter() {
            if sub == subcommand && command.args.iter().any(|a| a.contains(needle.as_str())) {
                return Ok(output.clone());
            }
        }

        match subcommand {
            "x509" => {
                let position = command.args.iter().position(|a| a == "-in").unwrap();
                let bytes = std::fs::read(&command.args[position + 1])?;
                Ok(ok(&openssl_fingerprint_line(&bytes)))
            }
            "create-keychain" => {
                std::fs::write(command.args.last().unwrap(), b"fresh keychain")?;
                Ok(ok(""))
            }
            "list-keychains" if !command.args.iter().any(|a| a == "-s") => Ok(ok(&format!(
                "    \"{LOGIN_KEYCHAIN}\"\n    \"{SYSTEM_KEYCHAIN}\"\n"
            ))),
            _ => Ok(ok("")),
        }
    }
}

/// A scratch project: roots directory, EV config, output and asset dirs
pub struct Fixture {
    pub dir: TempDir,
    pub settings: PipelineSettings,
}

impl Fixture {
    /// Write `config` and one certificate per name in `certs`
    pub fn new(config: &str, certs: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let roots = root.join("roots");
        std::fs::create_dir_all(&roots).unwrap();
        for name in certs {
            std::fs::write(roots.join(name), cert_bytes(name)).unwrap();
        }
        std::fs::write(root.join("evroots.config"), config).unwrap();

        let mut settings = PipelineSettings {
            ev_config: root.join("evroots.config"),
            roots_dir: roots,
            output_dir: root.join("build"),
            ..Default::default()
        };
        settings.database.digest = DigestMode::Native;
        settings.tools.security = PathBuf::from("security");
        settings.tools.openssl = PathBuf::from("openssl");
        settings.tools.assettool = PathBuf::from("assettool");
        settings.asset.input_dir = root.join("asset-input");
        settings.asset.tree_dir = root.join("asset");
        settings.asset.staging_dir = root.join("staging");

        Self { dir, settings }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn pipeline(&self, runner: &Arc<ScriptedRunner>) -> Pipeline {
        Pipeline::new(self.settings.clone(), runner.clone())
    }

    pub fn trust_database(&self) -> PathBuf {
        self.settings.output_dir.join("EVRoots.plist")
    }

    pub fn keychain(&self) -> PathBuf {
        self.settings.output_dir.join("EVRoots.keychain")
    }
}

/// The two-OID scenario config
pub const SCENARIO_CONFIG: &str = r#"# EV policies
"1.3.6.1.4.1.6334.1.100.1" "certA.cer"

"2.16.840.1.114412.2.1" "certB.cer" "certC.cer"
"#;

pub const SCENARIO_CERTS: &[&str] = &["certA.cer", "certB.cer", "certC.cer"];
