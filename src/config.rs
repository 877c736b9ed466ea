use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8086";
const DEFAULT_CERTIFICATE_BASE_URL: &str = "https://certificates.lms.example";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    /// Base URL certificate artifact links are built from.
    pub certificate_base_url: String,
    /// Optional YAML/JSON map of student id to display name, loaded into
    /// the student directory at startup.
    pub students_file: Option<PathBuf>,
    pub graceful_shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            certificate_base_url: cli_certificate_base_url,
            students: cli_students,
            shutdown_timeout_secs: cli_shutdown_timeout_secs,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            certificate_base_url: file_certificate_base_url,
            students: file_students,
            shutdown_timeout_secs: file_shutdown_timeout_secs,
        } = file_config;

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        let certificate_base_url = cli_certificate_base_url
            .or(file_certificate_base_url)
            .unwrap_or_else(|| DEFAULT_CERTIFICATE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        anyhow::ensure!(
            !certificate_base_url.is_empty(),
            "certificate base URL must not be empty"
        );

        let students_file = cli_students.or(file_students);

        let graceful_shutdown_timeout_secs = cli_shutdown_timeout_secs
            .or(file_shutdown_timeout_secs)
            .unwrap_or(10);

        Ok(Self {
            http_bind_address,
            certificate_base_url,
            students_file,
            graceful_shutdown_timeout_secs,
        })
    }

    /// Fail-fast startup validation.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = self.students_file.as_ref() {
            anyhow::ensure!(
                path.exists(),
                "students file {:?} does not exist",
                path
            );
            anyhow::ensure!(path.is_file(), "students file {:?} is not a file", path);
        }
        Ok(())
    }

    pub fn certificate_artifact_url(&self, certificate_id: &str) -> String {
        format!("{}/{certificate_id}.pdf", self.certificate_base_url)
    }

    /// Loads the configured student directory seed, if any.
    pub fn load_students(&self) -> Result<HashMap<String, String>> {
        let Some(path) = self.students_file.as_ref() else {
            return Ok(HashMap::new());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read students file {:?}", path))?;
        parse_students(path, &contents)
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "lms-server", about = "Learning-program catalog and delivery API", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "LMS_SERVER_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "LMS_SERVER_CERTIFICATE_BASE_URL",
        value_name = "URL",
        help = "Base URL for generated certificate artifacts"
    )]
    pub certificate_base_url: Option<String>,

    #[arg(
        long,
        env = "LMS_SERVER_STUDENTS",
        value_name = "FILE",
        help = "YAML or JSON map of student id to display name"
    )]
    pub students: Option<PathBuf>,

    #[arg(
        long,
        env = "LMS_SERVER_SHUTDOWN_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Grace period for in-flight requests on shutdown"
    )]
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    certificate_base_url: Option<String>,
    students: Option<PathBuf>,
    shutdown_timeout_secs: Option<u64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

fn parse_students(path: &Path, contents: &str) -> Result<HashMap<String, String>> {
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(contents)
            .with_context(|| format!("failed to parse YAML students file {:?}", path))?,
        "json" => serde_json::from_str(contents)
            .with_context(|| format!("failed to parse JSON students file {:?}", path))?,
        other => anyhow::bail!("unsupported students file extension: {other}"),
    };
    Ok(parsed)
}
