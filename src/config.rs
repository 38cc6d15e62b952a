use crate::services::{
    response_encoder::JsonEscape,
    upload_policy::{DEFAULT_MAX_PART_BYTES, DEFAULT_MAX_REQUEST_BYTES, UploadPolicy},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::{env, path::PathBuf, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub doc_root: PathBuf,
    pub upload_dir: Option<PathBuf>,
    pub max_part_bytes: u64,
    pub max_request_bytes: u64,
    pub max_body_bytes: u64,
    pub json_escape: JsonEscape,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Multipart upload echo server")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_ECHO_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_ECHO_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory served for non-upload paths (overrides UPLOAD_ECHO_DOC_ROOT)
    #[arg(long)]
    pub doc_root: Option<PathBuf>,

    /// Write accepted files here; omit to only report them (overrides UPLOAD_ECHO_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Largest accepted file part in bytes (overrides UPLOAD_ECHO_MAX_PART_BYTES)
    #[arg(long)]
    pub max_part_bytes: Option<u64>,

    /// Largest request body in bytes (overrides UPLOAD_ECHO_MAX_REQUEST_BYTES)
    #[arg(long)]
    pub max_request_bytes: Option<u64>,

    /// Hard ceiling on the whole request body; defaults to twice the request
    /// file limit (overrides UPLOAD_ECHO_MAX_BODY_BYTES)
    #[arg(long)]
    pub max_body_bytes: Option<u64>,

    /// Escaping applied to the acknowledgment body (overrides UPLOAD_ECHO_JSON_ESCAPE)
    #[arg(long, value_enum)]
    pub json_escape: Option<JsonEscape>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse(), |key| env::var(key))
    }

    /// Merge CLI args over values looked up by `var`, over defaults.
    pub fn merge<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = var("UPLOAD_ECHO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&var, "UPLOAD_ECHO_PORT")?.unwrap_or(8081);
        let env_doc_root = var("UPLOAD_ECHO_DOC_ROOT").unwrap_or_else(|_| "./htdocs".into());
        let env_upload_dir = var("UPLOAD_ECHO_UPLOAD_DIR").ok().filter(|v| !v.is_empty());
        let env_max_part =
            parse_var(&var, "UPLOAD_ECHO_MAX_PART_BYTES")?.unwrap_or(DEFAULT_MAX_PART_BYTES);
        let env_max_request =
            parse_var(&var, "UPLOAD_ECHO_MAX_REQUEST_BYTES")?.unwrap_or(DEFAULT_MAX_REQUEST_BYTES);
        let env_max_body = parse_var(&var, "UPLOAD_ECHO_MAX_BODY_BYTES")?;
        let env_escape = match var("UPLOAD_ECHO_JSON_ESCAPE") {
            Ok(value) => <JsonEscape as ValueEnum>::from_str(&value, true)
                .map_err(|err| anyhow!(err))
                .with_context(|| format!("parsing UPLOAD_ECHO_JSON_ESCAPE value `{}`", value))?,
            Err(env::VarError::NotPresent) => JsonEscape::default(),
            Err(err) => return Err(err).context("reading UPLOAD_ECHO_JSON_ESCAPE"),
        };

        // --- Merge ---
        let max_part_bytes = args.max_part_bytes.unwrap_or(env_max_part);
        let max_request_bytes = args.max_request_bytes.unwrap_or(env_max_request);
        let max_body_bytes = args.max_body_bytes.or(env_max_body).unwrap_or_else(|| {
            UploadPolicy::new(max_part_bytes, max_request_bytes).default_body_limit()
        });
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            doc_root: args.doc_root.unwrap_or_else(|| env_doc_root.into()),
            upload_dir: args.upload_dir.or(env_upload_dir.map(PathBuf::from)),
            max_part_bytes,
            max_request_bytes,
            max_body_bytes,
            json_escape: args.json_escape.unwrap_or(env_escape),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
