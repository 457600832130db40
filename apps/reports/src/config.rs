use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::render::FontPaths;

const DEFAULT_ASSETS_ROOT: &str = "assets/pdf";
const DEFAULT_FONT_DIR: &str = "assets/fonts";
const DEFAULT_TZ_OFFSET_HOURS: i32 = 3;

/// Application configuration loaded from environment variables.
/// Every key is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub assets_root: PathBuf,
    pub bundled_font_dir: PathBuf,
    /// Legacy single-font setting, used for the regular role when
    /// `PDF_FONT_REGULAR_PATH` is not set.
    pub font_path: Option<PathBuf>,
    pub font_regular_path: Option<PathBuf>,
    pub font_bold_path: Option<PathBuf>,
    pub font_accent_path: Option<PathBuf>,
    pub subsection_fallback_heuristic: bool,
    pub storage_bucket: Option<String>,
    /// Bucket prefix in bucket mode, local root directory otherwise.
    pub storage_key: Option<String>,
    pub secondary_storage_dir: Option<PathBuf>,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub report_tz_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let path = |key: &str| optional(key).map(PathBuf::from);

        Ok(Config {
            port: parse_or(&optional, "PORT", 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            assets_root: path("PDF_ASSETS_ROOT").unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_ROOT)),
            bundled_font_dir: PathBuf::from(DEFAULT_FONT_DIR),
            font_path: path("PDF_FONT_PATH"),
            font_regular_path: path("PDF_FONT_REGULAR_PATH"),
            font_bold_path: path("PDF_FONT_BOLD_PATH"),
            font_accent_path: path("PDF_FONT_ACCENT_PATH"),
            subsection_fallback_heuristic: optional("PDF_SUBSECTION_FALLBACK_HEURISTIC")
                .map(|v| parse_flag(&v))
                .transpose()?
                .unwrap_or(false),
            storage_bucket: optional("PDF_STORAGE_BUCKET"),
            storage_key: optional("PDF_STORAGE_KEY"),
            secondary_storage_dir: path("PDF_SECONDARY_STORAGE_DIR"),
            s3_endpoint: optional("S3_ENDPOINT"),
            s3_region: optional("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: optional("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional("AWS_SECRET_ACCESS_KEY"),
            report_tz_offset_hours: parse_or(&optional, "REPORT_TZ_OFFSET_HOURS", DEFAULT_TZ_OFFSET_HOURS)?,
        })
    }

    /// Font files per role, in the form the font resolver caches on.
    pub fn font_paths(&self) -> FontPaths {
        FontPaths {
            regular: self
                .font_regular_path
                .clone()
                .or_else(|| self.font_path.clone()),
            bold: self.font_bold_path.clone(),
            accent: self.font_accent_path.clone(),
            bundled_dir: self.bundled_font_dir.clone(),
        }
    }
}

fn parse_or<T>(optional: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean flag"),
    }
}
