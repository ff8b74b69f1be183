use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ranking::completeness::Language;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub similarity_threshold: f64,
    pub http_timeout: Duration,
    pub top_n: usize,
    pub robota: RobotaConfig,
    pub work_ua: WorkUaConfig,
    pub gateway: Option<GatewayConfig>,
    pub dialogue: DialogueConfig,
}

/// Connection and vocabulary settings for the robota.ua API.
#[derive(Debug, Clone)]
pub struct RobotaConfig {
    pub base_url: String,
    pub login_url: String,
    pub resumes_url: String,
    pub username: String,
    pub password: String,
    pub regions_url: Option<String>,
    pub regions_path: PathBuf,
    pub experience_path: PathBuf,
}

/// Connection, paging and vocabulary settings for work.ua listing pages.
#[derive(Debug, Clone)]
pub struct WorkUaConfig {
    pub base_url: String,
    pub resumes_path: String,
    pub min_js_url: Option<String>,
    pub regions_path: PathBuf,
    pub salary_path: PathBuf,
    pub experience_path: PathBuf,
    pub user_agent: String,
    pub referer: Option<String>,
    pub page_size: u32,
    pub max_concurrency: usize,
    pub language: Language,
}

/// Scraping gateway used to fetch HTML pages on our behalf.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Option lists offered by the dialogue front-end.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    pub salary_path: PathBuf,
    pub experience_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gateway = optional_env("SCRAPER_API_KEY").map(|api_key| GatewayConfig {
            endpoint: env_or("SCRAPER_API_URL", "http://api.scraperapi.com"),
            api_key,
        });

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            similarity_threshold: parse_env("WORD_SIMILARITY_THRESHOLD", 70.0)?,
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 60)?),
            top_n: parse_env("SEARCH_TOP_N", 5)?,
            robota: RobotaConfig {
                base_url: env_or("ROBOTA_UA_BASE_URL", "https://robota.ua"),
                login_url: require_env("ROBOTA_UA_LOGIN_URL")?,
                resumes_url: require_env("ROBOTA_UA_RESUMES_URL")?,
                username: require_env("ROBOTA_UA_USERNAME")?,
                password: require_env("ROBOTA_UA_PASSWORD")?,
                regions_url: optional_env("ROBOTA_UA_REGIONS_URL"),
                regions_path: path_env("ROBOTA_UA_REGIONS_JSON_PATH", "data/robota_ua_regions.json"),
                experience_path: path_env(
                    "ROBOTA_UA_EXPERIENCE_OPTIONS_JSON_PATH",
                    "data/robota_ua_experience.json",
                ),
            },
            work_ua: WorkUaConfig {
                base_url: require_env("WORK_UA_URL")?,
                resumes_path: env_or("WORK_UA_RESUMES_URL", "/en/resumes/"),
                min_js_url: optional_env("WORK_UA_MIN_JS_URL"),
                regions_path: path_env("WORK_UA_REGIONS_JSON_PATH", "data/work_ua_regions.json"),
                salary_path: path_env("WORK_UA_SALARY_OPTIONS_JSON_PATH", "data/work_ua_salary.json"),
                experience_path: path_env(
                    "WORK_UA_EXPERIENCE_OPTIONS_JSON_PATH",
                    "data/work_ua_experience.json",
                ),
                user_agent: env_or(
                    "WORK_UA_USER_AGENT",
                    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
                ),
                referer: optional_env("WORK_UA_REFERER"),
                page_size: parse_env("WORK_UA_PAGE_SIZE", 14)?,
                max_concurrency: parse_env("WORK_UA_MAX_CONCURRENCY", 4)?,
                language: parse_env("WORK_UA_LANGUAGE", Language::English)?,
            },
            gateway,
            dialogue: DialogueConfig {
                salary_path: path_env("DIALOGUE_SALARY_OPTIONS_JSON_PATH", "data/dialogue_salary.json"),
                experience_path: path_env(
                    "DIALOGUE_EXPERIENCE_OPTIONS_JSON_PATH",
                    "data/dialogue_experience.json",
                ),
            },
        })
    }
}

#[cfg(test)]
impl Config {
    /// Fixed settings for handler tests; reads no environment.
    pub fn test_defaults() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            similarity_threshold: 70.0,
            http_timeout: Duration::from_secs(5),
            top_n: 5,
            robota: RobotaConfig {
                base_url: "https://robota.ua".to_string(),
                login_url: "http://127.0.0.1:1/login".to_string(),
                resumes_url: "http://127.0.0.1:1/resumes".to_string(),
                username: "scout".to_string(),
                password: "secret".to_string(),
                regions_url: None,
                regions_path: PathBuf::from("robota_regions.json"),
                experience_path: PathBuf::from("robota_experience.json"),
            },
            work_ua: WorkUaConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                resumes_path: "/en/resumes/".to_string(),
                min_js_url: None,
                regions_path: PathBuf::from("work_ua_regions.json"),
                salary_path: PathBuf::from("work_ua_salary.json"),
                experience_path: PathBuf::from("work_ua_experience.json"),
                user_agent: "resume-scout-test".to_string(),
                referer: None,
                page_size: 14,
                max_concurrency: 2,
                language: Language::English,
            },
            gateway: None,
            dialogue: DialogueConfig {
                salary_path: PathBuf::from("dialogue_salary.json"),
                experience_path: PathBuf::from("dialogue_experience.json"),
            },
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn path_env(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_or(key, default))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, optional_env(key), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_uses_default_when_absent() {
        assert_eq!(parse_value::<u16>("PORT", None, 8080).unwrap(), 8080);
    }

    #[test]
    fn test_parse_value_parses_present_value() {
        let threshold = parse_value::<f64>("WORD_SIMILARITY_THRESHOLD", Some(" 82.5 ".into()), 70.0);
        assert_eq!(threshold.unwrap(), 82.5);
    }

    #[test]
    fn test_parse_value_reports_key_on_error() {
        let err = parse_value::<usize>("SEARCH_TOP_N", Some("five".into()), 5).unwrap_err();
        assert!(err.to_string().contains("SEARCH_TOP_N"));
    }
}
