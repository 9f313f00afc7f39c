pub mod dashboard;
pub mod domain;
pub mod llm;
pub mod time;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
    pub const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub gemini_base_url: String,
        pub gemini_model: String,
        pub gemini_timeout_secs: u64,
        /// Attach the `google_search` grounding tool to the generation request.
        pub gemini_google_search: bool,
        /// Offset used to date-stamp the prompt. `None` means the host's local time.
        pub analysis_utc_offset_hours: Option<i32>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                gemini_api_key: None,
                gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
                gemini_timeout_secs: DEFAULT_GEMINI_TIMEOUT_SECS,
                gemini_google_search: true,
                analysis_utc_offset_hours: None,
                sentry_dsn: None,
                port: DEFAULT_PORT,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let defaults = Self::default();
            let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            let gemini_timeout_secs = match non_empty("GEMINI_TIMEOUT_SECS") {
                Some(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("GEMINI_TIMEOUT_SECS is not a number: {s}"))?,
                None => defaults.gemini_timeout_secs,
            };

            let gemini_google_search = match non_empty("GEMINI_GOOGLE_SEARCH") {
                Some(s) => parse_bool(&s)
                    .with_context(|| format!("GEMINI_GOOGLE_SEARCH is not a boolean: {s}"))?,
                None => defaults.gemini_google_search,
            };

            let analysis_utc_offset_hours = match non_empty("ANALYSIS_UTC_OFFSET_HOURS") {
                Some(s) => {
                    let hours = s.trim().parse::<i32>().with_context(|| {
                        format!("ANALYSIS_UTC_OFFSET_HOURS is not an integer: {s}")
                    })?;
                    anyhow::ensure!(
                        (-12..=14).contains(&hours),
                        "ANALYSIS_UTC_OFFSET_HOURS must be within -12..=14 (got {hours})"
                    );
                    Some(hours)
                }
                None => None,
            };

            let port = match non_empty("PORT") {
                Some(s) => s
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT is not a valid port: {s}"))?,
                None => defaults.port,
            };

            Ok(Self {
                gemini_api_key: non_empty("GEMINI_API_KEY"),
                gemini_base_url: non_empty("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
                gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
                gemini_timeout_secs,
                gemini_google_search,
                analysis_utc_offset_hours,
                sentry_dsn: non_empty("SENTRY_DSN"),
                port,
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }
    }

    fn parse_bool(s: &str) -> anyhow::Result<bool> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("unrecognized boolean: {other}"),
        }
    }

}
