use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use nerostack_application::{AdminSeed, AnalysisSettings};
use nerostack_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

/// What the binary does after loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    Seed,
}

impl ApiCommand {
    fn from_arg(arg: Option<&str>) -> Result<Self, AppError> {
        match arg {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("seed") => Ok(Self::Seed),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'serve', 'migrate' or 'seed'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MayanConfig {
    pub url: String,
    pub admin_user: String,
    pub admin_password: String,
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub mayan: MayanConfig,
    pub ollama: OllamaConfig,
    pub analysis: AnalysisSettings,
    pub admin_seed: AdminSeed,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = env::args().nth(1);
        Self::from_lookup(command.as_deref(), |name| env::var(name).ok())
    }

    pub fn from_lookup(
        command: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let command = ApiCommand::from_arg(command)?;
        let vars = EnvLookup { lookup: &lookup };

        let database_url = vars.required("DATABASE_URL")?;
        let frontend_url = vars.url("FRONTEND_URL", "http://localhost:3000")?;
        let bootstrap_token = vars.required("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = vars.required("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = vars.or("API_HOST", "127.0.0.1");
        let api_port = vars.parsed("API_PORT", 5000_u16)?;
        let cookie_secure = vars.parsed("SESSION_COOKIE_SECURE", false)?;

        let mayan = MayanConfig {
            url: vars.url("MAYAN_URL", "http://mayan:8000")?,
            admin_user: vars.or("MAYAN_ADMIN_USER", "admin"),
            admin_password: vars.or("MAYAN_ADMIN_PASSWORD", "admin"),
        };
        let ollama = OllamaConfig {
            url: vars.url("OLLAMA_URL", "http://service_ia_locale:11434")?,
            model: vars.or("OLLAMA_MODEL", "llama3.2"),
        };

        let analysis = AnalysisSettings {
            generation_timeout: Duration::from_secs(
                vars.positive("AI_GENERATION_TIMEOUT_SECONDS", 120)?,
            ),
            content_max_chars: usize::try_from(vars.positive("AI_CONTENT_MAX_CHARS", 15_000)?)
                .map_err(|error| {
                    AppError::Validation(format!("invalid AI_CONTENT_MAX_CHARS: {error}"))
                })?,
            stale_after: Duration::from_secs(vars.positive("ANALYSIS_STALE_AFTER_SECONDS", 600)?),
        };

        let admin_seed = AdminSeed {
            username: vars.or("SEED_ADMIN_USERNAME", "admin"),
            email: vars.or("SEED_ADMIN_EMAIL", "admin@nerostack.local"),
        };

        Ok(Self {
            command,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            mayan,
            ollama,
            analysis,
            admin_seed,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct EnvLookup<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvLookup<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String, AppError> {
        self.get(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_owned())
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
            None => Ok(default),
        }
    }

    fn positive(&self, name: &str, default: u64) -> Result<u64, AppError> {
        let value = self.parsed(name, default)?;
        if value == 0 {
            return Err(AppError::Validation(format!("{name} must be greater than zero")));
        }

        Ok(value)
    }

    fn url(&self, name: &str, default: &str) -> Result<String, AppError> {
        let value = self.or(name, default);
        Url::parse(&value)
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))?;
        Ok(value.trim_end_matches('/').to_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use nerostack_core::AppError;

    use super::{ApiCommand, ApiConfig};

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/nerostack".to_owned()),
            ("AUTH_BOOTSTRAP_TOKEN", "bootstrap".to_owned()),
            ("SESSION_SECRET", "s".repeat(32)),
        ])
    }

    fn load(command: Option<&str>, vars: &HashMap<&'static str, String>) -> Result<ApiConfig, AppError> {
        ApiConfig::from_lookup(command, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_variables_are_missing() {
        let config = load(None, &base_vars()).unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(config.command, ApiCommand::Serve);
        assert_eq!(config.api_port, 5000);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.mayan.url, "http://mayan:8000");
        assert_eq!(config.ollama.model, "llama3.2");
        assert_eq!(config.analysis.generation_timeout, Duration::from_secs(120));
        assert_eq!(config.analysis.content_max_chars, 15_000);
        assert_eq!(config.analysis.stale_after, Duration::from_secs(600));
        assert_eq!(config.admin_seed.username, "admin");
        assert!(!config.cookie_secure);
    }

    #[test]
    fn commands_are_recognised() {
        let vars = base_vars();
        assert!(matches!(
            load(Some("migrate"), &vars).map(|config| config.command),
            Ok(ApiCommand::Migrate)
        ));
        assert!(matches!(
            load(Some("seed"), &vars).map(|config| config.command),
            Ok(ApiCommand::Seed)
        ));
        assert!(matches!(load(Some("drop"), &vars), Err(AppError::Validation(_))));
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut vars = base_vars();
        vars.insert("SESSION_SECRET", "short".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));
    }

    #[test]
    fn invalid_numbers_fail_fast() {
        let mut vars = base_vars();
        vars.insert("API_PORT", "http".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));

        let mut vars = base_vars();
        vars.insert("AI_GENERATION_TIMEOUT_SECONDS", "0".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));
    }

    #[test]
    fn provider_urls_are_validated_and_normalised() {
        let mut vars = base_vars();
        vars.insert("OLLAMA_URL", "http://localhost:11434/".to_owned());
        let config = load(None, &vars).unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(config.ollama.url, "http://localhost:11434");

        vars.insert("MAYAN_URL", "not a url".to_owned());
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");
        assert!(matches!(load(None, &vars), Err(AppError::Validation(_))));
    }
}
