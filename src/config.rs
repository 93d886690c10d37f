use secrecy::SecretString;
use std::env;
use url::Url;

const DEFAULT_CURRENCY_SYMBOLS: &str = "USD,EUR,GBP,JPY,CHF,CAD,AUD,PLN";

/// Identity provider (OAuth2 authorization-code) settings
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub authorize_url: Url,
    pub token_url: Url,
    pub redirect_uri: Url,
    pub scope: String,
}

/// Upstream data provider settings
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub github_api_url: Url,
    pub weather_api_url: Url,
    pub weather_api_key: SecretString,
    pub weather_forecast_day: u8,
    pub currency_api_url: Url,
    pub currency_api_key: SecretString,
    /// Symbols requested from the currency provider
    pub currency_symbols: Vec<String>,
    pub public_apis_url: Url,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,

    // Browser application that receives the credential after login
    pub client_app_url: Url,

    pub oauth: OAuthConfig,
    pub upstream: UpstreamConfig,

    // HTTP client timeout configuration (in seconds)
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables using std::env::var
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        // Required variables
        let client_id = required("GITHUB_CLIENT_ID")?;
        let client_secret = SecretString::new(required("GITHUB_CLIENT_SECRET")?);
        let weather_api_key = SecretString::new(required("WEATHER_API_KEY")?);
        let currency_api_key = SecretString::new(required("CURRENCY_API_KEY")?);

        // Optional variables with defaults
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3000);

        let oauth = OAuthConfig {
            client_id,
            client_secret,
            authorize_url: url_var(
                "OAUTH_AUTHORIZE_URL",
                "https://github.com/login/oauth/authorize",
            )?,
            token_url: url_var(
                "OAUTH_TOKEN_URL",
                "https://github.com/login/oauth/access_token",
            )?,
            redirect_uri: url_var(
                "OAUTH_REDIRECT_URI",
                "http://localhost:3000/auth/github/callback",
            )?,
            scope: env::var("OAUTH_SCOPE").unwrap_or_else(|_| "repo".to_string()),
        };

        let upstream = UpstreamConfig {
            github_api_url: url_var("GITHUB_API_URL", "https://api.github.com")?,
            weather_api_url: url_var("WEATHER_API_URL", "https://dobrapogoda24.pl")?,
            weather_api_key,
            weather_forecast_day: env::var("WEATHER_FORECAST_DAY")
                .ok()
                .and_then(|s| s.parse::<u8>().ok())
                .unwrap_or(1),
            currency_api_url: url_var("CURRENCY_API_URL", "https://api.currencyfreaks.com")?,
            currency_api_key,
            currency_symbols: parse_symbols(
                &env::var("CURRENCY_SYMBOLS")
                    .unwrap_or_else(|_| DEFAULT_CURRENCY_SYMBOLS.to_string()),
            ),
            public_apis_url: url_var("PUBLIC_APIS_URL", "https://api.publicapis.org")?,
        };

        let client_app_url = url_var("CLIENT_APP_URL", "http://localhost:3001")?;

        let http_connect_timeout_secs = env::var("HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5);

        let http_request_timeout_secs = env::var("HTTP_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        Ok(Config {
            server_host,
            server_port,
            client_app_url,
            oauth,
            upstream,
            http_connect_timeout_secs,
            http_request_timeout_secs,
        })
    }

    /// Get bind address for server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Origin of the client application, used for CORS
    pub fn client_app_origin(&self) -> String {
        self.client_app_url.origin().ascii_serialization()
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))
}

fn url_var(name: &str, default: &str) -> anyhow::Result<Url> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", name, raw, e))
}

/// Split a comma separated symbol list, normalizing case and dropping blanks
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}


#[cfg(test)]
impl Config {
    /// Configuration with every provider pointed at one stub server
    pub(crate) fn for_tests(stub_url: &str) -> Self {
        let stub = Url::parse(stub_url).expect("stub url");
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            client_app_url: Url::parse("http://localhost:3001").expect("client url"),
            oauth: OAuthConfig {
                client_id: "test-client".to_string(),
                client_secret: SecretString::new("test-secret-123".to_string()),
                authorize_url: stub.join("/login/oauth/authorize").expect("authorize url"),
                token_url: stub.join("/login/oauth/access_token").expect("token url"),
                redirect_uri: Url::parse("http://localhost:3000/auth/provider/callback")
                    .expect("redirect url"),
                scope: "repo".to_string(),
            },
            upstream: UpstreamConfig {
                github_api_url: stub.clone(),
                weather_api_url: stub.clone(),
                weather_api_key: SecretString::new("weather-key".to_string()),
                weather_forecast_day: 1,
                currency_api_url: stub.clone(),
                currency_api_key: SecretString::new("currency-key".to_string()),
                currency_symbols: parse_symbols(DEFAULT_CURRENCY_SYMBOLS),
                public_apis_url: stub,
            },
            http_connect_timeout_secs: 2,
            http_request_timeout_secs: 5,
        }
    }
}
