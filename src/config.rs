use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub endpoint: String,
    pub client_id: String,
    pub api_key: String,
    /// Base URL the gateway redirects back to after checkout.
    pub redirect_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Safety default used when the profile has no plausible birth date.
    /// An approximation, not a computation — see `recommend::planner`.
    pub fallback_age: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub redis_url: Option<String>,
    pub vision: Option<VisionConfig>,
    pub payment: Option<PaymentConfig>,
    pub planner: PlannerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mealwise".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "mealwise-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let redis_url = std::env::var("REDIS_URL").ok();

        let vision = std::env::var("GEMINI_API_KEY").ok().map(|api_key| VisionConfig {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
        });

        let payment = match (
            std::env::var("PAYMENT_ENDPOINT").ok(),
            std::env::var("PAYMENT_CLIENT_ID").ok(),
            std::env::var("PAYMENT_API_KEY").ok(),
        ) {
            (Some(endpoint), Some(client_id), Some(api_key)) => Some(PaymentConfig {
                endpoint,
                client_id,
                api_key,
                redirect_base: std::env::var("PAYMENT_REDIRECT_BASE")
                    .unwrap_or_else(|_| "http://localhost:8080".into()),
            }),
            _ => None,
        };

        let planner = PlannerConfig {
            fallback_age: std::env::var("PLANNER_FALLBACK_AGE")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(25),
        };

        Ok(Self {
            database_url,
            jwt,
            redis_url,
            vision,
            payment,
            planner,
        })
    }
}
