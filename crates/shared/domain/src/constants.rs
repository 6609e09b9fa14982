/// `OpenAPI` tags.
pub const SYSTEM_TAG: &str = "System";
pub const IDENTITY_TAG: &str = "Identity";
pub const CLASSES_TAG: &str = "Classes";
pub const ATTENDANCE_TAG: &str = "Attendance";

pub const API_TITLE: &str = "Attendance Functions API";
pub const API_VERSION: &str = "v1";

/// Body returned by the health endpoints.
pub const HEALTHY_MESSAGE: &str = "Healthy";

/// Name of the optional local env file.
pub const ENV_FILE: &str = ".env";

/// Environment variable names.
pub mod env {
    pub const JWT_SECRET: &str = "JWT_SECRET";
    pub const TOKEN_EXP_MIN: &str = "TOKEN_EXP_MIN";
    pub const JWT_LEEWAY_SECONDS: &str = "JWT_LEEWAY_SECONDS";

    pub const PORT: &str = "PORT";
    pub const DOCS_PREFIX: &str = "DOCS_PREFIX";
    pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DATABASE_HOST: &str = "DATABASE_HOST";
    pub const DATABASE_PORT: &str = "DATABASE_PORT";
    pub const DATABASE_NAMESPACE: &str = "DATABASE_NAMESPACE";
    pub const DATABASE_NAME: &str = "DATABASE_NAME";
    pub const DATABASE_USER: &str = "DATABASE_USER";
    pub const DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
    pub const DATABASE_PROBE_TIMEOUT_MS: &str = "DATABASE_PROBE_TIMEOUT_MS";
    pub const DATABASE_GATE_TTL_MS: &str = "DATABASE_GATE_TTL_MS";

    pub const RUST_LOG: &str = "RUST_LOG";
    pub const LOG_DIR: &str = "LOG_DIR";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";

    pub const HOST: &str = "HOST";
    pub const FLASK_RUN_HOST: &str = "FLASK_RUN_HOST";
    pub const FLASK_RUN_PORT: &str = "FLASK_RUN_PORT";
}

/// Fallback values for optional settings.
pub mod defaults {
    pub const PORT: u16 = 3001;
    pub const DOCS_PREFIX: &str = "/docs";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub const TOKEN_TTL_MINUTES: u64 = 60;
    pub const TOKEN_LEEWAY_SECONDS: u64 = 30;

    pub const DATABASE_PORT: u16 = 8000;
    pub const DATABASE_NAMESPACE: &str = "rollcall";
    pub const DATABASE_NAME: &str = "attendance";
    pub const DATABASE_PROBE_TIMEOUT_MS: u64 = 2_000;
    pub const DATABASE_GATE_TTL_MS: u64 = 5_000;

    pub const ATTENDANCE_PAGE: usize = 100;
    pub const ATTENDANCE_PAGE_MAX: usize = 1_000;
}
