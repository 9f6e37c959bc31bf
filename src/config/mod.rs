use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL of this service as seen by browsers; the gateway redirects
    /// back to routes under it.
    pub public_base_url: String,
    pub gateway_base_url: String,
    pub gateway_access_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/mingle".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
            gateway_access_token: env::var("GATEWAY_ACCESS_TOKEN").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_falls_back_to_development_defaults() {
        env::remove_var("BIND_ADDR");
        env::remove_var("PUBLIC_BASE_URL");
        let config = Config::from_env();
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
        assert_eq!(config.public_base_url, "http://localhost:3001");
    }
}
