pub mod alert;
pub mod captcha;
pub mod config;
pub mod parser;
pub mod phone;
pub mod record;
pub mod session;
pub mod store;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
