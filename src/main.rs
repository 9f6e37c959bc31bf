use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use mingle_server::config::Config;
use mingle_server::gateway::PaymentGateway;
use mingle_server::notifications::LogSink;
use mingle_server::routes::create_routes;
use mingle_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let gateway = PaymentGateway::new(
        config.gateway_base_url.clone(),
        config.gateway_access_token.clone(),
    );

    let state = AppState {
        pool,
        gateway,
        notifier: Arc::new(LogSink),
        public_base_url: config.public_base_url.clone(),
    };

    let app: Router = create_routes(state);

    let addr: SocketAddr = config.bind_addr.parse().expect("Invalid BIND_ADDR");
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
