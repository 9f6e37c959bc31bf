use std::sync::Arc;

use sqlx::PgPool;

use crate::gateway::PaymentGateway;
use crate::notifications::NotificationSink;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub gateway: PaymentGateway,
    pub notifier: Arc<dyn NotificationSink>,
    /// Base URL of this service, used to build the gateway's back URLs.
    pub public_base_url: String,
}
