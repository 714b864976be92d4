//! Server binary: settings from the environment, schema bootstrap, then serve until SIGINT/SIGTERM.

use crowdfund::auth::hash_password_blocking;
use crowdfund::migration::DEFAULT_CATEGORIES;
use crowdfund::payment::{HttpPaymentGateway, PaymentGateway, SimulatedPaymentGateway};
use crowdfund::repository::{CategoryRepository, UserRepository};
use crowdfund::{apply_migrations, build_router, ensure_database_exists, jobs, store, AppState, Settings};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crowdfund=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    ensure_database_exists(&settings.database_url).await?;
    let pool = store::connect(&settings).await?;
    apply_migrations(&pool).await?;

    let seeded = CategoryRepository::new(&pool).seed_defaults(DEFAULT_CATEGORIES).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "seeded default categories");
    }

    if let (Some(email), Some(password)) = (settings.admin_email.clone(), settings.admin_password.clone()) {
        let hash = hash_password_blocking(password).await?;
        if UserRepository::new(&pool)
            .ensure_admin(&email, &hash)
            .await?
        {
            tracing::info!(email = %email, "bootstrap admin created");
        }
    }

    let gateway: Arc<dyn PaymentGateway> = match settings.payment_gateway_url.as_deref() {
        Some(url) => Arc::new(HttpPaymentGateway::new(url, settings.payment_gateway_api_key.clone())?),
        None => {
            tracing::warn!("PAYMENT_GATEWAY_URL not set, using the simulated payment gateway");
            Arc::new(SimulatedPaymentGateway)
        }
    };
    tracing::info!(gateway = gateway.name(), currency = %settings.payment_currency, "payment gateway ready");

    tokio::spawn(jobs::run_expiry_sweep(
        pool.clone(),
        Duration::from_secs(settings.expiry_sweep_secs),
    ));

    let bind_addr = settings.bind_addr.clone();
    let state = AppState::new(pool, settings, gateway);
    let app = build_router(state)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
