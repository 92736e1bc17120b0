//! 아이덴티티 게이트웨이 API 서버.
//!
//! 설정을 읽고 서명 키를 검증한 뒤 Axum 서버를 시작합니다.
//! 서명 키가 없으면 리스너를 열기 전에 종료합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use identity_api::repository::PgIdentityStore;
use identity_api::routes::create_app;
use identity_api::state::AppState;
use identity_core::{
    init_logging, AppConfig, IdentityStore, InMemoryIdentityStore, LogConfig, RoleName,
};

/// 설정 파일 경로 환경 변수.
const CONFIG_PATH_ENV: &str = "IDENTITY_CONFIG";

/// 기본 설정 파일 경로.
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 설정에 따라 저장소를 생성합니다.
///
/// `database.url`이 있으면 PostgreSQL, 없으면 인메모리 저장소를 사용합니다.
async fn create_store(config: &AppConfig) -> anyhow::Result<(Arc<dyn IdentityStore>, &'static str)> {
    match config.database.url.as_deref() {
        Some(url) => {
            let store = PgIdentityStore::connect(url, &config.database, config.password.clone())
                .await
                .context("failed to connect identity database")?;
            store.migrate().await?;
            Ok((Arc::new(store), "postgres"))
        }
        None => {
            warn!("database.url not set, using in-memory identity store (data is not persisted)");
            Ok((
                Arc::new(InMemoryIdentityStore::new(config.password.clone())),
                "memory",
            ))
        }
    }
}

/// 설정된 기본 역할 생성을 보장합니다.
async fn seed_roles(store: &dyn IdentityStore, names: &[String]) -> anyhow::Result<()> {
    for name in names {
        let role = RoleName::parse(name).with_context(|| format!("invalid seed role {:?}", name))?;
        store
            .ensure_role(&role)
            .await
            .with_context(|| format!("failed to seed role {}", role))?;
    }
    info!(count = names.len(), "Seed roles ensured");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드 (서명 키 검증 포함)
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    init_logging(LogConfig::from_config(&config.logging))
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    info!(config = %config_path, "Starting Identity API server...");

    let (store, backend) = create_store(&config).await?;
    seed_roles(store.as_ref(), &config.auth.seed_roles).await?;

    let state = AppState::from_config(&config.auth, store)
        .map_err(|e| {
            error!(error = %e, "Token issuer could not be created");
            e
        })?
        .with_store_backend(backend);
    let state = Arc::new(state);

    info!(
        version = %state.version,
        store = state.store_backend,
        "Application state initialized"
    );

    let app = create_app(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "API server listening");

    let shutdown_token = CancellationToken::new();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
        _ = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
}
