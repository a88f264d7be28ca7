// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use retail_backend::{
    common::context::RequestContext,
    config::{self, AppState, Config},
    routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let pool = config::connect_pool(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = config.bind_addr;
    let bootstrap_admin = config.bootstrap_admin.clone();
    let app_state = AppState::with_pool(config, pool)?;

    if let Some(admin) = bootstrap_admin {
        let ctx = RequestContext::with_timeout(app_state.config.request_timeout);
        if let Some(created) = app_state
            .auth_service
            .ensure_bootstrap_admin(&ctx, &admin.phone, &admin.password)
            .await?
        {
            tracing::info!(id = created.id, "👑 Administrador inicial criado");
        }
    }

    let app = routes::app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
