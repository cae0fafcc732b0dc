use {
    axum_hardened::{
        AppState, Config, FluentRouter, ItemRepository, LifecycleService, MemoryItemRepository,
        Result, items,
    },
    std::sync::Arc,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::default();
    config.setup_tracing();

    #[cfg(feature = "postgres")]
    if std::env::var("DATABASE_URL").is_ok() {
        let repo = axum_hardened::PgItemRepository::new(config.create_pgpool()?);
        let service = repo.into_service();
        return run(config, repo, service).await;
    }

    let repo = MemoryItemRepository::new();
    let service = repo.into_service();
    run(config, repo, service).await
}

async fn run<R: ItemRepository>(
    config: Config,
    repo: R,
    service: Arc<dyn LifecycleService>,
) -> Result<()> {
    tracing::info!(
        name = %config.app.name,
        environment = %config.app.environment,
        "Starting items service"
    );

    let router = FluentRouter::<AppState<R>>::with_state(config, AppState::new(repo))?;
    router.lifecycle().register([service]);

    router
        .nest(items::ITEMS_PATH, items::router())
        .setup_middleware()
        .await?
        .start()
        .await
}
