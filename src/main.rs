use std::{process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use tavola::{
    application::{
        catalog::CatalogService,
        discount::DiscountOverlay,
        error::AppError,
        jobs::{SyncJobContext, process_sync_job},
        repos::{CatalogRepo, CatalogWriteRepo},
        sync::{Reconciler, SyncService},
    },
    cache::CacheConfig,
    config,
    infra::{
        cache::build_entity_cache,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        snapshot_source::CsvSnapshotSource,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Sync(_) => run_sync(settings).await,
    }
}

struct ApplicationContext {
    catalog: Arc<CatalogService>,
    sync: Arc<SyncService>,
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories.clone(), &settings).await?;

    let monitor_handle = if settings.sync.enabled {
        let initial = app.sync.clone();
        tokio::spawn(async move {
            if let Err(err) = initial.run_once().await {
                warn!(target = "tavola::sync", error = %err, "Startup sync failed");
            }
        });
        Some(spawn_sync_monitor(app.sync.clone(), &settings.sync))
    } else {
        info!(target = "tavola::sync", "Catalog sync disabled");
        None
    };

    let state = ApiState {
        catalog: app.catalog,
        db: Some(repositories),
    };
    let result = serve_http(&settings, state).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_sync(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings).await?;

    info!(
        target = "tavola::sync",
        source = %settings.sync.source_path.display(),
        "Starting one-shot sync"
    );

    if let Some(report) = app.sync.run_once().await? {
        info!(
            target = "tavola::sync",
            mutations = report.mutations(),
            skipped = report.skipped.len(),
            discounts = app.sync.discounts().len(),
            "Sync finished"
        );
    }

    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let cache = build_entity_cache(&CacheConfig::from(&settings.cache)).await?;

    let reader: Arc<dyn CatalogRepo> = repositories.clone();
    let writer: Arc<dyn CatalogWriteRepo> = repositories;
    let discounts = Arc::new(DiscountOverlay::new());

    let catalog = CatalogService::new(reader.clone(), writer.clone(), discounts.clone())
        .with_cache_opt(cache.clone());
    let reconciler = Reconciler::new(reader, writer).with_cache_opt(cache);
    let source = Arc::new(CsvSnapshotSource::new(settings.sync.source_path.clone()));
    let sync = SyncService::new(source, reconciler, discounts);

    Ok(ApplicationContext {
        catalog: Arc::new(catalog),
        sync: Arc::new(sync),
    })
}

fn spawn_sync_monitor(
    sync: Arc<SyncService>,
    settings: &config::SyncSettings,
) -> tokio::task::JoinHandle<()> {
    let sync_worker = WorkerBuilder::new("catalog-sync-worker")
        .data(SyncJobContext { sync })
        .backend(CronStream::new(settings.schedule.clone()))
        .build_fn(process_sync_job);

    let monitor = Monitor::new().register(sync_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "tavola::http",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "tavola::http", "Shutdown signal received");
}
