use anyhow::Context;
use portfolio_content::{
    db::postgres::{create_pool, run_migrations},
    entities::testimony::{live_only, TestimonyFilter},
    repositories::{
        category::CategoryRepository,
        project::{ProjectRepository, ProjectScope},
        skill::SkillRepository,
        testimony::TestimonyRepository,
    },
    settings::{AppConfig, LogFormat},
    shared_repos::SharedRepositories,
};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to create database connection pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to apply database migrations")?;

    // Read-only report; no blob backend is needed.
    let repos = SharedRepositories::new(pool, config.delete_policies());

    let categories = repos.category_repo.list_categories().await?;
    let skills = repos.skill_repo.list_skills().await?;
    let projects = repos.project_repo.list_projects(ProjectScope::All).await?;
    let testimonies = repos.testimony_repo.list_testimonies(TestimonyFilter::All).await?;
    let live = live_only(&testimonies).count();

    let summary = serde_json::json!({
        "name": config.name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.env.to_string(),
        "categories": categories.len(),
        "skills": skills.len(),
        "projects": projects.len(),
        "testimonies": {
            "total": testimonies.len(),
            "live": live,
            "awaiting_moderation": testimonies.len() - live,
        },
    });

    tracing::info!("Content store ready: {}", summary);
    Ok(())
}
