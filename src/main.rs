use actix_web::{App, HttpServer, web};
use anyhow::Context;
use employee_directory_api::application::employee_service::EmployeeService;
use employee_directory_api::application::password_service::PasswordService;
use employee_directory_api::data::employee_repository::InMemoryEmployeeRepository;
use employee_directory_api::data::user_repository::InMemoryUserRepository;
use employee_directory_api::infrastructure::config::Config;
use employee_directory_api::infrastructure::logging::init_logging;
use employee_directory_api::infrastructure::mail::SmtpMailer;
use employee_directory_api::infrastructure::uploads::ImageStore;
use employee_directory_api::presentation::configure;
use employee_directory_api::presentation::handlers::AppState;
use employee_directory_api::presentation::middleware::RequestTracing;
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = Config::from_env().context("Invalid configuration")?;
    info!(?config, "Configuration loaded");

    let images = ImageStore::new(&config.upload_dir);
    images.ensure_dir().await?;
    info!(upload_dir = %images.dir().display(), "Upload directory ready");

    let mailer = SmtpMailer::new(&config.mail)?;
    info!(smtp_host = %config.mail.smtp_host, "Mail transport configured");

    let password_service = PasswordService::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(mailer),
        config.reset_token_ttl,
    );
    for seed in &config.seed_users {
        password_service
            .seed_user(&seed.email, &seed.password)
            .await
            .with_context(|| format!("Cannot seed user {}", seed.email))?;
    }
    info!(count = config.seed_users.len(), "User accounts seeded");

    let state = web::Data::new(AppState {
        employee_service: EmployeeService::new(
            Arc::new(InMemoryEmployeeRepository::new()),
            images,
        ),
        password_service,
        public_url: config.public_url.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(RequestTracing)
            .configure(configure)
    })
    .bind(config.bind_addr())
    .with_context(|| format!("Cannot bind {}:{}", config.host, config.port))?;

    info!(host = %config.host, port = config.port, "Starting HTTP server");
    server.run().await?;
    info!("HTTP server stopped");
    Ok(())
}
