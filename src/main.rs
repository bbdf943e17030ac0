use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;

use attendance::clock::{Clock, SystemClock};
use attendance::config::Config;
use attendance::db;
use attendance::docs::ApiDoc;
use attendance::routes;
use attendance::services::mail::{DisabledMailer, ReportMailer, SmtpMailer};

use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    if config.uses_dev_secret() {
        warn!("SESSION_SECRET not set, using the development secret");
    }

    let pool = db::init_db(&config.database_url, config.database_max_connections).await?;

    if config.seed_demo_data {
        db::seed_demo_data(&pool).await?;
    }

    let mailer: Arc<dyn ReportMailer> = match SmtpMailer::from_config(&config) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!(error = %e, "Reports will be saved but not emailed");
            Arc::new(DisabledMailer)
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, recipients = config.report_recipients.len(), "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::from(clock.clone()))
            .app_data(Data::from(mailer.clone()))
            .configure(routes::configure)
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
