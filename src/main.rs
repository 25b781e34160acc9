#[macro_use]
extern crate rocket;

mod auth;
mod authoring;
mod db;
mod env;
mod error;
mod export;
mod models;
mod routes;
mod telemetry;
#[cfg(test)]
mod test;

use auth::unauthorized;
use routes::{
    admin_dashboard, create_form_page, create_form_route, download_submissions, fill_form,
    fill_form_page, form_submissions, health, index, student_dashboard, student_login,
    student_login_page, student_logout, view_submissions,
};
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use sqlx::SqlitePool;
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

async fn connect_database(database_url: &str) -> Result<SqlitePool, Error> {
    let pool = SqlitePool::connect(database_url).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    Ok(pool)
}

#[launch]
async fn rocket() -> _ {
    {
        let env_files = env::load_environment();

        init_tracing();

        match env_files {
            Ok(files) => env::log_environment(&files),
            Err(e) => warn!(error = %e, "Failed to load environment files"),
        }
    }

    let database_url = env::database_url();

    let pool = match connect_database(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to set up database");
            panic!("Database setup failed: {}", e);
        }
    };

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting student forms");

    rocket::build()
        .manage(pool)
        .mount(
            "/",
            routes![
                index,
                health,
                admin_dashboard,
                create_form_page,
                create_form_route,
                student_login_page,
                student_login,
                student_dashboard,
                student_logout,
                fill_form_page,
                fill_form,
                view_submissions,
                form_submissions,
                download_submissions,
            ],
        )
        .register("/", catchers![unauthorized])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
