use crate::{
    api::{account, attendance, report, student},
    auth::middleware::auth_middleware,
    config::Config,
    error::ServiceError,
};
use actix_web::{error::JsonPayloadError, middleware::from_fn, web};

/// Body ceiling comes from config; base64 photos make the default generous.
fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| match err {
            JsonPayloadError::Deserialize(e) => {
                ServiceError::validation(format!("Invalid JSON body: {e}")).into()
            }
            other => other.into(),
        })
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .app_data(json_config(config.json_limit_bytes))
            .route("/login", web::post().to(account::login))
            // roster
            .route("/students", web::get().to(student::list_students))
            .route("/add-students", web::post().to(student::add_student))
            // attendance lifecycle
            .route("/start-attendance", web::post().to(attendance::start_attendance))
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::check_in)),
                    )
                    // reports, registered before /{id}
                    .route("/daily", web::get().to(report::daily))
                    .route("/weekly", web::get().to(report::weekly))
                    .route("/monthly", web::get().to(report::monthly))
                    .route("/monthlyreport", web::get().to(report::monthly_report))
                    .route("/yearly", web::get().to(report::yearly))
                    .route("/overview", web::get().to(report::overview))
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .route("/stats", web::get().to(report::stats))
            .route("/professors", web::get().to(report::professors))
            .service(
                web::scope("/accounts")
                    .service(
                        web::resource("")
                            .route(web::get().to(account::list_accounts))
                            .route(web::post().to(account::add_account)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(account::update_account))
                            .route(web::delete().to(account::delete_account)),
                    ),
            ),
    );
}
