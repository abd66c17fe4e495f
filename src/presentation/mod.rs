pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod password;

use actix_web::web;

/// Registers every route. Shared by the binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| password::invalid_body(err)))
        .app_data(web::FormConfig::default().error_handler(|err, _req| password::invalid_body(err)))
        .service(
            web::scope("/api")
                .route("/employees", web::post().to(handlers::create_employee))
                .route("/employees", web::get().to(handlers::get_employees))
                .route("/employees/{id}", web::get().to(handlers::get_employee_by_id))
                .route("/employees/{id}", web::put().to(handlers::update_employee))
                .route("/employees/{id}", web::delete().to(handlers::delete_employee))
                .route("/password/forgot", web::post().to(password::forgot_password))
                .route(
                    "/password/reset/{token}",
                    web::post().to(password::reset_password),
                ),
        )
        .route("/uploads/{filename}", web::get().to(handlers::serve_upload));
}
