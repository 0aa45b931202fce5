use actix_web::web;

use crate::handlers::{contact_handlers, root, user_handlers};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root::root))
        .route("/contacts", web::get().to(contact_handlers::get_contacts))
        .route(
            "/contacts/{contact_id}",
            web::get().to(contact_handlers::get_contact_by_id),
        )
        .route("/users", web::get().to(user_handlers::get_users));
}
