use actix_web::{HttpResponse, web};
use log::error;

use crate::clients::OdooClient;
use crate::error::AppError;

/// GET /users — list the internal users of the upstream Odoo instance.
pub async fn get_users(client: web::Data<OdooClient>) -> Result<HttpResponse, AppError> {
    match client.get_users().await {
        Ok(users) => Ok(HttpResponse::Ok().json(users)),
        Err(e) => {
            error!("Failed to get users: {}", e);
            Err(AppError::Internal(format!("Failed to get users: {}", e)))
        }
    }
}
