use actix_web::{HttpResponse, web};
use log::error;

use crate::clients::OdooClient;
use crate::error::AppError;

/// GET /contacts — list all contacts known to the upstream Odoo
/// instance, reduced to the summary field set.
pub async fn get_contacts(client: web::Data<OdooClient>) -> Result<HttpResponse, AppError> {
    match client.get_contacts().await {
        Ok(contacts) => Ok(HttpResponse::Ok().json(contacts)),
        Err(e) => {
            error!("Failed to get contacts: {}", e);
            Err(AppError::Internal(format!("Failed to get contacts: {}", e)))
        }
    }
}

/// GET /contacts/{contact_id} — fetch a single contact by its Odoo
/// database id.
pub async fn get_contact_by_id(
    path: web::Path<i64>,
    client: web::Data<OdooClient>,
) -> Result<HttpResponse, AppError> {
    let contact_id = path.into_inner();
    match client.get_contact_by_id(contact_id).await {
        Ok(contact) => Ok(HttpResponse::Ok().json(contact)),
        Err(err @ AppError::NotFound(_)) => Err(err),
        Err(e) => {
            error!("Failed to get contact {}: {}", contact_id, e);
            Err(AppError::Internal(format!("Failed to get contact: {}", e)))
        }
    }
}
