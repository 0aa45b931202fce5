pub mod contact_handlers;
pub mod root;
pub mod user_handlers;
