pub mod odoo_client;
pub mod session;
pub mod transport;

pub use odoo_client::OdooClient;
pub use session::{AuthMode, SessionManager};
pub use transport::{RpcResponse, RpcTransport};
