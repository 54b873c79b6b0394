pub mod assets;
mod config;
mod http_layers;
mod llm_routes;
mod pages;
pub mod server;
mod session;
pub mod state;
pub mod templates;

pub use config::ServerConfig;
pub use http_layers::*;
pub use llm_routes::{authorize_page, request_origin, PageAccess, LLM_COOKIE};
pub use pages::{compute_etag, render_navigation};
pub use server::{make_app, run_server};
pub use session::{PrimarySession, SharedSecretAuth, DEFAULT_SESSION_COOKIE};
pub use templates::{TemplateError, Templates, LAYOUT_TEMPLATE};
