//! Page shell for the tie-point client application
//!
//! This module turns server-side configuration and overlay data into the
//! single HTML document that boots the browser client.

pub mod error;
pub mod config;
pub mod bootstrap;
pub mod templates;
pub mod assets;
pub mod assembler;

// Re-export the pieces the web layer needs
pub use assembler::PageAssembler;
pub use bootstrap::{BootstrapPayload, ClientConfig};
pub use config::AppConfig;
pub use error::{ShellError, ShellResult};
pub use templates::TemplateRegistry;
