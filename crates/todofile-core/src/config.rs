//! Server configuration from environment variables
//!
//! All knobs come from the environment with sensible defaults; the binary
//! may override host/port/data-dir from the command line afterwards.

use std::path::PathBuf;

/// Process-level configuration for the todofile server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Expected bearer token; `None` means authenticated endpoints fail
    /// with a server-configuration error
    pub api_token: Option<String>,

    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Verbose logging by default
    pub debug: bool,

    /// Display title for the landing pages
    pub page_title: String,

    /// Whether the landing page links to the admin panel
    pub show_admin_panel: bool,

    /// Directory holding the persisted JSON documents
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            api_token: std::env::var("TODO_TOKEN").ok().filter(|t| !t.is_empty()),
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port()),
            debug: std::env::var("DEBUG_MODE")
                .map(|v| parse_truthy(&v))
                .unwrap_or(false),
            page_title: std::env::var("PAGE_TITLE").unwrap_or_else(|_| default_page_title()),
            show_admin_panel: std::env::var("SHOW_ADMIN_PANEL_BUTTON")
                .map(|v| parse_truthy(&v))
                .unwrap_or(true),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
        }
    }

    /// Address string suitable for a TCP bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            host: default_host(),
            port: default_port(),
            debug: false,
            page_title: default_page_title(),
            show_admin_panel: true,
            data_dir: default_data_dir(),
        }
    }
}

fn parse_truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "yes" | "1" | "y"
    )
}

// Default value providers
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_page_title() -> String {
    "ToDo App".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
