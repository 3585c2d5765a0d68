pub mod api_models;
pub mod cli_models;
pub mod handlers;
pub mod project;
pub mod settings;

/// Release builds look here for templates and browser scripts.
pub const NETSENTINEL_SETTINGS_FOLDER: &str = "/var/lib/netsentinel/";

/// Environment variable holding the key for the generative language API.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
