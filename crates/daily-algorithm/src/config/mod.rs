pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::{load_config, load_config_from_str, load_or_default, CONFIG_FILE_NAME};
pub use paths::AppPaths;
pub use schema::{default_config_dir, Config, LogFormat, APP_NAME};
