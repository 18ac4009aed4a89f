// src/utils/env.rs

use log::debug;

/// Load a `.env` file if one is present. Missing files are fine; a malformed
/// file is worth surfacing in debug output but never fatal.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}
