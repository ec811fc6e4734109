//! Single-page application assets.
//!
//! Existing files are served as-is; any other path gets `index.html` with a
//! 200 so client-side routing can take over.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

pub type SpaService = ServeDir<ServeFile>;

pub fn spa_service(dir: impl AsRef<Path>) -> SpaService {
    let dir = dir.as_ref();
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}
