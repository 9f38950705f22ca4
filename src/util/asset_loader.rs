use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use minijinja::{Environment, Error, State};
use sha2::{Digest, Sha256};

const STATIC_ROOT: &str = "static";
const URL_PREFIX: &str = "/static";

/// Resolves static asset paths to cache-busted URLs
/// (`/static/app.js?v=<sha256>`) and exposes them to templates as `asset()`.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::with_root(STATIC_ROOT)
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::default(),
        }
    }

    pub fn asset_path(&self, path: &str) -> String {
        if let Some(hashed) = self.cache.read().ok().and_then(|c| c.get(path).cloned()) {
            return hashed;
        }

        // Unreadable files are not cached so they are picked up once they exist.
        let Ok(contents) = fs::read(self.root.join(path)) else {
            return format!("{URL_PREFIX}/{path}");
        };

        let hash = Sha256::digest(contents);
        let hashed = format!("{URL_PREFIX}/{path}?v={hash:x}");
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(path.to_string(), hashed.clone());
        }
        hashed
    }

    pub fn register(&self, env: &mut Environment<'_>) {
        let loader = self.clone();
        env.add_function("asset", move |_state: &State, path: String| -> Result<String, Error> {
            Ok(loader.asset_path(&path))
        });
    }
}
