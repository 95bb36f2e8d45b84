//! The worker's compiled-in cache policy.

/// Name of the versioned static namespace. Bump the version with every
/// release so activation purges the previous release's assets.
pub const STATIC_CACHE: &str = "offgrid-static-v1";

/// Name of the runtime namespace holding documents and other responses.
pub const RUNTIME_CACHE: &str = "offgrid-runtime";

/// Shell resources fetched and stored at install time.
pub const PRECACHE: &[&str] = &["/", OFFLINE_PAGE];

/// Page served when a document can be neither fetched nor found in cache.
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Path prefix of the frontend build output.
pub const BUILD_PREFIX: &str = "/build/";

/// Path prefix of the generator API.
pub const API_PREFIX: &str = "/api/";

/// File extensions treated as static assets: scripts, stylesheets, raster
/// and vector images, modern image formats and web fonts.
pub const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "woff", "woff2", "ttf", "otf", "eot",
];

/// Cache policy handed to a [`ServiceWorker`](super::ServiceWorker).
///
/// `Manifest::default()` is the production policy built from the constants
/// above. Tests build their own to exercise other namespace names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub static_cache: String,
    pub runtime_cache: String,
    /// Origin-relative paths pre-warmed on install.
    pub precache: Vec<String>,
    /// Origin-relative path of the offline fallback page; must be in `precache`.
    pub offline_page: String,
    pub build_prefix: String,
    pub api_prefix: String,
    /// Extensions without the leading dot.
    pub static_extensions: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            static_cache: STATIC_CACHE.to_string(),
            runtime_cache: RUNTIME_CACHE.to_string(),
            precache: PRECACHE.iter().map(|p| p.to_string()).collect(),
            offline_page: OFFLINE_PAGE.to_string(),
            build_prefix: BUILD_PREFIX.to_string(),
            api_prefix: API_PREFIX.to_string(),
            static_extensions: STATIC_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Manifest {
    /// Whether a namespace name belongs to the current release.
    pub fn is_current(&self, namespace: &str) -> bool {
        namespace == self.static_cache || namespace == self.runtime_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = Manifest::default();
        assert_eq!(manifest.precache, vec!["/".to_string(), "/offline.html".to_string()]);
        assert!(manifest.precache.contains(&manifest.offline_page));
        assert_eq!(manifest.build_prefix, "/build/");
        assert_eq!(manifest.api_prefix, "/api/");
        assert!(manifest.static_extensions.iter().any(|e| e == "woff2"));
    }

    #[test]
    fn test_is_current() {
        let manifest = Manifest::default();
        assert!(manifest.is_current(STATIC_CACHE));
        assert!(manifest.is_current(RUNTIME_CACHE));
        assert!(!manifest.is_current("offgrid-static-v0"));
    }
}
