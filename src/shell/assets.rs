//! Stylesheet and library script references emitted by the page shell.
//!
//! Order matters: the client libraries depend on each other in the order
//! listed, and the application scripts expect every library to be loaded.

/// Stylesheets, relative to the static URL
const STYLESHEETS: &[&str] = &[
    "external/css/bootstrap.min.css",
    "external/css/jquery-ui.css",
    "external/css/jquery.dataTables.css",
    "geocamTiePoint/css/tiepoint.css",
];

/// Library and application scripts, relative to the static URL unless absolute
const SCRIPTS: &[&str] = &[
    // DOM, widgets
    "external/js/jquery.min.js",
    "external/js/jquery-ui.min.js",
    "external/js/bootstrap.min.js",
    // Client-side MVC
    "external/js/underscore-min.js",
    "external/js/backbone-min.js",
    "external/js/backbone-relational.js",
    "external/js/handlebars.js",
    // Table rendering
    "external/js/jquery.dataTables.min.js",
    // Mapping
    "https://maps.googleapis.com/maps/api/js?libraries=geometry",
    "geocamTiePoint/js/coords.js",
    "geocamTiePoint/js/maputils.js",
    "geocamTiePoint/js/transform.js",
    // Application
    "geocamTiePoint/js/backbone/app.js",
    "geocamTiePoint/js/backbone/models.js",
    "geocamTiePoint/js/backbone/views.js",
    "geocamTiePoint/js/backbone/router.js",
];

/// Resolved resource URLs in emission order
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceManifest {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
}

impl ResourceManifest {
    pub fn for_static_url(static_url: &str) -> Self {
        Self {
            stylesheets: STYLESHEETS.iter().map(|path| resolve(static_url, path)).collect(),
            scripts: SCRIPTS.iter().map(|path| resolve(static_url, path)).collect(),
        }
    }
}

fn resolve(static_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        path.to_string()
    } else {
        format!("{}/{}", static_url.trim_end_matches('/'), path)
    }
}
