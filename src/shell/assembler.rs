use handlebars::Handlebars;
use log::{debug, error};
use serde::Serialize;

use crate::shell::assets::ResourceManifest;
use crate::shell::bootstrap::BootstrapPayload;
use crate::shell::error::{ShellError, ShellResult};

/// Width of the enhancement slider track in pixels
pub const ENHANCE_SLIDER_LENGTH_PIXELS: u32 = 57;
/// Upper bound of the rotation control in pixels
pub const ROTATION_MAX_PIXELS: u32 = 556;

pub const SHELL_TEMPLATE_NAME: &str = "shell";

const SHELL_TEMPLATE: &str = include_str!("../web/templates/shell.hbs");

// Shared handlebars instance holding the compiled shell
lazy_static::lazy_static! {
    static ref HBS: Handlebars<'static> = {
        let mut hbs = Handlebars::new();
        if let Err(e) = hbs.register_template_string(SHELL_TEMPLATE_NAME, SHELL_TEMPLATE) {
            error!("Error registering shell template: {}", e);
        }
        hbs
    };
}

/// Typed render context for the shell template. Every `*_json` field is
/// already escaped for inclusion inside a `<script>` element.
#[derive(Serialize)]
struct ShellContext<'a> {
    title: &'a str,
    stylesheets: &'a [String],
    scripts: &'a [String],
    csrf_token_json: String,
    settings_json: String,
    fit_url_json: String,
    forward_url_json: String,
    enhance_url_json: String,
    enhance_slider_length_pixels: u32,
    rotation_max_pixels: u32,
    overlays_json: Option<String>,
    fragments: Vec<Fragment<'a>>,
}

#[derive(Serialize)]
struct Fragment<'a> {
    name: &'a str,
    source: &'a str,
}

/// Renders the page shell from a bootstrap payload.
#[derive(Debug, Clone)]
pub struct PageAssembler {
    title: String,
    manifest: ResourceManifest,
}

impl PageAssembler {
    pub fn new(title: impl Into<String>, manifest: ResourceManifest) -> Self {
        Self {
            title: title.into(),
            manifest,
        }
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    /// Render the full document.
    ///
    /// All inline data is serialized before the template runs, so a
    /// serialization failure returns an error and no document at all.
    pub fn render(&self, payload: &BootstrapPayload<'_>, csrf_token: &str) -> ShellResult<String> {
        let endpoints = payload.config.endpoints();

        let overlays_json = match &payload.initial_overlays {
            Some(overlays) => Some(embed_json(overlays)?),
            None => None,
        };

        let mut fragments = Vec::with_capacity(payload.templates.len());
        for (name, source) in payload.templates.iter() {
            check_fragment(name, source)?;
            fragments.push(Fragment { name, source });
        }

        let context = ShellContext {
            title: &self.title,
            stylesheets: &self.manifest.stylesheets,
            scripts: &self.manifest.scripts,
            csrf_token_json: embed_json(&csrf_token)?,
            settings_json: embed_json(payload.config.settings())?,
            fit_url_json: embed_json(&endpoints.fit)?,
            forward_url_json: embed_json(&endpoints.forward)?,
            enhance_url_json: embed_json(&endpoints.enhance)?,
            enhance_slider_length_pixels: ENHANCE_SLIDER_LENGTH_PIXELS,
            rotation_max_pixels: ROTATION_MAX_PIXELS,
            overlays_json,
            fragments,
        };

        let body = HBS.render(SHELL_TEMPLATE_NAME, &context)?;
        debug!(
            "Rendered page shell: {} bytes, {} fragments",
            body.len(),
            payload.templates.len()
        );
        Ok(body)
    }
}

/// Serialize `value` as JSON that is safe inside a `<script>` element.
///
/// `<` only ever occurs inside JSON strings, where `\u003c` is an
/// equivalent escape; this rules out `</script>` and `<!--`. U+2028 and
/// U+2029 are escaped because older script engines treat them as line
/// terminators inside string literals.
pub fn embed_json<T: Serialize + ?Sized>(value: &T) -> ShellResult<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Fragments are emitted unmodified, so a source that would close its
/// enclosing script element, or push the parser into the double-escaped
/// script state with `<!--`, cannot be embedded.
fn check_fragment(name: &str, source: &str) -> ShellResult<()> {
    let lowered = source.to_ascii_lowercase();
    let reason = if lowered.contains("</script") {
        "a closing script tag"
    } else if lowered.contains("<!--") {
        "a comment opener"
    } else {
        return Ok(());
    };
    Err(ShellError::SerializationError(format!(
        "client template {:?} contains {}",
        name, reason
    )))
}
