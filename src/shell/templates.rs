use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::shell::error::{ShellError, ShellResult};

/// File extension of client template sources on disk
pub const CLIENT_TEMPLATE_EXTENSION: &str = "html";

/// Client-side template sources keyed by name.
///
/// Names become element ids (`template-<name>`), so they are limited to
/// ASCII letters, digits, `-` and `_`, and each may appear only once.
/// Iteration order is the sorted name order, which keeps rendered pages
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateRegistry {
    entries: BTreeMap<String, String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from name/source pairs, failing on the first
    /// invalid or repeated name.
    pub fn from_pairs<I, N, S>(pairs: I) -> ShellResult<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, source) in pairs {
            registry.insert(name, source)?;
        }
        Ok(registry)
    }

    /// Load every `*.html` file in `dir`; the file stem is the template name.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> ShellResult<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_template = path
                .extension()
                .map_or(false, |ext| ext == CLIENT_TEMPLATE_EXTENSION);
            if path.is_file() && is_template {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| ShellError::InvalidTemplateName(path.display().to_string()))?
                .to_string();
            let source = fs::read_to_string(&path)?;
            debug!("Loaded client template {} from {}", name, path.display());
            registry.insert(name, source)?;
        }

        info!("Loaded {} client templates from {}", registry.len(), dir.display());
        Ok(registry)
    }

    pub fn insert<N: Into<String>, S: Into<String>>(&mut self, name: N, source: S) -> ShellResult<()> {
        let name = name.into();
        validate_name(&name)?;
        if self.entries.contains_key(&name) {
            return Err(ShellError::DuplicateTemplate(name));
        }
        self.entries.insert(name, source.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, source)| (name.as_str(), source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_name(name: &str) -> ShellResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ShellError::InvalidTemplateName(name.to_string()))
    }
}
