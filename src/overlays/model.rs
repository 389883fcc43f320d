use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shell::error::{ShellError, ShellResult};

/// Zoom levels between the unaligned tile pyramid and the map
pub const UNALIGNED_TILES_ZOOM_OFFSET: u32 = 3;

/// Images narrower than this are fetched at the small size
pub const SMALL_IMAGE_MAX_WIDTH: f64 = 1200.0;

/// Fields copied from client JSON into `extras`
const IMPORT_EXTRAS_FIELDS: &[&str] = &["points", "transform", "centerLat", "centerLon"];

/// Size class of an overlay image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSizeType {
    Small,
    Large,
}

/// Kinds of export archive an aligned overlay can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Html,
    Kml,
    Geotiff,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Html => "html",
            ExportKind::Kml => "kml",
            ExportKind::Geotiff => "geotiff",
        }
    }
}

/// Aligned tile pyramid and the export archives generated from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignedQuadTree {
    pub id: u64,
    pub html_export_name: Option<String>,
    pub kml_export_name: Option<String>,
    pub geotiff_export_name: Option<String>,
}

impl AlignedQuadTree {
    fn export_name(&self, kind: ExportKind) -> Option<&str> {
        let name = match kind {
            ExportKind::Html => &self.html_export_name,
            ExportKind::Kml => &self.kml_export_name,
            ExportKind::Geotiff => &self.geotiff_export_name,
        };
        name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Route prefixes used to build the URLs embedded in client JSON
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayUrls {
    /// Prefix of the per-overlay JSON resource
    pub overlay_json: String,
    pub tiles: String,
    pub public_tiles: String,
    pub export: String,
}

impl OverlayUrls {
    pub fn overlay_json_url(&self, key: u64) -> String {
        format!("{}/{}", self.overlay_json.trim_end_matches('/'), key)
    }

    pub fn tiles_url(&self, quad_tree_id: u64, public: bool) -> String {
        let prefix = if public { &self.public_tiles } else { &self.tiles };
        format!("{}/{}", prefix.trim_end_matches('/'), quad_tree_id)
    }

    pub fn export_url(&self, key: u64, kind: ExportKind, archive_name: &str) -> String {
        format!(
            "{}/{}/export/{}/{}",
            self.export.trim_end_matches('/'),
            key,
            kind.as_str(),
            archive_name
        )
    }
}

impl Default for OverlayUrls {
    fn default() -> Self {
        Self {
            overlay_json: "/api/overlay".to_string(),
            tiles: "/tiepoint/tile".to_string(),
            public_tiles: "/tiepoint/public/tile".to_string(),
            export: "/tiepoint/overlay".to_string(),
        }
    }
}

/// A georeferenced image overlay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overlay {
    /// Store-assigned key; 0 until first saved
    pub key: u64,
    pub last_modified_time: DateTime<Utc>,
    pub name: String,
    /// User who owns the overlay
    pub author: Option<String>,
    pub description: String,
    pub image_source_url: String,
    pub is_public: bool,
    /// Name of the region covered by the overlay
    pub coverage: String,
    /// Person or organization credited for the overlay
    pub creator: String,
    pub source_date: String,
    pub rights: String,
    pub license: String,
    /// ISS mission-roll-frame id, e.g. `ISS039-E-12345`
    pub iss_mrf: Option<String>,
    /// Schema-free fields: imageSize, points, transform, bounds, centerLat, centerLon ...
    pub extras: Map<String, Value>,
    pub unaligned_quad_tree: Option<u64>,
    pub aligned_quad_tree: Option<AlignedQuadTree>,
}

impl Overlay {
    pub fn new(name: impl Into<String>, is_public: bool) -> Self {
        Self {
            key: 0,
            last_modified_time: Utc::now(),
            name: name.into(),
            author: None,
            description: String::new(),
            image_source_url: String::new(),
            is_public,
            coverage: String::new(),
            creator: String::new(),
            source_date: String::new(),
            rights: String::new(),
            license: String::new(),
            iss_mrf: None,
            extras: Map::new(),
            unaligned_quad_tree: None,
            aligned_quad_tree: None,
        }
    }

    /// Client-side JSON representation.
    ///
    /// Starts from `extras`, adds the non-empty exported fields, then the
    /// derived timestamps and URLs.
    pub fn to_json_dict(&self, urls: &OverlayUrls) -> Map<String, Value> {
        let mut result = self.extras.clone();

        result.insert("key".to_string(), Value::from(self.key));
        insert_non_empty(&mut result, "name", &self.name);
        insert_non_empty(&mut result, "description", &self.description);
        insert_non_empty(&mut result, "imageSourceUrl", &self.image_source_url);
        if let Some(iss_mrf) = &self.iss_mrf {
            insert_non_empty(&mut result, "issMRF", iss_mrf);
        }
        insert_non_empty(&mut result, "creator", &self.creator);

        result.insert(
            "lmt_datetime".to_string(),
            Value::from(self.last_modified_time.format("%Y-%m-%d %k:%M").to_string()),
        );
        result.insert(
            "lastModifiedTime".to_string(),
            Value::from(self.last_modified_time.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        );

        result.insert("url".to_string(), Value::from(urls.overlay_json_url(self.key)));

        if let Some(quad_tree_id) = self.unaligned_quad_tree {
            result.insert(
                "unalignedTilesUrl".to_string(),
                Value::from(urls.tiles_url(quad_tree_id, false)),
            );
            result.insert(
                "unalignedTilesZoomOffset".to_string(),
                Value::from(UNALIGNED_TILES_ZOOM_OFFSET),
            );
        }

        if let Some(aligned) = &self.aligned_quad_tree {
            result.insert(
                "alignedTilesUrl".to_string(),
                Value::from(urls.tiles_url(aligned.id, self.is_public)),
            );
            for (kind, field) in [
                (ExportKind::Html, "htmlExportUrl"),
                (ExportKind::Kml, "kmlExportUrl"),
                (ExportKind::Geotiff, "geotiffExportUrl"),
            ] {
                if let Some(archive_name) = aligned.export_name(kind) {
                    result.insert(
                        field.to_string(),
                        Value::from(urls.export_url(self.key, kind, archive_name)),
                    );
                }
            }
        }

        result
    }

    /// Import client JSON. Absent keys leave the current values untouched;
    /// a mistyped field rejects the whole import.
    pub fn apply_json_dict(&mut self, dict: &Map<String, Value>) -> ShellResult<()> {
        let name = import_string(dict, "name")?;
        let description = import_string(dict, "description")?;
        let image_source_url = import_string(dict, "imageSourceUrl")?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(image_source_url) = image_source_url {
            self.image_source_url = image_source_url;
        }

        for &field in IMPORT_EXTRAS_FIELDS {
            if let Some(value) = dict.get(field) {
                self.extras.insert(field.to_string(), value.clone());
            }
        }

        Ok(())
    }

    /// Size class from `extras.imageSize`
    pub fn image_size_type(&self) -> ShellResult<ImageSizeType> {
        let width = self
            .extras
            .get("imageSize")
            .and_then(|size| size.get(0))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                ShellError::ValidationError(format!("overlay {} has no imageSize", self.key))
            })?;

        if width < SMALL_IMAGE_MAX_WIDTH {
            Ok(ImageSizeType::Small)
        } else {
            Ok(ImageSizeType::Large)
        }
    }
}

fn import_string(dict: &Map<String, Value>, field: &str) -> ShellResult<Option<String>> {
    match dict.get(field) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(ShellError::ValidationError(format!("{} must be a string", field))),
    }
}

fn insert_non_empty(result: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        result.insert(key.to_string(), Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_overlay() -> Overlay {
        let mut overlay = Overlay::new("Bay Area.jpg", true);
        overlay.key = 42;
        overlay.last_modified_time = Utc.with_ymd_and_hms(2013, 5, 17, 8, 3, 9).unwrap();
        overlay
    }

    #[test]
    fn test_json_dict_basic_fields() {
        let mut overlay = sample_overlay();
        overlay.extras.insert("centerLat".to_string(), json!(37.5));
        overlay.creator = "NASA".to_string();

        let dict = overlay.to_json_dict(&OverlayUrls::default());

        assert_eq!(dict["key"], json!(42));
        assert_eq!(dict["name"], json!("Bay Area.jpg"));
        assert_eq!(dict["creator"], json!("NASA"));
        assert_eq!(dict["centerLat"], json!(37.5));
        assert_eq!(dict["lastModifiedTime"], json!("2013-05-17T08:03:09Z"));
        assert_eq!(dict["lmt_datetime"], json!("2013-05-17  8:03"));
        assert_eq!(dict["url"], json!("/api/overlay/42"));
        assert!(!dict.contains_key("description"));
        assert!(!dict.contains_key("issMRF"));
        assert!(!dict.contains_key("unalignedTilesUrl"));
        assert!(!dict.contains_key("alignedTilesUrl"));
    }

    #[test]
    fn test_json_dict_tile_and_export_urls() {
        let mut overlay = sample_overlay();
        overlay.is_public = false;
        overlay.unaligned_quad_tree = Some(5);
        overlay.aligned_quad_tree = Some(AlignedQuadTree {
            id: 6,
            html_export_name: Some("mapfasten-Bay_Area-small-html_2013-05-17-080309-UTC.tar.gz".to_string()),
            kml_export_name: Some(String::new()),
            geotiff_export_name: None,
        });

        let dict = overlay.to_json_dict(&OverlayUrls::default());

        assert_eq!(dict["unalignedTilesUrl"], json!("/tiepoint/tile/5"));
        assert_eq!(dict["unalignedTilesZoomOffset"], json!(3));
        assert_eq!(dict["alignedTilesUrl"], json!("/tiepoint/tile/6"));
        assert_eq!(
            dict["htmlExportUrl"],
            json!("/tiepoint/overlay/42/export/html/mapfasten-Bay_Area-small-html_2013-05-17-080309-UTC.tar.gz")
        );
        assert!(!dict.contains_key("kmlExportUrl"));
        assert!(!dict.contains_key("geotiffExportUrl"));

        overlay.is_public = true;
        let dict = overlay.to_json_dict(&OverlayUrls::default());
        assert_eq!(dict["alignedTilesUrl"], json!("/tiepoint/public/tile/6"));
    }

    #[test]
    fn test_exported_fields_override_extras() {
        let mut overlay = sample_overlay();
        overlay.extras.insert("name".to_string(), json!("stale"));

        let dict = overlay.to_json_dict(&OverlayUrls::default());
        assert_eq!(dict["name"], json!("Bay Area.jpg"));
    }

    #[test]
    fn test_apply_json_dict() {
        let mut overlay = sample_overlay();
        overlay.description = "keep me".to_string();
        let dict = json!({
            "name": "Renamed",
            "imageSourceUrl": "http://example.org/a.jpg",
            "points": [[-122.1, 37.4, 10.0, 20.0]],
            "transform": {"type": "projective", "matrix": [[1, 0, 0], [0, 1, 0], [0, 0, 1]]},
            "centerLon": -122.1,
            "key": 999,
            "creator": "ignored"
        });

        overlay.apply_json_dict(dict.as_object().unwrap()).unwrap();

        assert_eq!(overlay.name, "Renamed");
        assert_eq!(overlay.description, "keep me");
        assert_eq!(overlay.image_source_url, "http://example.org/a.jpg");
        assert_eq!(overlay.extras["points"], json!([[-122.1, 37.4, 10.0, 20.0]]));
        assert_eq!(overlay.extras["transform"]["type"], json!("projective"));
        assert_eq!(overlay.extras["centerLon"], json!(-122.1));
        assert!(!overlay.extras.contains_key("centerLat"));
        assert_eq!(overlay.key, 42);
        assert_eq!(overlay.creator, "");
    }

    #[test]
    fn test_apply_json_dict_rejects_non_string_name() {
        let mut overlay = sample_overlay();
        let dict = json!({"name": 12});

        let result = overlay.apply_json_dict(dict.as_object().unwrap());
        assert!(matches!(result, Err(ShellError::ValidationError(_))));
        assert_eq!(overlay.name, "Bay Area.jpg");
    }

    #[test]
    fn test_image_size_type() {
        let mut overlay = sample_overlay();
        assert!(matches!(overlay.image_size_type(), Err(ShellError::ValidationError(_))));

        overlay.extras.insert("imageSize".to_string(), json!([1199, 800]));
        assert_eq!(overlay.image_size_type().unwrap(), ImageSizeType::Small);

        overlay.extras.insert("imageSize".to_string(), json!([1200, 800]));
        assert_eq!(overlay.image_size_type().unwrap(), ImageSizeType::Large);
    }
}
