use std::fmt::Display;
use std::str::FromStr;

use crate::overlays::model::ImageSizeType;
use crate::shell::error::ShellError;

const PHOTO_INFO_URL: &str = "http://eol.jsc.nasa.gov/GeoCam/PhotoInfo.pl";
const DATABASE_IMAGES_URL: &str = "http://eol.jsc.nasa.gov/DatabaseImages";

/// ISS photo reference in mission-roll-frame form, e.g. `ISS039-E-12345`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssImageRef {
    pub mission: String,
    pub roll: String,
    pub frame: String,
}

impl IssImageRef {
    /// Rolls `E` and `ESC` live in the electronic still camera archive
    fn is_esc_roll(&self) -> bool {
        self.roll == "E" || self.roll == "ESC"
    }

    pub fn info_url(&self) -> String {
        format!("{}?photo={}", PHOTO_INFO_URL, self)
    }

    pub fn image_url(&self, size: ImageSizeType) -> String {
        let tree = match (size, self.is_esc_roll()) {
            (ImageSizeType::Small, true) => "ESC/small",
            (ImageSizeType::Small, false) => "ISD/lowres",
            (ImageSizeType::Large, true) => "ESC/large",
            (ImageSizeType::Large, false) => "ISD/highres",
        };
        format!("{}/{}/{}/{}.jpg", DATABASE_IMAGES_URL, tree, self.mission, self)
    }
}

impl Display for IssImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.mission, self.roll, self.frame)
    }
}

impl FromStr for IssImageRef {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        match parts.as_slice() {
            [mission, roll, frame] if !mission.is_empty() && !roll.is_empty() && !frame.is_empty() => {
                Ok(Self {
                    mission: mission.to_string(),
                    roll: roll.to_string(),
                    frame: frame.to_string(),
                })
            }
            _ => Err(ShellError::ValidationError(format!(
                "ISS id {:?} is not in [Mission ID]-[Roll]-[Frame number] form",
                s
            ))),
        }
    }
}
