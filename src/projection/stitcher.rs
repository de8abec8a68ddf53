//! Panorama-stitcher metadata (Hugin `.pto` project files).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ProjectionError;

/// The rectangle of the stitched panorama that was rendered to the map.
///
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}

/// Output parameters of a stitched panorama.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StitcherMetadata {
    /// Width of the full stitched panorama, in pixels.
    pub width: i64,
    /// Height of the full stitched panorama, in pixels.
    pub height: i64,
    /// Horizontal field of view, in degrees.
    pub hfov: f64,
    pub crop: CropRect,
}

fn parse_field<T: std::str::FromStr>(token: &str, field: &'static str) -> Result<T, ProjectionError> {
    token.parse().map_err(|_| ProjectionError::InvalidPtoField {
        field,
        value: token.to_string(),
    })
}

impl StitcherMetadata {
    /// Parses the panorama (`p `) line of a `.pto` project.
    ///
    /// Recognizes `w<width>`, `h<height>`, `v<hfov>` and
    /// `S<left>,<right>,<top>,<bottom>`; the crop defaults to the full image.
    pub fn parse_pto(text: &str) -> Result<Self, ProjectionError> {
        let line = text
            .lines()
            .find(|l| l.starts_with("p "))
            .ok_or(ProjectionError::NoProjectionLine)?;

        let mut width = None;
        let mut height = None;
        let mut hfov = None;
        let mut crop = None;

        for token in line.split(' ').filter(|t| !t.is_empty()) {
            if let Some(v) = token.strip_prefix('w') {
                width = Some(parse_field::<i64>(v, "w")?);
            } else if let Some(v) = token.strip_prefix('h') {
                height = Some(parse_field::<i64>(v, "h")?);
            } else if let Some(v) = token.strip_prefix('v') {
                hfov = Some(parse_field::<f64>(v, "v")?);
            } else if let Some(v) = token.strip_prefix('S') {
                let parts = v
                    .split(',')
                    .map(|p| parse_field::<i64>(p, "S"))
                    .collect::<Result<Vec<_>, _>>()?;
                if parts.len() != 4 {
                    return Err(ProjectionError::InvalidPtoField {
                        field: "S",
                        value: v.to_string(),
                    });
                }
                crop = Some(CropRect {
                    left: parts[0],
                    right: parts[1],
                    top: parts[2],
                    bottom: parts[3],
                });
            }
        }

        let width = width.ok_or(ProjectionError::MissingPtoField("w"))?;
        let height = height.ok_or(ProjectionError::MissingPtoField("h"))?;
        let hfov = hfov.ok_or(ProjectionError::MissingPtoField("v"))?;
        let crop = crop.unwrap_or(CropRect {
            left: 0,
            right: width,
            top: 0,
            bottom: height,
        });

        Ok(Self {
            width,
            height,
            hfov,
            crop,
        })
    }

    /// Reads and parses a `.pto` file.
    pub fn from_pto_file(path: &Path) -> Result<Self, ProjectionError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_pto(&text)
    }

    /// Row of the horizon within the cropped map.
    pub fn horizon(&self) -> i64 {
        self.height / 2 - self.crop.top
    }

    /// True when the panorama covers the full circle.
    pub fn wraps(&self) -> bool {
        self.hfov >= 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PTO: &str = "# hugin project file\n\
        i w4000 h3000 f0 v50\n\
        p f1 w8477 h3453 v360  E13 R0 S0,8477,267,2941 n\"TIFF_m c:LZW r:CROP\"\n\
        m i0\n";

    #[test]
    fn test_parse_projection_line() {
        let meta = StitcherMetadata::parse_pto(PTO).unwrap();
        assert_eq!(meta.width, 8477);
        assert_eq!(meta.height, 3453);
        assert_eq!(meta.hfov, 360.0);
        assert_eq!(
            meta.crop,
            CropRect {
                left: 0,
                right: 8477,
                top: 267,
                bottom: 2941
            }
        );
        assert_eq!(meta.horizon(), 3453 / 2 - 267);
        assert!(meta.wraps());
    }

    #[test]
    fn test_crop_defaults_to_full_image() {
        let meta = StitcherMetadata::parse_pto("p f2 w1000 h500 v120\n").unwrap();
        assert_eq!(meta.crop.right, 1000);
        assert_eq!(meta.crop.bottom, 500);
        assert_eq!(meta.horizon(), 250);
        assert!(!meta.wraps());
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            StitcherMetadata::parse_pto("p f1 w100 v360\n"),
            Err(ProjectionError::MissingPtoField("h"))
        ));
        assert!(matches!(
            StitcherMetadata::parse_pto("i w100 h100\n"),
            Err(ProjectionError::NoProjectionLine)
        ));
    }

    #[test]
    fn test_bad_number() {
        assert!(matches!(
            StitcherMetadata::parse_pto("p w1x0 h10 v90\n"),
            Err(ProjectionError::InvalidPtoField { field: "w", .. })
        ));
    }
}
