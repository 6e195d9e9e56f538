//! CRS handles.

use crate::error::{ProjectionError, Result};
use proj4rs::proj::Proj;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// WGS84 geographic, longitude/latitude in degrees.
pub const WGS84_EPSG: u32 = 4326;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Broad class of a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsKind {
    /// Angular coordinates (degrees).
    Geographic,
    /// Linear coordinates on a map projection.
    Projected,
    /// Neither, e.g. geocentric.
    Other,
}

impl CrsKind {
    fn from_definition(definition: &str) -> Self {
        let proj = definition
            .split_whitespace()
            .find_map(|token| token.strip_prefix("+proj="));

        match proj {
            Some("longlat" | "latlong" | "lonlat" | "latlon") => CrsKind::Geographic,
            Some("geocent") | None => CrsKind::Other,
            Some(_) => CrsKind::Projected,
        }
    }
}

/// A coordinate reference system.
///
/// Holds the PROJ definition string and, when known, the EPSG code it was
/// built from. Two CRSs are equal when their definitions are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crs {
    code: Option<u32>,
    definition: String,
    kind: CrsKind,
}

impl Crs {
    /// Build a CRS from an EPSG authority code.
    pub fn from_epsg(code: u32) -> Result<Self> {
        let def = u16::try_from(code)
            .ok()
            .and_then(crs_definitions::from_code)
            .ok_or(ProjectionError::UnknownCode(code))?;

        Ok(Self {
            code: Some(code),
            definition: def.proj4.to_string(),
            kind: CrsKind::from_definition(def.proj4),
        })
    }

    /// Build a CRS from a PROJ definition string.
    pub fn from_proj4(definition: &str) -> Result<Self> {
        let definition = definition.trim();
        Proj::from_proj_string(definition)
            .map_err(|e| ProjectionError::invalid_definition(definition, format!("{:?}", e)))?;

        Ok(Self {
            code: None,
            definition: definition.to_string(),
            kind: CrsKind::from_definition(definition),
        })
    }

    /// Parse `EPSG:<code>` (case-insensitive) or a PROJ definition string.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some((authority, code)) = trimmed.split_once(':') {
            if authority.eq_ignore_ascii_case("epsg") {
                let code = code.trim().parse::<u32>().map_err(|_| {
                    ProjectionError::invalid_definition(trimmed, "EPSG code is not a number")
                })?;
                return Self::from_epsg(code);
            }
        }
        trace!(definition = trimmed, "parsing CRS as PROJ definition");
        Self::from_proj4(trimmed)
    }

    /// WGS84 geographic (EPSG:4326).
    pub fn wgs84() -> Self {
        Self {
            code: Some(WGS84_EPSG),
            definition: WGS84_PROJ4.to_string(),
            kind: CrsKind::Geographic,
        }
    }

    pub fn code(&self) -> Option<u32> {
        self.code
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn kind(&self) -> CrsKind {
        self.kind
    }

    pub fn is_geographic(&self) -> bool {
        self.kind == CrsKind::Geographic
    }

    pub fn is_projected(&self) -> bool {
        self.kind == CrsKind::Projected
    }

    /// Transform a point from this CRS into `dst`.
    ///
    /// Identical definitions short-circuit to the identity.
    pub fn transform_point(&self, dst: &Crs, x: f64, y: f64) -> Result<(f64, f64)> {
        if self == dst {
            return Ok((x, y));
        }

        let src_proj = self.proj()?;
        let dst_proj = dst.proj()?;

        // proj4rs works in radians for geographic coordinates
        let (x_in, y_in) = if self.is_geographic() {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (x_in, y_in, 0.0);
        proj4rs::transform::transform(&src_proj, &dst_proj, &mut point).map_err(|e| {
            ProjectionError::TransformFailed {
                from: self.to_string(),
                to: dst.to_string(),
                message: format!("{:?}", e),
            }
        })?;

        let (out_x, out_y) = if dst.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::TransformFailed {
                from: self.to_string(),
                to: dst.to_string(),
                message: format!("({}, {}) has no finite image", x, y),
            });
        }

        Ok((out_x, out_y))
    }

    fn proj(&self) -> Result<Proj> {
        Proj::from_proj_string(&self.definition)
            .map_err(|e| ProjectionError::invalid_definition(&self.definition, format!("{:?}", e)))
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "EPSG:{}", code),
            None => write!(f, "{}", self.definition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(
            CrsKind::from_definition("+proj=longlat +datum=WGS84 +no_defs"),
            CrsKind::Geographic
        );
        assert_eq!(
            CrsKind::from_definition("+proj=utm +zone=55 +south +datum=WGS84 +units=m +no_defs"),
            CrsKind::Projected
        );
        assert_eq!(
            CrsKind::from_definition("+proj=geocent +datum=WGS84 +units=m +no_defs"),
            CrsKind::Other
        );
        assert_eq!(CrsKind::from_definition("+datum=WGS84"), CrsKind::Other);
    }

    #[test]
    fn test_wgs84() {
        let crs = Crs::wgs84();
        assert!(crs.is_geographic());
        assert!(!crs.is_projected());
        assert_eq!(crs.code(), Some(4326));
        assert_eq!(crs.to_string(), "EPSG:4326");
    }

    #[test]
    fn test_from_epsg_utm() {
        let crs = Crs::from_epsg(32755).unwrap();
        assert!(crs.is_projected());
        assert_eq!(crs.code(), Some(32755));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(
            Crs::from_epsg(999_999).unwrap_err(),
            ProjectionError::UnknownCode(999_999)
        );
    }

    #[test]
    fn test_parse_forms() {
        assert!(Crs::parse("epsg:4326").unwrap().is_geographic());
        assert!(Crs::parse(" EPSG:3857 ").unwrap().is_projected());
        assert!(Crs::parse("EPSG:abc").is_err());
        assert!(Crs::parse("+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs")
            .unwrap()
            .is_projected());
    }

    #[test]
    fn test_identity_transform() {
        let crs = Crs::wgs84();
        assert_eq!(crs.transform_point(&crs, 145.1, -37.2).unwrap(), (145.1, -37.2));
    }
}
