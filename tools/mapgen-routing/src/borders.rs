//! Region border polygons
//!
//! Borders are read from osmosis `.poly` files:
//!
//! ```text
//! Belgium
//! 1
//!    2.5 49.5
//!    6.4 49.5
//!    ...
//! END
//! !1-hole
//!    ...
//! END
//! END
//! ```
//!
//! Rings whose name starts with `!` are holes of the preceding outer ring.

use geo::{Contains, Coord, LineString, Polygon};
use mapgen_common::{Error, Result};
use std::fs;
use std::path::Path;

use crate::geometry::PointD;

/// Closed regions of one country; a point is inside if any region contains it.
#[derive(Debug, Clone, Default)]
pub struct Borders {
    regions: Vec<Polygon<f64>>,
}

impl Borders {
    pub fn new(regions: Vec<Polygon<f64>>) -> Self {
        Self { regions }
    }

    /// Single outer ring without holes.
    pub fn from_ring(ring: &[PointD]) -> Self {
        Self::new(vec![Polygon::new(to_line_string(ring), Vec::new())])
    }

    pub fn load_poly<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse_poly(&text).map_err(|e| match e {
            Error::InvalidInput(msg) => {
                Error::invalid_input(format!("{}: {msg}", path.as_ref().display()))
            }
            other => other,
        })
    }

    pub fn parse_poly(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        // First line is the polygon name
        lines
            .next()
            .ok_or_else(|| Error::invalid_input("empty poly file"))?;

        let mut outers: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
        loop {
            let header = lines
                .next()
                .ok_or_else(|| Error::invalid_input("missing final END"))?;
            if header == "END" {
                break;
            }

            let mut ring = Vec::new();
            for line in lines.by_ref() {
                if line == "END" {
                    break;
                }
                ring.push(parse_coord(line)?);
            }
            if ring.len() < 3 {
                return Err(Error::invalid_input(format!(
                    "ring '{header}' has {} points, need at least 3",
                    ring.len()
                )));
            }

            let ring = to_line_string(&ring);
            if header.starts_with('!') {
                let (_, holes) = outers.last_mut().ok_or_else(|| {
                    Error::invalid_input(format!("hole '{header}' before any outer ring"))
                })?;
                holes.push(ring);
            } else {
                outers.push((ring, Vec::new()));
            }
        }

        Ok(Self::new(
            outers
                .into_iter()
                .map(|(outer, holes)| Polygon::new(outer, holes))
                .collect(),
        ))
    }

    pub fn contains(&self, point: PointD) -> bool {
        let p = geo::Point::new(point.x, point.y);
        self.regions.iter().any(|region| region.contains(&p))
    }

    pub fn regions(&self) -> &[Polygon<f64>] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn parse_coord(line: &str) -> Result<PointD> {
    let mut parts = line.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok(PointD::new(x, y)),
        _ => Err(Error::invalid_input(format!("bad coordinate line '{line}'"))),
    }
}

fn to_line_string(ring: &[PointD]) -> LineString<f64> {
    LineString::new(ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
}
