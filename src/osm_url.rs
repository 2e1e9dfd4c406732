//! Turn openstreetmap.org map links into bounds.
//!
//! Supported forms, tried in this order:
//!
//! * short links: `https://osm.org/go/0EEQjE--`
//! * the map fragment: `https://www.openstreetmap.org/#map=12/52.5/13.4`
//! * query parameters: `bbox=minlon,minlat,maxlon,maxlat`, then
//!   `minlat`/`minlon`/`maxlat`/`maxlon`, then `lat`/`lon` (or `mlat`/`mlon`)
//!   with an optional `zoom`
use std::collections::HashMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::bounds::{Bounds, LatLon};
use crate::dispatch::BoundsParser;
use crate::error::OsmUrlError;

const SHORTLINK_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_~";
const SHORTLINK_HOSTS: [&str; 4] = [
    "osm.org",
    "www.osm.org",
    "openstreetmap.org",
    "www.openstreetmap.org",
];
const DEFAULT_ZOOM: i32 = 18;
const TILE_SIZE: f64 = 256.0;
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Size in pixels of the map view a centre + zoom link is assumed to describe.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OsmUrlParser {
    viewport: Viewport,
}

impl OsmUrlParser {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn parse_detailed(&self, input: &str) -> Result<Bounds, OsmUrlError> {
        let url = Url::parse(input)?;

        if let Some(code) = short_link_code(&url) {
            return decode_short_link(code, &self.viewport);
        }

        if let Some(map) = url.fragment().and_then(map_fragment) {
            return parse_map_fragment(map, &self.viewport);
        }

        let args: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(bbox) = args.get("bbox") {
            let values = bbox
                .split(',')
                .map(|v| number("bbox", v))
                .collect::<Result<Vec<f64>, _>>()?;
            if values.len() != 4 {
                return Err(invalid("bbox", bbox));
            }
            return Ok(Bounds::from_corners(values[1], values[0], values[3], values[2]));
        }

        if args.contains_key("minlat") {
            return Ok(Bounds::from_corners(
                required(&args, "minlat")?,
                required(&args, "minlon")?,
                required(&args, "maxlat")?,
                required(&args, "maxlon")?,
            ));
        }

        let lat = coordinate(&args, "lat")?;
        let lon = coordinate(&args, "lon")?;
        let zoom = match args.get("zoom") {
            Some(z) => z.parse::<i32>().map_err(|_| invalid("zoom", z))?,
            None => DEFAULT_ZOOM,
        };
        Ok(position_to_bounds(lat, lon, zoom, &self.viewport))
    }
}

impl BoundsParser for OsmUrlParser {
    fn parse_url_to_bounds(&self, url: &str) -> Option<Bounds> {
        match self.parse_detailed(url) {
            Ok(bounds) => Some(bounds),
            Err(e) => {
                debug!(url, error = %e, "URL does not describe an area");
                None
            }
        }
    }
}

/// The area a `viewport` sized web-mercator map shows around `lat`/`lon` at `zoom`.
pub fn position_to_bounds(lat: f64, lon: f64, zoom: i32, viewport: &Viewport) -> Bounds {
    // Pixels per metre at the equator.
    let scale = 2f64.powi(zoom) * TILE_SIZE / (2.0 * PI * EARTH_RADIUS);
    let delta_x = f64::from(viewport.width) / 2.0 / scale;
    let delta_y = f64::from(viewport.height) / 2.0 / scale;

    let (x, y) = to_mercator(lat, lon);
    Bounds::new(
        from_mercator(x - delta_x, y - delta_y),
        from_mercator(x + delta_x, y + delta_y),
    )
}

fn to_mercator(lat: f64, lon: f64) -> (f64, f64) {
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn from_mercator(x: f64, y: f64) -> LatLon {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    LatLon::new(lat, lon)
}

fn short_link_code(url: &Url) -> Option<&str> {
    let host = url.host_str()?;
    if !SHORTLINK_HOSTS.contains(&host) {
        return None;
    }
    url.path().strip_prefix("/go/")
}

/// Short links interleave x and y bits, three pairs per symbol, on a 2^32
/// grid. Each trailing `-` refines the zoom by one level.
fn decode_short_link(code: &str, viewport: &Viewport) -> Result<Bounds, OsmUrlError> {
    let mut x: u64 = 0;
    let mut y: u64 = 0;
    let mut zoom: i32 = 0;
    let mut zoom_offset: i32 = 0;

    for ch in code.chars() {
        match SHORTLINK_CHARS.find(ch) {
            Some(index) => {
                let mut val = index as u32;
                for _ in 0..3 {
                    x <<= 1;
                    if val & 32 != 0 {
                        x |= 1;
                    }
                    val <<= 1;
                    y <<= 1;
                    if val & 32 != 0 {
                        y |= 1;
                    }
                    val <<= 1;
                }
                zoom += 3;
            }
            None => zoom_offset -= 1,
        }
    }

    if zoom == 0 {
        return Err(OsmUrlError::EmptyShortLink);
    }
    if zoom > 32 {
        return Err(invalid("shortlink", code));
    }

    x <<= 32 - zoom;
    y <<= 32 - zoom;
    let grid = 4_294_967_296.0;
    let lat = y as f64 * 180.0 / grid - 90.0;
    let lon = x as f64 * 360.0 / grid - 180.0;
    let zoom = zoom - 8 - (zoom_offset % 3) - 2;

    Ok(position_to_bounds(lat, lon, zoom, viewport))
}

fn map_fragment(fragment: &str) -> Option<&str> {
    fragment.split('&').find_map(|part| part.strip_prefix("map="))
}

fn parse_map_fragment(map: &str, viewport: &Viewport) -> Result<Bounds, OsmUrlError> {
    let parts: Vec<&str> = map.split('/').collect();
    if parts.len() < 3 {
        return Err(invalid("map", map));
    }
    let zoom = parts[0].parse::<i32>().map_err(|_| invalid("map", map))?;
    let lat = number("map", parts[1])?;
    let lon = number("map", parts[2])?;
    Ok(position_to_bounds(lat, lon, zoom, viewport))
}

fn number(key: &str, value: &str) -> Result<f64, OsmUrlError> {
    value.trim().parse::<f64>().map_err(|_| invalid(key, value))
}

fn required(args: &HashMap<String, String>, key: &str) -> Result<f64, OsmUrlError> {
    let value = args.get(key).ok_or(OsmUrlError::NoPosition)?;
    number(key, value)
}

/// `lat` falls back to `mlat` (the marker position), same for `lon`.
fn coordinate(args: &HashMap<String, String>, key: &str) -> Result<f64, OsmUrlError> {
    match args.get(key) {
        Some(value) => number(key, value),
        None => required(args, &format!("m{key}")),
    }
}

fn invalid(key: &str, value: &str) -> OsmUrlError {
    OsmUrlError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
