//! Read downloaded or local OSM/GPX files and report what they contain.
use roxmltree::{Document, Node};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::bounds::Bounds;
use crate::error::SummaryError;

#[derive(Debug, PartialEq)]
pub enum Contents {
    Osm {
        nodes: usize,
        ways: usize,
        relations: usize,
    },
    Gpx {
        tracks: usize,
        track_points: usize,
        waypoints: usize,
    },
}

#[derive(Debug, PartialEq)]
pub struct Summary {
    pub path: PathBuf,
    pub contents: Contents,
    pub bounds: Option<Bounds>,
}

impl Summary {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, SummaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SummaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (contents, bounds) = Self::parse(&content)?;
        Ok(Self {
            path: path.to_path_buf(),
            contents,
            bounds,
        })
    }

    pub fn parse(content: &str) -> Result<(Contents, Option<Bounds>), SummaryError> {
        let doc = Document::parse(content)?;
        let root = doc.root_element();
        match root.tag_name().name() {
            "osm" | "osmChange" => {
                let contents = Contents::Osm {
                    nodes: count(root, "node"),
                    ways: count(root, "way"),
                    relations: count(root, "relation"),
                };
                let bounds = child(root, "bounds").and_then(|b| {
                    extract_bounds(b, ["minlat", "minlon", "maxlat", "maxlon"])
                });
                Ok((contents, bounds))
            }
            "gpx" => {
                let contents = Contents::Gpx {
                    tracks: count(root, "trk"),
                    track_points: count(root, "trkpt"),
                    waypoints: count(root, "wpt"),
                };
                let bounds = child(root, "metadata")
                    .and_then(|m| child(m, "bounds"))
                    .and_then(|b| extract_bounds(b, ["minlat", "minlon", "maxlat", "maxlon"]));
                Ok((contents, bounds))
            }
            other => Err(SummaryError::UnsupportedRoot(other.to_string())),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.contents {
            Contents::Osm {
                nodes,
                ways,
                relations,
            } => write!(
                f,
                "{}: {nodes} nodes, {ways} ways, {relations} relations",
                self.path.display()
            )?,
            Contents::Gpx {
                tracks,
                track_points,
                waypoints,
            } => write!(
                f,
                "{}: {tracks} tracks, {track_points} track points, {waypoints} waypoints",
                self.path.display()
            )?,
        }
        if let Some(bounds) = self.bounds {
            write!(f, " in {bounds}")?;
        }
        Ok(())
    }
}

const COMPRESSED_EXTENSIONS: [&str; 3] = ["gz", "bz2", "xz"];

/// Compressed downloads are saved as is; `Summary::read` only handles plain XML.
pub fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| COMPRESSED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Load every collected file. Files that can't be read are reported and skipped.
pub fn open_files(files: &[PathBuf]) -> Vec<Summary> {
    files
        .iter()
        .filter_map(|path| match Summary::read(path) {
            Ok(summary) => {
                info!("Opened {}", summary);
                Some(summary)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unable to open file");
                None
            }
        })
        .collect()
}

fn count(root: Node, tag: &str) -> usize {
    root.descendants().filter(|n| n.has_tag_name(tag)).count()
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn extract_bounds(node: Node, keys: [&str; 4]) -> Option<Bounds> {
    let mut values = [0.0; 4];
    for (value, key) in values.iter_mut().zip(keys) {
        *value = node.attribute(key)?.parse().ok()?;
    }
    Some(Bounds::from_corners(values[0], values[1], values[2], values[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <bounds minlat="52.0" minlon="13.0" maxlat="52.1" maxlon="13.1"/>
  <node id="1" lat="52.01" lon="13.01"/>
  <node id="2" lat="52.02" lon="13.02"/>
  <way id="3"><nd ref="1"/><nd ref="2"/></way>
</osm>"#;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.0" creator="test" xmlns="http://www.topografix.com/GPX/1/0">
  <wpt lat="1" lon="2"/>
  <trk><trkseg>
    <trkpt lat="52.0" lon="13.0"/>
    <trkpt lat="52.1" lon="13.1"/>
    <trkpt lat="52.2" lon="13.2"/>
  </trkseg></trk>
</gpx>"#;

    #[test]
    fn test_parse_osm() {
        let (contents, bounds) = Summary::parse(OSM).unwrap();
        assert_eq!(
            contents,
            Contents::Osm {
                nodes: 2,
                ways: 1,
                relations: 0
            }
        );
        assert_eq!(bounds, Some(Bounds::from_corners(52.0, 13.0, 52.1, 13.1)));
    }

    #[test]
    fn test_parse_gpx() {
        let (contents, bounds) = Summary::parse(GPX).unwrap();
        assert_eq!(
            contents,
            Contents::Gpx {
                tracks: 1,
                track_points: 3,
                waypoints: 1
            }
        );
        assert_eq!(bounds, None);
    }

    #[test]
    fn test_unsupported_root() {
        let err = Summary::parse("<html><body/></html>").unwrap_err();
        assert!(matches!(err, SummaryError::UnsupportedRoot(root) if root == "html"));
        assert!(matches!(
            Summary::parse("not xml").unwrap_err(),
            SummaryError::Xml(_)
        ));
    }

    #[test]
    fn test_is_compressed() {
        assert!(is_compressed(Path::new("/tmp/berlin.osm.gz")));
        assert!(is_compressed(Path::new("extract.OSM.BZ2")));
        assert!(is_compressed(Path::new("track.gpx.gz")));
        assert!(!is_compressed(Path::new("map_13_52_14_53.osm")));
        assert!(!is_compressed(Path::new("trackpoints.gpx")));
        assert!(!is_compressed(Path::new("download")));
    }

    #[test]
    fn test_open_files_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let osm = dir.path().join("a.osm");
        fs::write(&osm, OSM).unwrap();
        let files = vec![osm.clone(), dir.path().join("missing.osm"), osm.clone()];

        let summaries = open_files(&files);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].path, osm);
        assert_eq!(
            summaries[0].to_string(),
            format!("{}: 2 nodes, 1 ways, 0 relations in 52,13,52.1,13.1", osm.display())
        );
    }
}
