//! Conversion of a `Collection` into (elapsed seconds, kilobytes) points.

use crate::collection::{Collection, Sample};

/// A single chart point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Metrics selected for extraction and plotting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    pub rss: bool,
    pub vsz: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            rss: true,
            vsz: false,
        }
    }
}

/// Resident size series, in kilobytes.
pub fn rss_points(collection: &Collection) -> Vec<Point> {
    points_by(collection, Sample::rss)
}

/// Virtual size series, in kilobytes.
pub fn vsz_points(collection: &Collection) -> Vec<Point> {
    points_by(collection, Sample::vms)
}

fn points_by(collection: &Collection, bytes: impl Fn(&Sample) -> u64) -> Vec<Point> {
    collection
        .samples()
        .iter()
        .map(|s| Point {
            x: s.elapsed().as_secs_f64(),
            y: bytes(s) as f64 / 1024.0,
        })
        .collect()
}
