//! Interval and screen-area helpers for text detections.

use montage_models::{BBox, Detection, FrameSize};

/// Minimum overlap for a detection to belong to a clip window.
pub const MIN_OVERLAP_MS: i64 = 100;

const IOU_EPSILON: f64 = 1e-8;

/// Detections overlapping `[start_ms, end_ms]` by more than [`MIN_OVERLAP_MS`],
/// with their windows clamped to it.
pub fn clip_to_window(detections: &[Detection], start_ms: i64, end_ms: i64) -> Vec<Detection> {
    detections
        .iter()
        .filter_map(|det| {
            let start = det.start_ms.max(start_ms);
            let end = det.end_ms.min(end_ms);
            (end - start > MIN_OVERLAP_MS).then(|| Detection {
                start_ms: start,
                end_ms: end,
                ..det.clone()
            })
        })
        .collect()
}

/// Total length covered by the union of detection windows.
pub fn union_length_ms(detections: &[Detection]) -> i64 {
    let mut windows: Vec<(i64, i64)> = detections.iter().map(|d| (d.start_ms, d.end_ms)).collect();
    windows.sort_unstable();

    let mut total = 0;
    let mut current: Option<(i64, i64)> = None;
    for (start, end) in windows {
        current = match current {
            Some((cs, ce)) if start <= ce => Some((cs, ce.max(end))),
            Some((cs, ce)) => {
                total += ce - cs;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((cs, ce)) = current {
        total += ce - cs;
    }
    total
}

/// Truncate a pixel coordinate and clamp it into `[0, limit]`.
fn pixel(value: f64, limit: u32) -> usize {
    (value.trunc().max(0.0) as usize).min(limit as usize)
}

/// Fraction of the frame covered by the union of `boxes`.
pub fn area_occupancy(boxes: &[BBox], frame: FrameSize) -> f64 {
    let (width, height) = (frame.width as usize, frame.height as usize);
    let mut grid = vec![false; width * height];
    for bbox in boxes {
        let (x1, x2) = (pixel(bbox[0], frame.width), pixel(bbox[2], frame.width));
        let (y1, y2) = (pixel(bbox[1], frame.height), pixel(bbox[3], frame.height));
        if x1 >= x2 {
            continue;
        }
        for y in y1..y2 {
            let row = y * width;
            grid[row + x1..row + x2].iter_mut().for_each(|cell| *cell = true);
        }
    }
    let occupied = grid.iter().filter(|cell| **cell).count();
    occupied as f64 / (frame.area() as f64 + IOU_EPSILON)
}

/// Fraction of frame rows covered by the vertical extents of `boxes`.
pub fn row_occupancy(boxes: &[BBox], height: u32) -> f64 {
    let mut rows = vec![false; height as usize];
    for bbox in boxes {
        let (y1, y2) = (pixel(bbox[1], height), pixel(bbox[3], height));
        if y1 < y2 {
            rows[y1..y2].iter_mut().for_each(|row| *row = true);
        }
    }
    let covered = rows.iter().filter(|row| **row).count();
    covered as f64 / (height as f64 + IOU_EPSILON)
}

/// Overlap of `[lo, hi]` with `band`, relative to the band length.
///
/// The overlap is signed, so disjoint ranges yield a negative value.
pub fn band_iou(lo: f64, hi: f64, band: [f64; 2]) -> f64 {
    let inter = band[1].min(hi) - band[0].max(lo);
    inter / ((band[1] - band[0]).abs() + IOU_EPSILON)
}
