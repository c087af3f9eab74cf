// Domain rules - Keep-range planning

use crate::domain::model::*;

/// Derives the ranges to keep from a set of ranges to remove
pub struct KeepRangePlanner;

impl KeepRangePlanner {
    /// Compute the keep set for `cuts` over media of length `duration`.
    ///
    /// Cuts may arrive in any order and may overlap, nest or extend past the
    /// end of the media. The result is disjoint, in time order, and covers
    /// exactly the parts of `[0, duration)` that no cut touches.
    pub fn plan(cuts: &[TimeRange], duration: f64) -> Vec<TimeRange> {
        // Zero-length cuts remove nothing and must not split a keep range
        let mut sorted: Vec<&TimeRange> = cuts.iter().filter(|c| !c.is_empty()).collect();
        // Stable: equal starts keep insertion order
        sorted.sort_by(|a, b| a.start().total_cmp(&b.start()));

        let mut keep = Vec::new();
        let mut cursor = 0.0_f64;

        for cut in sorted {
            if cursor < cut.start() {
                let end = cut.start().min(duration);
                if cursor < end {
                    keep.push(TimeRange::new(RangeId::Keep(keep.len()), cursor, end));
                }
            }
            cursor = cursor.max(cut.end());
        }

        if cursor < duration {
            keep.push(TimeRange::new(RangeId::Keep(keep.len()), cursor, duration));
        }

        keep
    }

    /// Sort and merge cuts into their union, clipped to `[0, duration]`
    pub fn merged_cuts(cuts: &[TimeRange], duration: f64) -> Vec<(f64, f64)> {
        let mut sorted: Vec<&TimeRange> = cuts.iter().filter(|c| !c.is_empty()).collect();
        sorted.sort_by(|a, b| a.start().total_cmp(&b.start()));

        let mut merged: Vec<(f64, f64)> = Vec::new();
        for cut in sorted {
            let start = cut.start().min(duration);
            let end = cut.end().min(duration);
            if start >= end {
                continue;
            }
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    /// Total seconds covered by a keep set
    pub fn kept_duration(keep: &[TimeRange]) -> f64 {
        keep.iter().map(TimeRange::duration).sum()
    }
}
