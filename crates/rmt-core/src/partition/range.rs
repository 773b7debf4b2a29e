//! Part range type and planning.

use std::collections::BTreeMap;

use crate::multipart::Part;

/// Upper bound on parts per multipart transfer accepted by object stores.
pub const MAX_PARTS: u64 = 10_000;

/// Byte range of one part: [start, end) (half-open), with its 1-based number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    pub number: u32,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl PartRange {
    /// Length of this part in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        if self.start >= self.end {
            "bytes=0-0".to_string()
        } else {
            format!("bytes={}-{}", self.start, self.end - 1)
        }
    }
}

/// Part size actually used for `total_size`: the requested size, grown just enough
/// that the plan never exceeds `MAX_PARTS` parts.
pub fn effective_part_size(total_size: u64, part_size: u64) -> u64 {
    let part_size = part_size.max(1);
    let parts = total_size.div_ceil(part_size);
    if parts <= MAX_PARTS {
        part_size
    } else {
        total_size.div_ceil(MAX_PARTS)
    }
}

/// Builds the part plan for an object of `total_size` bytes.
///
/// Parts are `part_size` bytes each (after the `MAX_PARTS` adjustment); the last one
/// may be shorter. An empty object is planned as a single empty part so the
/// transfer still has something to commit.
pub fn plan_parts(total_size: u64, part_size: u64) -> Vec<PartRange> {
    if total_size == 0 {
        return vec![PartRange {
            number: 1,
            start: 0,
            end: 0,
        }];
    }

    let size = effective_part_size(total_size, part_size);
    let count = total_size.div_ceil(size);
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    let mut number = 1u32;
    while offset < total_size {
        let end = (offset + size).min(total_size);
        out.push(PartRange {
            number,
            start: offset,
            end,
        });
        offset = end;
        number += 1;
    }
    out
}

/// Ranges from `plan` whose number has no recorded part yet, in plan order.
pub fn pending_ranges(plan: &[PartRange], completed: &BTreeMap<u32, Part>) -> Vec<PartRange> {
    plan.iter()
        .filter(|r| !completed.contains_key(&r.number))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn plan_parts_ten_megabytes_in_four_megabyte_parts() {
        let parts = plan_parts(10_000_000, 4_000_000);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], PartRange { number: 1, start: 0, end: 4_000_000 });
        assert_eq!(parts[1], PartRange { number: 2, start: 4_000_000, end: 8_000_000 });
        assert_eq!(parts[2], PartRange { number: 3, start: 8_000_000, end: 10_000_000 });
        assert_eq!(parts[2].len(), 2_000_000);
    }

    #[test]
    fn plan_parts_exact_multiple() {
        let parts = plan_parts(1000, 250);
        assert_eq!(parts.len(), 4);
        assert!(parts.iter().all(|p| p.len() == 250));
        assert_eq!(parts[3].end, 1000);
    }

    #[test]
    fn plan_parts_contiguous_and_numbered() {
        let parts = plan_parts(1001, 100);
        assert_eq!(parts.len(), 11);
        for (i, w) in parts.windows(2).enumerate() {
            assert_eq!(w[0].end, w[1].start);
            assert_eq!(w[0].number as usize, i + 1);
        }
        assert_eq!(parts.last().unwrap().len(), 1);
    }

    #[test]
    fn plan_parts_empty_object_is_one_empty_part() {
        let parts = plan_parts(0, 4096);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].number, 1);
        assert!(parts[0].is_empty());
    }

    #[test]
    fn part_size_grows_past_max_parts() {
        assert_eq!(effective_part_size(1000, 10), 10);
        let size = effective_part_size(MAX_PARTS * 10 + 1, 1);
        assert_eq!(size, 11);
        let parts = plan_parts(MAX_PARTS * 10 + 1, 1);
        assert!(parts.len() as u64 <= MAX_PARTS);
        assert_eq!(parts.last().unwrap().end, MAX_PARTS * 10 + 1);
    }

    #[test]
    fn pending_skips_recorded_numbers() {
        let plan = plan_parts(400, 100);
        let mut completed = BTreeMap::new();
        for n in [1u32, 2] {
            completed.insert(n, Part::new(n, format!("etag-{}", n), 100, Utc::now()));
        }
        let pending: Vec<u32> = pending_ranges(&plan, &completed)
            .iter()
            .map(|r| r.number)
            .collect();
        assert_eq!(pending, vec![3, 4]);
    }

    #[test]
    fn range_header_inclusive_end() {
        let r = PartRange { number: 1, start: 0, end: 99 };
        assert_eq!(r.range_header_value(), "bytes=0-98");
        let r = PartRange { number: 2, start: 42, end: 43 };
        assert_eq!(r.range_header_value(), "bytes=42-42");
    }
}
