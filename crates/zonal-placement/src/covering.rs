//! Precedence-ordered overlap merge of key ranges.

/// A half-open key range `[start, end)` carrying a subzone position.
///
/// A `None` payload still claims its range: it shadows lower-precedence
/// coverings and leaves the keys untagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Covering {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
    pub payload: Option<usize>,
}

impl Covering {
    pub fn new(start: Vec<u8>, end: Vec<u8>, payload: Option<usize>) -> Self {
        Self {
            start,
            end,
            payload,
        }
    }

    fn contains_range(&self, start: &[u8], end: &[u8]) -> bool {
        self.start.as_slice() <= start && end <= self.end.as_slice()
    }
}

/// Merge coverings listed highest precedence first into disjoint ranges.
///
/// Every key covered by at least one input ends up in exactly one output
/// range, carrying the payload of the first input that covers it. Output is
/// sorted by start key, and adjacent ranges with the same payload are
/// joined. Empty inputs (`start >= end`) are ignored.
pub fn overlap_merge(coverings: &[Covering]) -> Vec<Covering> {
    let live: Vec<&Covering> = coverings.iter().filter(|c| c.start < c.end).collect();

    let mut bounds: Vec<&[u8]> = live
        .iter()
        .flat_map(|c| [c.start.as_slice(), c.end.as_slice()])
        .collect();
    bounds.sort();
    bounds.dedup();

    let mut merged: Vec<Covering> = Vec::new();
    for pair in bounds.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        // Bounds include every endpoint, so each piece is either inside a
        // covering or disjoint from it.
        let Some(winner) = live.iter().find(|c| c.contains_range(start, end)) else {
            continue;
        };
        match merged.last_mut() {
            Some(last) if last.payload == winner.payload && last.end.as_slice() == start => {
                last.end = end.to_vec();
            }
            _ => merged.push(Covering::new(start.to_vec(), end.to_vec(), winner.payload)),
        }
    }
    merged
}
