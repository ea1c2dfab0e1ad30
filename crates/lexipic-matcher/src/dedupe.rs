use std::collections::HashSet;

use lexipic_types::PictogramResult;

/// First occurrence of each pictogram id, in input order, at most `limit` items.
pub fn dedupe_pictograms<I>(results: I, limit: usize) -> Vec<PictogramResult>
where
    I: IntoIterator<Item = PictogramResult>,
{
    let mut seen: HashSet<u64> = HashSet::new();
    let mut unique = Vec::new();
    if limit == 0 {
        return unique;
    }

    for pictogram in results {
        if !seen.insert(pictogram.id) {
            continue;
        }
        unique.push(pictogram);
        if unique.len() == limit {
            break;
        }
    }

    unique
}
