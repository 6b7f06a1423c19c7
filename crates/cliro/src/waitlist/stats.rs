use std::collections::HashMap;

/// How many entries each leaderboard keeps.
pub const TOP_ENTRIES: usize = 5;

/// Count occurrences and keep the `limit` most frequent values.
///
/// Ties keep the order in which values were first seen.
pub fn top_counts<I, S>(values: I, limit: usize) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut order: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for value in values {
        let value = value.as_ref();
        match index.get(value) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(value.to_string(), order.len());
                order.push((value.to_string(), 1));
            }
        }
    }

    // stable: equal counts stay in first-seen order
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.truncate(limit);
    order
}
