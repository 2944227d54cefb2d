/// Case-insensitive substring match of `query` against `candidates`, keeping
/// their original order. An absent or empty query keeps every candidate.
pub fn filter_suggestions(candidates: &[String], query: Option<&str>) -> Vec<String> {
    let needle = match query {
        Some(query) if !query.is_empty() => query.to_lowercase(),
        _ => return candidates.to_vec(),
    };
    candidates
        .iter()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
