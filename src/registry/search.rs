use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::registry::PluginSummary;

/// Keeps plugins whose name or description contains `query` (ignoring case),
/// best fuzzy name match first. Registry order breaks ties.
pub fn filter(entries: Vec<PluginSummary>, query: &str, limit: usize) -> Vec<PluginSummary> {
    let needle = query.to_lowercase();
    let matcher = SkimMatcherV2::default();

    let mut scored: Vec<(i64, PluginSummary)> = entries
        .into_iter()
        .filter(|entry| {
            entry.name.to_lowercase().contains(&needle)
                || entry.description.to_lowercase().contains(&needle)
        })
        .map(|entry| {
            let score = matcher.fuzzy_match(&entry.name, &needle).unwrap_or(0);
            (score, entry)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, entry)| entry)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, description: &str) -> PluginSummary {
        PluginSummary {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    fn names(entries: &[PluginSummary]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn test_matches_name_or_description_ignoring_case() {
        let entries = vec![
            summary("hyperterm-themes", "Colour schemes"),
            summary("hyperterm-tabs", "Better TABS"),
            summary("hyperterm-blink", "Blinking cursor with SCHEME support"),
        ];
        let hits = filter(entries, "Scheme", 10);
        assert_eq!(names(&hits), vec!["hyperterm-themes", "hyperterm-blink"]);
    }

    #[test]
    fn test_name_matches_rank_above_description_matches() {
        let entries = vec![
            summary("hyperterm-power", "adds a git status line"),
            summary("hyperterm-git", "branch in the tab title"),
        ];
        let hits = filter(entries, "git", 10);
        assert_eq!(names(&hits), vec!["hyperterm-git", "hyperterm-power"]);
    }

    #[test]
    fn test_no_match_and_limit() {
        let entries = vec![summary("a-tab", ""), summary("b-tab", ""), summary("c-tab", "")];
        assert!(filter(entries.clone(), "zzz", 10).is_empty());
        assert_eq!(filter(entries, "tab", 2).len(), 2);
    }
}
