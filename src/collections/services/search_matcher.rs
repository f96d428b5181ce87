use crate::collections::domain::{ResourceRecord, SearchField};

/// How well a field matched the query, best first.
///
/// Variant order is the ranking order: a derived `Ord` puts `NoMatch` lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    NoMatch,
    /// Every query character appears in order ("edr" in "Editor")
    Fuzzy,
    /// Query equals the initials of the field's words ("ca" in "Content Author")
    Acronym,
    Contains,
    WordStartsWith,
    StartsWith,
    Equal,
    CaseSensitiveEqual,
}

/// SearchMatcher service for client-side free-text filtering
///
/// Ranks each record by its best-matching declared field and keeps the records
/// that match at all. Output is ordered by descending rank; records of equal
/// rank keep their original relative order (the sort is stable).
///
/// Pure and synchronous.
pub struct SearchMatcher;

impl SearchMatcher {
    /// Filters and orders `records` against `query` over `fields`
    ///
    /// # Arguments
    /// * `records` - Records in the order the backend returned them
    /// * `query` - Free text typed by the user; blank means "no search"
    /// * `fields` - Fields to look at
    ///
    /// # Returns
    /// The input unchanged for a blank query, otherwise the ranked matches
    pub fn filter(
        records: &[ResourceRecord],
        query: &str,
        fields: &[SearchField],
    ) -> Vec<ResourceRecord> {
        let query = query.trim();
        if query.is_empty() {
            return records.to_vec();
        }

        let mut ranked: Vec<(MatchRank, &ResourceRecord)> = records
            .iter()
            .map(|record| (Self::rank_record(record, query, fields), record))
            .filter(|(rank, _)| *rank > MatchRank::NoMatch)
            .collect();

        // Stable: ties stay in backend order.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().map(|(_, record)| record.clone()).collect()
    }

    /// Best rank across the declared fields of one record
    pub fn rank_record(record: &ResourceRecord, query: &str, fields: &[SearchField]) -> MatchRank {
        fields
            .iter()
            .filter_map(|field| field.read(record))
            .map(|value| Self::rank(&value, query))
            .max()
            .unwrap_or(MatchRank::NoMatch)
    }

    /// Ranks a single field value against the query
    pub fn rank(value: &str, query: &str) -> MatchRank {
        if query.is_empty() || value.is_empty() {
            return MatchRank::NoMatch;
        }
        if value == query {
            return MatchRank::CaseSensitiveEqual;
        }

        let value = value.to_lowercase();
        let query = query.to_lowercase();

        if value == query {
            return MatchRank::Equal;
        }
        if value.starts_with(&query) {
            return MatchRank::StartsWith;
        }
        if value
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .any(|word| !word.is_empty() && word.starts_with(&query))
        {
            return MatchRank::WordStartsWith;
        }
        if value.contains(&query) {
            return MatchRank::Contains;
        }
        if query.chars().count() > 1 && Self::acronym(&value) == query {
            return MatchRank::Acronym;
        }
        if Self::is_subsequence(&query, &value) {
            return MatchRank::Fuzzy;
        }
        MatchRank::NoMatch
    }

    fn acronym(value: &str) -> String {
        value
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter_map(|word| word.chars().next())
            .collect()
    }

    fn is_subsequence(needle: &str, haystack: &str) -> bool {
        let mut haystack = haystack.chars();
        needle
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(|n| haystack.any(|h| h == n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<SearchField> {
        vec![SearchField::Name, SearchField::Description]
    }

    fn roles() -> Vec<ResourceRecord> {
        vec![
            ResourceRecord::new("1", "Editor").with_description("Can edit content"),
            ResourceRecord::new("2", "Author").with_description("Writes articles"),
            ResourceRecord::new("3", "Public").with_description("Default role"),
        ]
    }

    fn names(records: &[ResourceRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_input_in_order() {
        let records = roles();
        assert_eq!(SearchMatcher::filter(&records, "", &fields()), records);
        assert_eq!(SearchMatcher::filter(&records, "   ", &fields()), records);
    }

    #[test]
    fn test_prefix_query_finds_single_role() {
        let records = vec![
            ResourceRecord::new("1", "Editor"),
            ResourceRecord::new("2", "Author"),
            ResourceRecord::new("3", "Public"),
        ];
        let result = SearchMatcher::filter(&records, "edit", &fields());
        assert_eq!(names(&result), vec!["Editor"]);
    }

    #[test]
    fn test_no_match_returns_empty() {
        assert!(SearchMatcher::filter(&roles(), "zzz", &fields()).is_empty());
    }

    #[test]
    fn test_better_rank_comes_first() {
        let records = vec![
            ResourceRecord::new("1", "Super Editor"),
            ResourceRecord::new("2", "Editor"),
            ResourceRecord::new("3", "Co-editor"),
        ];
        let result = SearchMatcher::filter(&records, "editor", &fields());
        assert_eq!(names(&result), vec!["Editor", "Super Editor", "Co-editor"]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let records = vec![
            ResourceRecord::new("1", "Reviewer B"),
            ResourceRecord::new("2", "Reviewer A"),
        ];
        let result = SearchMatcher::filter(&records, "rev", &fields());
        assert_eq!(names(&result), vec!["Reviewer B", "Reviewer A"]);
    }

    #[test]
    fn test_description_field_is_searched() {
        let result = SearchMatcher::filter(&roles(), "articles", &fields());
        assert_eq!(names(&result), vec!["Author"]);
    }

    #[test]
    fn test_undeclared_field_is_ignored() {
        let result = SearchMatcher::filter(&roles(), "articles", &[SearchField::Name]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_rank_levels() {
        assert_eq!(SearchMatcher::rank("Editor", "Editor"), MatchRank::CaseSensitiveEqual);
        assert_eq!(SearchMatcher::rank("Editor", "editor"), MatchRank::Equal);
        assert_eq!(SearchMatcher::rank("Editor", "ed"), MatchRank::StartsWith);
        assert_eq!(SearchMatcher::rank("Chief Editor", "ed"), MatchRank::WordStartsWith);
        assert_eq!(SearchMatcher::rank("Chief Editor", "dit"), MatchRank::Contains);
        assert_eq!(SearchMatcher::rank("Content Author", "ca"), MatchRank::Acronym);
        assert_eq!(SearchMatcher::rank("Editor", "etr"), MatchRank::Fuzzy);
        assert_eq!(SearchMatcher::rank("Editor", "zzz"), MatchRank::NoMatch);
    }
}
