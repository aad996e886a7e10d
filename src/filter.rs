//! Row predicate over joined records.

use chrono::Datelike;

use crate::config::FilterSpec;
use crate::records::JoinedRecord;

/// True when the record matches the name, is dated in or after `min_year`,
/// and sits in one of the allowed states.
pub fn matches(record: &JoinedRecord, spec: &FilterSpec) -> bool {
    record.name.as_deref() == Some(spec.name.as_str())
        && record.date.year() >= spec.min_year
        && record
            .state
            .as_deref()
            .is_some_and(|s| spec.states.contains(s))
}

/// Keeps the rows satisfying [`matches`], in their original order.
/// Duplicates are preserved.
pub fn filter_records(records: Vec<JoinedRecord>, spec: &FilterSpec) -> Vec<JoinedRecord> {
    records.into_iter().filter(|r| matches(r, spec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::parse_review_date;

    fn record(id: &str, name: Option<&str>, state: Option<&str>, date: &str) -> JoinedRecord {
        JoinedRecord {
            review_id: id.into(),
            user_id: "u".into(),
            business_id: "b".into(),
            stars: 3.0,
            useful: 0,
            funny: 0,
            cool: 0,
            text: "fine".into(),
            date: parse_review_date(date).unwrap(),
            name: name.map(Into::into),
            address: None,
            city: None,
            state: state.map(Into::into),
            postal_code: None,
            latitude: None,
            longitude: None,
            business_stars: None,
            review_count: None,
            is_open: None,
            categories: None,
        }
    }

    fn sample() -> Vec<JoinedRecord> {
        vec![
            record("keep1", Some("IHOP"), Some("FL"), "2015-01-01 00:00:00"),
            record("old", Some("IHOP"), Some("FL"), "2014-12-31 23:59:59"),
            record("wrong_state", Some("IHOP"), Some("CA"), "2016-01-01 00:00:00"),
            record("wrong_name", Some("Denny's"), Some("PA"), "2016-01-01 00:00:00"),
            record("no_business", None, None, "2016-01-01 00:00:00"),
            record("case", Some("ihop"), Some("LA"), "2016-01-01 00:00:00"),
            record("keep2", Some("IHOP"), Some("PA"), "2020-05-05 10:00:00"),
            record("keep2", Some("IHOP"), Some("PA"), "2020-05-05 10:00:00"),
        ]
    }

    #[test]
    fn test_filter_is_conjunctive_and_ordered() {
        let out = filter_records(sample(), &FilterSpec::default());
        let ids: Vec<_> = out.iter().map(|r| r.review_id.as_str()).collect();
        assert_eq!(ids, vec!["keep1", "keep2", "keep2"]);
    }

    #[test]
    fn test_min_year_is_inclusive() {
        let spec = FilterSpec::new("IHOP", 2015, ["FL"]);
        assert!(matches(&sample()[0], &spec));
        assert!(!matches(&sample()[1], &spec));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let spec = FilterSpec::default();
        let once = filter_records(sample(), &spec);
        let twice = filter_records(once.clone(), &spec);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_output_is_unmodified_subset() {
        let input = sample();
        let out = filter_records(input.clone(), &FilterSpec::default());
        for row in &out {
            assert!(input.contains(row));
        }
    }
}
