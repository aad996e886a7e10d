//! Review, business and joined record shapes.
//!
//! Source records arrive as line-delimited JSON. The joined record is the
//! flat row written to every stage CSV.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Date layout used when writing stage files.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

/// Columns every stage file must carry for downstream stages to work.
pub const REQUIRED_COLUMNS: &[&str] = &["review_id", "business_id", "text", "date", "name", "state"];

/// A raw review line.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub user_id: String,
    pub business_id: String,
    pub stars: f64,
    #[serde(default)]
    pub useful: i64,
    #[serde(default)]
    pub funny: i64,
    #[serde(default)]
    pub cool: i64,
    #[serde(default)]
    pub text: String,
    pub date: String,
}

/// A raw business line. Nested attribute objects are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Business {
    pub business_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub stars: Option<f64>,
    pub review_count: Option<i64>,
    pub is_open: Option<i64>,
    pub categories: Option<String>,
}

/// A review left-joined with its business. Business columns are empty when
/// the review's `business_id` has no match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinedRecord {
    pub review_id: String,
    pub user_id: String,
    pub business_id: String,
    pub stars: f64,
    pub useful: i64,
    pub funny: i64,
    pub cool: i64,
    pub text: String,
    #[serde(deserialize_with = "date_column")]
    pub date: NaiveDateTime,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub business_stars: Option<f64>,
    pub review_count: Option<i64>,
    pub is_open: Option<i64>,
    pub categories: Option<String>,
}

impl JoinedRecord {
    /// Column names in serialization order.
    pub const HEADERS: &'static [&'static str] = &[
        "review_id",
        "user_id",
        "business_id",
        "stars",
        "useful",
        "funny",
        "cool",
        "text",
        "date",
        "name",
        "address",
        "city",
        "state",
        "postal_code",
        "latitude",
        "longitude",
        "business_stars",
        "review_count",
        "is_open",
        "categories",
    ];

    /// Builds a joined row from a review and its optional business match.
    ///
    /// # Errors
    ///
    /// Returns the offending value if the review date cannot be parsed.
    pub fn join(review: Review, business: Option<&Business>) -> Result<Self, String> {
        let date = parse_review_date(&review.date)?;

        Ok(Self {
            review_id: review.review_id,
            user_id: review.user_id,
            business_id: review.business_id,
            stars: review.stars,
            useful: review.useful,
            funny: review.funny,
            cool: review.cool,
            text: normalize_text(&review.text),
            date,
            name: business.and_then(|b| b.name.clone()),
            address: business.and_then(|b| b.address.as_deref().map(normalize_text)),
            city: business.and_then(|b| b.city.clone()),
            state: business.and_then(|b| b.state.clone()),
            postal_code: business.and_then(|b| b.postal_code.clone()),
            latitude: business.and_then(|b| b.latitude),
            longitude: business.and_then(|b| b.longitude),
            business_stars: business.and_then(|b| b.stars),
            review_count: business.and_then(|b| b.review_count),
            is_open: business.and_then(|b| b.is_open),
            categories: business.and_then(|b| b.categories.clone()),
        })
    }

    /// Cell values in [`JoinedRecord::HEADERS`] order.
    pub fn to_row(&self) -> Vec<String> {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        vec![
            self.review_id.clone(),
            self.user_id.clone(),
            self.business_id.clone(),
            self.stars.to_string(),
            self.useful.to_string(),
            self.funny.to_string(),
            self.cool.to_string(),
            self.text.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            opt(&self.name),
            opt(&self.address),
            opt(&self.city),
            opt(&self.state),
            opt(&self.postal_code),
            opt(&self.latitude),
            opt(&self.longitude),
            opt(&self.business_stars),
            opt(&self.review_count),
            opt(&self.is_open),
            opt(&self.categories),
        ]
    }
}

/// Parses a review date in any of the layouts the dataset has been seen to
/// emit. Unparsable input is an error, never a default.
pub fn parse_review_date(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();

    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }

    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(format!("unparsable date '{raw}'"))
}

/// Replaces embedded line breaks with a sentence break (`". "`).
///
/// `\r\n` counts as a single break.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", ". ").replace(['\n', '\r'], ". ")
}

fn date_column<'de, D: serde::Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    parse_review_date(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn review(date: &str, text: &str) -> Review {
        Review {
            review_id: "r1".into(),
            user_id: "u1".into(),
            business_id: "b1".into(),
            stars: 4.0,
            useful: 0,
            funny: 0,
            cool: 0,
            text: text.into(),
            date: date.into(),
        }
    }

    #[test]
    fn test_parse_iso_date() {
        let dt = parse_review_date("2016-07-12 20:34:21").unwrap();
        assert_eq!(dt.year(), 2016);
        assert_eq!(dt.format(DATE_FORMAT).to_string(), "2016-07-12 20:34:21");
    }

    #[test]
    fn test_parse_us_locale_date() {
        let dt = parse_review_date("7/12/2016 8:34:21 PM").unwrap();
        assert_eq!(dt.format(DATE_FORMAT).to_string(), "2016-07-12 20:34:21");
    }

    #[test]
    fn test_parse_date_only_and_rfc3339() {
        assert_eq!(parse_review_date("2019-01-02").unwrap().day(), 2);
        assert_eq!(
            parse_review_date("2019-01-02T03:04:05Z").unwrap().format(DATE_FORMAT).to_string(),
            "2019-01-02 03:04:05"
        );
    }

    #[test]
    fn test_parse_garbage_date_fails() {
        assert!(parse_review_date("yesterday").is_err());
        assert!(parse_review_date("").is_err());
    }

    #[test]
    fn test_normalize_text_line_breaks() {
        assert_eq!(normalize_text("Good food\nBad service"), "Good food. Bad service");
        assert_eq!(normalize_text("a\r\nb"), "a. b");
        assert_eq!(normalize_text("a\rb"), "a. b");
        assert_eq!(normalize_text("no breaks"), "no breaks");
    }

    #[test]
    fn test_join_without_business_leaves_columns_empty() {
        let row = JoinedRecord::join(review("2016-01-01 00:00:00", "ok"), None).unwrap();
        assert!(row.name.is_none());
        assert!(row.state.is_none());
        let cells = row.to_row();
        assert_eq!(cells.len(), JoinedRecord::HEADERS.len());
        assert_eq!(cells[9], "");
    }

    #[test]
    fn test_join_with_business_copies_fields() {
        let business = Business {
            business_id: "b1".into(),
            name: Some("IHOP".into()),
            address: Some("1 Main\nSt".into()),
            city: Some("Tampa".into()),
            state: Some("FL".into()),
            postal_code: None,
            latitude: Some(27.9),
            longitude: Some(-82.4),
            stars: Some(3.5),
            review_count: Some(10),
            is_open: Some(1),
            categories: None,
        };
        let row = JoinedRecord::join(review("2016-01-01 00:00:00", "line\nbreak"), Some(&business))
            .unwrap();
        assert_eq!(row.name.as_deref(), Some("IHOP"));
        assert_eq!(row.address.as_deref(), Some("1 Main. St"));
        assert_eq!(row.business_stars, Some(3.5));
        assert_eq!(row.text, "line. break");
    }

    #[test]
    fn test_join_rejects_bad_date() {
        assert!(JoinedRecord::join(review("31/31/2016", "x"), None).is_err());
    }
}
