//! Version index page.
//!
//! Reads `"<version> <epochSeconds>"` lines and renders the static HTML table
//! linking every published version, preceded by the working draft.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{debug, instrument, warn};

use groqspec_shared::VersionRecord;

/// Heading shown above the version table.
pub const DEFAULT_HEADING: &str = "GROQ";

/// Largest absolute timestamp (ms) a JavaScript `Date` accepts.
const MAX_DATE_MS: f64 = 8.64e15;

const STYLESHEET: &str = r#"      body {
        color: #333333;
        font: 13pt/18pt Cambria, 'Palatino Linotype', Palatino, 'Liberation Serif', serif;
        margin: 6rem auto 3rem;
        max-width: 780px;
      }
      @media (min-width: 1240px) {
        body {
          padding-right: 300px;
        }
      }
      a {
        color: #3B5998;
        text-decoration: none;
      }
      a:hover {
        text-decoration: underline;
      }
      h1 {
        font-size: 1.5em;
        margin: 8rem 0 2em;
      }
      td {
        padding-bottom: 5px;
      }
      td + td {
        padding-left: 2ch;
      }"#;

/// The always-present first row.
pub fn draft_record(now: DateTime<Utc>) -> VersionRecord {
    VersionRecord {
        slug: "draft".into(),
        name: "Working Draft".into(),
        date: Some(now),
        variant: Some("Prerelease".into()),
    }
}

/// Parse the newline-delimited version list.
///
/// The draft row comes first; the first listed version is labelled
/// `Latest release`.
#[instrument(skip_all, fields(bytes = input.len()))]
pub fn parse_versions(input: &str, now: DateTime<Utc>) -> Vec<VersionRecord> {
    let mut records = vec![draft_record(now)];

    let input = input.trim();
    if input.is_empty() {
        return records;
    }

    for (index, line) in input.split('\n').enumerate() {
        let mut fields = line.split(' ');
        let version = fields.next().unwrap_or_default();
        let date = fields.next().and_then(epoch_seconds_to_date);
        if date.is_none() {
            warn!(line, "unreadable release date");
        }

        records.push(VersionRecord {
            slug: version.to_string(),
            name: version.to_string(),
            date,
            variant: (index == 0).then(|| "Latest release".to_string()),
        });
    }

    debug!(count = records.len(), "versions parsed");
    records
}

/// Interpret a field as seconds since the epoch, the way `Number(field) * 1000`
/// feeds a JavaScript `Date`.
fn epoch_seconds_to_date(field: &str) -> Option<DateTime<Utc>> {
    let seconds = js_number(field)?;
    let millis = seconds * 1000.0;
    if !millis.is_finite() || millis.abs() > MAX_DATE_MS {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

/// JavaScript `Number(string)`: blank is zero, `None` stands for `NaN`.
fn js_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).ok().map(|n| n as f64);
    }

    match s.trim_start_matches(['+', '-']) {
        "Infinity" if s.starts_with('-') => return Some(f64::NEG_INFINITY),
        "Infinity" => return Some(f64::INFINITY),
        // Rust also accepts `inf` and `nan`.
        rest if rest.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => {
            return None;
        }
        _ => {}
    }

    s.parse::<f64>().ok()
}

/// `MMM d, yyyy` in UTC, or `Invalid Date`.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Render the full index page.
pub fn render_index(records: &[VersionRecord], heading: &str) -> String {
    let rows: String = records.iter().map(render_row).collect();

    format!(
        r#"<html>
  <head>
    <title>GROQ Specification Versions</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
{STYLESHEET}
    </style>
  </head>
  <body>
    <h1>{}</h1>
    <table>
      <tbody>{rows}</tbody>
    </table>
  </body>
  </html>"#,
        encode_text(heading)
    )
}

fn render_row(record: &VersionRecord) -> String {
    let variant = match record.variant.as_deref() {
        Some(v) if !v.is_empty() => format!("<em>{}</em>", encode_text(v)),
        _ => String::new(),
    };

    format!(
        r#"<tr>
      <td>{variant}</td>
      <td><a href="{}">{}</a></td>
      <td>{}</td>
    </tr>"#,
        encode_double_quoted_attribute(&record.slug),
        encode_text(&record.name),
        encode_text(&format_date(record.date))
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn draft_then_latest_then_older() {
        let records = parse_versions("v1 1000\nv2 2000\n", now());

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].slug, "draft");
        assert_eq!(records[0].variant.as_deref(), Some("Prerelease"));
        assert_eq!(records[1].slug, "v1");
        assert_eq!(records[1].variant.as_deref(), Some("Latest release"));
        assert_eq!(records[1].date, DateTime::from_timestamp(1000, 0));
        assert_eq!(records[2].slug, "v2");
        assert_eq!(records[2].variant, None);
    }

    #[test]
    fn empty_input_gives_draft_only() {
        for input in ["", "   \n\n  "] {
            let records = parse_versions(input, now());
            assert_eq!(records, vec![draft_record(now())]);
        }
    }

    #[test]
    fn javascript_number_semantics() {
        assert_eq!(js_number(""), Some(0.0));
        assert_eq!(js_number(" 42 "), Some(42.0));
        assert_eq!(js_number("1.5e3"), Some(1500.0));
        assert_eq!(js_number("0x10"), Some(16.0));
        assert_eq!(js_number("abc"), None);
        assert_eq!(js_number("inf"), None);
        assert_eq!(js_number("12px"), None);
    }

    #[test]
    fn missing_or_bad_date_is_invalid() {
        let records = parse_versions("v1\nv2 soon\nv3  1000", now());
        assert_eq!(records[1].date, None);
        assert_eq!(records[2].date, None);
        // Double space: the second field is empty, which reads as the epoch.
        assert_eq!(records[3].date, DateTime::from_timestamp(0, 0));
        assert_eq!(format_date(records[1].date), "Invalid Date");
    }

    #[test]
    fn dates_format_in_utc() {
        let date = DateTime::from_timestamp(1_559_347_200, 0);
        assert_eq!(format_date(date), "Jun 1, 2019");
        assert_eq!(format_date(Some(now())), "Mar 5, 2024");
    }

    #[test]
    fn rows_render_in_order_with_variants() {
        let html = render_index(&parse_versions("v1 1000\nv2 2000", now()), DEFAULT_HEADING);

        assert!(html.starts_with("<html>"));
        assert!(html.contains("<title>GROQ Specification Versions</title>"));
        assert!(html.contains("<h1>GROQ</h1>"));
        assert_eq!(html.matches("<tr>").count(), 3);

        let draft = html.find(r#"<a href="draft">Working Draft</a>"#).unwrap();
        let v1 = html.find(r#"<a href="v1">v1</a>"#).unwrap();
        let v2 = html.find(r#"<a href="v2">v2</a>"#).unwrap();
        assert!(draft < v1 && v1 < v2);

        assert!(html.contains("<td><em>Prerelease</em></td>"));
        assert!(html.contains("<td><em>Latest release</em></td>"));
        assert!(html.contains("<td></td>\n      <td><a href=\"v2\">"));
        assert!(html.contains("<td>Jan 1, 1970</td>"));
    }

    #[test]
    fn values_are_escaped() {
        let html = render_index(&parse_versions("<b>\"x\" 0", now()), DEFAULT_HEADING);
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&quot;x&quot;"));
    }
}
