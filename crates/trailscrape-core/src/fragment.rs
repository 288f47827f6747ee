//! XML-like fragment served for a cached profile.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::profile::ProfileRecord;

/// Renders the eight record fields, in fixed order, each inside a labeled
/// `div`, wrapped in a single `<result>` container.
///
/// Absent fields render as an empty element. Values are XML-escaped.
#[must_use]
pub fn render_fragment(record: &ProfileRecord) -> String {
    let mut out = String::from("<result>");
    for (label, value) in record.fields() {
        let value = escape(value.unwrap_or_default());
        // Writing into a String cannot fail.
        let _ = write!(out, "<div class='result {label}'>{value}</div>");
    }
    out.push_str("</result>");
    out
}
