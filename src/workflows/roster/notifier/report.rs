use std::fmt::Write as _;

use crate::config::ContactColumns;
use crate::workflows::roster::classifier::InvalidApplicant;

pub(crate) fn error_report_subject(count: usize) -> String {
    format!("Membership Application Errors - {count} record(s) need attention")
}

/// HTML table of records the classifier could not read, for the roster admin.
pub(crate) fn render_error_report(invalid: &[InvalidApplicant], columns: &ContactColumns) -> String {
    let mut html = String::new();
    html.push_str("<h2>Applications needing attention</h2>");
    writeln!(
        html,
        "<p>{} application(s) could not be classified. Fix the highlighted rows in the roster and rerun triage.</p>",
        invalid.len()
    )
    .expect("report summary");
    html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">");
    html.push_str("<tr><th>Row</th><th>Name</th><th>Email</th><th>Problem</th></tr>");

    for entry in invalid {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            entry.row,
            escape_html(entry.record.trimmed(&columns.name)),
            escape_html(entry.record.trimmed(&columns.email)),
            escape_html(&entry.error)
        )
        .expect("report row");
    }

    html.push_str("</table>");
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
