/// Diagnostic reporting using ariadne for readable error messages
use crate::sanitizer::SanitizeError;
use crate::span::{locate_nearest, Span};
use crate::ComposeError;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::ops::Range;

fn render<'a>(source_name: &'a str, source: &str, report: Report<'_, (&'a str, Range<usize>)>) -> String {
    let mut output = Vec::new();
    report
        .write((source_name, Source::from(source)), &mut output)
        .expect("Failed to write diagnostic");

    String::from_utf8(output).expect("Invalid UTF-8 in diagnostic output")
}

/// Byte span to the char offsets ariadne labels with
fn char_range(source: &str, span: Span) -> Range<usize> {
    let start = source[..span.start].chars().count();
    start..start + source[span.range()].chars().count()
}

/// Report a JSON syntax error
pub fn report_parse_error(source_name: &str, source: &str, error: &serde_json::Error) -> String {
    let span = char_range(source, Span::at_line_column(source, error.line(), error.column()));
    let report = Report::build(ReportKind::Error, source_name, span.start)
        .with_message("Invalid JSON in source definitions")
        .with_label(
            Label::new((source_name, span))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish();
    render(source_name, source, report)
}

/// Report a definition that failed validation
pub fn report_sanitize_error(source_name: &str, source: &str, error: &SanitizeError) -> String {
    let path = error.path();
    let span = char_range(
        source,
        locate_nearest(source, &path).unwrap_or_else(|| Span::new(0, source.len())),
    );

    let help = match error {
        SanitizeError::SourcesNotArray => "Wrap the sources in a JSON array: [ {...}, {...} ]",
        SanitizeError::SourceNotObject { .. } => {
            "A source looks like {\"name\": \"size\", \"items\": [...]}"
        }
        SanitizeError::InvalidSourceName { .. } => "Give the source a string or numeric name",
        SanitizeError::ReservedSourceName { .. } => {
            "\"tags\" holds the accumulated tags; rename this source"
        }
        SanitizeError::ItemsNotArray { .. } => "List the candidates as \"items\": [ {...} ]",
        SanitizeError::ItemNotObject { .. } => "An item looks like {\"value\": ..., \"weight\": 1}",
        SanitizeError::AddNotObject { .. } => "\"add\" maps extra field names to values",
        SanitizeError::FieldNotArray { .. } | SanitizeError::TagNotString { .. } => {
            "Tag lists are arrays of strings, e.g. [\"big\", \"red\"]"
        }
        SanitizeError::InvalidWeight { .. } => "Weights must be non-negative numbers",
    };

    let report = Report::build(ReportKind::Error, source_name, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((source_name, span))
                .with_message(format!("at {}", display_path(error)))
                .with_color(Color::Red),
        )
        .with_help(help)
        .finish();
    render(source_name, source, report)
}

fn display_path(error: &SanitizeError) -> String {
    let path = error.path_string();
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("sources{}", path)
    }
}

/// Combined error reporting for the JSON front end
pub fn report_compose_error(source_name: &str, source: &str, error: &ComposeError) -> String {
    match error {
        ComposeError::Parse(e) => report_parse_error(source_name, source, e),
        ComposeError::Sanitize(e) => report_sanitize_error(source_name, source, e),
    }
}
