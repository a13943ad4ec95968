//! Marker-delimited payload location
//!
//! An embedded message sits between a start marker and an optional end marker
//! inside a free-text log line. Each stage here returns an explicit `Option`
//! instead of a sentinel index.

/// Byte offset just past the first occurrence of `start_marker`
pub fn locate_start(text: &str, start_marker: &str) -> Option<usize> {
    text.find(start_marker).map(|index| index + start_marker.len())
}

/// Byte offset of the first `end_marker` at or after `from`
///
/// An empty end marker never matches.
pub fn locate_end(text: &str, from: usize, end_marker: &str) -> Option<usize> {
    if end_marker.is_empty() {
        return None;
    }
    text.get(from..)?
        .find(end_marker)
        .map(|offset| from + offset)
}

/// Trimmed payload between the two markers
///
/// Returns `None` when the start marker is absent. When the end marker does not
/// follow the start marker the payload runs to the end of `text`.
pub fn extract_payload<'a>(text: &'a str, start_marker: &str, end_marker: &str) -> Option<&'a str> {
    let start = locate_start(text, start_marker)?;
    let end = locate_end(text, start, end_marker).unwrap_or(text.len());
    Some(text[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "RabbitMQ [SendMessage] -- Sent message: ";
    const END: &str = " to exchange:";

    #[test]
    fn test_payload_between_markers() {
        let text = "info RabbitMQ [SendMessage] -- Sent message: {\"a\":1} to exchange: X";
        assert_eq!(extract_payload(text, START, END), Some("{\"a\":1}"));
    }

    #[test]
    fn test_payload_without_end_marker_runs_to_end() {
        let text = "RabbitMQ [SendMessage] -- Sent message:   {\"a\":1}  \n";
        assert_eq!(extract_payload(text, START, END), Some("{\"a\":1}"));
    }

    #[test]
    fn test_missing_start_marker() {
        assert_eq!(extract_payload("plain log line", START, END), None);
        assert_eq!(extract_payload("", START, END), None);
    }

    #[test]
    fn test_end_marker_before_start_is_ignored() {
        let text = " to exchange: early RabbitMQ [SendMessage] -- Sent message: {\"a\":1}";
        assert_eq!(extract_payload(text, START, END), Some("{\"a\":1}"));
    }

    #[test]
    fn test_first_end_marker_after_start_wins() {
        let text = "RabbitMQ [SendMessage] -- Sent message: {} to exchange: A to exchange: B";
        assert_eq!(extract_payload(text, START, END), Some("{}"));
    }

    #[test]
    fn test_empty_end_marker_never_matches() {
        let text = "RabbitMQ [SendMessage] -- Sent message: {\"a\":1}";
        assert_eq!(locate_end(text, 0, ""), None);
        assert_eq!(extract_payload(text, START, ""), Some("{\"a\":1}"));
    }

    #[test]
    fn test_marker_at_end_of_text_gives_empty_payload() {
        let text = "RabbitMQ [SendMessage] -- Sent message: ";
        assert_eq!(extract_payload(text, START, END), Some(""));
    }

    #[test]
    fn test_multibyte_text_around_markers() {
        let text = "ünïcødé RabbitMQ [SendMessage] -- Sent message: {\"d\":\"Prüfstand\"} to exchange: ✓";
        assert_eq!(
            extract_payload(text, START, END),
            Some("{\"d\":\"Prüfstand\"}")
        );
    }
}
