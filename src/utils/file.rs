use chrono::{DateTime, Utc};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 128;

/// `files/<owner>/<unix millis>_<upload id>_<sanitised name>`
pub fn object_key(external_id: &str, file_name: &str, now: DateTime<Utc>, upload_id: Uuid) -> String {
    format!(
        "files/{}/{}_{}_{}",
        sanitize_segment(external_id),
        now.timestamp_millis(),
        upload_id.simple(),
        sanitize_segment(file_name)
    )
}

pub fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(MAX_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
