pub const LABEL_MAX_CHARS: usize = 12;

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    match label.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &label[..cut]),
        None => label.to_string(),
    }
}

pub fn user_id_of(root_id: &str) -> &str {
    root_id.strip_prefix("user-").unwrap_or(root_id)
}

pub fn format_rating(rating: f32) -> String {
    format!("{rating:.2} ★")
}
