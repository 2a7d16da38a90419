pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    // lowercase alphanumeric keeps codes case-insensitive in chat clients
    let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// Cheap syntactic gate applied before any store lookup.
///
/// Codes are minted from the lowercase alphanumeric alphabet; anything else
/// can be rejected without touching the backend.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 64
        && code
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}
