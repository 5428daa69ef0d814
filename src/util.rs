/// Shortens `title` to at most `max_chars` characters, ending in an ellipsis.
pub fn short_title(title: &str, max_chars: usize) -> String {
    let title = title.trim();
    if title.chars().count() <= max_chars {
        return title.to_owned();
    }

    let mut shortened = title
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>()
        .trim_end()
        .to_owned();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_pass_through() {
        assert_eq!(short_title("  Rust  ", 10), "Rust");
    }

    #[test]
    fn long_titles_are_cut_on_char_boundaries() {
        assert_eq!(short_title("Ownership and borrowing", 10), "Ownership…");
        assert_eq!(short_title("ääääääää", 4), "äää…");
    }
}
