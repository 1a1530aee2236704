use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid regex"));
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalize scraped text: single spaces, no indentation, at most one blank
/// line between stanzas, trimmed.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let spaced = HORIZONTAL_SPACE.replace_all(&unified, " ");
    let stripped = spaced
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    EXCESS_NEWLINES
        .replace_all(&stripped, "\n\n")
        .trim()
        .to_string()
}

/// Decode the handful of entities that show up in embedded lyrics HTML.
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_collapses_spaces_and_indentation() {
        assert_eq!(normalize("  first \t  line\n    second\u{a0}line  "), "first line\nsecond line");
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        assert_eq!(normalize("a\n  \n \t \n\nb"), "a\n\nb");
    }

    #[test]
    fn test_trims_and_handles_crlf() {
        assert_eq!(normalize("\r\n\r\nverse\r\nchorus\r\n"), "verse\nchorus");
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("Rock &amp; Roll &#39;n&#39; &lt;3"), "Rock & Roll 'n' <3");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }
}
