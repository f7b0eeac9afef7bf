pub mod logger;

use url::Url;

/// Maximum length of the path portion of a generated filename.
const MAX_PATH_CHARS: usize = 200;

/// Converts a URL into a filesystem-safe base name of the form
/// `domain_path`, e.g. `https://www.example.com/about/team` becomes
/// `example_com_about_team`. A URL with no path maps to `domain_index`.
pub fn url_to_filename(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => {
            // Not a parseable URL; flatten the whole string instead
            let mut fallback: String = url
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            collapse_underscores(&mut fallback);
            return fallback.trim_matches('_').to_string();
        }
    };

    let path = parsed.path().trim_matches('/');
    let mut name = if path.is_empty() {
        "index".to_string()
    } else {
        path.replace(['/', '?', '&', '=', ':'], "_")
    };
    truncate_chars(&mut name, MAX_PATH_CHARS);

    let domain = parsed
        .host_str()
        .unwrap_or("site")
        .trim_start_matches("www.")
        .replace('.', "_");

    format!("{}_{}", domain, name)
}

fn collapse_underscores(s: &mut String) {
    while s.contains("__") {
        *s = s.replace("__", "_");
    }
}

fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homepage_maps_to_index() {
        assert_eq!(url_to_filename("https://example.com"), "example_com_index");
        assert_eq!(url_to_filename("https://example.com/"), "example_com_index");
    }

    #[test]
    fn www_prefix_is_stripped() {
        assert_eq!(
            url_to_filename("https://www.example.com/about"),
            "example_com_about"
        );
    }

    #[test]
    fn path_separators_become_underscores() {
        assert_eq!(
            url_to_filename("https://example.com/blog/2024/post-1"),
            "example_com_blog_2024_post-1"
        );
    }

    #[test]
    fn long_paths_are_capped() {
        let long_segment = "a".repeat(500);
        let name = url_to_filename(&format!("https://example.com/{}", long_segment));
        assert_eq!(name.len(), "example_com_".len() + 200);
    }

    #[test]
    fn unparseable_input_is_flattened() {
        let name = url_to_filename("not a url at all");
        assert!(!name.is_empty());
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
