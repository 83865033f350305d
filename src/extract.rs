//! Asset reference extraction from markdown source lines.
//!
//! This is deliberately not a markdown parser. A line is pattern-matched for
//! a handful of shapes that embed site-relative asset paths:
//!
//! ```text
//! [caption](/images/2013/11/a.jpg "title")      bracket link, optional title
//! <img src="/images/a.jpg">                      quote-delimited
//! {% img /images/a.jpg 'caption' %}              space-delimited
//! {% slide /images/2013/11/IMG_1 %}              directive → _t.jpg + _l.jpg
//! {% cover /images/2013/11/IMG_1 %}              directive → _t.jpg + _c.jpg
//! ```
//!
//! References are returned left to right in the order they appear on the
//! line. Malformed input never fails: a reference without its closing
//! delimiter runs to the end of the line.

/// Characters that open (and close) a delimited reference.
const DELIMITERS: [char; 3] = [' ', '"', '\''];

/// A directive that expands into a thumbnail plus one larger variant.
struct Directive {
    prefix: &'static str,
    large_suffix: &'static str,
}

const DIRECTIVES: [Directive; 2] = [
    Directive {
        prefix: "{% slide ",
        large_suffix: "_l.jpg",
    },
    Directive {
        prefix: "{% cover ",
        large_suffix: "_c.jpg",
    },
];

const THUMBNAIL_SUFFIX: &str = "_t.jpg";

/// Extracts asset references rooted at a fixed set of top-level directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    roots: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(["images", "assets"])
    }
}

impl Extractor {
    /// Build an extractor recognizing `/<root>/...` for each given root.
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roots: roots
                .into_iter()
                .map(|r| r.as_ref().trim_matches('/').to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Return every asset path referenced on `line`, left to right.
    pub fn extract(&self, line: &str) -> Vec<String> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(directive) = DIRECTIVES.iter().find(|d| line.starts_with(d.prefix)) {
            return expand_directive(line, directive);
        }

        let mut found: Vec<(usize, String)> = Vec::new();
        for root in &self.roots {
            let needle = format!("/{root}/");
            collect_bracketed(line, &needle, &mut found);
            for delimiter in DELIMITERS {
                collect_delimited(line, &needle, delimiter, &mut found);
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, path)| path).collect()
    }
}

/// Extract with the default `/images/` and `/assets/` roots.
pub fn extract(line: &str) -> Vec<String> {
    Extractor::default().extract(line)
}

/// `{% slide <path> ... %}` names a base path; the third space-separated
/// token is the path, minus a closing `%}` glued to it. Lines without one
/// are rejected.
fn expand_directive(line: &str, directive: &Directive) -> Vec<String> {
    let Some(base) = line.split(' ').nth(2).map(str::trim) else {
        return Vec::new();
    };
    let base = base.strip_suffix("%}").unwrap_or(base);
    if base.is_empty() {
        return Vec::new();
    }
    vec![
        format!("{base}{THUMBNAIL_SUFFIX}"),
        format!("{base}{}", directive.large_suffix),
    ]
}

/// `(/root/...)`: ends at the first `)`, or earlier at a space-quote title.
fn collect_bracketed(line: &str, needle: &str, found: &mut Vec<(usize, String)>) {
    let opener = format!("({needle}");
    for (idx, _) in line.match_indices(&opener) {
        let start = idx + 1;
        let rest = &line[start..];
        let mut end = rest.find(')').unwrap_or(rest.len());
        if let Some(title) = find_title(&rest[..end]) {
            end = title;
        }
        found.push((start, rest[..end].to_string()));
    }
}

fn find_title(field: &str) -> Option<usize> {
    [" \"", " '"].iter().filter_map(|t| field.find(t)).min()
}

/// `<c>/root/...<c>`: ends at the next occurrence of the opening character.
fn collect_delimited(
    line: &str,
    needle: &str,
    delimiter: char,
    found: &mut Vec<(usize, String)>,
) {
    let opener = format!("{delimiter}{needle}");
    for (idx, _) in line.match_indices(&opener) {
        let start = idx + delimiter.len_utf8();
        let rest = &line[start..];
        // Skip the leading '/' so the scan starts inside the path.
        let end = rest[1..]
            .find(delimiter)
            .map(|e| e + 1)
            .unwrap_or(rest.len());
        found.push((start, rest[..end].to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_yields_nothing() {
        assert!(extract("foobar").is_empty());
        assert!(extract("").is_empty());
        assert!(extract("see (/blog/2013/post.html) and \"quoted\" words").is_empty());
    }

    #[test]
    fn bracket_link() {
        assert_eq!(extract("[foobar](/images/link.jpg)"), vec!["/images/link.jpg"]);
    }

    #[test]
    fn bracket_link_with_double_quoted_title() {
        assert_eq!(
            extract(r#"[f](/images/link.jpg "a title")"#),
            vec!["/images/link.jpg"]
        );
    }

    #[test]
    fn bracket_link_with_single_quoted_title() {
        assert_eq!(
            extract("[f](/images/link.jpg 'f')"),
            vec!["/images/link.jpg"]
        );
    }

    #[test]
    fn assets_root_recognized() {
        assert_eq!(
            extract("[pdf](/assets/docs/cv.pdf)"),
            vec!["/assets/docs/cv.pdf"]
        );
    }

    #[test]
    fn space_delimited_tag() {
        assert_eq!(
            extract("{% img /images/s.jpg 'f' %}"),
            vec!["/images/s.jpg"]
        );
    }

    #[test]
    fn double_quote_delimited_html() {
        assert_eq!(
            extract(r#"<img src="/images/2013/11/a.jpg" alt="x">"#),
            vec!["/images/2013/11/a.jpg"]
        );
    }

    #[test]
    fn single_quote_delimited_html() {
        assert_eq!(
            extract("<img src='/assets/logo.png'>"),
            vec!["/assets/logo.png"]
        );
    }

    #[test]
    fn linked_thumbnail_yields_both_in_order() {
        let line = r#"[![caption](/images/a.jpg "t")](/images/b.jpg "g")"#;
        assert_eq!(extract(line), vec!["/images/a.jpg", "/images/b.jpg"]);
    }

    #[test]
    fn order_is_textual_across_shapes() {
        let line = r#"<img src="/images/z.jpg"> then [x](/images/a.jpg)"#;
        assert_eq!(extract(line), vec!["/images/z.jpg", "/images/a.jpg"]);
    }

    #[test]
    fn slide_directive_expands_to_thumbnail_and_large() {
        assert_eq!(extract("{% slide /i/x %}"), vec!["/i/x_t.jpg", "/i/x_l.jpg"]);
    }

    #[test]
    fn cover_directive_expands_to_thumbnail_and_medium() {
        assert_eq!(extract("{% cover /i/x %}"), vec!["/i/x_t.jpg", "/i/x_c.jpg"]);
    }

    #[test]
    fn directive_ignores_rest_of_line() {
        assert_eq!(
            extract("{% slide /images/2013/11/IMG_1 Caption text %}\n"),
            vec![
                "/images/2013/11/IMG_1_t.jpg",
                "/images/2013/11/IMG_1_l.jpg"
            ]
        );
    }

    #[test]
    fn directive_closer_glued_to_path_is_stripped() {
        assert_eq!(
            extract("{% slide /images/2013/IMG_1%}"),
            vec!["/images/2013/IMG_1_t.jpg", "/images/2013/IMG_1_l.jpg"]
        );
    }

    #[test]
    fn malformed_directive_is_rejected() {
        assert!(extract("{% slide ").is_empty());
        assert!(extract("{% slide %}").is_empty());
        assert!(extract("{% cover  %}").is_empty());
    }

    #[test]
    fn unterminated_bracket_runs_to_end_of_line() {
        assert_eq!(extract("[x](/images/a.jpg"), vec!["/images/a.jpg"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(extract("src=\"/images/a.jpg\n"), vec!["/images/a.jpg"]);
    }

    #[test]
    fn root_must_be_a_directory() {
        assert!(extract("[x](/imagesfoo/a.jpg)").is_empty());
    }

    #[test]
    fn custom_roots() {
        let extractor = Extractor::new(["/media/"]);
        assert_eq!(
            extractor.extract("[x](/media/a.png) [y](/images/b.png)"),
            vec!["/media/a.png"]
        );
    }
}
