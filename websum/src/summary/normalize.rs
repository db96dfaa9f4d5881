/// Typographic quotes treated as noise in addition to ASCII punctuation
const TYPOGRAPHIC_QUOTES: [char; 4] = ['\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

fn is_noise(c: char) -> bool {
    c.is_ascii_punctuation() || TYPOGRAPHIC_QUOTES.contains(&c)
}

/// Collapse whitespace runs to one space and replace punctuation and typographic
/// quotes with spaces. Total and idempotent; `normalize("")` is `""`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(|c: char| c.is_whitespace() || is_noise(c)) {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_newlines() {
        assert_eq!(normalize("  Hello \n\n\t world  "), "Hello world");
    }

    #[test]
    fn strips_punctuation_and_quotes() {
        assert_eq!(
            normalize("\u{201C}Rust\u{201D} isn\u{2019}t slow, it's fast! (really)"),
            "Rust isn t slow it s fast really"
        );
        assert_eq!(normalize("a---b...c"), "a b c");
    }

    #[test]
    fn empty_and_noise_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n "), "");
        assert_eq!(normalize("!!! ??? ..."), "");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(normalize("Café • déjà vu"), "Café • déjà vu");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "",
            "plain words",
            "## Heading\n\n* bullet one, two.\n* bullet \u{2018}three\u{2019}",
            "  tabs\tand\u{00A0}nbsp  ",
            "mixed: [link][1] & <tag> {json: true}",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
