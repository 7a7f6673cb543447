//! PGN parsing utilities: lightweight regex-based parser.

use regex::Regex;

/// Headers we care about; absent tags fall back to placeholders.
#[derive(Debug, Clone)]
pub struct PgnHeaders {
    pub white: String,
    pub black: String,
    pub result: String,
}

/// Declared winner derived from the Result header.
pub fn winner_from_result(result: &str) -> &'static str {
    match result {
        "1-0" => "White",
        "0-1" => "Black",
        "1/2-1/2" => "Draw",
        _ => "Unknown",
    }
}

/// Whether the text carries at least one PGN tag pair.
pub fn has_headers(pgn: &str) -> bool {
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("static regex");
    header_re.is_match(pgn)
}

/// Extract the player/result headers from PGN text.
pub fn parse_headers(pgn: &str) -> PgnHeaders {
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("static regex");

    let mut white = "White".to_string();
    let mut black = "Black".to_string();
    let mut result = "*".to_string();

    for cap in header_re.captures_iter(pgn) {
        let value = cap[2].trim().to_string();
        if value.is_empty() {
            continue;
        }
        match &cap[1] {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = value,
            _ => {}
        }
    }

    PgnHeaders {
        white,
        black,
        result,
    }
}

/// Extract SAN moves from PGN text (after stripping headers, comments,
/// variations and move numbers).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    let header_re = Regex::new(r"\[[^\]]*\]").expect("static regex");
    let no_headers = header_re.replace_all(pgn, "");

    let comment_re = Regex::new(r"\{[^}]*\}").expect("static regex");
    let no_comments = comment_re.replace_all(&no_headers, "");

    let variation_re = Regex::new(r"\([^)]*\)").expect("static regex");
    let no_variations = variation_re.replace_all(&no_comments, "");

    let move_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O")
            .expect("static regex");

    move_re
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]

1. e4 e5 2. Nf3 {a comment} Nc6 (2... d6) 3. Bb5 1-0"#;

    #[test]
    fn headers_and_winner() {
        let headers = parse_headers(SAMPLE);
        assert_eq!(headers.white, "Player1");
        assert_eq!(headers.black, "Player2");
        assert_eq!(headers.result, "1-0");
        assert_eq!(winner_from_result(&headers.result), "White");
        assert_eq!(winner_from_result("1/2-1/2"), "Draw");
        assert_eq!(winner_from_result("*"), "Unknown");
    }

    #[test]
    fn header_presence_is_detected() {
        assert!(has_headers(SAMPLE));
        assert!(!has_headers("1. e4 e5"));
        assert!(!has_headers(""));
    }

    #[test]
    fn headers_default_when_missing() {
        let headers = parse_headers("1. e4 e5");
        assert_eq!(headers.white, "White");
        assert_eq!(headers.black, "Black");
        assert_eq!(headers.result, "*");
    }

    #[test]
    fn moves_skip_comments_and_variations() {
        let moves = extract_moves(SAMPLE);
        assert_eq!(moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    }
}
