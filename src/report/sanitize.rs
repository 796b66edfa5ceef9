// src/report/sanitize.rs
//! The PDF path uses the built-in Helvetica faces, which only cover a Latin-1
//! style character set. Typographic characters are mapped to ASCII first.

const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2014}', "-"),   // em dash
    ('\u{2013}', "-"),   // en dash
    ('\u{2012}', "-"),   // figure dash
    ('\u{2010}', "-"),   // hyphen
    ('\u{2011}', "-"),   // non-breaking hyphen
    ('\u{2212}', "-"),   // minus sign
    ('\u{2018}', "'"),   // left single quote
    ('\u{2019}', "'"),   // right single quote
    ('\u{201A}', "'"),   // single low quote
    ('\u{201C}', "\""),  // left double quote
    ('\u{201D}', "\""),  // right double quote
    ('\u{201E}', "\""),  // double low quote
    ('\u{2032}', "'"),   // prime
    ('\u{2033}', "\""),  // double prime
    ('\u{2026}', "..."), // ellipsis
    ('\u{2022}', "-"),   // bullet
    ('\u{00B7}', "-"),   // middle dot
    ('\u{2192}', "->"),  // right arrow
    ('\u{2190}', "<-"),  // left arrow
    ('\u{2194}', "<->"), // left right arrow
    ('\u{21D2}', "=>"),  // double right arrow
    ('\u{00D7}', "x"),   // multiplication sign
    ('\u{00F7}', "/"),   // division sign
    ('\u{00B0}', " deg"), // degree sign
    ('\u{2122}', "(TM)"),
    ('\u{00A9}', "(c)"),
    ('\u{00AE}', "(R)"),
    ('\u{00A0}', " "),   // non-breaking space
];

/// Replace typographic characters with ASCII. Anything else outside ASCII is
/// dropped, since the renderer would print it as garbage.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some((_, replacement)) = REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else if let Some(folded) = fold_latin(c) {
            out.push(folded);
        }
    }
    out
}

/// Accented Latin letters lose their accent rather than vanish.
fn fold_latin(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typographic_characters_become_ascii() {
        assert_eq!(
            sanitize_text("It\u{2019}s a 10\u{00B0} turn \u{2014} nice\u{2026}"),
            "It's a 10 deg turn - nice..."
        );
    }

    #[test]
    fn quotes_arrows_and_marks() {
        assert_eq!(
            sanitize_text("\u{201C}Sofa\u{201D} \u{2192} 2\u{00D7}3 \u{00A9} Acme\u{2122}"),
            "\"Sofa\" -> 2x3 (c) Acme(TM)"
        );
    }

    #[test]
    fn ascii_is_untouched() {
        let text = "Plain text, $100-$300 (approx.)";
        assert_eq!(sanitize_text(text), text);
    }

    #[test]
    fn accents_fold_and_emoji_drop() {
        assert_eq!(sanitize_text("Café 🛋 décor"), "Cafe  decor");
    }
}
