//! Title normalization.
//!
//! Titles coming from filenames and from TMDB rarely agree on punctuation,
//! casing or accents. Comparisons go through [`tokenize`] so that
//! "Amélie", "amelie" and "AMELIE!" all land on the same token list.

/// Split a title into case-folded tokens with punctuation removed.
///
/// Apostrophes vanish without splitting the word ("Schindler's" becomes
/// "schindlers"); every other non-alphanumeric character separates tokens.
pub fn tokenize(s: &str, strip_diacritics: bool) -> Vec<String> {
    let mut cleaned = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\'' | '\u{2019}' | '`') {
            continue;
        }
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                if strip_diacritics {
                    push_folded(&mut cleaned, lower);
                } else {
                    cleaned.push(lower);
                }
            }
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Tokenized form used for title equality checks (diacritics stripped).
pub fn title_key(s: &str) -> Vec<String> {
    tokenize(s, true)
}

/// Display form of a parsed title: tokens joined by single spaces,
/// diacritics preserved.
pub fn clean_title(s: &str) -> String {
    tokenize(s, false).join(" ")
}

/// Append `c` with any Latin diacritic removed.
fn push_folded(out: &mut String, c: char) {
    let folded: &str = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ŧ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'þ' => "th",
        'ð' => "d",
        _ => {
            out.push(c);
            return;
        }
    };
    out.push_str(folded);
}
