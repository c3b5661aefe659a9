//! Display-name sanitization
//!
//! Untrusted upload names become filesystem-safe stems: lowercase ASCII,
//! with `.` and `_` preserved as the only separators besides `-`. Path
//! separators never survive.

/// Sanitize an untrusted display name into a safe file name.
///
/// Common Latin diacritics fold to their ASCII base letter; everything else
/// outside `[a-z0-9._]` collapses into single dashes, with leading and
/// trailing dashes trimmed.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        let folded = fold_char(ch);
        match folded {
            Some(c) => {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(c);
            }
            None => pending_dash = true,
        }
    }

    out
}

// Lowercase, fold common Latin diacritics, keep `.`/`_`; everything else
// becomes a separator.
fn fold_char(ch: char) -> Option<char> {
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    match lower {
        'a'..='z' | '0'..='9' | '.' | '_' => Some(lower),
        'à'..='å' | 'ā' | 'ă' | 'ą' => Some('a'),
        'ç' | 'ć' | 'č' => Some('c'),
        'ď' => Some('d'),
        'è'..='ë' | 'ě' | 'ē' | 'ę' => Some('e'),
        'ì'..='ï' => Some('i'),
        'ñ' | 'ň' | 'ń' => Some('n'),
        'ò'..='ö' | 'ø' | 'ő' => Some('o'),
        'ř' => Some('r'),
        'š' | 'ś' => Some('s'),
        'ť' => Some('t'),
        'ù'..='ü' | 'ů' | 'ű' => Some('u'),
        'ý' | 'ÿ' => Some('y'),
        'ž' | 'ź' | 'ż' => Some('z'),
        _ => None,
    }
}
