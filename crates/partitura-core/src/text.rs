//! Text sanitation shared by every source extractor.
//!
//! All functions here are pure and total: they never fail, and unknown
//! input passes through unchanged.

/// Named entities outside the Latin-1 block.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("sbquo", '\u{201A}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("bdquo", '\u{201E}'),
    ("hellip", '\u{2026}'),
    ("bull", '\u{2022}'),
    ("euro", '\u{20AC}'),
    ("trade", '\u{2122}'),
    ("OElig", '\u{152}'),
    ("oelig", '\u{153}'),
    ("Scaron", '\u{160}'),
    ("scaron", '\u{161}'),
    ("Yuml", '\u{178}'),
    ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'),
    ("ZeroWidthSpace", '\u{200B}'),
];

/// Entity names for U+00A0..=U+00FF, in code point order.
const LATIN1_ENTITIES: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute",
    "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute",
    "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute",
    "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil",
    "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde",
    "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute",
    "ucirc", "uuml", "yacute", "thorn", "yuml",
];

/// UTF-8 bytes of accented letters mis-decoded as Latin-1/Windows-1252.
///
/// Closed table: sequences not listed here are left alone.
const MOJIBAKE: &[(&str, &str)] = &[
    ("\u{C3}\u{AB}", "\u{EB}"),
    ("\u{C3}\u{B6}", "\u{F6}"),
    ("\u{C3}\u{BC}", "\u{FC}"),
    ("\u{C3}\u{A4}", "\u{E4}"),
    ("\u{C3}\u{A9}", "\u{E9}"),
    ("\u{C3}\u{A8}", "\u{E8}"),
    ("\u{C3}\u{AA}", "\u{EA}"),
    ("\u{C3}\u{A1}", "\u{E1}"),
    ("\u{C3}\u{A2}", "\u{E2}"),
    ("\u{C3}\u{A7}", "\u{E7}"),
    ("\u{C3}\u{B3}", "\u{F3}"),
    ("\u{C3}\u{B4}", "\u{F4}"),
    ("\u{C3}\u{B1}", "\u{F1}"),
    ("\u{C3}\u{AF}", "\u{EF}"),
    ("\u{C3}\u{AE}", "\u{EE}"),
    ("\u{C3}\u{BA}", "\u{FA}"),
    ("\u{C3}\u{BB}", "\u{FB}"),
    ("\u{C3}\u{B8}", "\u{F8}"),
    ("\u{C3}\u{A5}", "\u{E5}"),
    ("\u{C3}\u{2013}", "\u{D6}"),
    ("\u{C3}\u{153}", "\u{DC}"),
    ("\u{C3}\u{201E}", "\u{C4}"),
    ("\u{C3}\u{178}", "\u{DF}"),
    ("\u{C3}\u{2030}", "\u{C9}"),
];

/// Words kept lowercase by [`title_case`] unless they open the string.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "of", "in", "on", "at", "to", "for", "with", "de", "la",
    "le", "von", "van",
];

/// Longest entity name we bother looking up (`ZeroWidthSpace`).
const MAX_ENTITY_LEN: usize = 16;

/// Remove every `<...>` run. An unterminated `<` is kept as text.
pub fn strip_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode HTML entities, then repair double-encoded UTF-8.
pub fn decode_entities(s: &str) -> String {
    repair_mojibake(&decode_html_entities(s))
}

fn decode_html_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= MAX_ENTITY_LEN)
            .and_then(|semi| lookup_entity(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn lookup_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    if let Some(&(_, c)) = NAMED_ENTITIES.iter().find(|(n, _)| *n == name) {
        return Some(c);
    }
    LATIN1_ENTITIES
        .iter()
        .position(|n| *n == name)
        .and_then(|i| char::from_u32(0xA0 + i as u32))
}

fn repair_mojibake(s: &str) -> String {
    if !s.contains('\u{C3}') {
        return s.to_string();
    }
    MOJIBAKE
        .iter()
        .fold(s.to_string(), |acc, (bad, good)| acc.replace(bad, good))
}

/// Map layout whitespace to ASCII space, collapse runs, and trim.
pub fn normalize_whitespace(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' | '\u{A0}' | '\u{2009}' | '\u{202F}' | '\u{200B}' => ' ',
            other => other,
        })
        .collect();
    mapped.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Capitalize each whitespace-separated word, keeping short function
/// words lowercase unless they come first.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && MINOR_WORDS.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when the string has at least two letters and none is lowercase.
pub fn is_all_caps(s: &str) -> bool {
    let mut letters = 0;
    for c in s.chars().filter(|c| c.is_alphabetic()) {
        if c.is_lowercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}

/// Title-case a name only when it arrived in ALL CAPS.
pub fn fix_shouting(s: &str) -> String {
    if is_all_caps(s) {
        title_case(s)
    } else {
        s.to_string()
    }
}

/// Markup-stripped, entity-decoded, whitespace-normalized text.
pub fn clean(s: &str) -> String {
    normalize_whitespace(&decode_entities(&strip_markup(s)))
}

/// [`clean`] for artist names, with ALL-CAPS names title-cased.
pub fn clean_name(s: &str) -> String {
    fix_shouting(&clean(s))
}
