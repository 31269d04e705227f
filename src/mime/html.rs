//! HTML to visible text.

/// Elements whose content is never rendered as text.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Elements that break the flow of text; rendered as a word separator.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "title", "tr", "ul",
];

/// Strip all markup, keeping only human-readable text.
///
/// Tags, comments, and the bodies of scripts, styles and templates are
/// discarded. Character references are decoded and whitespace runs collapse
/// to single spaces.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut hidden: Option<&'static str> = None;
    let mut rest = html;

    loop {
        // Raw text: nothing inside is markup until the matching end tag.
        if let Some(element) = hidden.take() {
            rest = after_end_tag(rest, element);
        }

        let Some(lt) = rest.find('<') else {
            break;
        };
        let (before, after) = rest.split_at(lt);
        text.push_str(before);

        if let Some(comment) = after.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }

        if !opens_markup(after) {
            text.push('<');
            rest = &after[1..];
            continue;
        }

        // Unterminated tag: nothing after it is text.
        let Some(gt) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = &after[1..gt];
        rest = &after[gt + 1..];

        let closing = tag.starts_with('/');
        let name = tag_name(tag);

        if !closing && !tag.ends_with('/') {
            hidden = HIDDEN_ELEMENTS.iter().copied().find(|e| *e == name);
        }
        if BLOCK_ELEMENTS.contains(&name.as_str()) {
            text.push(' ');
        }
    }

    text.push_str(rest);

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The remainder of `html` after the end tag of `element`, matched
/// case-insensitively. Empty if the element is never closed.
fn after_end_tag<'a>(html: &'a str, element: &str) -> &'a str {
    let mut from = 0;
    while let Some(pos) = html[from..].find("</") {
        let name_start = from + pos + 2;
        let candidate = html[name_start..].as_bytes();
        let matches = candidate.len() >= element.len()
            && candidate[..element.len()].eq_ignore_ascii_case(element.as_bytes())
            && !candidate
                .get(element.len())
                .is_some_and(u8::is_ascii_alphanumeric);
        if matches {
            let close = &html[name_start + element.len()..];
            return close.find('>').map_or("", |gt| &close[gt + 1..]);
        }
        from = name_start;
    }
    ""
}

/// Whether the `<` at the start of `s` opens a tag, declaration or
/// processing instruction rather than being literal text.
fn opens_markup(s: &str) -> bool {
    s[1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

/// Lowercased element name of a tag body such as `/p` or `a href="..."`.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Decode character references. Unknown references are left verbatim.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        let decoded = candidate
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&candidate[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(reference: &str) -> Option<char> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match reference {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "euro" => '€',
        _ => return None,
    };
    Some(c)
}
