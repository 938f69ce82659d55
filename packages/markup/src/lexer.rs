use logos::{Lexer, Logos, Skip};
use std::fmt;
use std::ops::Range;

/// Markup tokens. Anything the lexer cannot match is kept as literal text.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"<![a-zA-Z][^>]*>")]
pub enum MarkupToken<'src> {
    #[token("<!--", skip_comment)]
    Comment,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(
        r#"<[a-zA-Z][a-zA-Z0-9]*([ \t\r\n]+[^ \t\r\n"'=<>/]+([ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'|[^ \t\r\n"'=<>`]+))?)*[ \t\r\n]*/?>"#,
        |lex| lex.slice()
    )]
    OpenTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

fn skip_comment<'src>(lex: &mut Lexer<'src, MarkupToken<'src>>) -> Skip {
    let remainder = lex.remainder();
    match remainder.find("-->") {
        Some(end) => lex.bump(end + 3),
        None => lex.bump(remainder.len()),
    }
    Skip
}

impl fmt::Display for MarkupToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupToken::Comment => write!(f, "comment"),
            MarkupToken::CloseTag(s) => write!(f, "closing tag {}", s),
            MarkupToken::OpenTag(s) => write!(f, "opening tag {}", s),
            MarkupToken::Text(s) => write!(f, "text '{}'", s),
        }
    }
}

/// Tokenize markup. Unlexable input (a stray `<`) comes back as text.
pub fn tokenize(source: &str) -> Vec<(MarkupToken<'_>, Range<usize>)> {
    MarkupToken::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => (token, span),
            Err(()) => (MarkupToken::Text(&source[span.clone()]), span),
        })
        .collect()
}

/// A parsed opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercased tag name
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

impl Tag {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum AttrToken<'src> {
    #[regex(r#"[^ \t\r\n"'=<>`]+"#, |lex| lex.slice())]
    Word(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'[^']*'", |lex| unquote(lex.slice()))]
    Quoted(&'src str),
}

fn unquote(slice: &str) -> &str {
    &slice[1..slice.len() - 1]
}

/// Split an `OpenTag` slice into name and attributes
pub fn parse_open_tag(slice: &str) -> Tag {
    let inner = slice.trim_start_matches('<').trim_end_matches('>');
    let (inner, self_closing) = match inner.trim_end().strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let mut attributes = Vec::new();
    let mut tokens = AttrToken::lexer(&inner[name_end..])
        .filter_map(Result::ok)
        .peekable();

    while let Some(token) = tokens.next() {
        let AttrToken::Word(key) = token else {
            continue;
        };
        let key = key.to_ascii_lowercase();
        if tokens.peek() != Some(&AttrToken::Equals) {
            attributes.push((key, String::new()));
            continue;
        }
        tokens.next();
        match tokens.peek() {
            Some(AttrToken::Word(value)) | Some(AttrToken::Quoted(value)) => {
                attributes.push((key, decode_entities(value)));
                tokens.next();
            }
            _ => attributes.push((key, String::new())),
        }
    }

    Tag {
        name,
        attributes,
        self_closing,
    }
}

/// Name of a `CloseTag` slice, lowercased
pub fn close_tag_name(slice: &str) -> String {
    slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim_end()
        .to_ascii_lowercase()
}

/// Decode character references. Unknown references are left untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
