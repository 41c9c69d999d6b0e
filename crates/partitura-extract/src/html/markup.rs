//! A forgiving markup scanner with a small selector language.
//!
//! The scanner builds a flat element list with parent links in one pass.
//! It does not build a DOM and never fails: stray close tags are ignored
//! and unclosed elements run to the end of their parent. An unclosed
//! `li`, `tr`, `td` or `th` ends where its next sibling starts.
//!
//! Supported selectors: `tag`, `.class`, `#id`, `[attr]`, `[attr=value]`,
//! `[attr*=value]`, compounds of those (`tr.heading_mkZNt`), and the
//! descendant combinator (`table tbody tr`).

use partitura_core::text::{clean, decode_entities};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Open elements a start tag implicitly closes, and the elements that
/// stop the search for them.
fn implied_end(name: &str) -> Option<(&'static [&'static str], &'static [&'static str])> {
    let ends: (&'static [&'static str], &'static [&'static str]) = match name {
        "li" => (&["li"], &["ul", "ol"]),
        "tr" => (&["tr"], &["table", "thead", "tbody", "tfoot"]),
        "td" | "th" => (&["td", "th"], &["tr", "table"]),
        _ => return None,
    };
    Some(ends)
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    start: usize,
    content_start: usize,
    content_end: usize,
    end: usize,
    parent: Option<usize>,
}

/// A scanned document.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    source: &'a str,
    nodes: Vec<Node>,
}

/// A handle to one element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'d, 'a> {
    doc: &'d Document<'a>,
    index: usize,
}

impl<'a> Document<'a> {
    pub fn parse(source: &'a str) -> Self {
        Scanner::new(source).run()
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Every element matching `selector`, in document order.
    pub fn select<'d>(&'d self, selector: &str) -> Vec<Element<'d, 'a>> {
        let selector = Selector::parse(selector);
        (0..self.nodes.len())
            .filter(|&i| selector.matches(self, i))
            .map(|index| Element { doc: self, index })
            .collect()
    }

    pub fn select_first<'d>(&'d self, selector: &str) -> Option<Element<'d, 'a>> {
        let selector = Selector::parse(selector);
        (0..self.nodes.len())
            .find(|&i| selector.matches(self, i))
            .map(|index| Element { doc: self, index })
    }

    fn is_descendant(&self, index: usize, ancestor: usize) -> bool {
        let mut current = self.nodes[index].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p].parent;
        }
        false
    }
}

impl<'d, 'a> Element<'d, 'a> {
    fn node(&self) -> &'d Node {
        &self.doc.nodes[self.index]
    }

    /// Lowercase tag name.
    pub fn name(&self) -> &'d str {
        &self.node().name
    }

    /// Attribute value with entities decoded.
    pub fn attr(&self, name: &str) -> Option<&'d str> {
        self.node()
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Raw markup between the open and close tags.
    pub fn inner_html(&self) -> &'a str {
        let node = self.node();
        &self.doc.source[node.content_start..node.content_end]
    }

    /// Raw markup including the element's own tags.
    pub fn outer_html(&self) -> &'a str {
        let node = self.node();
        &self.doc.source[node.start..node.end]
    }

    /// Visible text: tags stripped, entities decoded, whitespace collapsed.
    pub fn text(&self) -> String {
        clean(self.inner_html())
    }

    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|index| Self {
            doc: self.doc,
            index,
        })
    }

    /// Matching descendants of this element, in document order.
    pub fn select(&self, selector: &str) -> Vec<Self> {
        let selector = Selector::parse(selector);
        ((self.index + 1)..self.doc.nodes.len())
            .take_while(|&i| self.doc.is_descendant(i, self.index))
            .filter(|&i| selector.matches(self.doc, i))
            .map(|index| Self {
                doc: self.doc,
                index,
            })
            .collect()
    }

    pub fn select_first(&self, selector: &str) -> Option<Self> {
        self.select(selector).into_iter().next()
    }

    /// Whether `other` lies inside this element.
    pub fn contains(&self, other: &Self) -> bool {
        self.doc.is_descendant(other.index, self.index)
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
    Contains(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn parse(s: &str) -> Self {
        let mut compound = Self::default();
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        let ident = |start: usize| -> (String, usize) {
            let mut end = start;
            while end < chars.len() && !matches!(chars[end], '.' | '#' | '[') {
                end += 1;
            }
            (chars[start..end].iter().collect(), end)
        };

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (class, next) = ident(i + 1);
                    compound.classes.push(class);
                    i = next;
                }
                '#' => {
                    let (id, next) = ident(i + 1);
                    compound.id = Some(id);
                    i = next;
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|&c| c == ']')
                        .map_or(chars.len(), |p| i + p);
                    let body: String = chars[(i + 1).min(close)..close].iter().collect();
                    compound.attrs.push(parse_attr_test(&body));
                    i = close + 1;
                }
                _ => {
                    let (tag, next) = ident(i);
                    compound.tag = Some(tag.to_lowercase());
                    i = next;
                }
            }
        }
        compound
    }

    fn matches(&self, node: &Node) -> bool {
        if self.tag.as_ref().is_some_and(|t| *t != node.name) {
            return false;
        }
        let attr = |name: &str| {
            node.attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        if let Some(id) = &self.id {
            if attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let classes: Vec<&str> = attr("class").unwrap_or("").split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => attr(name).is_some(),
            AttrTest::Equals(name, value) => attr(name) == Some(value.as_str()),
            AttrTest::Contains(name, value) => attr(name).is_some_and(|v| v.contains(value.as_str())),
        })
    }
}

fn parse_attr_test(body: &str) -> AttrTest {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some((name, value)) = body.split_once("*=") {
        AttrTest::Contains(name.trim().to_lowercase(), unquote(value))
    } else if let Some((name, value)) = body.split_once('=') {
        AttrTest::Equals(name.trim().to_lowercase(), unquote(value))
    } else {
        AttrTest::Exists(body.trim().to_lowercase())
    }
}

/// A descendant chain of compound selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse leniently; unrecognised syntax simply matches nothing useful.
    pub fn parse(s: &str) -> Self {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut in_brackets = false;
        for c in s.chars() {
            match c {
                '[' => {
                    in_brackets = true;
                    current.push(c);
                }
                ']' => {
                    in_brackets = false;
                    current.push(c);
                }
                c if c.is_whitespace() && !in_brackets => {
                    if !current.is_empty() {
                        parts.push(Compound::parse(&current));
                        current.clear();
                    }
                }
                c => current.push(c),
            }
        }
        if !current.is_empty() {
            parts.push(Compound::parse(&current));
        }
        Self { parts }
    }

    fn matches(&self, doc: &Document<'_>, index: usize) -> bool {
        let Some((last, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(&doc.nodes[index]) {
            return false;
        }
        let mut current = doc.nodes[index].parent;
        for compound in ancestors.iter().rev() {
            loop {
                let Some(p) = current else {
                    return false;
                };
                current = doc.nodes[p].parent;
                if compound.matches(&doc.nodes[p]) {
                    break;
                }
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    nodes: Vec<Node>,
    open: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            nodes: Vec::new(),
            open: Vec::new(),
        }
    }

    fn run(mut self) -> Document<'a> {
        let bytes = self.source.as_bytes();
        while let Some(offset) = self.source[self.pos..].find('<') {
            let start = self.pos + offset;
            let next = bytes.get(start + 1).copied();
            match next {
                Some(b'!') => self.skip_declaration(start),
                Some(b'/') => self.close_tag(start),
                Some(c) if c.is_ascii_alphabetic() => self.open_tag(start),
                _ => self.pos = start + 1,
            }
        }
        let len = self.source.len();
        while let Some(index) = self.open.pop() {
            self.nodes[index].content_end = len;
            self.nodes[index].end = len;
        }
        Document {
            source: self.source,
            nodes: self.nodes,
        }
    }

    fn skip_declaration(&mut self, start: usize) {
        let rest = &self.source[start..];
        let end = if rest.starts_with("<!--") {
            rest.find("-->").map(|p| p + 3)
        } else {
            rest.find('>').map(|p| p + 1)
        };
        self.pos = end.map_or(self.source.len(), |e| start + e);
    }

    fn close_tag(&mut self, start: usize) {
        let rest = &self.source[start + 2..];
        let Some(gt) = rest.find('>') else {
            self.pos = self.source.len();
            return;
        };
        let name = rest[..gt].trim().to_lowercase();
        self.pos = start + 2 + gt + 1;

        if let Some(depth) = self.open.iter().rposition(|&i| self.nodes[i].name == name) {
            for index in self.open.drain(depth..) {
                self.nodes[index].content_end = start;
                self.nodes[index].end = self.pos;
            }
        }
    }

    fn open_tag(&mut self, start: usize) {
        let (name, attrs, tag_end, self_closing) = parse_open_tag(self.source, start);
        self.pos = tag_end;
        self.close_implied(&name, start);

        let index = self.nodes.len();
        self.nodes.push(Node {
            name: name.clone(),
            attrs,
            start,
            content_start: tag_end,
            content_end: tag_end,
            end: tag_end,
            parent: self.open.last().copied(),
        });

        if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            return;
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let needle = format!("</{name}");
            let rest = &self.source[tag_end..];
            let content_end = find_ignore_ascii_case(rest, &needle)
                .map_or(self.source.len(), |p| tag_end + p);
            let end = self.source[content_end..]
                .find('>')
                .map_or(self.source.len(), |p| content_end + p + 1);
            self.nodes[index].content_end = content_end;
            self.nodes[index].end = end;
            self.pos = end;
            return;
        }

        self.open.push(index);
    }

    fn close_implied(&mut self, name: &str, start: usize) {
        let Some((siblings, boundaries)) = implied_end(name) else {
            return;
        };
        let mut depth = None;
        for (at, &index) in self.open.iter().enumerate().rev() {
            let open_name = self.nodes[index].name.as_str();
            if siblings.contains(&open_name) {
                depth = Some(at);
                break;
            }
            if boundaries.contains(&open_name) {
                break;
            }
        }
        if let Some(depth) = depth {
            for index in self.open.drain(depth..) {
                self.nodes[index].content_end = start;
                self.nodes[index].end = start;
            }
        }
    }
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Parse `<name attr=value ...>` starting at `start`; returns the name,
/// attributes, the offset just past `>` and whether the tag self-closes.
fn parse_open_tag(source: &str, start: usize) -> (String, Vec<(String, String)>, usize, bool) {
    let bytes = source.as_bytes();
    let mut i = start + 1;
    let name_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let name = source[name_start..i].to_lowercase();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => return (name, attrs, bytes.len(), self_closing),
            Some(b'>') => return (name, attrs, i + 1, self_closing),
            Some(b'/') => {
                self_closing = true;
                i += 1;
                continue;
            }
            Some(_) => {}
        }
        self_closing = false;

        let key_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>')
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let key = source[key_start..i].to_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                Some(&(quote @ (b'"' | b'\''))) => {
                    let value_start = i + 1;
                    let value_end = source[value_start..]
                        .find(quote as char)
                        .map_or(bytes.len(), |p| value_start + p);
                    value = decode_entities(&source[value_start..value_end]);
                    i = (value_end + 1).min(bytes.len());
                }
                Some(_) => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&source[value_start..i]);
                }
                None => {}
            }
        }
        if !key.is_empty() {
            attrs.push((key, value));
        }
    }
}
