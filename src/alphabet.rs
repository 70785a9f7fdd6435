use std::collections::HashMap;

/// A small nonnegative integer identifying either a structural operator or a
/// user-defined symbol (a literal input character or a rule head name).
pub type SymbolId = usize;

pub const LEFT_PAREN: SymbolId = 0;
pub const RIGHT_PAREN: SymbolId = 1;
pub const STAR: SymbolId = 2;
pub const QUESTION: SymbolId = 3;
pub const PLUS: SymbolId = 4;
pub const PIPE: SymbolId = 5;

const OPERATORS: [(&str, SymbolId); 6] = [
    ("(", LEFT_PAREN),
    (")", RIGHT_PAREN),
    ("*", STAR),
    ("?", QUESTION),
    ("+", PLUS),
    ("|", PIPE),
];

/// Returns the literal character an escape form like `<:left_paren:>`
/// stands for, or `None` if `token` is not an escape form.
fn unescape(token: &str) -> Option<&'static str> {
    match token {
        "<:left_paren:>" => Some("("),
        "<:right_paren:>" => Some(")"),
        "<:asterisk:>" => Some("*"),
        "<:question_mark:>" => Some("?"),
        "<:plus_sign:>" => Some("+"),
        "<:pipe:>" => Some("|"),
        _ => None,
    }
}

/// Bidirectional mapping between source strings and small integer ids.
///
/// Ids `0..6` are always the six structural operators, interned at
/// construction time. An escaped literal (e.g. `<:left_paren:>`) is interned
/// under a key distinct from the bare operator string, so it never collides
/// with the reserved operator id even though both display as `(`.
#[derive(Debug, Clone)]
pub struct Alphabet {
    display: Vec<String>,
    ids: HashMap<String, SymbolId>,
}

impl Alphabet {
    pub fn new() -> Self {
        let mut a = Alphabet {
            display: Vec::new(),
            ids: HashMap::new(),
        };
        for (op, id) in OPERATORS.iter() {
            let assigned = a.intern(op.to_string(), op.to_string());
            debug_assert_eq!(assigned, *id);
        }
        a
    }

    fn intern(&mut self, key: String, display: String) -> SymbolId {
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.display.len();
        self.display.push(display);
        self.ids.insert(key, id);
        id
    }

    /// Quantizes a rule-body token: a bare operator keeps its reserved id,
    /// an escape form resolves to its literal character under a distinct
    /// key, and anything else (a single character literal or a rule head
    /// reference) is interned as-is.
    pub fn quantize(&mut self, token: &str) -> SymbolId {
        if let Some(literal) = unescape(token) {
            let key = format!("\u{0}{}", literal);
            return self.intern(key, literal.to_string());
        }
        self.intern(token.to_string(), token.to_string())
    }

    /// Quantizes a single input character. An operator character is routed
    /// through the same sentinel key its escape form resolves to, so a rule
    /// written as `<:left_paren:>` actually matches a literal `(` in the
    /// input stream; the reserved operator ids only ever show up when a rule
    /// body names the bare operator string itself.
    pub fn quantize_char(&mut self, c: char) -> SymbolId {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        if Self::is_operator_str(s) {
            let key = format!("\u{0}{}", s);
            return self.intern(key, s.to_string());
        }
        self.intern(s.to_string(), s.to_string())
    }

    /// Looks up a previously-quantized token without creating a new id.
    pub fn lookup(&self, token: &str) -> Option<SymbolId> {
        if let Some(literal) = unescape(token) {
            let key = format!("\u{0}{}", literal);
            return self.ids.get(&key).copied();
        }
        self.ids.get(token).copied()
    }

    pub fn dequantize(&self, id: SymbolId) -> Option<&str> {
        self.display.get(id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }

    pub fn is_operator(id: SymbolId) -> bool {
        id < OPERATORS.len()
    }

    pub fn is_operator_str(s: &str) -> bool {
        OPERATORS.iter().any(|(op, _)| *op == s)
    }

    pub fn is_escape_form(s: &str) -> bool {
        unescape(s).is_some()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new()
    }
}
