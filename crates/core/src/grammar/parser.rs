use odl_toolchain_diagnostics::{Diagnostic, Diagnostics, Severity, Span, codes};
use tracing::debug;

use super::lexer::{TokKind, Token, tokenize};
use super::units::parse_units;
use crate::LabelError;
use crate::tree::{AggregateKind, LabelTree, ObjectId, ParamKind, Value, ValueData, ValueShape};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Error and warning totals from one [`parse_into`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParseCounts {
    /// Number of `Error`/`Fatal` diagnostics appended.
    pub errors: usize,
    /// Number of `Warn` diagnostics appended.
    pub warnings: usize,
}

impl ParseCounts {
    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.warnings == 0
    }
}

/// Parse label text into `object`, appending children and parameters in
/// source order and diagnostics to `sink`.
///
/// Parsing stops at the `END` statement; anything after it is ignored.
/// Malformed values are kept with `valid = false` so callers can still
/// inspect them. The only `Err` is allocation failure.
pub fn parse_into(
    tree: &mut LabelTree,
    object: ObjectId,
    text: &str,
    sink: &mut Diagnostics,
) -> Result<ParseCounts, LabelError> {
    let mut parser = Parser {
        input: text,
        toks: tokenize(text),
        pos: 0,
        tree,
        stack: Vec::new(),
        current: object,
        sink,
        counts: ParseCounts::default(),
    };
    parser.check_ascii();
    parser.parse()?;
    debug!(
        errors = parser.counts.errors,
        warnings = parser.counts.warnings,
        "parsed label text"
    );
    Ok(parser.counts)
}

/// A value list as it came out of the grammar.
struct ParsedValue {
    shape: ValueShape,
    columns: usize,
    values: Vec<Value>,
}

/// One open `OBJECT`/`GROUP` block.
struct Open {
    parent: ObjectId,
    class: String,
    kind: AggregateKind,
    span: Span,
}

struct Parser<'a, 't> {
    input: &'a str,
    toks: Vec<Token<'a>>,
    pos: usize,
    tree: &'t mut LabelTree,
    stack: Vec<Open>,
    current: ObjectId,
    sink: &'t mut Diagnostics,
    counts: ParseCounts,
}

impl<'a> Parser<'a, '_> {
    // ── Diagnostics ─────────────────────────────────────────────────────

    fn report(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error | Severity::Fatal => self.counts.errors += 1,
            Severity::Warn => self.counts.warnings += 1,
            _ => {}
        }
        self.sink.push(diag);
    }

    fn error(&mut self, code: &'static str, message: String, span: Span) {
        self.report(Diagnostic::error(code, message, Some(span)));
    }

    fn check_ascii(&mut self) {
        if let Some(offset) = self.input.bytes().position(|b| !b.is_ascii()) {
            let end = (offset + 1..=self.input.len())
                .find(|&e| self.input.is_char_boundary(e))
                .unwrap_or(self.input.len());
            self.report(Diagnostic::warn(
                codes::PARSER_NON_ASCII,
                "label text contains non-ASCII characters",
                Some(Span::new(offset, end)),
            ));
        }
    }

    // ── Token navigation ────────────────────────────────────────────────

    /// Skip comments, warning once for an unterminated one.
    fn skip_trivia(&mut self) {
        while let Some(tok) = self.toks.get(self.pos) {
            let TokKind::Comment { terminated } = tok.kind else {
                break;
            };
            if !terminated {
                let span = Span::new(tok.start, tok.end);
                self.report(Diagnostic::warn(
                    codes::PARSER_UNTERMINATED_COMMENT,
                    "comment is never closed",
                    Some(span),
                ));
            }
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<&Token<'a>> {
        self.skip_trivia();
        self.toks.get(self.pos)
    }

    fn peek_kind(&mut self) -> Option<TokKind> {
        self.peek().map(|t| t.kind)
    }

    /// Kind of the token after the next one, skipping comments.
    fn peek_second_kind(&self) -> Option<TokKind> {
        self.toks[self.pos..]
            .iter()
            .filter(|t| !matches!(t.kind, TokKind::Comment { .. }))
            .nth(1)
            .map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<&Token<'a>> {
        self.skip_trivia();
        let tok = self.toks.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eof_span(&self) -> Span {
        Span::empty(self.input.len())
    }

    fn current_span(&mut self) -> Span {
        match self.peek() {
            Some(t) => Span::new(t.start, t.end),
            None => self.eof_span(),
        }
    }

    /// Whether the next tokens begin a statement: `NAME =`, `^`, or `END`.
    fn at_statement_start(&mut self) -> bool {
        let Some(tok) = self.peek() else {
            return true;
        };
        let (kind, text) = (tok.kind, tok.text);
        match kind {
            TokKind::Caret => true,
            TokKind::Word
                if ["END", "END_OBJECT", "END_GROUP"]
                    .iter()
                    .any(|kw| text.eq_ignore_ascii_case(kw)) =>
            {
                true
            }
            TokKind::Word => self.peek_second_kind() == Some(TokKind::Equals),
            _ => false,
        }
    }

    /// Primary recovery strategy: drop at least one token, then skip to the
    /// next statement boundary.
    fn recover(&mut self) {
        self.bump();
        while !self.at_statement_start() {
            self.pos += 1;
        }
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn parse(&mut self) -> Result<(), LabelError> {
        let mut saw_end = false;
        while let Some(tok) = self.peek() {
            let (kind, word, span) = (tok.kind, tok.text, Span::new(tok.start, tok.end));
            match kind {
                TokKind::Word => {
                    let second = self.peek_second_kind();
                    if word.eq_ignore_ascii_case("END") && second != Some(TokKind::Equals) {
                        self.bump();
                        saw_end = true;
                        break;
                    }
                    if word.eq_ignore_ascii_case("OBJECT") {
                        self.open_aggregate(AggregateKind::Object, span)?;
                    } else if word.eq_ignore_ascii_case("GROUP") {
                        self.open_aggregate(AggregateKind::Group, span)?;
                    } else if word.eq_ignore_ascii_case("END_OBJECT") {
                        self.close_aggregate(AggregateKind::Object, span);
                    } else if word.eq_ignore_ascii_case("END_GROUP") {
                        self.close_aggregate(AggregateKind::Group, span);
                    } else {
                        self.assignment(ParamKind::Keyword)?;
                    }
                }
                TokKind::Caret => {
                    self.bump();
                    if self.peek_kind() == Some(TokKind::Word) {
                        self.assignment(ParamKind::Pointer)?;
                    } else {
                        let span = self.current_span();
                        self.error(
                            codes::PARSER_UNEXPECTED_TOKEN,
                            "expected a pointer name after '^'".into(),
                            span,
                        );
                        self.recover();
                    }
                }
                _ => {
                    let text = word.to_string();
                    self.report(
                        Diagnostic::error(
                            codes::PARSER_UNEXPECTED_TOKEN,
                            format!("unexpected '{text}' at start of statement"),
                            Some(span),
                        )
                        .with_context(ctx!("found" => text)),
                    );
                    self.recover();
                }
            }
        }

        while let Some(open) = self.stack.pop() {
            self.report(
                Diagnostic::error(
                    codes::PARSER_MISSING_END_OBJECT,
                    format!(
                        "{} = {} is never closed",
                        open.kind.open_keyword(),
                        open.class
                    ),
                    Some(open.span),
                )
                .with_context(ctx!(
                    "class" => open.class,
                    "expected" => open.kind.close_keyword(),
                )),
            );
        }
        if !saw_end {
            let span = self.eof_span();
            self.report(Diagnostic::warn(
                codes::PARSER_MISSING_END,
                "label has no END statement",
                Some(span),
            ));
        }
        Ok(())
    }

    fn expect_equals(&mut self, what: &str) -> bool {
        if self.peek_kind() == Some(TokKind::Equals) {
            self.bump();
            return true;
        }
        let span = self.current_span();
        self.error(
            codes::PARSER_UNEXPECTED_TOKEN,
            format!("expected '=' after {what}"),
            span,
        );
        false
    }

    fn open_aggregate(&mut self, kind: AggregateKind, span: Span) -> Result<(), LabelError> {
        self.bump();
        if !self.expect_equals(kind.open_keyword()) {
            self.recover();
            return Ok(());
        }
        let class = match self.peek() {
            Some(t) if t.kind == TokKind::Word => t.text.to_string(),
            _ => {
                let span = self.current_span();
                self.error(
                    codes::PARSER_MISSING_VALUE,
                    format!("{} needs a class name", kind.open_keyword()),
                    span,
                );
                if !self.at_statement_start() {
                    self.recover();
                }
                return Ok(());
            }
        };
        self.bump();
        let id = self.tree.append_object(self.current, class.clone(), kind)?;
        self.stack.push(Open {
            parent: self.current,
            class,
            kind,
            span,
        });
        self.current = id;
        Ok(())
    }

    fn close_aggregate(&mut self, kind: AggregateKind, span: Span) {
        self.bump();
        let mut named: Option<(String, Span)> = None;
        if self.peek_kind() == Some(TokKind::Equals) {
            self.bump();
            match self.peek() {
                Some(t) if t.kind == TokKind::Word => {
                    named = Some((t.text.to_string(), Span::new(t.start, t.end)));
                    self.bump();
                }
                _ => {
                    let span = self.current_span();
                    self.error(
                        codes::PARSER_MISSING_VALUE,
                        format!("{} = needs a class name", kind.close_keyword()),
                        span,
                    );
                }
            }
        }

        let Some(open) = self.stack.pop() else {
            self.error(
                codes::PARSER_UNBALANCED_END,
                format!("{} without a matching opener", kind.close_keyword()),
                span,
            );
            return;
        };
        let class = self
            .tree
            .object(self.current)
            .map(|o| o.class().to_string())
            .unwrap_or_default();
        if open.kind != kind {
            self.report(
                Diagnostic::warn(
                    codes::PARSER_END_CLASS_MISMATCH,
                    format!(
                        "{} closes a {} block",
                        kind.close_keyword(),
                        open.kind.open_keyword()
                    ),
                    Some(span),
                )
                .with_context(ctx!("class" => class.clone())),
            );
        }
        if let Some((name, name_span)) = named.filter(|(n, _)| *n != class) {
            self.report(
                Diagnostic::warn(
                    codes::PARSER_END_CLASS_MISMATCH,
                    format!("{} = {name} closes {class}", kind.close_keyword()),
                    Some(name_span),
                )
                .with_context(ctx!("expected" => class, "found" => name)),
            );
        }
        self.current = open.parent;
    }

    fn assignment(&mut self, kind: ParamKind) -> Result<(), LabelError> {
        let Some(tok) = self.bump() else {
            return Ok(());
        };
        let name = tok.text.to_string();
        if !self.expect_equals(&format!("keyword {name}")) {
            self.recover();
            return Ok(());
        }
        let param = self.tree.append_parameter(self.current, name, kind)?;
        match self.value() {
            Some(parsed) => {
                self.tree
                    .set_values(param, parsed.shape, parsed.columns, parsed.values);
            }
            None => {
                self.tree.remove_parameter(param);
                if !self.at_statement_start() {
                    self.recover();
                }
            }
        }
        Ok(())
    }

    // ── Values ──────────────────────────────────────────────────────────

    fn value(&mut self) -> Option<ParsedValue> {
        match self.peek_kind() {
            Some(TokKind::LParen) => self.sequence(),
            Some(TokKind::LBrace) => {
                let open = self.current_span();
                self.bump();
                let values = self.items(TokKind::RBrace, open)?;
                Some(ParsedValue {
                    shape: ValueShape::Set,
                    columns: 0,
                    values,
                })
            }
            _ => self.scalar().map(|v| ParsedValue {
                shape: ValueShape::Scalar,
                columns: 0,
                values: vec![v],
            }),
        }
    }

    fn sequence(&mut self) -> Option<ParsedValue> {
        let open = self.current_span();
        self.bump();
        if self.peek_kind() != Some(TokKind::LParen) {
            let values = self.items(TokKind::RParen, open)?;
            return Some(ParsedValue {
                shape: ValueShape::Sequence,
                columns: 0,
                values,
            });
        }
        let mut values = Vec::new();
        let mut columns = 0;
        loop {
            let row_open = self.current_span();
            if self.peek_kind() != Some(TokKind::LParen) {
                self.error(
                    codes::PARSER_UNEXPECTED_TOKEN,
                    "expected '(' to start a row".into(),
                    row_open,
                );
                return None;
            }
            self.bump();
            let row = self.items(TokKind::RParen, row_open)?;
            if columns == 0 {
                columns = row.len();
            }
            values.extend(row);
            match self.peek_kind() {
                Some(TokKind::Comma) => {
                    self.bump();
                }
                Some(TokKind::RParen) => {
                    self.bump();
                    break;
                }
                _ => {
                    self.error(
                        codes::PARSER_UNBALANCED_LIST,
                        "two-dimensional sequence is not closed".into(),
                        open,
                    );
                    return None;
                }
            }
        }
        Some(ParsedValue {
            shape: ValueShape::Sequence2D,
            columns,
            values,
        })
    }

    /// Comma-separated scalars up to `close`; the opener is already consumed.
    fn items(&mut self, close: TokKind, open: Span) -> Option<Vec<Value>> {
        let mut values = Vec::new();
        if self.peek_kind() == Some(close) {
            self.bump();
            return Some(values);
        }
        loop {
            values.push(self.scalar()?);
            match self.peek_kind() {
                Some(TokKind::Comma) => {
                    self.bump();
                }
                Some(k) if k == close => {
                    self.bump();
                    return Some(values);
                }
                _ => {
                    self.error(
                        codes::PARSER_UNBALANCED_LIST,
                        "value list is not closed".into(),
                        open,
                    );
                    return None;
                }
            }
        }
    }

    fn scalar(&mut self) -> Option<Value> {
        let at_statement = self.at_statement_start();
        let Some(tok) = self.peek() else {
            let span = self.eof_span();
            self.error(
                codes::PARSER_MISSING_VALUE,
                "expected a value at end of input".into(),
                span,
            );
            return None;
        };
        let span = Span::new(tok.start, tok.end);
        let kind = tok.kind;
        let text = tok.text;
        let inner = tok.inner().to_string();

        let mut value = match kind {
            TokKind::Word if at_statement => {
                self.error(
                    codes::PARSER_MISSING_VALUE,
                    "expected a value before the next statement".into(),
                    span,
                );
                return None;
            }
            TokKind::Word => {
                self.bump();
                match classify_word(text) {
                    Ok(data) => Value::new(data),
                    Err(code) => {
                        self.error(code, format!("malformed value '{text}'"), span);
                        Value::malformed(text)
                    }
                }
            }
            TokKind::String { terminated } | TokKind::Symbol { terminated } => {
                self.bump();
                if !terminated {
                    self.error(
                        codes::PARSER_UNTERMINATED_STRING,
                        "quoted value is never closed".into(),
                        span,
                    );
                    return Some(Value::malformed(text));
                }
                if matches!(kind, TokKind::String { .. }) {
                    Value::string(inner)
                } else {
                    Value::symbol(inner)
                }
            }
            _ => {
                self.error(
                    codes::PARSER_MISSING_VALUE,
                    format!("expected a value, found '{text}'"),
                    span,
                );
                return None;
            }
        };

        if let Some(TokKind::Units { terminated }) = self.peek_kind() {
            let span = self.current_span();
            let units_text = self.bump().map(|t| t.inner().to_string()).unwrap_or_default();
            if !terminated {
                self.error(
                    codes::PARSER_UNTERMINATED_UNITS,
                    "units expression has no closing '>'".into(),
                    span,
                );
                value.valid = false;
            } else {
                match parse_units(&units_text) {
                    Ok(units) => value.units = Some(units),
                    Err(reason) => {
                        self.report(
                            Diagnostic::error(
                                codes::PARSER_INVALID_UNITS,
                                format!("invalid units <{units_text}>: {reason}"),
                                Some(span),
                            )
                            .with_context(ctx!("units" => units_text)),
                        );
                        value.valid = false;
                    }
                }
            }
        }
        Some(value)
    }
}

// ── Word classification ─────────────────────────────────────────────────

/// Decide what kind of literal a bare word is.
fn classify_word(word: &str) -> Result<ValueData, &'static str> {
    if word.eq_ignore_ascii_case("NULL") {
        return Ok(ValueData::Null);
    }
    let first = word.as_bytes()[0];
    if first.is_ascii_alphabetic() {
        return Ok(ValueData::Symbol(word.to_string()));
    }
    if word.contains('#') {
        return parse_radix(word).ok_or(codes::PARSER_INVALID_NUMBER);
    }
    if is_integer(word) {
        return word
            .parse::<i64>()
            .map(ValueData::Integer)
            .map_err(|_| codes::PARSER_INVALID_NUMBER);
    }
    if is_real(word) {
        return word
            .parse::<f64>()
            .map(ValueData::Real)
            .map_err(|_| codes::PARSER_INVALID_NUMBER);
    }
    if word
        .split_once('T')
        .is_some_and(|(date, time)| is_date(date) && is_time(time))
    {
        return Ok(ValueData::DateTime(word.to_string()));
    }
    if is_date(word) {
        return Ok(ValueData::Date(word.to_string()));
    }
    if is_time(word) {
        return Ok(ValueData::Time(word.to_string()));
    }
    if first.is_ascii_digit() || first == b'+' || first == b'-' || first == b'.' {
        Err(codes::PARSER_INVALID_NUMBER)
    } else {
        Err(codes::PARSER_UNEXPECTED_TOKEN)
    }
}

fn strip_sign(s: &str) -> &str {
    s.strip_prefix(['+', '-']).unwrap_or(s)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_integer(s: &str) -> bool {
    all_digits(strip_sign(s))
}

fn is_real(s: &str) -> bool {
    let body = strip_sign(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            (int.is_empty() || all_digits(int))
                && (frac.is_empty() || all_digits(frac))
                && !(int.is_empty() && frac.is_empty())
        }
        None => all_digits(mantissa),
    };
    let exponent_ok = exponent.is_none_or(|e| all_digits(strip_sign(e)));
    mantissa_ok && exponent_ok && (mantissa.contains('.') || exponent.is_some())
}

/// `base#digits#` with an optional sign, base 2 to 16.
fn parse_radix(s: &str) -> Option<ValueData> {
    let negative = s.starts_with('-');
    let body = strip_sign(s);
    let (base, rest) = body.split_once('#')?;
    let digits = rest.strip_suffix('#')?;
    let base: u32 = base.parse().ok()?;
    if !(2..=16).contains(&base) || digits.is_empty() {
        return None;
    }
    let n = i64::from_str_radix(digits, base).ok()?;
    Some(ValueData::Integer(if negative { -n } else { n }))
}

/// `YYYY-MM-DD` or `YYYY-DDD`.
fn is_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y, m, d] => y.len() == 4 && all_digits(y) && m.len() == 2 && all_digits(m) && d.len() == 2 && all_digits(d),
        [y, doy] => y.len() == 4 && all_digits(y) && doy.len() == 3 && all_digits(doy),
        _ => false,
    }
}

/// `HH:MM[:SS[.fff]][Z]`.
fn is_time(s: &str) -> bool {
    let s = s.strip_suffix('Z').unwrap_or(s);
    let parts: Vec<&str> = s.split(':').collect();
    let two = |p: &str| p.len() == 2 && all_digits(p);
    match parts.as_slice() {
        [h, m] => two(h) && two(m),
        [h, m, sec] => {
            let (whole, frac) = match sec.split_once('.') {
                Some((w, f)) => (w, Some(f)),
                None => (*sec, None),
            };
            two(h) && two(m) && two(whole) && frac.is_none_or(all_digits)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (LabelTree, ParseCounts, Diagnostics) {
        let mut tree = LabelTree::new();
        let root = tree.root().unwrap();
        let mut sink = Diagnostics::new();
        let counts = parse_into(&mut tree, root, text, &mut sink).unwrap();
        (tree, counts, sink)
    }

    fn ids(sink: &Diagnostics) -> Vec<&str> {
        sink.iter().map(|d| d.id.as_ref()).collect()
    }

    #[test]
    fn nested_objects_and_pointer() {
        let (tree, counts, _) = parse(
            "RECORD_TYPE = FIXED_LENGTH\r\n^IMAGE = 3\r\nOBJECT = IMAGE\r\n  LINES = 10\r\nEND_OBJECT = IMAGE\r\nEND\r\n",
        );
        assert!(counts.is_clean());
        let root = tree.object(tree.root().unwrap()).unwrap();
        assert_eq!(root.params().len(), 2);
        let ptr = tree.param(root.params()[1]).unwrap();
        assert_eq!(ptr.kind(), ParamKind::Pointer);
        assert_eq!(ptr.name(), "IMAGE");
        let image = tree.object(root.children()[0]).unwrap();
        assert_eq!(image.class(), "IMAGE");
        let lines = tree.param(image.params()[0]).unwrap();
        assert_eq!(lines.values()[0].as_integer(), Some(10));
    }

    #[test]
    fn shapes_and_units() {
        let (tree, counts, _) = parse(
            "A = (1, 2, 3)\nB = {X, Y}\nC = ((1, 2), (3, 4), (5, 6))\nD = 5.5 <KM/SEC>\nEND\n",
        );
        assert!(counts.is_clean());
        let root = tree.root().unwrap();
        let c = tree.param(tree.param_named(root, "C").unwrap()).unwrap();
        assert_eq!(c.shape(), ValueShape::Sequence2D);
        assert_eq!(c.columns(), 2);
        assert_eq!(c.values().len(), 6);
        let b = tree.param(tree.param_named(root, "B").unwrap()).unwrap();
        assert_eq!(b.shape(), ValueShape::Set);
        let d = tree.param(tree.param_named(root, "D").unwrap()).unwrap();
        assert_eq!(d.values()[0].units.as_ref().unwrap().to_string(), "<KM/SEC>");
    }

    #[test]
    fn group_blocks() {
        let (tree, counts, _) = parse("GROUP = G\nX = 1\nEND_GROUP = G\nEND\n");
        assert!(counts.is_clean());
        let root = tree.object(tree.root().unwrap()).unwrap();
        let g = tree.object(root.children()[0]).unwrap();
        assert_eq!(g.kind(), AggregateKind::Group);
    }

    #[test]
    fn missing_end_warns() {
        let (_, counts, sink) = parse("A = 1\n");
        assert_eq!(counts, ParseCounts { errors: 0, warnings: 1 });
        assert_eq!(ids(&sink), vec![codes::PARSER_MISSING_END]);
    }

    #[test]
    fn text_after_end_is_ignored() {
        let (tree, counts, _) = parse("A = 1\nEND\ngarbage ) (\n");
        assert!(counts.is_clean());
        assert_eq!(tree.param_count(), 1);
    }

    #[test]
    fn missing_value_recovers_at_next_statement() {
        let (tree, counts, sink) = parse("A =\nB = 2\nEND\n");
        assert_eq!(counts.errors, 1);
        assert_eq!(ids(&sink), vec![codes::PARSER_MISSING_VALUE]);
        let root = tree.root().unwrap();
        assert!(tree.param_named(root, "A").is_none());
        assert!(tree.param_named(root, "B").is_some());
    }

    #[test]
    fn unbalanced_and_unclosed_blocks() {
        let (_, counts, sink) = parse("END_OBJECT = X\nOBJECT = Y\nEND\n");
        assert_eq!(counts.errors, 2);
        assert_eq!(
            ids(&sink),
            vec![codes::PARSER_UNBALANCED_END, codes::PARSER_MISSING_END_OBJECT]
        );
    }

    #[test]
    fn end_class_mismatch_is_a_warning() {
        let (_, counts, sink) = parse("OBJECT = A\nEND_OBJECT = B\nEND\n");
        assert_eq!(counts, ParseCounts { errors: 0, warnings: 1 });
        assert_eq!(ids(&sink), vec![codes::PARSER_END_CLASS_MISMATCH]);
    }

    #[test]
    fn malformed_values_are_kept_invalid() {
        let (tree, counts, _) = parse("A = 1.2.3\nEND\n");
        assert_eq!(counts.errors, 1);
        let root = tree.root().unwrap();
        let a = tree.param(tree.param_named(root, "A").unwrap()).unwrap();
        assert!(!a.values()[0].valid);
    }

    #[test]
    fn comments_and_non_ascii() {
        let (_, counts, sink) = parse("/* c */ A = \"caf\u{00e9}\"\nEND /* open");
        assert_eq!(counts, ParseCounts { errors: 0, warnings: 1 });
        assert_eq!(ids(&sink), vec![codes::PARSER_NON_ASCII]);
    }

    #[test]
    fn invalid_units_flag_value() {
        let (tree, counts, sink) = parse("A = 3 <KM/>\nEND\n");
        assert_eq!(counts.errors, 1);
        assert_eq!(ids(&sink), vec![codes::PARSER_INVALID_UNITS]);
        let root = tree.root().unwrap();
        let a = tree.param(tree.param_named(root, "A").unwrap()).unwrap();
        assert!(!a.values()[0].valid);
    }

    #[test]
    fn classify_numbers() {
        assert_eq!(classify_word("42"), Ok(ValueData::Integer(42)));
        assert_eq!(classify_word("-7"), Ok(ValueData::Integer(-7)));
        assert_eq!(classify_word("16#FF#"), Ok(ValueData::Integer(255)));
        assert_eq!(classify_word("-2#101#"), Ok(ValueData::Integer(-5)));
        assert_eq!(classify_word("1.5"), Ok(ValueData::Real(1.5)));
        assert_eq!(classify_word(".5"), Ok(ValueData::Real(0.5)));
        assert_eq!(classify_word("1E3"), Ok(ValueData::Real(1000.0)));
        assert_eq!(classify_word("1.0E-7"), Ok(ValueData::Real(1e-7)));
    }

    #[test]
    fn classify_rejects_malformed_numbers() {
        assert_eq!(classify_word("1.2.3"), Err(codes::PARSER_INVALID_NUMBER));
        assert_eq!(classify_word("99999999999999999999"), Err(codes::PARSER_INVALID_NUMBER));
        assert_eq!(classify_word("17#1#"), Err(codes::PARSER_INVALID_NUMBER));
        assert_eq!(classify_word("12ab"), Err(codes::PARSER_INVALID_NUMBER));
    }

    #[test]
    fn classify_dates_and_times() {
        assert_eq!(
            classify_word("2001-02-03"),
            Ok(ValueData::Date("2001-02-03".into()))
        );
        assert_eq!(classify_word("2001-034"), Ok(ValueData::Date("2001-034".into())));
        assert_eq!(classify_word("12:30"), Ok(ValueData::Time("12:30".into())));
        assert_eq!(
            classify_word("12:30:01.25Z"),
            Ok(ValueData::Time("12:30:01.25Z".into()))
        );
        assert_eq!(
            classify_word("2001-034T12:30:01"),
            Ok(ValueData::DateTime("2001-034T12:30:01".into()))
        );
    }

    #[test]
    fn classify_symbols_and_null() {
        assert_eq!(classify_word("IMAGE"), Ok(ValueData::Symbol("IMAGE".into())));
        assert_eq!(
            classify_word("MRO-M-HIRISE-2-EDR-V1.0"),
            Ok(ValueData::Symbol("MRO-M-HIRISE-2-EDR-V1.0".into()))
        );
        assert_eq!(classify_word("null"), Ok(ValueData::Null));
    }
}
