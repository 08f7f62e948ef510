//! Single-pass formula evaluator
//!
//! The evaluator is a recursive-descent parser that computes values while it
//! parses: there is no intermediate syntax tree. Precedence, loosest first:
//!
//! ```text
//! expression     := additive ( compare additive )*
//! additive       := multiplicative ( ('+' | '-' | '&') multiplicative )*
//! multiplicative := exponent ( ('*' | '/') exponent )*
//! exponent       := unary ( '^' unary )*
//! unary          := '-' primary | primary
//! primary        := number | string | bool | name | cell | range
//!                 | '(' expression ')' | function '(' arguments ')'
//! ```
//!
//! Unary minus applies to the primary before exponentiation, so `-2^2` is 4.
//!
//! `SI`/`IF` is lazy: only the branch selected by the test is evaluated for
//! real. The other branch is still parsed to move past it, but an error raised
//! there is replaced by `#N/A` instead of failing the formula.

use crate::error::{FormulaError, FormulaResult};
use crate::functions::{registry, Dispatch};
use crate::lexer::{CompareOp, Token, TokenKind};
use crate::trace::{Branch, NodeId, TraceBuilder, TraceKind, TraceTree};
use crate::value::{Value, NOT_AVAILABLE};
use tableur_core::{CellRange, Grid, NamedConstants};
use tracing::debug;

/// Evaluates one token stream against a grid and named constants
pub struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    grid: &'a Grid,
    names: &'a NamedConstants,
    trace: Option<TraceBuilder>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator positioned on the first token
    pub fn new(tokens: &'a [Token], grid: &'a Grid, names: &'a NamedConstants) -> Self {
        Self {
            tokens,
            pos: 0,
            grid,
            names,
            trace: None,
        }
    }

    /// Record an evaluation trace while evaluating
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(TraceBuilder::new());
        self
    }

    /// Evaluate the whole token stream to a single value
    pub fn evaluate(&mut self) -> FormulaResult<Value> {
        let value = self.parse_expression()?;
        if let Some(token) = self.peek() {
            return Err(FormulaError::TrailingTokens {
                token: token.raw.clone(),
                offset: token.offset,
            });
        }
        if value.is_range() {
            return Err(FormulaError::ArrayInScalar("the formula result".into()));
        }
        Ok(value)
    }

    /// The trace recorded so far, if tracing was enabled
    pub fn into_trace(self) -> Option<TraceTree> {
        self.trace.map(TraceBuilder::finish)
    }

    fn parse_expression(&mut self) -> FormulaResult<Value> {
        let mut left = self.parse_additive()?;

        while let Some(TokenKind::Compare(op)) = self.peek_kind() {
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Value::Boolean(compare(*op, &left, &right)?);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Value> {
        let mut left = self.parse_multiplicative()?;

        while let Some(op @ ('+' | '-' | '&')) = self.peek_op() {
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = match op {
                '&' => {
                    let mut text = scalar_text(&left, "&")?;
                    text.push_str(&scalar_text(&right, "&")?);
                    Value::Text(text)
                }
                '+' => Value::Number(scalar_number(&left, "+")? + scalar_number(&right, "+")?),
                _ => Value::Number(scalar_number(&left, "-")? - scalar_number(&right, "-")?),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Value> {
        let mut left = self.parse_exponent()?;

        while let Some(op @ ('*' | '/')) = self.peek_op() {
            self.pos += 1;
            let right = self.parse_exponent()?;
            let (l, r) = (
                scalar_number(&left, if op == '*' { "*" } else { "/" })?,
                scalar_number(&right, if op == '*' { "*" } else { "/" })?,
            );
            left = Value::Number(if op == '*' { l * r } else { l / r });
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<Value> {
        let mut left = self.parse_unary()?;

        while self.peek_op() == Some('^') {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Value::Number(scalar_number(&left, "^")?.powf(scalar_number(&right, "^")?));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Value> {
        if self.peek_op() == Some('-') {
            self.pos += 1;
            let operand = self.parse_primary()?;
            return Ok(Value::Number(-scalar_number(&operand, "-")?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<Value> {
        let token = self.peek().ok_or(FormulaError::UnexpectedEnd)?;

        match &token.kind {
            TokenKind::Number(n) => {
                self.pos += 1;
                let value = Value::Number(*n);
                self.trace_leaf(TraceKind::Number, token, &value);
                Ok(value)
            }
            TokenKind::String(s) => {
                self.pos += 1;
                let value = Value::Text(s.clone());
                self.trace_leaf(TraceKind::String, token, &value);
                Ok(value)
            }
            TokenKind::Bool(b) => {
                self.pos += 1;
                let value = Value::Boolean(*b);
                self.trace_leaf(TraceKind::Bool, token, &value);
                Ok(value)
            }
            TokenKind::Name(name) => {
                self.pos += 1;
                let raw = self
                    .names
                    .get(name)
                    .ok_or_else(|| FormulaError::UndefinedName(name.clone()))?;
                let value = Value::from_raw(raw);
                self.trace_leaf(TraceKind::Name { name: name.clone() }, token, &value);
                Ok(value)
            }
            TokenKind::Cell(reference) => {
                self.pos += 1;
                // A0-style references parse as cells but address nothing
                let raw = self.grid.resolve_cell(reference).unwrap_or("");
                let value = Value::from_raw(raw);
                self.trace_leaf(
                    TraceKind::Cell {
                        reference: reference.clone(),
                    },
                    token,
                    &value,
                );
                Ok(value)
            }
            TokenKind::Range(reference) => {
                self.pos += 1;
                let range = CellRange::parse(reference)?;
                let value = Value::Range(self.grid.range_values(range));
                self.trace_leaf(
                    TraceKind::Range {
                        reference: reference.clone(),
                    },
                    token,
                    &value,
                );
                Ok(value)
            }
            TokenKind::LParen => {
                self.pos += 1;
                let value = self.parse_expression()?;
                self.expect("')'", |kind| matches!(kind, TokenKind::RParen))?;
                Ok(value)
            }
            TokenKind::Func(_) => self.parse_function(),
            _ => Err(FormulaError::UnexpectedToken {
                expected: "a value".into(),
                found: token.raw.clone(),
                offset: token.offset,
            }),
        }
    }

    fn parse_function(&mut self) -> FormulaResult<Value> {
        let start = self.pos;
        let name_token = self.expect("a function name", |kind| {
            matches!(kind, TokenKind::Func(_))
        })?;
        let name = match &name_token.kind {
            TokenKind::Func(name) => name.clone(),
            _ => return Err(FormulaError::Parse("expected a function name".into())),
        };
        self.expect("'(' after a function name", |kind| {
            matches!(kind, TokenKind::LParen)
        })?;

        if let Some(Dispatch::Conditional) = registry().get(&name).map(|def| def.dispatch) {
            let value = self.parse_conditional(&name)?;
            self.expect("')'", |kind| matches!(kind, TokenKind::RParen))?;
            return Ok(value);
        }

        self.trace_open(TraceKind::Function { name: name.clone() });

        let mut args = Vec::new();
        if !matches!(self.peek_kind(), Some(TokenKind::RParen)) {
            loop {
                args.push(self.parse_argument(args.len())?);
                if matches!(self.peek_kind(), Some(TokenKind::Sep)) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect("')' or a separator", |kind| {
            matches!(kind, TokenKind::RParen)
        })?;

        let result = registry().call(&name, &args)?;
        let raw = self.raw_slice(start, self.pos);
        self.trace_close(raw, &result);
        Ok(result)
    }

    fn parse_argument(&mut self, index: usize) -> FormulaResult<Value> {
        self.trace_open(TraceKind::FnArg { index });
        let start = self.pos;
        let value = self.parse_expression()?;
        let raw = self.raw_slice(start, self.pos);
        self.trace_close(raw, &value);
        Ok(value)
    }

    /// `SI(test; if_true; [if_false])`, cursor just after the '('
    fn parse_conditional(&mut self, name: &str) -> FormulaResult<Value> {
        self.trace_open(TraceKind::Si);

        self.trace_open(TraceKind::SiCondition);
        let test_start = self.pos;
        let condition = self.parse_expression()?;
        let test_raw = self.raw_slice(test_start, self.pos);
        self.trace_close(test_raw.clone(), &condition);

        self.expect("a separator after the test", |kind| {
            matches!(kind, TokenKind::Sep)
        })?;
        let taken = condition.is_truthy();

        let (if_true, true_raw) = self.parse_branch(Branch::IfTrue, taken)?;

        let (if_false, false_raw) = if matches!(self.peek_kind(), Some(TokenKind::Sep)) {
            self.pos += 1;
            self.parse_branch(Branch::IfFalse, !taken)?
        } else {
            // omitted false branch: FAUX, still traced as an empty branch
            let value = Value::Boolean(false);
            self.trace_open(TraceKind::SiBranch {
                branch: Branch::IfFalse,
                active: !taken,
            });
            self.trace_close(String::new(), &value);
            (value, String::new())
        };

        let result = if taken { if_true } else { if_false };

        let mut raw = format!("{}({};{}", name, test_raw, true_raw);
        if !false_raw.is_empty() {
            raw.push(';');
            raw.push_str(&false_raw);
        }
        raw.push(')');

        if let Some(id) = self.trace_close(raw, &result) {
            if let Some(trace) = self.trace.as_mut() {
                trace.set_condition(id, condition);
            }
        }

        Ok(result)
    }

    /// One branch of a conditional. Evaluation errors in an inactive branch
    /// are replaced by `#N/A` and the cursor jumps to the end of the branch.
    /// Syntax errors always propagate.
    fn parse_branch(&mut self, branch: Branch, active: bool) -> FormulaResult<(Value, String)> {
        let scope = self.trace_open(TraceKind::SiBranch { branch, active });
        let start = self.pos;

        let value = if active {
            self.parse_expression()?
        } else {
            let end = self.branch_end(start);
            match self.parse_expression() {
                Ok(value) => value,
                Err(err) if err.is_syntax() => return Err(err),
                Err(err) => {
                    debug!(error = %err, "error in the untaken branch replaced by {}", NOT_AVAILABLE);
                    self.pos = end;
                    if let (Some(trace), Some(scope)) = (self.trace.as_mut(), scope) {
                        trace.unwind_to(scope);
                    }
                    Value::Text(NOT_AVAILABLE.to_string())
                }
            }
        };

        let raw = self.raw_slice(start, self.pos);
        self.trace_close(raw.clone(), &value);
        Ok((value, raw))
    }

    /// Index of the separator or ')' that ends the argument starting at
    /// `start`, skipping nested parentheses
    fn branch_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(start) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen if depth == 0 => return i,
                TokenKind::RParen => depth -= 1,
                TokenKind::Sep if depth == 0 => return i,
                _ => {}
            }
        }
        self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn peek_op(&self) -> Option<char> {
        match self.peek_kind() {
            Some(TokenKind::Op(c)) => Some(*c),
            _ => None,
        }
    }

    /// Consume the next token if `accept` approves its kind
    fn expect(
        &mut self,
        expected: &str,
        accept: impl Fn(&TokenKind) -> bool,
    ) -> FormulaResult<&'a Token> {
        match self.peek() {
            Some(token) if accept(&token.kind) => {
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(FormulaError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.raw.clone(),
                offset: token.offset,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    /// Source text of tokens `start..end`
    fn raw_slice(&self, start: usize, end: usize) -> String {
        self.tokens[start..end.min(self.tokens.len())]
            .iter()
            .map(|token| token.raw.as_str())
            .collect()
    }

    fn trace_leaf(&mut self, kind: TraceKind, token: &Token, value: &Value) {
        if let Some(trace) = self.trace.as_mut() {
            trace.add_leaf(kind, token.raw.clone(), value.clone());
        }
    }

    fn trace_open(&mut self, kind: TraceKind) -> Option<NodeId> {
        self.trace.as_mut().map(|trace| trace.open_scope(kind))
    }

    fn trace_close(&mut self, raw: String, value: &Value) -> Option<NodeId> {
        self.trace
            .as_mut()
            .and_then(|trace| trace.close_scope(raw, Some(value.clone())))
    }
}

/// Number of a single value; ranges are rejected
fn scalar_number(value: &Value, operator: &str) -> FormulaResult<f64> {
    if value.is_range() {
        return Err(FormulaError::ArrayInScalar(format!(
            "the '{}' operator",
            operator
        )));
    }
    Ok(value.to_number())
}

/// Text of a single value; ranges are rejected
fn scalar_text(value: &Value, operator: &str) -> FormulaResult<String> {
    if value.is_range() {
        return Err(FormulaError::ArrayInScalar(format!(
            "the '{}' operator",
            operator
        )));
    }
    value.to_text()
}

/// Numeric comparison when both sides are numbers, case-insensitive text
/// comparison otherwise
fn compare(op: CompareOp, left: &Value, right: &Value) -> FormulaResult<bool> {
    let l = scalar_number(left, op.as_str())?;
    let r = scalar_number(right, op.as_str())?;

    if !l.is_nan() && !r.is_nan() {
        return Ok(match op {
            CompareOp::Eq => l == r,
            CompareOp::Ne => l != r,
            CompareOp::Lt => l < r,
            CompareOp::Le => l <= r,
            CompareOp::Gt => l > r,
            CompareOp::Ge => l >= r,
        });
    }

    let l = scalar_text(left, op.as_str())?.to_lowercase();
    let r = scalar_text(right, op.as_str())?.to_lowercase();
    Ok(match op {
        CompareOp::Eq => l == r,
        CompareOp::Ne => l != r,
        CompareOp::Lt => l < r,
        CompareOp::Le => l <= r,
        CompareOp::Gt => l > r,
        CompareOp::Ge => l >= r,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn grid() -> Grid {
        Grid::from(vec![
            vec!["15", "0", "Paris"],
            vec!["8", "2", "lyon"],
            vec!["22", "", "VRAI"],
            vec!["5", "3,5", ""],
        ])
    }

    fn eval_with(formula: &str, grid: &Grid, names: &NamedConstants) -> FormulaResult<Value> {
        let tokens = tokenize(formula, names);
        Evaluator::new(&tokens, grid, names).evaluate()
    }

    fn eval(formula: &str) -> FormulaResult<Value> {
        eval_with(formula, &grid(), &NamedConstants::new())
    }

    fn num(formula: &str) -> f64 {
        match eval(formula) {
            Ok(Value::Number(n)) => n,
            other => panic!("{} did not evaluate to a number: {:?}", formula, other),
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(num("1+2*3"), 7.0);
        assert_eq!(num("(1+2)*3"), 9.0);
        assert_eq!(num("10/4"), 2.5);
        assert_eq!(num("2^3^2"), 64.0);
        assert_eq!(num("7-2-1"), 4.0);
        assert_eq!(num("A1+B2"), 17.0);
        assert_eq!(num("B4*2"), 7.0);
    }

    #[test]
    fn test_unary_minus_binds_before_power() {
        assert_eq!(num("-2^2"), 4.0);
        assert_eq!(num("-A1"), -15.0);
        assert_eq!(num("3*-2"), -6.0);
        assert_eq!(num("-(1+2)"), -3.0);
    }

    #[test]
    fn test_non_numeric_arithmetic_is_nan() {
        assert!(num("C1+1").is_nan());
        assert!(num("B3+1").is_nan());
        assert!(num("1/0").is_infinite());
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(eval("C1&\" \"&A1"), Ok(Value::Text("Paris 15".into())));
        assert_eq!(eval("\"x\"&VRAI"), Ok(Value::Text("xVRAI".into())));
        assert_eq!(eval("1,5&\"\""), Ok(Value::Text("1.5".into())));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("A1>10"), Ok(Value::Boolean(true)));
        assert_eq!(eval("A2>=10"), Ok(Value::Boolean(false)));
        assert_eq!(eval("A1=15"), Ok(Value::Boolean(true)));
        assert_eq!(eval("C1=\"PARIS\""), Ok(Value::Boolean(true)));
        assert_eq!(eval("C1<>\"paris\""), Ok(Value::Boolean(false)));
        assert_eq!(eval("C1>C2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("B3=\"\""), Ok(Value::Boolean(true)));
        assert_eq!(eval("VRAI=1"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_named_constants() {
        let mut names = NamedConstants::new();
        names.define("TauxTVA", "0,2").unwrap();
        names.define("Ville", "Paris").unwrap();
        let g = grid();
        assert_eq!(
            eval_with("A1*(1+tauxtva)", &g, &names),
            Ok(Value::Number(15.0 * 1.2))
        );
        assert_eq!(
            eval_with("VILLE=C1", &g, &names),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn test_functions() {
        assert_eq!(num("SOMME(A1;A2;A3;A4)"), 50.0);
        assert_eq!(num("SUM(A1:A4)"), 50.0);
        assert_eq!(num("moyenne(A1:A4)"), 12.5);
        assert_eq!(num("NB.SI(A1:A4;\">10\")"), 2.0);
        assert_eq!(num("SOMME.SI(A1:A4;\">=8\";B1:B4)"), 2.0 + 0.0);
        assert_eq!(num("ARRONDI(A1/7;2)"), 2.14);
        assert_eq!(eval("MAJUSCULE(C1)"), Ok(Value::Text("PARIS".into())));
        assert_eq!(eval("ET(A1>10;A2<10)"), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_nested_functions() {
        assert_eq!(num("SOMME(MAX(A1:A4);MIN(A1:A4))"), 27.0);
        assert_eq!(
            eval("CONCATENER(GAUCHE(C1;3);\"-\";NBCAR(C2))"),
            Ok(Value::Text("Par-4".into()))
        );
    }

    #[test]
    fn test_si() {
        assert_eq!(eval("SI(A1>10;\"Grand\";\"Petit\")"), Ok(Value::Text("Grand".into())));
        assert_eq!(eval("SI(A4>10;\"Grand\";\"Petit\")"), Ok(Value::Text("Petit".into())));
        assert_eq!(eval("IF(A4>10;\"Grand\")"), Ok(Value::Boolean(false)));
        assert_eq!(
            eval("SI(ET(A1>=10;A1<20);\"Bien\";SI(A1>=20;\"Excellent\";\"Insuffisant\"))"),
            Ok(Value::Text("Bien".into()))
        );
    }

    #[test]
    fn test_si_is_lazy() {
        // B1 is 0: the division is never evaluated
        assert_eq!(num("SI(B1=0;0;A1/B1)"), 0.0);
        // evaluation errors in the untaken branch are swallowed
        assert_eq!(num("SI(VRAI;1;RECHERCHEV(A1;A1:B2;2))"), 1.0);
        assert_eq!(num("SI(FAUX;NOPE(1);2)"), 2.0);
        // but not in the taken one
        assert!(eval("SI(FAUX;1;RECHERCHEV(A1;A1:B2;2))").is_err());
        // a malformed branch fails whether taken or not
        assert!(matches!(
            eval("SI(FAUX;SOMME(1;)+2;3)"),
            Err(FormulaError::UnexpectedToken { .. })
        ));
        assert!(eval("SI(VRAI;1;+)").is_err());
        assert!(eval("SI(VRAI;1;2 3)").is_err());
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval(""), Err(FormulaError::UnexpectedEnd));
        assert_eq!(eval("1+"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(eval("SOMME(1;2"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(
            eval("1 2"),
            Err(FormulaError::TrailingTokens { .. })
        ));
        assert!(matches!(
            eval("(1;2)"),
            Err(FormulaError::UnexpectedToken { .. })
        ));
        assert_eq!(
            eval("NOPE(1)"),
            Err(FormulaError::UnknownFunction("NOPE".into()))
        );
        assert_eq!(
            eval("VLOOKUP(1;A1:B2;2)"),
            Err(FormulaError::Unsupported("VLOOKUP".into()))
        );
        assert!(matches!(
            eval("ABS(1;2)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
        assert!(matches!(
            eval("SI(1;2;3;4)"),
            Err(FormulaError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_ranges_rejected_in_scalar_context() {
        assert!(matches!(eval("A1:A2+1"), Err(FormulaError::ArrayInScalar(_))));
        assert!(matches!(eval("A1:A2"), Err(FormulaError::ArrayInScalar(_))));
        assert!(matches!(eval("-A1:A2"), Err(FormulaError::ArrayInScalar(_))));
    }

    #[test]
    fn test_trace_structure() {
        let g = grid();
        let names = NamedConstants::new();
        let tokens = tokenize("SI(A1>10;SOMME(A1;2);\"non\")", &names);
        let mut evaluator = Evaluator::new(&tokens, &g, &names).with_trace();
        assert_eq!(evaluator.evaluate(), Ok(Value::Number(17.0)));
        let tree = evaluator.into_trace().unwrap();

        let si = tree.children(tree.root())[0];
        let si_node = tree.node(si).unwrap();
        assert_eq!(si_node.kind, TraceKind::Si);
        assert_eq!(si_node.raw, "SI(A1>10;SOMME(A1;2);\"non\")");
        assert_eq!(si_node.condition, Some(Value::Boolean(true)));

        let parts = tree.children(si);
        assert_eq!(parts.len(), 3);
        assert_eq!(tree.node(parts[0]).unwrap().kind, TraceKind::SiCondition);
        assert_eq!(
            tree.node(parts[1]).unwrap().kind,
            TraceKind::SiBranch {
                branch: Branch::IfTrue,
                active: true
            }
        );
        assert_eq!(
            tree.node(parts[2]).unwrap().kind,
            TraceKind::SiBranch {
                branch: Branch::IfFalse,
                active: false
            }
        );
        // A1, 10, A1, 2, "non"
        assert_eq!(tree.leaf_count(), 5);
    }

    #[test]
    fn test_trace_unwinds_swallowed_errors() {
        let g = grid();
        let names = NamedConstants::new();
        let tokens = tokenize("SI(VRAI;1;SOMME(NOPE(1);2))+1", &names);
        let mut evaluator = Evaluator::new(&tokens, &g, &names).with_trace();
        assert_eq!(evaluator.evaluate(), Ok(Value::Number(2.0)));
        let tree = evaluator.into_trace().unwrap();

        // the '1' after the conditional lands at the root, not in an abandoned scope
        let top: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&id| tree.node(id).unwrap().kind.clone())
            .collect();
        assert_eq!(top, vec![TraceKind::Si, TraceKind::Number]);

        let si = tree.children(tree.root())[0];
        let false_branch = tree.node(tree.children(si)[2]).unwrap();
        assert_eq!(false_branch.result, Some(Value::Text("#N/A".into())));
        assert_eq!(false_branch.raw, "SOMME(NOPE(1);2)");
    }

    #[test]
    fn test_trace_omitted_false_branch() {
        let g = grid();
        let names = NamedConstants::new();
        let tokens = tokenize("SI(FAUX;1)", &names);
        let mut evaluator = Evaluator::new(&tokens, &g, &names).with_trace();
        assert_eq!(evaluator.evaluate(), Ok(Value::Boolean(false)));
        let tree = evaluator.into_trace().unwrap();
        let si = tree.children(tree.root())[0];
        let branches: Vec<_> = tree.children(si)[1..]
            .iter()
            .map(|&id| tree.node(id).unwrap())
            .collect();
        assert_eq!(branches.len(), 2);
        assert_eq!(
            branches[1].kind,
            TraceKind::SiBranch {
                branch: Branch::IfFalse,
                active: true
            }
        );
        assert_eq!(branches[1].raw, "");
        assert_eq!(tree.node(si).unwrap().raw, "SI(FAUX;1)");
    }
}
