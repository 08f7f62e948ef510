//! Static formula checks
//!
//! The linter never evaluates anything. It looks at the text and the token
//! stream of a formula and reports likely mistakes (unbalanced parentheses,
//! misspelled functions, wrong argument counts) as advisory diagnostics, in
//! French like the rest of the student-facing output.

use crate::catalog::{self, ArgType};
use crate::lexer::{Lexer, Token, TokenKind};
use lazy_regex::{regex_is_match, regex_replace_all};
use std::fmt;
use tableur_core::NamedConstants;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// The formula cannot be right as written
    Error,
    /// Probably a mistake
    Warning,
    /// Worth a look
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// One lint finding
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// How serious the finding is
    pub severity: Severity,
    /// Human-readable explanation, in French
    pub message: String,
}

impl Diagnostic {
    /// A finding that keeps the formula from working
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// A likely mistake that still evaluates
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// A remark, such as a name the evaluator will need defined
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// A function call found in the token stream
struct Call<'t> {
    /// Name as typed
    name: &'t str,
    /// Source text of each argument, empty for a missing argument
    args: Vec<String>,
}

/// Lint a formula. Text that does not start with `=` is a plain value and
/// yields nothing.
pub fn lint_formula(formula: &str, names: &NamedConstants) -> Vec<Diagnostic> {
    let Some(body) = formula.strip_prefix('=') else {
        return Vec::new();
    };
    let mut diagnostics = Vec::new();

    check_parentheses(body, &mut diagnostics);

    let blanked = blank_strings(body);
    if blanked.contains(";;") {
        diagnostics.push(Diagnostic::warning("Double point-virgule (;;)"));
    }
    if blanked.contains(",,") {
        diagnostics.push(Diagnostic::warning("Double virgule (,,)"));
    }
    if regex_is_match!(r"[;,]\s*\)", &blanked) {
        diagnostics.push(Diagnostic::warning(
            "Séparateur avant ) : argument manquant ?",
        ));
    }
    if blanked.contains(")(") {
        diagnostics.push(Diagnostic::warning(
            "Parenthèses adjacentes )( : opérateur manquant ?",
        ));
    }

    if body.matches('"').count() % 2 != 0 {
        diagnostics.push(Diagnostic::error("Guillemet non fermé"));
    }

    let mut lexer = Lexer::new(body, names);
    let tokens = lexer.tokenize();
    for skipped in lexer.skipped() {
        diagnostics.push(Diagnostic::warning(format!(
            "Caractère « {} » ignoré (position {})",
            skipped.ch,
            char_position(body, skipped.offset)
        )));
    }

    check_identifiers(&tokens, &mut diagnostics);

    for call in function_calls(&tokens) {
        check_call(&call, names, &mut diagnostics);
    }

    diagnostics
}

/// Balance of parentheses outside string literals. Positions are 1-based in
/// the full formula, `=` included.
fn check_parentheses(body: &str, diagnostics: &mut Vec<Diagnostic>) {
    let mut depth = 0usize;
    let mut in_string = false;

    for (i, c) in body.chars().enumerate() {
        match c {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' => depth += 1,
            ')' if depth == 0 => diagnostics.push(Diagnostic::error(format!(
                "Parenthèse fermante en trop (position {})",
                i + 2
            ))),
            ')' => depth -= 1,
            _ => {}
        }
    }

    if depth > 0 {
        diagnostics.push(Diagnostic::error(format!(
            "{} parenthèse(s) ouvrante(s) non fermée(s)",
            depth
        )));
    }
}

/// The body with every closed string literal replaced by spaces of the same
/// byte length
fn blank_strings(body: &str) -> String {
    regex_replace_all!(r#""[^"]*""#, body, |literal: &str| " ".repeat(literal.len())).into_owned()
}

/// 1-based position in the full formula of a byte offset in the body
fn char_position(body: &str, offset: usize) -> usize {
    body.get(..offset).map_or(offset, |prefix| prefix.chars().count()) + 2
}

/// Identifiers that are neither cells, booleans, known names nor calls end up
/// as function tokens without a '(' after them
fn check_identifiers(tokens: &[Token], diagnostics: &mut Vec<Diagnostic>) {
    for (i, token) in tokens.iter().enumerate() {
        if !matches!(token.kind, TokenKind::Func(_)) || is_call(tokens, i) {
            continue;
        }
        let word = token.raw.as_str();
        if word.chars().count() <= 2 || catalog::lookup(word).is_some() {
            continue;
        }
        diagnostics.push(Diagnostic::info(format!(
            "« {} » : nom non défini ? Ajoutez-le aux constantes nommées.",
            word
        )));
    }
}

fn is_call(tokens: &[Token], i: usize) -> bool {
    matches!(
        tokens.get(i + 1).map(|t| &t.kind),
        Some(TokenKind::LParen)
    )
}

/// Every complete `NAME(...)` call, outermost first
fn function_calls(tokens: &[Token]) -> Vec<Call<'_>> {
    let mut calls = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if !matches!(token.kind, TokenKind::Func(_)) || !is_call(tokens, i) {
            continue;
        }

        let mut depth = 0usize;
        let mut args = vec![String::new()];
        let mut closed = false;
        for inner in &tokens[i + 2..] {
            match inner.kind {
                TokenKind::RParen if depth == 0 => {
                    closed = true;
                    break;
                }
                TokenKind::Sep if depth == 0 => {
                    args.push(String::new());
                    continue;
                }
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            if let Some(current) = args.last_mut() {
                current.push_str(&inner.raw);
            }
        }

        if !closed {
            continue;
        }
        if args.len() == 1 && args[0].is_empty() {
            args.clear();
        }
        calls.push(Call {
            name: &token.raw,
            args,
        });
    }

    calls
}

fn check_call(call: &Call<'_>, names: &NamedConstants, diagnostics: &mut Vec<Diagnostic>) {
    let Some(descriptor) = catalog::lookup(call.name) else {
        let message = match catalog::suggest(call.name) {
            Some(close) => format!("« {} » : vouliez-vous dire {} ?", call.name, close.name),
            None => format!("Fonction « {} » non reconnue", call.name),
        };
        diagnostics.push(Diagnostic::info(message));
        return;
    };

    let argc = call.args.len();
    if argc < descriptor.min_args {
        diagnostics.push(Diagnostic::error(format!(
            "{}() attend au moins {} argument(s), {} fourni(s)\n↳ {}",
            call.name, descriptor.min_args, argc, descriptor.syntax
        )));
    } else if argc > descriptor.max_args {
        diagnostics.push(Diagnostic::error(format!(
            "{}() attend au plus {} argument(s), {} fourni(s)\n↳ {}",
            call.name, descriptor.max_args, argc, descriptor.syntax
        )));
    }

    if argc == 0 || argc < descriptor.min_args {
        return;
    }

    for (i, arg) in call.args.iter().enumerate() {
        let Some(expected) = descriptor.expected_type(i) else {
            continue;
        };
        if arg.is_empty()
            || regex_is_match!(r"^\$?[A-Za-z]+\$?\d+", arg)
            || arg.contains([':', '('])
            || names.contains(arg)
        {
            continue;
        }

        let quoted = regex_is_match!(r#"^".*"$"#s, arg);
        let number = regex_is_match!(r"^-?\d+([.,]\d+)?$", arg);

        match expected {
            ArgType::Number if quoted => diagnostics.push(Diagnostic::warning(format!(
                "{}() argument {} : nombre attendu, texte fourni ({})\n↳ {}",
                call.name,
                i + 1,
                arg,
                descriptor.syntax
            ))),
            ArgType::Text if number => diagnostics.push(Diagnostic::info(format!(
                "{}() argument {} : texte attendu, nombre fourni ({})",
                call.name,
                i + 1,
                arg
            ))),
            ArgType::Logical if quoted || number => diagnostics.push(Diagnostic::info(format!(
                "{}() argument {} : condition logique attendue, {} fourni",
                call.name,
                i + 1,
                if quoted { "texte" } else { "nombre" }
            ))),
            _ => {}
        }
    }
}
