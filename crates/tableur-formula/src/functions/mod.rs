//! Built-in functions
//!
//! Every function is registered once under its canonical (English) name.
//! French names and other spellings are aliases resolved before lookup, so
//! `SOMME`, `somme` and `SUM` all reach the same [`FunctionDef`].

pub mod criteria;
pub mod logical;
pub mod math;
pub mod statistical;
pub mod text;

use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use tracing::trace;

/// Function implementation signature
pub type FunctionImpl = fn(&[Value]) -> FormulaResult<Value>;

/// How a function is evaluated
#[derive(Clone, Copy)]
pub enum Dispatch {
    /// Arguments are evaluated first, then passed to the implementation
    Eager(FunctionImpl),
    /// Conditional branching, evaluated lazily by the evaluator itself
    Conditional,
    /// Known function that the local evaluator refuses to compute
    Unsupported,
}

/// Function definition
pub struct FunctionDef {
    /// Canonical name (uppercase)
    pub name: &'static str,
    /// Other accepted names (uppercase)
    pub aliases: &'static [&'static str],
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Evaluation strategy
    pub dispatch: Dispatch,
}

impl FunctionDef {
    /// Whether `count` arguments are accepted
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Accepted argument counts, for messages
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }

    /// Whether the function is computed by the local evaluator
    pub fn is_supported(&self) -> bool {
        !matches!(self.dispatch, Dispatch::Unsupported)
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
    aliases: AHashMap<&'static str, &'static str>,
}

static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The process-wide registry of built-in functions
pub fn registry() -> &'static FunctionRegistry {
    &REGISTRY
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
            aliases: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_counting_functions();
        registry.register_text_functions();
        registry.register_lookup_functions();

        registry
    }

    /// Register a function and its aliases
    pub fn register(&mut self, def: FunctionDef) {
        for &alias in def.aliases {
            self.aliases.insert(alias, def.name);
        }
        self.functions.insert(def.name, def);
    }

    /// Canonical name of a function or alias (case-insensitive)
    pub fn canonical_name(&self, name: &str) -> Option<&'static str> {
        let upper = name.to_uppercase();
        if let Some((&canonical, _)) = self.functions.get_key_value(upper.as_str()) {
            return Some(canonical);
        }
        self.aliases.get(upper.as_str()).copied()
    }

    /// Look up a function by name or alias (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.canonical_name(name)
            .and_then(|canonical| self.functions.get(canonical))
    }

    /// Whether the local evaluator computes this function
    pub fn is_supported(&self, name: &str) -> bool {
        self.get(name).is_some_and(FunctionDef::is_supported)
    }

    /// Every accepted name (canonical names and aliases) of computed functions,
    /// sorted
    pub fn supported_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .functions
            .values()
            .filter(|def| def.is_supported())
            .flat_map(|def| std::iter::once(def.name).chain(def.aliases.iter().copied()))
            .collect();
        names.sort_unstable();
        names
    }

    /// Call an eagerly evaluated function with already evaluated arguments
    pub fn call(&self, name: &str, args: &[Value]) -> FormulaResult<Value> {
        let def = self
            .get(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_uppercase()))?;

        let implementation = match def.dispatch {
            Dispatch::Eager(implementation) => implementation,
            Dispatch::Unsupported => return Err(FormulaError::Unsupported(name.to_uppercase())),
            Dispatch::Conditional => {
                return Err(FormulaError::Parse(format!(
                    "{} must be evaluated lazily",
                    name.to_uppercase()
                )))
            }
        };

        if !def.accepts(args.len()) {
            return Err(FormulaError::ArgumentCount {
                function: name.to_uppercase(),
                expected: def.arity(),
                actual: args.len(),
            });
        }

        trace!(function = def.name, args = args.len(), "dispatch");
        implementation(args)
    }

    fn register_math_functions(&mut self) {
        // SUM
        self.register(FunctionDef {
            name: "SUM",
            aliases: &["SOMME"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(math::fn_sum),
        });

        // AVERAGE
        self.register(FunctionDef {
            name: "AVERAGE",
            aliases: &["MOYENNE"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(math::fn_average),
        });

        self.register(FunctionDef {
            name: "MIN",
            aliases: &[],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(math::fn_min),
        });

        self.register(FunctionDef {
            name: "MAX",
            aliases: &[],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(math::fn_max),
        });

        self.register(FunctionDef {
            name: "ABS",
            aliases: &[],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(math::fn_abs),
        });

        // ROUND (digits default to 0)
        self.register(FunctionDef {
            name: "ROUND",
            aliases: &["ARRONDI"],
            min_args: 1,
            max_args: Some(2),
            dispatch: Dispatch::Eager(math::fn_round),
        });

        self.register(FunctionDef {
            name: "TRUNC",
            aliases: &["TRONQUE"],
            min_args: 1,
            max_args: Some(2),
            dispatch: Dispatch::Eager(math::fn_trunc),
        });

        self.register(FunctionDef {
            name: "INT",
            aliases: &["ENT"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(math::fn_int),
        });

        self.register(FunctionDef {
            name: "MOD",
            aliases: &[],
            min_args: 2,
            max_args: Some(2),
            dispatch: Dispatch::Eager(math::fn_mod),
        });

        self.register(FunctionDef {
            name: "SQRT",
            aliases: &["RACINE"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(math::fn_sqrt),
        });

        self.register(FunctionDef {
            name: "POWER",
            aliases: &["PUISSANCE"],
            min_args: 2,
            max_args: Some(2),
            dispatch: Dispatch::Eager(math::fn_power),
        });
    }

    fn register_logical_functions(&mut self) {
        // IF is parsed lazily by the evaluator; the false branch is optional
        self.register(FunctionDef {
            name: "IF",
            aliases: &["SI"],
            min_args: 2,
            max_args: Some(3),
            dispatch: Dispatch::Conditional,
        });

        self.register(FunctionDef {
            name: "AND",
            aliases: &["ET"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(logical::fn_and),
        });

        self.register(FunctionDef {
            name: "OR",
            aliases: &["OU"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(logical::fn_or),
        });

        self.register(FunctionDef {
            name: "NOT",
            aliases: &["NON"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(logical::fn_not),
        });

        self.register(FunctionDef {
            name: "IFERROR",
            aliases: &["SIERREUR"],
            min_args: 1,
            max_args: Some(2),
            dispatch: Dispatch::Eager(logical::fn_iferror),
        });
    }

    fn register_counting_functions(&mut self) {
        self.register(FunctionDef {
            name: "COUNT",
            aliases: &["NB"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(statistical::fn_count),
        });

        self.register(FunctionDef {
            name: "COUNTA",
            aliases: &["NBVAL"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(statistical::fn_counta),
        });

        self.register(FunctionDef {
            name: "COUNTBLANK",
            aliases: &["NB.VIDE"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(statistical::fn_countblank),
        });

        self.register(FunctionDef {
            name: "COUNTIF",
            aliases: &["NB.SI"],
            min_args: 2,
            max_args: Some(2),
            dispatch: Dispatch::Eager(statistical::fn_countif),
        });

        self.register(FunctionDef {
            name: "COUNTIFS",
            aliases: &["NB.SI.ENS"],
            min_args: 2,
            max_args: None,
            dispatch: Dispatch::Eager(statistical::fn_countifs),
        });

        self.register(FunctionDef {
            name: "SUMIF",
            aliases: &["SOMME.SI"],
            min_args: 2,
            max_args: Some(3),
            dispatch: Dispatch::Eager(statistical::fn_sumif),
        });

        self.register(FunctionDef {
            name: "SUMIFS",
            aliases: &["SOMME.SI.ENS"],
            min_args: 3,
            max_args: None,
            dispatch: Dispatch::Eager(statistical::fn_sumifs),
        });

        self.register(FunctionDef {
            name: "AVERAGEIF",
            aliases: &["MOYENNE.SI"],
            min_args: 2,
            max_args: Some(3),
            dispatch: Dispatch::Eager(statistical::fn_averageif),
        });

        self.register(FunctionDef {
            name: "AVERAGEIFS",
            aliases: &["MOYENNE.SI.ENS"],
            min_args: 3,
            max_args: None,
            dispatch: Dispatch::Eager(statistical::fn_averageifs),
        });
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "CONCATENATE",
            aliases: &["CONCATENER", "CONCAT"],
            min_args: 1,
            max_args: None,
            dispatch: Dispatch::Eager(text::fn_concatenate),
        });

        self.register(FunctionDef {
            name: "LEFT",
            aliases: &["GAUCHE"],
            min_args: 1,
            max_args: Some(2),
            dispatch: Dispatch::Eager(text::fn_left),
        });

        self.register(FunctionDef {
            name: "RIGHT",
            aliases: &["DROITE"],
            min_args: 1,
            max_args: Some(2),
            dispatch: Dispatch::Eager(text::fn_right),
        });

        self.register(FunctionDef {
            name: "MID",
            aliases: &["STXT"],
            min_args: 3,
            max_args: Some(3),
            dispatch: Dispatch::Eager(text::fn_mid),
        });

        self.register(FunctionDef {
            name: "UPPER",
            aliases: &["MAJUSCULE"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(text::fn_upper),
        });

        self.register(FunctionDef {
            name: "LOWER",
            aliases: &["MINUSCULE"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(text::fn_lower),
        });

        self.register(FunctionDef {
            name: "PROPER",
            aliases: &["NOMPROPRE"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(text::fn_proper),
        });

        self.register(FunctionDef {
            name: "LEN",
            aliases: &["NBCAR"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(text::fn_len),
        });

        self.register(FunctionDef {
            name: "TRIM",
            aliases: &["SUPPRESPACE"],
            min_args: 1,
            max_args: Some(1),
            dispatch: Dispatch::Eager(text::fn_trim),
        });

        self.register(FunctionDef {
            name: "SUBSTITUTE",
            aliases: &["SUBSTITUE"],
            min_args: 3,
            max_args: Some(4),
            dispatch: Dispatch::Eager(text::fn_substitute),
        });

        // TEXT only stringifies its value; format codes are ignored
        self.register(FunctionDef {
            name: "TEXT",
            aliases: &["TEXTE"],
            min_args: 1,
            max_args: Some(2),
            dispatch: Dispatch::Eager(text::fn_text),
        });
    }

    fn register_lookup_functions(&mut self) {
        let lookups: [(&'static str, &'static [&'static str], usize, usize); 5] = [
            ("VLOOKUP", &["RECHERCHEV"], 3, 4),
            ("HLOOKUP", &["RECHERCHEH"], 3, 4),
            ("XLOOKUP", &["RECHERCHEX"], 3, 6),
            ("INDEX", &[], 2, 3),
            ("MATCH", &["EQUIV"], 2, 3),
        ];
        for (name, aliases, min_args, max_args) in lookups {
            self.register(FunctionDef {
                name,
                aliases,
                min_args,
                max_args: Some(max_args),
                dispatch: Dispatch::Unsupported,
            });
        }
    }
}

/// Flatten arguments into single values; range members become raw texts
pub(crate) fn flatten(args: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::Range(values) => out.extend(values.iter().cloned().map(Value::Text)),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Numbers among the flattened arguments, non-numeric values skipped
pub(crate) fn collect_numbers(args: &[Value]) -> Vec<f64> {
    flatten(args)
        .iter()
        .map(Value::to_number)
        .filter(|n| !n.is_nan())
        .collect()
}

/// Raw texts of an argument used as a range; a scalar is a one-cell range
pub(crate) fn range_texts(arg: &Value) -> FormulaResult<Vec<String>> {
    match arg {
        Value::Range(values) => Ok(values.clone()),
        scalar => Ok(vec![scalar.to_text()?]),
    }
}

/// Argument `index`, or an error naming the function
pub(crate) fn arg<'a>(args: &'a [Value], index: usize, function: &str) -> FormulaResult<&'a Value> {
    args.get(index).ok_or_else(|| {
        FormulaError::Argument(format!("{} is missing argument {}", function, index + 1))
    })
}

/// Single-value argument (ranges rejected) coerced to a number
pub(crate) fn number_arg(args: &[Value], index: usize, function: &str) -> FormulaResult<f64> {
    let value = arg(args, index, function)?;
    if value.is_range() {
        return Err(FormulaError::ArrayInScalar(function.to_string()));
    }
    Ok(value.to_number())
}

/// Single-value argument coerced to text
pub(crate) fn text_arg(args: &[Value], index: usize, function: &str) -> FormulaResult<String> {
    let value = arg(args, index, function)?;
    if value.is_range() {
        return Err(FormulaError::ArrayInScalar(function.to_string()));
    }
    value.to_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_aliases_resolve() {
        let registry = registry();
        assert_eq!(registry.canonical_name("somme"), Some("SUM"));
        assert_eq!(registry.canonical_name("SUM"), Some("SUM"));
        assert_eq!(registry.canonical_name("nb.si.ens"), Some("COUNTIFS"));
        assert_eq!(registry.canonical_name("CONCAT"), Some("CONCATENATE"));
        assert_eq!(registry.canonical_name("RECHERCHEV"), Some("VLOOKUP"));
        assert_eq!(registry.canonical_name("NOPE"), None);
    }

    #[test]
    fn test_call() {
        let registry = registry();
        let result = registry
            .call("SOMME", &[Value::Number(1.0), Value::Number(2.0)])
            .unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_call_errors() {
        let registry = registry();
        assert_eq!(
            registry.call("NOPE", &[]),
            Err(FormulaError::UnknownFunction("NOPE".into()))
        );
        assert_eq!(
            registry.call("RECHERCHEV", &[]),
            Err(FormulaError::Unsupported("RECHERCHEV".into()))
        );
        assert_eq!(
            registry.call("ABS", &[Value::Number(1.0), Value::Number(2.0)]),
            Err(FormulaError::ArgumentCount {
                function: "ABS".into(),
                expected: "1".into(),
                actual: 2,
            })
        );
        assert!(registry.call("SI", &[Value::Boolean(true)]).is_err());
    }

    #[test]
    fn test_supported_names() {
        let names = registry().supported_names();
        assert!(names.contains(&"SOMME"));
        assert!(names.contains(&"IF"));
        assert!(names.contains(&"NB.SI"));
        assert!(!names.contains(&"VLOOKUP"));
        assert!(!names.contains(&"EQUIV"));
    }

    #[test]
    fn test_arity_text() {
        let registry = registry();
        assert_eq!(registry.get("ROUND").unwrap().arity(), "1 to 2");
        assert_eq!(registry.get("SUM").unwrap().arity(), "at least 1");
        assert_eq!(registry.get("MOD").unwrap().arity(), "2");
    }
}
