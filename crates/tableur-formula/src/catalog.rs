//! Function catalog
//!
//! Static descriptions of the spreadsheet functions a student may type, in
//! French and English: arity, argument kinds, syntax and a short description.
//! The catalog is wider than what the evaluator computes (dates, random
//! numbers and ranking are described but not evaluated); the linter uses it to
//! check calls and suggest names.
//!
//! Argument kinds are written as a compact signature, one letter per argument:
//! `n` number, `s` text, `b` logical test, `r` range, `a` anything. A trailing
//! `*` marks a repeating tail: the last letter repeats, or the last two when
//! the signature has several letters (`rs*` is range, criteria, range,
//! criteria, ...).

use ahash::AHashMap;
use once_cell::sync::Lazy;
use std::fmt;

/// Function family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Category {
    Math,
    Logical,
    Counting,
    ConditionalAggregate,
    Lookup,
    Text,
    Date,
    Statistics,
}

impl Category {
    /// French label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Math => "Maths",
            Category::Logical => "Logique",
            Category::Counting => "Comptage",
            Category::ConditionalAggregate => "Somme conditionnelle",
            Category::Lookup => "Recherche",
            Category::Text => "Texte",
            Category::Date => "Date",
            Category::Statistics => "Stats",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of value an argument expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ArgType {
    Number,
    Text,
    Logical,
    Range,
    Any,
}

impl ArgType {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'n' => Some(ArgType::Number),
            's' => Some(ArgType::Text),
            'b' => Some(ArgType::Logical),
            'r' => Some(ArgType::Range),
            'a' => Some(ArgType::Any),
            _ => None,
        }
    }
}

/// Static description of one function name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FunctionDescriptor {
    /// Uppercase name as typed
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    /// Compact signature, e.g. `rsr` or `n*`
    pub signature: &'static str,
    /// Usage line, separators in the language of the name
    pub syntax: &'static str,
    pub description: &'static str,
    pub category: Category,
}

impl FunctionDescriptor {
    /// Decoded argument kinds, without the repeating tail
    pub fn arg_types(&self) -> Vec<ArgType> {
        self.signature.chars().filter_map(ArgType::from_code).collect()
    }

    /// Whether the signature ends with a repeating tail
    pub fn is_variadic(&self) -> bool {
        self.signature.ends_with('*')
    }

    /// Expected kind of the argument at `index` (0-based)
    pub fn expected_type(&self, index: usize) -> Option<ArgType> {
        let types = self.arg_types();
        if let Some(&kind) = types.get(index) {
            return Some(kind);
        }
        if !self.is_variadic() || types.is_empty() {
            return None;
        }
        let unit = types.len().min(2);
        let tail = &types[types.len() - unit..];
        Some(tail[(index - types.len()) % unit])
    }

    /// Whether `count` arguments satisfy the arity
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && count <= self.max_args
    }
}

const fn entry(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    signature: &'static str,
    syntax: &'static str,
    description: &'static str,
    category: Category,
) -> FunctionDescriptor {
    FunctionDescriptor {
        name,
        min_args,
        max_args,
        signature,
        syntax,
        description,
        category,
    }
}

use Category::*;

static DESCRIPTORS: &[FunctionDescriptor] = &[
    // maths
    entry("SOMME", 1, 255, "n*", "SOMME(nombre1; [nombre2]; ...)", "Additionne des valeurs", Math),
    entry("SUM", 1, 255, "n*", "SUM(number1, [number2], ...)", "Adds values", Math),
    entry("MOYENNE", 1, 255, "n*", "MOYENNE(nombre1; [nombre2]; ...)", "Calcule la moyenne", Math),
    entry("AVERAGE", 1, 255, "n*", "AVERAGE(number1, [number2], ...)", "Calculates the average", Math),
    entry("MAX", 1, 255, "n*", "MAX(nombre1; [nombre2]; ...)", "Retourne la valeur maximale", Math),
    entry("MIN", 1, 255, "n*", "MIN(nombre1; [nombre2]; ...)", "Retourne la valeur minimale", Math),
    entry("ARRONDI", 2, 2, "nn", "ARRONDI(nombre; nb_chiffres)", "Arrondit un nombre", Math),
    entry("ROUND", 2, 2, "nn", "ROUND(number, num_digits)", "Rounds a number", Math),
    entry("TRONQUE", 1, 2, "nn", "TRONQUE(nombre; [nb_chiffres])", "Tronque un nombre", Math),
    entry("TRUNC", 1, 2, "nn", "TRUNC(number, [num_digits])", "Truncates a number", Math),
    entry("ENT", 1, 1, "n", "ENT(nombre)", "Partie entière", Math),
    entry("INT", 1, 1, "n", "INT(number)", "Integer part", Math),
    entry("MOD", 2, 2, "nn", "MOD(nombre; diviseur)", "Reste de la division", Math),
    entry("ABS", 1, 1, "n", "ABS(nombre)", "Valeur absolue", Math),
    entry("RACINE", 1, 1, "n", "RACINE(nombre)", "Racine carrée", Math),
    entry("SQRT", 1, 1, "n", "SQRT(number)", "Square root", Math),
    entry("PUISSANCE", 2, 2, "nn", "PUISSANCE(nombre; puissance)", "Élève à la puissance", Math),
    entry("POWER", 2, 2, "nn", "POWER(number, power)", "Raises to a power", Math),
    entry("ALEA", 0, 0, "", "ALEA()", "Nombre aléatoire entre 0 et 1", Math),
    entry("RAND", 0, 0, "", "RAND()", "Random number 0-1", Math),
    entry("ALEA.ENTRE.BORNES", 2, 2, "nn", "ALEA.ENTRE.BORNES(min; max)", "Entier aléatoire entre bornes", Math),
    entry("RANDBETWEEN", 2, 2, "nn", "RANDBETWEEN(bottom, top)", "Random integer between bounds", Math),

    // logique
    entry("SI", 3, 3, "baa", "SI(test_logique; valeur_si_vrai; valeur_si_faux)", "Condition si/alors/sinon", Logical),
    entry("IF", 3, 3, "baa", "IF(logical_test, value_if_true, value_if_false)", "If/then/else condition", Logical),
    entry("ET", 1, 255, "b*", "ET(logique1; [logique2]; ...)", "VRAI si toutes les conditions sont vraies", Logical),
    entry("AND", 1, 255, "b*", "AND(logical1, [logical2], ...)", "TRUE if all conditions are true", Logical),
    entry("OU", 1, 255, "b*", "OU(logique1; [logique2]; ...)", "VRAI si au moins une condition est vraie", Logical),
    entry("OR", 1, 255, "b*", "OR(logical1, [logical2], ...)", "TRUE if any condition is true", Logical),
    entry("NON", 1, 1, "b", "NON(valeur_logique)", "Inverse une valeur logique", Logical),
    entry("NOT", 1, 1, "b", "NOT(logical)", "Inverts a logical value", Logical),
    entry("SIERREUR", 2, 2, "aa", "SIERREUR(valeur; valeur_si_erreur)", "Retourne une valeur si erreur", Logical),
    entry("IFERROR", 2, 2, "aa", "IFERROR(value, value_if_error)", "Returns value if error", Logical),
    entry("IFS", 2, 254, "ba*", "IFS(test1; valeur1; [test2; valeur2]; ...)", "Conditions multiples", Logical),
    entry("SWITCH", 3, 254, "aaa*", "SWITCH(expression; val1; res1; ...)", "Compare une expression à des valeurs", Logical),

    // comptage
    entry("NB", 1, 255, "a*", "NB(valeur1; [valeur2]; ...)", "Compte les cellules numériques", Counting),
    entry("COUNT", 1, 255, "a*", "COUNT(value1, [value2], ...)", "Counts numeric cells", Counting),
    entry("NBVAL", 1, 255, "a*", "NBVAL(valeur1; [valeur2]; ...)", "Compte les cellules non vides", Counting),
    entry("COUNTA", 1, 255, "a*", "COUNTA(value1, [value2], ...)", "Counts non-empty cells", Counting),
    entry("NB.VIDE", 1, 1, "r", "NB.VIDE(plage)", "Compte les cellules vides", Counting),
    entry("COUNTBLANK", 1, 1, "r", "COUNTBLANK(range)", "Counts blank cells", Counting),
    entry("NB.SI", 2, 2, "rs", "NB.SI(plage; critère)", "Compte selon un critère", Counting),
    entry("COUNTIF", 2, 2, "rs", "COUNTIF(range, criteria)", "Counts by criteria", Counting),
    entry("NB.SI.ENS", 2, 254, "rs*", "NB.SI.ENS(plage1; critère1; ...)", "Compte selon plusieurs critères", Counting),
    entry("COUNTIFS", 2, 254, "rs*", "COUNTIFS(range1, criteria1, ...)", "Counts by multiple criteria", Counting),

    // somme conditionnelle
    entry("SOMME.SI", 2, 3, "rsr", "SOMME.SI(plage; critère; [somme_plage])", "Somme conditionnelle", ConditionalAggregate),
    entry("SUMIF", 2, 3, "rsr", "SUMIF(range, criteria, [sum_range])", "Conditional sum", ConditionalAggregate),
    entry("SOMME.SI.ENS", 3, 254, "rrs*", "SOMME.SI.ENS(somme_plage; plage1; critère1; ...)", "Somme multi-critères", ConditionalAggregate),
    entry("SUMIFS", 3, 254, "rrs*", "SUMIFS(sum_range, range1, criteria1, ...)", "Multi-criteria sum", ConditionalAggregate),
    entry("MOYENNE.SI", 2, 3, "rsr", "MOYENNE.SI(plage; critère; [moy_plage])", "Moyenne conditionnelle", ConditionalAggregate),
    entry("AVERAGEIF", 2, 3, "rsr", "AVERAGEIF(range, criteria, [avg_range])", "Conditional average", ConditionalAggregate),
    entry("MOYENNE.SI.ENS", 3, 254, "rrs*", "MOYENNE.SI.ENS(moy_plage; plage1; critère1; ...)", "Moyenne multi-critères", ConditionalAggregate),
    entry("AVERAGEIFS", 3, 254, "rrs*", "AVERAGEIFS(avg_range, range1, criteria1, ...)", "Multi-criteria average", ConditionalAggregate),

    // recherche
    entry("RECHERCHEV", 3, 4, "rrnb", "RECHERCHEV(valeur; table; col; [approx])", "Recherche verticale", Lookup),
    entry("VLOOKUP", 3, 4, "rrnb", "VLOOKUP(value, table, col, [approx])", "Vertical lookup", Lookup),
    entry("RECHERCHEH", 3, 4, "rrnb", "RECHERCHEH(valeur; table; ligne; [approx])", "Recherche horizontale", Lookup),
    entry("HLOOKUP", 3, 4, "rrnb", "HLOOKUP(value, table, row, [approx])", "Horizontal lookup", Lookup),
    entry("RECHERCHEX", 3, 6, "rrraan", "RECHERCHEX(cherché; plage_recherche; plage_résultat; [défaut]; [mode]; [recherche])", "Recherche moderne (XLOOKUP)", Lookup),
    entry("XLOOKUP", 3, 6, "rrraan", "XLOOKUP(lookup, lookup_range, return_range, [default], [match], [search])", "Modern lookup", Lookup),
    entry("INDEX", 2, 3, "rnn", "INDEX(tableau; ligne; [colonne])", "Valeur à une position", Lookup),
    entry("EQUIV", 2, 3, "arn", "EQUIV(valeur; plage; [type])", "Position d'une valeur", Lookup),
    entry("MATCH", 2, 3, "arn", "MATCH(lookup_value, lookup_array, [match_type])", "Position of a value", Lookup),

    // texte
    entry("GAUCHE", 1, 2, "sn", "GAUCHE(texte; [nb_car])", "Premiers caractères", Text),
    entry("LEFT", 1, 2, "sn", "LEFT(text, [num_chars])", "First characters", Text),
    entry("DROITE", 1, 2, "sn", "DROITE(texte; [nb_car])", "Derniers caractères", Text),
    entry("RIGHT", 1, 2, "sn", "RIGHT(text, [num_chars])", "Last characters", Text),
    entry("STXT", 3, 3, "snn", "STXT(texte; position; nb_car)", "Extrait du texte", Text),
    entry("MID", 3, 3, "snn", "MID(text, start, num_chars)", "Extracts text", Text),
    entry("NBCAR", 1, 1, "s", "NBCAR(texte)", "Nombre de caractères", Text),
    entry("LEN", 1, 1, "s", "LEN(text)", "Number of characters", Text),
    entry("MAJUSCULE", 1, 1, "s", "MAJUSCULE(texte)", "Convertit en majuscules", Text),
    entry("UPPER", 1, 1, "s", "UPPER(text)", "Converts to uppercase", Text),
    entry("MINUSCULE", 1, 1, "s", "MINUSCULE(texte)", "Convertit en minuscules", Text),
    entry("LOWER", 1, 1, "s", "LOWER(text)", "Converts to lowercase", Text),
    entry("NOMPROPRE", 1, 1, "s", "NOMPROPRE(texte)", "Première lettre en majuscule", Text),
    entry("PROPER", 1, 1, "s", "PROPER(text)", "Capitalizes first letter", Text),
    entry("CONCATENER", 1, 255, "s*", "CONCATENER(texte1; [texte2]; ...)", "Concatène du texte", Text),
    entry("CONCAT", 1, 255, "s*", "CONCAT(texte1; [texte2]; ...)", "Concatène du texte (version courte)", Text),
    entry("CONCATENATE", 1, 255, "s*", "CONCATENATE(text1, [text2], ...)", "Concatenates text", Text),
    entry("TEXTE", 2, 2, "ns", "TEXTE(valeur; format)", "Formate un nombre en texte", Text),
    entry("TEXT", 2, 2, "ns", "TEXT(value, format_text)", "Formats number as text", Text),
    entry("SUBSTITUE", 3, 4, "sssn", "SUBSTITUE(texte; ancien; nouveau; [occurrence])", "Remplace du texte", Text),
    entry("SUBSTITUTE", 3, 4, "sssn", "SUBSTITUTE(text, old, new, [instance])", "Replaces text", Text),
    entry("SUPPRESPACE", 1, 1, "s", "SUPPRESPACE(texte)", "Supprime les espaces superflus", Text),
    entry("TRIM", 1, 1, "s", "TRIM(text)", "Removes extra spaces", Text),

    // date
    entry("AUJOURDHUI", 0, 0, "", "AUJOURDHUI()", "Date du jour", Date),
    entry("TODAY", 0, 0, "", "TODAY()", "Today's date", Date),
    entry("MAINTENANT", 0, 0, "", "MAINTENANT()", "Date et heure actuelles", Date),
    entry("NOW", 0, 0, "", "NOW()", "Current date and time", Date),
    entry("ANNEE", 1, 1, "n", "ANNEE(date)", "Extrait l'année", Date),
    entry("YEAR", 1, 1, "n", "YEAR(date)", "Extracts year", Date),
    entry("MOIS", 1, 1, "n", "MOIS(date)", "Extrait le mois", Date),
    entry("MONTH", 1, 1, "n", "MONTH(date)", "Extracts month", Date),
    entry("JOUR", 1, 1, "n", "JOUR(date)", "Extrait le jour", Date),
    entry("DAY", 1, 1, "n", "DAY(date)", "Extracts day", Date),
    entry("DATE", 3, 3, "nnn", "DATE(année; mois; jour)", "Crée une date", Date),
    entry("JOURSEM", 1, 2, "nn", "JOURSEM(date; [type])", "Jour de la semaine", Date),
    entry("WEEKDAY", 1, 2, "nn", "WEEKDAY(date, [type])", "Day of the week", Date),
    entry("FIN.MOIS", 2, 2, "nn", "FIN.MOIS(date_départ; mois)", "Dernier jour du mois", Date),
    entry("EOMONTH", 2, 2, "nn", "EOMONTH(start_date, months)", "End of month", Date),

    // stats
    entry("RANG", 2, 3, "nrn", "RANG(nombre; réf; [ordre])", "Rang d'une valeur", Statistics),
    entry("RANK", 2, 3, "nrn", "RANK(number, ref, [order])", "Rank of a value", Statistics),
    entry("GRANDE.VALEUR", 2, 2, "rn", "GRANDE.VALEUR(plage; k)", "K-ième plus grande valeur", Statistics),
    entry("LARGE", 2, 2, "rn", "LARGE(array, k)", "K-th largest value", Statistics),
    entry("PETITE.VALEUR", 2, 2, "rn", "PETITE.VALEUR(plage; k)", "K-ième plus petite valeur", Statistics),
    entry("SMALL", 2, 2, "rn", "SMALL(array, k)", "K-th smallest value", Statistics),
];

static BY_NAME: Lazy<AHashMap<&'static str, &'static FunctionDescriptor>> =
    Lazy::new(|| DESCRIPTORS.iter().map(|d| (d.name, d)).collect());

/// Every descriptor, in catalog order
pub fn descriptors() -> &'static [FunctionDescriptor] {
    DESCRIPTORS
}

/// Descriptor for a name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static FunctionDescriptor> {
    BY_NAME.get(name.to_uppercase().as_str()).copied()
}

/// Descriptors of one family
pub fn by_category(category: Category) -> impl Iterator<Item = &'static FunctionDescriptor> {
    DESCRIPTORS.iter().filter(move |d| d.category == category)
}

/// A catalog entry the name was probably meant to be: same letters apart from
/// case, accents and dots. Exact names have no suggestion.
pub fn suggest(name: &str) -> Option<&'static FunctionDescriptor> {
    if lookup(name).is_some() {
        return None;
    }
    let wanted = normalize(name);
    DESCRIPTORS.iter().find(|d| normalize(d.name) == wanted)
}

/// Uppercase, accents stripped, dots removed
fn normalize(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .filter(|&c| c != '.')
        .map(|c| match c {
            'À' | 'Â' | 'Ä' | 'Á' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Î' | 'Ï' | 'Í' => 'I',
            'Ô' | 'Ö' | 'Ó' => 'O',
            'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let si = lookup("si").unwrap();
        assert_eq!(si.name, "SI");
        assert_eq!((si.min_args, si.max_args), (3, 3));
        assert_eq!(si.category, Category::Logical);
        assert!(lookup("Nb.Si").is_some());
        assert!(lookup("NOPE").is_none());
    }

    #[test]
    fn test_names_are_unique_and_uppercase() {
        assert_eq!(BY_NAME.len(), descriptors().len());
        for d in descriptors() {
            assert_eq!(d.name, d.name.to_uppercase());
            assert!(d.min_args <= d.max_args, "{}", d.name);
            assert!(d.syntax.starts_with(d.name), "{}", d.name);
        }
    }

    #[test]
    fn test_arg_types() {
        let sumif = lookup("SOMME.SI").unwrap();
        assert_eq!(
            sumif.arg_types(),
            vec![ArgType::Range, ArgType::Text, ArgType::Range]
        );
        assert!(!sumif.is_variadic());
        assert_eq!(sumif.expected_type(3), None);

        let sum = lookup("SOMME").unwrap();
        assert_eq!(sum.expected_type(7), Some(ArgType::Number));

        let sumifs = lookup("SUMIFS").unwrap();
        assert_eq!(sumifs.expected_type(0), Some(ArgType::Range));
        assert_eq!(sumifs.expected_type(3), Some(ArgType::Range));
        assert_eq!(sumifs.expected_type(4), Some(ArgType::Text));

        assert!(lookup("ALEA").unwrap().arg_types().is_empty());
    }

    #[test]
    fn test_suggest() {
        assert_eq!(suggest("ANNÉE").map(|d| d.name), Some("ANNEE"));
        assert_eq!(suggest("nbsi").map(|d| d.name), Some("NB.SI"));
        assert_eq!(suggest("RECHERCHE.V").map(|d| d.name), Some("RECHERCHEV"));
        assert_eq!(suggest("SOMME"), None);
        assert_eq!(suggest("TOTAL"), None);
    }

    #[test]
    fn test_categories() {
        assert!(by_category(Category::Date).any(|d| d.name == "AUJOURDHUI"));
        assert!(by_category(Category::Lookup).any(|d| d.name == "MATCH"));
        assert_eq!(Category::ConditionalAggregate.to_string(), "Somme conditionnelle");
    }
}
