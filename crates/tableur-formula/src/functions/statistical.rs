//! Counting and conditional aggregation functions

use super::criteria::CriteriaMatcher;
use super::{arg, flatten, range_texts, text_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;
use tableur_core::to_number;

/// COUNT(value1, [value2], ...) - non-empty values that read as numbers
pub fn fn_count(args: &[Value]) -> FormulaResult<Value> {
    let count = flatten(args)
        .iter()
        .filter(|v| !v.is_empty_text() && !v.to_number().is_nan())
        .count();
    Ok(Value::Number(count as f64))
}

/// COUNTA(value1, [value2], ...) - non-empty values
pub fn fn_counta(args: &[Value]) -> FormulaResult<Value> {
    let count = flatten(args).iter().filter(|v| !v.is_empty_text()).count();
    Ok(Value::Number(count as f64))
}

/// COUNTBLANK(range) - empty values
pub fn fn_countblank(args: &[Value]) -> FormulaResult<Value> {
    let count = flatten(args).iter().filter(|v| v.is_empty_text()).count();
    Ok(Value::Number(count as f64))
}

/// COUNTIF(range, criteria)
pub fn fn_countif(args: &[Value]) -> FormulaResult<Value> {
    let range = range_texts(arg(args, 0, "COUNTIF")?)?;
    let matcher = CriteriaMatcher::new(&text_arg(args, 1, "COUNTIF")?);
    let count = range.iter().filter(|cell| matcher.matches(cell)).count();
    Ok(Value::Number(count as f64))
}

/// SUMIF(range, criteria, [sum_range])
pub fn fn_sumif(args: &[Value]) -> FormulaResult<Value> {
    let (range, matcher, targets) = single_criteria(args, "SUMIF")?;
    let total: f64 = matching_numbers(&range, &matcher, &targets).sum();
    Ok(Value::Number(total))
}

/// AVERAGEIF(range, criteria, [average_range]), 0 when nothing matches
pub fn fn_averageif(args: &[Value]) -> FormulaResult<Value> {
    let (range, matcher, targets) = single_criteria(args, "AVERAGEIF")?;
    let nums: Vec<f64> = matching_numbers(&range, &matcher, &targets).collect();
    Ok(Value::Number(average(&nums)))
}

/// COUNTIFS(range1, criteria1, [range2, criteria2], ...)
pub fn fn_countifs(args: &[Value]) -> FormulaResult<Value> {
    let pairs = criteria_pairs(args, "COUNTIFS")?;
    let len = pairs.iter().map(|(range, _)| range.len()).max().unwrap_or(0);
    let count = (0..len).filter(|&i| all_match(&pairs, i)).count();
    Ok(Value::Number(count as f64))
}

/// SUMIFS(sum_range, range1, criteria1, [range2, criteria2], ...)
pub fn fn_sumifs(args: &[Value]) -> FormulaResult<Value> {
    let targets = range_texts(arg(args, 0, "SUMIFS")?)?;
    let pairs = criteria_pairs(&args[1..], "SUMIFS")?;
    let total: f64 = matching_positions(&targets, &pairs).sum();
    Ok(Value::Number(total))
}

/// AVERAGEIFS(average_range, range1, criteria1, [range2, criteria2], ...)
pub fn fn_averageifs(args: &[Value]) -> FormulaResult<Value> {
    let targets = range_texts(arg(args, 0, "AVERAGEIFS")?)?;
    let pairs = criteria_pairs(&args[1..], "AVERAGEIFS")?;
    let nums: Vec<f64> = matching_positions(&targets, &pairs).collect();
    Ok(Value::Number(average(&nums)))
}

/// Criteria range, compiled criteria and the values to aggregate. The third
/// argument is used only when it is a range.
fn single_criteria(
    args: &[Value],
    function: &str,
) -> FormulaResult<(Vec<String>, CriteriaMatcher, Vec<String>)> {
    let range = range_texts(arg(args, 0, function)?)?;
    let matcher = CriteriaMatcher::new(&text_arg(args, 1, function)?);
    let targets = match args.get(2) {
        Some(Value::Range(values)) => values.clone(),
        _ => range.clone(),
    };
    Ok((range, matcher, targets))
}

fn matching_numbers<'a>(
    range: &'a [String],
    matcher: &'a CriteriaMatcher,
    targets: &'a [String],
) -> impl Iterator<Item = f64> + 'a {
    range
        .iter()
        .enumerate()
        .filter(move |(_, cell)| matcher.matches(cell))
        .map(move |(i, _)| to_number(targets.get(i).map(String::as_str).unwrap_or("")))
        .filter(|n| !n.is_nan())
}

/// `(range, criteria)` pairs; an incomplete pair is an error
fn criteria_pairs(args: &[Value], function: &str) -> FormulaResult<Vec<(Vec<String>, CriteriaMatcher)>> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(FormulaError::Argument(format!(
            "{} expects ranges and criteria in pairs",
            function
        )));
    }
    args.chunks(2)
        .map(|pair| {
            let range = range_texts(&pair[0])?;
            let matcher = CriteriaMatcher::new(&text_arg(pair, 1, function)?);
            Ok((range, matcher))
        })
        .collect()
}

/// Whether position `i` satisfies every pair; missing cells read as empty
fn all_match(pairs: &[(Vec<String>, CriteriaMatcher)], i: usize) -> bool {
    pairs.iter().all(|(range, matcher)| {
        matcher.matches(range.get(i).map(String::as_str).unwrap_or(""))
    })
}

fn matching_positions<'a>(
    targets: &'a [String],
    pairs: &'a [(Vec<String>, CriteriaMatcher)],
) -> impl Iterator<Item = f64> + 'a {
    targets
        .iter()
        .enumerate()
        .filter(move |(i, _)| all_match(pairs, *i))
        .map(|(_, cell)| to_number(cell))
        .filter(|n| !n.is_nan())
}

fn average(nums: &[f64]) -> f64 {
    if nums.is_empty() {
        0.0
    } else {
        nums.iter().sum::<f64>() / nums.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(values: &[&str]) -> Value {
        Value::Range(values.iter().map(|s| s.to_string()).collect())
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_counts() {
        let args = [range(&["15", "", "abc", "3,5"]), Value::Number(0.0), text("")];
        assert_eq!(fn_count(&args).unwrap(), Value::Number(3.0));
        assert_eq!(fn_counta(&args).unwrap(), Value::Number(4.0));
        assert_eq!(fn_countblank(&[range(&["", "x", ""])]).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_countif() {
        let cities = range(&["Paris", "Lyon", "PARIS", "paris"]);
        assert_eq!(
            fn_countif(&[cities, text("Paris")]).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            fn_countif(&[range(&["5", "15", "10"]), text(">10")]).unwrap(),
            Value::Number(1.0)
        );
        assert_eq!(
            fn_countif(&[range(&["5", "15", "10"]), Value::Number(10.0)]).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_sumif() {
        let amounts = range(&["100", "200", "300"]);
        let regions = range(&["Nord", "Sud", "Nord"]);
        assert_eq!(
            fn_sumif(&[regions.clone(), text("nord"), amounts.clone()]).unwrap(),
            Value::Number(400.0)
        );
        assert_eq!(
            fn_sumif(&[amounts.clone(), text(">150")]).unwrap(),
            Value::Number(500.0)
        );
        // a scalar third argument is ignored
        assert_eq!(
            fn_sumif(&[amounts, text(">150"), Value::Number(1.0)]).unwrap(),
            Value::Number(500.0)
        );
    }

    #[test]
    fn test_averageif() {
        let scores = range(&["8", "12", "16", "x"]);
        assert_eq!(
            fn_averageif(&[scores.clone(), text(">=10")]).unwrap(),
            Value::Number(14.0)
        );
        assert_eq!(
            fn_averageif(&[scores, text(">100")]).unwrap(),
            Value::Number(0.0)
        );
    }

    #[test]
    fn test_multi_criteria() {
        let amounts = range(&["100", "200", "300", "400"]);
        let regions = range(&["Nord", "Sud", "Nord", "Nord"]);
        let years = range(&["2023", "2023", "2024", "2024"]);

        assert_eq!(
            fn_countifs(&[regions.clone(), text("Nord"), years.clone(), text(">=2024")]).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            fn_sumifs(&[
                amounts.clone(),
                regions.clone(),
                text("Nord"),
                years.clone(),
                text("2024")
            ])
            .unwrap(),
            Value::Number(700.0)
        );
        assert_eq!(
            fn_averageifs(&[amounts, regions, text("Nord")]).unwrap(),
            Value::Number(800.0 / 3.0)
        );
    }

    #[test]
    fn test_incomplete_pairs() {
        assert!(fn_countifs(&[range(&["1"]), text("1"), range(&["2"])]).is_err());
        assert!(fn_sumifs(&[range(&["1"]), range(&["1"])]).is_err());
    }
}
