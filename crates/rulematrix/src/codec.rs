//! The persisted text format.
//!
//! A matrix is written as a run of bracketed groups:
//!
//! ```text
//! [_and][Department_eq_Sales][_or][Experience_gt_5][Title_eq_Manager]
//! ```
//!
//! The first group is the logical operator of the root. Condition groups
//! are `field_suffix_value`, where the suffix is the operator token without
//! its leading underscore. Array values are joined with `|` and spaces in
//! values are written as `~`. Each nested matrix is appended as its own run
//! of groups.
//!
//! Parsing is flat: a logical group after the first opens a nested matrix
//! that takes every following condition group up to the next logical group.
//! Trees deeper than one level of nesting therefore do not survive a round
//! trip. Field names and values must not contain `_`.
//!
//! Parsed values are text, except for the configured numeric field (see
//! [`CodecOptions::numeric_field`]) whose values become numbers.

use log::{debug, trace};

use crate::config::CodecOptions;
use crate::error::{QueryError, Result};
use crate::model::{Condition, ConditionValue, Matrix};
use crate::op::{Operator, OperatorKind};
use crate::value::{Number, Scalar};

const ARRAY_SEPARATOR: &str = "|";
const SPACE_ESCAPE: &str = "~";

/// Serializes and parses matrices with a set of [`CodecOptions`].
#[derive(Debug, Clone, Default)]
pub struct Codec {
    options: CodecOptions,
}

impl Codec {
    pub fn new(options: CodecOptions) -> Self {
        Codec { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Writes `matrix` in the persisted text format.
    pub fn serialize(&self, matrix: &Matrix) -> String {
        let mut out = String::new();
        write_matrix(matrix, &mut out);
        out
    }

    /// Parses stored text into a matrix.
    ///
    /// Anything before the first query marker is ignored.
    ///
    /// # Errors
    ///
    /// `Parse` for empty input, text outside brackets, unbalanced brackets,
    /// a first group that is not a logical operator, a condition group that
    /// does not split into three parts, an unknown operator suffix, or a
    /// non-numeric value for the numeric field.
    pub fn parse(&self, text: &str) -> Result<Matrix> {
        let body = match text.find(self.options.query_marker.as_str()) {
            Some(at) => &text[at + self.options.query_marker.len()..],
            None => text,
        };
        let body = body.trim();
        debug!("parsing matrix from {} bytes", body.len());
        if body.is_empty() {
            return Err(QueryError::Parse("query text is empty".into()));
        }

        let mut cursor = Cursor::new(split_groups(body)?);
        let first = cursor
            .next_group()
            .ok_or_else(|| QueryError::Parse("query has no groups".into()))?;
        let op = logical_token(first).ok_or_else(|| {
            QueryError::Parse(format!(
                "query must start with a logical operator group, found [{}]",
                first
            ))
        })?;
        self.parse_level(op, &mut cursor, true)
    }

    /// Parses a stored value that may be absent.
    ///
    /// A missing value is a `Parse` error, like empty text.
    pub fn parse_stored(&self, stored: Option<&str>) -> Result<Matrix> {
        match stored {
            Some(text) => self.parse(text),
            None => Err(QueryError::Parse("no stored query".into())),
        }
    }

    fn parse_level(&self, op: Operator, cursor: &mut Cursor<'_>, root: bool) -> Result<Matrix> {
        let mut conditions = Vec::new();
        let mut nested = Vec::new();

        while let Some(group) = cursor.peek() {
            if let Some(inner) = logical_token(group) {
                if !root {
                    break;
                }
                cursor.advance();
                trace!("group {}: opens nested {}", cursor.position(), inner);
                nested.push(self.parse_level(inner, cursor, false)?);
            } else {
                cursor.advance();
                trace!("group {}: condition [{}]", cursor.position(), group);
                conditions.push(self.parse_condition(group)?);
            }
        }

        Matrix::new(op, conditions, nested)
    }

    fn parse_condition(&self, group: &str) -> Result<Condition> {
        let parts: Vec<&str> = group.split('_').collect();
        let [field, suffix, raw] = parts[..] else {
            return Err(QueryError::Parse(format!(
                "condition [{}] must have the form field_operator_value",
                group
            )));
        };
        if field.trim().is_empty() {
            return Err(QueryError::Parse(format!(
                "condition [{}] has no field",
                group
            )));
        }

        let op = Operator::lookup(&format!("_{}", suffix))
            .ok()
            .filter(|op| !op.is_logical())
            .ok_or_else(|| {
                QueryError::Parse(format!("unknown operator '{}' in [{}]", suffix, group))
            })?;

        let numeric = field == self.options.numeric_field;
        let value = match op.kind() {
            OperatorKind::Text => ConditionValue::Pattern(unescape(raw)),
            _ if op.is_membership() => {
                let items = if raw.is_empty() {
                    Vec::new()
                } else {
                    raw.split(ARRAY_SEPARATOR)
                        .map(|item| typed_scalar(field, item, numeric))
                        .collect::<Result<Vec<_>>>()?
                };
                ConditionValue::Array(items)
            }
            _ => ConditionValue::Single(typed_scalar(field, raw, numeric)?),
        };

        Condition::new(field, op, value)
    }
}

/// Serializes with the default options.
pub fn serialize(matrix: &Matrix) -> String {
    Codec::default().serialize(matrix)
}

/// Parses with the default options.
pub fn parse(text: &str) -> Result<Matrix> {
    Codec::default().parse(text)
}

fn write_matrix(matrix: &Matrix, out: &mut String) {
    out.push('[');
    out.push_str(matrix.logical_operator().token());
    out.push(']');
    for condition in matrix.conditions() {
        out.push('[');
        out.push_str(condition.field());
        out.push('_');
        out.push_str(condition.operator().suffix());
        out.push('_');
        out.push_str(&escape(&value_text(condition.value())));
        out.push(']');
    }
    for nested in matrix.nested() {
        write_matrix(nested, out);
    }
}

fn value_text(value: &ConditionValue) -> String {
    match value {
        ConditionValue::Single(s) => s.to_string(),
        ConditionValue::Pattern(p) => p.clone(),
        ConditionValue::Array(items) => items
            .iter()
            .map(Scalar::to_string)
            .collect::<Vec<_>>()
            .join(ARRAY_SEPARATOR),
    }
}

fn escape(value: &str) -> String {
    value.replace(' ', SPACE_ESCAPE)
}

fn unescape(value: &str) -> String {
    value.replace(SPACE_ESCAPE, " ")
}

fn typed_scalar(field: &str, raw: &str, numeric: bool) -> Result<Scalar> {
    let text = unescape(raw);
    if !numeric {
        return Ok(Scalar::Text(text));
    }
    Number::parse(&text).map(Scalar::Number).ok_or_else(|| {
        QueryError::Parse(format!(
            "value '{}' for numeric field '{}' is not a number",
            text, field
        ))
    })
}

fn logical_token(group: &str) -> Option<Operator> {
    Operator::lookup(group).ok().filter(|op| op.is_logical())
}

/// Splits text into the contents of its top-level bracket groups.
///
/// Whitespace between groups is allowed; any other text outside a group is
/// an error.
fn split_groups(text: &str) -> Result<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ']' => {
                if depth == 0 {
                    return Err(QueryError::Parse(format!("unbalanced ']' at byte {}", i)));
                }
                depth -= 1;
                if depth == 0 {
                    groups.push(&text[start..i]);
                }
            }
            c if depth == 0 && c.is_whitespace() => {}
            c if depth == 0 => {
                return Err(QueryError::Parse(format!(
                    "unexpected '{}' outside a group at byte {}",
                    c, i
                )));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(QueryError::Parse("unclosed '[' at end of query".into()));
    }
    Ok(groups)
}

struct Cursor<'a> {
    groups: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(groups: Vec<&'a str>) -> Self {
        Cursor { groups, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.groups.get(self.pos).copied()
    }

    fn next_group(&mut self) -> Option<&'a str> {
        let group = self.peek();
        self.advance();
        group
    }

    fn advance(&mut self) {
        if self.pos < self.groups.len() {
            self.pos += 1;
        }
    }

    fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MatrixBuilder;

    fn sales() -> MatrixBuilder {
        MatrixBuilder::new()
            .add_condition("Department", Operator::Eq, "Sales")
            .unwrap()
    }

    fn sales_with_senior_or_manager() -> Matrix {
        sales()
            .add_nested_conditions(|b| {
                b.with_logical_operator(Operator::Or)?
                    .add_condition("Experience", Operator::Gt, 5)?
                    .add_condition("Title", Operator::Eq, "Manager")
            })
            .unwrap()
            .build()
    }

    #[test]
    fn serialize_single_condition() {
        assert_eq!(serialize(&sales().build()), "[_and][Department_eq_Sales]");
    }

    #[test]
    fn serialize_nested() {
        assert_eq!(
            serialize(&sales_with_senior_or_manager()),
            "[_and][Department_eq_Sales][_or][Experience_gt_5][Title_eq_Manager]"
        );
    }

    #[test]
    fn serialize_array() {
        let matrix = MatrixBuilder::new()
            .add_condition("location", Operator::In, ["NY", "CA", "TX"])
            .unwrap()
            .build();
        assert_eq!(serialize(&matrix), "[_and][location_in_NY|CA|TX]");
    }

    #[test]
    fn parse_nested() {
        let parsed =
            parse("[_and][Department_eq_Sales][_or][Experience_gt_5][Title_eq_Manager]").unwrap();
        assert_eq!(parsed, sales_with_senior_or_manager());
    }

    #[test]
    fn parse_array() {
        let parsed = parse("[_and][location_in_NY|CA|TX]").unwrap();
        let condition = &parsed.conditions()[0];
        assert_eq!(condition.operator(), Operator::In);
        assert_eq!(
            condition.value(),
            &ConditionValue::Array(vec!["NY".into(), "CA".into(), "TX".into()])
        );
    }

    #[test]
    fn spaces_are_escaped() {
        let matrix = MatrixBuilder::new()
            .add_condition("Title", Operator::Eq, "Senior Manager")
            .unwrap()
            .build();
        let text = serialize(&matrix);
        assert_eq!(text, "[_and][Title_eq_Senior~Manager]");
        assert_eq!(parse(&text).unwrap(), matrix);
    }

    #[test]
    fn escaped_array_elements() {
        let parsed = parse("[_or][city_nin_New~York|Los~Angeles]").unwrap();
        assert_eq!(parsed.logical_operator(), Operator::Or);
        assert_eq!(
            parsed.conditions()[0].value(),
            &ConditionValue::Array(vec!["New York".into(), "Los Angeles".into()])
        );
    }

    #[test]
    fn text_operators_parse_to_patterns() {
        let parsed = parse("[_and][Title_ilike_man]").unwrap();
        assert_eq!(
            parsed.conditions()[0].value(),
            &ConditionValue::Pattern("man".into())
        );
    }

    #[test]
    fn only_numeric_field_is_typed() {
        let parsed = parse("[_and][Experience_gte_3][Level_gte_3]").unwrap();
        assert_eq!(
            parsed.conditions()[0].value(),
            &ConditionValue::Single(Scalar::Number(Number::I64(3)))
        );
        assert_eq!(
            parsed.conditions()[1].value(),
            &ConditionValue::Single(Scalar::Text("3".into()))
        );
    }

    #[test]
    fn numeric_field_must_be_numeric() {
        let err = parse("[_and][Experience_gt_five]").unwrap_err();
        assert!(matches!(err, QueryError::Parse(_)));
    }

    #[test]
    fn configured_numeric_field() {
        let codec = Codec::new(CodecOptions {
            numeric_field: "Tenure".into(),
            ..CodecOptions::default()
        });
        let parsed = codec.parse("[_and][Tenure_lt_4][Experience_lt_4]").unwrap();
        assert_eq!(
            parsed.conditions()[0].value(),
            &ConditionValue::Single(Scalar::Number(Number::I64(4)))
        );
        assert_eq!(
            parsed.conditions()[1].value(),
            &ConditionValue::Single(Scalar::Text("4".into()))
        );
    }

    #[test]
    fn text_before_marker_is_ignored() {
        let parsed = parse("rule 12 query:[_and][Department_eq_Sales]").unwrap();
        assert_eq!(parsed, sales().build());
        let parsed = parse("query: [_and] [Department_eq_Sales]").unwrap();
        assert_eq!(parsed, sales().build());
    }

    #[test]
    fn logical_groups_split_nested_matrices() {
        let parsed = parse("[_or][a_eq_1][_and][b_eq_2][_not][c_eq_3]").unwrap();
        assert_eq!(parsed.conditions().len(), 1);
        assert_eq!(parsed.nested().len(), 2);
        assert_eq!(parsed.nested()[0].logical_operator(), Operator::And);
        assert_eq!(parsed.nested()[1].logical_operator(), Operator::Not);
        assert_eq!(parsed.nested()[1].conditions()[0].field(), "c");
    }

    #[test]
    fn deep_nesting_serializes_depth_first_and_parses_flat() {
        let matrix = MatrixBuilder::new()
            .add_condition("a", Operator::Eq, 1)
            .unwrap()
            .add_nested_conditions(|b| {
                b.with_logical_operator(Operator::Or)?
                    .add_condition("b", Operator::Eq, 2)?
                    .add_nested_conditions(|b| {
                        b.with_logical_operator(Operator::Not)?
                            .add_condition("c", Operator::Eq, 3)
                    })
            })
            .unwrap()
            .build();

        let text = serialize(&matrix);
        assert_eq!(text, "[_and][a_eq_1][_or][b_eq_2][_not][c_eq_3]");

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.logical_operator(), Operator::And);
        assert_eq!(parsed.conditions().len(), 1);
        assert_eq!(parsed.nested().len(), 2);
        assert_eq!(parsed.nested()[0].logical_operator(), Operator::Or);
        assert!(parsed.nested()[0].nested().is_empty());
        assert_eq!(parsed.nested()[1].logical_operator(), Operator::Not);
        assert_eq!(parsed.nested()[1].conditions()[0].field(), "c");
        assert_ne!(parsed, matrix);
    }

    #[test]
    fn empty_logical_groups() {
        let parsed = parse("[_and][_or]").unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.nested().len(), 1);
    }

    #[test]
    fn malformed_input() {
        for text in [
            "",
            "   ",
            "invalid_format",
            "[_and",
            "[_and]]",
            "[Department_eq_Sales]",
            "[_and]junk[Department_eq_Sales]",
            "[_and][Department_eq]",
            "[_and][Department_eq_Sales_East]",
            "[_and][Department_zz_Sales]",
            "[_and][Department_and_Sales]",
            "[_and][_eq_Sales]",
            "[_xor][a_eq_b]",
        ] {
            let err = parse(text).unwrap_err();
            assert!(matches!(err, QueryError::Parse(_)), "{:?} gave {:?}", text, err);
        }
    }

    #[test]
    fn missing_stored_value() {
        let codec = Codec::default();
        assert!(matches!(
            codec.parse_stored(None),
            Err(QueryError::Parse(_))
        ));
        assert!(codec.parse_stored(Some("[_and]")).is_ok());
    }

    #[test]
    fn split_groups_keeps_inner_brackets() {
        assert_eq!(split_groups("[a][b[c]]").unwrap(), vec!["a", "b[c]"]);
    }
}
