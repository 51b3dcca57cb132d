//! Card type expressions.
//!
//! A type expression is a list of AND-clauses joined by `+`; each clause is a
//! list of OR-alternatives joined by `/`. `A+B/C` reads as `A AND (B OR C)`.

use crate::Tag;

pub const AND_SEPARATOR: char = '+';
pub const OR_SEPARATOR: char = '/';

/// Every atomic tag an expression mentions, in first-seen order, without duplicates.
pub fn parse_type_tags(expr: Option<&str>) -> Vec<Tag> {
    let Some(expr) = expr else {
        return Vec::new();
    };
    let mut tags: Vec<Tag> = Vec::new();
    for clause in expr.split(AND_SEPARATOR) {
        for alternative in clause.split(OR_SEPARATOR) {
            let tag = alternative.trim();
            if tag.is_empty() || tags.iter().any(|seen| seen == tag) {
                continue;
            }
            tags.push(tag.to_string());
        }
    }
    tags
}

pub fn is_composite(expr: &str) -> bool {
    expr.contains(AND_SEPARATOR) || expr.contains(OR_SEPARATOR)
}

/// Whether a card with type `expr` can be selected for `target`.
///
/// A composite target only matches the identical composite expression. A simple
/// target matches when it is one of the parts the card splits into on its
/// outermost operator (`+` before `/`), or equals a simple card type.
pub fn matches_target(expr: Option<&str>, target: &str) -> bool {
    let Some(expr) = expr.map(str::trim).filter(|expr| !expr.is_empty()) else {
        return false;
    };
    let target = target.trim();
    if is_composite(target) {
        return expr == target;
    }
    let separator = if expr.contains(AND_SEPARATOR) {
        AND_SEPARATOR
    } else if expr.contains(OR_SEPARATOR) {
        OR_SEPARATOR
    } else {
        return expr == target;
    };
    expr.split(separator).any(|part| part.trim() == target)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    clauses: Vec<Vec<Tag>>,
}

impl TypeExpr {
    pub fn parse(expr: &str) -> Self {
        let clauses = expr
            .split(AND_SEPARATOR)
            .map(|clause| {
                clause
                    .split(OR_SEPARATOR)
                    .map(str::trim)
                    .filter(|alternative| !alternative.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|clause| !clause.is_empty())
            .collect();
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Vec<Tag>] {
        &self.clauses
    }

    /// True for `A+B`-style expressions that need every clause satisfied.
    pub fn is_conjunction(&self) -> bool {
        self.clauses.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flattens_and_dedupes() {
        assert_eq!(
            parse_type_tags(Some("A + B/C")),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert_eq!(
            parse_type_tags(Some("Novice/Veteran+Novice")),
            vec!["Novice".to_string(), "Veteran".to_string()]
        );
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse_type_tags(None).is_empty());
        assert!(parse_type_tags(Some("")).is_empty());
        assert!(parse_type_tags(Some("  + / ")).is_empty());
    }

    #[test]
    fn composite_matching() {
        assert!(matches_target(Some("A+B"), "A"));
        assert!(matches_target(Some("A+B"), "A+B"));
        assert!(!matches_target(Some("A+B"), "C"));
        assert!(matches_target(Some("A/B"), "B"));
        assert!(!matches_target(Some("A/B"), "A+B"));
        assert!(!matches_target(Some("B+A"), "A+B"));
    }

    #[test]
    fn simple_matching() {
        assert!(matches_target(Some("Trap"), "Trap"));
        assert!(!matches_target(Some("Trap"), "Novice"));
    }

    #[test]
    fn untyped_cards_never_match() {
        assert!(!matches_target(None, "Trap"));
        assert!(!matches_target(Some("   "), "Trap"));
        assert!(!matches_target(Some(""), ""));
    }

    #[test]
    fn type_expr_clauses() {
        let expr = TypeExpr::parse("Trap + Novice/Veteran");
        assert!(expr.is_conjunction());
        assert_eq!(expr.clauses().len(), 2);
        assert_eq!(expr.clauses()[1], vec!["Novice".to_string(), "Veteran".to_string()]);
        assert!(!TypeExpr::parse("Novice/Veteran").is_conjunction());
        assert!(TypeExpr::parse("").clauses().is_empty());
    }
}
