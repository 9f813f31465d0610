//! Sort strings (`createdAt`, `-totalReplies`) validated against a whitelist.

use std::fmt;

use peertube_common::{AppError, AppResult};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

/// A validated sort on one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Parse a sort string. A leading `-` sorts descending.
    pub fn parse(value: &str, allowed: &[&str]) -> AppResult<Self> {
        let (field, direction) = match value.strip_prefix('-') {
            Some(field) => (field, SortDirection::Desc),
            None => (value, SortDirection::Asc),
        };

        if !allowed.contains(&field) {
            return Err(AppError::BadRequest(format!("Invalid sort field: {field}")));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }

    /// `ORDER BY` clause over output columns, with `id` as the tie breaker.
    #[must_use]
    pub fn order_by(&self) -> String {
        if self.field == "id" {
            return format!(r#"ORDER BY "id" {}"#, self.direction);
        }

        format!(r#"ORDER BY "{}" {}, "id" ASC"#, self.field, self.direction)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["createdAt", "totalReplies"];

    #[test]
    fn test_parse_ascending() {
        let sort = Sort::parse("createdAt", ALLOWED).unwrap();
        assert_eq!(sort.direction, SortDirection::Asc);
        assert_eq!(sort.order_by(), r#"ORDER BY "createdAt" ASC, "id" ASC"#);
    }

    #[test]
    fn test_parse_descending() {
        let sort = Sort::parse("-totalReplies", ALLOWED).unwrap();
        assert_eq!(sort.field, "totalReplies");
        assert_eq!(sort.order_by(), r#"ORDER BY "totalReplies" DESC, "id" ASC"#);
    }

    #[test]
    fn test_parse_rejects_unknown_field() {
        let err = Sort::parse("-text; DROP TABLE", ALLOWED).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
