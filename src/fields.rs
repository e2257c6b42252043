//! Field role inference from column names and sampled values

use serde::{Deserialize, Serialize};

use crate::data::Table;

/// Name fragments marking a monetary column.
const AMOUNT_HINTS: [&str; 4] = ["amount", "revenue", "value", "total"];
/// Name fragments marking a date column.
const DATE_HINTS: [&str; 3] = ["date", "time", "created"];
/// Name fragment marking the preferred identifier column.
const IDENTIFIER_HINT: &str = "email";
/// Records inspected when testing a column for numeric content.
pub const NUMERIC_SAMPLE_SIZE: usize = 100;

/// Semantic roles inferred for the columns of one table
///
/// Every name listed here is a column of the table the roles were
/// classified from. The first entry of `amount_fields` / `date_fields` is
/// the primary one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRoles {
    pub identifier_field: Option<String>,
    pub amount_fields: Vec<String>,
    pub date_fields: Vec<String>,
    pub numeric_fields: Vec<String>,
}

impl FieldRoles {
    /// Primary monetary column, if any.
    pub fn primary_amount(&self) -> Option<&str> {
        self.amount_fields.first().map(String::as_str)
    }

    /// Primary date column, if any.
    pub fn primary_date(&self) -> Option<&str> {
        self.date_fields.first().map(String::as_str)
    }

    /// Position of the primary amount column inside `numeric_fields`.
    pub fn primary_amount_feature(&self) -> Option<usize> {
        let amount = self.primary_amount()?;
        self.numeric_fields.iter().position(|f| f == amount)
    }
}

/// Classify the columns of a table
///
/// The heuristics are plain substring checks on the lowercased column name;
/// schema order is preserved in every list.
pub fn classify(table: &Table) -> FieldRoles {
    let columns = table.columns();
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();

    let identifier_field = lowered
        .iter()
        .position(|name| name.contains(IDENTIFIER_HINT))
        .or(if columns.is_empty() { None } else { Some(0) })
        .map(|i| columns[i].clone());

    let matching = |hints: &[&str]| -> Vec<String> {
        columns
            .iter()
            .zip(&lowered)
            .filter(|(_, name)| hints.iter().any(|hint| name.contains(hint)))
            .map(|(column, _)| column.clone())
            .collect()
    };

    let sample = table.len().min(NUMERIC_SAMPLE_SIZE);
    let numeric_fields = columns
        .iter()
        .enumerate()
        .filter(|(col, _)| (0..sample).any(|row| parse_number(table.value(row, *col)).is_some()))
        .map(|(_, column)| column.clone())
        .collect();

    let roles = FieldRoles {
        identifier_field,
        amount_fields: matching(&AMOUNT_HINTS),
        date_fields: matching(&DATE_HINTS),
        numeric_fields,
    };
    log::debug!("Classified fields: {:?}", roles);
    roles
}

/// Parse a cell as a finite number
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_table() -> Table {
        Table::new(
            ["Name", "Customer_Email", "Total_Spent", "order_value", "Signup_Date", "last_login_time"],
            vec![
                vec!["Ann", "ann@x.io", "100", "20", "2024-01-01", "x"],
                vec!["Bob", "bob@x.io", "abc", "", "2024-02-01", "y"],
            ],
        )
    }

    #[test]
    fn test_identifier_prefers_email() {
        let roles = classify(&customer_table());
        assert_eq!(roles.identifier_field.as_deref(), Some("Customer_Email"));
    }

    #[test]
    fn test_identifier_falls_back_to_first_column() {
        let table = Table::new(["id", "spend"], vec![vec!["1", "2"]]);
        assert_eq!(classify(&table).identifier_field.as_deref(), Some("id"));
    }

    #[test]
    fn test_amount_and_date_fields_keep_schema_order() {
        let roles = classify(&customer_table());
        assert_eq!(roles.amount_fields, vec!["Total_Spent", "order_value"]);
        assert_eq!(roles.date_fields, vec!["Signup_Date", "last_login_time"]);
        assert_eq!(roles.primary_amount(), Some("Total_Spent"));
        assert_eq!(roles.primary_date(), Some("Signup_Date"));
    }

    #[test]
    fn test_numeric_needs_one_parseable_sample() {
        let roles = classify(&customer_table());
        assert_eq!(roles.numeric_fields, vec!["Total_Spent", "order_value"]);
        assert_eq!(roles.primary_amount_feature(), Some(0));
    }

    #[test]
    fn test_numeric_sampling_is_bounded() {
        let mut rows: Vec<Vec<String>> = (0..NUMERIC_SAMPLE_SIZE)
            .map(|_| vec!["n/a".to_string()])
            .collect();
        rows.push(vec!["42".to_string()]);
        let table = Table::new(["score"], rows);

        assert!(classify(&table).numeric_fields.is_empty());
    }

    #[test]
    fn test_non_finite_values_are_not_numeric() {
        let table = Table::new(["a"], vec![vec!["inf"], vec!["NaN"]]);
        assert!(classify(&table).numeric_fields.is_empty());
        assert_eq!(parse_number(" 2.5 "), Some(2.5));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let table = customer_table();
        assert_eq!(classify(&table), classify(&table));
    }

    #[test]
    fn test_empty_schema() {
        let table = Table::new(Vec::<String>::new(), Vec::<Vec<String>>::new());
        assert_eq!(classify(&table), FieldRoles::default());
    }
}
