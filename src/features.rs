//! Per-record feature extraction and z-score normalization

use ndarray::{Array1, Array2, Axis};

use crate::data::Table;
use crate::fields::{parse_number, FieldRoles};

/// Raw numeric features for every record of a table
#[derive(Debug, Clone)]
pub struct Features {
    /// Column names, aligned with the columns of `values`
    pub fields: Vec<String>,
    /// Unnormalized feature matrix (n_records, n_fields)
    pub values: Array2<f64>,
    /// Primary monetary amount per record
    pub amounts: Vec<f64>,
}

/// Extract the numeric feature matrix and primary amounts
///
/// Unparseable cells become 0.0, so the matrix never holds NaN.
pub fn extract(table: &Table, roles: &FieldRoles) -> Features {
    let columns: Vec<usize> = roles
        .numeric_fields
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();
    let amount_column = roles.primary_amount().and_then(|name| table.column_index(name));

    let n_records = table.len();
    let values = Array2::from_shape_fn((n_records, columns.len()), |(row, j)| {
        cell_value(table.value(row, columns[j]))
    });

    let amounts = (0..n_records)
        .map(|row| amount_column.map_or(0.0, |col| cell_value(table.value(row, col))))
        .collect();

    Features {
        fields: roles.numeric_fields.clone(),
        values,
        amounts,
    }
}

fn cell_value(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Column-wise z-score scaler fitted on one feature matrix
#[derive(Debug, Clone)]
pub struct StandardScaler {
    pub means: Array1<f64>,
    /// Population standard deviation, replaced by 1.0 for constant columns
    pub scales: Array1<f64>,
}

impl StandardScaler {
    /// Fit means and scales column by column.
    pub fn fit(data: &Array2<f64>) -> Self {
        if data.nrows() == 0 {
            let m = data.ncols();
            return StandardScaler {
                means: Array1::zeros(m),
                scales: Array1::ones(m),
            };
        }

        let mut means = Array1::zeros(data.ncols());
        let mut scales = Array1::ones(data.ncols());
        for (j, column) in data.axis_iter(Axis(1)).enumerate() {
            // Constant columns are centered on their exact value so they map to 0.0
            let first = column[0];
            if column.iter().all(|&v| v == first) {
                means[j] = first;
                continue;
            }
            means[j] = column.mean().unwrap_or(0.0);
            let std = column.std(0.0);
            if std > 0.0 && std.is_finite() {
                scales[j] = std;
            }
        }

        StandardScaler { means, scales }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        if data.is_empty() {
            return data.clone();
        }
        (data - &self.means) / &self.scales
    }
}

/// Z-score normalize a feature matrix column-wise
pub fn normalize(data: &Array2<f64>) -> Array2<f64> {
    if data.is_empty() {
        return data.clone();
    }
    StandardScaler::fit(data).transform(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::classify;
    use ndarray::array;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_extract_substitutes_zero() {
        let table = Table::new(
            ["email", "total_spent", "visits"],
            vec![
                vec!["a@x.io", "100", "3"],
                vec!["b@x.io", "abc", ""],
                vec!["c@x.io", "50.5", "7"],
            ],
        );
        let roles = classify(&table);
        let features = extract(&table, &roles);

        assert_eq!(features.fields, vec!["total_spent", "visits"]);
        assert_eq!(features.values, array![[100.0, 3.0], [0.0, 0.0], [50.5, 7.0]]);
        assert_eq!(features.amounts, vec![100.0, 0.0, 50.5]);
    }

    #[test]
    fn test_amount_without_amount_field_is_zero() {
        let table = Table::new(["email", "visits"], vec![vec!["a", "3"], vec!["b", "4"]]);
        let features = extract(&table, &classify(&table));
        assert_eq!(features.amounts, vec![0.0, 0.0]);
    }

    #[test]
    fn test_amount_uses_non_numeric_amount_column() {
        // The amount column is resolved by name even when it is not numeric
        let table = Table::new(["lifetime_value"], vec![vec!["n/a"], vec!["n/a"]]);
        let roles = classify(&table);
        let features = extract(&table, &roles);

        assert!(roles.numeric_fields.is_empty());
        assert_eq!(features.values.shape(), &[2, 0]);
        assert_eq!(features.amounts, vec![0.0, 0.0]);
    }

    #[test]
    fn test_normalize_constant_column_is_zero() {
        let data = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let normalized = normalize(&data);

        assert!(normalized.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_unit_variance() {
        let data = array![[1.0, 10.0], [2.0, 40.0], [3.0, 20.0], [10.0, -5.0]];
        let normalized = normalize(&data);

        for column in normalized.columns() {
            let mean = column.mean().unwrap();
            let std = column.std(0.0);
            assert!(mean.abs() < TOLERANCE);
            assert!((std - 1.0).abs() < TOLERANCE);
        }
        assert_eq!(normalized.shape(), data.shape());
    }

    #[test]
    fn test_normalize_empty_is_unchanged() {
        let no_columns = Array2::<f64>::zeros((4, 0));
        let no_rows = Array2::<f64>::zeros((0, 3));

        assert_eq!(normalize(&no_columns).shape(), &[4, 0]);
        assert_eq!(normalize(&no_rows).shape(), &[0, 3]);
    }

    #[test]
    fn test_scaler_transforms_new_data() {
        let data = array![[0.0, 2.0], [10.0, 2.0]];
        let scaler = StandardScaler::fit(&data);
        let scaled = scaler.transform(&array![[5.0, 4.0]]);

        assert_eq!(scaled, array![[0.0, 2.0]]);
    }
}
