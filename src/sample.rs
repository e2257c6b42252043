//! Deterministic synthetic customer tables for demos and tests

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::Table;

/// Column layout of generated tables
pub const SAMPLE_COLUMNS: [&str; 6] = [
    "customer_name",
    "email",
    "total_spent",
    "order_count",
    "avg_order_value",
    "signup_date",
];

const FIRST_NAMES: [&str; 10] = [
    "Ana", "Ben", "Chloe", "Dev", "Elif", "Farah", "Gus", "Hana", "Ivo", "June",
];
const LAST_NAMES: [&str; 8] = [
    "Novak", "Okafor", "Park", "Quinn", "Rossi", "Sato", "Turner", "Vega",
];

/// Sign-ups are spread over this many days before the reference date
const SIGNUP_WINDOW_DAYS: i64 = 730;

/// Latent spending profile a generated customer is drawn from
struct Profile {
    /// Relative frequency (weights sum to 100)
    weight: u32,
    spent: (f64, f64),
    orders: (u32, u32),
}

static PROFILES: [Profile; 4] = [
    Profile {
        weight: 10,
        spent: (1500.0, 5000.0),
        orders: (15, 40),
    },
    Profile {
        weight: 35,
        spent: (300.0, 1500.0),
        orders: (5, 15),
    },
    Profile {
        weight: 35,
        spent: (50.0, 300.0),
        orders: (1, 5),
    },
    Profile {
        weight: 20,
        spent: (0.0, 80.0),
        orders: (1, 2),
    },
];

/// Generate `n` customers, reproducible for a given seed
///
/// Sign-up dates fall within the two years before `reference_date`.
pub fn generate(n: usize, seed: u64, reference_date: NaiveDate) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<String>> = (0..n).map(|i| sample_row(i, reference_date, &mut rng)).collect();
    log::debug!("Generated {} sample customers (seed {})", n, seed);
    Table::new(SAMPLE_COLUMNS, rows)
}

fn sample_row(i: usize, reference_date: NaiveDate, rng: &mut StdRng) -> Vec<String> {
    let profile = pick_profile(rng);
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];

    let spent = rng.gen_range(profile.spent.0..profile.spent.1);
    let orders = rng.gen_range(profile.orders.0..=profile.orders.1);
    let signup = reference_date - Duration::days(rng.gen_range(0..SIGNUP_WINDOW_DAYS));

    vec![
        format!("{first} {last}"),
        format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), i + 1),
        format!("{spent:.2}"),
        orders.to_string(),
        format!("{:.2}", spent / f64::from(orders)),
        signup.format("%Y-%m-%d").to_string(),
    ]
}

fn pick_profile(rng: &mut StdRng) -> &'static Profile {
    let mut roll = rng.gen_range(0..100u32);
    for profile in &PROFILES {
        if roll < profile.weight {
            return profile;
        }
        roll -= profile.weight;
    }
    &PROFILES[PROFILES.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::classify;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_generate_is_reproducible() {
        let a = generate(20, 9, reference());
        let b = generate(20, 9, reference());

        assert_eq!(a.len(), 20);
        for row in 0..a.len() {
            assert_eq!(a.record(row).values(), b.record(row).values());
        }
    }

    #[test]
    fn test_generated_fields_are_classified() {
        let roles = classify(&generate(50, 1, reference()));

        assert_eq!(roles.identifier_field.as_deref(), Some("email"));
        assert_eq!(roles.amount_fields, vec!["total_spent", "avg_order_value"]);
        assert_eq!(roles.date_fields, vec!["signup_date"]);
        assert_eq!(
            roles.numeric_fields,
            vec!["total_spent", "order_count", "avg_order_value"]
        );
    }

    #[test]
    fn test_signup_dates_within_window() {
        let table = generate(100, 3, reference());
        let col = table.column_index("signup_date").unwrap();
        let earliest = reference() - Duration::days(SIGNUP_WINDOW_DAYS);

        for row in 0..table.len() {
            let date = NaiveDate::parse_from_str(table.value(row, col), "%Y-%m-%d").unwrap();
            assert!(date <= reference() && date > earliest);
        }
    }
}
