use surrealdb::sql::Thing;

use crate::middleware::error::{AppError, AppResult};

/// Record id of `table` from a path value, accepts both `key` and `table:key`.
pub fn get_str_thing(table: &str, value: &str) -> AppResult<Thing> {
    let key = value
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(value);
    if key.trim().is_empty() || key.contains(':') {
        return Err(AppError::Validation {
            description: format!("Invalid {table} id"),
        });
    }
    Ok(Thing::from((table, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_prefixed_keys() {
        let plain = get_str_thing("review_task", "01J0ABC").unwrap();
        let prefixed = get_str_thing("review_task", "review_task:01J0ABC").unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.tb, "review_task");
    }

    #[test]
    fn rejects_foreign_table() {
        assert!(get_str_thing("review_task", "reviewer:01J0ABC").is_err());
        assert!(get_str_thing("review_task", " ").is_err());
    }
}
