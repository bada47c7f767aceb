use sqlx::{Encode, Postgres, QueryBuilder, Type};

/// `UPDATE <table> SET ...` that only writes the columns it was given.
pub(crate) struct PartialUpdate<'args> {
    qb: QueryBuilder<'args, Postgres>,
    columns: usize,
}

impl<'args> PartialUpdate<'args> {
    pub(crate) fn new(table: &str) -> Self {
        Self {
            qb: QueryBuilder::new(format!("UPDATE {table} SET ")),
            columns: 0,
        }
    }

    pub(crate) fn set<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            if self.columns > 0 {
                self.qb.push(", ");
            }
            self.qb.push(column).push(" = ").push_bind(value);
            self.columns += 1;
        }
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns == 0
    }

    /// Appends `WHERE <key_column> = $n RETURNING <returning>`.
    pub(crate) fn finish<K>(
        mut self,
        key_column: &str,
        key: K,
        returning: &str,
    ) -> QueryBuilder<'args, Postgres>
    where
        K: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.qb
            .push(" WHERE ")
            .push(key_column)
            .push(" = ")
            .push_bind(key)
            .push(" RETURNING ")
            .push(returning);
        self.qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_given_columns_are_written() {
        let mut update = PartialUpdate::new("meal_plans");
        update
            .set("name", Some("Week2".to_string()))
            .set::<String>("created_by", None);
        assert!(!update.is_empty());
        let qb = update.finish("id", 3_i32, "id, name, created_by, user_id");
        assert_eq!(
            qb.sql(),
            "UPDATE meal_plans SET name = $1 WHERE id = $2 RETURNING id, name, created_by, user_id"
        );
    }

    #[test]
    fn several_columns_are_comma_separated() {
        let mut update = PartialUpdate::new("users");
        update
            .set("first_name", Some("Bob".to_string()))
            .set("email", Some("bob@example.com".to_string()));
        let qb = update.finish("username", "bob".to_string(), "id");
        assert_eq!(
            qb.sql(),
            "UPDATE users SET first_name = $1, email = $2 WHERE username = $3 RETURNING id"
        );
    }
}
