//! Database connection and table creation using `SeaORM`.
//!
//! Tables are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without hand-written SQL.

use crate::entities::{Transaction, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the database.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
///
/// Safe to call on a fresh database only; existing tables make the create
/// statements fail, which callers treat as "already initialized".
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User);
    let transaction_table = schema.create_table_from_entity(Transaction);

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{TransactionModel, UserModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;

        Ok(())
    }
}
