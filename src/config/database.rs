//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models without hand-written SQL.

use crate::entities::{Application, Attendance, Hostel, Room, RoomPhoto, Session, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

/// Establishes a connection to the database at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Parent tables come first so foreign keys always point at existing tables.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Hostel),
        schema.create_table_from_entity(Room),
        schema.create_table_from_entity(Application),
        schema.create_table_from_entity(Attendance),
        schema.create_table_from_entity(RoomPhoto),
        schema.create_table_from_entity(Session),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    info!("Database tables ensured.");
    Ok(())
}
