#![allow(dead_code)]

use sqlkit::memdb::MemoryDatabase;
use sqlkit::row::ResultRow;
use sqlkit::value::FromValue;
use sqlkit::{Column, ColumnDef, Dialect, Session, SessionConfig, Statement, Table, Value};
use std::sync::Arc;

pub struct Fixture {
    pub database: Arc<MemoryDatabase>,
    pub session: Session,
    pub cities: Table,
    pub users: Table,
}

impl Fixture {
    pub fn dialect(&self) -> Dialect {
        self.session.dialect()
    }

    pub fn column(&self, table: &Table, name: &str) -> Column {
        table.column(name).unwrap()
    }

    /// Statements executed since the last call
    pub fn take_statements(&self) -> Vec<Statement> {
        self.session.statement_log().take()
    }
}

pub fn cities_table() -> Table {
    Table::builder("cities")
        .column(ColumnDef::integer("id").auto_increment())
        .column(ColumnDef::varchar("name", 50))
        .build()
        .unwrap()
}

pub fn users_table() -> Table {
    Table::builder("users")
        .column(ColumnDef::varchar("id", 10).primary_key())
        .column(ColumnDef::varchar("name", 50))
        .column(ColumnDef::integer("city_id").nullable())
        .build()
        .unwrap()
}

/// Empty database with the two sample tables and a recording session
pub fn empty_fixture(dialect: Dialect) -> anyhow::Result<Fixture> {
    let database = Arc::new(MemoryDatabase::new(dialect));
    let session = Session::with_config(
        database.clone(),
        SessionConfig {
            log_statements: true,
            record_statements: true,
        },
    );
    let cities = cities_table();
    let users = users_table();
    database.create_table(&cities)?;
    database.create_table(&users)?;
    Ok(Fixture {
        database,
        session,
        cities,
        users,
    })
}

/// Cities St. Petersburg (1), Munich (2), Prague (3) and the users
///
/// | id     | name      | city_id |
/// |--------|-----------|---------|
/// | andrey | Andrey    | 1       |
/// | sergey | Sergey    | 2       |
/// | eugene | Eugene    | 2       |
/// | alex   | Alex      | NULL    |
/// | smth   | Something | NULL    |
pub fn with_cities_and_users(dialect: Dialect) -> anyhow::Result<Fixture> {
    let fixture = empty_fixture(dialect)?;
    let cities = &fixture.cities;
    let users = &fixture.users;

    let city_name = cities.column("name")?;
    let mut city_ids = Vec::new();
    for name in ["St. Petersburg", "Munich", "Prague"] {
        let id = cities
            .insert()
            .set(&city_name, name)?
            .execute(&fixture.session)?;
        city_ids.push(id.unwrap_or(Value::Null));
    }

    let rows: [(&str, &str, Option<usize>); 5] = [
        ("andrey", "Andrey", Some(0)),
        ("sergey", "Sergey", Some(1)),
        ("eugene", "Eugene", Some(1)),
        ("alex", "Alex", None),
        ("smth", "Something", None),
    ];
    for (id, name, city) in rows {
        users
            .insert()
            .set(&users.column("id")?, id)?
            .set(&users.column("name")?, name)?
            .set(&users.column("city_id")?, city.map(|i| city_ids[i].clone()))?
            .execute(&fixture.session)?;
    }

    fixture.take_statements();
    Ok(fixture)
}

/// Typed values of one column across rows
pub fn values<T: FromValue>(rows: &[ResultRow], column: &Column) -> Vec<T> {
    rows.iter().map(|row| row.get::<T>(column).unwrap()).collect()
}

/// Sorted string values of one column across rows
pub fn sorted_strings(rows: &[ResultRow], column: &Column) -> Vec<String> {
    let mut values = values::<String>(rows, column);
    values.sort();
    values
}
