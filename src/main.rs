//! sqlkit - render queries through both builder styles and run them against
//! the in-memory backend

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use sqlkit::backend::RowStream;
use sqlkit::memdb::MemoryDatabase;
use sqlkit::schema::Catalog;
use sqlkit::{
    ColumnDef, ColumnGroup, Dialect, FieldSet, Query, Session, SessionConfig, SortOrder,
    Statement, Table,
};
use std::sync::Arc;

/// Query builder playground
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dialect to render statements in
    #[arg(short = 'D', long, default_value = "postgres")]
    dialect: Dialect,

    /// Enable debug logging (prints every executed statement)
    #[arg(short, long)]
    debug: bool,

    /// SQL to run against the sample tables instead of the built-in comparison
    sql: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let database = Arc::new(MemoryDatabase::new(args.dialect));
    let session = Session::with_config(database.clone(), SessionConfig::from_env());
    let catalog = create_sample_schema(&database, &session)?;

    match args.sql {
        Some(sql) => run_sql(&session, &sql),
        None => compare_styles(&session, &catalog),
    }
}

fn create_sample_schema(database: &MemoryDatabase, session: &Session) -> Result<Catalog> {
    let cities = Table::builder("cities")
        .column(ColumnDef::integer("id").auto_increment())
        .column(ColumnDef::varchar("name", 50))
        .build()?;
    let users = Table::builder("users")
        .column(ColumnDef::varchar("id", 10).primary_key())
        .column(ColumnDef::varchar("name", 50))
        .column(ColumnDef::integer("city_id").nullable())
        .build()?;
    database.create_table(&cities)?;
    database.create_table(&users)?;

    let name = cities.column("name")?;
    let mut city_ids = Vec::new();
    for city in ["St. Petersburg", "Munich", "Prague"] {
        let id = cities
            .insert()
            .set(&name, city)?
            .execute(session)?
            .context("cities has an auto-increment key")?;
        city_ids.push(id);
    }

    let rows = [
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
            .set(
                &users.column("city_id")?,
                city.map(|i: usize| city_ids[i].clone()),
            )?
            .execute(session)?;
    }

    let mut catalog = Catalog::new();
    catalog.register(cities)?;
    catalog.register(users)?;
    Ok(catalog)
}

fn run_sql(session: &Session, sql: &str) -> Result<()> {
    let mut stream = session.open(&Statement::new(sql, vec![]))?;
    let mut count = 0;
    while let Some(row) = stream.next_row()? {
        let line = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        println!("{}", line.join("\t"));
        count += 1;
    }
    stream.close();
    println!("({} rows)", count);
    Ok(())
}

/// Build each sample query in both styles, check that the SQL matches and run it
fn compare_styles(session: &Session, catalog: &Catalog) -> Result<()> {
    let cities = catalog.table("cities").context("cities is not registered")?;
    let users = catalog.table("users").context("users is not registered")?;
    let user_id = catalog.column("users", "id")?;
    let user_name = catalog.column("users", "name")?;
    let city_id = catalog.column("users", "city_id")?;
    let city_name = catalog.column("cities", "name")?;

    let samples: Vec<(&str, Query, Query)> = vec![
        (
            "users named Andrey",
            users
                .slice([user_id.clone()])?
                .select_where(user_name.equals("Andrey")?),
            users
                .select([user_id.clone()])?
                .filter(user_name.equals("Andrey")?),
        ),
        (
            "users without a city",
            users.select_where(city_id.is_null()),
            users.select_all().filter(city_id.is_null()),
        ),
        (
            "known users",
            users.select_where(
                ColumnGroup::new([user_id.clone(), user_name.clone()])?
                    .in_list([("andrey", "Andrey"), ("sergey", "Sergey")])?,
            ),
            users.select_all().filter(
                ColumnGroup::new([user_id.clone(), user_name.clone()])?
                    .in_list([("andrey", "Andrey"), ("sergey", "Sergey")])?,
            ),
        ),
        (
            "cities with users",
            cities
                .slice([city_name.clone()])?
                .select_where(cities.column("id")?.in_subquery(&users.select([city_id.clone()])?)?),
            cities
                .select([city_name.clone()])?
                .filter(cities.column("id")?.in_subquery(&users.select([city_id.clone()])?)?),
        ),
        (
            "city names",
            cities
                .slice([city_name.clone()])?
                .select_all()
                .order_by(&city_name, SortOrder::Asc),
            cities
                .select([city_name.clone()])?
                .order_by(&city_name, SortOrder::Asc),
        ),
    ];

    for (label, predicate_first, projection_first) in samples {
        let left = predicate_first.statement(session.dialect())?;
        let right = projection_first.statement(session.dialect())?;
        if left != right {
            bail!("{}: builder styles disagree:\n  {}\n  {}", label, left, right);
        }
        println!("-- {}\n{}", label, left);
        for row in projection_first.iter(session)? {
            let values = row?.decoded()?;
            let line = values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
            println!("  {}", line.join(", "));
        }
    }
    Ok(())
}
