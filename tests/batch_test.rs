mod common;

use common::{empty_fixture, values, with_cities_and_users, Fixture};
use sqlkit::{Dialect, FieldSet, Value};

/// Fixture whose cities table holds `count` rows named City 1..=count
fn with_cities(dialect: Dialect, count: i32) -> anyhow::Result<Fixture> {
    let f = empty_fixture(dialect)?;
    let name = f.cities.column("name")?;
    for i in 1..=count {
        f.cities
            .insert()
            .set(&name, format!("City {}", i))?
            .execute(&f.session)?;
    }
    f.take_statements();
    Ok(f)
}

#[test]
fn test_batches_cover_every_row() -> anyhow::Result<()> {
    for dialect in Dialect::ALL {
        for batch_size in [1usize, 2, 3, 4, 100] {
            let f = with_cities(dialect, 9)?;
            let id = f.cities.column("id")?;

            let batches = f.cities.select_all_batched(batch_size)?.batches(&f.session)?;
            let sizes = batches.iter().map(Vec::len).collect::<Vec<_>>();
            let expected = (0..9)
                .step_by(batch_size)
                .map(|start| batch_size.min(9 - start))
                .collect::<Vec<_>>();
            assert_eq!(sizes, expected, "{:?} batch size {}", dialect, batch_size);

            let ids = batches
                .iter()
                .flat_map(|batch| values::<i32>(batch, &id))
                .collect::<Vec<_>>();
            assert_eq!(ids, (1..=9).collect::<Vec<_>>());

            // a trailing empty query only when the last batch was full
            let queries = f.take_statements().len();
            let full_last = 9 % batch_size == 0;
            assert_eq!(queries, expected.len() + usize::from(full_last));
            assert_eq!(f.database.open_streams(), 0);
        }
    }
    Ok(())
}

#[test]
fn test_batch_statements() -> anyhow::Result<()> {
    let f = with_cities(Dialect::Postgres, 3)?;
    f.cities.select_all_batched(2)?.batches(&f.session)?;

    let log = f.take_statements();
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[0].sql,
        "SELECT cities.id, cities.name FROM cities ORDER BY cities.id ASC LIMIT 2"
    );
    assert!(log[0].params.is_empty());
    assert_eq!(
        log[1].sql,
        "SELECT cities.id, cities.name FROM cities WHERE cities.id > ? ORDER BY cities.id ASC LIMIT 2"
    );
    assert_eq!(log[1].params, vec![Value::Int32(2)]);
    Ok(())
}

#[test]
fn test_batches_with_predicate() -> anyhow::Result<()> {
    for dialect in Dialect::ALL {
        let f = with_cities(dialect, 10)?;
        let id = f.cities.column("id")?;
        let name = f.cities.column("name")?;
        let predicate = name.not_equals("City 4")? & id.less_eq(8)?;

        let rows = f
            .cities
            .slice([name.clone()])?
            .select_batched(3, predicate.clone())?
            .iter(&f.session)
            .collect::<sqlkit::Result<Vec<_>>>()?;
        assert_eq!(
            values::<String>(&rows, &name),
            vec!["City 1", "City 2", "City 3", "City 5", "City 6", "City 7", "City 8"]
        );

        // both styles issue the same statements
        let left_log = f.take_statements();
        f.cities
            .select([name.clone()])?
            .filter(predicate)
            .fetch_batched_results(3)?
            .iter(&f.session)
            .collect::<sqlkit::Result<Vec<_>>>()?;
        assert_eq!(left_log, f.take_statements());
        assert_eq!(left_log.len(), 3);
    }
    Ok(())
}

#[test]
fn test_key_appended_to_rows() -> anyhow::Result<()> {
    let f = with_cities(Dialect::Sqlite, 4)?;
    let id = f.cities.column("id")?;
    let name = f.cities.column("name")?;

    let batched = f.cities.slice([name.clone()])?.select_all_batched(3)?;
    let rows = batched.iter(&f.session).collect::<sqlkit::Result<Vec<_>>>()?;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].columns(), &[name.clone(), id.clone()][..]);
    assert_eq!(values::<i32>(&rows, &id), vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
fn test_batches_on_empty_table() -> anyhow::Result<()> {
    for dialect in Dialect::ALL {
        let f = empty_fixture(dialect)?;
        let batches = f.cities.select_all_batched(5)?.batches(&f.session)?;
        assert!(batches.is_empty());
        assert_eq!(f.take_statements().len(), 1);

        let mut rows = f.cities.select_all_batched(5)?.iter(&f.session);
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
    }
    Ok(())
}

#[test]
fn test_closing_batched_cursor() -> anyhow::Result<()> {
    let f = with_cities(Dialect::MySql, 6)?;
    let batched = f.cities.select_all_batched(2)?;

    let mut rows = batched.iter(&f.session);
    assert!(rows.next().is_some());
    assert_eq!(f.database.open_streams(), 1);
    rows.close();
    assert_eq!(f.database.open_streams(), 0);
    assert!(rows.next().is_none());

    // dropping mid-batch releases the stream too
    let mut rows = batched.iter(&f.session);
    rows.next();
    rows.next();
    rows.next();
    drop(rows);
    assert_eq!(f.database.open_streams(), 0);
    Ok(())
}

#[test]
fn test_batching_needs_auto_increment_key() -> anyhow::Result<()> {
    let f = with_cities_and_users(Dialect::Postgres)?;
    let err = f
        .users
        .select_all_batched(2)
        .expect_err("users.id is a varchar key");
    assert!(matches!(
        err,
        sqlkit::error::BuildError::NoBatchKey { ref table } if table == "users"
    ));
    assert!(f.take_statements().is_empty());
    Ok(())
}
