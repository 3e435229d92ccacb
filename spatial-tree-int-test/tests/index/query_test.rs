use rand::Rng;
use spatial_tree_index::{BoundingBox, ErrorKind, Geometry, GeometryValue, SpatialCursor};
use spatial_tree_int_test::test_util::{
    cleanup, create_memory_test_context, run_test, spatial_index, GeoTable,
};
use std::collections::HashSet;

fn row_ids(cursor: SpatialCursor<GeoTable>) -> Vec<i64> {
    let mut ids: Vec<i64> = cursor.map(|row| row.unwrap().id).collect();
    ids.sort();
    ids
}

#[test]
fn test_two_rectangle_scenario() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();

            let first = table.insert("first", Some(Geometry::envelope(0.0, 0.0, 1.0, 1.0)));
            let second = table.insert("second", Some(Geometry::envelope(5.0, 5.0, 6.0, 6.0)));
            index.add(&session, &first)?;
            index.add(&session, &second)?;

            let point = BoundingBox::point(0.5, 0.5);
            assert_eq!(row_ids(index.find_by_intersection(&session, Some(&point))?), vec![first.id]);

            let gap = BoundingBox::new(2.0, 2.0, 3.0, 3.0);
            assert!(row_ids(index.find_by_intersection(&session, Some(&gap))?).is_empty());

            index.remove(&session, &first)?;
            table.delete(first.id);
            let area = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
            assert!(row_ids(index.find_by_intersection(&session, Some(&area))?).is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cursor_returns_full_rows() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let row = ctx.table().insert("park", Some(Geometry::point(-73.97, 40.78)));
            index.add(&session, &row)?;

            let area = BoundingBox::new(-74.0, 40.7, -73.9, 40.9);
            let mut cursor = index.find_by_intersection(&session, Some(&area))?;
            assert!(!cursor.previous());
            assert!(cursor.advance());
            assert_eq!(cursor.current_key().map(|k| k.row_id()), Some(row.id));
            assert_eq!(cursor.current_row()?, row);
            assert!(!cursor.previous());
            assert!(!cursor.advance());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_touching_rectangles_match() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let row = ctx.table().insert("box", Some(Geometry::envelope(0.0, 0.0, 1.0, 1.0)));
            index.add(&session, &row)?;

            for query in [
                BoundingBox::new(1.0, 0.0, 2.0, 1.0),
                BoundingBox::new(-1.0, -1.0, 0.0, 0.0),
                BoundingBox::point(1.0, 1.0),
            ] {
                assert_eq!(row_ids(index.find_by_intersection(&session, Some(&query))?), vec![row.id]);
            }
            let apart = BoundingBox::new(1.001, 0.0, 2.0, 1.0);
            assert!(row_ids(index.find_by_intersection(&session, Some(&apart))?).is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_identical_rectangles_are_kept_apart() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();

            let mut ids = Vec::new();
            for _ in 0..5 {
                let row = table.insert("same", Some(Geometry::envelope(2.0, 2.0, 3.0, 3.0)));
                index.add(&session, &row)?;
                ids.push(row.id);
            }
            assert_eq!(index.row_count(&session), 5);

            let removed = table.delete(ids[2]).unwrap();
            index.remove(&session, &removed)?;
            ids.remove(2);

            let area = BoundingBox::new(2.5, 2.5, 2.5, 2.5);
            assert_eq!(row_ids(index.find_by_intersection(&session, Some(&area))?), ids);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_random_search_matches_brute_force() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();
            let mut rng = rand::thread_rng();

            for _ in 0..1000 {
                let x: f64 = rng.gen_range(-180.0..180.0);
                let y: f64 = rng.gen_range(-90.0..90.0);
                let w: f64 = rng.gen_range(0.0..5.0);
                let h: f64 = rng.gen_range(0.0..5.0);
                let row = table.insert("r", Some(Geometry::envelope(x, y, x + w, y + h)));
                index.add(&session, &row)?;
            }

            for _ in 0..100 {
                let x: f64 = rng.gen_range(-190.0..190.0);
                let y: f64 = rng.gen_range(-100.0..100.0);
                let query = BoundingBox::new(x, y, x + rng.gen_range(0.0..20.0), y + rng.gen_range(0.0..20.0));

                let expected: HashSet<i64> = table
                    .rows()
                    .iter()
                    .filter(|row| {
                        row.shape
                            .as_ref()
                            .and_then(|shape| shape.envelope())
                            .map(|env| env.intersects(&query))
                            .unwrap_or(false)
                    })
                    .map(|row| row.id)
                    .collect();
                let found: HashSet<i64> = row_ids(index.find_by_intersection(&session, Some(&query))?)
                    .into_iter()
                    .collect();
                assert!(
                    expected.is_subset(&found),
                    "missed {:?} for {}",
                    expected.difference(&found).collect::<Vec<_>>(),
                    query
                );
                for id in &found {
                    let row = table.rows().into_iter().find(|r| r.id == *id).unwrap();
                    let env = row.shape.unwrap().envelope().unwrap();
                    let grown = BoundingBox::new(
                        query.min_x - 1e-4,
                        query.min_y - 1e-4,
                        query.max_x + 1e-4,
                        query.max_y + 1e-4,
                    );
                    assert!(env.intersects(&grown), "{} does not touch {}", env, query);
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_by_geometry() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();
            let a = table.insert("a", Some(Geometry::point(1.0, 1.0)));
            let b = table.insert("b", Some(Geometry::point(9.0, 9.0)));
            index.add(&session, &a)?;
            index.add(&session, &b)?;

            let triangle = Geometry::polygon(&[(0.0, 0.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]);
            assert_eq!(row_ids(index.find_by_geometry(&session, Some(&triangle))?), vec![a.id]);
            assert_eq!(row_ids(index.find_by_geometry(&session, None)?), vec![a.id, b.id]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_first_or_last() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let row = ctx.table().insert("a", Some(Geometry::point(1.0, 1.0)));
            index.add(&session, &row)?;

            assert!(index.can_get_first_or_last());
            assert_eq!(row_ids(index.find_first_or_last(&session, true)?), vec![row.id]);
            let err = index.find_first_or_last(&session, false).err().unwrap();
            assert!(err.is_fatal());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_coordinates_beyond_single_precision() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();

            let mut wide = Vec::new();
            for i in 0..200 {
                let x = i as f64;
                let shape = if i % 7 == 0 {
                    Geometry::envelope(-1e300, x, 1e300, x + 1.0)
                } else {
                    Geometry::envelope(x, x, x + 1.0, x + 1.0)
                };
                let row = table.insert("r", Some(shape));
                index.add(&session, &row)?;
                if i % 7 == 0 {
                    wide.push(row);
                }
            }
            assert_eq!(index.row_count(&session), 200);

            let far_left = BoundingBox::new(f64::NEG_INFINITY, 0.0, -1e100, 200.0);
            let hits = row_ids(index.find_by_intersection(&session, Some(&far_left))?);
            let mut expected: Vec<i64> = wide.iter().map(|row| row.id).collect();
            expected.sort();
            assert_eq!(hits, expected);

            for row in &wide {
                index.remove(&session, row)?;
            }
            assert!(row_ids(index.find_by_intersection(&session, Some(&far_left))?).is_empty());
            assert_eq!(index.row_count(&session), 200 - wide.len() as u64);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_nan_coordinates_are_rejected() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();

            let good = table.insert("good", Some(Geometry::point(1.0, 1.0)));
            index.add(&session, &good)?;
            let bad = table.insert("bad", Some(Geometry::point(f64::NAN, 1.0)));
            let err = index.add(&session, &bad).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidDataType);

            let nan_query = BoundingBox::point(f64::NAN, f64::NAN);
            assert!(row_ids(index.find_by_intersection(&session, Some(&nan_query))?).is_empty());
            assert_eq!(row_ids(index.find(&session)?), vec![good.id]);
            Ok(())
        },
        cleanup,
    )
}
