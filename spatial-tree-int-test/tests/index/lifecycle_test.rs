use spatial_tree_index::{BoundingBox, Geometry, SpatialCursor};
use spatial_tree_int_test::test_util::{
    cleanup, create_memory_test_context, create_test_context, run_test, spatial_index, GeoTable,
};

fn row_ids(cursor: SpatialCursor<GeoTable>) -> Vec<i64> {
    let mut ids: Vec<i64> = cursor.map(|row| row.unwrap().id).collect();
    ids.sort();
    ids
}

#[test]
fn test_add_then_remove_restores_size() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();

            let kept = table.insert("kept", Some(Geometry::envelope(10.0, 10.0, 11.0, 11.0)));
            index.add(&session, &kept)?;
            let before = index.row_count(&session);

            let row = table.insert("temp", Some(Geometry::envelope(0.0, 0.0, 2.0, 2.0)));
            index.add(&session, &row)?;
            assert_eq!(index.row_count(&session), before + 1);

            index.remove(&session, &row)?;
            table.delete(row.id);
            assert_eq!(index.row_count(&session), before);

            let area = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
            let found = row_ids(index.find_by_intersection(&session, Some(&area))?);
            assert!(!found.contains(&row.id));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_is_delete_then_insert() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let table = ctx.table();

            let mut row = table.insert("moving", Some(Geometry::point(1.0, 1.0)));
            index.add(&session, &row)?;

            index.remove(&session, &row)?;
            row.shape = Some(Geometry::point(50.0, 50.0));
            index.add(&session, &row)?;

            let old = BoundingBox::point(1.0, 1.0);
            assert!(row_ids(index.find_by_intersection(&session, Some(&old))?).is_empty());
            let new = BoundingBox::point(50.0, 50.0);
            assert_eq!(row_ids(index.find_by_intersection(&session, Some(&new))?), vec![row.id]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_after_geometry_changed_is_fatal() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let mut row = ctx.table().insert("a", Some(Geometry::point(1.0, 1.0)));
            index.add(&session, &row)?;

            row.shape = Some(Geometry::point(2.0, 2.0));
            let err = index.remove(&session, &row).unwrap_err();
            assert!(err.is_fatal());
            assert_eq!(index.row_count(&session), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_truncate_then_reuse() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, true))?;
            let table = ctx.table();
            for i in 0..20 {
                let x = i as f64;
                let row = table.insert("cell", Some(Geometry::envelope(x, x, x + 1.0, x + 1.0)));
                index.add(&session, &row)?;
            }
            assert_eq!(index.row_count(&session), 20);

            index.truncate(&session)?;
            table.clear();
            assert_eq!(index.row_count(&session), 0);
            assert_eq!(index.row_count_approximation(), 0);
            assert!(row_ids(index.find(&session)?).is_empty());

            let row = table.insert("again", Some(Geometry::point(3.0, 3.0)));
            index.add(&session, &row)?;
            assert_eq!(row_ids(index.find(&session)?), vec![row.id]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_rebuild_from_table() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let table = ctx.table();
            let a = table.insert("a", Some(Geometry::point(1.0, 1.0)));
            let b = table.insert("b", Some(Geometry::line_string(&[(0.0, 0.0), (4.0, 4.0)])));
            table.insert("nothing", None);

            let index = ctx.open_index(&spatial_index(1, false))?;
            assert!(index.needs_rebuild());
            index.rebuild(&session, &table.rows())?;
            assert!(!index.needs_rebuild());
            assert_eq!(index.row_count(&session), 2);
            assert_eq!(row_ids(index.find(&session)?), vec![a.id, b.id]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_operations_after_close_are_fatal() {
    run_test(
        create_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(4, true))?;
            index.close(&session)?;

            let row = ctx.table().insert("late", Some(Geometry::point(0.0, 0.0)));
            let err = index.add(&session, &row).unwrap_err();
            assert!(err.is_fatal());
            assert!(!err.kind().is_configuration());

            assert!(index.remove(&session, &row).unwrap_err().is_fatal());
            assert!(index.find(&session).err().unwrap().is_fatal());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_transient_indexes_do_not_share_data() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let first = ctx.open_index(&spatial_index(1, false))?;
            let second = ctx.open_index(&spatial_index(1, false))?;

            let row = ctx.table().insert("a", Some(Geometry::point(0.0, 0.0)));
            first.add(&session, &row)?;
            assert_eq!(first.row_count(&session), 1);
            assert_eq!(second.row_count(&session), 0);

            first.close(&session)?;
            assert_eq!(second.row_count(&session), 0);
            Ok(())
        },
        cleanup,
    )
}
