use spatial_tree_index::{Geometry, IndexCondition, SortOrder};
use spatial_tree_int_test::test_util::{
    cleanup, create_memory_test_context, run_test, spatial_index, GEOMETRY_COLUMN,
};

fn masks(mask: u32) -> Vec<u32> {
    let mut masks = vec![0; GEOMETRY_COLUMN + 1];
    masks[GEOMETRY_COLUMN] = mask;
    masks
}

#[test]
fn test_overlap_is_cheaper_than_scan() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let index = ctx.open_index(&spatial_index(1, false))?;
            let overlap = masks(IndexCondition::OVERLAP);
            let range = masks(IndexCondition::RANGE);

            let mut previous = 0;
            for rows in [0u64, 1, 10, 100, 1_000, 10_000, 1_000_000] {
                let with_overlap = index.estimate_cost(Some(&overlap), rows, None);
                let without = index.estimate_cost(Some(&range), rows, None);
                assert!(with_overlap >= previous);
                assert!(with_overlap < without);
                assert_eq!(without, rows + 1000);
                assert_eq!(index.estimate_cost(None, rows, None), without);
                previous = with_overlap;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cost_follows_table_size() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let session = ctx.session();
            let index = ctx.open_index(&spatial_index(1, false))?;
            let overlap = masks(IndexCondition::OVERLAP | IndexCondition::EQUALITY);
            let order = SortOrder::new().by(GEOMETRY_COLUMN, true);

            let empty = index.cost(&session, Some(&overlap), Some(&order));
            assert_eq!(empty, 253.0);

            for i in 0..400 {
                ctx.table().insert("p", Some(Geometry::point(i as f64, 0.0)));
            }
            let full = index.cost(&session, Some(&overlap), Some(&order));
            assert_eq!(full, 353.0);
            assert_eq!(index.cost(&session, None, None), 1400.0);
            Ok(())
        },
        cleanup,
    )
}
