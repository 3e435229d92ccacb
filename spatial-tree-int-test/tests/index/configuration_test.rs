use spatial_tree_index::{
    Column, ColumnType, ErrorKind, Geometry, IndexColumn, IndexDefinition, IndexType, SortType,
};
use spatial_tree_int_test::test_util::{
    cleanup, create_memory_test_context, create_test_context, run_test, spatial_index, GeoTable,
};

#[test]
fn test_unique_index_is_rejected() {
    run_test(
        create_memory_test_context,
        |ctx| {
            for persistent in [false, true] {
                for create in [false, true] {
                    let definition = spatial_index(1, persistent)
                        .with_create(create)
                        .with_index_type(IndexType::unique());
                    let err = ctx.open_index(&definition).unwrap_err();
                    assert!(err.kind().is_configuration());
                    assert_eq!(err.message(), "not unique");
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_multi_column_index_is_rejected() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let definition = IndexDefinition::new(
                1,
                "IDX_TWO",
                vec![GeoTable::geometry_column(), GeoTable::geometry_column()],
            );
            let err = ctx.open_index(&definition).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedIndex);
            assert_eq!(err.message(), "can only do one column");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_modifiers_are_rejected() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let column = Column::new(1, "SHAPE", ColumnType::Geometry);
            for sort_type in [
                SortType::DESCENDING,
                SortType::NULLS_FIRST,
                SortType::NULLS_LAST,
                SortType::DESCENDING.with(SortType::NULLS_LAST),
            ] {
                let definition = IndexDefinition::new(
                    1,
                    "IDX_SORTED",
                    vec![IndexColumn::with_sort_type(column.clone(), sort_type)],
                );
                let err = ctx.open_index(&definition).unwrap_err();
                assert!(err.kind().is_configuration());
                assert!(!err.is_fatal());
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_non_geometry_column_checked_outside_startup() {
    run_test(
        create_memory_test_context,
        |ctx| {
            let definition = IndexDefinition::new(1, "IDX_NAME", vec![GeoTable::name_column()]);
            let err = ctx.open_index(&definition).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidColumnType);
            assert_eq!(err.message(), "spatial index on non-geometry column, NAME VARCHAR");

            ctx.db().set_starting(true);
            let index = ctx.open_index(&definition)?;
            ctx.db().set_starting(false);

            let row = ctx.table().insert("a", None);
            let err = index.add(&ctx.session(), &row).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_persistent_index_needs_valid_id() {
    run_test(
        create_test_context,
        |ctx| {
            let err = ctx.open_index(&spatial_index(-3, true)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidIndexId);

            let index = ctx.open_index(&spatial_index(-3, false))?;
            assert!(!index.is_persistent());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_persistent_index_without_storage_needs_create() {
    run_test(
        create_test_context,
        |ctx| {
            let err = ctx
                .open_index(&spatial_index(9, true).with_create(false))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexNotFound);
            assert!(err.kind().is_configuration());

            let index = ctx.open_index(&spatial_index(9, true))?;
            assert!(index.needs_rebuild());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_transient_index_must_be_created() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.table().insert("a", Some(Geometry::point(1.0, 1.0)));
            let err = ctx
                .open_index(&spatial_index(1, false).with_create(false))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedIndex);
            assert!(err.kind().is_configuration());
            assert!(err.message().contains("create==false"));

            let index = ctx.open_index(&spatial_index(1, false))?;
            assert!(index.needs_rebuild());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_config_is_frozen_once_store_opens() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.db().config().set_cost_row_offset(10)?;
            ctx.open_index(&spatial_index(1, true))?;
            let err = ctx.db().config().set_cost_row_offset(20).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            assert_eq!(ctx.db().config().cost_row_offset(), 10);
            Ok(())
        },
        cleanup,
    )
}
