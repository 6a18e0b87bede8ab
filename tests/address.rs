mod tests {
    use arena_handler::address::{expand_range_within, locate_led, resolve_index};
    use arena_handler::{Error, IndexSpec, expand_range, relative_to_absolute, wrap_negative};
    use proptest::prelude::*;

    #[test]
    fn test_wrap_negative() {
        assert_eq!(wrap_negative(4, -1), 4);
        assert_eq!(wrap_negative(4, -4), 1);
        assert_eq!(wrap_negative(8, -3), 6);
        assert_eq!(wrap_negative(1, -3), 3);
    }

    #[test]
    fn test_relative_to_absolute() {
        // Second block of edge 3, 2 blocks per edge, 8 blocks total.
        assert_eq!(relative_to_absolute(3, 2, 2, 8), 6);
        assert_eq!(relative_to_absolute(3, 2, 1, 8), 5);
        // Past the end of the last edge wraps to the first block.
        assert_eq!(relative_to_absolute(4, 2, 3, 8), 1);
        // Last block of the ring comes out as `total`, never zero.
        assert_eq!(relative_to_absolute(4, 2, 2, 8), 8);
        // One item per scope passes through.
        assert_eq!(relative_to_absolute(3, 1, -2, 4), -2);
    }

    #[test]
    fn test_expand_range() {
        assert_eq!(expand_range(&[5]).unwrap(), vec![5]);
        assert_eq!(expand_range(&[-2]).unwrap(), vec![-2]);
        assert_eq!(expand_range(&[1, 4]).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(expand_range(&[4, 1]).unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(expand_range(&[1, 8, 3]).unwrap(), vec![1, 4, 7]);
        assert_eq!(expand_range(&[8, 1, 3]).unwrap(), vec![8, 5, 2]);
        assert_eq!(expand_range(&[8, 1, -3]).unwrap(), vec![8, 5, 2]);
        assert_eq!(expand_range(&[-2, 2]).unwrap(), vec![-2, -1, 0, 1, 2]);
    }

    #[test]
    fn test_expand_range_rejects() {
        assert!(matches!(expand_range(&[]), Err(Error::InvalidIndexSpec(_))));
        assert!(matches!(expand_range(&[1, 2, 3, 4]), Err(Error::InvalidIndexSpec(_))));
        assert!(matches!(expand_range(&[1, 5, 0]), Err(Error::InvalidIndexSpec(_))));
    }

    #[test]
    fn test_expand_range_length_limit() {
        assert_eq!(expand_range_within(&[1, 4], 4).unwrap(), vec![1, 2, 3, 4]);
        assert!(matches!(expand_range_within(&[1, 5], 4), Err(Error::InvalidIndexSpec(_))));
        assert_eq!(expand_range_within(&[1, 9, 2], 5).unwrap(), vec![1, 3, 5, 7, 9]);
        assert!(matches!(
            expand_range(&[1, 1_000_000_000_000_000]),
            Err(Error::InvalidIndexSpec(_))
        ));
        assert!(matches!(
            expand_range(&[i64::MIN, i64::MAX]),
            Err(Error::InvalidIndexSpec(_))
        ));

        let spec = IndexSpec::new([4, 1]);
        assert_eq!(spec.expand_within(4).unwrap(), vec![4, 3, 2, 1]);
        assert!(spec.expand_within(3).is_err());
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(8, 3).unwrap(), 3);
        assert_eq!(resolve_index(8, -1).unwrap(), 8);
        assert!(resolve_index(8, 0).is_err());
        assert!(resolve_index(8, 9).is_err());
    }

    #[test]
    fn test_locate_led() {
        assert_eq!(locate_led(8, 1), (0, 0));
        assert_eq!(locate_led(8, 16), (1, 7));
        assert_eq!(locate_led(8, 17), (2, 0));
    }

    #[test]
    fn test_index_spec_values() {
        let spec: IndexSpec = serde_json::from_str("[1, -2]").unwrap();
        assert_eq!(spec.values().unwrap(), vec![1, -2]);

        let spec: IndexSpec = serde_json::from_str("[]").unwrap();
        assert!(matches!(spec.values(), Err(Error::InvalidIndexSpec(_))));

        let spec: IndexSpec = serde_json::from_str(r#"[1, "two"]"#).unwrap();
        assert!(matches!(spec.values(), Err(Error::InvalidIndexSpec(_))));

        let spec: IndexSpec = serde_json::from_str("[1.5]").unwrap();
        assert!(matches!(spec.expand(), Err(Error::InvalidIndexSpec(_))));
    }

    proptest! {
        #[test]
        fn prop_wrap_negative_in_scope(space in 2i64..10_000, n in -1_000_000i64..1_000_000) {
            let index = wrap_negative(space, n);
            prop_assert!((1..=space).contains(&index));
        }

        #[test]
        fn prop_wrap_negative_single_slot(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(wrap_negative(1, n), n.abs());
        }

        #[test]
        fn prop_relative_to_absolute_in_scope(
            scope in 1i64..64,
            per_scope in 2i64..64,
            local in -200i64..200,
            scopes in 1i64..64,
        ) {
            let total = per_scope * scopes;
            let index = relative_to_absolute(scope, per_scope, local, total);
            prop_assert!((1..=total).contains(&index));
        }

        #[test]
        fn prop_relative_to_absolute_any_local(
            scope in 1i64..1_000,
            per_scope in 2i64..1_000,
            local in any::<i64>(),
            total in 1i64..1_000_000,
        ) {
            let index = relative_to_absolute(scope, per_scope, local, total);
            prop_assert!((1..=total).contains(&index));
        }

        #[test]
        fn prop_expand_range_monotonic(start in -500i64..500, end in -500i64..500, step in 1i64..20) {
            let out = expand_range(&[start, end, step]).unwrap();
            prop_assert_eq!(out[0], start);
            for pair in out.windows(2) {
                prop_assert_eq!((pair[1] - pair[0]).abs(), step);
                prop_assert_eq!(pair[1] > pair[0], end > start);
            }
            let last = *out.last().unwrap();
            prop_assert!((last - end).abs() < step);

            let out = expand_range(&[start, end]).unwrap();
            prop_assert_eq!(out.len() as i64, (end - start).abs() + 1);
            prop_assert_eq!(*out.last().unwrap(), end);
        }
    }
}
