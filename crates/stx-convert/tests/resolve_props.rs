use proptest::prelude::*;
use stx_convert::{resolve_source, Selectors};

mod common;
use common::StubReader;

proptest! {
    /// A lone plate-bearing input with one plate and one well always
    /// resolves to one assignment per series, with unique, contiguous
    /// output indices starting at the offset.
    #[test]
    fn plate_assignments_are_contiguous(series in 1usize..16, offset in 0usize..32) {
        let reader = StubReader::new(1, 1, series);
        let selectors = Selectors { explicit_series: None, fov_offset: offset, input_count: 1 };
        let assignments = resolve_source(&reader, 0, &selectors).unwrap();
        prop_assert_eq!(assignments.len(), series);
        for (index, assignment) in assignments.iter().enumerate() {
            prop_assert_eq!(assignment.series, index);
            prop_assert_eq!(assignment.fov, index + offset);
        }
        let mut fovs: Vec<usize> = assignments.iter().map(|a| a.fov).collect();
        fovs.dedup();
        prop_assert_eq!(fovs.len(), assignments.len());
    }

    /// Non-plate sources resolve to exactly one assignment whose output
    /// index tracks the source position, never the series choice.
    #[test]
    fn non_plate_index_tracks_position(
        series in 1usize..8,
        position in 0usize..8,
        offset in 0usize..32,
    ) {
        let reader = StubReader::new(0, 0, series);
        let explicit = (series > 1).then_some(0);
        let selectors = Selectors {
            explicit_series: explicit,
            fov_offset: offset,
            input_count: position + 1,
        };
        let assignments = resolve_source(&reader, position, &selectors).unwrap();
        prop_assert_eq!(assignments.len(), 1);
        prop_assert_eq!(assignments[0].fov, position + offset);
    }

    /// Every malformed plate hierarchy maps onto its fixed code.
    #[test]
    fn plate_violations_carry_fixed_codes(
        plates in 1usize..4,
        wells in 0usize..4,
        inputs in 1usize..4,
    ) {
        let reader = StubReader::new(plates, wells, 2);
        let selectors = Selectors { explicit_series: None, fov_offset: 0, input_count: inputs };
        let result = resolve_source(&reader, 0, &selectors);
        if inputs > 1 {
            prop_assert_eq!(result.unwrap_err().code(), 8);
        } else if plates > 1 {
            prop_assert_eq!(result.unwrap_err().code(), 6);
        } else if wells != 1 {
            prop_assert_eq!(result.unwrap_err().code(), 7);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// Ambiguous non-plate sources always fail with the multiple-series
    /// code, whatever the offset.
    #[test]
    fn ambiguity_is_code_4(series in 2usize..16, offset in 0usize..32) {
        let reader = StubReader::new(0, 0, series);
        let selectors = Selectors { explicit_series: None, fov_offset: offset, input_count: 1 };
        let err = resolve_source(&reader, 0, &selectors).unwrap_err();
        prop_assert_eq!(err.code(), 4);
    }
}
