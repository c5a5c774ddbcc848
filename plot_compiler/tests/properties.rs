//! Property-based invariants of the geometry kernel, the grid frame and the
//! reference resolver.

use std::f64::consts::PI;

use plot_compiler::geometry::{distance, Point};
use plot_compiler::grid::{GridFrame, GridLayout};
use plot_compiler::record::{Record, Schema};
use plot_compiler::resolver::{FrameParams, ReferenceMap, ResolutionStack, Resolver};
use plot_compiler::store::MemoryStore;
use plot_compiler::surveying::{azimuth_to_angle, diameter_from_stems, polar_offset};
use proptest::prelude::*;

fn stems_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, 1..6)
}

fn tree(id: &str, reference: &str, hdist: f64, azimuth: f64, dbh: f64) -> Record {
    let (hdist, azimuth, dbh) = (hdist.to_string(), azimuth.to_string(), dbh.to_string());
    [id, "", "", "", dbh.as_str(), "", reference, hdist.as_str(), azimuth.as_str(), "", ""]
        .into_iter()
        .collect()
}

proptest! {
    #[test]
    fn single_stem_diameter(c in 0.1f64..1000.0) {
        let d = diameter_from_stems(&[c]).unwrap();
        prop_assert!((d - c / PI).abs() < 1e-9 * c.max(1.0));
    }

    #[test]
    fn diameter_grows_with_any_stem(
        stems in stems_strategy(),
        pick in any::<prop::sample::Index>(),
        growth in 0.0f64..100.0,
    ) {
        let before = diameter_from_stems(&stems).unwrap();
        let mut grown = stems.clone();
        let i = pick.index(grown.len());
        grown[i] += growth;
        let after = diameter_from_stems(&grown).unwrap();
        prop_assert!(after >= before - 1e-9);
    }

    #[test]
    fn extra_stem_never_shrinks_diameter(stems in stems_strategy(), extra in 0.0f64..500.0) {
        let before = diameter_from_stems(&stems).unwrap();
        let mut more = stems.clone();
        more.push(extra);
        prop_assert!(diameter_from_stems(&more).unwrap() >= before - 1e-9);
    }

    #[test]
    fn azimuth_angle_is_periodic(az in -720.0f64..720.0, offset in 0.0f64..360.0) {
        let a = azimuth_to_angle(az, offset);
        let b = azimuth_to_angle(az + 360.0, offset);
        prop_assert!((a.cos() - b.cos()).abs() < 1e-9);
        prop_assert!((a.sin() - b.sin()).abs() < 1e-9);
        prop_assert!((-PI..PI + 1e-12).contains(&a));
    }

    #[test]
    fn north_rotation_preserves_post_distances(plot_azimuth in 0.0f64..360.0) {
        let grid = GridFrame::new(plot_azimuth, true, GridLayout::default());
        for anchor in grid.anchors() {
            let origin = Point::default();
            let drift = distance(origin, anchor.north) - distance(origin, anchor.local);
            prop_assert!(drift.abs() < 1e-9);
        }
    }

    #[test]
    fn chain_equals_composed_offsets(
        legs in prop::collection::vec((0.5f64..30.0, 0.0f64..360.0, 0.0f64..80.0), 3),
        plot_azimuth in 0.0f64..360.0,
    ) {
        let frame = FrameParams {
            angle_offset: plot_azimuth,
            diameter_scale: 0.01,
            max_chain_depth: 16,
            follow_store: true,
        };
        let store = MemoryStore::new(
            Schema::standard(),
            vec![
                tree("1", "2", legs[0].0, legs[0].1, legs[0].2),
                tree("2", "3", legs[1].0, legs[1].1, legs[1].2),
                tree("3", "C4", legs[2].0, legs[2].1, legs[2].2),
            ],
        );
        let anchors = GridFrame::new(plot_azimuth, false, GridLayout::default()).reference_map();
        let resolved = Resolver::new(&store, frame)
            .resolve("1", &anchors, &mut ResolutionStack::new("0"))
            .unwrap();

        let mut expected = anchors.get("C4").unwrap();
        for (hdist, az, dbh) in legs.iter().rev() {
            expected = polar_offset(expected, *hdist, *az, dbh * 0.01, plot_azimuth);
        }
        prop_assert!((resolved.x - expected.x).abs() < 1e-6);
        prop_assert!((resolved.y - expected.y).abs() < 1e-6);
    }

    #[test]
    fn anchor_reference_is_anchor_plus_offset(hdist in 0.0f64..50.0, az in 0.0f64..360.0) {
        let anchors = ReferenceMap::with_origin("A0");
        let store = MemoryStore::new(Schema::standard(), vec![tree("1", "A0", hdist, az, 0.0)]);
        let frame = FrameParams {
            angle_offset: 0.0,
            diameter_scale: 1.0,
            max_chain_depth: 4,
            follow_store: true,
        };
        let p = Resolver::new(&store, frame)
            .resolve("1", &anchors, &mut ResolutionStack::new("9"))
            .unwrap();
        prop_assert_eq!(p, polar_offset(Point::default(), hdist, az, 0.0, 0.0));
    }
}

#[test]
fn unrotated_north_frame_equals_plot_frame() {
    let north = GridFrame::new(0.0, true, GridLayout::default()).reference_map();
    let local = GridFrame::new(0.0, false, GridLayout::default()).reference_map();
    assert_eq!(north, local);
}
