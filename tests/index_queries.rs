use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rstar::RTree;
use spatio_correlate::{ChunkIndex, IndexOptions, Lookup, Neighbor, distance};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_points(seed: u64, n: usize, width: f64, height: f64) -> Vec<[f64; 2]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| [rng.gen_range(0.0..width), rng.gen_range(0.0..height)])
        .collect()
}

/// Clustered data: most points packed into a few dense blobs, some spread out.
fn clustered_points(seed: u64, n: usize) -> Vec<[f64; 2]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centers = [[100.0, 100.0], [800.0, 150.0], [450.0, 900.0]];
    (0..n)
        .map(|i| {
            if i % 5 == 0 {
                [rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)]
            } else {
                let c = centers[i % centers.len()];
                [c[0] + rng.gen_range(0.0..8.0), c[1] + rng.gen_range(0.0..8.0)]
            }
        })
        .collect()
}

fn ids(hits: Vec<Neighbor<'_, [f64; 2]>>) -> Vec<usize> {
    hits.into_iter().map(|n| n.id).collect()
}

fn queries(seed: u64, n: usize) -> Vec<[f64; 2]> {
    // Some queries fall outside the data bounds on purpose.
    random_points(seed, n, 1400.0, 1400.0)
        .into_iter()
        .map(|[x, y]| [x - 200.0, y - 200.0])
        .collect()
}

#[test]
fn test_nearest_matches_rtree_oracle() {
    init_logging();

    for (seed, points) in [
        (1, random_points(11, 5_000, 1000.0, 1000.0)),
        (2, clustered_points(12, 5_000)),
        (3, random_points(13, 3_000, 1000.0, 5.0)),
    ] {
        let tree = RTree::bulk_load(points.clone());
        let mut index =
            ChunkIndex::with_options(points, IndexOptions::default().with_grid_span(40));
        let lookup = index.prepare();
        assert!(lookup.is_chunked());

        for q in queries(seed, 300) {
            let expected = tree.nearest_neighbor(&q).unwrap();
            let found = lookup.nearest_entry(q).unwrap();
            // Ties may resolve to a different point, but never to a farther one.
            assert_eq!(
                found.distance,
                distance((*expected).into(), q.into()),
                "seed {} query {:?}",
                seed,
                q
            );
        }
    }
}

#[test]
fn test_bounded_queries_match_rtree_oracle() {
    let points = clustered_points(21, 4_000);
    let tree = RTree::bulk_load(points.clone());
    let mut index = ChunkIndex::new(points);
    let lookup = index.prepare();

    for (i, q) in queries(22, 200).into_iter().enumerate() {
        let radius = [0.0, 1.0, 12.5, 80.0, 400.0][i % 5];

        let expected = tree.locate_within_distance(q, radius * radius).count();
        let found = lookup.all_within_entries(q, radius);
        assert_eq!(found.len(), expected, "query {:?} radius {}", q, radius);
        assert!(found.iter().all(|n| n.distance <= radius));
        assert!(found.windows(2).all(|w| w[0].distance <= w[1].distance));

        let nearest = lookup.nearest_within_entry(q, radius);
        assert_eq!(nearest.map(|n| n.id), found.first().map(|n| n.id));
    }
}

#[test]
fn test_chunked_and_linear_paths_agree() {
    let points = random_points(31, 2_500, 300.0, 700.0);
    let mut index = ChunkIndex::with_options(points.clone(), IndexOptions::default().eager(true));
    let linear_index = ChunkIndex::new(points);

    let chunked = index.lookup();
    let linear = Lookup::scan(&linear_index);
    assert!(chunked.is_chunked());
    assert!(!linear.is_chunked());

    for (i, q) in queries(32, 250).into_iter().enumerate() {
        let radius = (i % 7) as f64 * 9.0;

        assert_eq!(
            ids(chunked.all_within_entries(q, radius)),
            ids(linear.all_within_entries(q, radius))
        );
        assert_eq!(
            chunked.nearest_within_entry(q, radius).map(|n| n.id),
            linear.nearest_within_entry(q, radius).map(|n| n.id)
        );
        assert_eq!(
            chunked.nearest_entry(q).map(|n| n.id),
            linear.nearest_entry(q).map(|n| n.id)
        );
    }
}

#[test]
fn test_nearest_is_none_only_when_empty() {
    let empty: ChunkIndex<[f64; 2]> = ChunkIndex::new(Vec::new());
    assert!(empty.lookup().nearest([1.0, 1.0]).is_none());

    for n in [1, 2, 99, 101, 1_000] {
        let mut index = ChunkIndex::new(random_points(n as u64, n, 50.0, 50.0));
        let lookup = index.prepare();
        for q in queries(41, 20) {
            assert!(lookup.nearest(q).is_some(), "n = {}", n);
        }
    }
}

#[test]
fn test_all_by_distance_covers_everything() {
    let points = random_points(51, 400, 10.0, 10.0);
    let mut index = ChunkIndex::new(points);
    let lookup = index.prepare();

    let all = lookup.all_by_distance([5.0, 5.0]);
    assert_eq!(all.len(), 400);
    assert!(all.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert_eq!(all[0].id, lookup.nearest_entry([5.0, 5.0]).unwrap().id);
}

#[test]
fn test_grid_span_does_not_change_answers() {
    let points = clustered_points(61, 1_500);
    let reference = ChunkIndex::new(points.clone());
    let reference = Lookup::scan(&reference);

    for span in [1, 2, 7, 50, 300] {
        let mut index = ChunkIndex::with_options(
            points.clone(),
            IndexOptions::default().with_grid_span(span),
        );
        let lookup = index.materialize();
        for q in queries(62, 60) {
            assert_eq!(
                lookup.nearest_entry(q).map(|n| n.id),
                reference.nearest_entry(q).map(|n| n.id),
                "span {}",
                span
            );
            assert_eq!(
                lookup.all_within_entries(q, 25.0).len(),
                reference.all_within_entries(q, 25.0).len(),
                "span {}",
                span
            );
        }
    }
}

#[test]
fn test_collinear_points() {
    // Every point shares one x; that axis gets padded.
    let points: Vec<[f64; 2]> = (0..500).map(|i| [7.0, i as f64]).collect();
    let mut index = ChunkIndex::new(points);
    let lookup = index.prepare();

    let hit = lookup.nearest_entry([100.0, 250.2]).unwrap();
    assert_eq!(hit.id, 250);
    assert_eq!(lookup.all_within([7.0, 10.0], 2.0).len(), 5);
}

#[test]
fn test_prepared_index_shared_across_threads() {
    let points = random_points(71, 3_000, 100.0, 100.0);
    let mut index = ChunkIndex::new(points);
    index.prepare();
    let index = &index;

    let results: Vec<Vec<Option<usize>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let lookup = index.lookup();
                    queries(72, 50)
                        .into_iter()
                        .map(|q| lookup.nearest_entry(q).map(|n| n.id))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
