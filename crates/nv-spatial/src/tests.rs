//! Unit tests for nv-spatial.

#[cfg(test)]
mod helpers {
    use nv_agent::{Mover, MoverParams};
    use nv_core::{MoverId, Vec3};

    pub fn mover(id: u32, position: Vec3, radius: f32) -> Mover {
        let params = MoverParams { radius, ..MoverParams::default() };
        Mover::new(MoverId(id), position, &params)
    }

    /// Brute-force reference for `query_neighbors`.
    pub fn brute_force(movers: &[Mover], position: Vec3, radius: f32) -> Vec<MoverId> {
        let mut ids: Vec<MoverId> = movers
            .iter()
            .filter(|m| m.position.distance(position) <= radius + m.radius())
            .map(|m| m.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use nv_core::NavError;

    use crate::{SpatialError, SpatialIndex};

    #[test]
    fn rejects_bad_bucket_sizes() {
        for size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(SpatialIndex::new(size), Err(SpatialError::InvalidBucketSize(_))));
        }
    }

    #[test]
    fn bad_bucket_size_maps_to_invalid_configuration() {
        let err: NavError = SpatialError::InvalidBucketSize(0.0).into();
        assert!(matches!(err, NavError::InvalidConfiguration(_)));
    }

    #[test]
    fn empty_index_answers_nothing() {
        let index = SpatialIndex::new(2.0).unwrap();
        assert!(index.query_neighbors(nv_core::Vec3::ZERO, 100.0).is_empty());
        assert_eq!(index.stats().buckets, 0);
    }
}

// ── Buckets ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod buckets {
    use nv_core::{Aabb, Vec3};

    use crate::{BucketKey, BucketRange};

    #[test]
    fn negative_coordinates_floor() {
        assert_eq!(BucketKey::containing(Vec3::new(-0.1, 0.0, 1.9), 1.0), BucketKey::new(-1, 0, 1));
    }

    #[test]
    fn sphere_spanning_boundary_covers_both_sides() {
        let range = BucketRange::of_sphere(Vec3::new(0.9, 0.5, 0.5), 0.2, 1.0);
        assert_eq!(range.len(), 2);
        assert!(range.contains(BucketKey::new(0, 0, 0)));
        assert!(range.contains(BucketKey::new(1, 0, 0)));
        assert_eq!(range.iter().count(), 2);
    }

    #[test]
    fn aabb_range_is_inclusive() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(2.5, 0.0, 0.5));
        let range = BucketRange::covering(&aabb, 1.0);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn huge_range_length_saturates() {
        let range = BucketRange::of_sphere(Vec3::ZERO, 1e7, 0.001);
        assert_eq!(range.len(), usize::MAX);
        assert!(!range.is_empty());
    }

    #[test]
    fn sphere_keys_skip_untouched_corner() {
        // Box spans two buckets on x and z; the sphere misses the far corner.
        let center = Vec3::new(0.93, 0.5, 0.93);
        let range = BucketRange::of_sphere(center, 0.09, 1.0);
        assert_eq!(range.len(), 4);
        let keys = range.sphere_keys(center, 0.09, 1.0);
        assert_eq!(keys, [BucketKey::new(0, 0, 0), BucketKey::new(0, 0, 1), BucketKey::new(1, 0, 0)]);
    }

    #[test]
    fn slab_ranges_keep_every_bucket() {
        let center = Vec3::new(1.0, 0.5, 0.5);
        let range = BucketRange::of_sphere(center, 0.4, 1.0);
        assert!(range.is_slab());
        assert_eq!(range.len(), 2);
        assert_eq!(range.sphere_keys(center, 0.4, 1.0).len(), 2);
    }
}

// ── Movers ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod movers {
    use nv_agent::IndexState;
    use nv_core::{MoverId, Vec3};

    use super::helpers::mover;
    use crate::{BucketKey, SpatialError, SpatialIndex};

    #[test]
    fn close_movers_in_unit_buckets_are_both_found() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut a = mover(0, Vec3::ZERO, 0.2);
        let mut b = mover(1, Vec3::new(0.5, 0.0, 0.0), 0.2);
        index.insert_mover(&mut a);
        index.insert_mover(&mut b);
        assert_eq!(index.query_neighbors(Vec3::ZERO, 1.0), vec![MoverId(0), MoverId(1)]);
    }

    #[test]
    fn mover_registered_in_every_overlapped_bucket() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut m = mover(0, Vec3::new(1.0, 0.5, 1.0), 0.25);
        index.insert_mover(&mut m);
        let keys = index.buckets_of(MoverId(0)).unwrap();
        assert_eq!(keys.len(), 4);
        for &key in keys {
            assert_eq!(index.bucket_movers(key), vec![MoverId(0)]);
        }
        assert!(index.bucket_movers(BucketKey::new(5, 5, 5)).is_empty());
    }

    #[test]
    fn repeated_update_is_idempotent() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut m = mover(0, Vec3::new(0.3, 0.3, 0.3), 0.5);
        index.insert_mover(&mut m);
        let before = index.buckets_of(m.id).unwrap().to_vec();
        let members_before: Vec<_> = before.iter().map(|&k| index.bucket_movers(k)).collect();

        assert!(!index.update_mover(&mut m));
        assert!(!index.update_mover(&mut m));

        let after = index.buckets_of(m.id).unwrap().to_vec();
        let members_after: Vec<_> = after.iter().map(|&k| index.bucket_movers(k)).collect();
        assert_eq!(before, after);
        assert_eq!(members_before, members_after);
    }

    #[test]
    fn movement_within_buckets_skips_reregistration() {
        let mut index = SpatialIndex::new(4.0).unwrap();
        let mut m = mover(0, Vec3::new(1.0, 1.0, 1.0), 0.5);
        index.insert_mover(&mut m);
        let version = index.mover_version();

        m.position = Vec3::new(1.5, 1.0, 1.0);
        assert!(!index.update_mover(&mut m));
        assert_eq!(index.mover_version(), version);
        assert_eq!(index.mover(m.id).unwrap().position, m.position);
    }

    #[test]
    fn corner_bucket_joins_only_when_touched() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut m = mover(0, Vec3::new(0.93, 0.5, 0.93), 0.09);
        index.insert_mover(&mut m);
        let corner = BucketKey::new(1, 0, 1);
        assert_eq!(index.buckets_of(m.id).unwrap().len(), 3);
        assert!(index.bucket_movers(corner).is_empty());

        // Same box range, but now the sphere reaches the corner bucket.
        m.position = Vec3::new(0.97, 0.5, 0.97);
        assert!(index.update_mover(&mut m));
        assert_eq!(index.bucket_movers(corner), vec![m.id]);
        assert_eq!(index.buckets_of(m.id).unwrap().len(), 4);
    }

    #[test]
    fn huge_query_radius_on_a_fine_grid() {
        let mut index = SpatialIndex::new(0.001).unwrap();
        let mut m = mover(0, Vec3::new(5.0, 0.0, 5.0), 0.0005);
        index.insert_mover(&mut m);
        assert_eq!(index.query_neighbors(Vec3::ZERO, 1e7), vec![m.id]);
        assert_eq!(index.candidate_movers(Vec3::ZERO, 1e7), vec![m.id]);
    }

    #[test]
    fn crossing_boundary_reregisters() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut m = mover(0, Vec3::new(0.5, 0.5, 0.5), 0.1);
        index.insert_mover(&mut m);
        let version = index.mover_version();

        m.position = Vec3::new(1.5, 0.5, 0.5);
        assert!(index.update_mover(&mut m));
        assert!(index.mover_version() > version);
        assert!(index.bucket_movers(BucketKey::new(0, 0, 0)).is_empty());
        assert_eq!(index.bucket_movers(BucketKey::new(1, 0, 0)), vec![m.id]);
    }

    #[test]
    fn dirty_mover_always_reregisters() {
        let mut index = SpatialIndex::new(4.0).unwrap();
        let mut m = mover(0, Vec3::new(1.0, 1.0, 1.0), 0.5);
        index.insert_mover(&mut m);
        m.request_reindex();
        assert_eq!(m.index_state(), IndexState::Dirty);
        assert!(index.update_mover(&mut m));
        assert_eq!(m.index_state(), IndexState::Indexed);
    }

    #[test]
    fn removed_mover_is_never_returned() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut a = mover(0, Vec3::ZERO, 0.5);
        let mut b = mover(1, Vec3::new(0.2, 0.0, 0.0), 0.5);
        index.insert_mover(&mut a);
        index.insert_mover(&mut b);
        index.remove_mover(a.id).unwrap();

        assert_eq!(index.query_neighbors(Vec3::ZERO, 5.0), vec![b.id]);
        assert!(index.candidate_movers(Vec3::ZERO, 5.0).iter().all(|&id| id != a.id));
        assert_eq!(index.remove_mover(a.id), Err(SpatialError::UnknownMover(a.id)));
    }

    #[test]
    fn removing_last_mover_frees_buckets() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut m = mover(0, Vec3::ZERO, 2.0);
        index.insert_mover(&mut m);
        assert!(index.stats().buckets > 1);
        index.remove_mover(m.id).unwrap();
        assert_eq!(index.stats().buckets, 0);
    }

    #[test]
    fn query_region_tracking() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let id = MoverId(3);
        assert!(index.track_query_region(id, Vec3::ZERO, 2.0));
        assert!(!index.track_query_region(id, Vec3::new(0.1, 0.0, 0.0), 2.0));
        assert!(index.track_query_region(id, Vec3::new(1.5, 0.0, 0.0), 2.0));
    }
}

// ── Obstacles ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod obstacles {
    use nv_agent::Obstacle;
    use nv_core::{ObstacleId, Tick, Triangle, Vec3};

    use crate::{SpatialError, SpatialIndex};

    fn floor_tile(id: u32, x: f32) -> Obstacle {
        let tri = Triangle::new(
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 1.0, 0.0, 0.0),
            Vec3::new(x, 0.0, 1.0),
        );
        Obstacle::new(ObstacleId(id), tri, Tick::ZERO)
    }

    #[test]
    fn query_uses_exact_triangle_distance() {
        let mut index = SpatialIndex::new(2.0).unwrap();
        index.insert_obstacle(&floor_tile(0, 0.0));
        index.insert_obstacle(&floor_tile(1, 10.0));

        assert_eq!(index.query_obstacles(Vec3::new(0.2, 0.5, 0.2), 1.0), vec![ObstacleId(0)]);
        // Inside the tile's bounding box but beyond the hypotenuse.
        assert!(index.query_obstacles(Vec3::new(1.0, 0.0, 1.0), 0.1).is_empty());
    }

    #[test]
    fn update_rebuckets_and_bumps_version() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        index.insert_obstacle(&floor_tile(0, 0.0));
        let version = index.obstacle_version();

        index.update_obstacle(&floor_tile(0, 20.0)).unwrap();
        assert!(index.obstacle_version() > version);
        assert!(index.query_obstacles(Vec3::new(0.2, 0.0, 0.2), 0.5).is_empty());
        assert_eq!(index.query_obstacles(Vec3::new(20.2, 0.0, 0.2), 0.5), vec![ObstacleId(0)]);
    }

    #[test]
    fn unknown_obstacles_are_errors() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        assert_eq!(
            index.update_obstacle(&floor_tile(4, 0.0)),
            Err(SpatialError::UnknownObstacle(ObstacleId(4)))
        );
        assert_eq!(index.remove_obstacle(ObstacleId(4)), Err(SpatialError::UnknownObstacle(ObstacleId(4))));
    }
}

// ── Order independence ────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use nv_agent::Mover;
    use nv_core::Vec3;

    use super::helpers::{brute_force, mover};
    use crate::SpatialIndex;

    fn random_movers(rng: &mut SmallRng, n: u32) -> Vec<Mover> {
        (0..n)
            .map(|i| {
                let p = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-10.0..10.0),
                );
                mover(i, p, rng.gen_range(0.1..1.5))
            })
            .collect()
    }

    #[test]
    fn neighbours_match_brute_force_for_any_insertion_order() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let movers = random_movers(&mut rng, 60);
        let probes: Vec<(Vec3, f32)> = (0..20)
            .map(|_| {
                let p = Vec3::new(rng.gen_range(-10.0..10.0), 0.0, rng.gen_range(-10.0..10.0));
                (p, rng.gen_range(0.5..4.0))
            })
            .collect();

        for round in 0..5 {
            let mut order: Vec<usize> = (0..movers.len()).collect();
            order.shuffle(&mut rng);

            let mut index = SpatialIndex::new(1.5).unwrap();
            let mut copies = movers.clone();
            for &i in &order {
                index.insert_mover(&mut copies[i]);
            }

            for &(p, r) in &probes {
                assert_eq!(
                    index.query_neighbors(p, r),
                    brute_force(&movers, p, r),
                    "round {round}, probe {p:?} r={r}"
                );
            }
        }
    }

    #[test]
    fn incremental_updates_match_fresh_index() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut movers = random_movers(&mut rng, 40);

        let mut live = SpatialIndex::new(2.0).unwrap();
        for m in &mut movers {
            live.insert_mover(m);
        }
        for _ in 0..10 {
            for m in &mut movers {
                m.position += Vec3::new(rng.gen_range(-0.8..0.8), 0.0, rng.gen_range(-0.8..0.8));
                live.update_mover(m);
            }
        }

        let mut fresh = SpatialIndex::new(2.0).unwrap();
        let mut copies = movers.clone();
        for m in &mut copies {
            fresh.insert_mover(m);
        }
        for m in &movers {
            assert_eq!(live.buckets_of(m.id), fresh.buckets_of(m.id));
            assert_eq!(
                live.query_neighbors(m.position, 3.0),
                fresh.query_neighbors(m.position, 3.0)
            );
        }
    }
}
