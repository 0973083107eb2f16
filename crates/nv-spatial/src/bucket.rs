//! Integer bucket coordinates.

use nv_core::{Aabb, Vec3};

/// Coordinates of one cubic bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BucketKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BucketKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The bucket containing `p`.  Points exactly on a boundary belong to
    /// the bucket on the positive side.
    #[inline]
    pub fn containing(p: Vec3, bucket_size: f32) -> Self {
        Self {
            x: (p.x / bucket_size).floor() as i32,
            y: (p.y / bucket_size).floor() as i32,
            z: (p.z / bucket_size).floor() as i32,
        }
    }

    /// World-space box of this bucket.
    pub fn bounds(self, bucket_size: f32) -> Aabb {
        let min = Vec3::new(self.x as f32, self.y as f32, self.z as f32) * bucket_size;
        Aabb::new(min, min + Vec3::splat(bucket_size))
    }
}

/// Inclusive box of bucket keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BucketRange {
    pub min: BucketKey,
    pub max: BucketKey,
}

impl BucketRange {
    /// Every bucket `aabb` overlaps.
    pub fn covering(aabb: &Aabb, bucket_size: f32) -> Self {
        Self {
            min: BucketKey::containing(aabb.min, bucket_size),
            max: BucketKey::containing(aabb.max, bucket_size),
        }
    }

    /// Every bucket the sphere's bounding box overlaps.
    #[inline]
    pub fn of_sphere(center: Vec3, radius: f32, bucket_size: f32) -> Self {
        Self::covering(&Aabb::from_sphere(center, radius), bucket_size)
    }

    pub fn contains(&self, key: BucketKey) -> bool {
        (self.min.x..=self.max.x).contains(&key.x)
            && (self.min.y..=self.max.y).contains(&key.y)
            && (self.min.z..=self.max.z).contains(&key.z)
    }

    /// Number of buckets in the range, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        let (x, y, z) = self.spans();
        x.saturating_mul(y).saturating_mul(z)
    }

    fn spans(&self) -> (usize, usize, usize) {
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1).max(0) as usize;
        (span(self.min.x, self.max.x), span(self.min.y, self.max.y), span(self.min.z, self.max.z))
    }

    /// `true` when the range spans more than one bucket on at most one axis.
    /// A sphere then touches every bucket of its range; only ranges wider on
    /// two or more axes have corner buckets it can miss.
    pub fn is_slab(&self) -> bool {
        let (x, y, z) = self.spans();
        [x, y, z].iter().filter(|&&n| n > 1).count() <= 1
    }

    /// The buckets of this range that the sphere actually overlaps, in
    /// [`iter`](Self::iter) order.
    pub fn sphere_keys(&self, center: Vec3, radius: f32, bucket_size: f32) -> Vec<BucketKey> {
        if self.is_slab() {
            return self.iter().collect();
        }
        let radius = radius.max(0.0);
        self.iter()
            .filter(|key| key.bounds(bucket_size).intersects_sphere(center, radius))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in x-major, then y, then z order.
    pub fn iter(&self) -> impl Iterator<Item = BucketKey> + '_ {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| BucketKey::new(x, y, z)))
        })
    }
}
