//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Generic over any [`Primitive`], so the same structure holds the triangles
//! of a mesh and the objects of a scene (which may themselves contain BVHs).
//!
//! Nodes live in a flat array and refer to their children by index. A node is
//! a leaf iff both child indices are equal; every node covers a contiguous
//! range of the primitive array, which the build reorders in place.

use crate::primitive::{Primitive, Trace};
use lumen_math::{Aabb, Interval, Ray};

/// Number of equal-width centroid buckets per axis for the SAH sweep.
const BUCKET_COUNT: usize = 16;

/// BVH node: a box over `primitives[start..start + size]` and two children.
#[derive(Debug, Clone, Copy)]
struct Node {
    bbox: Aabb,
    start: usize,
    size: usize,
    l: usize,
    r: usize,
}

impl Node {
    /// Interior nodes always get two distinct fresh children.
    #[inline]
    fn is_leaf(&self) -> bool {
        self.l == self.r
    }
}

/// Primitives falling into a range of buckets.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    bbox: Aabb,
    count: usize,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        bbox: Aabb::EMPTY,
        count: 0,
    };

    fn merged(&self, other: &Bucket) -> Bucket {
        Bucket {
            bbox: Aabb::surrounding(&self.bbox, &other.bbox),
            count: self.count + other.count,
        }
    }
}

/// Best split found so far: buckets `[0, boundary)` go left.
#[derive(Debug, Clone, Copy)]
struct Split {
    axis: usize,
    boundary: usize,
    cost: f32,
    left: Bucket,
    right: Bucket,
}

/// Bounding volume hierarchy over primitives of type `P`.
#[derive(Debug, Clone)]
pub struct Bvh<P> {
    nodes: Vec<Node>,
    primitives: Vec<P>,
    root: usize,
}

impl<P> Default for Bvh<P> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            primitives: Vec::new(),
            root: 0,
        }
    }
}

impl<P: Primitive> Bvh<P> {
    /// Build a BVH over `primitives`.
    ///
    /// Nodes with more than `max_leaf_size` primitives are split by binned
    /// SAH. A `max_leaf_size` of 0 splits until no split helps.
    pub fn new(primitives: Vec<P>, max_leaf_size: usize) -> Self {
        let mut bvh = Self::default();
        bvh.build(primitives, max_leaf_size);
        bvh
    }

    /// Rebuild the hierarchy from a new set of primitives.
    pub fn build(&mut self, primitives: Vec<P>, max_leaf_size: usize) {
        self.nodes.clear();
        self.primitives = primitives;

        let bbox = self
            .primitives
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bbox()));
        self.root = self.new_node(bbox, 0, self.primitives.len());

        // Explicit work stack keeps deep, unbalanced trees off the call stack
        let mut pending = vec![self.root];
        while let Some(idx) = pending.pop() {
            if let Some((l, r)) = self.split(idx, max_leaf_size) {
                pending.push(r);
                pending.push(l);
            }
        }

        log::debug!(
            "Built BVH: {} primitives, {} nodes, {} leaves, depth {}",
            self.primitives.len(),
            self.node_count(),
            self.leaf_count(),
            self.depth()
        );
    }

    /// Find the closest intersection within the ray's bounds.
    ///
    /// Primitives shrink `ray.dist_bounds.max` as they accept hits.
    pub fn hit(&self, ray: &mut Ray) -> Trace {
        let mut closest = Trace::miss(ray.origin);
        let Some(root) = self.nodes.get(self.root) else {
            return closest;
        };

        let mut times = Interval::UNIVERSE;
        if root.bbox.hit(ray, &mut times) {
            self.find_closest_hit(ray, self.root, &mut closest);
        }
        closest
    }

    /// Ordered near-first descent.
    fn find_closest_hit(&self, ray: &mut Ray, idx: usize, closest: &mut Trace) {
        let node = self.nodes[idx];
        if node.is_leaf() {
            for prim in &self.primitives[node.start..node.start + node.size] {
                let trace = prim.hit(ray);
                *closest = Trace::closest(*closest, trace);
            }
            return;
        }

        let mut times_l = Interval::UNIVERSE;
        let mut times_r = Interval::UNIVERSE;
        let hit_l = self.nodes[node.l].bbox.hit(ray, &mut times_l);
        let hit_r = self.nodes[node.r].bbox.hit(ray, &mut times_r);

        let (mut first, mut second) = ((node.l, hit_l, times_l), (node.r, hit_r, times_r));
        if !first.1 || (second.1 && second.2.min < first.2.min) {
            std::mem::swap(&mut first, &mut second);
        }

        if !first.1 {
            return;
        }
        self.find_closest_hit(ray, first.0, closest);

        // A subtree entered beyond the best hit cannot improve it
        if second.1 && (!closest.hit || closest.distance > second.2.min) {
            self.find_closest_hit(ray, second.0, closest);
        }
    }

    /// Partition a leaf in two if a split pays off. Returns the new children.
    fn split(&mut self, idx: usize, max_leaf_size: usize) -> Option<(usize, usize)> {
        let node = self.nodes[idx];
        if !node.is_leaf() || node.size <= max_leaf_size {
            return None;
        }
        let range = node.start..node.start + node.size;

        let mut best: Option<Split> = None;
        for axis in 0..3 {
            let extent = node.bbox.axis_interval(axis);

            let mut buckets = [Bucket::EMPTY; BUCKET_COUNT];
            for prim in &self.primitives[range.clone()] {
                let bbox = prim.bbox();
                let b = bucket_index(bbox.centroid()[axis], extent)?;
                buckets[b].bbox.enclose(&bbox);
                buckets[b].count += 1;
            }

            // right[k] covers buckets k..BUCKET_COUNT
            let mut right = [Bucket::EMPTY; BUCKET_COUNT];
            right[BUCKET_COUNT - 1] = buckets[BUCKET_COUNT - 1];
            for k in (0..BUCKET_COUNT - 1).rev() {
                right[k] = right[k + 1].merged(&buckets[k]);
            }

            let mut left = Bucket::EMPTY;
            for boundary in 1..BUCKET_COUNT {
                left = left.merged(&buckets[boundary - 1]);
                let right = right[boundary];
                if left.count == 0 || right.count == 0 {
                    continue;
                }

                let cost = left.bbox.surface_area() * left.count as f32
                    + right.bbox.surface_area() * right.count as f32;
                if best.map_or(true, |b| cost < b.cost) {
                    best = Some(Split {
                        axis,
                        boundary,
                        cost,
                        left,
                        right,
                    });
                }
            }
        }

        let split = best?;
        let extent = node.bbox.axis_interval(split.axis);
        let left_count = partition(&mut self.primitives[range], |p| {
            bucket_index(p.bbox().centroid()[split.axis], extent)
                .is_some_and(|b| b < split.boundary)
        });
        debug_assert_eq!(left_count, split.left.count);

        let l = self.new_node(split.left.bbox, node.start, left_count);
        let r = self.new_node(split.right.bbox, node.start + left_count, node.size - left_count);
        self.nodes[idx].l = l;
        self.nodes[idx].r = r;
        Some((l, r))
    }

    fn new_node(&mut self, bbox: Aabb, start: usize, size: usize) -> usize {
        self.nodes.push(Node {
            bbox,
            start,
            size,
            l: 0,
            r: 0,
        });
        self.nodes.len() - 1
    }
}

impl<P> Bvh<P> {
    /// Bounding box of everything in the hierarchy.
    pub fn bbox(&self) -> Aabb {
        self.nodes
            .get(self.root)
            .map_or(Aabb::EMPTY, |node| node.bbox)
    }

    /// Primitives in tree order.
    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }

    /// Tear down the hierarchy and hand back the primitives.
    pub fn into_primitives(self) -> Vec<P> {
        self.primitives
    }

    /// Remove all nodes and primitives.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.primitives.clear();
        self.root = 0;
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of levels (0 for an empty hierarchy, 1 for a single leaf).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let node = &self.nodes[idx];
            if !node.is_leaf() {
                stack.push((node.l, depth + 1));
                stack.push((node.r, depth + 1));
            }
        }
        max_depth
    }
}

impl<P: Primitive> Primitive for Bvh<P> {
    fn bbox(&self) -> Aabb {
        Bvh::bbox(self)
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        Bvh::hit(self, ray)
    }
}

/// Bucket of a centroid coordinate within `extent`.
///
/// The maximum maps to the last bucket. Anything else outside
/// `[0, BUCKET_COUNT)` is a numerical fault and aborts the split.
fn bucket_index(value: f32, extent: Interval) -> Option<usize> {
    if value == extent.max {
        return Some(BUCKET_COUNT - 1);
    }
    let width = extent.size() / BUCKET_COUNT as f32;
    let b = ((value - extent.min) / width).floor();
    if !(0.0..BUCKET_COUNT as f32).contains(&b) {
        log::warn!(
            "BVH bucket index out of range for {} in [{}, {}]; keeping leaf",
            value,
            extent.min,
            extent.max
        );
        return None;
    }
    Some(b as usize)
}

/// Move every item matching `pred` to the front. Returns how many matched.
fn partition<T>(items: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut first = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(first, i);
            first += 1;
        }
    }
    first
}
