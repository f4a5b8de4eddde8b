//! Iterative positional resolution of overlapping colliders.
//!
//! Every step scans all collider pairs, pushes overlapping shapes apart
//! and collects bounce directions, and repeats until a scan finds nothing.

use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{
    broadphase::{BroadPhase, BruteForce},
    narrowphase::{detect, Contact},
    shape::Shape,
};
use crate::{
    entity_set::{BodyKey, ColliderKey, EntityKey, EntitySet},
    math::{self as m, Vec2},
    transform::{TransformKey, TransformTree},
};

/// Tuning parameters of the [`CollisionResolver`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct ResolverParams {
    /// Number of full scans after which a step gives up on reaching a fixed point.
    /// One scan always runs, so zero behaves like one.
    pub max_iterations: usize,
    /// How fast the chaos factor grows, per second of simulated time,
    /// for every scan that still found contacts. Zero turns chaos off.
    pub chaos_rate: f32,
    /// Length of the random offset added to corrections at a chaos factor of one.
    pub chaos_nudge: f32,
    /// Seed for the random generator. `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            max_iterations: 128,
            chaos_rate: 1.0,
            chaos_nudge: 1.0,
            seed: None,
        }
    }
}

impl ResolverParams {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_chaos_rate(mut self, chaos_rate: f32) -> Self {
        self.chaos_rate = chaos_rate;
        self
    }

    pub fn with_chaos_nudge(mut self, chaos_nudge: f32) -> Self {
        self.chaos_nudge = chaos_nudge;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Summary of one resolution step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Number of full pair scans performed, including the final empty one.
    pub iterations: usize,
    /// Total number of contacts resolved over all scans.
    pub contacts: usize,
    /// False if the iteration limit was hit with contacts still remaining.
    pub converged: bool,
}

/// The entity-side data needed to move one half of a colliding pair.
#[derive(Clone, Copy, Debug)]
struct Side {
    entity: EntityKey,
    body: Option<BodyKey>,
    transform: TransformKey,
}

/// Pushes overlapping colliders apart and bounces their bodies.
pub struct CollisionResolver {
    params: ResolverParams,
    rng: StdRng,
    /// Candidate directions for every body hit during the current step.
    bounces: HashMap<BodyKey, Vec<Vec2>>,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(ResolverParams::default())
    }
}

impl CollisionResolver {
    pub fn new(params: ResolverParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            params,
            rng,
            bounces: HashMap::new(),
        }
    }

    #[inline]
    pub fn params(&self) -> &ResolverParams {
        &self.params
    }

    /// Replace the parameters. The random generator is reseeded if a seed is given.
    pub fn set_params(&mut self, params: ResolverParams) {
        if let Some(seed) = params.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.params = params;
    }

    /// Scan and separate colliders until no overlaps remain or the iteration limit is hit,
    /// then point every bounced body along the average of its bounce directions.
    pub fn resolve(
        &mut self,
        entities: &mut EntitySet,
        transforms: &mut TransformTree,
        dt: f32,
    ) -> Resolution {
        self.bounces.clear();
        let mut chaos = 0.0;
        let mut iterations = 0;
        let mut contacts = 0;

        let converged = loop {
            iterations += 1;
            let found = self.scan::<BruteForce>(entities, transforms, chaos);
            log::trace!("Resolver scan {} found {} contacts", iterations, found);
            if found == 0 {
                break true;
            }
            contacts += found;
            if iterations >= self.params.max_iterations {
                log::warn!(
                    "Collision resolution did not converge in {} iterations",
                    iterations
                );
                break false;
            }
            chaos += dt * self.params.chaos_rate;
        };
        log::debug!(
            "Resolved {} contacts in {} iterations",
            contacts,
            iterations
        );

        self.apply_bounces(entities);

        Resolution {
            iterations,
            contacts,
            converged,
        }
    }

    /// One pass over every collider pair. Returns the number of contacts found.
    fn scan<B: BroadPhase>(
        &mut self,
        entities: &EntitySet,
        transforms: &mut TransformTree,
        chaos: f32,
    ) -> usize {
        let keys: Vec<ColliderKey> = entities.colliders().map(|(k, _)| k).collect();
        let mut found = 0;
        for [c1, c2] in B::pairs(keys.into_iter()) {
            let (Some(a), Some(b)) = (side(entities, c1), side(entities, c2)) else {
                continue;
            };
            if a.entity == b.entity || (a.body.is_none() && b.body.is_none()) {
                continue;
            }
            // shapes are recomputed for every pair since earlier pairs may have moved them
            let (Some(shape_a), Some(shape_b)) = (
                world_shape(entities, transforms, c1),
                world_shape(entities, transforms, c2),
            ) else {
                continue;
            };
            if let Some(contact) = detect(&shape_a, &shape_b) {
                found += 1;
                self.resolve_contact(&contact, [a, b], entities, transforms, chaos);
            }
        }
        found
    }

    fn resolve_contact(
        &mut self,
        contact: &Contact,
        [a, b]: [Side; 2],
        entities: &EntitySet,
        transforms: &mut TransformTree,
        chaos: f32,
    ) {
        let separation = contact.separation();
        let moves = match (a.body, b.body) {
            (Some(_), Some(_)) => vec![(a, separation / 2.0), (b, -separation / 2.0)],
            (Some(_), None) => vec![(a, separation)],
            (None, Some(_)) => vec![(b, -separation)],
            (None, None) => {
                log::warn!("Two colliders without bodies reached the resolver");
                return;
            }
        };

        let normal = contact.bounce_normal();
        for (side, correction) in moves {
            let correction = self.jitter(correction, chaos);
            if transforms.translate(side.transform, correction).is_err() {
                log::warn!("Collider owner {:?} lost its transform", side.entity);
            }
            let Some(body_key) = side.body else {
                continue;
            };
            let Some(body) = entities.get_body(body_key) else {
                continue;
            };
            if let Some(dir) = m::try_normalized(m::reflect(body.velocity, normal)) {
                self.bounces.entry(body_key).or_default().push(dir);
            }
        }
    }

    /// Scale a correction by a random factor and add a random offset,
    /// both proportional to the current chaos.
    fn jitter(&mut self, correction: Vec2, chaos: f32) -> Vec2 {
        if chaos == 0.0 {
            return correction;
        }
        let factor = 1.0 + chaos * self.rng.gen::<f32>();
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let nudge = Vec2::new(angle.cos(), angle.sin()) * chaos * self.params.chaos_nudge;
        correction * factor + nudge
    }

    fn apply_bounces(&mut self, entities: &mut EntitySet) {
        for (body_key, dirs) in self.bounces.drain() {
            if let Some(body) = entities.get_body_mut(body_key) {
                body.redirect(m::average(dirs).normalized());
            }
        }
    }
}

fn side(entities: &EntitySet, coll: ColliderKey) -> Option<Side> {
    let entity = entities.get_collider(coll)?.entity;
    let owner = entities.get(entity)?;
    Some(Side {
        entity,
        body: owner.body,
        transform: owner.transform,
    })
}

fn world_shape(
    entities: &EntitySet,
    transforms: &TransformTree,
    coll: ColliderKey,
) -> Option<Shape> {
    let collider = entities.get_collider(coll)?;
    let transform = entities.get(collider.entity)?.transform;
    let matrix = transforms.local_to_world(transform)?;
    Some(collider.shape.world_shape(&matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::ColliderShape,
        entity_set::Entity,
        math::tests::assert_vec_eq,
        physics::Body,
        transform::Transform,
    };

    struct Scene {
        entities: EntitySet,
        transforms: TransformTree,
        resolver: CollisionResolver,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                entities: EntitySet::new(),
                transforms: TransformTree::new(),
                resolver: CollisionResolver::new(
                    ResolverParams::default().with_chaos_rate(0.0).with_seed(7),
                ),
            }
        }

        fn add(&mut self, position: Vec2, shape: ColliderShape, body: Option<Body>) -> EntityKey {
            let transform = self
                .transforms
                .insert(Transform::new().with_position(position));
            let key = self.entities.insert(Entity {
                name: format!("e{}", self.entities.entity_count()),
                tags: Vec::new(),
                transform,
                body: None,
                colliders: Vec::new(),
            });
            if let Some(body) = body {
                self.entities.attach_body(key, body).unwrap();
            }
            self.entities.attach_collider(key, shape).unwrap();
            key
        }

        fn rect(&mut self, position: Vec2, size: Vec2, body: Option<Body>) -> EntityKey {
            let shape = ColliderShape::Rect {
                local_position: Vec2::zero(),
                size,
            };
            self.add(position, shape, body)
        }

        fn circle(&mut self, position: Vec2, radius: f32, body: Option<Body>) -> EntityKey {
            let shape = ColliderShape::Circle {
                local_center: Vec2::zero(),
                radius,
            };
            self.add(position, shape, body)
        }

        fn position(&self, e: EntityKey) -> Vec2 {
            let transform = self.entities.get(e).unwrap().transform;
            self.transforms.position(transform).unwrap()
        }

        fn velocity(&self, e: EntityKey) -> Vec2 {
            let body = self.entities.get(e).unwrap().body().unwrap();
            self.entities.get_body(body).unwrap().velocity
        }

        fn resolve(&mut self) -> Resolution {
            self.resolver
                .resolve(&mut self.entities, &mut self.transforms, 1.0 / 60.0)
        }
    }

    #[test]
    fn equal_rect_bodies_end_exactly_touching() {
        let mut scene = Scene::new();
        let size = Vec2::new(10.0, 10.0);
        let a = scene.rect(Vec2::new(0.0, 0.0), size, Some(Body::new()));
        let b = scene.rect(Vec2::new(8.0, 2.0), size, Some(Body::new()));

        let res = scene.resolve();
        assert!(res.converged);
        assert_eq!(res.contacts, 1);
        assert_eq!(res.iterations, 2);

        assert_vec_eq(scene.position(a), Vec2::new(-1.0, 0.0));
        assert_vec_eq(scene.position(b), Vec2::new(9.0, 2.0));
        // distance between centers equals the sum of half extents
        let dist = (scene.position(b).x - scene.position(a).x).abs();
        assert!((dist - 10.0).abs() < 1e-5);
    }

    #[test]
    fn static_collider_is_an_anchor() {
        let mut scene = Scene::new();
        let wall = scene.rect(Vec2::new(0.0, 0.0), Vec2::new(10.0, 100.0), None);
        let ball = scene.circle(
            Vec2::new(13.0, 50.0),
            5.0,
            Some(Body::new().with_velocity(Vec2::new(-20.0, 0.0))),
        );

        let res = scene.resolve();
        assert!(res.converged);
        assert_vec_eq(scene.position(wall), Vec2::zero());
        assert_vec_eq(scene.position(ball), Vec2::new(15.0, 50.0));
        assert_vec_eq(scene.velocity(ball), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn bodiless_pairs_are_ignored() {
        let mut scene = Scene::new();
        let a = scene.rect(Vec2::zero(), Vec2::new(10.0, 10.0), None);
        let b = scene.circle(Vec2::new(5.0, 5.0), 3.0, None);

        let res = scene.resolve();
        assert_eq!(
            res,
            Resolution {
                iterations: 1,
                contacts: 0,
                converged: true
            }
        );
        assert_vec_eq(scene.position(a), Vec2::zero());
        assert_vec_eq(scene.position(b), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn circle_bodies_split_the_overlap() {
        let mut scene = Scene::new();
        let a = scene.circle(
            Vec2::new(0.0, 0.0),
            5.0,
            Some(Body::new().with_velocity(Vec2::new(3.0, 0.0))),
        );
        let b = scene.circle(
            Vec2::new(6.0, 0.0),
            5.0,
            Some(Body::new().with_velocity(Vec2::new(-4.0, 0.0))),
        );

        assert!(scene.resolve().converged);
        assert_vec_eq(scene.position(a), Vec2::new(-2.0, 0.0));
        assert_vec_eq(scene.position(b), Vec2::new(8.0, 0.0));
        // speeds are kept, headings flipped
        assert_vec_eq(scene.velocity(a), Vec2::new(-3.0, 0.0));
        assert_vec_eq(scene.velocity(b), Vec2::new(4.0, 0.0));
    }

    #[test]
    fn opposite_bounces_stop_the_body() {
        let mut scene = Scene::new();
        let body = scene.rect(
            Vec2::zero(),
            Vec2::new(10.0, 10.0),
            Some(Body::new().with_velocity(Vec2::new(10.0, 0.0))),
        );
        // a wall to the left and a floor below, both overlapping by one unit
        scene.rect(Vec2::new(-9.0, -100.0), Vec2::new(10.0, 200.0), None);
        scene.rect(Vec2::new(-100.0, 9.0), Vec2::new(200.0, 10.0), None);

        let res = scene.resolve();
        assert!(res.converged);
        assert_eq!(res.contacts, 2);
        assert_vec_eq(scene.position(body), Vec2::new(1.0, -1.0));
        assert_eq!(scene.velocity(body), Vec2::zero());
    }

    #[test]
    fn gives_up_at_the_iteration_limit() {
        let mut scene = Scene::new();
        scene.resolver.set_params(
            ResolverParams::default()
                .with_chaos_rate(0.0)
                .with_max_iterations(1),
        );
        scene.rect(Vec2::zero(), Vec2::new(10.0, 10.0), Some(Body::new()));
        scene.rect(Vec2::new(5.0, 1.0), Vec2::new(10.0, 10.0), None);

        let res = scene.resolve();
        assert!(!res.converged);
        assert_eq!(res.iterations, 1);
        assert_eq!(res.contacts, 1);
    }

    #[test]
    fn circle_before_static_rect_moves_the_circle() {
        let mut scene = Scene::new();
        let ball = scene.circle(
            Vec2::new(13.0, 50.0),
            5.0,
            Some(Body::new().with_velocity(Vec2::new(-20.0, 0.0))),
        );
        let wall = scene.rect(Vec2::new(0.0, 0.0), Vec2::new(10.0, 100.0), None);

        let res = scene.resolve();
        assert!(res.converged);
        assert_eq!(res.contacts, 1);
        assert_vec_eq(scene.position(wall), Vec2::zero());
        assert_vec_eq(scene.position(ball), Vec2::new(15.0, 50.0));
        assert_vec_eq(scene.velocity(ball), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn rect_and_circle_bodies_split_the_push() {
        let mut scene = Scene::new();
        let block = scene.rect(
            Vec2::zero(),
            Vec2::new(10.0, 10.0),
            Some(Body::new().with_velocity(Vec2::new(5.0, 0.0))),
        );
        let ball = scene.circle(
            Vec2::new(13.0, 5.0),
            5.0,
            Some(Body::new().with_velocity(Vec2::new(-5.0, 0.0))),
        );

        let res = scene.resolve();
        assert!(res.converged);
        assert_eq!(res.contacts, 1);
        assert_vec_eq(scene.position(block), Vec2::new(-1.0, 0.0));
        assert_vec_eq(scene.position(ball), Vec2::new(14.0, 5.0));
        assert_vec_eq(scene.velocity(block), Vec2::new(-5.0, 0.0));
        assert_vec_eq(scene.velocity(ball), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn empty_scene_converges_with_zero_iteration_limit() {
        let mut scene = Scene::new();
        scene
            .resolver
            .set_params(ResolverParams::default().with_max_iterations(0));
        let res = scene.resolve();
        assert_eq!(
            res,
            Resolution {
                iterations: 1,
                contacts: 0,
                converged: true
            }
        );
    }

    /// A body wider than the gap between two walls, overlapping both by one unit.
    fn wedged_scene(params: ResolverParams) -> Scene {
        let mut scene = Scene::new();
        scene.resolver.set_params(params);
        let size = Vec2::new(10.0, 10.0);
        scene.rect(Vec2::new(-1.0, 0.0), size, Some(Body::new()));
        scene.rect(Vec2::new(-10.0, 0.0), size, None);
        scene.rect(Vec2::new(8.0, 0.0), size, None);
        scene
    }

    #[test]
    fn wedged_body_cycles_without_chaos() {
        let mut scene = wedged_scene(ResolverParams::default().with_chaos_rate(0.0));
        let res = scene.resolve();
        assert!(!res.converged);
        assert_eq!(res.iterations, 128);
    }

    #[test]
    fn chaos_frees_a_wedged_body() {
        let mut scene = wedged_scene(ResolverParams::default().with_seed(1));
        let res = scene.resolve();
        assert!(res.converged);
        assert!(res.iterations < 128);
    }

    #[test]
    fn jitter_stays_within_chaos_bounds() {
        let mut resolver =
            CollisionResolver::new(ResolverParams::default().with_chaos_nudge(0.0).with_seed(9));
        let correction = Vec2::new(2.0, 0.0);
        assert_eq!(resolver.jitter(correction, 0.0), correction);
        // without the nudge only the length changes, by a factor in [1, 1 + chaos)
        for _ in 0..100 {
            let scaled = resolver.jitter(correction, 0.5);
            assert_eq!(scaled.y, 0.0);
            assert!(scaled.x >= 2.0 && scaled.x < 3.0, "scaled to {:?}", scaled);
        }

        let mut resolver =
            CollisionResolver::new(ResolverParams::default().with_chaos_nudge(2.0).with_seed(9));
        // a zero correction is moved by exactly chaos * nudge
        for _ in 0..100 {
            let nudged = resolver.jitter(Vec2::zero(), 0.5);
            assert!((nudged.mag() - 1.0).abs() < 1e-5, "nudged to {:?}", nudged);
        }
    }

    #[test]
    fn chaos_is_reproducible_with_a_seed() {
        let run = || {
            let mut scene = Scene::new();
            scene.resolver.set_params(
                ResolverParams::default()
                    .with_chaos_rate(30.0)
                    .with_seed(42),
            );
            let bodies: Vec<EntityKey> = (0..3)
                .map(|i| scene.circle(Vec2::new(i as f32, 0.0), 5.0, Some(Body::new())))
                .collect();
            let res = scene.resolve();
            (res, bodies.iter().map(|&b| scene.position(b)).collect::<Vec<_>>())
        };
        let (res1, pos1) = run();
        let (res2, pos2) = run();
        assert_eq!(res1, res2);
        assert_eq!(pos1, pos2);
    }
}
