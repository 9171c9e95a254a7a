use flow_nif::{
    Context,
    data_structures::{
        collision::{CollisionNode, CollisionShape},
        scene_graph::{Component, SceneNode},
    },
};

use crate::common::{
    build, close, decode,
    nif_writer::{
        Av, Body, NifWriter, TestChunk, box_shape, capsule_shape, collision_object,
        NONE, compressed_mesh, compressed_mesh_data, compressed_mesh_data_with_materials, convex_shape, lighting_shader, list_shape,
        mopp, node, rigid_body, sphere_shape, tri_shape, tri_shape_data,
    },
};

mod common;

/// Havok units per source unit in Skyrim files, over source units per meter.
const K: f32 = 69.99124 / 70.0;

/// A root node named "Static" whose collision object owns a rigid body
/// around `shape`.
fn with_body(mut w: NifWriter, transformed: bool, shape: i32, body: Body) -> NifWriter {
    let body = rigid_body(&mut w, transformed, shape, body);
    let owner = w.len() as i32 + 1;
    let object = collision_object(&mut w, owner, body);
    let root = node(
        &mut w,
        "BSFadeNode",
        Av {
            collision: object,
            ..Av::named("Static")
        },
        &[],
    );
    w.root(root);
    w
}

fn collision_of(w: NifWriter, context: &Context) -> Option<CollisionNode> {
    let file = decode(w.finish());
    let scene: SceneNode = build(&file, context).unwrap();
    assert_eq!(scene.name, "Static");
    scene.collision().cloned()
}

#[test]
fn box_under_a_rigid_body_keeps_body_parameters() {
    let mut w = NifWriter::skyrim();
    let shape = box_shape(&mut w, [0.5, 1.0, 1.5]);
    let w = with_body(
        w,
        false,
        shape,
        Body {
            layer: 13,
            mass: 25.0,
            friction: 0.8,
            ..Default::default()
        },
    );

    let collision = collision_of(w, &Context::default()).unwrap();
    assert_eq!(collision.name, "bhkBoxShape");
    match collision.shape {
        Some(CollisionShape::Box { half_extents }) => {
            assert!(close(half_extents, [0.5 * K, 1.5 * K, 1.0 * K]), "{half_extents:?}");
        }
        ref other => panic!("expected a box, got {other:?}"),
    }
    let body = collision.body.unwrap();
    assert_eq!(body.layer, 13);
    assert_eq!(body.mass, 25.0);
    assert_eq!(body.friction, 0.8);
    assert_eq!(body.restitution, 0.4);
    assert!(collision.transform.is_identity());
}

#[test]
fn sphere_and_capsule_are_scaled_into_meters() {
    let mut w = NifWriter::skyrim();
    let sphere = sphere_shape(&mut w, 2.0);
    let capsule = capsule_shape(&mut w, 0.5, [0.0, 0.0, 1.0], [0.0, 0.0, -1.0]);
    let list = list_shape(&mut w, &[sphere, capsule]);
    let w = with_body(w, false, list, Body::default());

    let collision = collision_of(w, &Context::default()).unwrap();
    assert_eq!(collision.name, "bhkListShape");
    assert!(collision.shape.is_none());
    assert_eq!(collision.children.len(), 2);

    match &collision.children[0].shape {
        Some(CollisionShape::Sphere { radius }) => assert!((radius - 2.0 * K).abs() < 1e-4),
        other => panic!("expected a sphere, got {other:?}"),
    }
    match &collision.children[1].shape {
        Some(CollisionShape::Capsule { start, end, radius }) => {
            assert!(close(*start, [0.0, K, 0.0]));
            assert!(close(*end, [0.0, -K, 0.0]));
            assert!((radius - 0.5 * K).abs() < 1e-4);
        }
        other => panic!("expected a capsule, got {other:?}"),
    }
    let kinds: Vec<_> = collision.shapes().iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec!["sphere", "capsule"]);
}

#[test]
fn mopp_tree_is_transparent() {
    let mut w = NifWriter::skyrim();
    let hull = convex_shape(
        &mut w,
        0.1,
        &[[0.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]],
    );
    let tree = mopp(&mut w, hull);
    let w = with_body(w, false, tree, Body::default());

    let collision = collision_of(w, &Context::default()).unwrap();
    assert_eq!(collision.name, "bhkConvexVerticesShape");
    match collision.shape {
        Some(CollisionShape::ConvexHull { ref points, radius }) => {
            assert_eq!(points.len(), 4);
            assert!(close(points[2], [0.0, 0.0, K]));
            assert!(close(points[3], [0.0, K, 0.0]));
            assert!((radius - 0.1 * K).abs() < 1e-4);
        }
        ref other => panic!("expected a convex hull, got {other:?}"),
    }
}

#[test]
fn transformed_body_places_its_shape() {
    let mut w = NifWriter::skyrim();
    let shape = sphere_shape(&mut w, 1.0);
    let w = with_body(
        w,
        true,
        shape,
        Body {
            translation: [0.0, 0.0, 1.0, 0.0],
            ..Default::default()
        },
    );

    let collision = collision_of(w, &Context::default()).unwrap();
    assert!(close(collision.transform.position.into(), [0.0, K, 0.0]));
    assert!(collision.body.is_some());
}

#[test]
fn compressed_mesh_becomes_a_scaled_triangle_mesh() {
    let mut w = NifWriter::skyrim();
    let data = compressed_mesh_data(
        &mut w,
        1.0,
        &[TestChunk {
            translation: [0.0; 4],
            transform_index: 0,
            vertices: vec![0, 0, 0, 1, 0, 0, 0, 1, 0],
            indices: vec![0, 1, 2, 0, 1, 7],
            strips: vec![],
        }],
        &[[0.0, 0.0, 2.0, 0.0], [1.0, 0.0, 2.0, 0.0], [0.0, 1.0, 2.0, 0.0]],
        &[[0, 1, 2]],
    );
    let shape = compressed_mesh(&mut w, data, [1.0, 2.0, 3.0, 0.0]);
    let tree = mopp(&mut w, shape);
    let w = with_body(w, false, tree, Body::default());

    let collision = collision_of(w, &Context::default()).unwrap();
    assert_eq!(collision.name, "bhkCompressedMeshShapeData");
    assert!(close(collision.transform.scale.into(), [1.0, 3.0, 2.0]));
    match collision.shape {
        Some(CollisionShape::TriangleMesh { ref positions, ref indices }) => {
            assert_eq!(positions.len(), 6);
            assert!(close(positions[1], [K, 0.0, 0.0]));
            assert!(close(positions[2], [0.0, 0.0, K]));
            assert!(close(positions[3], [0.0, 2.0 * K, 0.0]));
            // the chunk triangle past its three vertices is dropped
            assert_eq!(indices, &vec![0, 2, 1, 3, 5, 4]);
        }
        ref other => panic!("expected a triangle mesh, got {other:?}"),
    }
}

#[test]
fn material_lists_are_skipped_by_element_width() {
    let mut w = NifWriter::skyrim();
    let data = compressed_mesh_data_with_materials(
        &mut w,
        1.0,
        &[],
        &[[0.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]],
        &[[0, 1, 2]],
        [2, 3, 5],
    );
    let shape = compressed_mesh(&mut w, data, [1.0, 1.0, 1.0, 0.0]);
    let w = with_body(w, false, shape, Body::default());

    let collision = collision_of(w, &Context::default()).unwrap();
    match collision.shape {
        Some(CollisionShape::TriangleMesh { ref positions, ref indices }) => {
            assert_eq!(positions.len(), 3);
            assert!(close(positions[1], [K, 0.0, 0.0]));
            assert_eq!(indices, &vec![0, 2, 1]);
        }
        ref other => panic!("expected a triangle mesh, got {other:?}"),
    }
}

#[test]
fn collision_can_be_switched_off() {
    let mut w = NifWriter::skyrim();
    let shape = box_shape(&mut w, [1.0, 1.0, 1.0]);
    let w = with_body(w, false, shape, Body::default());

    assert!(collision_of(w, &Context::default().with_collision(false)).is_none());
}

#[test]
fn dangling_body_produces_no_component() {
    let mut w = NifWriter::skyrim();
    let owner = w.len() as i32 + 1;
    let object = collision_object(&mut w, owner, 40);
    let root = node(
        &mut w,
        "NiNode",
        Av {
            collision: object,
            ..Av::named("Static")
        },
        &[],
    );
    w.root(root);

    assert!(collision_of(w, &Context::default()).is_none());
}

#[test]
fn shape_collision_sits_next_to_its_mesh() {
    let mut w = NifWriter::skyrim();
    let data = tri_shape_data(
        &mut w,
        &[[0.0, 0.0, 0.0], [70.0, 0.0, 0.0], [0.0, 70.0, 0.0]],
        None,
        None,
        &[[0, 1, 2]],
    );
    let shader = lighting_shader(&mut w, "Crate", 0, 0, NONE);
    let shape = box_shape(&mut w, [1.0, 1.0, 1.0]);
    let body = rigid_body(&mut w, false, shape, Body::default());
    let owner = w.len() as i32 + 1;
    let object = collision_object(&mut w, owner, body);
    let mesh = tri_shape(
        &mut w,
        Av {
            collision: object,
            ..Av::named("Crate")
        },
        data,
        shader,
        NONE,
        None,
    );
    assert_eq!(mesh, owner);
    w.root(mesh);

    let file = decode(w.finish());
    let scene = build(&file, &Context::default()).unwrap();
    assert_eq!(scene.name, "Crate");
    assert!(scene.mesh().is_some());
    assert!(scene.material().is_some());
    assert_eq!(scene.collision().unwrap().name, "bhkBoxShape");
    let collisions = scene
        .components
        .iter()
        .filter(|c| matches!(c, Component::Collision(_)))
        .count();
    assert_eq!(collisions, 1);
}
