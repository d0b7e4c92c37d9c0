//! Integration tests for whole-graph round trips through IVE streams.

use std::sync::Arc;

use ive::prelude::*;
use ive::util::{DMat4, DVec3, Vec3, Vec4};
use ive::{DataInputStream, DataOutputStream};

fn write_graph(root: &NodeRef, options: WriteOptions) -> Vec<u8> {
    let mut out = DataOutputStream::new(Vec::new(), options).expect("Failed to open stream");
    out.write_node(root).expect("Failed to write graph");
    out.finish().expect("Failed to finish stream")
}

fn read_graph(bytes: &[u8]) -> ive::Result<NodeRef> {
    let mut inp = DataInputStream::new(bytes, ReadOptions::default())?;
    inp.read_node()
}

fn material(diffuse: Vec4) -> StateAttributeRef {
    Arc::new(StateAttribute::new(StateAttributeKind::Material(Material {
        diffuse: FrontBack::both(diffuse),
        ..Material::default()
    })))
}

fn leaf_with(name: &str, attribute: &StateAttributeRef) -> NodeRef {
    let mut state = StateSet::default();
    state.add_attribute(attribute.clone());
    Arc::new(Node::new(name, NodeKind::Node).with_state_set(Arc::new(state)))
}

fn attribute_of(node: &NodeRef) -> &StateAttributeRef {
    let state = node.core.state_set.as_ref().expect("node has a state set");
    &state.attributes[0].attribute
}

#[test]
fn test_shared_attribute_written_once() {
    let shared = material(Vec4::new(1.0, 0.0, 0.0, 1.0));
    let root = Arc::new(Node::group(
        "root",
        vec![leaf_with("a", &shared), leaf_with("b", &shared)],
    ));

    let other = material(Vec4::new(1.0, 0.0, 0.0, 1.0));
    let distinct = Arc::new(Node::group(
        "root",
        vec![leaf_with("a", &shared), leaf_with("b", &other)],
    ));

    // One attribute record on its own: envelope, id, record.
    let mut single = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
    single.write_state_attribute(&shared).unwrap();
    let record_len = single.finish().unwrap().len() - 12 - 4;

    let shared_bytes = write_graph(&root, WriteOptions::new());
    let distinct_bytes = write_graph(&distinct, WriteOptions::new());
    assert_eq!(distinct_bytes.len() - shared_bytes.len(), record_len);

    let read = read_graph(&shared_bytes).expect("Failed to read graph");
    let children = read.children();
    assert_eq!(children.len(), 2);
    assert!(Arc::ptr_eq(attribute_of(&children[0]), attribute_of(&children[1])));

    let read = read_graph(&distinct_bytes).expect("Failed to read graph");
    let children = read.children();
    assert!(!Arc::ptr_eq(attribute_of(&children[0]), attribute_of(&children[1])));
}

#[test]
fn test_shared_subgraph_and_fields() {
    let geometry = Geometry {
        primitive_sets: vec![PrimitiveSet::triangles_u16(vec![0, 1, 2])],
        vertex_array: Some(GeometryArray::per_vertex(Array::Vec3(vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
        ]))),
        normal_array: Some(GeometryArray::overall(Array::Vec3(vec![Vec3::Z]))),
        ..Geometry::default()
    };
    let geode = Arc::new(Node::geode("tri", vec![Arc::new(Drawable::geometry(geometry.clone()))]));

    let left = Arc::new(Node::new(
        "left",
        NodeKind::MatrixTransform(MatrixTransform {
            group: Group { children: vec![geode.clone()] },
            matrix: DMat4::from_translation(DVec3::new(-1.0, 0.0, 0.0)),
            ..MatrixTransform::default()
        }),
    ));
    let right = Arc::new(Node::new(
        "right",
        NodeKind::MatrixTransform(MatrixTransform {
            group: Group { children: vec![geode] },
            matrix: DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0)),
            ..MatrixTransform::default()
        }),
    ));
    let mut root = Node::group("scene", vec![left, right]);
    root.core.descriptions = vec!["two instances".into(), String::new()];
    root.core.node_mask = 0x0000_00ff;
    let root = Arc::new(root);

    let read = read_graph(&write_graph(&root, WriteOptions::new())).unwrap();
    assert_eq!(read.name(), "scene");
    assert_eq!(read.core.descriptions, vec!["two instances".to_string(), String::new()]);
    assert_eq!(read.core.node_mask, 0x0000_00ff);

    let (l, r) = (&read.children()[0], &read.children()[1]);
    match (&l.kind, &r.kind) {
        (NodeKind::MatrixTransform(a), NodeKind::MatrixTransform(b)) => {
            assert_eq!(a.matrix.w_axis.x, -1.0);
            assert_eq!(b.matrix.w_axis.x, 1.0);
        }
        other => panic!("unexpected kinds {other:?}"),
    }
    assert!(Arc::ptr_eq(&l.children()[0], &r.children()[0]));

    let drawable = &l.children()[0].drawables()[0];
    match &drawable.kind {
        DrawableKind::Geometry(g) => assert_eq!(g, &geometry),
        other => panic!("unexpected drawable {other:?}"),
    }
}

#[test]
fn test_boundary_values() {
    let mut node = Node::new("", NodeKind::Node);
    node.core.node_mask = u32::MAX;
    let empty = Geometry {
        primitive_sets: vec![PrimitiveSet::draw_arrays(ive::scene::gl::GL_POINTS, i32::MIN, i32::MAX)],
        vertex_array: Some(GeometryArray::per_vertex(Array::Float(vec![
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::MIN,
            f32::MAX,
            -0.0,
        ]))),
        fog_coord_array: Some(GeometryArray::per_vertex(Array::Int(vec![]))),
        ..Geometry::default()
    };
    let root = Arc::new(Node::group(
        "",
        vec![Arc::new(node), Arc::new(Node::geode("", vec![Arc::new(Drawable::geometry(empty.clone()))]))],
    ));

    let read = read_graph(&write_graph(&root, WriteOptions::new())).unwrap();
    assert_eq!(read.name(), "");
    assert_eq!(read.children()[0].core.node_mask, u32::MAX);
    match &read.children()[1].drawables()[0].kind {
        DrawableKind::Geometry(g) => {
            assert_eq!(g, &empty);
            let Some(GeometryArray { array: Array::Float(v), .. }) = &g.vertex_array else {
                panic!("vertex array lost");
            };
            assert!(v[4].is_sign_negative());
        }
        other => panic!("unexpected drawable {other:?}"),
    }
}

#[test]
fn test_nan_survives() {
    let geometry = Geometry {
        vertex_array: Some(GeometryArray::per_vertex(Array::Float(vec![f32::NAN]))),
        ..Geometry::default()
    };
    let root = Arc::new(Node::geode("nan", vec![Arc::new(Drawable::geometry(geometry))]));
    let read = read_graph(&write_graph(&root, WriteOptions::new())).unwrap();
    match &read.drawables()[0].kind {
        DrawableKind::Geometry(Geometry {
            vertex_array: Some(GeometryArray { array: Array::Float(v), .. }),
            ..
        }) => assert!(v[0].is_nan()),
        other => panic!("unexpected drawable {other:?}"),
    }
}

#[test]
fn test_user_data_sentinel() {
    let mut node = Node::group("tagged", vec![]);
    node.object.user_data = Some(UserData::Unsupported { class_name: "ScriptCallback".into() });
    let mut child = Node::new("annotated", NodeKind::Node);
    child.object.user_data = Some(UserData::ShapeAttributes(Arc::new(ShapeAttributeList {
        object: ObjectData::default(),
        attributes: vec![
            ShapeAttribute::new("lanes", ShapeAttributeValue::Integer(4)),
            ShapeAttribute::new("speed", ShapeAttributeValue::Double(13.9)),
            ShapeAttribute::new("name", ShapeAttributeValue::String("A1".into())),
        ],
    })));
    let mut with_child = node.clone();
    with_child.kind = NodeKind::Group(Group { children: vec![Arc::new(child)] });
    let root = Arc::new(with_child);

    let read = read_graph(&write_graph(&root, WriteOptions::new())).unwrap();
    // Objects the format cannot carry come back as no user data at all.
    assert!(read.object.user_data.is_none());
    match &read.children()[0].object.user_data {
        Some(UserData::ShapeAttributes(list)) => {
            assert_eq!(list.attributes.len(), 3);
            assert_eq!(list.attributes[2].value, ShapeAttributeValue::String("A1".into()));
        }
        other => panic!("unexpected user data {other:?}"),
    }
}

#[test]
fn test_user_data_node_shares_identity() {
    let marker = Arc::new(Node::new("marker", NodeKind::Node));
    let mut holder = Node::group("holder", vec![marker.clone()]);
    holder.object.user_data = Some(UserData::Node(marker));
    let root = Arc::new(holder);

    let read = read_graph(&write_graph(&root, WriteOptions::new())).unwrap();
    match &read.object.user_data {
        Some(UserData::Node(n)) => assert!(Arc::ptr_eq(n, &read.children()[0])),
        other => panic!("unexpected user data {other:?}"),
    }
}

#[test]
fn test_older_version_write() {
    let mut node = Node::group("old", vec![Arc::new(Node::new("leaf", NodeKind::Node))]);
    node.core.culling_active = false;
    let root = Arc::new(node);

    let bytes = write_graph(&root, WriteOptions::new().with_version(9));
    let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
    assert_eq!(inp.version(), 9);
    let read = inp.read_node().unwrap();
    assert_eq!(read.children()[0].name(), "leaf");
    // Culling flags did not exist yet.
    assert!(read.core.culling_active);

    let bytes = write_graph(&root, WriteOptions::new().with_version(30));
    let read = read_graph(&bytes).unwrap();
    assert!(!read.core.culling_active);
}

#[test]
fn test_features_refused_by_old_versions() {
    let mut state = StateSet::default();
    state.add_uniform(Arc::new(Uniform::float("time", 0.5)));
    let root = Arc::new(Node::group("u", vec![]).with_state_set(Arc::new(state)));

    let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new().with_version(20)).unwrap();
    let err = out.write_node(&root).unwrap_err();
    assert!(matches!(err, Error::UnsupportedInVersion { feature: "uniforms", required: 21, version: 20 }));

    let err = DataOutputStream::new(Vec::new(), WriteOptions::new().with_version(30).compressed(true)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedInVersion { feature: "compression", .. }));
}

#[test]
fn test_object_entry_points() {
    let state = Arc::new(StateSet::default());
    let mut out = DataOutputStream::new(Vec::new(), WriteOptions::new()).unwrap();
    out.write_object(&UserData::StateSet(state)).unwrap();
    out.write_object(&UserData::Unsupported { class_name: "Timer".into() }).unwrap();
    let bytes = out.finish().unwrap();

    let mut inp = DataInputStream::new(bytes.as_slice(), ReadOptions::default()).unwrap();
    assert!(matches!(inp.read_object().unwrap(), Some(UserData::StateSet(_))));
    assert!(inp.read_object().unwrap().is_none());
}
