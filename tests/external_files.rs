//! Integration tests for images and external references on disk.

use std::fs;
use std::sync::Arc;

use ive::codec;
use ive::prelude::*;
use ive::{DataInputStream, DataOutputStream};
use tempfile::TempDir;

fn gradient(name: &str) -> Image {
    let data: Vec<u8> = (0..8 * 8).map(|i| (i * 4) as u8).collect();
    let mut img = Image::from_u8(8, 8, gl::GL_LUMINANCE, data);
    img.file_name = name.into();
    img
}

fn textured_root(image: Image) -> NodeRef {
    let texture = Arc::new(StateAttribute::new(StateAttributeKind::Texture2D(Texture2D {
        image: Some(Arc::new(image)),
        ..Texture2D::default()
    })));
    let mut state = StateSet::default();
    state.add_texture_attribute(0, texture);
    Arc::new(Node::group("textured", vec![]).with_state_set(Arc::new(state)))
}

fn texture_image(root: &NodeRef) -> ImageRef {
    let state = root.core.state_set.as_ref().expect("state set");
    match &state.texture_attributes[0][0].attribute.kind {
        StateAttributeKind::Texture2D(t) => t.image.clone().expect("texture image"),
        other => panic!("unexpected attribute {other:?}"),
    }
}

fn proxy(name: &str, file_names: Vec<String>) -> NodeRef {
    Arc::new(Node::new(
        name,
        NodeKind::ProxyNode(ProxyNode { file_names, ..ProxyNode::default() }),
    ))
}

#[test]
fn test_reference_without_name_stores_pixels() {
    let mut image = gradient("");
    image.file_name.clear();
    let image = Arc::new(image);

    let options = WriteOptions::new().with_image_mode(ImageMode::ReferenceFile);
    let mut out = DataOutputStream::new(Vec::new(), options.clone()).unwrap();
    out.write_image(&image).unwrap();
    let bytes = out.finish().unwrap();
    // Envelope (12 bytes) and image id (4 bytes) precede the mode byte.
    assert_eq!(bytes[16], ImageMode::IncludeData as u8);

    let root = textured_root((*image).clone());
    let mut buf = Vec::new();
    ReaderWriterIve.write_node_to(&root, &mut buf, &options).unwrap();
    let read = ReaderWriterIve.read_node_from(&mut buf.as_slice(), &ReadOptions::default()).unwrap();
    assert_eq!(texture_image(&read).data, image.data);
}

#[test]
fn test_reference_mode_loads_from_file_directory() {
    let dir = TempDir::new().unwrap();
    let image = gradient("tex.png");
    codec::write_image_file(&image, &dir.path().join("tex.png")).unwrap();

    let path = dir.path().join("scene.ive");
    let options = WriteOptions::new().with_image_mode(ImageMode::ReferenceFile);
    write_node_file(&textured_root(image.clone()), &path, &options).unwrap();

    let read = read_node_file(&path, &ReadOptions::default()).unwrap();
    let loaded = texture_image(&read);
    assert_eq!(loaded.file_name, "tex.png");
    assert_eq!(loaded.data, image.data);

    // Without the file the graph still loads, with an empty image.
    fs::remove_file(dir.path().join("tex.png")).unwrap();
    let read = read_node_file(&path, &ReadOptions::default()).unwrap();
    let missing = texture_image(&read);
    assert!(missing.is_empty());
    assert_eq!(missing.file_name, "tex.png");
}

#[test]
fn test_include_file_survives_source_removal() {
    let dir = TempDir::new().unwrap();
    let image = gradient("embedded.png");
    codec::write_image_file(&image, &dir.path().join("embedded.png")).unwrap();

    let options = WriteOptions::new()
        .with_image_mode(ImageMode::IncludeFile)
        .with_database_path(dir.path());
    let mut out = DataOutputStream::new(Vec::new(), options).unwrap();
    out.write_node(&textured_root(image.clone())).unwrap();
    let bytes = out.finish().unwrap();

    fs::remove_file(dir.path().join("embedded.png")).unwrap();
    let read = DataInputStream::new(bytes.as_slice(), ReadOptions::default())
        .unwrap()
        .read_node()
        .unwrap();
    let loaded = texture_image(&read);
    assert_eq!(loaded.file_name, "embedded.png");
    assert_eq!(loaded.data, image.data);
}

#[test]
fn test_include_file_undecodable_stores_pixels() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tex.dds"), b"DDS \x7c\x00\x00\x00not a real surface").unwrap();
    let image = gradient("tex.dds");

    let options = WriteOptions::new()
        .with_image_mode(ImageMode::IncludeFile)
        .with_database_path(dir.path());
    let mut out = DataOutputStream::new(Vec::new(), options).unwrap();
    out.write_node(&textured_root(image.clone())).unwrap();
    let bytes = out.finish().unwrap();

    let read = DataInputStream::new(bytes.as_slice(), ReadOptions::default())
        .unwrap()
        .read_node()
        .unwrap();
    assert_eq!(texture_image(&read).data, image.data);
}

#[test]
fn test_output_texture_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.ive");
    let options: WriteOptions = "noTexturesInIVEFile OutputTextureFiles".parse().unwrap();
    write_node_file(&textured_root(gradient("written.png")), &path, &options).unwrap();

    let written = dir.path().join("written.png");
    assert!(written.is_file());
    assert_eq!(codec::read_image_file(&written).unwrap().data, gradient("").data);
}

#[test]
fn test_proxy_node_loads_external_children() {
    let dir = TempDir::new().unwrap();
    let child = Arc::new(Node::group("from_file", vec![]));
    write_node_file(&child, dir.path().join("child.ive"), &WriteOptions::new()).unwrap();

    let path = dir.path().join("parent.ive");
    let root = proxy("proxy", vec!["child.ive".into(), "missing.ive".into()]);
    write_node_file(&root, &path, &WriteOptions::new()).unwrap();

    let read = read_node_file(&path, &ReadOptions::default()).unwrap();
    let children = read.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name(), "from_file");

    let options = ReadOptions::default().with_no_load_external_reference_files(true);
    let read = read_node_file(&path, &options).unwrap();
    assert!(read.children().is_empty());
    match &read.kind {
        NodeKind::ProxyNode(p) => assert_eq!(p.file_names, vec!["child.ive".to_string(), "missing.ive".to_string()]),
        other => panic!("unexpected node {other:?}"),
    }
}

#[test]
fn test_proxy_node_inline_children() {
    let child = Arc::new(Node::group("inline", vec![]));
    let mut node = Node::new(
        "proxy",
        NodeKind::ProxyNode(ProxyNode {
            file_names: vec!["elsewhere.ive".into()],
            ..ProxyNode::default()
        }),
    );
    if let NodeKind::ProxyNode(p) = &mut node.kind {
        p.group.children.push(child);
    }
    let root = Arc::new(node);

    let rw = ReaderWriterIve;
    let no_load = ReadOptions::default().with_no_load_external_reference_files(true);

    let mut buf = Vec::new();
    rw.write_node_to(&root, &mut buf, &WriteOptions::new()).unwrap();
    assert!(rw.read_node_from(&mut buf.as_slice(), &no_load).unwrap().children().is_empty());

    let mut buf = Vec::new();
    rw.write_node_to(&root, &mut buf, &WriteOptions::new().with_inline_external_references(true)).unwrap();
    let read = rw.read_node_from(&mut buf.as_slice(), &no_load).unwrap();
    assert_eq!(read.children()[0].name(), "inline");
}

#[test]
fn test_self_referencing_file_terminates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("loop.ive");
    write_node_file(&proxy("loop", vec!["loop.ive".into()]), &path, &WriteOptions::new()).unwrap();

    let mut node = read_node_file(&path, &ReadOptions::default()).unwrap();
    let mut depth = 0;
    while let Some(child) = node.children().first().cloned() {
        node = child;
        depth += 1;
    }
    assert_eq!(depth, ive::stream::MAX_EXTERNAL_DEPTH as usize);
}
