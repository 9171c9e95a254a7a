use flow_nif::{
    BlockRef, NifError, NifFile,
    flow::Step,
    format::{
        BinaryReader, Block, BlockRegistry,
        blocks::{ExtraValue, GeometryData, LightingShader, Node, Primitives},
    },
};

use crate::common::{
    decode,
    nif_writer::{
        Av, NONE, NifWriter, bsx_flags, lighting_shader, node, tri_shape, tri_shape_data,
    },
};

mod common;

fn node_name(file: &NifFile, index: usize) -> Option<String> {
    match &file.get(index)?.block {
        Block::Node(node) => node.av.net.name.clone(),
        _ => None,
    }
}

fn sample() -> NifWriter {
    let mut w = NifWriter::skyrim();
    let data = tri_shape_data(
        &mut w,
        &[[0.0, 0.0, 0.0], [70.0, 0.0, 0.0], [0.0, 70.0, 0.0]],
        None,
        None,
        &[[0, 1, 2]],
    );
    let shader = lighting_shader(&mut w, "Shader", 0, 0, NONE);
    let shape = tri_shape(&mut w, Av::named("Shape"), data, shader, NONE, None);
    let root = node(&mut w, "BSFadeNode", Av::named("Root"), &[shape]);
    w.root(root);
    w
}

#[test]
fn block_count_and_types_follow_the_header() {
    let file = decode(sample().finish());
    assert_eq!(file.len(), file.header.num_blocks);
    assert_eq!(file.len(), 4);
    for (index, entry) in file.blocks.iter().enumerate() {
        assert_eq!(Some(entry.type_name.as_str()), file.header.block_type(index));
    }
    assert_eq!(file.roots, vec![BlockRef(3)]);
    assert_eq!(file.unsupported_count(), 0);

    let data: &GeometryData = file.resolve(BlockRef(0)).unwrap().unwrap();
    assert_eq!(data.num_vertices(), 3);
    assert_eq!(data.primitives, Primitives::Triangles(vec![[0, 1, 2]]));
    let shader: &LightingShader = file.resolve(BlockRef(1)).unwrap().unwrap();
    assert_eq!(shader.net.name.as_deref(), Some("Shader"));
    assert_eq!(shader.glossiness, 80.0);
}

#[test]
fn unknown_block_is_skipped_by_its_declared_size() {
    let mut w = NifWriter::skyrim();
    node(&mut w, "NiNode", Av::named("First"), &[]);
    w.raw_block("NiSkinInstance", vec![0xAB; 13], None);
    node(&mut w, "NiNode", Av::named("Third"), &[]);
    let file = decode(w.finish());

    assert_eq!(file.len(), 3);
    assert_eq!(node_name(&file, 0).as_deref(), Some("First"));
    assert!(matches!(
        &file.get(1).unwrap().block,
        Block::Unsupported { type_name } if type_name == "NiSkinInstance"
    ));
    assert_eq!(node_name(&file, 2).as_deref(), Some("Third"));
    assert_eq!(file.get(2).unwrap().offset, file.get(1).unwrap().offset + 13);
    assert_eq!(file.unsupported_count(), 1);
}

#[test]
fn unknown_block_without_size_table_is_fatal() {
    let mut w = NifWriter::oblivion();
    node(&mut w, "NiNode", Av::named("First"), &[]);
    w.raw_block("NiSkinInstance", vec![0; 8], None);
    let err = NifFile::from_bytes(w.finish(), "old.nif", &BlockRegistry::default()).unwrap_err();
    match err {
        NifError::UnsupportedBlockType {
            index, type_name, ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(type_name, "NiSkinInstance");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn registered_block_with_trailing_bytes_is_resynchronised() {
    let mut w = NifWriter::skyrim();
    // four bytes the decoder does not know about
    w.block("BSXFlags", |b| {
        b.u32(u32::MAX).u32(2).zeros(4);
    });
    node(&mut w, "NiNode", Av::named("After"), &[]);
    let file = decode(w.finish());

    assert!(matches!(
        &file.get(0).unwrap().block,
        Block::ExtraData(extra) if extra.value == ExtraValue::BsxFlags(2)
    ));
    assert_eq!(node_name(&file, 1).as_deref(), Some("After"));
}

#[test]
fn registered_block_too_short_for_its_decoder_becomes_a_placeholder() {
    let mut w = NifWriter::skyrim();
    // a name index but no flags value
    w.raw_block("BSXFlags", u32::MAX.to_le_bytes().to_vec(), None);
    let after = node(&mut w, "NiNode", Av::named("After"), &[]);
    w.root(after);
    let file = decode(w.finish());

    assert!(matches!(
        &file.get(0).unwrap().block,
        Block::Unsupported { type_name } if type_name == "BSXFlags"
    ));
    assert_eq!(file.unsupported_count(), 1);
    assert_eq!(node_name(&file, 1).as_deref(), Some("After"));
    assert_eq!(file.roots, vec![BlockRef(1)]);
}

#[test]
fn inline_strings_decode_in_old_versions() {
    let mut w = NifWriter::oblivion();
    let child = node(&mut w, "NiNode", Av::named("Child"), &[]);
    let root = node(&mut w, "NiNode", Av::named("Root"), &[child, NONE]);
    w.root(root);
    let file = decode(w.finish());

    assert_eq!(node_name(&file, 0).as_deref(), Some("Child"));
    let root: &Node = file.resolve(BlockRef(1)).unwrap().unwrap();
    assert_eq!(root.av.net.name.as_deref(), Some("Root"));
    assert_eq!(root.children, vec![BlockRef(0), BlockRef::NONE]);
    assert!(root.av.properties.is_empty());
}

#[test]
fn extra_data_names_resolve_through_the_string_table() {
    let mut w = NifWriter::skyrim();
    let flags = bsx_flags(&mut w, 0x82);
    let root = node(
        &mut w,
        "NiNode",
        Av {
            extra_data: vec![flags],
            ..Av::named("Root")
        },
        &[],
    );
    w.root(root);
    let file = decode(w.finish());
    let root: &Node = file.resolve(BlockRef(1)).unwrap().unwrap();
    assert_eq!(root.av.net.extra_data, vec![BlockRef(0)]);
    assert!(matches!(
        &file.get(0).unwrap().block,
        Block::ExtraData(extra) if extra.name.as_deref() == Some("BSX")
    ));
}

#[test]
fn truncated_block_is_malformed() {
    let mut bytes = sample().finish();
    // drop the footer and the end of the last block
    bytes.truncate(bytes.len() - 20);
    let err = NifFile::from_bytes(bytes, "cut.nif", &BlockRegistry::default()).unwrap_err();
    match err {
        NifError::MalformedBlock { index, ref type_name, .. } => {
            assert_eq!(index, 3);
            assert_eq!(type_name, "BSFadeNode");
        }
        ref other => panic!("unexpected error {other}"),
    }
    assert!(err.is_fatal());
}

#[test]
fn out_of_range_and_mistyped_references_are_dangling() {
    let file = decode(sample().finish());
    assert!(matches!(
        file.resolve::<Node>(BlockRef(42)),
        Err(NifError::DanglingReference { reference: 42, .. })
    ));
    assert!(matches!(
        file.resolve::<Node>(BlockRef(0)),
        Err(NifError::DanglingReference { expected: "node", .. })
    ));
    assert!(file.resolve::<Node>(BlockRef::NONE).unwrap().is_none());
    assert!(!NifError::DanglingReference { reference: 1, expected: "node" }.is_fatal());
}

#[test]
fn out_of_range_footer_root_is_kept_but_harmless() {
    let mut w = NifWriter::skyrim();
    let root = node(&mut w, "NiNode", Av::named("Root"), &[]);
    w.root(root).root(17);
    let file = decode(w.finish());
    assert_eq!(file.roots, vec![BlockRef(0), BlockRef(17)]);
}

#[test]
fn stepwise_decoding_matches_one_shot_decoding() {
    let bytes = sample().finish();
    let registry = BlockRegistry::default();
    let one_shot = NifFile::from_bytes(bytes.clone(), "test.nif", &registry).unwrap();

    let mut job = NifFile::decode(BinaryReader::from_bytes(bytes, "test.nif"), &registry);
    let mut pending = 0;
    let stepped = loop {
        match job.advance() {
            Step::Pending => pending += 1,
            Step::Ready(result) => break result.unwrap(),
            Step::Spent => unreachable!(),
        }
    };
    // one checkpoint after the header and one per block
    assert_eq!(pending, one_shot.len() + 1);
    assert!(matches!(job.advance(), Step::Spent));
    assert_eq!(stepped.len(), one_shot.len());
    assert_eq!(stepped.roots, one_shot.roots);
    for (a, b) in stepped.blocks.iter().zip(&one_shot.blocks) {
        assert_eq!(a.type_name, b.type_name);
        assert_eq!(a.offset, b.offset);
        assert_eq!(a.block, b.block);
    }
}
