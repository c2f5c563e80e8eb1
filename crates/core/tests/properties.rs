//! Behavioral guarantees of the label engine, checked end to end through the
//! public API.

mod common;

use std::io::Cursor;
use std::path::Path;

use odl_toolchain_core::mutate::{change_value, fetch_all_values};
use odl_toolchain_core::record::write_label_to;
use odl_toolchain_core::{
    Ambiguity, Lookup, ObjectQuery, Outcome, ParamKind, ParamQuery, PointerDescriptor,
    RecordRequest, Status, WriteOptions, adjust_pointers, codes, find_object, get_pointer,
    replace_pointer, scan_wrappers,
};

// ─── Locator ─────────────────────────────────────────────────────────────────

#[test]
fn empty_query_returns_root() {
    let labels = [
        "A = 1\nEND\n",
        common::IMAGE_LABEL,
        "OBJECT = X\nEND_OBJECT = X\nEND\n",
        "GROUP = G\n  OBJECT = X\n  END_OBJECT\nEND_GROUP = G\nEND\n",
        "END\n",
    ];
    for text in labels {
        let (tree, ctx) = common::parse(text);
        let root = tree.root().unwrap();
        let lookup = find_object(&tree, &ctx, root, &ObjectQuery::any());
        assert_eq!(lookup, Lookup::Found(root), "label:\n{text}");
        assert_eq!(lookup.status(), Status::Success);
    }
}

#[test]
fn unique_class_found_and_shared_class_ambiguous() {
    let (tree, ctx) = common::parse(
        "\
OBJECT = TABLE
  OBJECT = COLUMN
    NAME = A
  END_OBJECT = COLUMN
  OBJECT = COLUMN
    NAME = B
  END_OBJECT = COLUMN
END_OBJECT = TABLE
OBJECT = IMAGE
END_OBJECT = IMAGE
END
",
    );
    let root = tree.root().unwrap();

    let table = find_object(&tree, &ctx, root, &ObjectQuery::any().class("TABLE"));
    assert_eq!(table.status(), Status::Success);
    let image = find_object(&tree, &ctx, root, &ObjectQuery::any().class("IMAGE"));
    assert_eq!(image.status(), Status::Success);

    let columns = find_object(&tree, &ctx, root, &ObjectQuery::any().class("COLUMN"));
    assert_eq!(columns.status(), Status::MultipleObjects);
    let Lookup::Ambiguous { first, kind } = columns else {
        panic!("expected ambiguity, got {columns:?}");
    };
    assert_eq!(kind, Ambiguity::Objects);
    assert_eq!(tree.object_name(first), Some("A"));
}

#[test]
fn position_selects_second_unnamed_sibling() {
    let (tree, ctx) = common::parse(
        "OBJECT = IMAGE\n  LINES = 1\nEND_OBJECT = IMAGE\nOBJECT = IMAGE\n  LINES = 2\nEND_OBJECT = IMAGE\nEND\n",
    );
    let root = tree.root().unwrap();
    let obj = tree.object(root).unwrap();
    let second = obj.children()[1];

    let lookup = find_object(&tree, &ctx, root, &ObjectQuery::any().class("IMAGE").position(2));
    assert_eq!(lookup, Lookup::Found(second));
    assert_eq!(lookup.status(), Status::Success);
}

// ─── Pointer codec ───────────────────────────────────────────────────────────

#[test]
fn pointer_round_trip_all_forms() {
    let forms = [
        PointerDescriptor::attached("IMAGE", 12),
        PointerDescriptor::attached("IMAGE", 4097).in_bytes(),
        PointerDescriptor::detached("IMAGE", "IMG00001.DAT", 1),
        PointerDescriptor::detached("IMAGE", "IMG00001.DAT", 2881).in_bytes(),
    ];
    for desc in forms {
        // Once into a label without the pointer, once over an existing one.
        for text in ["PDS_VERSION_ID = PDS3\nEND\n", "^IMAGE = 3\nEND\n"] {
            let (mut tree, mut ctx) = common::parse(text);
            let outcome = replace_pointer(&mut tree, &mut ctx, &desc).unwrap();
            assert!(outcome.status().is_ok(), "{desc:?} into {text:?}");
            assert_eq!(get_pointer(&tree, &mut ctx, "IMAGE", 0), Outcome::Done(desc.clone()));
        }
    }
}

#[test]
fn adjust_attached_pointer_without_record_keywords() {
    let (mut tree, mut ctx) = common::parse("^TABLE = 5\nEND\n");
    let params_before = tree.param_count();

    let outcome = adjust_pointers(&mut tree, &mut ctx, 0, 12);
    assert_eq!(outcome.status(), Status::Success);
    assert_eq!(
        get_pointer(&tree, &mut ctx, "TABLE", 0),
        Outcome::Done(PointerDescriptor::attached("TABLE", 17))
    );
    assert_eq!(tree.param_count(), params_before);
    let root = tree.root().unwrap();
    assert!(tree.param_named(root, "LABEL_RECORDS").is_none());
    assert!(tree.param_named(root, "FILE_RECORDS").is_none());
}

// ─── Mutator ─────────────────────────────────────────────────────────────────

#[test]
fn change_value_keeps_position_and_kind() {
    let (mut tree, mut ctx) = common::parse("A = 1\n^B = 7\nC = 3\nEND\n");
    let root = tree.root().unwrap();
    let before: Vec<_> = tree.object(root).unwrap().params().to_vec();

    let outcome = change_value(&mut tree, &mut ctx, &ParamQuery::named("B"), "(10, 20 <BYTES>)").unwrap();
    let pid = outcome.value().unwrap();

    assert_eq!(tree.object(root).unwrap().params(), before.as_slice());
    assert_eq!(tree.object(root).unwrap().params()[1], pid);
    assert_eq!(tree.param(pid).unwrap().kind(), ParamKind::Pointer);
    assert_eq!(
        fetch_all_values(&tree, &ctx, &ParamQuery::named("B")),
        Outcome::Done(vec!["10".to_string(), "20 <BYTES>".to_string()])
    );
}

#[test]
fn change_value_rejects_invalid_text_untouched() {
    let (mut tree, mut ctx) = common::parse("NOTE = (\"a\", 'b', 2.5 <KM>)\nEND\n");
    let root = tree.root().unwrap();
    let pid = tree.param_named(root, "NOTE").unwrap();
    let values_before = tree.param(pid).unwrap().values().to_vec();
    let shape_before = tree.param(pid).unwrap().shape();

    for bad in ["(1, 2", "\"open", "1 <KM", "= 3"] {
        let outcome = change_value(&mut tree, &mut ctx, &ParamQuery::named("NOTE"), bad).unwrap();
        assert_eq!(outcome, Outcome::Error, "accepted {bad:?}");
        assert_eq!(tree.param(pid).unwrap().values(), values_before.as_slice());
        assert_eq!(tree.param(pid).unwrap().shape(), shape_before);
    }
}

// ─── Record writer ───────────────────────────────────────────────────────────

/// A label with `params` root parameters and one nested object.
fn label_of_size(params: usize) -> String {
    let mut text = String::new();
    for i in 0..params {
        text.push_str(&format!("KEY_{i} = \"{}\"\n", "x".repeat(i % 23)));
    }
    text.push_str("OBJECT = EMPTY\nEND_OBJECT = EMPTY\nEND\n");
    text
}

#[test]
fn fixed_output_is_whole_records() {
    let mut labels = vec![
        "OBJECT = EMPTY\nEND_OBJECT = EMPTY\nEND\n".to_string(),
        "END\n".to_string(),
    ];
    labels.extend([1, 2, 7, 31].map(label_of_size));

    for text in &labels {
        let (tree, _) = common::parse(text);
        for record_bytes in (1..=97).chain([128, 512, 4096]) {
            let mut ctx = common::lf_context();
            ctx.config.record_bytes = record_bytes;
            let options = WriteOptions {
                request: RecordRequest::Fixed,
                records_needed: 0,
            };
            let mut out = Vec::new();
            let outcome = write_label_to(&tree, &mut ctx, &mut out, Path::new("mem"), &options).unwrap();
            let summary = outcome.value().unwrap();
            assert_eq!(out.len() % record_bytes, 0, "R={record_bytes} label:\n{text}");
            assert_eq!(out.len(), summary.records_written * record_bytes);
        }
    }
}

// ─── Wrapper scanner ─────────────────────────────────────────────────────────

#[test]
fn start_marker_without_end_marker() {
    let mut bytes = b"CCSD3ZF0000100000001CCSD3KS0PDSX00000001\r\n".to_vec();
    bytes.extend_from_slice(b"PDS_VERSION_ID = PDS3\r\nEND\r\n");
    bytes.extend(std::iter::repeat_n(b'.', 5000));
    let mut reader = Cursor::new(bytes);
    let mut ctx = common::lf_context();

    let outcome = scan_wrappers(&mut reader, &mut ctx).unwrap();
    assert_eq!(outcome.status(), Status::Warning);
    let labels = outcome.value().unwrap().unwrap();
    assert_eq!(labels.top.end_offset, -1);
    assert_eq!(labels.top.begin_offset, 42);
    assert!(labels.bottom.is_none());
    assert_eq!(common::diag_ids(&ctx), vec![codes::SFDU_MISSING_END_MARKER]);
    assert_eq!(reader.position(), 0);
}
