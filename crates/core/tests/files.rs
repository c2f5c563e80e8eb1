//! File-level tests: reading labels from disk, writing them back under each
//! record discipline, and attaching data files.

mod common;

use std::fs;

use odl_toolchain_core::{
    Outcome, PointerDescriptor, RecordRequest, Status, WriteOptions, attach_data, codes,
    emit_label, get_pointer, read_label_file, write_label,
};

#[test]
fn fixed_label_survives_write_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let (tree, mut ctx) = common::parse(common::IMAGE_LABEL);
    let path = dir.path().join("image.lbl");

    let summary = write_label(&tree, &mut ctx, &path, &WriteOptions::default())
        .unwrap()
        .value()
        .expect("write succeeds");
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() % 80, 0);
    assert_eq!(bytes.len() as u64, summary.bytes_written);

    let reread = read_label_file(&path, &mut ctx).unwrap().value().unwrap();
    assert!(reread.counts.is_clean());
    assert_eq!(
        emit_label(&reread.tree, &ctx.config.emit),
        emit_label(&tree, &ctx.config.emit)
    );
}

#[test]
fn framed_sample_keeps_its_wrappers() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = common::lf_context();
    let parsed = read_label_file(&common::samples_dir().join("framed.lbl"), &mut ctx)
        .unwrap()
        .value()
        .unwrap();
    assert!(ctx.diagnostics.is_empty(), "{:?}", common::diag_ids(&ctx));
    let wrappers = parsed.tree.wrappers().expect("framed");
    assert_eq!(wrappers.bottom.as_ref().unwrap().label_text, "CCSD$$MARKER00000001");

    let out = dir.path().join("framed.out");
    let outcome = write_label(&parsed.tree, &mut ctx, &out, &WriteOptions::default()).unwrap();
    assert_eq!(outcome.status(), Status::Success);
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("CCSD3ZF0000100000001CCSD3KS0PDSX00000001\n"));
    assert!(text.ends_with("END\nCCSD$$MARKER00000001\n"));

    // Reading the rewritten file finds the same framing.
    let again = read_label_file(&out, &mut ctx).unwrap().value().unwrap();
    let rewrapped = again.tree.wrappers().unwrap();
    assert_eq!(rewrapped.top.label_text, wrappers.top.label_text);
    assert_eq!(rewrapped.top.begin_offset, 41);
    assert!(rewrapped.bottom.is_some());
    assert_eq!(emit_label(&again.tree, &ctx.config.emit), emit_label(&parsed.tree, &ctx.config.emit));
}

#[test]
fn stream_padding_to_needed_records() {
    let dir = tempfile::tempdir().unwrap();
    let (tree, mut ctx) = common::parse("A = 1\nB = 2\nEND\n");
    let path = dir.path().join("padded.lbl");
    let options = WriteOptions {
        request: RecordRequest::Stream,
        records_needed: 6,
    };
    let summary = write_label(&tree, &mut ctx, &path, &options)
        .unwrap()
        .value()
        .unwrap();
    assert_eq!(summary.records_written, 6);
    assert_eq!(fs::read_to_string(&path).unwrap(), "A = 1\nB = 2\nEND\n\n\n\n");
    assert_eq!(ctx.records.written, 6);
}

#[test]
fn variable_records_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (tree, mut ctx) = common::parse("A = 1\nEND\n");
    let options = WriteOptions {
        request: RecordRequest::Variable,
        records_needed: 0,
    };
    let outcome = write_label(&tree, &mut ctx, &dir.path().join("v.lbl"), &options).unwrap();
    assert_eq!(outcome, Outcome::Error);
    common::find_diag(&ctx, codes::RECORD_TYPE_UNSUPPORTED);
}

#[test]
fn unwritable_destination_is_io_error() {
    let (tree, mut ctx) = common::parse("A = 1\nEND\n");
    let err = write_label(
        &tree,
        &mut ctx,
        std::path::Path::new("/nonexistent-dir/out.lbl"),
        &WriteOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("/nonexistent-dir/out.lbl"));
}

#[test]
fn attach_data_shifts_pointers_and_pads() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tree, mut ctx) = common::parse(
        "\
RECORD_TYPE = FIXED_LENGTH
RECORD_BYTES = 64
FILE_RECORDS = 2
LABEL_RECORDS = 0
^IMAGE = 1
^NOTES = (\"NOTES.TXT\", 1)
END
",
    );
    let data: Vec<u8> = (0..110u8).collect();
    let data_path = dir.path().join("image.dat");
    fs::write(&data_path, &data).unwrap();
    let label_path = dir.path().join("image.img");

    let summary = attach_data(
        &mut tree,
        &mut ctx,
        &label_path,
        &data_path,
        10,
        &WriteOptions::default(),
    )
    .unwrap()
    .value()
    .expect("attach succeeds");

    let records = summary.records_written;
    let shift = i64::try_from(records).unwrap();
    assert_eq!(
        get_pointer(&tree, &mut ctx, "IMAGE", 0),
        Outcome::Done(PointerDescriptor::attached("IMAGE", 1 + shift))
    );
    assert_eq!(
        get_pointer(&tree, &mut ctx, "NOTES", 0),
        Outcome::Done(PointerDescriptor::detached("NOTES", "NOTES.TXT", 1))
    );

    let bytes = fs::read(&label_path).unwrap();
    assert_eq!(bytes.len() % 64, 0);
    assert_eq!(bytes.len() as u64, summary.bytes_written);
    let start = records * 64;
    assert_eq!(&bytes[start..start + 100], &data[10..]);
    assert!(bytes[start + 100..].iter().all(|&b| b == 0));

    let reread = read_label_file(&label_path, &mut ctx).unwrap().value().unwrap();
    let root = reread.tree.root().unwrap();
    let label_records = reread.tree.param_named(root, "LABEL_RECORDS").unwrap();
    assert_eq!(
        reread.tree.param(label_records).unwrap().values()[0].as_integer(),
        Some(shift)
    );
}

#[test]
fn attach_data_missing_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tree, mut ctx) = common::parse("RECORD_TYPE = STREAM\n^TABLE = 1\nEND\n");
    let err = attach_data(
        &mut tree,
        &mut ctx,
        &dir.path().join("out.lbl"),
        &dir.path().join("missing.tab"),
        0,
        &WriteOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("missing.tab"));
}

#[test]
fn refused_write_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("precious.lbl");
    fs::write(&path, "PRECIOUS = 1\nEND\n").unwrap();
    let (tree, mut ctx) = common::parse("RECORD_TYPE = SPIRAL\nEND\n");

    let outcome = write_label(&tree, &mut ctx, &path, &WriteOptions::default()).unwrap();
    assert_eq!(outcome, Outcome::Error);
    common::find_diag(&ctx, codes::RECORD_TYPE_UNRECOGNIZED);
    assert_eq!(fs::read_to_string(&path).unwrap(), "PRECIOUS = 1\nEND\n");

    let missing = dir.path().join("never.lbl");
    write_label(&tree, &mut ctx, &missing, &WriteOptions::default()).unwrap();
    assert!(!missing.exists());
}

#[test]
fn attach_data_stops_when_pointers_cannot_shift() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tree, mut ctx) =
        common::parse("RECORD_TYPE = STREAM\n^BAD = 1.5\n^TABLE = 1\nEND\n");
    let data_path = dir.path().join("table.dat");
    fs::write(&data_path, "ROW-ONE\nROW-TWO\n").unwrap();
    let label_path = dir.path().join("table.lbl");

    let outcome = attach_data(
        &mut tree,
        &mut ctx,
        &label_path,
        &data_path,
        0,
        &WriteOptions::default(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Error);
    common::find_diag(&ctx, codes::POINTER_UPDATE_FAILED);

    let written = fs::read_to_string(&label_path).unwrap();
    assert!(written.ends_with("END\n"), "{written}");
    assert!(!written.contains("ROW-ONE"));
}
