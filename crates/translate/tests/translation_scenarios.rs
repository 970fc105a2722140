//! End-to-end planner scenarios against the public API

use std::sync::Arc;
use switchyard_translate::format::{Format, FormatMask};
use switchyard_translate::registry::TranslatorRegistry;
use switchyard_translate::sim::{self, SimTranscoder};
use switchyard_translate::TranslateError;

fn mask_of(formats: &[Format]) -> FormatMask {
    formats
        .iter()
        .fold(FormatMask::EMPTY, |acc, f| acc | f.mask())
}

#[test]
fn single_leg_path() {
    let registry = TranslatorRegistry::new();
    registry
        .register(Arc::new(SimTranscoder::new(Format::Ulaw, Format::Slin)))
        .unwrap();

    let path = registry
        .build_path(Format::Slin.mask(), Format::Ulaw.mask())
        .unwrap();
    assert_eq!(path.steps(), 1);
    assert_eq!(
        registry.path_steps(Format::Slin.mask(), Format::Ulaw.mask()),
        Ok(1)
    );
}

#[test]
fn quality_dominates_cost() {
    let registry = TranslatorRegistry::new();
    // Direct ulaw -> alaw: one lossy-to-lossy same-rate leg, but expensive.
    registry
        .register(Arc::new(
            SimTranscoder::new(Format::Ulaw, Format::Alaw).with_busy_work(2_000),
        ))
        .unwrap();
    // Cheap detour through slin: two legs, worse summed rate class.
    registry
        .register(Arc::new(SimTranscoder::new(Format::Ulaw, Format::Slin)))
        .unwrap();
    registry
        .register(Arc::new(SimTranscoder::new(Format::Slin, Format::Alaw)))
        .unwrap();

    // The direct leg wins despite costing orders of magnitude more.
    let info = registry
        .path_info(Format::Alaw.mask(), Format::Ulaw.mask())
        .unwrap();
    assert_eq!(info.steps, 1);
    let path = registry
        .build_path(Format::Alaw.mask(), Format::Ulaw.mask())
        .unwrap();
    assert_eq!(path.to_string(), "ulaw->alaw");
}

#[test]
fn composite_path_forms_when_no_direct_exists() {
    let registry = TranslatorRegistry::new();
    sim::register_standard_set(&registry).unwrap();

    // The multistep flag is boolean: any composite path reports 2 steps.
    assert_eq!(
        registry.path_steps(Format::G722.mask(), Format::Ulaw.mask()),
        Ok(2)
    );

    let path = registry
        .build_path(Format::G722.mask(), Format::Ulaw.mask())
        .unwrap();
    assert_eq!(path.steps(), 3);
    assert_eq!(path.to_string(), "ulaw->slin->slin16->g722");
}

#[test]
fn common_format_short_circuits_the_matrix() {
    // No translators registered at all: a common format needs none.
    let registry = TranslatorRegistry::new();

    let mut dst = mask_of(&[Format::Ulaw, Format::Gsm]);
    let mut srcs = mask_of(&[Format::Ulaw, Format::G722]);
    registry.best_choice(&mut dst, &mut srcs).unwrap();
    assert_eq!(dst, Format::Ulaw.mask());
    assert_eq!(srcs, Format::Ulaw.mask());
}

#[test]
fn common_format_prefers_the_highest_sample_rate() {
    let registry = TranslatorRegistry::new();
    let mut dst = mask_of(&[Format::Ulaw, Format::G722]);
    let mut srcs = mask_of(&[Format::Ulaw, Format::G722]);
    registry.best_choice(&mut dst, &mut srcs).unwrap();
    assert_eq!(dst, Format::G722.mask());
    assert_eq!(srcs, Format::G722.mask());
}

#[test]
fn full_audio_source_with_ulaw_destination_forces_ulaw() {
    let registry = TranslatorRegistry::new();
    let mut dst = Format::Ulaw.mask();
    let mut srcs = FormatMask::AUDIO;
    registry.best_choice(&mut dst, &mut srcs).unwrap();
    assert_eq!(dst, Format::Ulaw.mask());
    assert_eq!(srcs, Format::Ulaw.mask());
}

#[test]
fn best_choice_consults_the_matrix_when_nothing_is_common() {
    let registry = TranslatorRegistry::new();
    sim::register_standard_set(&registry).unwrap();

    let mut dst = Format::Gsm.mask();
    let mut srcs = Format::Ulaw.mask();
    registry.best_choice(&mut dst, &mut srcs).unwrap();
    assert_eq!(dst, Format::Gsm.mask());
    assert_eq!(srcs, Format::Ulaw.mask());

    // And fails cleanly when the matrix is empty.
    let empty = TranslatorRegistry::new();
    let mut dst = Format::Gsm.mask();
    let mut srcs = Format::Ulaw.mask();
    assert!(matches!(
        empty.best_choice(&mut dst, &mut srcs),
        Err(TranslateError::NoTranslatorAvailable)
    ));
}

#[test]
fn available_formats_requires_paths_both_ways() {
    let registry = TranslatorRegistry::new();
    sim::register_standard_set(&registry).unwrap();

    let dest = mask_of(&[Format::Alaw, Format::Gsm, Format::G723, Format::G722]);
    let src = Format::Ulaw.mask();
    let res = registry.available_formats(dest, src);

    // Result is a subset of dest...
    assert_eq!(res & dest, res);
    // ...kept bits are translatable in both directions...
    for f in res.formats() {
        assert!(registry.build_path(f.mask(), src).is_ok());
        assert!(registry.build_path(src, f.mask()).is_ok());
    }
    // ...and g723 has no translator at all.
    assert!(!res.contains(Format::G723));
    assert!(res.contains(Format::Alaw));
    assert!(res.contains(Format::Gsm));
    assert!(res.contains(Format::G722));
}

#[test]
fn available_formats_without_source_returns_dest() {
    let registry = TranslatorRegistry::new();
    let dest = mask_of(&[Format::Alaw, Format::G723]);
    assert_eq!(registry.available_formats(dest, FormatMask::EMPTY), dest);
}

#[test]
fn identity_build_path_is_a_noop_chain() {
    let registry = TranslatorRegistry::new();
    let mut path = registry
        .build_path(Format::Ulaw.mask(), Format::Ulaw.mask())
        .unwrap();
    assert!(path.is_empty());

    let frame = switchyard_translate::Frame::voice(
        Format::Ulaw.mask(),
        160,
        bytes::Bytes::from(vec![0u8; 160]),
    );
    let out = path.translate(&frame).unwrap().unwrap();
    assert_eq!(out.samples, frame.samples);
    assert_eq!(out.data, frame.data);
}

#[test]
fn build_path_reports_missing_and_invalid_formats() {
    let registry = TranslatorRegistry::new();
    assert!(matches!(
        registry.build_path(Format::Gsm.mask(), Format::Ulaw.mask()),
        Err(TranslateError::NoPath { .. })
    ));
    assert!(matches!(
        registry.build_path(Format::Gsm.mask(), FormatMask::EMPTY),
        Err(TranslateError::InvalidFormat { end: "starting", .. })
    ));
    assert!(matches!(
        registry.build_path(FormatMask::EMPTY, Format::Gsm.mask()),
        Err(TranslateError::InvalidFormat { end: "ending", .. })
    ));
}

#[test]
fn unregistering_a_leg_does_not_break_a_live_chain() {
    let registry = TranslatorRegistry::new();
    let id = registry
        .register(Arc::new(SimTranscoder::new(Format::Ulaw, Format::Slin)))
        .unwrap();
    let mut path = registry
        .build_path(Format::Slin.mask(), Format::Ulaw.mask())
        .unwrap();

    registry.unregister(id).unwrap();
    // The matrix no longer knows the path...
    assert!(registry
        .build_path(Format::Slin.mask(), Format::Ulaw.mask())
        .is_err());

    // ...but the built chain still owns its transcoder.
    let frame = switchyard_translate::Frame::voice(
        Format::Ulaw.mask(),
        160,
        bytes::Bytes::from(vec![0u8; 160]),
    );
    let out = path.translate(&frame).unwrap().unwrap();
    assert_eq!(out.subclass, Format::Slin.mask());
}
