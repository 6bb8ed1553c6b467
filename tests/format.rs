//! Decoder properties: header round-trips, command decoding totality, and
//! end-of-stream behavior.

mod support;

use replaint::{
    BrushControl, BrushType, Command, CommandIndex, HEADER_LEN, Header, LayerAction, Platform,
    ReplaintError, Rgb8, StrokeLog,
};
use support::LogBuilder;

#[test]
fn header_fields_round_trip_through_builder() {
    let bytes = LogBuilder::new()
        .aspect_ratio(1.5)
        .author("somebody")
        .title("seascape at dusk")
        .flags((1 << 1) | (1 << 19))
        .build();
    let header = Header::parse(&bytes).unwrap();
    assert_eq!(header.aspect_ratio, 1.5);
    assert_eq!(header.author, "somebody");
    assert_eq!(header.title, "seascape at dusk");
    assert!(header.flags.is_3d);
    assert!(header.flags.nsfw);
    assert!(!header.flags.eraser_used);
    assert_eq!(header.num_commands, 0);
    assert_eq!(header.platform, Platform::Handheld);
}

#[test]
fn header_serializes_to_json() {
    let bytes = LogBuilder::new().aspect_ratio(2.0).author("a").build();
    let header = Header::parse(&bytes).unwrap();
    let json = serde_json::to_string(&header).unwrap();
    let back: Header = serde_json::from_str(&json).unwrap();
    assert_eq!(back, header);
}

#[test]
fn truncated_header_and_truncated_stream_both_fail() {
    let err = StrokeLog::decode(vec![0u8; HEADER_LEN - 1]).unwrap_err();
    assert!(matches!(err, ReplaintError::Truncated(_)));

    let mut bytes = LogBuilder::new().draw(0.5, 0.5, 1.0).end_stroke().build();
    bytes.truncate(HEADER_LEN + 4);
    let err = StrokeLog::decode(bytes).unwrap_err();
    assert!(matches!(err, ReplaintError::Truncated(_)));
}

#[test]
fn command_access_is_random_and_bounded() {
    let bytes = LogBuilder::new()
        .color(1, 2, 3)
        .draw(0.25, 0.75, 0.5)
        .end_stroke()
        .build();
    let log = StrokeLog::decode(bytes).unwrap();
    assert_eq!(log.num_commands(), 3);

    // read out of order: the stream is seekable without parsing predecessors
    assert!(matches!(
        log.command(CommandIndex(2)),
        Some(Command::DrawEnd { layer: None, .. })
    ));
    assert!(matches!(
        log.command(CommandIndex(0)),
        Some(Command::Color {
            color: Some(Rgb8 { r: 1, g: 2, b: 3 }),
            ..
        })
    ));
    assert_eq!(log.command(CommandIndex(3)), None);
}

#[test]
fn every_word_in_a_hostile_stream_decodes() {
    let mut builder = LogBuilder::new();
    for word in [
        i32::MIN,
        i32::MAX,
        -1,
        0,
        0x7FFF_FFFF,
        0x5A5A_5A5A,
        -0x0123_4567,
    ] {
        builder = builder.word(word);
    }
    let log = StrokeLog::decode(builder.build()).unwrap();
    assert_eq!(log.commands().count(), 7);
}

#[test]
fn four_command_session_decodes_to_expected_records() {
    // aspect 1.5, 4 commands: stroke point at center-left, stroke end,
    // full-size hard brush, stroke point at center
    let bytes = LogBuilder::new()
        .aspect_ratio(1.5)
        .draw(0.0, 0.0, 1.0)
        .end_stroke()
        .size(1.0, 0, 0, 1.0)
        .draw(0.5, 0.5, 1.0)
        .build();
    let log = StrokeLog::decode(bytes).unwrap();
    assert_eq!(log.header().aspect_ratio, 1.5);
    assert_eq!(log.num_commands(), 4);

    match log.command(CommandIndex(0)).unwrap() {
        Command::Draw { x, y, pressure } => {
            assert_eq!(pressure, 1.0);
            assert_eq!(x, 0.0);
            assert_eq!(y, 0.0);
        }
        other => panic!("expected draw, got {other:?}"),
    }
    assert_eq!(
        log.command(CommandIndex(1)).unwrap(),
        Command::DrawEnd {
            layer: None,
            action: LayerAction::Set
        }
    );
    match log.command(CommandIndex(2)).unwrap() {
        Command::Size {
            size,
            control,
            kind,
            opacity,
        } => {
            assert_eq!(size, 1.0);
            assert_eq!(control, BrushControl::Full);
            assert_eq!(kind, BrushType::Hard);
            assert_eq!(opacity, 1.0);
        }
        other => panic!("expected size, got {other:?}"),
    }
    match log.command(CommandIndex(3)).unwrap() {
        Command::Draw { x, y, pressure } => {
            assert_eq!(pressure, 1.0);
            assert_eq!(x, 0.5);
            assert_eq!(y, 0.5);
        }
        other => panic!("expected draw, got {other:?}"),
    }
}
