//! Classification test suite

use crate::analysis::heuristic::{merge_data, split_leading_zeros, sweep};
use crate::analysis::traced::{
    classify_unknown, extend_to_terminal, merge_fall_through, promote_entry_points, seed,
    split_at_terminals,
};
use crate::analysis::{
    catch_data, find_terminal, find_text, fixpoint, generate_heuristic, generate_traced,
    is_disguised_data, is_zero_fill, synthesize, Disassembly, ReferenceKind, Tag, TagMap,
    TextContext,
};
use crate::arch::z80::{RepeatCeilings, Z80};
use crate::codemap::CodeBlock;
use crate::memory::Image;
use crate::project::Config;
use std::collections::BTreeMap;
use std::fs;

fn tags(pairs: &[(u32, char)]) -> TagMap {
    let tags: BTreeMap<u32, Tag> = pairs
        .iter()
        .map(|(addr, c)| {
            let tag = match c {
                'c' => Tag::Code,
                'b' => Tag::Bytes,
                't' => Tag::Text,
                's' => Tag::Zero,
                'i' => Tag::End,
                _ => Tag::Unknown,
            };

            (*addr, tag)
        })
        .collect();

    tags.into()
}

/// Every classified map covers its whole range, ends with the sentinel and
/// carries nothing unknown.
fn assert_well_formed(map: &TagMap, start: u32, end: u32) {
    let boundaries: Vec<(u32, Tag)> = map.iter().collect();

    assert_eq!(boundaries.first().map(|(addr, _)| *addr), Some(start));
    assert_eq!(boundaries.last(), Some(&(end, Tag::End)));
    assert!(!map.has_unknown());
    assert_eq!(map.iter().filter(|(_, tag)| *tag == Tag::End).count(), 1);

    for block in map.blocks() {
        assert!(!block.is_empty());
    }
}

#[test]
fn terminal_absorbs() {
    let image = Image::from_raw(&[0x01, 0x00, 0x00, 0xC9, 0x00], 0).unwrap();
    let z80 = Z80::default();
    let mut map = tags(&[(0, 'c'), (1, 'b'), (2, 't'), (5, 'i')]);

    assert_eq!(find_terminal(&image, &z80, &mut map, 0, 5, None), 4);
    assert_eq!(map, tags(&[(0, 'c'), (4, 'b'), (5, 'i')]));
}

#[test]
fn terminal_explicit_tag() {
    let image = Image::from_raw(&[0x3C, 0xC9, 0x00, 0x00], 0).unwrap();
    let z80 = Z80::default();
    let mut map = tags(&[(0, 'c'), (4, 'i')]);

    assert_eq!(find_terminal(&image, &z80, &mut map, 0, 4, Some(Tag::Unknown)), 2);
    assert_eq!(map, tags(&[(0, 'c'), (2, 'U'), (4, 'i')]));
}

#[test]
fn terminal_stops_at_code() {
    let image = Image::from_raw(&[0x3C, 0x3C, 0x3C, 0xC9], 0).unwrap();
    let z80 = Z80::default();
    let mut map = tags(&[(0, 'b'), (2, 'c'), (4, 'i')]);

    assert_eq!(find_terminal(&image, &z80, &mut map, 0, 4, Some(Tag::Bytes)), 2);
    assert_eq!(map, tags(&[(0, 'b'), (2, 'c'), (4, 'i')]));
}

#[test]
fn terminal_no_tag() {
    let image = Image::from_raw(&[0xC9, 0x00], 0).unwrap();
    let z80 = Z80::default();
    let mut map = tags(&[(0, 'c'), (2, 'i')]);

    assert_eq!(find_terminal(&image, &z80, &mut map, 0, 2, None), 1);
    assert_eq!(map, tags(&[(0, 'c'), (2, 'i')]));
}

#[test]
fn terminal_runs_out() {
    let image = Image::from_raw(&[0x3C, 0x3C, 0xC3, 0x00], 0).unwrap();
    let z80 = Z80::default();
    let mut map = tags(&[(0, 'c'), (4, 'i')]);

    assert_eq!(find_terminal(&image, &z80, &mut map, 0, 4, Some(Tag::Unknown)), 4);
    assert_eq!(map, tags(&[(0, 'c'), (4, 'i')]));
}

#[test]
fn repeats() {
    assert!(is_disguised_data(3, 3, &[0x40]));
    assert!(is_disguised_data(4, 3, &[0x40]));
    assert!(!is_disguised_data(2, 3, &[0x40]));
    assert!(!is_disguised_data(100, 0, &[0x00]));
    assert!(!is_disguised_data(2, 2, &[0x66]));
    assert!(!is_disguised_data(2, 2, &[0x6E]));
    assert!(is_disguised_data(3, 2, &[0x66]));
    assert!(is_disguised_data(2, 2, &[0x76]));

    assert_eq!(catch_data(0x10, 3, 3, 0x13, &[0x40], None), (Some((0x10, Tag::Bytes)), 0x13));
    assert_eq!(
        catch_data(0x10, 3, 3, 0x13, &[0x40], Some(Tag::Code)),
        (Some((0x10, Tag::Bytes)), 0x13)
    );
    assert_eq!(catch_data(0x10, 3, 3, 0x13, &[0x40], Some(Tag::Bytes)), (None, 0x13));
    assert_eq!(catch_data(0x10, 2, 3, 0x12, &[0x40], None), (None, 0x10));
}

#[test]
fn text() {
    let image = Image::from_raw(b"\x00HELLO\x00AB\x00WORLD", 0).unwrap();
    let config = Config::default();

    assert_eq!(
        find_text(&image, &config, 0, 15, TextContext::Data),
        vec![(1, 6), (10, 15)]
    );
    assert_eq!(find_text(&image, &config, 0, 12, TextContext::Data), vec![(1, 6)]);
    assert_eq!(find_text(&image, &config, 0, 15, TextContext::Code), Vec::<(u32, u32)>::new());

    let config = config.with_dictionary(vec!["world"]);
    assert_eq!(find_text(&image, &config, 0, 15, TextContext::Data), vec![(10, 15)]);
}

#[test]
fn zero_fill() {
    let image = Image::from_raw(&[0x00, 0x00, 0x01, 0x00], 0).unwrap();

    assert!(is_zero_fill(&image, 0, 2));
    assert!(!is_zero_fill(&image, 0, 3));
    assert!(is_zero_fill(&image, 3, 4));
}

#[test]
fn fixpoint_counts() {
    let mut remaining = 3;
    let passes = fixpoint(|| {
        if remaining > 0 {
            remaining -= 1;
            true
        } else {
            false
        }
    });

    assert_eq!(passes, 3);
    assert_eq!(remaining, 0);
}

#[test]
fn heuristic_ret_then_zeros() {
    let mut data = vec![0xC9];
    data.extend_from_slice(&[0x00; 15]);
    let image = Image::from_raw(&data, 0).unwrap();

    let map = generate_heuristic(&image, &Z80::default(), &Config::default(), 0, 16);

    assert_eq!(map, tags(&[(0, 'c'), (1, 's'), (16, 'i')]));
    assert_well_formed(&map, 0, 16);
}

#[test]
fn heuristic_repeated_filler() {
    let image = Image::from_raw(&[0x40, 0x40, 0x40, 0x40, 0x40, 0xC9], 0).unwrap();
    let z80 = Z80::new(RepeatCeilings::none().with_overrides(vec![(0x40, 4)]));

    let map = generate_heuristic(&image, &z80, &Config::default(), 0, 6);

    assert_eq!(map, tags(&[(0, 'b'), (5, 'c'), (6, 'i')]));
}

/// A run of NOPs past its ceiling is filler; as the bytes are all zero, zero
/// fill wins over plain data.
#[test]
fn heuristic_repeated_nops() {
    let image = Image::from_raw(&[0x00, 0x00, 0x00, 0x00, 0x00, 0xC9], 0).unwrap();
    let z80 = Z80::new(RepeatCeilings::none().with_overrides(vec![(0x00, 4)]));

    assert_eq!(sweep(&image, &z80, 0, 6), tags(&[(0, 'b'), (5, 'c'), (6, 'i')]));

    let map = generate_heuristic(&image, &z80, &Config::default(), 0, 6);

    assert_eq!(map, tags(&[(0, 's'), (5, 'c'), (6, 'i')]));
    assert_well_formed(&map, 0, 6);
}

#[test]
fn heuristic_hl_idiom() {
    let image = Image::from_raw(&[0x66, 0x66, 0xC9], 0).unwrap();
    let z80 = Z80::new(RepeatCeilings::none().with_overrides(vec![(0x66, 2)]));

    let map = generate_heuristic(&image, &z80, &Config::default(), 0, 3);

    assert_eq!(map, tags(&[(0, 'c'), (3, 'i')]));
}

#[test]
fn heuristic_sweep() {
    let image = Image::from_raw(&[0x3C, 0xC9, 0x3D, 0xC9, 0x3C], 0).unwrap();

    assert_eq!(
        sweep(&image, &Z80::default(), 0, 5),
        tags(&[(0, 'c'), (2, 'c'), (4, 'b'), (5, 'i')])
    );
}

#[test]
fn heuristic_consecutive_data_streaks() {
    let image = Image::from_raw(&[0x40, 0x40, 0x40, 0x7F, 0x7F, 0x7F, 0xC9], 0).unwrap();

    assert_eq!(
        sweep(&image, &Z80::default(), 0, 7),
        tags(&[(0, 'b'), (6, 'c'), (7, 'i')])
    );
}

#[test]
fn heuristic_leading_zeros() {
    let image = Image::from_raw(&[0x00, 0x00, 0x3C, 0xC9, 0x00, 0xC9], 0).unwrap();
    let mut map = tags(&[(0, 'c'), (4, 'c'), (6, 'i')]);

    split_leading_zeros(&image, &mut map);

    assert_eq!(map, tags(&[(0, 's'), (2, 'c'), (4, 's'), (5, 'c'), (6, 'i')]));
}

#[test]
fn heuristic_merge_data() {
    let mut map = tags(&[
        (0, 'b'),
        (2, 's'),
        (4, 'c'),
        (5, 's'),
        (6, 'c'),
        (7, 's'),
        (8, 'b'),
        (9, 'i'),
    ]);

    merge_data(&mut map);

    assert_eq!(map, tags(&[(0, 'b'), (4, 'c'), (5, 's'), (6, 'c'), (7, 'b'), (9, 'i')]));
}

#[test]
fn heuristic_text_in_data() {
    let mut data = vec![0xC9];
    data.extend_from_slice(b"HELLO");
    data.extend_from_slice(&[0x80, 0x81]);
    let image = Image::from_raw(&data, 0).unwrap();

    let map = generate_heuristic(&image, &Z80::default(), &Config::default(), 0, 8);

    assert_eq!(map, tags(&[(0, 'c'), (1, 't'), (6, 'b'), (8, 'i')]));
    assert_well_formed(&map, 0, 8);
}

#[test]
fn heuristic_text_in_code() {
    let mut data = b"Press any key".to_vec();
    data.extend_from_slice(&[0x01, 0x02, 0x03, 0xC9]);
    let image = Image::from_raw(&data, 0).unwrap();

    let config = Config::default().with_text_min_length_code(8);
    let map = generate_heuristic(&image, &Z80::default(), &config, 0, 17);

    assert_eq!(map, tags(&[(0, 't'), (13, 'c'), (17, 'i')]));
    assert_well_formed(&map, 0, 17);
}

#[test]
fn traced_seed() {
    let blocks = vec![CodeBlock::new(0x8000, 4), CodeBlock::new(0x8008, 8)];

    assert_eq!(
        seed(0x8000, 0x8010, &blocks),
        tags(&[(0x8000, 'c'), (0x8004, 'U'), (0x8008, 'c'), (0x8010, 'i')])
    );
}

#[test]
fn traced_extend() {
    let image = Image::from_raw(
        &[0x20, 0x02, 0x3E, 0x01, 0x3C, 0xC9, 0xFF, 0xFF, 0xFF, 0xFF],
        0x8000,
    )
    .unwrap();
    let z80 = Z80::default();
    let mut map = seed(0x8000, 0x800A, &[CodeBlock::new(0x8000, 2)]);

    assert_eq!(fixpoint(|| extend_to_terminal(&image, &z80, &mut map, 0x800A)), 1);
    assert_eq!(map, tags(&[(0x8000, 'c'), (0x8006, 'U'), (0x800A, 'i')]));

    let map = generate_traced(
        &image,
        &z80,
        &Config::default(),
        0x8000,
        0x800A,
        &[CodeBlock::new(0x8000, 2)],
    );

    assert_eq!(map, tags(&[(0x8000, 'c'), (0x8006, 'b'), (0x800A, 'i')]));
    assert_well_formed(&map, 0x8000, 0x800A);
}

#[test]
fn traced_promote() {
    let mut data = vec![0x00; 0x20];
    data[0..4].copy_from_slice(&[0xCD, 0x10, 0x80, 0xC9]);
    data[0x10..0x13].copy_from_slice(&[0x3E, 0x05, 0xC9]);
    let image = Image::from_raw(&data, 0x8000).unwrap();
    let z80 = Z80::default();

    let mut map = seed(0x8000, 0x8020, &[CodeBlock::new(0x8000, 4)]);
    assert_eq!(fixpoint(|| promote_entry_points(&image, &z80, &mut map, 0x8020)), 1);
    assert_eq!(
        map,
        tags(&[(0x8000, 'c'), (0x8004, 'U'), (0x8010, 'c'), (0x8013, 'U'), (0x8020, 'i')])
    );

    let map = generate_traced(
        &image,
        &z80,
        &Config::default(),
        0x8000,
        0x8020,
        &[CodeBlock::new(0x8000, 4)],
    );

    assert_eq!(
        map,
        tags(&[(0x8000, 'c'), (0x8004, 's'), (0x8010, 'c'), (0x8013, 's'), (0x8020, 'i')])
    );
    assert_well_formed(&map, 0x8000, 0x8020);
}

#[test]
fn disassembly_referrers() {
    let mut data = vec![0x00; 0x20];
    data[0..9].copy_from_slice(&[0xCD, 0x10, 0x80, 0x18, 0x0B, 0xC9, 0xC3, 0x10, 0x80]);
    let image = Image::from_raw(&data, 0x8000).unwrap();
    let map = tags(&[(0x8000, 'c'), (0x8006, 'b'), (0x8009, 'U'), (0x8020, 'i')]);

    let disassembly = Disassembly::build(&image, &Z80::default(), &map);
    let referrers = disassembly.referrers(0x8010);

    assert_eq!(referrers.len(), 3);
    assert_eq!(referrers[0].as_source(), 0x8000);
    assert_eq!(referrers[0].kind(), ReferenceKind::Subroutine);
    assert_eq!(referrers[1].as_source(), 0x8003);
    assert_eq!(referrers[1].kind(), ReferenceKind::Code);
    assert_eq!(referrers[2].as_source(), 0x8006);
    assert_eq!(referrers[2].source_tag(), Tag::Bytes);
    assert!(referrers.iter().all(|r| r.as_target() == 0x8010));

    assert_eq!(ReferenceKind::Subroutine.to_string(), "FUN");
    assert_eq!(ReferenceKind::Code.to_string(), "LOC");

    let reference = disassembly.code_referrer(0x8010).unwrap();
    assert_eq!(reference.as_source(), 0x8000);
    assert!(disassembly.code_referrer(0x8009).is_none());
}

#[test]
fn traced_split_and_merge() {
    let image = Image::from_raw(&[0x3E, 0x01, 0x18, 0x00, 0xC9, 0x3C, 0xC9], 0x8000).unwrap();
    let z80 = Z80::default();

    let mut map = tags(&[(0x8000, 'c'), (0x8007, 'i')]);
    split_at_terminals(&image, &z80, &mut map);
    assert_eq!(map, tags(&[(0x8000, 'c'), (0x8004, 'c'), (0x8005, 'c'), (0x8007, 'i')]));

    assert_eq!(fixpoint(|| merge_fall_through(&image, &z80, &mut map)), 1);
    assert_eq!(map, tags(&[(0x8000, 'c'), (0x8005, 'c'), (0x8007, 'i')]));
}

#[test]
fn traced_merge_requires_code() {
    let image = Image::from_raw(&[0x18, 0x00, 0x00, 0x00], 0x8000).unwrap();
    let z80 = Z80::default();
    let mut map = tags(&[(0x8000, 'c'), (0x8002, 'b'), (0x8004, 'i')]);

    assert!(!merge_fall_through(&image, &z80, &mut map));
}

#[test]
fn traced_unknown_text() {
    let mut data = vec![0xC9];
    data.extend_from_slice(b"\x01SCORE\x01");
    let image = Image::from_raw(&data, 0x8000).unwrap();
    let mut map = tags(&[(0x8000, 'c'), (0x8001, 'U'), (0x8008, 'i')]);

    assert_eq!(classify_unknown(&image, &Config::default(), &mut map), 1);
    assert_eq!(
        map,
        tags(&[(0x8000, 'c'), (0x8001, 'b'), (0x8002, 't'), (0x8007, 'b'), (0x8008, 'i')])
    );
}

#[test]
fn synthesize_with_code_map() {
    let image = Image::from_raw(&[0x3E, 0x01, 0xC9, 0x00, 0x00, 0x00], 0x8000).unwrap();
    let path = std::env::temp_dir().join(format!("zxmap-{}-synth.log", std::process::id()));
    fs::write(&path, "$8000\n$8002\n").unwrap();

    let map = synthesize(
        &image,
        &Z80::default(),
        &Config::default(),
        0x8000,
        0x8006,
        Some(&path),
    )
    .unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(map, tags(&[(0x8000, 'c'), (0x8003, 's'), (0x8006, 'i')]));
}

#[test]
fn synthesize_without_code_map() {
    let image = Image::from_raw(&[0x3E, 0x01, 0xC9, 0x00, 0x00, 0x00], 0x8000).unwrap();

    let map = synthesize(
        &image,
        &Z80::default(),
        &Config::default(),
        0x8000,
        0x8006,
        None,
    )
    .unwrap();

    assert_eq!(map, tags(&[(0x8000, 'c'), (0x8003, 's'), (0x8006, 'i')]));
}

#[test]
fn synthesize_missing_code_map() {
    let image = Image::default();
    let path = std::env::temp_dir().join("zxmap-missing-code-map.log");

    assert!(synthesize(
        &image,
        &Z80::default(),
        &Config::default(),
        0,
        0x100,
        Some(&path)
    )
    .is_err());
}

#[test]
fn synthesize_whole_image() {
    let mut data = vec![0u8; 0x10000];
    data[0x8000..0x8004].copy_from_slice(&[0xCD, 0x00, 0x90, 0xC9]);
    data[0x8004..0x8011].copy_from_slice(b"PRESS ANY KEY");
    data[0x9000..0x9002].copy_from_slice(&[0x3C, 0xC9]);
    let image = Image::from_raw(&data, 0).unwrap();

    let map = synthesize(&image, &Z80::default(), &Config::default(), 0, 0x10000, None).unwrap();

    assert_well_formed(&map, 0, 0x10000);
    assert_eq!(map.tag_at(0x8000), Some(Tag::Code));
    assert_eq!(map.tag_at(0x8005), Some(Tag::Text));
    assert_eq!(map.tag_at(0x9001), Some(Tag::Code));
    assert_eq!(map.tag_at(0xC000), Some(Tag::Zero));

    let json = serde_json::to_string(&map).unwrap();
    assert!(json.starts_with("{\"0\":"));
    assert!(json.ends_with("\"65536\":\"i\"}"));
}

#[test]
fn text_length_boundary() {
    let config = Config::default().with_text_min_length_data(4);

    let image = Image::from_raw(b"ABC\x00", 0).unwrap();
    assert_eq!(find_text(&image, &config, 0, 4, TextContext::Data), Vec::<(u32, u32)>::new());

    let image = Image::from_raw(b"ABCD\x00", 0).unwrap();
    assert_eq!(find_text(&image, &config, 0, 5, TextContext::Data), vec![(0, 4)]);
    assert_eq!(find_text(&image, &config, 0, 4, TextContext::Data), vec![(0, 4)]);
}

#[test]
fn hl_idiom_any_ceiling() {
    for ceiling in 2..10 {
        assert!(!is_disguised_data(2, ceiling, &[0x66]));
        assert!(!is_disguised_data(2, ceiling, &[0x6E]));
    }
}

#[test]
fn heuristic_reclassification() {
    let mut data = vec![0xC9];
    data.extend_from_slice(&[0x00; 7]);
    data.push(0xC9);
    data.extend_from_slice(&[0x00; 7]);
    let image = Image::from_raw(&data, 0).unwrap();
    let z80 = Z80::default();
    let config = Config::default();

    let map = generate_heuristic(&image, &z80, &config, 0, 16);
    assert_well_formed(&map, 0, 16);

    for block in map.blocks() {
        let again = generate_heuristic(&image, &z80, &config, block.start(), block.end());
        assert_eq!(again.get(block.start()), Some(block.tag()));
    }
}
