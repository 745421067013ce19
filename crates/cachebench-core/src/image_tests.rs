//! Tests for `image` module.

use crate::error::Error;
use crate::image::{read_pgm, scale_count, write_pgm};

#[test]
fn test_scale_count_linear() {
    assert_eq!(scale_count(0, 1500), 0);
    assert_eq!(scale_count(1500, 1500), 255);
    assert_eq!(scale_count(750, 1500), 127);
    assert_eq!(scale_count(1, 2), 127);
}

#[test]
fn test_scale_count_clamps_above_cap() {
    assert_eq!(scale_count(9000, 1500), 255);
}

#[test]
fn test_scale_count_zero_cap() {
    assert_eq!(scale_count(5, 0), 0);
}

#[test]
fn test_write_pgm_header_and_payload() {
    let counts = [0_u32, 10, 5, 10, 1, 2];
    let mut out = Vec::new();
    write_pgm(&mut out, 3, 2, &counts, 10).unwrap();

    let header = b"P5\n3 2\n255\n";
    assert_eq!(&out[..header.len()], header);
    assert_eq!(&out[header.len()..], &[0, 255, 127, 255, 25, 51]);
}

#[test]
fn test_write_pgm_rejects_size_mismatch() {
    let mut out = Vec::new();
    let err = write_pgm(&mut out, 3, 3, &[0; 8], 10).unwrap_err();
    assert!(matches!(err, Error::Image(_)));
    assert!(out.is_empty());
}

#[test]
fn test_read_pgm_roundtrip() {
    let counts: Vec<u32> = (0..20).collect();
    let mut out = Vec::new();
    write_pgm(&mut out, 5, 4, &counts, 19).unwrap();

    let image = read_pgm(out.as_slice()).unwrap();
    assert_eq!(image.width, 5);
    assert_eq!(image.height, 4);
    assert_eq!(image.max_value, 255);
    for (i, &c) in counts.iter().enumerate() {
        assert_eq!(image.pixels[i], scale_count(c, 19));
    }
    assert_eq!(image.pixel(3, 4), 255);
}

#[test]
fn test_read_pgm_tolerates_whitespace_and_comments() {
    let mut bytes = b"P5 # produced elsewhere\n  2\t1\r\n255 ".to_vec();
    bytes.extend_from_slice(&[9, 200]);
    let image = read_pgm(bytes.as_slice()).unwrap();
    assert_eq!((image.width, image.height), (2, 1));
    assert_eq!(image.pixels, vec![9, 200]);
}

#[test]
fn test_read_pgm_rejects_bad_magic() {
    let err = read_pgm(&b"P2\n1 1\n255\n\0"[..]).unwrap_err();
    assert!(matches!(err, Error::Image(_)));
}

#[test]
fn test_read_pgm_rejects_short_raster() {
    let err = read_pgm(&b"P5\n4 4\n255\n\x01\x02"[..]).unwrap_err();
    assert!(matches!(err, Error::Image(_)));
}

#[test]
fn test_read_pgm_rejects_wide_max_value() {
    let err = read_pgm(&b"P5\n1 1\n65535\n\0\0"[..]).unwrap_err();
    assert!(matches!(err, Error::Image(_)));
}
