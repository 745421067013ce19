//! End-to-end: render a viewport, write it as PGM, read it back.

use cachebench_core::image::{load_pgm, save_pgm, scale_count, PGM_MAX_VALUE};
use cachebench_core::{run_mandelbrot_case, Error, RenderMode, Viewport};
use tempfile::TempDir;

const CAP: u32 = 200;

#[test]
fn test_rendered_image_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mandelbrot.pgm");
    let viewport = Viewport::new(37, 21, -0.5, 0.0, 1.0).unwrap();

    let run = run_mandelbrot_case(&viewport, CAP, RenderMode::Vectorized, 3).unwrap();
    assert!(run.report.verified);
    save_pgm(&path, viewport.width(), viewport.height(), &run.counts, CAP).unwrap();

    let image = load_pgm(&path).unwrap();
    assert_eq!(image.width, 37);
    assert_eq!(image.height, 21);
    assert_eq!(image.max_value, u16::from(PGM_MAX_VALUE));
    for row in 0..viewport.height() {
        for col in 0..viewport.width() {
            let count = run.counts[row * viewport.width() + col];
            assert_eq!(image.pixel(row, col), scale_count(count, CAP));
        }
    }

    // The set interior is black, and something outside it is not.
    assert!(image.pixels.contains(&0));
    assert!(image.pixels.iter().any(|&p| p > 0));
}

#[test]
fn test_file_header_is_plain_p5() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tiny.pgm");
    save_pgm(&path, 2, 2, &[0, 50, 100, 400], 100).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..11], b"P5\n2 2\n255\n");
    assert_eq!(&bytes[11..], &[0, 127, 255, 255]);
}

#[test]
fn test_scalar_and_vectorized_images_are_identical() {
    let dir = TempDir::new().unwrap();
    let viewport = Viewport::new(29, 13, -0.743_643_887, 0.131_825_904, 0.01).unwrap();

    let mut images = Vec::new();
    for (mode, workers) in [(RenderMode::Scalar, 1), (RenderMode::Vectorized, 4)] {
        let run = run_mandelbrot_case(&viewport, CAP, mode, workers).unwrap();
        let path = dir.path().join(format!("{mode:?}.pgm"));
        save_pgm(&path, 29, 13, &run.counts, CAP).unwrap();
        images.push(load_pgm(&path).unwrap());
    }
    assert_eq!(images[0], images[1]);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_pgm(dir.path().join("absent.pgm")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
