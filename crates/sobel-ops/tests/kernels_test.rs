//! Kernel tests through the public API.

use sobel_core::{partition, Frame, GrayImage, Resolution, Role, RowRange, SobelImage};
use sobel_ops::{detect_edges, grayscale, sobel, KernelPath};

fn gradient_frame(res: Resolution) -> Frame {
    let mut frame = Frame::new(res);
    for y in 0..res.height {
        for x in 0..res.width {
            let v = ((x * 255) / (res.width - 1)) as u8;
            frame.set_pixel(x, y, [v, (y * 7) as u8, v / 2]);
        }
    }
    frame
}

#[test]
fn test_split_matches_whole_frame() {
    for (w, h) in [(6u32, 6u32), (17, 7), (64, 48), (33, 3)] {
        let res = Resolution::new(w, h).unwrap();
        let frame = gradient_frame(res);

        let mut gray_ref = GrayImage::new(res);
        let mut sobel_ref = SobelImage::new(res);
        detect_edges(&frame, &mut gray_ref, &mut sobel_ref, KernelPath::Scalar).unwrap();

        let mut gray = GrayImage::new(res);
        let mut out = SobelImage::new(res);
        // worker first: the order inside one phase must not matter
        for role in [Role::Worker, Role::Controller] {
            let p = partition(role, h as usize);
            grayscale(&frame, &mut gray, p.grayscale, KernelPath::Simd).unwrap();
        }
        for role in [Role::Worker, Role::Controller] {
            let p = partition(role, h as usize);
            sobel(&gray, &mut out, p.gradient, KernelPath::Simd).unwrap();
        }

        assert_eq!(gray, gray_ref, "{w}x{h} gray");
        assert_eq!(out, sobel_ref, "{w}x{h} sobel");
    }
}

#[test]
fn test_vertical_step_edge() {
    // left half black, right half white
    let res = Resolution::new(10, 5).unwrap();
    let mut frame = Frame::new(res);
    for y in 0..5 {
        for x in 5..10 {
            frame.set_pixel(x, y, [255, 255, 255]);
        }
    }
    let mut gray = GrayImage::new(res);
    let mut out = SobelImage::new(res);
    detect_edges(&frame, &mut gray, &mut out, KernelPath::Simd).unwrap();

    for y in 1..4 {
        // columns 4 and 5 straddle the step: Gx = 4 * 255, saturated
        assert_eq!(out.get(4, y), 255);
        assert_eq!(out.get(5, y), 255);
        // flat regions
        assert_eq!(out.get(2, y), 0);
        assert_eq!(out.get(7, y), 0);
    }
    assert!(out.row(0).iter().all(|&v| v == 0));
    assert!(out.row(4).iter().all(|&v| v == 0));
}

#[test]
fn test_empty_ranges_are_noops() {
    let res = Resolution::new(4, 4).unwrap();
    let frame = Frame::filled(res, [1, 2, 3]);
    let mut gray = GrayImage::from_vec(res, vec![5; 16]).unwrap();
    let mut out = SobelImage::new(res);
    grayscale(&frame, &mut gray, RowRange::new(2, 2), KernelPath::Scalar).unwrap();
    sobel(&gray, &mut out, RowRange::new(2, 2), KernelPath::Scalar).unwrap();
    assert!(gray.as_bytes().iter().all(|&v| v == 5));
    assert!(out.as_bytes().iter().all(|&v| v == 0));
}
