use kernel_bitmap::{
    BitStore, Bitmap, BitmapPersist, BitmapView, NOT_FOUND, Policy, ScanEngine, buf_size,
};

/// Claims `size`-bit regions until the engine gives up.
fn claim_all(engine: &mut ScanEngine, bits: &impl BitStore, size: usize) -> Vec<usize> {
    let mut claimed = Vec::new();
    while let Some(idx) = engine.scan_and_flip(bits, 0, size, false) {
        claimed.push(idx);
    }
    claimed
}

#[test]
fn contiguous_policies_fill_the_bitmap() {
    let (bits, size) = (100, 7);
    for policy in [Policy::FirstFit, Policy::NextFit, Policy::BestFit] {
        let b = Bitmap::new(bits).unwrap();
        let mut engine = ScanEngine::with_policy(policy);
        let claimed = claim_all(&mut engine, &b, size);

        assert_eq!(claimed.len(), bits / size, "{policy}");
        assert_eq!(b.count(0, bits, true), bits / size * size, "{policy}");

        let mut sorted = claimed.clone();
        sorted.sort_unstable();
        for pair in sorted.windows(2) {
            assert!(pair[0] + size <= pair[1], "{policy}: {pair:?} overlap");
        }
    }
}

#[test]
fn first_fit_skips_occupied_prefix() {
    let b = Bitmap::new(10).unwrap();
    b.set_multiple(2, 3, true);
    let mut engine = ScanEngine::with_policy(Policy::FirstFit);
    assert_eq!(engine.scan(&b, 0, 3, false), Some(5));
    assert_eq!(engine.scan(&b, 0, 2, false), Some(0));
}

#[test]
fn next_fit_resumes_then_wraps() {
    let b = Bitmap::new(10).unwrap();
    b.set_multiple(2, 3, true);
    let mut engine = ScanEngine::with_policy(Policy::NextFit);

    assert_eq!(engine.scan_and_flip(&b, 0, 3, false), Some(5));
    assert_eq!(engine.state().cursor(), 5);

    // First-Fit would return 0 here.
    assert_eq!(engine.scan_and_flip(&b, 0, 2, false), Some(8));
    // Nothing left past the cursor: wrap to the front.
    assert_eq!(engine.scan_and_flip(&b, 0, 2, false), Some(0));
    assert_eq!(engine.state().cursor(), 0);
    assert_eq!(engine.scan_and_flip(&b, 0, 1, false), None);
    assert!(b.all(0, 10));
}

#[test]
fn best_fit_prefers_the_tightest_run() {
    // free [0, 6), used [6, 10), free [10, 13), used [13, 16)
    let b = Bitmap::new(16).unwrap();
    b.set_multiple(6, 4, true);
    b.set_multiple(13, 3, true);

    let mut engine = ScanEngine::with_policy(Policy::BestFit);
    assert_eq!(engine.scan_and_flip(&b, 0, 3, false), Some(10));
    assert_eq!(engine.scan_and_flip(&b, 0, 3, false), Some(0));
    assert_eq!(engine.scan_and_flip(&b, 0, 3, false), Some(3));
    assert_eq!(engine.scan(&b, 0, 1, false), None);
}

#[test]
fn buddy_probes_power_of_two_blocks() {
    let b = Bitmap::new(1024).unwrap();
    let mut engine = ScanEngine::with_policy(Policy::Buddy);

    assert_eq!(engine.scan_and_flip(&b, 0, 16, false), Some(0));
    assert_eq!(engine.scan_and_flip(&b, 0, 16, false), Some(16));
    assert_eq!(engine.scan_and_flip(&b, 0, 32, false), Some(32));
    assert_eq!(engine.state().cumulative_request_size(), 64);

    // Past bootstrap: probing starts at 64, which is free.
    assert_eq!(engine.scan_and_flip(&b, 0, 5, false), Some(64));
    assert_eq!(engine.scan(&b, 0, 513, false), None);
}

#[test]
fn degenerate_counts() {
    let b = Bitmap::new(12).unwrap();
    for policy in Policy::ALL {
        let mut engine = ScanEngine::with_policy(policy);
        assert_eq!(engine.scan(&b, 0, 0, false), Some(0), "{policy}");
        assert_eq!(engine.scan(&b, 0, 13, false), None, "{policy}");
        assert_eq!(
            engine.scan(&b, 0, 13, false).unwrap_or(NOT_FOUND),
            NOT_FOUND,
            "{policy}"
        );
    }
}

#[test]
fn engine_state_is_shared_across_bitmaps() {
    let small = Bitmap::new(8).unwrap();
    let large = Bitmap::new(64).unwrap();
    let mut engine = ScanEngine::with_policy(Policy::NextFit);

    large.set_multiple(0, 40, true);
    assert_eq!(engine.scan(&large, 0, 4, false), Some(40));
    // The cursor from the large bitmap is past the end of the small one.
    assert_eq!(engine.scan(&small, 0, 4, false), Some(0));
    assert_eq!(engine.state().cursor(), 0);
}

#[test]
fn saved_bitmap_loads_back() {
    let src = Bitmap::new(77).unwrap();
    let mut engine = ScanEngine::with_policy(Policy::FirstFit);
    for size in [3, 9, 1, 20] {
        engine.scan_and_flip(&src, 0, size, false).unwrap();
    }

    let mut file = Vec::new();
    src.write_to(&mut file).unwrap();

    let dst = Bitmap::new(77).unwrap();
    dst.read_from(&mut file).unwrap();
    for idx in 0..77 {
        assert_eq!(src.test(idx), dst.test(idx), "bit {idx}");
    }
    assert_eq!(dst.count(0, 77, true), 33);
}

#[repr(align(16))]
struct Region([u8; 128]);

#[test]
fn view_in_reserved_region() {
    let bits = 200;
    assert!(buf_size(bits) <= 128);

    let mut region = Region([0xAA; 128]);
    {
        let view = BitmapView::in_buffer(bits, &mut region.0);
        assert!(view.none(0, bits));
        let mut engine = ScanEngine::with_policy(Policy::FirstFit);
        assert_eq!(engine.scan_and_flip(&view, 0, 50, false), Some(0));
        assert_eq!(engine.scan_and_flip(&view, 0, 50, false), Some(50));
    }

    let view = BitmapView::from_buffer(&mut region.0);
    assert_eq!(view.bit_cnt(), bits);
    assert!(view.all(0, 100));
    assert!(view.none(100, 100));
}
