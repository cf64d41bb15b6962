use rand::{Rng, SeedableRng, rngs::StdRng};
use shadow_image::processing::layout::{
    ContentMode, Point, Rect, SHADOW_CANVAS_SCALE, Size, real_image_size, resolve,
};

fn rect_close(a: Rect, b: (f32, f32, f32, f32), eps: f32) {
    assert!((a.origin.x - b.0).abs() <= eps, "x mismatch: {:?} vs {:?}", a, b);
    assert!((a.origin.y - b.1).abs() <= eps, "y mismatch: {:?} vs {:?}", a, b);
    assert!((a.size.width - b.2).abs() <= eps, "w mismatch: {:?} vs {:?}", a, b);
    assert!((a.size.height - b.3).abs() <= eps, "h mismatch: {:?} vs {:?}", a, b);
}

#[test]
fn wide_image_in_square_bounds() {
    // scale = min(100/200, 100/50) = 0.5 -> 100x25
    let g = resolve(
        Size::new(100.0, 100.0),
        ContentMode::AspectFit,
        Size::new(200.0, 50.0),
        0.0,
        0.0,
        0.0,
    );
    rect_close(g.foreground, (0.0, 37.5, 100.0, 25.0), 1e-4);
    // 1.4x -> 140x35, centered
    rect_close(g.background, (-20.0, 32.5, 140.0, 35.0), 1e-4);
}

#[test]
fn aspect_fit_preserves_ratio_and_touches_limiting_axis() {
    let mut rng = StdRng::seed_from_u64(0x5AD0);
    for _ in 0..500 {
        let bounds = Size::new(rng.random_range(1.0..2000.0), rng.random_range(1.0..2000.0));
        let src = Size::new(rng.random_range(1.0..4000.0), rng.random_range(1.0..4000.0));
        let fg = real_image_size(bounds, ContentMode::AspectFit, src);

        let ratio_in = src.width / src.height;
        let ratio_out = fg.width / fg.height;
        assert!(
            (ratio_in - ratio_out).abs() <= ratio_in * 1e-4,
            "{src:?} -> {fg:?}"
        );
        assert!(fg.width <= bounds.width * (1.0 + 1e-5));
        assert!(fg.height <= bounds.height * (1.0 + 1e-5));
        let touches_w = (fg.width - bounds.width).abs() <= bounds.width * 1e-4;
        let touches_h = (fg.height - bounds.height).abs() <= bounds.height * 1e-4;
        assert!(touches_w || touches_h, "{bounds:?} {src:?} -> {fg:?}");
    }
}

#[test]
fn background_follows_scale_formula() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let percent: f32 = rng.random_range(-50.0..200.0);
        let bounds = Size::new(320.0, 240.0);
        let src = Size::new(rng.random_range(1.0..900.0), rng.random_range(1.0..900.0));
        let g = resolve(bounds, ContentMode::AspectFit, src, percent, 0.0, 0.0);
        let expected = g
            .foreground
            .size
            .scaled(SHADOW_CANVAS_SCALE * (1.0 + percent / 100.0));
        assert_eq!(g.background.size, expected);
    }
}

#[test]
fn zero_percent_is_exactly_one_point_four() {
    let g = resolve(
        Size::new(50.0, 80.0),
        ContentMode::Fill,
        Size::new(33.0, 17.0),
        0.0,
        0.0,
        0.0,
    );
    assert_eq!(g.background.size, g.foreground.size.scaled(1.4));
}

#[test]
fn offsets_translate_background_from_center() {
    let bounds = Size::new(300.0, 200.0);
    let src = Size::new(120.0, 90.0);
    let centered = resolve(bounds, ContentMode::AspectFit, src, 10.0, 0.0, 0.0);
    let center = centered.background.center();
    assert!((center.x - 150.0).abs() < 1e-3);
    assert!((center.y - 100.0).abs() < 1e-3);

    let shifted = resolve(bounds, ContentMode::AspectFit, src, 10.0, 12.0, -7.5);
    assert_eq!(
        shifted.background.origin,
        Point::new(
            centered.background.origin.x + 12.0,
            centered.background.origin.y - 7.5
        )
    );
    assert_eq!(shifted.background.size, centered.background.size);
    assert_eq!(shifted.foreground, centered.foreground);
}

#[test]
fn resolve_is_idempotent() {
    let args = (
        Size::new(123.4, 567.8),
        ContentMode::AspectFit,
        Size::new(91.0, 37.0),
        12.5,
        -3.0,
        4.25,
    );
    let a = resolve(args.0, args.1, args.2, args.3, args.4, args.5);
    let b = resolve(args.0, args.1, args.2, args.3, args.4, args.5);
    assert_eq!(a, b);
    assert_eq!(a.background.origin.x.to_bits(), b.background.origin.x.to_bits());
}

#[test]
fn fill_centers_natural_size() {
    let g = resolve(
        Size::new(100.0, 100.0),
        ContentMode::Fill,
        Size::new(200.0, 50.0),
        0.0,
        0.0,
        0.0,
    );
    rect_close(g.foreground, (-50.0, 25.0, 200.0, 50.0), 1e-4);
}
