// tests/test_shell_textures.rs
// Shell texture synthesis: the alpha policy, layer ordering, visibility
// and the prominence texture
//
// RELEVANT FILES: src/shell/mod.rs, src/shell/texture.rs

use helioviz::shell::{ShellVisibility, ShellTextureSet};
use helioviz::{DiskEllipse, ScalarField2D, ShellColorMap, ShellDescriptor, ShellScene};

fn shell(values: Vec<f32>, w: usize, h: usize, radius: f32, shift: f32) -> ShellDescriptor {
    ShellDescriptor {
        field: ScalarField2D::new(values, w, h).unwrap(),
        enhanced: None,
        ellipse: Some(DiskEllipse::covering(w as u32, h as u32)),
        normalized_radius: radius,
        pixel_shift: shift,
    }
}

fn alphas(set: &ShellTextureSet, index: usize) -> Vec<u8> {
    set.shells[index].pixels.chunks_exact(4).map(|px| px[3]).collect()
}

#[test]
fn base_shell_is_fully_opaque() {
    let mut scene = ShellScene::new(vec![
        shell(vec![0.0, 0.25, 0.75, 1.0], 2, 2, 0.2, 0.0),
        shell(vec![0.0, 0.25, 0.75, 1.0], 2, 2, 0.8, 1.5),
    ])
    .unwrap();
    let set = scene.load_textures(None).unwrap();

    assert!(set.shells[0].is_base);
    assert!(alphas(set, 0).iter().all(|&a| a == 255));
}

#[test]
fn bright_samples_of_outer_shells_are_transparent_in_mono() {
    let mut scene = ShellScene::new(vec![
        shell(vec![0.0, 1.0, 0.5, 0.25], 2, 2, 0.2, 0.0),
        shell(vec![0.0, 1.0, 0.5, 0.25], 2, 2, 0.8, 1.5),
    ])
    .unwrap();
    let set = scene.load_textures(None).unwrap();

    let outer = alphas(set, 1);
    // Per-layer normalization maps the 1.0 sample to full brightness.
    assert_eq!(outer[1], 0, "fully bright sample must be transparent");
    assert_eq!(outer[0], 255, "fully dark sample must be opaque");
}

#[test]
fn colorized_alpha_uses_position_dependent_threshold() {
    let values = vec![0.0, 0.25, 0.5, 1.0];
    let mut scene = ShellScene::new(vec![
        shell(values.clone(), 2, 2, 0.2, 0.0),
        shell(values.clone(), 2, 2, 0.5, 1.0),
        shell(values, 2, 2, 0.8, 2.0),
    ])
    .unwrap();
    scene.set_color_map(ShellColorMap::RedToBlue);
    let set = scene.load_textures(None).unwrap();

    // Outermost shell sits at color position 1.0: threshold 0.5.
    let outer = alphas(set, 2);
    assert_eq!(outer[2], 0, "at-threshold sample is transparent");
    assert_eq!(outer[1], 127, "darkness scales alpha below the threshold");
    assert_eq!(outer[0], 255);

    // Middle shell at position 0.5: threshold 0.7, so 0.5 stays visible.
    let middle = alphas(set, 1);
    assert!(middle[2] > 0, "mid layers keep more features visible");
}

#[test]
fn degenerate_layer_range_renders_mid_gray() {
    let mut scene = ShellScene::new(vec![
        shell(vec![3.0; 4], 2, 2, 0.2, 0.0),
        shell(vec![7.0; 4], 2, 2, 0.8, 1.5),
    ])
    .unwrap();
    let set = scene.load_textures(None).unwrap();
    let px = &set.shells[0].pixels;
    assert_eq!(px[0], 127);
    assert_eq!(px[1], 127);
    assert_eq!(px[2], 127);
}

#[test]
fn prominence_texture_comes_from_outermost_shell() {
    let mut scene = ShellScene::new(vec![
        shell(vec![0.0, 0.0, 0.0, 0.0], 2, 2, 0.2, 0.0),
        shell(vec![0.0, 1.0, 0.5, 0.25], 2, 2, 0.8, 1.5),
    ])
    .unwrap();
    let set = scene.load_textures(None).unwrap();

    let prominence = set.prominence.as_ref().expect("prominence texture missing");
    // Grayscale of the outermost layer, always opaque.
    assert_eq!(&prominence.pixels[4..8], &[255, 255, 255, 255]);
    assert_eq!(prominence.pixels[3], 255);
    assert_eq!(prominence.pixels[0], 0);
}

#[test]
fn rendering_order_and_visibility_toggling() {
    // Shells at radii 0.2 and 0.8: the first renders opaque, and hiding
    // the outer one removes it from the visible list without touching the
    // descriptor collection.
    let mut scene = ShellScene::new(vec![
        shell(vec![0.0, 1.0, 0.5, 0.25], 2, 2, 0.8, 1.5),
        shell(vec![0.0, 1.0, 0.5, 0.25], 2, 2, 0.2, 0.0),
    ])
    .unwrap();
    scene.load_textures(None).unwrap();

    let mut visibility = ShellVisibility::new();
    let visible = scene.visible_shells(&visibility);
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[0].normalized_radius, 0.2);
    assert!(visible[0].is_base, "innermost shell renders opaque");
    assert!(!visible[1].is_base, "outer shell renders blended");

    visibility.set_visible(1.5, false);
    let visible = scene.visible_shells(&visibility);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].normalized_radius, 0.2);
    assert_eq!(scene.shell_count(), 2, "descriptors must not be mutated");
}

#[test]
fn downsampling_applies_uniformly_when_over_device_limit() {
    let size = 8usize;
    let values: Vec<f32> = (0..size * size).map(|i| i as f32).collect();
    let mut scene = ShellScene::new(vec![
        shell(values.clone(), size, size, 0.2, 0.0),
        shell(values, size, size, 0.8, 1.5),
    ])
    .unwrap();
    let set = scene.load_textures(Some(4)).unwrap();
    for texture in &set.shells {
        assert_eq!((texture.width, texture.height), (4, 4));
    }
    let prominence = set.prominence.as_ref().unwrap();
    assert_eq!((prominence.width, prominence.height), (4, 4));
}

#[test]
fn mismatched_shell_dimensions_are_fatal() {
    let mut scene = ShellScene::new(vec![
        shell(vec![0.0; 4], 2, 2, 0.2, 0.0),
        shell(vec![0.0; 9], 3, 3, 0.8, 1.5),
    ])
    .unwrap();
    assert!(scene.load_textures(None).is_err());
}

#[test]
fn contrast_toggle_switches_to_enhanced_data() {
    let mut descriptor = shell(vec![0.0, 1.0, 0.5, 0.25], 2, 2, 0.2, 0.0);
    descriptor.enhanced = Some(ScalarField2D::new(vec![1.0, 1.0, 1.0, 0.0], 2, 2).unwrap());
    let mut scene = ShellScene::new(vec![descriptor]).unwrap();

    let raw_first_gray = scene.load_textures(None).unwrap().shells[0].pixels[0];
    assert_eq!(raw_first_gray, 0);

    scene.set_contrast_enhanced(true);
    assert!(scene.needs_reload());
    assert!(scene.reload_if_needed(None).unwrap());
    let enhanced_first_gray = scene.textures().unwrap().shells[0].pixels[0];
    assert_eq!(enhanced_first_gray, 255);
}
