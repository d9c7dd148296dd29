// tests/test_offscreen_render.rs
// GPU end-to-end: offscreen compositing and readback
// Needs a real adapter; run with `cargo test -- --ignored` on a machine
// with a GPU (or a software Vulkan driver).
//
// RELEVANT FILES: src/render/sphere_pass.rs, src/render/surface_pass.rs,
// src/render/target.rs

use helioviz::gpu;
use helioviz::render::{OffscreenTarget, SphereRenderer, SurfaceRenderer};
use helioviz::{
    CameraState, DiskEllipse, IntensityScale, ScalarField2D, ShellDescriptor, ShellScene,
    SurfaceMeshBuilder, SurfaceParams, ViewState,
};

fn disk_shell(radius: f32, shift: f32) -> ShellDescriptor {
    let size = 64usize;
    let mut values = vec![0.0f32; size * size];
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - 32.0;
            let dy = y as f32 - 32.0;
            values[y * size + x] = if (dx * dx + dy * dy).sqrt() < 24.0 { 0.8 } else { 0.1 };
        }
    }
    ShellDescriptor {
        field: ScalarField2D::new(values, size, size).unwrap(),
        enhanced: None,
        ellipse: Some(DiskEllipse::new(32.0, 32.0, 24.0, 24.0)),
        normalized_radius: radius,
        pixel_shift: shift,
    }
}

#[test]
#[ignore] // Enable on GPU-equipped runners
fn composites_two_shells_offscreen() {
    let ctx = gpu::ctx();
    let mut scene = ShellScene::new(vec![disk_shell(0.2, 0.0), disk_shell(0.8, 1.5)]).unwrap();
    let textures = scene
        .load_textures(Some(gpu::max_texture_size(&ctx.device)))
        .unwrap();

    let mut renderer = SphereRenderer::new(&ctx.device);
    let mut view = ViewState::new(CameraState::tomography());
    view.show_prominences = true;
    renderer
        .load(&ctx.device, &ctx.queue, textures, view.radial_exaggeration)
        .unwrap();

    let target = OffscreenTarget::new(&ctx.device, 320, 240);
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    renderer.render(&ctx.queue, &mut encoder, &target, &view);
    ctx.queue.submit(Some(encoder.finish()));

    let pixels = target.read_rgba(&ctx.device, &ctx.queue).unwrap();
    assert_eq!(pixels.len(), 320 * 240 * 4);
    assert!(
        pixels.chunks_exact(4).any(|px| px[0] > 0 || px[1] > 0 || px[2] > 0),
        "frame is entirely black"
    );
}

#[test]
#[ignore] // Enable on GPU-equipped runners
fn renders_surface_solid_offscreen() {
    let ctx = gpu::ctx();
    let field = ScalarField2D::new((0..256).map(|i| (i % 17) as f32).collect(), 16, 16).unwrap();
    let mut builder = SurfaceMeshBuilder::new();
    let mesh = builder.build(
        &field,
        &SurfaceParams {
            mesh_x_count: 16,
            mesh_z_count: 16,
            scale: IntensityScale::Log2,
            preserve_aspect_ratio: false,
        },
    );

    let mut renderer = SurfaceRenderer::new(&ctx.device, &ctx.queue).unwrap();
    renderer.upload_mesh(&ctx.device, &ctx.queue, mesh);

    let target = OffscreenTarget::new(&ctx.device, 320, 240);
    let camera = CameraState::surface_viewer();
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    renderer.render(&ctx.queue, &mut encoder, &target, &camera, builder.footprint());
    ctx.queue.submit(Some(encoder.finish()));

    let pixels = target.read_rgba(&ctx.device, &ctx.queue).unwrap();
    assert_eq!(pixels.len(), 320 * 240 * 4);
}
