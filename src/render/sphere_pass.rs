// src/render/sphere_pass.rs
// Shell compositor: opaque base, alpha-blended outer shells, MAX-blended
// prominence band
// All geometry and textures are uploaded at load time; a frame is bind,
// draw, done. Depth writes stay off for the translucent shells so outer
// layers never fight the base shell's depth.
// RELEVANT FILES: src/shell/mod.rs, src/shell/geometry.rs, src/shaders/shell.wgsl

use bytemuck::{Pod, Zeroable};
use log::warn;
use wgpu::util::DeviceExt;

use crate::error::RenderResult;
use crate::render::target::{OffscreenTarget, COLOR_FORMAT, DEPTH_FORMAT};
use crate::render::upload::Texture2d;
use crate::shell::{
    build_hemisphere, build_prominence_band, shell_radius, ShellGeometry, ShellTextureSet,
    ViewState, SPHERE_DIVISIONS,
};

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Uniforms {
    mvp: [f32; 16],
}

struct GpuMesh {
    vbuf: wgpu::Buffer,
    ibuf: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn from_geometry(device: &wgpu::Device, geometry: &ShellGeometry, label: &str) -> Self {
        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vbuf,
            ibuf,
            index_count: geometry.indices.len() as u32,
        }
    }

    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vbuf.slice(..));
        pass.set_index_buffer(self.ibuf.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

struct GpuShell {
    _texture: Texture2d,
    bind_group: wgpu::BindGroup,
    hemisphere: GpuMesh,
    /// Prominence band sized to this shell's limb; present only where the
    /// annulus fits inside the source frame.
    band: Option<GpuMesh>,
    pixel_shift: f32,
}

/// Retained-mode compositor for one shell scene.
pub struct SphereRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    blend_pipeline: wgpu::RenderPipeline,
    max_pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    ubo: wgpu::Buffer,
    shells: Vec<GpuShell>,
    prominence_bind_group: Option<wgpu::BindGroup>,
    _prominence_texture: Option<Texture2d>,
    loaded_exaggeration: f32,
}

impl SphereRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shell.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/shell.wgsl").into()),
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shell-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shell-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        // Base shell: no blending, depth writes on.
        let opaque_pipeline = make_pipeline(
            device,
            &shader,
            &pipeline_layout,
            "shell-opaque",
            None,
            true,
        );
        // Outer shells: standard alpha blending, depth writes off so they
        // composite over the base without fighting each other.
        let blend_pipeline = make_pipeline(
            device,
            &shader,
            &pipeline_layout,
            "shell-blend",
            Some(wgpu::BlendState::ALPHA_BLENDING),
            false,
        );
        // Prominence band: MAX blending, so its brightness only shows where
        // it exceeds what the shells already drew.
        let max_pipeline = make_pipeline(
            device,
            &shader,
            &pipeline_layout,
            "shell-max",
            Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Max,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Max,
                },
            }),
            true,
        );

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shell-ubo"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            opaque_pipeline,
            blend_pipeline,
            max_pipeline,
            bind_layout,
            ubo,
            shells: Vec::new(),
            prominence_bind_group: None,
            _prominence_texture: None,
            loaded_exaggeration: f32::NAN,
        }
    }

    /// Whether `load` must run before rendering with this exaggeration.
    pub fn needs_load(&self, radial_exaggeration: f32) -> bool {
        self.shells.is_empty() || self.loaded_exaggeration != radial_exaggeration
    }

    /// Upload textures and build retained geometry for every shell.
    ///
    /// Geometry depends on the exaggeration factor, so a changed factor
    /// reloads everything; texture content does not and is reuploaded as-is.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        textures: &ShellTextureSet,
        radial_exaggeration: f32,
    ) -> RenderResult<()> {
        self.shells.clear();
        self.prominence_bind_group = None;
        self._prominence_texture = None;

        for shell in &textures.shells {
            let radius = shell_radius(shell.normalized_radius, radial_exaggeration);
            let hemisphere = build_hemisphere(radius, shell.uv_frame, SPHERE_DIVISIONS);
            let band_geometry = build_prominence_band(radius, shell.uv_frame);

            let texture = Texture2d::from_rgba8(
                device,
                queue,
                &shell.pixels,
                shell.width,
                shell.height,
                "shell-texture",
            )?;
            let bind_group = self.make_bind_group(device, &texture, "shell-bind-group");

            self.shells.push(GpuShell {
                bind_group,
                hemisphere: GpuMesh::from_geometry(device, &hemisphere, "shell-hemisphere"),
                band: (!band_geometry.is_empty())
                    .then(|| GpuMesh::from_geometry(device, &band_geometry, "shell-band")),
                pixel_shift: shell.pixel_shift,
                _texture: texture,
            });
        }

        if let Some(prominence) = &textures.prominence {
            let texture = Texture2d::from_rgba8(
                device,
                queue,
                &prominence.pixels,
                prominence.width,
                prominence.height,
                "prominence-texture",
            )?;
            self.prominence_bind_group =
                Some(self.make_bind_group(device, &texture, "prominence-bind-group"));
            self._prominence_texture = Some(texture);
        }

        self.loaded_exaggeration = radial_exaggeration;
        Ok(())
    }

    fn make_bind_group(
        &self,
        device: &wgpu::Device,
        texture: &Texture2d,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Record one composited frame into `encoder`.
    ///
    /// Order: innermost visible shell opaque, remaining visible shells
    /// back-to-front with alpha blending, then the prominence band of the
    /// outermost visible shell with MAX blending.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &OffscreenTarget,
        view: &ViewState,
    ) {
        if self.shells.is_empty() {
            warn!("render() called before shell textures were loaded");
        }

        let mvp = view.camera.view_projection(target.aspect());
        queue.write_buffer(
            &self.ubo,
            0,
            bytemuck::cast_slice(&[Uniforms {
                mvp: mvp.to_cols_array(),
            }]),
        );

        // Shells were uploaded in ascending radius order.
        let visible: Vec<&GpuShell> = self
            .shells
            .iter()
            .filter(|s| view.visibility.is_visible(s.pixel_shift))
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shell-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        let Some((innermost, outer)) = visible.split_first() else {
            return;
        };

        pass.set_pipeline(&self.opaque_pipeline);
        pass.set_bind_group(0, &innermost.bind_group, &[]);
        innermost.hemisphere.draw(&mut pass);

        if !outer.is_empty() {
            pass.set_pipeline(&self.blend_pipeline);
            for shell in outer {
                pass.set_bind_group(0, &shell.bind_group, &[]);
                shell.hemisphere.draw(&mut pass);
            }
        }

        if view.show_prominences {
            let outermost = visible.last().unwrap();
            if let (Some(bind_group), Some(band)) =
                (&self.prominence_bind_group, &outermost.band)
            {
                pass.set_pipeline(&self.max_pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                band.draw(&mut pass);
            }
        }
    }
}

fn make_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    label: &str,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (4 * 3 + 4 * 2) as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            front_face: wgpu::FrontFace::Ccw,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
