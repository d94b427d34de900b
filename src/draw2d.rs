use glam::DVec2;

use crate::assets::FontAtlas;
use crate::color::Color;
use crate::gpu::GpuContext;
use crate::scene::{DrawSurface, LINE_WIDTH, POINT_RADIUS};

/// Vertex for 2D shape and text rendering.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    fn colored(position: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position,
            uv: [0.0, 0.0],
            color,
        }
    }
}

/// Uniforms for 2D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const INITIAL_VERTICES: usize = 32 * 1024;
const CIRCLE_SEGMENTS: usize = 16;

/// Convert a y-up screen point to window pixels (origin top-left, y down).
pub fn to_pixels(point: DVec2, height: f32) -> [f32; 2] {
    [point.x as f32, height - point.y as f32]
}

fn push_triangle(out: &mut Vec<Vertex2d>, a: [f32; 2], b: [f32; 2], c: [f32; 2], color: [f32; 4]) {
    out.extend_from_slice(&[
        Vertex2d::colored(a, color),
        Vertex2d::colored(b, color),
        Vertex2d::colored(c, color),
    ]);
}

/// Filled disc as a triangle fan around `center`.
pub fn circle_vertices(out: &mut Vec<Vertex2d>, center: [f32; 2], radius: f32, color: Color) {
    let c = color.to_array();
    let rim = |i: usize| {
        let angle = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
        [
            center[0] + radius * angle.cos(),
            center[1] + radius * angle.sin(),
        ]
    };
    for i in 0..CIRCLE_SEGMENTS {
        push_triangle(out, center, rim(i), rim(i + 1), c);
    }
}

/// A segment of the given width as two triangles. Zero-length segments draw
/// nothing.
pub fn line_vertices(out: &mut Vec<Vertex2d>, from: [f32; 2], to: [f32; 2], width: f32, color: Color) {
    let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON {
        return;
    }
    let half = width * 0.5;
    let (nx, ny) = (-dy / len * half, dx / len * half);

    let c = color.to_array();
    let a = [from[0] + nx, from[1] + ny];
    let b = [to[0] + nx, to[1] + ny];
    let d = [from[0] - nx, from[1] - ny];
    let e = [to[0] - nx, to[1] - ny];
    push_triangle(out, a, b, d, c);
    push_triangle(out, b, e, d, c);
}

/// Filled convex polygon as a triangle fan from the first point.
pub fn polygon_vertices(out: &mut Vec<Vertex2d>, points: &[[f32; 2]], color: Color) {
    let Some((&first, rest)) = points.split_first() else {
        return;
    };
    let c = color.to_array();
    for pair in rest.windows(2) {
        push_triangle(out, first, pair[0], pair[1], c);
    }
}

/// Batched 2D drawing for the projected scene, the crosshair and the HUD.
///
/// Shapes are kept in submission order, so the painter's order of the scene
/// survives into the GPU draw. Text is drawn after all shapes.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,

    font: Option<(FontAtlas, wgpu::BindGroup)>,

    colored_vertices: Vec<Vertex2d>,
    text_vertices: Vec<Vertex2d>,
    height: f32,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw2d.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // group 0
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // group 1, font atlas only
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let colored_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Draw2d Colored Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let textured_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Draw2d Textured Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        let colored_pipeline = create_pipeline(
            gpu,
            &shader,
            &colored_pipeline_layout,
            "fs_colored",
            "Draw2d Colored Pipeline",
        );
        let textured_pipeline = create_pipeline(
            gpu,
            &shader,
            &textured_pipeline_layout,
            "fs_textured",
            "Draw2d Textured Pipeline",
        );

        Self {
            colored_pipeline,
            textured_pipeline,
            vertex_buffer: create_vertex_buffer(device, INITIAL_VERTICES),
            vertex_capacity: INITIAL_VERTICES,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            font: None,
            colored_vertices: Vec::with_capacity(INITIAL_VERTICES),
            text_vertices: Vec::new(),
            height: gpu.height() as f32,
        }
    }

    /// Use `atlas` for [`Draw2d::text`].
    pub fn set_font(&mut self, gpu: &GpuContext, atlas: FontAtlas) {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("HUD Font Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
        });
        self.font = Some((atlas, bind_group));
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Clear all batches for a new frame of the given pixel height.
    pub fn begin_frame(&mut self, height: u32) {
        self.colored_vertices.clear();
        self.text_vertices.clear();
        self.height = height as f32;
    }

    /// Filled circle at a window-pixel position.
    pub fn circle(&mut self, center: [f32; 2], radius: f32, color: Color) {
        circle_vertices(&mut self.colored_vertices, center, radius, color);
    }

    /// Draw text with its top-left corner at a window-pixel position. Lines are
    /// separated by `\n`. Does nothing without a font.
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: Color) {
        let Some((font, _)) = &self.font else {
            return;
        };

        let c = color.to_array();
        let mut baseline_y = y + font.size();

        for line in text.lines() {
            let mut cursor_x = x;
            for ch in line.chars() {
                let Some(glyph) = font.glyph(ch) else {
                    cursor_x += font.size() * 0.5;
                    continue;
                };

                if glyph.width > 0 && glyph.height > 0 {
                    let gx = cursor_x + glyph.offset_x;
                    // fontdue's ymin is the bottom edge relative to the baseline.
                    let gy = baseline_y - glyph.offset_y - glyph.height as f32;
                    let gw = glyph.width as f32;
                    let gh = glyph.height as f32;

                    let [u0, v0, du, dv] = glyph.uv;
                    let (u1, v1) = (u0 + du, v0 + dv);
                    let vertex = |position, uv| Vertex2d {
                        position,
                        uv,
                        color: c,
                    };

                    self.text_vertices.extend_from_slice(&[
                        vertex([gx, gy], [u0, v0]),
                        vertex([gx + gw, gy], [u1, v0]),
                        vertex([gx, gy + gh], [u0, v1]),
                        vertex([gx + gw, gy], [u1, v0]),
                        vertex([gx + gw, gy + gh], [u1, v1]),
                        vertex([gx, gy + gh], [u0, v1]),
                    ]);
                }

                cursor_x += glyph.advance;
            }
            baseline_y += font.line_height();
        }
    }

    /// Number of shape vertices queued this frame.
    pub fn vertex_count(&self) -> usize {
        self.colored_vertices.len()
    }

    /// Upload this frame's uniforms and vertices, growing the buffer if needed.
    pub fn prepare(&mut self, gpu: &GpuContext) {
        let uniforms = Draw2dUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let total = self.colored_vertices.len() + self.text_vertices.len();
        if total > self.vertex_capacity {
            self.vertex_capacity = total.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&gpu.device, self.vertex_capacity);
            log::debug!("grew 2D vertex buffer to {} vertices", self.vertex_capacity);
        }

        if !self.colored_vertices.is_empty() {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.colored_vertices),
            );
        }
        if !self.text_vertices.is_empty() {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (self.colored_vertices.len() * std::mem::size_of::<Vertex2d>()) as u64,
                bytemuck::cast_slice(&self.text_vertices),
            );
        }
    }

    /// Record draws for everything uploaded by [`Draw2d::prepare`].
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let shapes = self.colored_vertices.len() as u32;
        let text = self.text_vertices.len() as u32;

        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        if shapes > 0 {
            render_pass.set_pipeline(&self.colored_pipeline);
            render_pass.draw(0..shapes, 0..1);
        }

        if let Some((_, bind_group)) = &self.font
            && text > 0
        {
            render_pass.set_pipeline(&self.textured_pipeline);
            render_pass.set_bind_group(1, bind_group, &[]);
            render_pass.draw(shapes..shapes + text, 0..1);
        }
    }
}

impl DrawSurface for Draw2d {
    fn point(&mut self, at: DVec2, color: Color) {
        let center = to_pixels(at, self.height);
        circle_vertices(&mut self.colored_vertices, center, POINT_RADIUS, color);
    }

    fn line(&mut self, from: DVec2, to: DVec2, color: Color) {
        let (a, b) = (to_pixels(from, self.height), to_pixels(to, self.height));
        line_vertices(&mut self.colored_vertices, a, b, LINE_WIDTH, color);
    }

    fn polygon(&mut self, points: &[DVec2], color: Color) {
        let pixels: Vec<[f32; 2]> = points.iter().map(|&p| to_pixels(p, self.height)).collect();
        polygon_vertices(&mut self.colored_vertices, &pixels, color);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertices: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw2d Vertex Buffer"),
        size: (vertices * std::mem::size_of::<Vertex2d>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    gpu: &GpuContext,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    label: &str,
) -> wgpu::RenderPipeline {
    let blend_state = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    };

    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers: &[Vertex2d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5
    }

    #[test]
    fn pixels_flip_y() {
        assert_eq!(to_pixels(DVec2::new(10.0, 0.0), 600.0), [10.0, 600.0]);
        assert_eq!(to_pixels(DVec2::new(450.0, 300.0), 600.0), [450.0, 300.0]);
        assert_eq!(to_pixels(DVec2::new(0.0, 590.0), 600.0), [0.0, 10.0]);
    }

    #[test]
    fn quad_becomes_two_triangles() {
        let mut out = Vec::new();
        let square = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        polygon_vertices(&mut out, &square, Color::RED);

        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|v| v.color == Color::RED.to_array()));
        assert_eq!(out[0].position, [0.0, 0.0]);
        assert_eq!(out[3].position, [0.0, 0.0]);
        assert_eq!(out[5].position, [0.0, 4.0]);
    }

    #[test]
    fn degenerate_polygons_draw_nothing() {
        let mut out = Vec::new();
        polygon_vertices(&mut out, &[], Color::RED);
        polygon_vertices(&mut out, &[[1.0, 1.0], [2.0, 2.0]], Color::RED);
        assert!(out.is_empty());
    }

    #[test]
    fn line_quad_has_the_requested_width() {
        let mut out = Vec::new();
        line_vertices(&mut out, [0.0, 0.0], [10.0, 0.0], 2.0, Color::WHITE);

        assert_eq!(out.len(), 6);
        for v in &out {
            assert!((v.position[1].abs() - 1.0).abs() < 1e-6);
            assert!(v.position[0] == 0.0 || v.position[0] == 10.0);
        }
    }

    #[test]
    fn zero_length_line_is_skipped() {
        let mut out = Vec::new();
        line_vertices(&mut out, [3.0, 3.0], [3.0, 3.0], 2.0, Color::WHITE);
        assert!(out.is_empty());
    }

    #[test]
    fn circle_stays_within_radius() {
        let mut out = Vec::new();
        circle_vertices(&mut out, [100.0, 50.0], 2.0, Color::WHITE);

        assert_eq!(out.len(), CIRCLE_SEGMENTS * 3);
        for tri in out.chunks(3) {
            assert_eq!(tri[0].position, [100.0, 50.0]);
            for v in &tri[1..] {
                let (dx, dy) = (v.position[0] - 100.0, v.position[1] - 50.0);
                assert!(((dx * dx + dy * dy).sqrt() - 2.0).abs() < 1e-4);
            }
        }
        // The fan closes on its starting point.
        let last = out[out.len() - 1].position;
        assert!(close(last, out[1].position));
    }
}
