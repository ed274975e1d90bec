//! wgpu implementation of [`GraphicsBackend`].
//!
//! wgpu has no global bind state, so this backend keeps the "currently bound"
//! objects itself and turns every draw into one render pass:
//! - pipelines are built lazily per (program, layout, topology, target format)
//! - every draw is submitted immediately, so a later `write_buffer` to the same
//!   vertex buffer cannot race an earlier batch
//! - passes load the existing target contents; only `clear` overwrites them
//! - `read_pixel` copies one texel to a staging buffer and waits on the device
//!
//! The default target is the window surface view attached for the current
//! frame (`attach_surface` / `detach_surface`).

mod convert;
mod resources;

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::error::GfxError;
use crate::paint::PackedColor;

use super::backend::GraphicsBackend;
use super::layout::VertexLayout;
use super::types::{
    self, AttachmentClear, IndexData, IndexType, ShaderSource, TargetDesc, TextureDesc,
    TextureFormat, Topology,
};

pub use resources::{
    WgpuBuffer, WgpuIndexBuffer, WgpuProgram, WgpuTarget, WgpuTexture, WgpuVertexArray,
};

/// wgpu copy offsets and sizes must be multiples of this.
const COPY_ALIGN: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: u64,
    layout: VertexLayout,
    topology: Topology,
    format: wgpu::TextureFormat,
}

/// Destination of the next pass.
#[derive(Debug, Clone)]
struct PassTarget {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

#[derive(Default)]
struct Bindings {
    vertex_array: Option<WgpuVertexArray>,
    program: Option<WgpuProgram>,
    texture: Option<WgpuTexture>,
    target: Option<PassTarget>,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    sampled_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    next_program_id: u64,

    /// Bound to slot 0 when nothing else is.
    white: WgpuTexture,

    surface: Option<PassTarget>,
    bound: Bindings,

    warned_no_target: bool,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, GfxError> {
        let sampled_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pixbatch sampled texture bgl"),
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

        let white = WgpuTexture::create(
            &device,
            &sampled_layout,
            &TextureDesc::rgba8("pixbatch white", 1, 1),
            false,
        )?;
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &white.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0xFF; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        Ok(Self {
            device,
            queue,
            sampled_layout,
            pipelines: HashMap::new(),
            next_program_id: 0,
            white,
            surface: None,
            bound: Bindings::default(),
            warned_no_target: false,
        })
    }

    /// Makes `view` the default target until [`detach_surface`](Self::detach_surface).
    pub fn attach_surface(
        &mut self,
        view: wgpu::TextureView,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) {
        self.surface = Some(PassTarget {
            view,
            format,
            width,
            height,
        });
    }

    /// Drops the surface view so the swapchain texture can be presented.
    pub fn detach_surface(&mut self) {
        self.surface = None;
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Number of cached render pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn pass_target(&mut self) -> Option<PassTarget> {
        let target = self.bound.target.clone().or_else(|| self.surface.clone());
        debug_assert!(target.is_some(), "no bound target and no attached surface");
        if target.is_none() && !self.warned_no_target {
            log::warn!("draw without a bound target or attached surface; skipped");
            self.warned_no_target = true;
        }
        target
    }

    fn pipeline_for(
        &mut self,
        program: &WgpuProgram,
        vertex_array: &WgpuVertexArray,
        topology: Topology,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let key = PipelineKey {
            program: program.id,
            layout: vertex_array.layout.clone(),
            topology,
            format,
        };
        if let Some(p) = self.pipelines.get(&key) {
            return p.clone();
        }

        log::debug!(
            "building pipeline: program {} {:?} -> {:?}",
            program.id,
            topology,
            format
        );

        let sampled = [&self.sampled_layout];
        let bind_group_layouts: &[&wgpu::BindGroupLayout] =
            if program.samples_texture { &sampled } else { &[] };

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pixbatch pipeline layout"),
                bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("pixbatch pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some(program.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: vertex_array.layout.stride() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &vertex_array.attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some(program.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: convert::is_blendable(format)
                            .then_some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: convert::topology(topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }

    fn submit_pass(&mut self, topology: Topology, count: u32, indexed: bool) {
        if count == 0 {
            return;
        }
        let Some(target) = self.pass_target() else { return };
        debug_assert!(self.bound.vertex_array.is_some(), "draw without a bound vertex array");
        debug_assert!(self.bound.program.is_some(), "draw without a bound program");
        let Some(vertex_array) = self.bound.vertex_array.clone() else {
            log::warn!("draw without a bound vertex array; skipped");
            return;
        };
        let Some(program) = self.bound.program.clone() else {
            log::warn!("draw without a bound program; skipped");
            return;
        };
        let index_buffer = if indexed {
            debug_assert!(
                vertex_array.indices.is_some(),
                "indexed draw on a vertex array without indices"
            );
            let Some(ib) = vertex_array.indices.clone() else {
                log::warn!("indexed draw on a vertex array without indices; skipped");
                return;
            };
            Some(ib)
        } else {
            None
        };

        let pipeline = self.pipeline_for(&program, &vertex_array, topology, target.format);
        let texture = self.bound.texture.as_ref().unwrap_or(&self.white);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pixbatch draw encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pixbatch draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_viewport(0.0, 0.0, target.width as f32, target.height as f32, 0.0, 1.0);
            rpass.set_pipeline(&pipeline);
            if program.samples_texture {
                if let Some(bg) = texture.bind_group.as_ref().or(self.white.bind_group.as_ref()) {
                    rpass.set_bind_group(0, bg, &[]);
                }
            }
            rpass.set_vertex_buffer(0, vertex_array.buffer.slice(..));

            match index_buffer {
                Some(ib) => {
                    rpass.set_index_buffer(ib.buffer.slice(..), ib.format);
                    rpass.draw_indexed(0..count.min(ib.count), 0, 0..1);
                }
                None => rpass.draw(0..count, 0..1),
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl GraphicsBackend for WgpuBackend {
    type Buffer = WgpuBuffer;
    type IndexBuffer = WgpuIndexBuffer;
    type VertexArray = WgpuVertexArray;
    type Program = WgpuProgram;
    type Texture = WgpuTexture;
    type Target = WgpuTarget;

    fn create_vertex_buffer(&mut self, label: &str, capacity: usize) -> WgpuBuffer {
        let size = capacity.max(COPY_ALIGN).next_multiple_of(COPY_ALIGN) as u64;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        WgpuBuffer {
            buffer,
            capacity: size,
        }
    }

    fn create_index_buffer(&mut self, label: &str, indices: IndexData<'_>) -> WgpuIndexBuffer {
        // No 8-bit index format in wgpu; widen to 16 bits.
        let widened: Vec<u16>;
        let (contents, format) = match indices {
            IndexData::U8(d) => {
                widened = d.iter().map(|&i| u16::from(i)).collect();
                (bytemuck::cast_slice(&widened), wgpu::IndexFormat::Uint16)
            }
            IndexData::U16(d) => (bytemuck::cast_slice(d), wgpu::IndexFormat::Uint16),
            IndexData::U32(d) => (bytemuck::cast_slice(d), wgpu::IndexFormat::Uint32),
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::INDEX,
            });
        WgpuIndexBuffer {
            buffer,
            format,
            count: indices.len() as u32,
        }
    }

    fn write_buffer(&mut self, buffer: &WgpuBuffer, offset: usize, bytes: &[u8]) {
        debug_assert_eq!(offset % COPY_ALIGN, 0, "unaligned buffer write offset");
        if bytes.is_empty() {
            return;
        }
        let fits = (offset + bytes.len()) as u64 <= buffer.capacity;
        debug_assert!(
            fits,
            "write of {} bytes at {offset} overflows buffer of {}",
            bytes.len(),
            buffer.capacity
        );
        if !fits {
            log::error!(
                "buffer write of {} bytes at {offset} exceeds capacity {}",
                bytes.len(),
                buffer.capacity
            );
            return;
        }
        if bytes.len() % COPY_ALIGN == 0 {
            self.queue.write_buffer(&buffer.buffer, offset as u64, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(bytes.len().next_multiple_of(COPY_ALIGN), 0);
            self.queue.write_buffer(&buffer.buffer, offset as u64, &padded);
        }
    }

    fn create_vertex_array(
        &mut self,
        buffer: &WgpuBuffer,
        layout: &VertexLayout,
        indices: Option<&WgpuIndexBuffer>,
    ) -> Result<WgpuVertexArray, GfxError> {
        let attributes = convert::vertex_attributes(layout)?;
        Ok(WgpuVertexArray {
            buffer: buffer.buffer.clone(),
            layout: layout.clone(),
            attributes,
            indices: indices.cloned(),
        })
    }

    fn create_program(&mut self, source: &ShaderSource) -> Result<WgpuProgram, GfxError> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.label.as_ref()),
                source: wgpu::ShaderSource::Wgsl(source.source.clone()),
            });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
            .map(|m| match m.location {
                Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
                None => m.message.clone(),
            })
            .collect();
        if !errors.is_empty() {
            return Err(GfxError::ShaderCompile {
                label: source.label.to_string(),
                log: errors.join("\n"),
            });
        }

        self.next_program_id += 1;
        log::debug!("compiled program `{}` ({})", source.label, self.next_program_id);
        Ok(WgpuProgram {
            id: self.next_program_id,
            module,
            vertex_entry: source.vertex_entry,
            fragment_entry: source.fragment_entry,
            samples_texture: source.samples_texture,
        })
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<WgpuTexture, GfxError> {
        WgpuTexture::create(&self.device, &self.sampled_layout, desc, false)
    }

    fn write_texture(&mut self, texture: &WgpuTexture, data: &[u8]) -> Result<(), GfxError> {
        let Some(bpp) = texture.spec.format.upload_texel_size() else {
            return Err(GfxError::TextureNotWritable(texture.spec.format));
        };
        let expected = texture.width as usize * texture.height as usize * bpp;
        if data.len() != expected {
            return Err(GfxError::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.width * bpp as u32),
                rows_per_image: Some(texture.height),
            },
            wgpu::Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<WgpuTarget, GfxError> {
        let color = desc.draw_attachment()?;
        let mut target = WgpuTarget {
            label: desc.label.to_string(),
            specs: desc.attachments.clone(),
            attachments: Vec::new(),
            color: Some(color),
            width: desc.width,
            height: desc.height,
        };
        target.recreate(&self.device, &self.sampled_layout)?;
        log::debug!("created target `{}` {}x{}", desc.label, desc.width, desc.height);
        Ok(target)
    }

    fn resize_target(
        &mut self,
        target: &mut WgpuTarget,
        width: u32,
        height: u32,
    ) -> Result<(), GfxError> {
        if width == 0 || height == 0 {
            return Err(GfxError::InvalidSize {
                what: "render target",
                width,
                height,
            });
        }
        target.width = width;
        target.height = height;
        target.recreate(&self.device, &self.sampled_layout)
    }

    fn target_size(&self, target: &WgpuTarget) -> (u32, u32) {
        target.size()
    }

    fn target_texture(&self, target: &WgpuTarget) -> Option<WgpuTexture> {
        target.color_attachment().cloned()
    }

    fn bind_vertex_array(&mut self, vertex_array: &WgpuVertexArray) {
        self.bound.vertex_array = Some(vertex_array.clone());
    }

    fn bind_program(&mut self, program: &WgpuProgram) {
        self.bound.program = Some(program.clone());
    }

    fn bind_texture(&mut self, slot: u32, texture: &WgpuTexture) {
        if slot != 0 {
            log::warn!("texture slot {slot} is not supported; only slot 0 is sampled");
            return;
        }
        self.bound.texture = Some(texture.clone());
    }

    fn bind_target(&mut self, target: &WgpuTarget) {
        let Some(color) = target.color_attachment() else {
            log::error!("bind_target: `{}` has no color attachment", target.label);
            return;
        };
        self.bound.target = Some(PassTarget {
            view: color.view.clone(),
            format: convert::texture_format(color.spec.format),
            width: target.width,
            height: target.height,
        });
    }

    fn unbind_target(&mut self) {
        self.bound.target = None;
    }

    fn clear(&mut self, color: PackedColor) {
        let Some(target) = self.pass_target() else { return };
        let [r, g, b, a] = color.to_f32();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pixbatch clear encoder"),
            });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pixbatch clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn clear_attachment(
        &mut self,
        target: &WgpuTarget,
        index: usize,
        value: AttachmentClear,
    ) -> Result<(), GfxError> {
        types::check_clear(&target.specs, index, value)?;
        let attachment = target.attachments.get(index).ok_or(GfxError::AttachmentIndex {
            index,
            count: target.attachments.len(),
        })?;

        let color_load = match value {
            AttachmentClear::Color(c) => {
                let [r, g, b, a] = c.to_f32();
                Some(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                })
            }
            // Integer targets take the red channel as the clear value.
            AttachmentClear::Uint(v) => Some(wgpu::Color {
                r: v as f64,
                g: 0.0,
                b: 0.0,
                a: 0.0,
            }),
            AttachmentClear::DepthStencil { .. } => None,
        };
        let color_attachments = [color_load.map(|c| wgpu::RenderPassColorAttachment {
            view: &attachment.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(c),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })];
        let depth_stencil_attachment = match value {
            AttachmentClear::DepthStencil { depth, stencil } => {
                Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &attachment.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(stencil),
                        store: wgpu::StoreOp::Store,
                    }),
                })
            }
            _ => None,
        };
        let color_attachments: &[Option<wgpu::RenderPassColorAttachment<'_>>] =
            if depth_stencil_attachment.is_some() { &[] } else { &color_attachments };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pixbatch clear attachment encoder"),
            });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pixbatch clear attachment"),
                color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn read_pixel(
        &mut self,
        target: &WgpuTarget,
        index: usize,
        x: u32,
        y: u32,
    ) -> Result<u32, GfxError> {
        let format = types::check_readback(&target.specs, index, (x, y), target.size())?;
        let attachment = target.attachments.get(index).ok_or(GfxError::AttachmentIndex {
            index,
            count: target.attachments.len(),
        })?;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixbatch readback"),
            size: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pixbatch readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &attachment.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GfxError::Readback(e.to_string()))?;
        rx.recv()
            .map_err(|e| GfxError::Readback(e.to_string()))?
            .map_err(|e| GfxError::Readback(e.to_string()))?;

        let texel = {
            let view = slice.get_mapped_range();
            [view[0], view[1], view[2], view[3]]
        };
        staging.unmap();

        Ok(match format {
            TextureFormat::Rgba8 => u32::from_be_bytes(texel),
            _ => u32::from_ne_bytes(texel),
        })
    }

    fn draw(&mut self, topology: Topology, count: u32) {
        self.submit_pass(topology, count, false);
    }

    fn draw_indexed(&mut self, topology: Topology, count: u32, _index_type: IndexType) {
        // The stored index format wins; 8-bit indices were widened on upload.
        self.submit_pass(topology, count, true);
    }
}
