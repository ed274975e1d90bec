use crate::error::GfxError;
use crate::gfx::{TextureDesc, TextureSpec, VertexLayout};

use super::convert;

#[derive(Debug, Clone)]
pub struct WgpuBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) capacity: u64,
}

#[derive(Debug, Clone)]
pub struct WgpuIndexBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) format: wgpu::IndexFormat,
    pub(crate) count: u32,
}

impl WgpuIndexBuffer {
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[derive(Debug, Clone)]
pub struct WgpuVertexArray {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) layout: VertexLayout,
    pub(crate) attributes: Vec<wgpu::VertexAttribute>,
    pub(crate) indices: Option<WgpuIndexBuffer>,
}

#[derive(Debug, Clone)]
pub struct WgpuProgram {
    pub(crate) id: u64,
    pub(crate) module: wgpu::ShaderModule,
    pub(crate) vertex_entry: &'static str,
    pub(crate) fragment_entry: &'static str,
    pub(crate) samples_texture: bool,
}

/// Texture plus its view and, for sampleable formats, a bind group
/// (`@group(0)`: texture at binding 0, sampler at binding 1).
#[derive(Debug, Clone)]
pub struct WgpuTexture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) bind_group: Option<wgpu::BindGroup>,
    pub(crate) spec: TextureSpec,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl WgpuTexture {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn create(
        device: &wgpu::Device,
        sampled_layout: &wgpu::BindGroupLayout,
        desc: &TextureDesc,
        render_attachment: bool,
    ) -> Result<Self, GfxError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GfxError::InvalidSize {
                what: "texture",
                width: desc.width,
                height: desc.height,
            });
        }

        let format = convert::texture_format(desc.spec.format);
        let is_depth = desc.spec.format.is_depth();

        let mut usage = if is_depth {
            wgpu::TextureUsages::empty()
        } else {
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC
        };
        if render_attachment || is_depth {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label.as_ref()),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Only filterable float textures fit the shared sampled layout.
        let bind_group = (format == wgpu::TextureFormat::Rgba8Unorm).then(|| {
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("pixbatch texture sampler"),
                address_mode_u: convert::address_mode(desc.spec.wrap),
                address_mode_v: convert::address_mode(desc.spec.wrap),
                address_mode_w: convert::address_mode(desc.spec.wrap),
                mag_filter: convert::filter_mode(desc.spec.mag_filter),
                min_filter: convert::filter_mode(desc.spec.min_filter),
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("pixbatch texture bind group"),
                layout: sampled_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            })
        });

        Ok(Self {
            texture,
            view,
            bind_group,
            spec: desc.spec,
            width: desc.width,
            height: desc.height,
        })
    }
}

/// Offscreen framebuffer.
#[derive(Debug)]
pub struct WgpuTarget {
    pub(crate) label: String,
    pub(crate) specs: Vec<TextureSpec>,
    pub(crate) attachments: Vec<WgpuTexture>,
    pub(crate) color: Option<usize>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl WgpuTarget {
    pub fn attachments(&self) -> &[WgpuTexture] {
        &self.attachments
    }

    pub fn color_attachment(&self) -> Option<&WgpuTexture> {
        self.color.and_then(|i| self.attachments.get(i))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn recreate(
        &mut self,
        device: &wgpu::Device,
        sampled_layout: &wgpu::BindGroupLayout,
    ) -> Result<(), GfxError> {
        let mut attachments = Vec::with_capacity(self.specs.len());
        for (i, spec) in self.specs.iter().enumerate() {
            let desc = TextureDesc {
                label: format!("{} attachment {i}", self.label).into(),
                width: self.width,
                height: self.height,
                spec: *spec,
            };
            attachments.push(WgpuTexture::create(device, sampled_layout, &desc, true)?);
        }
        self.attachments = attachments;
        Ok(())
    }
}
