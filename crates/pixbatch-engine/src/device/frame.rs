/// One acquired swapchain image.
///
/// Holding it blocks acquisition of the next one; present it promptly with
/// [`Gpu::present`](super::Gpu::present).
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
