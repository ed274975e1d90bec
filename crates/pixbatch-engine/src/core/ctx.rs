use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::gfx::{GraphicsBackend, WgpuBackend};
use crate::render::Renderer;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    /// Redraws completed before this one.
    pub frame_index: u64,
    /// Seconds since the window was created.
    pub elapsed: f32,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the swapchain image, makes it the renderer's default target for
    /// the duration of `draw`, then presents it.
    ///
    /// Surface errors skip the frame; an unrecoverable one returns `Exit`.
    pub fn render<F>(&mut self, renderer: &mut Renderer<WgpuBackend>, draw: F) -> AppControl
    where
        F: FnOnce(&mut Renderer<WgpuBackend>),
    {
        let frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface lost beyond recovery");
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let size = self.gpu.size();
        renderer.backend_mut().attach_surface(
            frame.view.clone(),
            self.gpu.surface_format(),
            size.width,
            size.height,
        );

        draw(renderer);

        end_open_frame(renderer);
        renderer.backend_mut().detach_surface();

        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}

/// Ends a frame the draw callback left open. Returns whether one was open.
fn end_open_frame<B: GraphicsBackend>(renderer: &mut Renderer<B>) -> bool {
    if !renderer.is_in_frame() {
        return false;
    }
    log::warn!("frame left open by draw callback; ending it");
    if let Err(e) = renderer.end_frame() {
        log::error!("failed to end the open frame: {e}");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RendererConfig;
    use crate::gfx::recording::RecordingBackend;
    use crate::paint::PackedColor;

    #[test]
    fn open_frame_is_flushed_and_closed() {
        let cfg = RendererConfig::default().with_capacities(4, 2, 1);
        let mut r = Renderer::new(RecordingBackend::new(), &cfg).unwrap();

        assert!(!end_open_frame(&mut r));

        r.begin_frame(None).unwrap();
        r.draw_point(1, 1, PackedColor::WHITE);
        assert!(end_open_frame(&mut r));
        assert!(!r.is_in_frame());
        assert_eq!(r.backend().draws().len(), 1);
        assert_eq!(r.last_stats().points.primitives, 1);

        assert!(!end_open_frame(&mut r));
    }
}
