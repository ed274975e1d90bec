//! Opens a window and exercises every batch kind.
//!
//! Each frame draws a grid of animated sprites into an offscreen target, then
//! draws a starfield (points), a frame (lines) and the offscreen image (one
//! textured quad) on screen.
//!
//! Usage: `pixbatch-demo [renderer.toml]`. Escape quits.

use anyhow::{Context, Result};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use pixbatch_engine::coords::{AtlasRect, Extent, PixelRect};
use pixbatch_engine::core::{App, AppControl, FrameCtx};
use pixbatch_engine::device::{Gpu, GpuInit};
use pixbatch_engine::error::FrameError;
use pixbatch_engine::gfx::{GraphicsBackend, TargetDesc, TextureDesc, WgpuBackend, WgpuTarget, WgpuTexture};
use pixbatch_engine::logging::{LoggingConfig, init_logging};
use pixbatch_engine::window::{Runtime, RuntimeConfig};
use pixbatch_engine::{PackedColor, Renderer, RendererConfig};

const STAR_COUNT: u32 = 400;

const PALETTE: [u32; 8] = [
    0xFF004DFF, 0xFFA300FF, 0xFFEC27FF, 0x00E436FF, 0x29ADFFFF, 0x83769CFF, 0xFF77A8FF, 0xFFCCAAFF,
];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = match std::env::args().nth(1) {
        Some(path) => RendererConfig::load_from_path(&path)
            .with_context(|| format!("loading renderer config {path}"))?,
        None => RendererConfig::default(),
    };

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), Demo::new(config))
}

struct Demo {
    config: RendererConfig,
    scene: Option<Scene>,
}

/// GPU resources created on the first frame, once a device exists.
struct Scene {
    renderer: Renderer<WgpuBackend>,
    atlas: WgpuTexture,
    offscreen: WgpuTarget,
}

impl Demo {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            scene: None,
        }
    }
}

impl Scene {
    fn new(gpu: &Gpu<'_>, config: &RendererConfig) -> Result<Self> {
        let mut backend = gpu.create_backend()?;

        let atlas_desc = TextureDesc::rgba8("pixbatch demo atlas", config.atlas.width, config.atlas.height);
        let atlas = backend.create_texture(&atlas_desc)?;
        backend.write_texture(&atlas, &checker_atlas(config.atlas, config.sprite_size))?;

        let offscreen = backend.create_target(&TargetDesc::color(
            "pixbatch demo offscreen",
            config.canvas.width,
            config.canvas.height,
        ))?;

        let renderer = Renderer::new(backend, config)?;
        log::info!("demo scene ready");
        Ok(Self {
            renderer,
            atlas,
            offscreen,
        })
    }
}

impl App for Demo {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.scene.is_none() {
            match Scene::new(ctx.gpu, &self.config) {
                Ok(scene) => self.scene = Some(scene),
                Err(e) => {
                    log::error!("failed to set up renderer: {e:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(Scene {
            renderer,
            atlas,
            offscreen,
        }) = self.scene.as_mut()
        else {
            return AppControl::Exit;
        };

        let t = ctx.elapsed;
        let frame_index = ctx.frame_index;
        let config = &self.config;

        let mut result = Ok(());
        let control = ctx.render(renderer, |r| {
            result = draw_frame(r, config, atlas, offscreen, t);
        });

        if let Err(e) = result {
            log::error!("frame {frame_index}: {e}");
            return AppControl::Exit;
        }
        if frame_index % 600 == 0 {
            let s = renderer.last_stats();
            log::debug!(
                "frame {frame_index}: {} draws, {} bytes uploaded",
                s.draw_calls(),
                s.bytes_uploaded()
            );
        }
        control
    }
}

fn draw_frame(
    r: &mut Renderer<WgpuBackend>,
    config: &RendererConfig,
    atlas: &WgpuTexture,
    offscreen: &WgpuTarget,
    t: f32,
) -> Result<(), FrameError> {
    let canvas = config.canvas;
    let cell = config.sprite_size;

    // Sprites into the offscreen target.
    r.set_atlas(Some(atlas.clone()));
    r.set_atlas_size(config.atlas);
    r.begin_frame(Some(offscreen))?;
    r.clear(PackedColor::new(0x1D2B53FF));
    let cols = config.atlas.width / cell;
    let rows = config.atlas.height / cell;
    let step = (cell * 2) as f32;
    let mut i = 0u32;
    let mut y = cell as f32;
    while y + step <= canvas.height as f32 {
        let mut x = cell as f32;
        while x + step <= canvas.width as f32 {
            let bob = (t * 3.0 + i as f32 * 0.4).sin() * 2.0;
            let (u, v) = ((i % cols) * cell, ((i / cols) % rows) * cell);
            r.draw_sprite(x, y + bob, u as u16, v as u16);
            x += step;
            i += 1;
        }
        y += step;
    }
    r.end_frame()?;

    // Screen: stars, frame lines, then the offscreen image.
    r.begin_frame(None)?;
    r.clear(PackedColor::BLACK);

    let (w, h) = (canvas.width.max(1), canvas.height.max(1));
    for s in 0..STAR_COUNT {
        let seed = hash(s);
        let speed = 4.0 + (seed >> 24) as f32 / 16.0;
        let x = ((seed & 0xFFFF) as f32 + t * speed) as u32 % w;
        let y = (seed >> 8) % h;
        let twinkle = ((t * 5.0 + s as f32).sin() * 0.5 + 0.5) * 255.0;
        r.draw_point(x as u16, y as u16, PackedColor::WHITE.with_alpha(twinkle as u8));
    }

    let (x0, y0) = (canvas.width / 8, canvas.height / 8);
    let (x1, y1) = (canvas.width - x0, canvas.height - y0);
    let color = PackedColor::new(PALETTE[(t as usize) % PALETTE.len()]);
    let (x0, y0, x1, y1) = (x0 as u16, y0 as u16, x1 as u16, y1 as u16);
    r.draw_line(x0, y0, x1, y0, color);
    r.draw_line(x1, y0, x1, y1, color);
    r.draw_line(x1, y1, x0, y1, color);
    r.draw_line(x0, y1, x0, y0, color);

    if let Some(image) = r.backend().target_texture(offscreen) {
        let (ow, oh) = r.backend().target_size(offscreen);
        r.set_atlas(Some(image));
        r.set_atlas_size(Extent::new(ow, oh));
        let inset = 2.0;
        r.draw_texture(
            PixelRect::new(
                x0 as f32 + inset,
                y0 as f32 + inset,
                x1 as f32 - inset,
                y1 as f32 - inset,
            ),
            AtlasRect::new(0.0, 0.0, ow as f32, oh as f32),
        );
    }
    r.end_frame()?;
    Ok(())
}

/// RGBA8 atlas of `cell`-sized tiles, each a palette color with a dark border.
fn checker_atlas(size: Extent, cell: u32) -> Vec<u8> {
    let cols = (size.width / cell).max(1);
    let mut data = Vec::with_capacity(size.area() as usize * 4);
    for y in 0..size.height {
        for x in 0..size.width {
            let (cx, cy) = (x / cell, y / cell);
            let (lx, ly) = (x % cell, y % cell);
            let border = lx == 0 || ly == 0 || lx == cell - 1 || ly == cell - 1;
            let rgba = if border {
                0x000000FF
            } else {
                PALETTE[((cy * cols + cx) as usize) % PALETTE.len()]
            };
            data.extend_from_slice(&rgba.to_be_bytes());
        }
    }
    data
}

fn hash(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x
}
