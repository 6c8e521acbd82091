//! Hello World: a frame buffer, a texture and a line of text.
//!
//! ```text
//! cargo run --example hello_world -- [font.ttf] [image.png] [config.json]
//! ```
//!
//! Without an image a checkerboard is generated; without a font the text is
//! skipped. Escape quits.

use pixel_cannon::prelude::*;

const CHECKER_SIZE: u32 = 64;

struct HelloWorld {
    font_path: Option<String>,
    image_path: Option<String>,
    frame_buffer: Option<FrameBuffer>,
    texture: Option<Texture>,
    font: Option<Font>,
}

impl HelloWorld {
    fn checkerboard() -> Result<Surface> {
        let pixels = (0..CHECKER_SIZE * CHECKER_SIZE)
            .map(|i| {
                let (x, y) = (i % CHECKER_SIZE, i / CHECKER_SIZE);
                if (x / 8 + y / 8) % 2 == 0 {
                    Pixel::WHITE
                } else {
                    Pixel::CORNFLOWER_BLUE
                }
            })
            .collect();
        Surface::from_pixels(CHECKER_SIZE, CHECKER_SIZE, pixels)
    }
}

impl Game for HelloWorld {
    fn init(&mut self, ctx: &mut GameContext) -> Result<()> {
        let size = ctx.graphics.back_buffer_size();
        self.frame_buffer = Some(ctx.graphics.create_frame_buffer(size.width as u32, size.height as u32)?);

        self.texture = Some(match &self.image_path {
            Some(path) => ctx.graphics.load_texture(path)?,
            None => ctx.graphics.create_texture_from_surface(&Self::checkerboard()?)?,
        });

        if let Some(path) = &self.font_path {
            self.font = Some(Font::ascii(&mut ctx.graphics, path, 48.0)?);
        } else {
            log::warn!("no font given, text will not be drawn");
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<()> {
        if ctx.keyboard.just_pressed(KeyCode::Escape) {
            ctx.exit();
        }
        if ctx.time.frame_count() % 300 == 0 {
            ctx.set_title(&format!("Hello Pixel Cannon ({:.0} fps)", ctx.time.average_fps()));
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut GameContext) -> Result<()> {
        let (Some(frame_buffer), Some(texture)) = (&self.frame_buffer, &self.texture) else {
            return Ok(());
        };
        let graphics = &mut ctx.graphics;
        let size = graphics.back_buffer_size();

        graphics.clear(RenderTarget::BackBuffer, Color::BLACK)?;
        graphics.clear(frame_buffer, Color::MAGENTA)?;

        graphics.begin()?;
        graphics.draw_sprite(
            frame_buffer,
            texture,
            Rectangle::new(0, 0, size.width, size.height),
            SpriteOptions::default(),
        )?;
        graphics.draw_sprite(RenderTarget::BackBuffer, frame_buffer, Vec2::ZERO, SpriteOptions::default())?;
        if let Some(font) = &self.font {
            graphics.draw_string(
                RenderTarget::BackBuffer,
                font,
                "goodbye World!",
                Vec2::ZERO,
                &TextOptions::default(),
            )?;
        }
        let stats = graphics.end()?;
        log::trace!("{stats}");
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut GameContext) {
        let graphics = &mut ctx.graphics;
        let freed = [
            self.frame_buffer.take().map(|fb| graphics.free_frame_buffer(fb)),
            self.texture.take().map(|t| graphics.free_texture(t)),
            self.font.take().map(|f| graphics.free_font(f)),
        ];
        for result in freed.into_iter().flatten() {
            if let Err(e) = result {
                log::warn!("failed to free resource: {e}");
            }
        }
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let font_path = args.next();
    let image_path = args.next();

    let mut app = match args.next() {
        Some(config) => App::from_config_file(config)?,
        None => App::default(),
    };
    init_logger(&app.config().log_filter);
    if app.config().window.title == WindowConfig::default().title {
        let mut config = app.config().clone();
        config.window.title = "Hello Pixel Cannon".to_owned();
        app = App::new(config);
    }

    app.run(HelloWorld {
        font_path,
        image_path,
        frame_buffer: None,
        texture: None,
        font: None,
    })
}
