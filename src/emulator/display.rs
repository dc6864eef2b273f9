use super::basics::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// A full snapshot of the screen, indexed `[x][y]`.
pub type Frame = [[bool; SCREEN_HEIGHT as usize]; SCREEN_WIDTH as usize];

pub const EMPTY_FRAME: Frame = [[false; SCREEN_HEIGHT as usize]; SCREEN_WIDTH as usize];

/// The 64x32 monochrome surface the interpreter draws on. Coordinates
/// wrap, so `(64, 33)` is the same pixel as `(0, 1)`.
pub trait Display: Send {
    /// Turns every pixel off.
    fn clear(&mut self);

    fn set_pixel(&mut self, x: u8, y: u8, value: bool);

    fn get_pixel(&self, x: u8, y: u8) -> bool;

    /// Flips a pixel and returns whether it was lit before.
    fn toggle(&mut self, x: u8, y: u8) -> bool {
        let was_on = self.get_pixel(x, y);
        self.set_pixel(x, y, !was_on);
        was_on
    }

    /// What a renderer should show, which may lag behind `get_pixel`.
    fn visible(&self, x: u8, y: u8) -> bool {
        self.get_pixel(x, y)
    }

    /// Called by the renderer once per presented frame.
    fn frame(&mut self) {}

    fn snapshot(&self) -> Frame {
        let mut frame = EMPTY_FRAME;
        for x in 0..SCREEN_WIDTH {
            for y in 0..SCREEN_HEIGHT {
                frame[x as usize][y as usize] = self.get_pixel(x, y);
            }
        }
        frame
    }
}

fn wrap(x: u8, y: u8) -> (usize, usize) {
    ((x % SCREEN_WIDTH) as usize, (y % SCREEN_HEIGHT) as usize)
}

/// Plain framebuffer: what was drawn is what gets shown.
#[derive(Clone)]
pub struct Framebuffer {
    pixels: Frame,
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            pixels: EMPTY_FRAME,
        }
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer::new()
    }
}

impl Display for Framebuffer {
    fn clear(&mut self) {
        self.pixels = EMPTY_FRAME;
    }

    fn set_pixel(&mut self, x: u8, y: u8, value: bool) {
        let (x, y) = wrap(x, y);
        self.pixels[x][y] = value;
    }

    fn get_pixel(&self, x: u8, y: u8) -> bool {
        let (x, y) = wrap(x, y);
        self.pixels[x][y]
    }

    fn snapshot(&self) -> Frame {
        self.pixels
    }
}

/// Keeps pixels that were switched off visible for a few more frames.
/// CHIP-8 games erase and redraw sprites constantly, which flickers badly
/// on a real screen otherwise. Collision detection still sees the true
/// state through `get_pixel`.
pub struct BufferedDisplay {
    true_display: Frame,
    fade: [[u32; SCREEN_HEIGHT as usize]; SCREEN_WIDTH as usize],
    fade_frames: u32,
}

impl BufferedDisplay {
    pub fn new(fade_frames: u32) -> BufferedDisplay {
        BufferedDisplay {
            true_display: EMPTY_FRAME,
            fade: [[0; SCREEN_HEIGHT as usize]; SCREEN_WIDTH as usize],
            fade_frames,
        }
    }
}

impl Display for BufferedDisplay {
    fn clear(&mut self) {
        for column in self.true_display.iter_mut() {
            for pixel in column.iter_mut() {
                *pixel = false;
            }
        }
        for column in self.fade.iter_mut() {
            for pixel in column.iter_mut() {
                *pixel = 0;
            }
        }
    }

    fn set_pixel(&mut self, x: u8, y: u8, value: bool) {
        let (x, y) = wrap(x, y);
        let pixel = &mut self.true_display[x][y];
        if *pixel && !value {
            self.fade[x][y] = self.fade_frames;
        }
        *pixel = value;
    }

    fn get_pixel(&self, x: u8, y: u8) -> bool {
        let (x, y) = wrap(x, y);
        self.true_display[x][y]
    }

    fn visible(&self, x: u8, y: u8) -> bool {
        let (x, y) = wrap(x, y);
        self.true_display[x][y] || self.fade[x][y] > 0
    }

    fn frame(&mut self) {
        for column in self.fade.iter_mut() {
            for pixel in column.iter_mut() {
                *pixel = pixel.saturating_sub(1);
            }
        }
    }
}
