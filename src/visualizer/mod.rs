extern crate sfml;

use crate::emulator::basics::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::emulator::vm::VMInterface;
use crate::rom_config::RomConfig;
use sfml::graphics::{Color, RectangleShape, RenderTarget, RenderWindow, Shape, Transformable};
use sfml::system::Vector2f;
use sfml::window::{ContextSettings, Event, Key, Style, VideoMode};
use std::iter;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

const SCALE: usize = 16;

type Pixels = [[RectangleShape<'static>; SCREEN_HEIGHT as usize]; SCREEN_WIDTH as usize];

/// A window showing the machine's display and feeding its keypad.
pub struct Visualizer {
    setup_done: Arc<(Mutex<bool>, Condvar)>,
    join_handle: JoinHandle<()>,
}

impl Visualizer {
    pub fn new(vm_interface: Arc<Mutex<VMInterface>>, config: &RomConfig) -> Visualizer {
        let keys = keyboard_layout(config);
        let setup_done = Arc::new((Mutex::new(false), Condvar::new()));
        let setup_done2 = setup_done.clone();
        let join_handle = std::thread::spawn(move || {
            let mut window = init_window();
            let pixels = init_pixels();
            {
                let (mutex, condvar) = &*setup_done2;
                *relock(mutex) = true;
                condvar.notify_all();
            }
            run(&mut window, &pixels, &keys, &vm_interface);
        });
        Visualizer {
            setup_done,
            join_handle,
        }
    }

    pub fn wait_for_init(&self) {
        let (mutex, condvar) = &*self.setup_done;
        let mut guard = relock(mutex);
        while !*guard {
            guard = condvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until the window is closed.
    pub fn wait_for_close(self) {
        if self.join_handle.join().is_err() {
            log::error!("visualizer thread panicked");
        }
    }
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The sfml key for a keymap character.
fn key_code(c: char) -> Option<Key> {
    let key = match c.to_ascii_lowercase() {
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        'a' => Key::A,
        'b' => Key::B,
        'c' => Key::C,
        'd' => Key::D,
        'e' => Key::E,
        'f' => Key::F,
        'g' => Key::G,
        'h' => Key::H,
        'i' => Key::I,
        'j' => Key::J,
        'k' => Key::K,
        'l' => Key::L,
        'm' => Key::M,
        'n' => Key::N,
        'o' => Key::O,
        'p' => Key::P,
        'q' => Key::Q,
        'r' => Key::R,
        's' => Key::S,
        't' => Key::T,
        'u' => Key::U,
        'v' => Key::V,
        'w' => Key::W,
        'x' => Key::X,
        'y' => Key::Y,
        'z' => Key::Z,
        _ => return None,
    };
    Some(key)
}

fn keyboard_layout(config: &RomConfig) -> Vec<(Key, u8)> {
    let mut layout = Vec::with_capacity(config.keymap.len());
    for (&chip8_key, &c) in &config.keymap {
        match key_code(c) {
            Some(code) => layout.push((code, chip8_key)),
            None => log::warn!("no keyboard key for {:?}, key {:X} is unbound", c, chip8_key),
        }
    }
    layout
}

fn init_window() -> RenderWindow {
    let video_mode = VideoMode::new(
        SCREEN_WIDTH as u32 * SCALE as u32,
        SCREEN_HEIGHT as u32 * SCALE as u32,
        32,
    );
    let mut window = RenderWindow::new(
        video_mode,
        "CHIP-8",
        Style::CLOSE,
        &ContextSettings::default(),
    );
    window.set_framerate_limit(60);
    window
}

/// Fills an array from an iterator yielding exactly as many items.
fn filled<A: arrayvec::Array>(items: impl Iterator<Item = A::Item>) -> A {
    match items.collect::<arrayvec::ArrayVec<A>>().into_inner() {
        Ok(array) => array,
        Err(_) => unreachable!("iterator ended before the array was full"),
    }
}

fn init_pixels() -> Pixels {
    let column = || filled(iter::repeat_with(RectangleShape::new).take(SCREEN_HEIGHT as usize));
    let mut pixels: Pixels = filled(iter::repeat_with(column).take(SCREEN_WIDTH as usize));
    for (x, column) in pixels.iter_mut().enumerate() {
        for (y, pixel) in column.iter_mut().enumerate() {
            pixel.set_size(Vector2f::new(SCALE as f32, SCALE as f32));
            pixel.set_position(Vector2f::new((SCALE * x) as f32, (SCALE * y) as f32));
            pixel.set_fill_color(Color::WHITE);
        }
    }
    pixels
}

fn run(
    window: &mut RenderWindow,
    pixels: &Pixels,
    keys: &[(Key, u8)],
    vm_interface: &Mutex<VMInterface>,
) {
    let chip8_key = |code: Key| keys.iter().find(|(k, _)| *k == code).map(|(_, key)| *key);
    while window.is_open() {
        while let Some(event) = window.poll_event() {
            let (code, pressed) = match event {
                Event::Closed => {
                    window.close();
                    continue;
                }
                Event::KeyPressed { code, .. } => (code, true),
                Event::KeyReleased { code, .. } => (code, false),
                _ => continue,
            };
            if let Some(key) = chip8_key(code) {
                if let Err(e) = relock(vm_interface).keypad.set_pressed(key, pressed) {
                    log::warn!("{}", e);
                }
            }
        }

        window.clear(Color::BLACK);
        {
            let mut interface = relock(vm_interface);
            for x in 0..SCREEN_WIDTH {
                for y in 0..SCREEN_HEIGHT {
                    if interface.display.visible(x, y) {
                        window.draw(&pixels[x as usize][y as usize]);
                    }
                }
            }
            interface.display.frame();
        }
        window.display()
    }
}
