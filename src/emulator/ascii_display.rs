use super::{
    basics::{SCREEN_HEIGHT, SCREEN_WIDTH},
    display::Frame,
    vm::VirtualMachine,
};

/// Renders a frame as text, `@` for a lit pixel, one line per row.
pub fn render(frame: &Frame) -> String {
    let mut out = String::with_capacity((SCREEN_WIDTH as usize + 1) * SCREEN_HEIGHT as usize);
    for y in 0..SCREEN_HEIGHT as usize {
        for x in 0..SCREEN_WIDTH as usize {
            out.push(if frame[x][y] { '@' } else { ' ' });
        }
        out.push('\n');
    }
    out
}

pub fn draw_vm_display(vm: &VirtualMachine) {
    print!("{}", render(&vm.frame()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::display::EMPTY_FRAME;

    #[test]
    fn test_render_blank() {
        let text = render(&EMPTY_FRAME);
        assert_eq!(text.lines().count(), 32);
        assert!(text.lines().all(|line| line.len() == 64 && line.trim().is_empty()));
    }

    #[test]
    fn test_render_corners() {
        let mut frame = EMPTY_FRAME;
        frame[0][0] = true;
        frame[63][31] = true;
        let text = render(&frame);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("@ "));
        assert!(lines[31].ends_with(" @"));
    }
}
