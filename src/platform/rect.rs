//! Conversion from Win32 `RECT` to domain rectangles

use windows::Win32::Foundation::RECT;

use crate::domain::core::Rect;

pub fn from_win32(rect: &RECT) -> Rect {
    Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_become_origin_and_size() {
        let native = RECT {
            left: -1280,
            top: 40,
            right: 0,
            bottom: 1024,
        };
        assert_eq!(from_win32(&native), Rect::new(-1280, 40, 1280, 984));
    }
}
