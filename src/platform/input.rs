//! Controller button codes.

use bitflags::bitflags;

bitflags! {
    /// Button word of a standard controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Buttons: u16 {
        const A = 0x8000;
        const B = 0x4000;
        const Z = 0x2000;
        const START = 0x1000;
        const UP = 0x0800;
        const DOWN = 0x0400;
        const LEFT = 0x0200;
        const RIGHT = 0x0100;
        const L = 0x0020;
        const R = 0x0010;
        const C_UP = 0x0008;
        const C_DOWN = 0x0004;
        const C_LEFT = 0x0002;
        const C_RIGHT = 0x0001;
    }
}
