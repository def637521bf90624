#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [-1.0, -1.0, 0.0],
    },
    Vertex {
        position: [1.0, -1.0, 0.0],
    },
    Vertex {
        position: [0.0, 1.0, 0.0],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn vertex_is_three_packed_floats() {
        assert_eq!(mem::size_of::<Vertex>(), 12);
        assert_eq!(mem::size_of_val(&TRIANGLE), 36);
    }

    #[test]
    fn triangle_spans_clip_space() {
        assert_eq!(TRIANGLE[0].position, [-1.0, -1.0, 0.0]);
        assert_eq!(TRIANGLE[1].position, [1.0, -1.0, 0.0]);
        assert_eq!(TRIANGLE[2].position, [0.0, 1.0, 0.0]);
    }
}
