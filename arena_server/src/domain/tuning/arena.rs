/// World rectangle shared by the server and every client mirror.

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// World width in units; x runs from 0 to `width`.
    pub width: f64,

    /// World height in units; y runs from 0 to `height`.
    pub height: f64,

    /// Fraction of each axis (centered) that spawn points are drawn from.
    pub spawn_fraction: f64,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 4096.0,
            height: 4096.0,
            spawn_fraction: 0.8,
        }
    }
}
