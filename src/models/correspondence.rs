/// One camera pixel paired with the projector pixel that lit it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Match {
    /// Camera column
    pub cam_u: f64,
    /// Camera row
    pub cam_v: f64,
    /// Projector column (decoded, center offset applied)
    pub proj_u: f64,
    /// Projector row (decoded, center offset applied)
    pub proj_v: f64,
}

impl Match {
    /// Create a new match
    pub fn new(cam_u: f64, cam_v: f64, proj_u: f64, proj_v: f64) -> Self {
        Self {
            cam_u,
            cam_v,
            proj_u,
            proj_v,
        }
    }
}
