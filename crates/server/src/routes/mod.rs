pub mod analyze;
pub mod explain;
pub mod games;
pub mod health;

/// Engine depths outside this range are either useless or unpayable.
pub(crate) fn clamp_depth(depth: u32) -> u32 {
    depth.clamp(1, 30)
}
