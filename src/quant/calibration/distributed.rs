//! Distributed-run query used to decide on the cross-worker advisory.

/// Process group the calibrator may be running under
pub trait ProcessGroup {
    /// True when a multi-process group is active
    fn is_initialized(&self) -> bool;
}

/// No process group; the default for single-process calibration
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl ProcessGroup for SingleProcess {
    fn is_initialized(&self) -> bool {
        false
    }
}
