// SPDX-License-Identifier: MIT

mod stats;
mod types;

pub use stats::WalkerStats;
pub use types::{Finding, Severity, VerifierOptionsLike, VerifyPhases, VerifyReport};

pub use crate::core::errors::{FsckError, FsckResult};

/// Trait for verifying the integrity of a filesystem image.
///
/// Phases run strictly in order and never go back:
/// geometry (superblock/layout) -> bitmap load -> inode walk -> reconcile.
/// The first violation aborts the run with an `Err`; a successful run returns
/// the informational findings collected along the way.
pub trait FsChecker {
    type Options: VerifierOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsckResult<VerifyReport> {
        let mut rep = VerifyReport::default();
        self.run_phase(opt, &mut rep, VerifyPhases::GEOMETRY, Self::check_geometry)?;
        self.run_phase(opt, &mut rep, VerifyPhases::BITMAP, Self::check_bitmap)?;
        self.run_phase(opt, &mut rep, VerifyPhases::INODES, Self::check_inodes)?;
        self.run_phase(opt, &mut rep, VerifyPhases::RECONCILE, Self::check_reconcile)?;
        Ok(rep)
    }

    fn check_all(&mut self) -> FsckResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    /// Cheap structural check: geometry and bitmap only, no inode walk.
    fn fast_check(&mut self) -> FsckResult {
        Ok(())
    }

    fn check_geometry(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsckResult<()> {
        Ok(())
    }
    fn check_bitmap(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_inodes(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsckResult<()> {
        Ok(())
    }
    fn check_reconcile(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsckResult<()> {
        Ok(())
    }

    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: F,
    ) -> FsckResult<()>
    where
        F: Fn(&mut Self, &Self::Options, &mut VerifyReport) -> FsckResult<()>,
    {
        if opt.phases().contains(phase) {
            log::debug!("phase {phase:?}");
            f(self, opt, rep)?;
        }
        Ok(())
    }
}
