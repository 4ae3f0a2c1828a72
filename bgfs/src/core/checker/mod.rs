// SPDX-License-Identifier: MIT

mod types;

pub use types::{
    Finding, PhaseOptions, ReportDisplay, ReportDisplayOpts, Severity, VerifyOptions,
    VerifyPhases, VerifyReport,
};

pub use crate::core::errors::{FsCheckerError, FsCheckerResult};

/// Re-derives the filesystem invariants from live state.
///
/// Each phase pushes [`Finding`]s into the report instead of failing; an
/// `Err` is reserved for the checker itself being unable to run.
pub trait FsChecker {
    type Options: PhaseOptions + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsCheckerResult<VerifyReport> {
        let mut rep = VerifyReport::default();
        if self.run_phase(opt, &mut rep, VerifyPhases::GEOMETRY, Self::check_geometry)?
            && self.run_phase(opt, &mut rep, VerifyPhases::EXTENTS, Self::check_extents)?
        {
            self.run_phase(
                opt,
                &mut rep,
                VerifyPhases::CROSSREF,
                Self::check_cross_reference,
            )?;
        }
        Ok(rep)
    }

    fn check_all(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    fn check_geometry(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }

    fn check_extents(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }

    fn check_cross_reference(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }

    /// Runs `f` if `phase` is enabled. Returns `false` once fail-fast should
    /// stop the remaining phases.
    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: F,
    ) -> FsCheckerResult<bool>
    where
        F: Fn(&mut Self, &Self::Options, &mut VerifyReport) -> FsCheckerResult<()>,
    {
        if opt.phases().contains(phase) {
            rep.enter(phase);
            f(self, opt, rep)?;
            if opt.fail_fast() && rep.has_error() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
