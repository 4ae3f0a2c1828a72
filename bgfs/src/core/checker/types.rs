// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{string::String, vec::Vec};
use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Checker phases. A finding is stamped with the phase that produced it.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        /// Group ranges, bitmap sizes, device bounds.
        const GEOMETRY = 1 << 0;
        /// Per-file extent shape.
        const EXTENTS  = 1 << 1;
        /// Bitmaps against the union of all extents and inode ids.
        const CROSSREF = 1 << 2;
        const ALL      = u32::MAX;
    }
}

impl VerifyPhases {
    /// Short name of a single phase, `-` for none or a combination.
    pub fn name(self) -> &'static str {
        if self == Self::GEOMETRY {
            "geometry"
        } else if self == Self::EXTENTS {
            "extents"
        } else if self == Self::CROSSREF {
            "crossref"
        } else {
            "-"
        }
    }
}

/// Declaration order is the ranking: `Info < Warn < Error`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "ok  ",
            Severity::Warn => "warn",
            Severity::Error => "FAIL",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    /// Empty until the finding is pushed into a report.
    pub phase: VerifyPhases,
    pub code: &'static str,
    pub msg: String,
}

impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self::with(Severity::Info, code, msg)
    }

    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self::with(Severity::Warn, code, msg)
    }

    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self::with(Severity::Error, code, msg)
    }

    fn with(sev: Severity, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev,
            phase: VerifyPhases::empty(),
            code,
            msg: msg.into(),
        }
    }
}

/// Everything a checker run found, in push order.
#[derive(Clone, Debug)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
    current: VerifyPhases,
    ran: VerifyPhases,
}

impl Default for VerifyReport {
    fn default() -> Self {
        Self {
            findings: Vec::new(),
            current: VerifyPhases::empty(),
            ran: VerifyPhases::empty(),
        }
    }
}

impl VerifyReport {
    /// Marks `phase` as running; later pushes are stamped with it.
    pub fn enter(&mut self, phase: VerifyPhases) {
        self.current = phase;
        self.ran |= phase;
    }

    /// Phases entered so far.
    pub fn ran(&self) -> VerifyPhases {
        self.ran
    }

    pub fn push(&mut self, mut f: Finding) {
        if f.phase.is_empty() {
            f.phase = self.current;
        }
        self.findings.push(f);
    }

    pub fn has_error(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| f.sev == Severity::Error)
    }

    pub fn first_error(&self) -> Option<&Finding> {
        self.errors().next()
    }

    pub fn count(&self, sev: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == sev).count()
    }

    /// Findings carrying `code`, in the order they were pushed.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn in_phase(&self, phase: VerifyPhases) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.phase == phase)
    }

    pub fn display_with(&self, opts: ReportDisplayOpts) -> ReportDisplay<'_> {
        ReportDisplay { rep: self, opts }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ReportDisplayOpts {
    pub min_level: Severity,
    pub prefix: &'static str,
    pub show_summary: bool,
    pub pad_code: usize,
}

impl Default for ReportDisplayOpts {
    fn default() -> Self {
        Self {
            min_level: Severity::Info,
            prefix: "",
            show_summary: false,
            pad_code: 18,
        }
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a VerifyReport,
    opts: ReportDisplayOpts,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ReportDisplayOpts {
            min_level,
            prefix,
            show_summary,
            pad_code,
        } = self.opts;

        for it in self.rep.findings.iter().filter(|it| it.sev >= min_level) {
            writeln!(
                f,
                "{prefix}{} {:<8} {:<pad_code$} {}",
                it.sev.label(),
                it.phase.name(),
                it.code,
                it.msg
            )?;
        }

        if show_summary {
            let phases = [
                VerifyPhases::GEOMETRY,
                VerifyPhases::EXTENTS,
                VerifyPhases::CROSSREF,
            ];
            write!(f, "{prefix}{} error(s), {} warning(s), phases:",
                self.rep.count(Severity::Error),
                self.rep.count(Severity::Warn),
            )?;
            for phase in phases.into_iter().filter(|p| self.rep.ran.contains(*p)) {
                write!(f, " {}", phase.name())?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_with(ReportDisplayOpts::default()).fmt(f)
    }
}

/// Phase selection shared by every checker's option type.
pub trait PhaseOptions {
    fn phases(&self) -> VerifyPhases {
        VerifyPhases::ALL
    }

    /// Stop after the first phase that reported an error.
    fn fail_fast(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VerifyOptions {
    pub phases: VerifyPhases,
    pub fail_fast: bool,
}

impl VerifyOptions {
    pub fn only(phases: VerifyPhases) -> Self {
        Self {
            phases,
            ..Self::default()
        }
    }

    pub fn stop_on_error(self) -> Self {
        Self {
            fail_fast: true,
            ..self
        }
    }
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: false,
        }
    }
}

impl PhaseOptions for VerifyOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }

    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}
