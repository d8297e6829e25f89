// SPDX-License-Identifier: MIT
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
}

#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}

impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
        }
    }
    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
        }
    }
}

/// Findings of a run that completed without a violation.
#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    pub fn has_warnings(&self) -> bool {
        self.count(Severity::Warn) > 0
    }

    pub fn find(&self, code: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.code == code)
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for it in &self.findings {
            let tag = match it.sev {
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
            };
            writeln!(f, "{tag}: {:<12} {}", it.code, it.msg)?;
        }
        Ok(())
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        const GEOMETRY  = 1 << 0;
        const BITMAP    = 1 << 1;
        const INODES    = 1 << 2;
        const RECONCILE = 1 << 3;
        const ALL       = u32::MAX;
    }
}

/// Generic options that a checker can encapsulate/extend.
pub trait VerifierOptionsLike {
    fn phases(&self) -> VerifyPhases {
        VerifyPhases::ALL
    }
}
