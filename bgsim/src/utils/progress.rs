// SPDX-License-Identifier: MIT

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.white}] {pos}/{len} ops {msg}";

/// Bar over `ops` stress operations. Hidden when `quiet`.
pub fn stress_bar(ops: u64, quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(ops);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)?
            .progress_chars("█░░"),
    );
    Ok(pb)
}
