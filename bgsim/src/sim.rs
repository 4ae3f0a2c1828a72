// SPDX-License-Identifier: MIT

use std::{collections::BTreeMap, fmt, time::Instant};

use anyhow::anyhow;
use bgfs::ext::*;
use colored::Colorize;
use log::{debug, info};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::WorkloadSettings;
use crate::utils::{pretty_bytes, stress_bar};

const FINAL_FILE_NAME: &str = "final_big_file.dat";

/// Counters gathered over one stress run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub created: u64,
    pub create_failed: u64,
    pub reads: u64,
    pub read_mismatches: u64,
    pub deleted: u64,
    pub skipped: u64,
    /// `None` when the final file was not attempted.
    pub final_created: Option<bool>,
    pub check_errors: usize,
}

impl Tally {
    pub fn is_clean(&self) -> bool {
        self.read_mismatches == 0 && self.check_errors == 0
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  created={}  create_failed={}  reads={}  mismatches={}  deleted={}  skipped={}",
            self.created,
            self.create_failed,
            self.reads,
            self.read_mismatches,
            self.deleted,
            self.skipped
        )?;
        match self.final_created {
            Some(true) => writeln!(f, "  final file: stored"),
            Some(false) => writeln!(f, "  final file: disk full"),
            None => writeln!(f, "  final file: skipped"),
        }
    }
}

/// Live file bookkeeping: the payload of each file is rebuilt from its tag.
struct LiveFile {
    tag: u64,
    len: usize,
    inode: u64,
}

fn payload(tag: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    ChaCha8Rng::seed_from_u64(tag).fill_bytes(&mut buf);
    buf
}

fn fs_err<E: fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("{e}")
}

/// One-line reason for a rejected create.
fn reason(e: &FsTableError) -> String {
    match e {
        FsTableError::Allocator(inner) => inner.to_string(),
        other => other.msg().to_string(),
    }
}

/// Formats `io` and replays the workload: 60% create, 30% read, 10% delete,
/// then one final large file, a usage report and a consistency check.
pub fn run<IO: BgIO + ?Sized, A: ExtentAllocator>(
    io: &mut IO,
    meta: &ExtMeta,
    allocator: A,
    work: &WorkloadSettings,
    seed: u64,
    quiet: bool,
    full_format: bool,
) -> anyhow::Result<Tally> {
    let mut table = ExtFileTable::format_with(io, meta, allocator, full_format).map_err(fs_err)?;
    info!(
        "formatted {} groups of {} blocks, strategy {}",
        meta.group_count,
        meta.blocks_per_group,
        table.allocator().name()
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut live: BTreeMap<String, LiveFile> = BTreeMap::new();
    let mut tally = Tally::default();
    let pb = stress_bar(work.ops, quiet)?;
    let started = Instant::now();

    let say = |line: String| {
        if !quiet {
            pb.println(line);
        }
    };

    for op in 0..work.ops {
        let roll = rng.gen_range(0..10u32);

        if roll < 6 {
            let name = format!("file_{op}.dat");
            let len = rng.gen_range(work.min_file..=work.max_file) as usize;
            let tag = rng.next_u64();
            match table.create(&name, &payload(tag, len)) {
                Ok(id) => {
                    tally.created += 1;
                    let inode = table.inode_number(id);
                    let extents = table.stat(&name).map_or(0, |inode| inode.extents.len());
                    say(format!(
                        "[OP {op}] {} {name} ({}) -> #{inode}, {extents} extent(s), {:.2}% used",
                        "CREATE".green(),
                        pretty_bytes(len as u64),
                        table.usage().usage_percent()
                    ));
                    live.insert(name, LiveFile { tag, len, inode });
                }
                Err(e) if e.is_exhausted() => {
                    tally.create_failed += 1;
                    say(format!(
                        "[OP {op}] {} {name} ({}): {}",
                        "CREATE FAILED".yellow(),
                        pretty_bytes(len as u64),
                        reason(&e)
                    ));
                }
                Err(e) => return Err(fs_err(e)),
            }
        } else if roll < 9 {
            let Some(name) = pick(&mut rng, &live) else {
                tally.skipped += 1;
                pb.inc(1);
                continue;
            };
            let file = &live[&name];
            let expected = payload(file.tag, file.len);
            let got = table.read(&name).map_err(fs_err)?;
            let owner = table.by_inode_number(file.inode).map(|(owner, _)| owner);
            tally.reads += 1;
            if got.as_deref() == Some(expected.as_slice()) && owner == Some(name.as_str()) {
                say(format!("[OP {op}] {} {name}", "READ".cyan()));
            } else {
                tally.read_mismatches += 1;
                say(format!("[OP {op}] {} {name}", "READ MISMATCH".red().bold()));
            }
        } else {
            let Some(name) = pick(&mut rng, &live) else {
                tally.skipped += 1;
                pb.inc(1);
                continue;
            };
            if table.delete(&name) {
                tally.deleted += 1;
                live.remove(&name);
                say(format!("[OP {op}] {} {name}", "DELETE".magenta()));
            }
        }

        pb.inc(1);
    }
    pb.finish_and_clear();
    debug!("{} ops in {:.2?}", work.ops, started.elapsed());

    println!("\n{}", "Usage after workload".bold());
    print!("{}", table.usage());

    if work.final_file > 0 {
        let content = payload(rng.next_u64(), work.final_file as usize);
        match table.create(FINAL_FILE_NAME, &content) {
            Ok(id) => {
                tally.final_created = Some(true);
                println!(
                    "\n{} {FINAL_FILE_NAME} ({}) -> inode {id}",
                    "Final file stored:".green(),
                    pretty_bytes(work.final_file)
                );
                print!("{}", table.usage());
            }
            Err(e) if e.is_exhausted() => {
                tally.final_created = Some(false);
                println!("\n{} {}", "Final file rejected:".yellow(), reason(&e));
            }
            Err(e) => return Err(fs_err(e)),
        }
    }

    table.flush().map_err(fs_err)?;

    let report = table.check().map_err(fs_err)?;
    tally.check_errors = report.count(Severity::Error);
    println!("\n{}", "Consistency check".bold());
    print!(
        "{}",
        report.display_with(ReportDisplayOpts {
            min_level: Severity::Warn,
            prefix: "  ",
            show_summary: true,
            ..ReportDisplayOpts::default()
        })
    );
    if let Some(first) = report.first_error() {
        println!(
            "  {} {} ({}): {}",
            "First failure:".red().bold(),
            first.code,
            first.phase.name(),
            first.msg
        );
    }

    Ok(tally)
}

fn pick(rng: &mut ChaCha8Rng, live: &BTreeMap<String, LiveFile>) -> Option<String> {
    if live.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..live.len());
    live.keys().nth(idx).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;

    fn workload(ops: u64) -> WorkloadSettings {
        WorkloadSettings {
            ops,
            seed: None,
            min_file: 1,
            max_file: 8 * 1024,
            final_file: 64 * 1024,
            strategy: Strategy::SmartFit,
        }
    }

    #[test]
    fn test_run_smart_fit_in_memory() {
        let meta = ExtMeta::new_custom(256 * 1024, 1024, 4, 32).unwrap();
        let mut buf = vec![0u8; meta.device_bytes() as usize];
        let mut io = MemBgIO::new(&mut buf);

        let tally = run(&mut io, &meta, SmartFitAllocator, &workload(300), 1, true, false).unwrap();
        assert!(tally.is_clean(), "{tally}");
        assert!(tally.created > 0);
        assert!(tally.final_created.is_some());
    }

    #[test]
    fn test_run_worst_fit_under_pressure() {
        // Small device so creates start failing.
        let meta = ExtMeta::new_custom(64 * 1024, 1024, 2, 8).unwrap();
        let mut buf = vec![0u8; meta.device_bytes() as usize];
        let mut io = MemBgIO::new(&mut buf);

        let tally = run(&mut io, &meta, WorstFitAllocator, &workload(200), 9, true, true).unwrap();
        assert!(tally.is_clean(), "{tally}");
        assert!(tally.create_failed > 0);
        assert_eq!(tally.final_created, Some(false));
    }

    #[test]
    fn test_same_seed_same_tally() {
        let meta = ExtMeta::new_custom(128 * 1024, 1024, 2, 16).unwrap();
        let mut a = vec![0u8; meta.device_bytes() as usize];
        let mut b = vec![0u8; meta.device_bytes() as usize];

        let work = workload(100);
        let mut io_a = MemBgIO::new(&mut a);
        let first = run(&mut io_a, &meta, SmartFitAllocator, &work, 5, true, false).unwrap();
        let mut io_b = MemBgIO::new(&mut b);
        let second = run(&mut io_b, &meta, SmartFitAllocator, &work, 5, true, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_on_image_file() {
        let meta = ExtMeta::new_custom(128 * 1024, 1024, 2, 16).unwrap();
        let mut file = tempfile::tempfile().unwrap();
        file.set_len(meta.device_bytes()).unwrap();
        let mut io = StdBgIO::new(&mut file);

        let tally = run(&mut io, &meta, SmartFitAllocator, &workload(80), 3, true, true).unwrap();
        assert!(tally.is_clean(), "{tally}");
    }
}
