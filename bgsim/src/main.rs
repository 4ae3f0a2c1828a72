// SPDX-License-Identifier: MIT

mod config;
mod sim;
mod utils;

use std::{fs::OpenOptions, path::PathBuf};

use anyhow::anyhow;
use bgfs::ext::*;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use rand::Rng;

use crate::config::{
    FormatConfig, FormatSettings, SimConfig, Size, Strategy, WorkloadConfig, WorkloadSettings,
};
use crate::utils::{init_logger, pretty_bytes, string::parse_size};

#[derive(Parser)]
#[command(
    name = "bgsim",
    version,
    about = "Block-group allocation stress driver",
    long_about = None
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FormatArgs {
    /// Config file, flags given here win over it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Device size (e.g. 10M)
    #[arg(long, value_parser = parse_size)]
    size: Option<u64>,
    #[arg(long)]
    block_size: Option<u32>,
    #[arg(long)]
    groups: Option<u32>,
    #[arg(long)]
    inodes_per_group: Option<u32>,
}

impl FormatArgs {
    fn overrides(&self) -> FormatConfig {
        FormatConfig {
            size: self.size.map(Size),
            block_size: self.block_size,
            groups: self.groups,
            inodes_per_group: self.inodes_per_group,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a random create/read/delete workload
    Stress {
        #[command(flatten)]
        format: FormatArgs,

        #[arg(long)]
        ops: Option<u64>,
        /// Fixed seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_parser = parse_size)]
        min_file: Option<u64>,
        #[arg(long, value_parser = parse_size)]
        max_file: Option<u64>,
        /// Size of the file attempted after the workload, 0 to skip
        #[arg(long, value_parser = parse_size)]
        final_file: Option<u64>,
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Back the device with this file instead of memory
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Zero the whole device before the run
        #[arg(long)]
        full_format: bool,
        /// No progress bar and no per-op lines
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the group geometry for a device size
    Layout {
        #[command(flatten)]
        format: FormatArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Stress {
            format,
            ops,
            seed,
            min_file,
            max_file,
            final_file,
            strategy,
            image,
            full_format,
            quiet,
        } => {
            let file = SimConfig::load(format.config.as_deref())?;
            let geometry = FormatSettings::resolve(&file.format, &format.overrides());
            let work = WorkloadSettings::resolve(
                &file.workload,
                &WorkloadConfig {
                    ops,
                    seed,
                    min_file: min_file.map(Size),
                    max_file: max_file.map(Size),
                    final_file: final_file.map(Size),
                    strategy,
                },
            )?;
            stress(&geometry, &work, image, full_format, quiet)
        }
        Commands::Layout { format } => {
            let file = SimConfig::load(format.config.as_deref())?;
            let geometry = FormatSettings::resolve(&file.format, &format.overrides());
            print_layout(&build_meta(&geometry)?);
            Ok(())
        }
    }
}

fn build_meta(geometry: &FormatSettings) -> anyhow::Result<ExtMeta> {
    ExtMeta::new_custom(
        geometry.size,
        geometry.block_size,
        geometry.groups,
        geometry.inodes_per_group,
    )
    .map_err(|e| anyhow!("{e}"))
}

fn stress(
    geometry: &FormatSettings,
    work: &WorkloadSettings,
    image: Option<PathBuf>,
    full_format: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let meta = build_meta(geometry)?;
    let seed = work.seed.unwrap_or_else(|| rand::thread_rng().r#gen());

    println!(
        "[bgsim] {} device, {} groups x {} blocks of {}, strategy {}, {} ops, seed {}",
        pretty_bytes(meta.device_bytes()),
        meta.group_count,
        meta.blocks_per_group,
        pretty_bytes(meta.block_size as u64),
        work.strategy,
        work.ops,
        seed
    );

    let mut backing;
    let mut file;
    let mut std_io;
    let mut mem_io;
    let io: &mut dyn BgIO = match &image {
        Some(path) => {
            println!("[bgsim] Backing device: {}", path.display());
            file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            file.set_len(meta.device_bytes())?;
            std_io = StdBgIO::with_capacity(&mut file, meta.device_bytes());
            &mut std_io
        }
        None => {
            backing = vec![0u8; meta.device_bytes() as usize];
            mem_io = MemBgIO::new(&mut backing);
            &mut mem_io
        }
    };

    let mut counter = IOCounter::new(io);
    let tally = match work.strategy {
        Strategy::SmartFit => {
            sim::run(&mut counter, &meta, SmartFitAllocator, work, seed, quiet, full_format)?
        }
        Strategy::WorstFit => {
            sim::run(&mut counter, &meta, WorstFitAllocator, work, seed, quiet, full_format)?
        }
    };
    let stats = counter.snapshot();

    println!("\n{}", "Summary".bold());
    print!("{tally}");
    println!(
        "  io: reads={} ({})  writes={} ({})  flushes={}",
        stats.reads,
        pretty_bytes(stats.read_bytes),
        stats.writes,
        pretty_bytes(stats.write_bytes),
        stats.flushes
    );

    if !tally.is_clean() {
        anyhow::bail!(
            "run with seed {seed} ended with {} read mismatch(es) and {} check error(s)",
            tally.read_mismatches,
            tally.check_errors
        );
    }
    println!("{}", "[bgsim] Done.".green());
    Ok(())
}

fn print_layout(meta: &ExtMeta) {
    println!(
        "[bgsim] {} blocks of {} ({}), {} inodes",
        meta.block_count,
        pretty_bytes(meta.block_size as u64),
        pretty_bytes(meta.device_bytes()),
        meta.inode_count()
    );
    println!("  {:>5}  {:>10}  {:>10}  {:>8}  {:>10}", "group", "start", "end", "blocks", "bytes");
    for id in 0..meta.group_count {
        let layout = GroupLayout::compute(meta, id);
        println!(
            "  {:>5}  {:>10}  {:>10}  {:>8}  {:>10}",
            layout.group_id,
            layout.group_start,
            layout.group_end,
            layout.blocks(),
            pretty_bytes(layout.blocks() as u64 * meta.block_size as u64)
        );
    }
    if meta.unused_blocks() > 0 {
        println!("  {} trailing block(s) outside any group", meta.unused_blocks());
    }
}
