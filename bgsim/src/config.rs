// SPDX-License-Identifier: MIT

use std::{fmt, fs, path::Path};

use clap::ValueEnum;
use serde::{Deserialize, Deserializer};

use crate::utils::string::parse_size;

pub const DEFAULT_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;
pub const DEFAULT_GROUPS: u32 = 4;
pub const DEFAULT_INODES_PER_GROUP: u32 = 1024;
pub const DEFAULT_OPS: u64 = 100;
pub const DEFAULT_MIN_FILE: u64 = 1024;
pub const DEFAULT_MAX_FILE: u64 = 201 * 1024;
pub const DEFAULT_FINAL_FILE: u64 = 1024 * 1024;

/// Byte count written as an integer or a string with a K/M/G suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size(pub u64);

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizeVisitor;

        impl serde::de::Visitor<'_> for SizeVisitor {
            type Value = Size;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a byte count or a size string like '512K', '10M', '1G'")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Size(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(Size)
                    .map_err(|_| E::custom("size must not be negative"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_size(value).map(Size).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    SmartFit,
    WorstFit,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmartFit => write!(f, "smart-fit"),
            Strategy::WorstFit => write!(f, "worst-fit"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    pub size: Option<Size>,
    pub block_size: Option<u32>,
    pub groups: Option<u32>,
    pub inodes_per_group: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    pub ops: Option<u64>,
    pub seed: Option<u64>,
    pub min_file: Option<Size>,
    pub max_file: Option<Size>,
    pub final_file: Option<Size>,
    pub strategy: Option<Strategy>,
}

/// Contents of a `sim.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub format: FormatConfig,
    pub workload: WorkloadConfig,
}

impl SimConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read config '{}': {e}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Empty config when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }
}

/// Device geometry after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSettings {
    pub size: u64,
    pub block_size: u32,
    pub groups: u32,
    pub inodes_per_group: u32,
}

impl FormatSettings {
    pub fn resolve(file: &FormatConfig, flags: &FormatConfig) -> Self {
        Self {
            size: flags.size.or(file.size).map_or(DEFAULT_SIZE, |s| s.0),
            block_size: flags
                .block_size
                .or(file.block_size)
                .unwrap_or(DEFAULT_BLOCK_SIZE),
            groups: flags.groups.or(file.groups).unwrap_or(DEFAULT_GROUPS),
            inodes_per_group: flags
                .inodes_per_group
                .or(file.inodes_per_group)
                .unwrap_or(DEFAULT_INODES_PER_GROUP),
        }
    }
}

/// Stress workload after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSettings {
    pub ops: u64,
    /// `None` draws a fresh seed.
    pub seed: Option<u64>,
    pub min_file: u64,
    pub max_file: u64,
    /// 0 skips the final large file.
    pub final_file: u64,
    pub strategy: Strategy,
}

impl WorkloadSettings {
    pub fn resolve(file: &WorkloadConfig, flags: &WorkloadConfig) -> anyhow::Result<Self> {
        let pick =
            |f: Option<Size>, c: Option<Size>, default: u64| f.or(c).map_or(default, |s| s.0);

        let settings = Self {
            ops: flags.ops.or(file.ops).unwrap_or(DEFAULT_OPS),
            seed: flags.seed.or(file.seed),
            min_file: pick(flags.min_file, file.min_file, DEFAULT_MIN_FILE),
            max_file: pick(flags.max_file, file.max_file, DEFAULT_MAX_FILE),
            final_file: pick(flags.final_file, file.final_file, DEFAULT_FINAL_FILE),
            strategy: flags.strategy.or(file.strategy).unwrap_or_default(),
        };

        if settings.min_file > settings.max_file {
            anyhow::bail!(
                "min_file ({}) is larger than max_file ({})",
                settings.min_file,
                settings.max_file
            );
        }
        Ok(settings)
    }
}
