// SPDX-License-Identifier: MIT

pub mod logger;
pub mod progress;
pub mod string;

pub use logger::init_logger;
pub use progress::stress_bar;
pub use string::pretty_bytes;
