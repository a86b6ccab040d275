#![allow(clippy::too_many_arguments, clippy::needless_range_loop, clippy::float_cmp,
         clippy::comparison_chain, clippy::manual_range_contains)]

pub mod q_shared;
pub mod qfiles;
pub mod crc;
pub mod cvar;
pub mod common;
pub mod entities;
pub mod patch;
pub mod bspfile;
pub mod vis;
pub mod cmodel;
pub mod pmove;
pub mod world;

#[cfg(test)]
mod test_map;
