//! Command handlers

mod codec;
mod emulate;
mod read;

pub(crate) use codec::decode_hex_command;
pub(crate) use emulate::emulate_command;
pub(crate) use read::read_command;
