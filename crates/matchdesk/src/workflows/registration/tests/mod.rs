mod common;
mod intake;
