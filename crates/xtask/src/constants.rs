/// Crate exercised by every subcommand.
pub const PACKAGE: &str = "spi-slave-queue";

/// Bare-metal targets the library must keep building for.
pub const TARGETS: &[&str] = &["thumbv7em-none-eabihf", "riscv32imc-unknown-none-elf"];

/// Feature sets checked on each target. `defmt` and `log` are exclusive.
pub const FEATURE_SETS: &[Option<&str>] = &[None, Some("defmt"), Some("log")];
