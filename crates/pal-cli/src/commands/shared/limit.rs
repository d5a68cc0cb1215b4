use pal_config::PalConfig;

use crate::cli::GlobalFlags;

/// Entries shown by `pal audit` when no `--limit` is given.
pub const AUDIT_TRAIL_DEFAULT: u32 = 50;

/// A listing command whose length `--limit` controls.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Listing {
    /// `pal session list`, sized by `general.default_limit`.
    Sessions,
    /// `pal audit`, newest entries first.
    AuditTrail,
}

impl Listing {
    /// Row count for this listing. The subcommand's own `--limit` beats the
    /// global flag, which beats the listing's default.
    #[must_use]
    pub fn resolve(self, local: Option<u32>, flags: &GlobalFlags, config: &PalConfig) -> u32 {
        local.or(flags.limit).unwrap_or(match self {
            Self::Sessions => config.general.default_limit,
            Self::AuditTrail => AUDIT_TRAIL_DEFAULT,
        })
    }
}
