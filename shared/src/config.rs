use std::env;

use lazy_static::lazy_static;
use log::warn;

/// Number of node visits a single evaluation may perform when nothing else is configured
pub const DEFAULT_FIXPOINT_LIMIT: usize = 100_000;

// common configurations
lazy_static! {
    pub static ref PARALLEL: bool = matches!(env::var("PARALLEL"), Ok(val) if val == "1");
    pub static ref FIXPOINT_LIMIT: Option<usize> =
        parse_fixpoint_limit(env::var("ABSINT_FIXPOINT_LIMIT").ok().as_deref());
}

/// Visit budget from its setting: unset is the default, `none` lifts it
fn parse_fixpoint_limit(setting: Option<&str>) -> Option<usize> {
    match setting {
        None => Some(DEFAULT_FIXPOINT_LIMIT),
        Some("none") => None,
        Some(val) => match val.parse() {
            Ok(limit) => Some(limit),
            Err(err) => {
                warn!(
                    "ignoring ABSINT_FIXPOINT_LIMIT `{}` ({}), using {}",
                    val, err, DEFAULT_FIXPOINT_LIMIT
                );
                Some(DEFAULT_FIXPOINT_LIMIT)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixpoint_limit_settings() {
        assert_eq!(parse_fixpoint_limit(None), Some(DEFAULT_FIXPOINT_LIMIT));
        assert_eq!(parse_fixpoint_limit(Some("none")), None);
        assert_eq!(parse_fixpoint_limit(Some("250")), Some(250));
        assert_eq!(
            parse_fixpoint_limit(Some("lots")),
            Some(DEFAULT_FIXPOINT_LIMIT)
        );
        assert_eq!(parse_fixpoint_limit(Some("-3")), Some(DEFAULT_FIXPOINT_LIMIT));
    }
}
