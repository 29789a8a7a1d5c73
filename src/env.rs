use std::ffi::OsStr;

use crate::output;

/// Apply configuration from the process environment.
///
/// `LC3SIM_MINIMAL=1` suppresses status output, like `--minimal`.
pub fn init() {
    if var_is("LC3SIM_MINIMAL", "1") {
        output::set_minimal(true);
    }
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_variable() {
        std::env::set_var("LC3SIM_TEST_MATCHING_VARIABLE", "1");
        assert!(var_is("LC3SIM_TEST_MATCHING_VARIABLE", "1"));
        assert!(!var_is("LC3SIM_TEST_MATCHING_VARIABLE", "0"));
    }

    #[test]
    fn unset_variable() {
        assert!(!var_is("LC3SIM_DEFINITELY_UNSET_VARIABLE", "1"));
    }
}
