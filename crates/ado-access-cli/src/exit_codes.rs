//! Exit codes for `ado-access`.
//! These codes are part of the public contract; scripts branch on them.

use ado_access::AccessError;

pub const EXIT_SUCCESS: i32 = 0;
pub const USER_ERROR: i32 = 1; // Not found, ambiguous, or invalid input
pub const CONFIG_ERROR: i32 = 2; // Missing configuration or rejected credentials
pub const DEPENDENCY_ERROR: i32 = 3; // Azure DevOps failed or answered unexpectedly

/// Exit code for an error chain, taken from the first `AccessError` in it.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AccessError>())
        .map(AccessError::exit_code)
        .unwrap_or(CONFIG_ERROR)
}
