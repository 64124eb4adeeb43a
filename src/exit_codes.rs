//! Exit code constants for the dirlock CLI.
//!
//! - 0: Success (lock id printed on stdout)
//! - 1: User error (bad args, invalid config, unknown lock id)
//! - 2: Setup failure (lock directory or request entry could not be created)
//! - 3: Timed out waiting for the lock
//! - 4: Lock failure (consistency violation or lock entry creation failure)
//! - 5: Cleanup failure (stale entry left behind, needs manual removal)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or unknown lock id.
pub const USER_ERROR: i32 = 1;

/// The lock directory or the initial request entry could not be created.
pub const SETUP_FAILURE: i32 = 2;

/// The wait budget elapsed, either in the queue or while locks kept existing.
pub const TIMEOUT: i32 = 3;

/// Too many lock entries observed, or the lock entry could not be written.
pub const LOCK_FAILURE: i32 = 4;

/// One of our own entries could not be removed.
pub const CLEANUP_FAILURE: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            SETUP_FAILURE,
            TIMEOUT,
            LOCK_FAILURE,
            CLEANUP_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
    }
}
