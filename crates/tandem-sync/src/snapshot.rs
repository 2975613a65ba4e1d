//! Confirmed and working state snapshots
//!
//! The engine keeps exactly two copies of the simulation state: the confirmed
//! baseline, computed from real inputs only, and the working state handed
//! back to the host, which may include predicted remote inputs. Both are
//! owned `Record`s, so copying between them never aliases.

use crate::Result;
use tandem_core::Record;

/// The two state buffers owned by a sync engine
///
/// Both buffers always have the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshots {
    confirmed: Record,
    working: Record,
}

impl Snapshots {
    /// Create both snapshots from the initial state
    pub fn new(initial: &[u8]) -> Self {
        Self {
            confirmed: Record::from_slice(initial),
            working: Record::from_slice(initial),
        }
    }

    /// Width of the state in bytes
    pub fn width(&self) -> usize {
        self.working.width()
    }

    /// Make `state` the ground truth for both snapshots
    pub fn pin(&mut self, state: &[u8]) -> Result<()> {
        self.confirmed.copy_from(state)?;
        self.working.copy_from(state)?;
        Ok(())
    }

    /// Save the working state as the new rollback baseline
    pub fn stash(&mut self) -> Result<()> {
        self.confirmed.assign(&self.working)?;
        Ok(())
    }

    /// Throw away predictions by resetting working to the baseline
    pub fn restore(&mut self) -> Result<()> {
        self.working.assign(&self.confirmed)?;
        Ok(())
    }

    /// Copy the working state out to the host
    pub fn emit(&self, out: &mut [u8]) -> Result<()> {
        self.working.copy_to(out)?;
        Ok(())
    }

    /// The confirmed baseline
    pub fn confirmed(&self) -> &[u8] {
        self.confirmed.as_bytes()
    }

    /// Mutable confirmed baseline, for stepping it forward during catch-up
    pub fn confirmed_mut(&mut self) -> &mut [u8] {
        self.confirmed.as_bytes_mut()
    }

    /// The working state
    pub fn working(&self) -> &[u8] {
        self.working.as_bytes()
    }

    /// Mutable working state
    pub fn working_mut(&mut self) -> &mut [u8] {
        self.working.as_bytes_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_copies_initial() {
        let snaps = Snapshots::new(&[1, 2, 3]);
        assert_eq!(snaps.width(), 3);
        assert_eq!(snaps.confirmed(), &[1, 2, 3]);
        assert_eq!(snaps.working(), &[1, 2, 3]);
    }

    #[test]
    fn test_pin() {
        let mut snaps = Snapshots::new(&[0, 0]);
        snaps.pin(&[4, 5]).unwrap();
        assert_eq!(snaps.confirmed(), &[4, 5]);
        assert_eq!(snaps.working(), &[4, 5]);
        assert!(snaps.pin(&[1]).is_err());
    }

    #[test]
    fn test_stash_and_restore_do_not_alias() {
        let mut snaps = Snapshots::new(&[0]);
        snaps.working_mut()[0] = 9;
        snaps.stash().unwrap();
        assert_eq!(snaps.confirmed(), &[9]);

        // Mutating working after the stash leaves the baseline alone
        snaps.working_mut()[0] = 11;
        assert_eq!(snaps.confirmed(), &[9]);

        snaps.restore().unwrap();
        assert_eq!(snaps.working(), &[9]);
    }

    #[test]
    fn test_emit() {
        let mut snaps = Snapshots::new(&[7, 7]);
        snaps.working_mut()[1] = 8;
        let mut out = [0u8; 2];
        snaps.emit(&mut out).unwrap();
        assert_eq!(out, [7, 8]);

        let mut wrong = [0u8; 3];
        assert!(snaps.emit(&mut wrong).is_err());
    }
}
