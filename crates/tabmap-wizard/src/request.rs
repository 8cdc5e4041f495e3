//! Busy flag for collaborator requests.
//!
//! Each wizard has at most one outstanding request. Starting one hands out a
//! [`RequestTicket`]; the response is only accepted with the matching ticket,
//! so a response that arrives after a reset is rejected instead of being
//! applied to the new session.

use std::fmt;

use crate::error::{Result, WizardError};

/// The collaborator call a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Acquire,
    Preview,
    Commit,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Acquire => "header acquisition",
            RequestKind::Preview => "preview",
            RequestKind::Commit => "commit",
        })
    }
}

/// Handle for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    kind: RequestKind,
    id: u64,
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestGuard {
    in_flight: Option<RequestTicket>,
    next_id: u64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestKind> {
        self.in_flight.map(|t| t.kind)
    }

    /// Mark a request as started. Fails while any request is outstanding.
    pub fn begin(&mut self, kind: RequestKind) -> Result<RequestTicket> {
        if let Some(current) = self.in_flight {
            return Err(WizardError::Busy { kind: current.kind });
        }
        self.next_id += 1;
        let ticket = RequestTicket {
            kind,
            id: self.next_id,
        };
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Release the flag for a finished request.
    pub fn finish(&mut self, ticket: RequestTicket) -> Result<()> {
        if self.in_flight != Some(ticket) {
            return Err(WizardError::NoRequestInFlight { kind: ticket.kind });
        }
        self.in_flight = None;
        Ok(())
    }

    /// Forget the outstanding request; its response will be rejected.
    pub fn cancel(&mut self) -> Option<RequestKind> {
        self.in_flight.take().map(|t| t.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_is_refused_while_busy() {
        let mut guard = RequestGuard::new();
        let ticket = guard.begin(RequestKind::Preview).unwrap();
        assert!(guard.is_busy());
        assert!(matches!(
            guard.begin(RequestKind::Preview),
            Err(WizardError::Busy {
                kind: RequestKind::Preview
            })
        ));

        guard.finish(ticket).unwrap();
        assert!(!guard.is_busy());
        assert!(guard.begin(RequestKind::Commit).is_ok());
    }

    #[test]
    fn cancelled_ticket_is_rejected() {
        let mut guard = RequestGuard::new();
        let stale = guard.begin(RequestKind::Acquire).unwrap();
        assert_eq!(guard.cancel(), Some(RequestKind::Acquire));

        let fresh = guard.begin(RequestKind::Acquire).unwrap();
        assert!(matches!(
            guard.finish(stale),
            Err(WizardError::NoRequestInFlight { .. })
        ));
        assert_eq!(guard.in_flight(), Some(RequestKind::Acquire));
        guard.finish(fresh).unwrap();
    }
}
